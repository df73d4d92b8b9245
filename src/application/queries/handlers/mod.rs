//! Query Handlers 实现

mod generation_handlers;
mod novel_handlers;

pub use generation_handlers::*;
pub use novel_handlers::*;
