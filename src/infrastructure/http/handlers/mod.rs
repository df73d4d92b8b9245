//! HTTP Handlers

mod generation;
mod novel;
mod ping;
mod websocket;

pub use generation::*;
pub use novel::*;
pub use ping::*;
pub use websocket::*;
