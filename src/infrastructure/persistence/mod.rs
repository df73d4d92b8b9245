//! Persistence Layer - 数据持久化
//!
//! SQLite 存储、目录镜像的组合，以及用户编辑的延迟写入

mod composite;
mod debounce;
pub mod sqlite;

pub use composite::CompositePersistence;
pub use debounce::DebouncedPersistence;
