//! Storage Adapter - 目录镜像存储

mod directory_store;

pub use directory_store::DirectoryNovelStore;
