//! Novelist - 长篇小说生成编排引擎
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Novel Context: 小说、章节、配置与生命周期阶段
//! - Context Window: 章节续写的前文截取
//!
//! 应用层 (application/):
//! - Ports: 端口定义（LlmProvider, Workspace, RunManager, Persistence, Progress）
//! - Generation: 重试策略、单步生成器、顺序编排器
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: Workspace, RunManager 内存实现
//! - Persistence: SQLite、目录镜像组合写入与延迟写入
//! - Adapters: LLM Client, 目录存储
//! - Events: 生成事件广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
