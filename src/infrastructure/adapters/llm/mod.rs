//! LLM Adapter - 文本生成服务客户端实现

mod fake_llm_client;
mod http_llm_client;

pub use fake_llm_client::ScriptedLlmClient;
pub use http_llm_client::*;
