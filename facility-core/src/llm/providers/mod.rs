//! LLM provider implementations

pub mod offline;
pub mod openai;

pub use offline::OfflineProvider;
pub use openai::OpenAIProvider;
