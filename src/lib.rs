pub mod cli;
pub mod config;
pub mod corpus;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod questions;
pub mod rag;


pub use config::AppConfig;
pub use errors::*;
pub use rag::CodeAssistant;
