//! RAG (Retrieval-Augmented Generation) module
//!
//! Answers data-science questions with code grounded in a reference book:
//! - Keyword retrieval of a line window from the book corpus
//! - Prompt composition around the retrieved context
//! - Generation through the loaded model backend
//! - Validation of the output, with canned fallbacks by intent
//!
//! # Examples
//!
//! ```rust,no_run
//! use litcode::config::AppConfig;
//! use litcode::rag::CodeAssistant;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load_or_default()?;
//!     let assistant = CodeAssistant::new(config);
//!
//!     let answer = assistant.generate_code_solution("How do I filter a DataFrame?").await;
//!     println!("{answer}");
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod validator;

pub use context::truncate_context;
pub use context::ContextWindow;
pub use pipeline::CodeAnswer;
pub use pipeline::CodeAssistant;
pub use prompts::compose_prompt;
pub use retriever::retrieve_section;
pub use retriever::Retrieval;
pub use retriever::Retriever;
pub use validator::validate_response;
pub use validator::Intent;
pub use validator::ValidatedResponse;
pub use validator::ValidationReport;
