//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `litcode` CLI

use crate::llm::BackendSelection;
use crate::rag::truncate_context;
use crate::rag::CodeAnswer;
use crate::rag::Retrieval;
use crate::rag::ValidatedResponse;
use crate::AppConfig;

const RULE_WIDTH: usize = 80;

/// Longest load error shown before it is cut
const ERROR_PREVIEW_CHARS: usize = 120;

pub fn print_welcome() {
    println!("📘 Welcome to LitCode! I generate Python code solutions from 'Python Data Science Handbook'.");
    println!("   Ask me directly (e.g., 'How do I use pandas?') or type 'random' for a random question.");
    println!("   Type 'exit' or 'quit' to leave.");
    println!();
}

/// Print an answer, optionally with the retrieved context
pub fn print_answer(answer: &CodeAnswer, show_context: bool) {
    if show_context {
        print_retrieval(&answer.retrieval, &answer.context);
        println!();
    }

    println!("{}", "═".repeat(RULE_WIDTH));
    println!("📝 Answer:\n");
    println!("{}", answer.text().trim_end());
    println!("{}", "═".repeat(RULE_WIDTH));

    match &answer.response {
        ValidatedResponse::Valid(_) => {
            if let Some(kind) = answer.backend {
                print_info(&format!("Generated by the {kind} model"));
            }
        }
        ValidatedResponse::Fallback { intent, report } => {
            let reason = if answer.backend.is_none() {
                "generation unavailable".to_string()
            } else {
                report.failures().join(", ")
            };
            print_warning(&format!("Showing the {intent} example ({reason})"));
        }
    }
}

/// Print the retrieval outcome and the context text
pub fn print_retrieval(retrieval: &Retrieval, context: &str) {
    match retrieval {
        Retrieval::Section(window) => println!(
            "📚 Book context (lines {}-{}, score {}):",
            window.start_index,
            window.end_index - 1,
            window.score
        ),
        Retrieval::NoMatch => println!("📚 Book context (no matching line):"),
        Retrieval::NoContent => println!("📚 Book context (corpus unavailable):"),
    }
    println!("{context}");
}

pub fn print_backend_selection(selection: &BackendSelection) {
    match selection {
        BackendSelection::Specialized(handle) => {
            print_success(&format!("Fine-tuned model loaded: {}", handle.model_id()));
        }
        BackendSelection::Generic {
            handle,
            specialized_error,
        } => {
            print_warning(&format!(
                "Fine-tuned model unavailable: {}",
                truncate_context(specialized_error, ERROR_PREVIEW_CHARS)
            ));
            print_success(&format!("Pre-trained model loaded: {}", handle.model_id()));
        }
        BackendSelection::Unavailable {
            specialized_error,
            generic_error,
        } => {
            print_error(&format!(
                "Fine-tuned model unavailable: {}",
                truncate_context(specialized_error, ERROR_PREVIEW_CHARS)
            ));
            print_error(&format!(
                "Pre-trained model unavailable: {}",
                truncate_context(generic_error, ERROR_PREVIEW_CHARS)
            ));
            print_warning("Answers will use the built-in example templates");
        }
    }
}

pub fn print_config(config: &AppConfig) {
    println!("📋 LitCode Configuration:");
    println!();

    println!("📂 Paths:");
    println!("  Corpus: {}", config.paths.corpus.display());
    println!("  Fine-tuned model: {}", config.paths.finetuned_model.display());
    println!();

    println!("🔍 Retrieval:");
    println!("  Max context chars: {}", config.retrieval.max_context_chars);
    println!();

    let generation = &config.generation;
    println!("🤖 Generation:");
    println!("  Engine: {}", generation.engine);
    println!("  Pre-trained model: {}", generation.generic_model);
    println!("  Temperature: {}", generation.temperature);
    println!("  Top-p: {}", generation.top_p);
    println!("  Max input tokens: {}", generation.max_input_tokens);
    println!("  Max new tokens: {}", generation.max_new_tokens);
    match generation.seed {
        Some(seed) => println!("  Seed: {seed}"),
        None => println!("  Seed: random"),
    }
    println!("  Timeout: {}s (load: {}s)", generation.timeout_secs, generation.load_timeout_secs);
    println!();

    println!("🦙 Ollama:");
    println!("  Endpoint: {}", config.ollama.endpoint);
    println!("  Fine-tuned tag: {}", config.ollama.finetuned_model);
    println!("  Pre-trained tag: {}", config.ollama.generic_model);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    println!("❌ {msg}");
}

pub fn print_prompt(msg: &str) -> std::io::Result<()> {
    print!("{msg}");
    std::io::Write::flush(&mut std::io::stdout())
}
