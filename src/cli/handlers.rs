//! CLI command handlers
//!
//! This module contains all the command handlers for the LitCode CLI

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::info;

use crate::cli::output::*;
use crate::llm::load_backend;
use crate::questions::random_question;
use crate::rag::CodeAssistant;
use crate::AppConfig;
use crate::LitCodeError;
use crate::Result;

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "q"];

/// Handle ask command
pub async fn handle_ask(assistant: &CodeAssistant, question: String, show_context: bool) -> Result<()> {
    print_info(&format!("🤖 Question: \"{question}\""));
    println!("💭 Generating answer...\n");

    let answer = assistant.answer(&question).await;
    print_answer(&answer, show_context);
    Ok(())
}

/// Handle retrieve command
pub async fn handle_retrieve(
    assistant: &CodeAssistant,
    question: String,
    max_chars: Option<usize>,
) -> Result<()> {
    let max_chars = max_chars.unwrap_or_else(|| assistant.config().max_context_chars());
    print_info(&format!("🔍 Retrieving context for \"{question}\" (max {max_chars} chars)"));

    let retrieval = assistant.retriever().retrieve(&question);
    let context = retrieval.render(max_chars);
    print_retrieval(&retrieval, &context);
    Ok(())
}

/// Handle random command
pub async fn handle_random(assistant: &CodeAssistant, seed: Option<u64>) -> Result<()> {
    let question = match seed {
        Some(seed) => random_question(&mut StdRng::seed_from_u64(seed)),
        None => random_question(&mut rand::thread_rng()),
    };
    info!("Random question: {}", question);
    println!("🎲 Random question: {question}\n");

    let answer = assistant.answer(&question).await;
    print_answer(&answer, false);
    Ok(())
}

/// Handle interactive command
///
/// Reads one question per line; every answer goes through the same backend.
pub async fn handle_interactive(assistant: &CodeAssistant) -> Result<()> {
    print_welcome();
    let answered = answer_lines(assistant, BufReader::new(tokio::io::stdin())).await?;
    info!("Interactive session answered {} question(s)", answered);
    Ok(())
}

/// Answer questions read from `input` until an exit command or end of input
///
/// Returns the number of questions answered.
async fn answer_lines<R>(assistant: &CodeAssistant, input: R) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;
    loop {
        print_prompt("❓ ")?;

        let Some(input) = lines.next_line().await? else {
            println!();
            break;
        };
        let question = input.trim();

        if question.is_empty() {
            continue;
        }
        if EXIT_COMMANDS
            .iter()
            .any(|command| question.eq_ignore_ascii_case(command))
        {
            print_success("👋 Goodbye!");
            break;
        }

        let question = if question.eq_ignore_ascii_case("random") {
            let question = random_question(&mut rand::thread_rng());
            println!("🎲 Random question: {question}");
            question
        } else {
            question.to_string()
        };

        let answer = assistant.answer(&question).await;
        println!();
        print_answer(&answer, false);
        println!();
        answered += 1;
    }

    Ok(answered)
}

/// Handle backend command
pub async fn handle_backend(config: &AppConfig) -> Result<()> {
    print_info(&format!("Loading {} backend...", config.generation.engine));

    let config = config.clone();
    let selection = tokio::task::spawn_blocking(move || load_backend(&config))
        .await
        .map_err(|e| LitCodeError::Custom(format!("backend load task failed: {e}")))?;

    print_backend_selection(&selection);
    Ok(())
}

/// Handle config command
pub async fn handle_config(config: &AppConfig, verbose: bool) -> Result<()> {
    print_config(config);
    if verbose {
        println!("\n{}", config.to_toml_string()?);
    }
    Ok(())
}
