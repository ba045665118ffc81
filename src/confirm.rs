//! Two-step confirmation in front of destructive work.
//!
//! The operator must answer yes, then type a literal phrase, then sit out a
//! countdown they can interrupt. Nothing destructive may run until
//! [`ConfirmationGate::confirm`] returns `Ok`.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::ui::output;

/// Phrase that must be typed verbatim to allow a wipe.
pub const CONFIRMATION_PHRASE: &str = "DELETE ALL DATA";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmAbort {
    #[error("cleanup cancelled")]
    Declined,
    #[error("confirmation phrase did not match, cleanup cancelled")]
    PhraseMismatch,
    #[error("cleanup interrupted")]
    Interrupted,
    #[error("no input available, cleanup cancelled")]
    InputClosed,
}

/// Line-oriented operator input.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Show `question` and read one line. `None` at end of input.
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>>;
}

/// Prompts on stdout, reads stdin.
///
/// One buffered reader serves every question so lines already read ahead
/// from a pipe are not lost between prompts.
pub struct StdinPrompter {
    reader: Mutex<BufReader<Stdin>>,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for StdinPrompter {
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        print!("{question} ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        let read = self.reader.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Accepts `y` / `yes` in any case.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub struct ConfirmationGate {
    prompter: Arc<dyn Prompter>,
    countdown: Duration,
    cancel: CancellationToken,
}

impl ConfirmationGate {
    pub fn new(prompter: Arc<dyn Prompter>, countdown: Duration, cancel: CancellationToken) -> Self {
        Self {
            prompter,
            countdown,
            cancel,
        }
    }

    async fn ask(&self, question: &str) -> Result<String, ConfirmAbort> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ConfirmAbort::Interrupted),
            answer = self.prompter.ask(question) => match answer {
                Ok(Some(answer)) => Ok(answer),
                Ok(None) | Err(_) => Err(ConfirmAbort::InputClosed),
            },
        }
    }

    /// Run all three steps. `doomed` lists what will be destroyed.
    pub async fn confirm(&self, doomed: &[String]) -> Result<(), ConfirmAbort> {
        output::section("This will permanently delete:");
        for item in doomed {
            output::danger(format!("- {item}"));
        }
        println!();

        let answer = self.ask("Are you sure you want to continue? [y/N]").await?;
        if !is_affirmative(&answer) {
            return Err(ConfirmAbort::Declined);
        }

        let phrase = self
            .ask(&format!("Type '{CONFIRMATION_PHRASE}' to confirm:"))
            .await?;
        if phrase.trim() != CONFIRMATION_PHRASE {
            return Err(ConfirmAbort::PhraseMismatch);
        }

        self.count_down().await?;
        info!("destructive cleanup confirmed");
        Ok(())
    }

    async fn count_down(&self) -> Result<(), ConfirmAbort> {
        let mut remaining = self.countdown;
        while !remaining.is_zero() {
            let step = remaining.min(Duration::from_secs(1));
            output::warning(format!(
                "Deleting in {}s... press Ctrl+C to cancel",
                remaining.as_secs_f64().ceil() as u64
            ));
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ConfirmAbort::Interrupted),
                _ = tokio::time::sleep(step) => {}
            }
            remaining -= step;
        }
        Ok(())
    }
}
