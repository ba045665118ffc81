//! Test doubles for the runtime, operator and readiness seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::confirm::Prompter;
use crate::health::{HealthTarget, ReadinessProbe};
use crate::runtime::{CommandLine, CommandOutput, CommandRunner};

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    Missing,
}

/// Records every command and answers from canned replies keyed by a
/// word-prefix of the command line (`"docker volume rm v3"` matches
/// `docker volume rm v3` but not `docker-compose ...`). The longest matching
/// prefix wins; unmatched commands succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<(Vec<String>, Reply)>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(mut self, prefix: &str, reply: Reply) -> Self {
        let words = prefix.split_whitespace().map(str::to_string).collect();
        self.rules.push((words, reply));
        self
    }

    pub fn ok(self, prefix: &str, stdout: &str) -> Self {
        self.rule(
            prefix,
            Reply::Output(CommandOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        )
    }

    pub fn fail(self, prefix: &str, stderr: &str) -> Self {
        self.rule(
            prefix,
            Reply::Output(CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        )
    }

    /// The program cannot be spawned at all.
    pub fn missing(self, prefix: &str) -> Self {
        self.rule(prefix, Reply::Missing)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn reply_for(&self, cmd: &CommandLine) -> Reply {
        let words: Vec<&str> = std::iter::once(cmd.program.as_str())
            .chain(cmd.args.iter().map(String::as_str))
            .collect();
        self.rules
            .iter()
            .filter(|(prefix, _)| {
                prefix.len() <= words.len() && prefix.iter().zip(&words).all(|(p, w)| p == w)
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Output(CommandOutput {
                success: true,
                code: Some(0),
                ..Default::default()
            }))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, cmd: &CommandLine) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(cmd.display());
        match self.reply_for(cmd) {
            Reply::Output(out) => Ok(out),
            Reply::Missing => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: not found", cmd.program),
            )),
        }
    }
}

/// Feeds canned answers; `None` once they run out.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answers.lock().unwrap().pop_front())
    }
}

/// Readiness probe that succeeds from the `n`th call on.
pub struct ScriptedProbe {
    ready_from: Option<u32>,
    calls: AtomicU32,
}

impl ScriptedProbe {
    pub fn ready_after(n: u32) -> Self {
        Self {
            ready_from: Some(n),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            ready_from: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadinessProbe for ScriptedProbe {
    async fn check(&self, target: &HealthTarget) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.ready_from {
            Some(n) if call >= n => Ok(()),
            _ => anyhow::bail!("connection refused: {}", target.url),
        }
    }
}

/// A temporary checkout containing the given (empty) files.
pub fn fake_project(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "services: {}\n").unwrap();
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn longest_word_prefix_wins() {
        let runner = FakeRunner::new()
            .fail("docker volume rm", "generic")
            .ok("docker volume rm v2", "");
        let v1 = CommandLine::new("docker").args(["volume", "rm", "v1"]);
        let v2 = CommandLine::new("docker").args(["volume", "rm", "v2"]);
        assert!(!runner.run(&v1).await.unwrap().success);
        assert!(runner.run(&v2).await.unwrap().success);
    }

    #[tokio::test]
    async fn prefix_matches_whole_words_only() {
        let runner = FakeRunner::new().missing("docker");
        let compose = CommandLine::new("docker-compose").arg("version");
        assert!(runner.run(&compose).await.is_ok());
        assert!(runner.run(&CommandLine::new("docker").arg("info")).await.is_err());
    }
}
