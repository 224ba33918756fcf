//! Scripted stand-ins for the platform fetcher and the operator prompt

use localai_core::errors::{LaunchError, Result};
use localai_core::platform::SourceFetcher;
use localai_core::prompt::Confirm;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

/// Fetcher that lays down a minimal platform checkout instead of cloning
#[derive(Default)]
pub struct FakeFetcher {
    fail_fetch: bool,
    fail_update: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_fetch() -> Self {
        Self {
            fail_fetch: true,
            ..Default::default()
        }
    }

    pub fn failing_update() -> Self {
        Self {
            fail_update: true,
            ..Default::default()
        }
    }

    /// `"fetch"` / `"update"` in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SourceFetcher for FakeFetcher {
    async fn fetch(&self, dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push("fetch".to_string());
        if self.fail_fetch {
            return Err(LaunchError::CommandFailed {
                command: "git clone".to_string(),
                code: Some(128),
            });
        }
        let docker = dest.join("docker");
        std::fs::create_dir_all(&docker).map_err(|e| LaunchError::file(&docker, e))?;
        let compose = docker.join("docker-compose.yml");
        std::fs::write(&compose, "services:\n  db:\n    image: supabase/postgres\n")
            .map_err(|e| LaunchError::file(&compose, e))
    }

    async fn update(&self, _dest: &Path) -> Result<()> {
        self.calls.lock().unwrap().push("update".to_string());
        if self.fail_update {
            return Err(LaunchError::CommandFailed {
                command: "git pull".to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

/// Answers prompts from a script and records the questions asked.
///
/// Once the script runs out every further answer is `default`.
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
    default: bool,
    questions: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            default: false,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn always(answer: bool) -> Self {
        Self {
            default: answer,
            ..Self::new(&[])
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, question: &str) -> bool {
        self.questions.lock().unwrap().push(question.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default)
    }
}
