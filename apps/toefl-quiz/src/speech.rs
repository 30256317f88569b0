//! Spoken pronunciation hints.

use crate::config::SpeechConfig;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

/// Reads a word aloud.
pub trait Speaker {
    fn speak(&self, word: &str);
}

/// Runs an external text-to-speech program with the word as its last argument.
pub struct CommandSpeaker {
    program: Option<String>,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: Some(program.into()),
            args,
        }
    }

    /// Speaker that never makes a sound.
    pub fn disabled() -> Self {
        Self {
            program: None,
            args: Vec::new(),
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        if config.enabled && !config.command.trim().is_empty() {
            Self::new(config.command.trim(), config.args.clone())
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.program.is_some()
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, word: &str) {
        let Some(program) = &self.program else { return };

        let spawned = Command::new(program)
            .args(&self.args)
            .arg(word)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                tracing::debug!(program = %program, word, "speaking word");
                reap(child);
            }
            Err(err) => tracing::debug!(program = %program, error = %err, "speech unavailable"),
        }
    }
}

/// Wait for a finished speech process off the UI thread.
fn reap(mut child: Child) -> JoinHandle<Option<ExitStatus>> {
    std::thread::spawn(move || match child.wait() {
        Ok(status) => Some(status),
        Err(err) => {
            tracing::debug!(error = %err, "speech process wait failed");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_speaker_is_noop() {
        let speaker = CommandSpeaker::disabled();
        assert!(!speaker.is_enabled());
        speaker.speak("dog");
    }

    #[test]
    fn test_missing_program_does_not_panic() {
        let speaker = CommandSpeaker::new("definitely-not-a-real-tts-binary", Vec::new());
        assert!(speaker.is_enabled());
        speaker.speak("dog");
    }

    #[cfg(unix)]
    #[test]
    fn test_reap_collects_exit_status() {
        let child = Command::new("sh")
            .args(["-c", "exit 3"])
            .stdin(Stdio::null())
            .spawn()
            .unwrap();
        let status = reap(child).join().unwrap().unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_from_config() {
        let mut config = SpeechConfig::default();
        config.enabled = false;
        assert!(!CommandSpeaker::from_config(&config).is_enabled());

        config.enabled = true;
        config.command = "  ".to_string();
        assert!(!CommandSpeaker::from_config(&config).is_enabled());

        config.command = "espeak".to_string();
        assert!(CommandSpeaker::from_config(&config).is_enabled());
    }
}
