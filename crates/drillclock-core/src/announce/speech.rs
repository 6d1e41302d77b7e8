//! Speech engines.

use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::SpeechError;

/// Turns text into audio. `speak` blocks until playback has finished, which
/// is what serializes announcements on the shared audio output.
pub trait SpeechEngine: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// Runs an external program (e.g. `espeak-ng` or `say`) once per line,
/// passing the text as the final argument.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from an argv list such as `["espeak-ng", "-v", "en"]`.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl SpeechEngine for CommandSpeech {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        debug!(program = %self.program, text, "speaking");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|source| SpeechError::Launch {
                command: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Exited {
                command: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// Drops audio and only logs the line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

impl SpeechEngine for SilentSpeech {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        info!(text, "announcement (muted)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program() {
        let argv = vec!["espeak-ng".to_string(), "-v".into(), "en".into()];
        let speech = CommandSpeech::from_argv(&argv).unwrap();
        assert_eq!(speech.program, "espeak-ng");
        assert_eq!(speech.args, vec!["-v", "en"]);
        assert!(CommandSpeech::from_argv(&[]).is_none());
    }

    #[test]
    fn missing_program_is_launch_error() {
        let speech = CommandSpeech::new("drillclock-no-such-speech-binary", Vec::new());
        assert!(matches!(
            speech.speak("start"),
            Err(SpeechError::Launch { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_checked() {
        assert!(CommandSpeech::new("true", Vec::new()).speak("start").is_ok());
        assert!(matches!(
            CommandSpeech::new("false", Vec::new()).speak("start"),
            Err(SpeechError::Exited { .. })
        ));
    }

    #[test]
    fn silent_always_succeeds() {
        assert!(SilentSpeech.speak("down").is_ok());
    }
}
