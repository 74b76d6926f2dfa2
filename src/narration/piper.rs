use std::{
    ffi::OsString,
    io::Write as _,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use serde::{Deserialize, Serialize};

use crate::{
    encode::ffmpeg::ensure_parent_dir,
    foundation::error::{StoryError, StoryResult},
};

/// Turns story text into a narration audio file.
pub trait NarrationEngine {
    /// Produce narration for `text`, returning the path of the audio file.
    fn generate(&self, text: &str, out_path: &Path) -> StoryResult<PathBuf>;
}

/// Execution strategy for the Piper process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accel {
    Gpu,
    Cpu,
}

impl Accel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiperConfig {
    /// Piper executable, looked up on `PATH` when not absolute.
    pub piper_path: PathBuf,
    /// Voice model (`.onnx`); Piper's default voice is used when unset.
    pub voice_model: Option<PathBuf>,
    /// Try `--cuda` before falling back to CPU.
    pub use_gpu: bool,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            piper_path: PathBuf::from("piper"),
            voice_model: None,
            use_gpu: true,
        }
    }
}

/// Narration through the Piper TTS executable, text on stdin.
#[derive(Clone, Debug, Default)]
pub struct PiperEngine {
    cfg: PiperConfig,
}

impl PiperEngine {
    pub fn new(cfg: PiperConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PiperConfig {
        &self.cfg
    }

    /// Strategies in the order they are attempted.
    pub fn strategies(&self) -> Vec<Accel> {
        if self.cfg.use_gpu {
            vec![Accel::Gpu, Accel::Cpu]
        } else {
            vec![Accel::Cpu]
        }
    }

    pub fn command_args(&self, accel: Accel, out_path: &Path) -> Vec<OsString> {
        let mut args = Vec::<OsString>::new();
        if let Some(model) = &self.cfg.voice_model {
            args.push("-m".into());
            args.push(model.clone().into_os_string());
        }
        if accel == Accel::Gpu {
            args.push("--cuda".into());
        }
        args.push("-f".into());
        args.push(out_path.as_os_str().to_os_string());
        args
    }

    fn run_once(&self, accel: Accel, text: &str, out_path: &Path) -> StoryResult<()> {
        // A stale file from an earlier attempt must not count as success.
        let _ = std::fs::remove_file(out_path);

        let mut child = Command::new(&self.cfg.piper_path)
            .args(self.command_args(accel, out_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StoryError::narration(format!(
                    "failed to spawn '{}': {e}",
                    self.cfg.piper_path.display()
                ))
            })?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| StoryError::narration("failed to open piper stdin"))?;
            // Piper may exit before reading everything; its exit status is what counts.
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                tracing::debug!(error = %e, "piper closed stdin early");
            }
        }
        drop(child.stdin.take());

        let output = child
            .wait_with_output()
            .map_err(|e| StoryError::narration(format!("failed to wait for piper: {e}")))?;
        if !output.status.success() {
            return Err(StoryError::narration(format!(
                "piper ({}) exited with status {}: {}",
                accel.label(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !out_path.is_file() {
            return Err(StoryError::narration(format!(
                "piper ({}) reported success but wrote no audio to '{}'",
                accel.label(),
                out_path.display()
            )));
        }
        Ok(())
    }
}

impl NarrationEngine for PiperEngine {
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    fn generate(&self, text: &str, out_path: &Path) -> StoryResult<PathBuf> {
        if text.trim().is_empty() {
            return Err(StoryError::validation("cannot narrate empty text"));
        }
        ensure_parent_dir(out_path)?;

        let mut last_err = None;
        for accel in self.strategies() {
            tracing::info!(strategy = accel.label(), "generating narration with piper");
            match self.run_once(accel, text, out_path) {
                Ok(()) => return Ok(out_path.to_path_buf()),
                Err(error) => {
                    tracing::warn!(strategy = accel.label(), %error, "narration attempt failed");
                    last_err = Some(error);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| StoryError::narration("no narration strategy available")))
    }
}

/// Narration supplied as an existing audio file; the text is not used.
#[derive(Clone, Debug)]
pub struct PrerecordedAudio {
    path: PathBuf,
}

impl PrerecordedAudio {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NarrationEngine for PrerecordedAudio {
    fn generate(&self, _text: &str, _out_path: &Path) -> StoryResult<PathBuf> {
        if !self.path.is_file() {
            return Err(StoryError::narration(format!(
                "narration audio '{}' does not exist",
                self.path.display()
            )));
        }
        Ok(self.path.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/piper.rs"]
mod tests;
