use std::{
    fmt::{self, Formatter},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{common::extract_file_stem_from_path, OutputFormat, Result};

/// One source file that has to be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    source: PathBuf,
    destination: PathBuf,
    group: String,
    stem: String,
    format: OutputFormat,
}

impl ConversionTask {
    /// Creates a new [`ConversionTask`] for the `source` file.
    ///
    /// The destination has the same stem as the source and is located in the directory
    /// of the group inside `output_dir`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::path::Path;
    /// use darkrust_content::{ConversionTask, OutputFormat};
    /// let task = ConversionTask::new("src/Aurora/Idle.FBX", "out", "Aurora", OutputFormat::Glb).unwrap();
    /// assert_eq!(task.destination(), Path::new("out/Aurora/Idle.glb"));
    /// assert_eq!(task.stem(), "Idle");
    /// ```
    pub fn new(source: impl Into<PathBuf>, output_dir: impl AsRef<Path>, group: impl Into<String>, format: OutputFormat) -> Result<Self> {
        let source = source.into();
        let group = group.into();
        let stem = extract_file_stem_from_path(&source)?;
        let destination = output_dir
            .as_ref()
            .join(&group)
            .join(format!("{stem}.{}", format.extension()));
        Ok(Self {
            source,
            destination,
            group,
            stem,
            format,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Name of the group the source file belongs to.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// File name of the source without extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl fmt::Display for ConversionTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.stem)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination file exists and existing files are skipped.
    AlreadyExists,
}

/// Why a conversion failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDetail {
    /// The converter exited with a non-zero exit code.
    ExitCode { code: i32, stderr: String },
    /// The converter was terminated by a signal and has no exit code.
    Terminated { stderr: String },
    /// The converter didn't finish in time and was killed.
    TimedOut { after: Duration },
    /// The converter couldn't be invoked at all.
    Invocation { message: String },
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::ExitCode { code, stderr } if stderr.trim().is_empty() => write!(f, "Exit code: {code}"),
            FailureDetail::ExitCode { code, stderr } => write!(f, "Exit code: {code}, error details: {}", stderr.trim()),
            FailureDetail::Terminated { stderr } if stderr.trim().is_empty() => write!(f, "Terminated by a signal"),
            FailureDetail::Terminated { stderr } => write!(f, "Terminated by a signal, error details: {}", stderr.trim()),
            FailureDetail::TimedOut { after } => write!(f, "Timed out after {} s", after.as_secs_f32()),
            FailureDetail::Invocation { message } => write!(f, "{message}"),
        }
    }
}

/// Terminal result of a [`ConversionTask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted,
    Skipped(SkipReason),
    Failed(FailureDetail),
}

/// Discriminant of [`ConversionOutcome`] without the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Converted,
    Skipped,
    Failed,
}

impl ConversionOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ConversionOutcome::Converted => OutcomeKind::Converted,
            ConversionOutcome::Skipped(_) => OutcomeKind::Skipped,
            ConversionOutcome::Failed(_) => OutcomeKind::Failed,
        }
    }
}

impl OutcomeKind {
    /// Label that is used in the log file.
    pub fn label(self) -> &'static str {
        match self {
            OutcomeKind::Converted => "Converted",
            OutcomeKind::Skipped => "Skipped (exists)",
            OutcomeKind::Failed => "Failed",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_uses_format_extension() {
        let task = ConversionTask::new("in/Great_Sword/Great Sword Idle.fbx", "out", "Great_Sword", OutputFormat::Gltf).unwrap();
        assert_eq!(task.destination(), Path::new("out/Great_Sword/Great Sword Idle.gltf"));
        assert_eq!(task.group(), "Great_Sword");
        assert_eq!(task.format(), OutputFormat::Gltf);
        assert_eq!(task.to_string(), "Great_Sword/Great Sword Idle");
    }

    #[test]
    fn source_without_file_name() {
        assert!(ConversionTask::new("..", "out", "Aurora", OutputFormat::Gltf).is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(ConversionOutcome::Converted.kind().label(), "Converted");
        assert_eq!(ConversionOutcome::Skipped(SkipReason::AlreadyExists).kind().label(), "Skipped (exists)");
        let failed = ConversionOutcome::Failed(FailureDetail::Invocation { message: "gone".to_owned() });
        assert_eq!(failed.kind(), OutcomeKind::Failed);
        assert_eq!(failed.kind().to_string(), "Failed");
    }

    #[test]
    fn failure_detail_display() {
        let detail = FailureDetail::ExitCode {
            code: 2,
            stderr: "  corrupt file\n".to_owned(),
        };
        assert_eq!(detail.to_string(), "Exit code: 2, error details: corrupt file");
        let detail = FailureDetail::ExitCode { code: 1, stderr: String::new() };
        assert_eq!(detail.to_string(), "Exit code: 1");
        let detail = FailureDetail::TimedOut {
            after: Duration::from_millis(1500),
        };
        assert_eq!(detail.to_string(), "Timed out after 1.5 s");
    }
}
