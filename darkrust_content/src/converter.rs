use std::{
    ffi::OsString,
    fs, io,
    path::PathBuf,
    process::{Command, Stdio},
    time::Duration,
};

use darkrust_shared::log::{error, info, trace, warn};

use crate::{
    process::{run_process, ProcessOutput, ProcessStatus},
    ConversionOutcome, ConversionTask, ConverterConfig, ConverterKind, Error, FailureDetail, Result, SkipReason,
};

/// The external program that converts a single file.
///
/// The conversion itself is a black box: arguments go in, an exit status and the
/// captured output come back.
pub trait Converter {
    /// Name of the converter that is used in diagnostics.
    fn name(&self) -> &str;

    /// Hint that tells the user how to install the converter.
    fn installation_hint(&self) -> &str;

    /// Returns whether the converter can be invoked.
    fn check_available(&self) -> bool;

    /// Converts the source file of the `task` into its destination.
    ///
    /// An error means that the converter couldn't be invoked at all. A converter that ran
    /// and failed is reported through the status of the [`ProcessOutput`].
    fn convert(&self, task: &ConversionTask, timeout: Option<Duration>) -> io::Result<ProcessOutput>;
}

const FBX2GLTF_HINT: &str =
    "Please install it using: npm install -g fbx2gltf\nOr download from: https://github.com/facebookincubator/FBX2glTF";
const BLENDER_HINT: &str = "Please install Blender from https://www.blender.org/download/ and make sure it is in PATH";

/// [`Converter`] that runs `fbx2gltf` or Blender as a subprocess.
#[derive(Debug, Clone)]
pub struct ExternalConverter {
    kind: ConverterKind,
    program: PathBuf,
    script: Option<PathBuf>,
}

impl ExternalConverter {
    /// Creates a new [`ExternalConverter`] from the configuration.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        if config.kind == ConverterKind::Blender && config.script.is_none() {
            return Err(Error::InvalidConfiguration(
                "the Blender converter needs the path of an export script".to_owned(),
            ));
        }
        Ok(Self {
            kind: config.kind,
            program: config.program(),
            script: config.script.clone(),
        })
    }

    /// Arguments for converting the `task`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use darkrust_content::{ConversionTask, ConverterConfig, ExternalConverter, OutputFormat};
    /// let converter = ExternalConverter::from_config(&ConverterConfig::default()).unwrap();
    /// let task = ConversionTask::new("in/Aurora/Idle.FBX", "out", "Aurora", OutputFormat::Glb).unwrap();
    /// let arguments = converter.conversion_arguments(&task);
    /// assert_eq!(arguments, ["in/Aurora/Idle.FBX", "-o", "out/Aurora/Idle.glb", "--embed-images", "--binary"]);
    /// ```
    pub fn conversion_arguments(&self, task: &ConversionTask) -> Vec<OsString> {
        let mut arguments = Vec::new();
        match self.kind {
            ConverterKind::Fbx2Gltf => {
                arguments.push(task.source().into());
                arguments.push("-o".into());
                arguments.push(task.destination().into());
                // Images are always embedded so that every output file is self-contained.
                arguments.push("--embed-images".into());
                if task.format().is_binary() {
                    arguments.push("--binary".into());
                }
            }
            ConverterKind::Blender => {
                arguments.push("--background".into());
                arguments.push("--python".into());
                if let Some(script) = &self.script {
                    arguments.push(script.into());
                }
                arguments.push("--".into());
                arguments.push("--input".into());
                arguments.push(task.source().into());
                arguments.push("--output".into());
                arguments.push(task.destination().into());
                arguments.push("--format".into());
                arguments.push(task.format().extension().into());
            }
        }
        arguments
    }
}

impl Converter for ExternalConverter {
    fn name(&self) -> &str {
        self.kind.default_program()
    }

    fn installation_hint(&self) -> &str {
        match self.kind {
            ConverterKind::Fbx2Gltf => FBX2GLTF_HINT,
            ConverterKind::Blender => BLENDER_HINT,
        }
    }

    fn check_available(&self) -> bool {
        trace!("Checking availability of {}", self.program.display());
        let status = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                trace!("{} --version exited with {status}", self.program.display());
                false
            }
            Err(err) => {
                trace!("Failed to run {}: {err}", self.program.display());
                false
            }
        }
    }

    fn convert(&self, task: &ConversionTask, timeout: Option<Duration>) -> io::Result<ProcessOutput> {
        let mut command = Command::new(&self.program);
        command.args(self.conversion_arguments(task));
        run_process(&mut command, timeout)
    }
}

/// Converts a single task and classifies the result.
///
/// Nothing that goes wrong while converting a single file is returned as an error. Every
/// problem ends up in [`ConversionOutcome::Failed`] so that the remaining files of a
/// run are still converted.
pub fn convert_task<C>(converter: &C, task: &ConversionTask, skip_existing: bool, timeout: Option<Duration>) -> ConversionOutcome
where
    C: Converter + ?Sized,
{
    let destination = task.destination();
    if skip_existing && destination.is_file() {
        info!("  SKIPPED: {} already exists", display_file_name(task));
        return ConversionOutcome::Skipped(SkipReason::AlreadyExists);
    }

    let output = match converter.convert(task, timeout) {
        Ok(output) => output,
        Err(err) => {
            let message = format!("Failed to run {}: {err}", converter.name());
            error!("  ERROR: {message}");
            return ConversionOutcome::Failed(FailureDetail::Invocation { message });
        }
    };

    let detail = match output.status {
        ProcessStatus::Exited(0) => {
            info!("  SUCCESS: Created {}", display_file_name(task));
            return ConversionOutcome::Converted;
        }
        ProcessStatus::Exited(code) => FailureDetail::ExitCode {
            code,
            stderr: output.stderr,
        },
        ProcessStatus::Terminated => FailureDetail::Terminated { stderr: output.stderr },
        ProcessStatus::TimedOut(after) => {
            remove_partial_output(task);
            FailureDetail::TimedOut { after }
        }
    };
    error!("  ERROR: Failed to convert {task} ({detail})");
    ConversionOutcome::Failed(detail)
}

/// A killed converter may leave a half written file behind that a later run would skip.
fn remove_partial_output(task: &ConversionTask) {
    let destination = task.destination();
    if !destination.is_file() {
        return;
    }
    match fs::remove_file(destination) {
        Ok(()) => trace!("Removed partial output {}", destination.display()),
        Err(err) => warn!("Failed to remove partial output {}: {err}", destination.display()),
    }
}

fn display_file_name(task: &ConversionTask) -> String {
    task.destination()
        .file_name()
        .map(|file_name| file_name.to_string_lossy().into_owned())
        .unwrap_or_else(|| task.destination().display().to_string())
}
