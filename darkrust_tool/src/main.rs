use std::{io, path::PathBuf, process};

use clap::{Args, Parser, ValueEnum};
use color_eyre as ey;
use darkrust_content::{
    write_mapping_file, AnimationMapping, ConversionPipeline, Converter, ConverterKind, ExternalConverter, OutputFormat, PipelineConfig,
};
use darkrust_shared::log::{self, error, info};
use ey::eyre::{eyre, Context};

#[derive(Parser, Debug)]
#[command(author, version, about = "Converts FBX animations to GLTF/GLB", long_about = None)]
enum CommandLineArguments {
    /// Convert all configured groups and write the animation mapping and the log
    Convert(Convert),
    /// Check whether the converter is installed
    Check(Check),
    /// Only write the animation mapping file
    Mapping(Mapping),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ConverterArgument {
    Fbx2gltf,
    Blender,
}

impl From<ConverterArgument> for ConverterKind {
    fn from(value: ConverterArgument) -> Self {
        match value {
            ConverterArgument::Fbx2gltf => ConverterKind::Fbx2Gltf,
            ConverterArgument::Blender => ConverterKind::Blender,
        }
    }
}

/// Arguments that all subcommands share. Values given here override the configuration file.
#[derive(Args, Debug)]
struct Settings {
    /// YAML file with the pipeline configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source directory containing FBX files [default: assets/Animations]
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Output directory for GLTF/GLB files [default: assets/Animations_GLTF]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output binary GLB format instead of GLTF
    #[arg(short, long)]
    binary: bool,

    /// External program that converts the files
    #[arg(long, value_enum)]
    converter: Option<ConverterArgument>,

    /// Path of the converter executable
    #[arg(long)]
    converter_program: Option<PathBuf>,

    /// Export script that Blender runs for every file, e.g. darkrust_tool/scripts/export_gltf.py
    #[arg(long)]
    blender_script: Option<PathBuf>,

    /// Enable trace output
    #[arg(short, long)]
    verbose: bool,
}

impl Settings {
    /// Loads the configuration file when given and applies the command line arguments on top of it.
    fn pipeline_config(&self) -> ey::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::import(path).wrap_err_with(|| format!("Failed to read configuration {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(source) = &self.source {
            config.source_dir = source.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if self.binary {
            config.format = OutputFormat::Glb;
        }
        if let Some(converter) = self.converter {
            let kind = ConverterKind::from(converter);
            if kind != config.converter.kind {
                // A program configured for another converter doesn't apply anymore.
                config.converter.program = None;
            }
            config.converter.kind = kind;
        }
        if let Some(program) = &self.converter_program {
            config.converter.program = Some(program.clone());
        }
        if let Some(script) = &self.blender_script {
            config.converter.script = Some(script.clone());
        }
        config.validate().wrap_err("Invalid configuration")?;
        Ok(config)
    }
}

#[derive(Parser, Debug)]
struct Convert {
    #[command(flatten)]
    settings: Settings,

    /// Skip files that already exist
    #[arg(long)]
    skip_existing: bool,

    /// Kill a conversion that takes longer than this many seconds and count it as failed
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Parser, Debug)]
struct Check {
    #[command(flatten)]
    settings: Settings,
}

#[derive(Parser, Debug)]
struct Mapping {
    #[command(flatten)]
    settings: Settings,
}

impl CommandLineArguments {
    fn settings(&self) -> &Settings {
        match self {
            CommandLineArguments::Convert(convert) => &convert.settings,
            CommandLineArguments::Check(check) => &check.settings,
            CommandLineArguments::Mapping(mapping) => &mapping.settings,
        }
    }
}

fn setup_logging(verbose: bool) -> ey::Result<()> {
    let level = if verbose { log::LevelFilter::Trace } else { log::LevelFilter::Info };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                darkrust_shared::chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stdout())
        .apply()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    Ok(())
}

fn convert(convert: &Convert) -> ey::Result<i32> {
    let mut config = convert.settings.pipeline_config()?;
    if convert.skip_existing {
        config.skip_existing = true;
    }
    if convert.timeout.is_some() {
        config.timeout_secs = convert.timeout;
    }

    let converter = ExternalConverter::from_config(&config.converter).wrap_err("Failed to create converter")?;
    let mut pipeline = ConversionPipeline::new(config, converter).wrap_err("Failed to create conversion pipeline")?;
    let summary = pipeline.run().wrap_err("Conversion aborted")?;

    if !summary.is_success() {
        error!("{} of {} files failed to convert", summary.statistics.failed(), summary.statistics.total());
    }
    Ok(summary.exit_code())
}

fn check(check: &Check) -> ey::Result<i32> {
    let config = check.settings.pipeline_config()?;
    let converter = ExternalConverter::from_config(&config.converter).wrap_err("Failed to create converter")?;
    if !converter.check_available() {
        return Err(eyre!(
            "{} is not installed or not in PATH\n{}",
            converter.name(),
            converter.installation_hint()
        ));
    }
    info!("{} is available", config.converter.program().display());
    Ok(0)
}

fn mapping(mapping: &Mapping) -> ey::Result<i32> {
    let config = mapping.settings.pipeline_config()?;
    let layout = darkrust_content::OutputLayout::new(&config.output_dir, Vec::<String>::new());
    layout.create_all().wrap_err("Failed to create output directory")?;
    let animation_mapping = AnimationMapping::from_table(&config.mapping, config.format);
    write_mapping_file(&layout, &animation_mapping).wrap_err("Failed to write animation mapping")?;
    Ok(0)
}

fn main() -> ey::Result<()> {
    color_eyre::install()?;

    let command_line_arguments = CommandLineArguments::parse();
    setup_logging(command_line_arguments.settings().verbose)?;

    let exit_code = match &command_line_arguments {
        CommandLineArguments::Convert(arguments) => convert(arguments)?,
        CommandLineArguments::Check(arguments) => check(arguments)?,
        CommandLineArguments::Mapping(arguments) => mapping(arguments)?,
    };
    if exit_code != 0 {
        process::exit(exit_code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use darkrust_content::{ConversionTask, ConverterConfig, GroupConfig};
    use darkrust_shared::indoc::indoc;
    use darkrust_test::write_file;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn verify_cli() {
        CommandLineArguments::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let arguments = CommandLineArguments::parse_from(["darkrust_tool", "convert"]);
        let CommandLineArguments::Convert(convert) = arguments else {
            panic!("expected the convert subcommand");
        };
        let config = convert.settings.pipeline_config().unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(!convert.skip_existing);
    }

    #[test]
    fn flags_override_defaults() {
        let arguments = CommandLineArguments::parse_from([
            "darkrust_tool",
            "convert",
            "-s",
            "raw",
            "-o",
            "out",
            "--binary",
            "--skip-existing",
            "--timeout",
            "60",
        ]);
        let CommandLineArguments::Convert(convert) = arguments else {
            panic!("expected the convert subcommand");
        };
        let config = convert.settings.pipeline_config().unwrap();
        assert_eq!(config.source_dir, PathBuf::from("raw"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.format, OutputFormat::Glb);
        assert!(convert.skip_existing);
        assert_eq!(convert.timeout, Some(60));
    }

    #[test]
    fn blender_requires_script() {
        let arguments = CommandLineArguments::parse_from(["darkrust_tool", "check", "--converter", "blender"]);
        assert!(arguments.settings().pipeline_config().is_err());

        let arguments = CommandLineArguments::parse_from([
            "darkrust_tool",
            "check",
            "--converter",
            "blender",
            "--blender-script",
            "tools/export.py",
        ]);
        let config = arguments.settings().pipeline_config().unwrap();
        assert_eq!(config.converter.kind, ConverterKind::Blender);
        assert_eq!(config.converter.program(), PathBuf::from("blender"));
    }

    #[test]
    fn flags_override_the_configuration_file() {
        let root = TempDir::new("darkrust_tool").unwrap();
        let path = root.path().join("pipeline.yaml");
        write_file(
            &path,
            indoc! {"
                source_dir: raw
                output_dir: converted
                format: glb
                groups:
                  - name: Props
                    pattern: \"*.fbx\"
                converter:
                  kind: fbx2gltf
                  program: /opt/fbx2gltf/bin/fbx2gltf
            "},
        );
        let config_argument = path.to_string_lossy().into_owned();

        let arguments = CommandLineArguments::parse_from(["darkrust_tool", "convert", "--config", config_argument.as_str(), "-s", "other"]);
        let config = arguments.settings().pipeline_config().unwrap();
        assert_eq!(config.source_dir, PathBuf::from("other"));
        assert_eq!(config.output_dir, PathBuf::from("converted"));
        assert_eq!(config.format, OutputFormat::Glb);
        assert_eq!(config.groups, vec![GroupConfig::new("Props", "*.fbx")]);
        assert_eq!(config.converter.program(), PathBuf::from("/opt/fbx2gltf/bin/fbx2gltf"));

        // The program configured for fbx2gltf must not be used to run Blender.
        let arguments = CommandLineArguments::parse_from([
            "darkrust_tool",
            "check",
            "--config",
            config_argument.as_str(),
            "--converter",
            "blender",
            "--blender-script",
            "scripts/export_gltf.py",
        ]);
        let config = arguments.settings().pipeline_config().unwrap();
        assert_eq!(config.converter.kind, ConverterKind::Blender);
        assert_eq!(config.converter.program(), PathBuf::from("blender"));
        assert_eq!(config.source_dir, PathBuf::from("raw"));
        assert_eq!(config.format, OutputFormat::Glb);
    }

    #[test]
    fn export_script_accepts_the_blender_arguments() {
        let script = include_str!("../scripts/export_gltf.py");
        assert!(script.contains("allow_abbrev=False"));

        let config = ConverterConfig {
            kind: ConverterKind::Blender,
            program: None,
            script: Some(PathBuf::from("scripts/export_gltf.py")),
        };
        let converter = ExternalConverter::from_config(&config).unwrap();
        let task = ConversionTask::new("in/Aurora/Idle.FBX", "out", "Aurora", OutputFormat::Glb).unwrap();
        let arguments = converter.conversion_arguments(&task);
        let flags = arguments
            .iter()
            .skip_while(|argument| *argument != "--")
            .skip(1)
            .map(|argument| argument.to_string_lossy().into_owned())
            .filter(|argument| argument.starts_with("--"))
            .collect::<Vec<_>>();
        assert_eq!(flags, ["--input", "--output", "--format"]);
        for flag in flags {
            assert!(script.contains(&format!("add_argument('{flag}'")), "{flag} is not accepted by the script");
        }
    }
}
