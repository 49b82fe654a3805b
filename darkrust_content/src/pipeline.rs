use std::{fmt, path::PathBuf};

use darkrust_shared::{
    chrono::Local,
    log::{error, info, trace},
};

use crate::{
    convert_task, scan_group, write_log_file, write_mapping_file, AnimationMapping, ConversionLog, Converter, Error, GroupConfig,
    LogSettings, OutputLayout, PipelineConfig, Result, RunStatistics,
};

/// States of a [`ConversionPipeline`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ToolChecked,
    DirectoriesPrepared,
    ConvertingGroup(String),
    Aggregated,
    Reported,
    Done,
    /// The converter is not available. Nothing was created.
    AbortedToolMissing,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::ConvertingGroup(group) => write!(f, "ConvertingGroup({group})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// What a finished run hands back to its caller.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub statistics: RunStatistics,
    pub mapping_file: PathBuf,
    pub log_file: PathBuf,
    /// Output files found on disk after the run, relative to the output directory
    pub outputs: Vec<PathBuf>,
}

impl RunSummary {
    /// A run is successful when no conversion failed.
    pub fn is_success(&self) -> bool {
        self.statistics.is_success()
    }

    /// Process exit code for the run.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Drives a conversion run: checks the converter, prepares the output directories,
/// converts every group one after another and writes the mapping and the log.
pub struct ConversionPipeline<C> {
    config: PipelineConfig,
    converter: C,
    state: PipelineState,
}

impl<C> ConversionPipeline<C>
where
    C: Converter,
{
    /// Creates a new [`ConversionPipeline`]. Fails when the configuration is invalid.
    pub fn new(config: PipelineConfig, converter: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            converter,
            state: PipelineState::Idle,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// State the pipeline is in. After [`ConversionPipeline::run`] it's either
    /// [`PipelineState::Done`] or [`PipelineState::AbortedToolMissing`].
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Layout of the output directory for the configured groups.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.config.output_dir, self.config.groups.iter().map(|group| group.name.clone()))
    }

    /// Checks whether the converter can be invoked.
    pub fn check_tool(&self) -> bool {
        self.converter.check_available()
    }

    /// Runs the whole pipeline.
    ///
    /// Only a missing converter aborts the run. Failures of single files are recorded in
    /// the [`RunStatistics`] of the returned [`RunSummary`] and the run continues with the
    /// next file.
    pub fn run(&mut self) -> Result<RunSummary> {
        info!("==================================================");
        info!("FBX to GLTF Animation Converter");
        info!("==================================================");

        if !self.check_tool() {
            self.transition(PipelineState::AbortedToolMissing);
            error!("ERROR: {} is not installed or not in PATH", self.converter.name());
            error!("{}", self.converter.installation_hint());
            return Err(Error::ConverterUnavailable {
                tool: self.converter.name().to_owned(),
                hint: self.converter.installation_hint().to_owned(),
            });
        }
        self.transition(PipelineState::ToolChecked);

        let layout = self.layout();
        layout.create_all()?;
        self.transition(PipelineState::DirectoriesPrepared);

        let mut statistics = RunStatistics::new();
        let groups = self.config.groups.clone();
        for group in &groups {
            self.transition(PipelineState::ConvertingGroup(group.name.clone()));
            info!("");
            info!("Converting {} animations...", group.name);
            info!("----------------------------------------");
            self.convert_group(group, &mut statistics);
        }
        self.transition(PipelineState::Aggregated);

        info!("==================================================");
        info!("Conversion Complete!");
        info!("==================================================");
        info!("Total files converted: {}", statistics.converted());
        info!("Total files skipped: {}", statistics.skipped());
        info!("Total errors: {}", statistics.failed());
        info!("Output directory: {}", layout.root().display());

        let mapping = AnimationMapping::from_table(&self.config.mapping, self.config.format);
        let mapping_file = write_mapping_file(&layout, &mapping)?;

        let outputs = layout.scan_outputs();
        let log = ConversionLog {
            settings: LogSettings {
                source_dir: self.config.source_dir.clone(),
                output_dir: self.config.output_dir.clone(),
                format: self.config.format,
                skip_existing: self.config.skip_existing,
            },
            statistics: &statistics,
            outputs: &outputs,
            generated_at: Local::now(),
        };
        let log_file = write_log_file(&layout, &log)?;
        self.transition(PipelineState::Reported);

        self.transition(PipelineState::Done);
        Ok(RunSummary {
            statistics,
            mapping_file,
            log_file,
            outputs,
        })
    }

    /// Converts all files of the `group`. A group that can't be scanned is skipped like a missing one.
    fn convert_group(&self, group: &GroupConfig, statistics: &mut RunStatistics) {
        let tasks = match scan_group(&self.config.source_dir, &self.config.output_dir, group, self.config.format) {
            Ok(scan) => scan.into_tasks(),
            Err(err) => {
                error!("Failed to scan group '{}': {err}", group.name);
                return;
            }
        };

        for task in tasks {
            info!("Converting: {}", task.source().display());
            let outcome = convert_task(&self.converter, &task, self.config.skip_existing, self.config.timeout());
            statistics.record(task.group(), task.stem(), &outcome);
        }
    }

    fn transition(&mut self, state: PipelineState) {
        trace!("Pipeline state: {} -> {}", self.state, state);
        self.state = state;
    }
}
