use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use darkrust_shared::{log::info, serde_yaml};
use serde::{Deserialize, Serialize};

use crate::{pattern::WildcardPattern, Error, OutputFormat, Result};

pub const DEFAULT_SOURCE_DIR: &str = "assets/Animations";
pub const DEFAULT_OUTPUT_DIR: &str = "assets/Animations_GLTF";

/// A named set of source files that share a subdirectory and a file pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Name of the group. It's also the name of the subdirectory in the source and output directory.
    pub name: String,
    /// Wildcard pattern for the file names of the source files, e.g. `*.FBX`
    pub pattern: String,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

fn default_case_sensitive() -> bool {
    true
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            case_sensitive: true,
        }
    }

    /// Compiles the pattern of the group.
    pub fn wildcard_pattern(&self) -> Result<WildcardPattern> {
        WildcardPattern::new(self.pattern.clone(), self.case_sensitive)
    }

    /// The groups that are converted when nothing else is configured.
    pub fn default_groups() -> Vec<Self> {
        vec![Self::new("Aurora", "*.FBX"), Self::new("Great_Sword", "*.fbx")]
    }
}

/// The external program that does the actual conversion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    #[default]
    Fbx2Gltf,
    Blender,
}

impl ConverterKind {
    /// Name of the executable when no explicit program is configured.
    pub fn default_program(self) -> &'static str {
        match self {
            ConverterKind::Fbx2Gltf => "fbx2gltf",
            ConverterKind::Blender => "blender",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub kind: ConverterKind,
    /// Path or name of the executable. Falls back to [`ConverterKind::default_program`].
    pub program: Option<PathBuf>,
    /// Export script that Blender runs for every file
    pub script: Option<PathBuf>,
}

impl ConverterConfig {
    pub fn program(&self) -> PathBuf {
        self.program
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.kind.default_program()))
    }
}

/// Maps a logical animation key to the stem of the exported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub key: String,
    #[serde(rename = "file")]
    pub stem: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingGroup {
    pub name: String,
    pub entries: Vec<MappingEntry>,
}

impl MappingGroup {
    fn from_pairs(name: &str, pairs: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_owned(),
            entries: pairs
                .iter()
                .map(|(key, stem)| MappingEntry {
                    key: (*key).to_owned(),
                    stem: (*stem).to_owned(),
                })
                .collect(),
        }
    }
}

/// Static table from which the animation mapping file is generated.
///
/// The order of the groups and entries is the order in which they appear in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    pub groups: Vec<MappingGroup>,
}

impl Default for MappingTable {
    fn default() -> Self {
        // Mapping group names are the names the game looks up, not the directory names.
        let aurora = MappingGroup::from_pairs(
            "Aurora",
            &[
                ("idle", "Idle"),
                ("walk", "Jog_Fwd"),
                ("run", "Jog_Fwd"),
                ("walk_combat", "Jog_Fwd_Combat"),
                ("roll_forward", "Ability_RMB_Fwd"),
                ("roll_backward", "Ability_RMB_Bwd"),
                ("roll_left", "Ability_RMB_Left"),
                ("roll_right", "Ability_RMB_Right"),
                ("jump_start", "Jump_Start"),
                ("jump_apex", "Jump_Apex"),
                ("jump_land", "Jump_Land"),
                ("jump_recovery", "Jump_Recovery"),
                ("attack_1", "Primary_Attack_A"),
                ("attack_2", "Primary_Attack_B"),
                ("attack_3", "Primary_Attack_C"),
                ("attack_fast", "Primary_Attack_Fast_A"),
                ("attack_slow", "Primary_Attack_Slow_A"),
                ("parry", "HitReact_Front"),
                ("death", "Death"),
                ("hit_front", "HitReact_Front"),
                ("hit_back", "HitReact_Back"),
                ("hit_left", "HitReact_Left"),
                ("hit_right", "HitReact_Right"),
            ],
        );
        let great_sword = MappingGroup::from_pairs(
            "GreatSword",
            &[
                ("idle", "Great Sword Idle"),
                ("walk", "Great Sword Walk"),
                ("run", "Great Sword Run"),
                ("slash", "Great Sword Slash"),
                ("kick", "Great Sword Kick"),
                ("impact", "Great Sword Impact"),
                ("sheath", "Great Sword Sheath"),
                ("strafe", "Great Sword Strafe"),
                ("turn", "Great Sword Turn"),
            ],
        );
        Self {
            groups: vec![aurora, great_sword],
        }
    }
}

/// Everything that determines a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub skip_existing: bool,
    /// Upper bound for a single conversion. A conversion that takes longer is killed and counted as failed.
    pub timeout_secs: Option<u64>,
    pub groups: Vec<GroupConfig>,
    pub converter: ConverterConfig,
    pub mapping: MappingTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            format: OutputFormat::default(),
            skip_existing: false,
            timeout_secs: None,
            groups: GroupConfig::default_groups(),
            converter: ConverterConfig::default(),
            mapping: MappingTable::default(),
        }
    }
}

impl PipelineConfig {
    /// Imports a configuration from the YAML file at `path`. Missing fields take their default value.
    pub fn import(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading pipeline configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parses a configuration from YAML and validates it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use darkrust_content::{OutputFormat, PipelineConfig};
    /// let config = PipelineConfig::from_yaml("format: glb\nskip_existing: true").unwrap();
    /// assert_eq!(config.format, OutputFormat::Glb);
    /// assert!(config.skip_existing);
    /// assert_eq!(config.groups.len(), 2);
    /// ```
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).map_err(|err| Error::InvalidConfiguration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Checks the constraints that serde can't express.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(Error::InvalidConfiguration("group names must not be empty".to_owned()));
            }
            if group.name.contains(['/', '\\']) {
                return Err(Error::InvalidConfiguration(format!(
                    "group name '{}' must not contain a path separator",
                    group.name
                )));
            }
            if !names.insert(group.name.as_str()) {
                return Err(Error::InvalidConfiguration(format!("group '{}' is configured twice", group.name)));
            }
            group
                .wildcard_pattern()
                .map_err(|err| Error::InvalidConfiguration(format!("group '{}': {err}", group.name)))?;
        }
        if self.timeout_secs == Some(0) {
            return Err(Error::InvalidConfiguration("the timeout must be at least one second".to_owned()));
        }
        if self.converter.kind == ConverterKind::Blender && self.converter.script.is_none() {
            return Err(Error::InvalidConfiguration(
                "the Blender converter needs the path of an export script".to_owned(),
            ));
        }
        Ok(())
    }
}
