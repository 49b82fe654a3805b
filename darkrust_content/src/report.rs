use std::{fs, path::PathBuf};

use darkrust_shared::{
    chrono::{DateTime, Local},
    indoc::formatdoc,
    join_lines,
    log::info,
    serde_json,
};
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{Error, MappingTable, OutputFormat, OutputLayout, Result, RunStatistics};

/// Maps group name → logical animation key → file name of the converted animation.
///
/// The mapping describes the naming convention the game expects. It's derived from the
/// static [`MappingTable`] alone and doesn't depend on which files were converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationMapping {
    groups: Vec<(String, Vec<(String, String)>)>,
}

impl AnimationMapping {
    /// Creates the mapping for the given output format.
    ///
    /// # Example
    ///
    /// ```rust
    /// use darkrust_content::{AnimationMapping, MappingTable, OutputFormat};
    /// let mapping = AnimationMapping::from_table(&MappingTable::default(), OutputFormat::Glb);
    /// assert_eq!(mapping.get("Aurora", "idle"), Some("Idle.glb"));
    /// assert_eq!(mapping.get("GreatSword", "slash"), Some("Great Sword Slash.glb"));
    /// ```
    pub fn from_table(table: &MappingTable, format: OutputFormat) -> Self {
        let groups = table
            .groups
            .iter()
            .map(|group| {
                let entries = group
                    .entries
                    .iter()
                    .map(|entry| (entry.key.clone(), format!("{}.{}", entry.stem, format.extension())))
                    .collect();
                (group.name.clone(), entries)
            })
            .collect();
        Self { groups }
    }

    /// Returns the file name for the `key` in `group`.
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(name, _)| name == group)
            .and_then(|(_, entries)| entries.iter().find(|(k, _)| k == key))
            .map(|(_, file)| file.as_str())
    }

    /// Iterates over all file names in the mapping.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|(_, entries)| entries.iter().map(|(_, file)| file.as_str()))
    }

    /// Serializes the mapping as JSON with two spaces of indentation and a trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Serializes a list of pairs as a map while keeping the order of the list.
struct OrderedMap<'a, V>(&'a [(String, V)]);

impl<V: Serialize> Serialize for OrderedMap<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for AnimationMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (group, entries) in &self.groups {
            map.serialize_entry(group, &OrderedMap(entries))?;
        }
        map.end()
    }
}

/// Writes the `mapping` into the mapping file of the `layout` and returns the path of the file.
pub fn write_mapping_file(layout: &OutputLayout, mapping: &AnimationMapping) -> Result<PathBuf> {
    let path = layout.mapping_file_path();
    let json = mapping.to_json().map_err(|err| Error::Serialization {
        path: path.clone(),
        message: err.to_string(),
    })?;
    fs::write(&path, json)?;
    info!("Animation mapping file created: {}", path.display());
    Ok(path)
}

/// Settings of a run as they appear in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub skip_existing: bool,
}

/// Human readable report of a run.
#[derive(Debug, Clone)]
pub struct ConversionLog<'a> {
    pub settings: LogSettings,
    pub statistics: &'a RunStatistics,
    /// Output files relative to the output directory
    pub outputs: &'a [PathBuf],
    pub generated_at: DateTime<Local>,
}

impl ConversionLog<'_> {
    /// Renders the log as text.
    pub fn render(&self) -> String {
        let settings = &self.settings;
        let statistics = self.statistics;

        let mut text = formatdoc! {"
            FBX to GLTF Conversion Log
            Generated: {generated_at}
            =======================================

            Settings:
            - Source Directory: {source_dir}
            - Output Directory: {output_dir}
            - Format: {format}
            - Skip Existing: {skip_existing}

            Results:
            - Total files converted: {converted}
            - Total files skipped: {skipped}
            - Total errors: {failed}

            File Details:
            {details}
            ",
            generated_at = self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            source_dir = settings.source_dir.display(),
            output_dir = settings.output_dir.display(),
            format = settings.format,
            skip_existing = settings.skip_existing,
            converted = statistics.converted(),
            skipped = statistics.skipped(),
            failed = statistics.failed(),
            details = join_lines(statistics.entries().iter().map(ToString::to_string)),
        };

        if !statistics.is_success() {
            text.push_str("Failure Details:\n");
            text.push_str(&join_lines(statistics.failures().map(|entry| {
                format!(
                    "{}/{}: {}",
                    entry.group,
                    entry.stem,
                    entry.detail.as_deref().unwrap_or("unknown error")
                )
            })));
            text.push('\n');
        }

        text.push_str("Converted Files:\n");
        text.push_str(&join_lines(
            self.outputs
                .iter()
                .map(|output| settings.output_dir.join(output).display().to_string()),
        ));
        text
    }
}

/// Writes the `log` into the log file of the `layout` and returns the path of the file.
pub fn write_log_file(layout: &OutputLayout, log: &ConversionLog) -> Result<PathBuf> {
    let path = layout.log_file_path();
    fs::write(&path, log.render())?;
    info!("Log file created: {}", path.display());
    Ok(path)
}

/// Reads a mapping file back.
#[cfg(test)]
pub(crate) fn read_mapping_file(path: impl AsRef<std::path::Path>) -> Result<serde_json::Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|err| Error::Serialization {
        path: path.to_owned(),
        message: err.to_string(),
    })
}
