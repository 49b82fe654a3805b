use std::{
    fs,
    path::{Path, PathBuf},
};

use darkrust_shared::{
    log::{info, warn},
    pathdiff,
    walkdir::WalkDir,
};

use crate::{common::extract_extension_from_path, Result};

pub const MAPPING_FILE_NAME: &str = "animation_mapping.json";
pub const LOG_FILE_NAME: &str = "conversion_log.txt";

/// Extensions of the files that count as converted output.
const OUTPUT_EXTENSIONS: [&str; 2] = ["gltf", "glb"];

/// The output directory and the subdirectories of the groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    groups: Vec<String>,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            root: root.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.root.join(group)
    }

    pub fn mapping_file_path(&self) -> PathBuf {
        self.root.join(MAPPING_FILE_NAME)
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    /// Creates the output directory and the directories of all groups. Directories that already exist are left alone.
    ///
    /// # Example
    ///
    /// ```rust
    /// use darkrust_content::OutputLayout;
    /// let layout = OutputLayout::new("target/doc_layout", ["Aurora", "Great_Sword"]);
    /// layout.create_all().unwrap();
    /// layout.create_all().unwrap();
    /// assert!(layout.group_dir("Aurora").is_dir());
    /// ```
    pub fn create_all(&self) -> Result<()> {
        let directories = std::iter::once(self.root.clone()).chain(self.groups.iter().map(|group| self.group_dir(group)));
        for directory in directories {
            fs::create_dir_all(&directory)?;
            info!("Created directory: {}", directory.display());
        }
        Ok(())
    }

    /// Walks the output directory and returns the paths of all GLTF and GLB files relative to the root, sorted.
    ///
    /// This looks at the disk instead of the bookkeeping of the run so that files from
    /// earlier runs are listed as well.
    pub fn scan_outputs(&self) -> Vec<PathBuf> {
        let mut outputs = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Failed to read directory entry in {}: {err}", self.root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(extension) = extract_extension_from_path(entry.path()) else {
                continue;
            };
            if !OUTPUT_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }
            let Some(relative_path) = pathdiff::diff_paths(entry.path(), &self.root) else {
                warn!(
                    "Failed to get relative path of '{}' relative to '{}'",
                    entry.path().display(),
                    self.root.display()
                );
                continue;
            };
            outputs.push(relative_path);
        }
        outputs.sort();
        outputs
    }
}
