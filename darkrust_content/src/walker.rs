use std::path::{Path, PathBuf};

use darkrust_shared::{
    log::{info, trace, warn},
    walkdir::WalkDir,
};

use crate::{common::extract_file_name_from_path, ConversionTask, GroupConfig, OutputFormat, Result};

/// Result of looking for the source files of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupScan {
    /// The source directory of the group doesn't exist.
    Missing(PathBuf),
    /// The source directory exists but no file matches the pattern.
    Empty(PathBuf),
    /// Tasks for all matching files, sorted by file name.
    Tasks(Vec<ConversionTask>),
}

impl GroupScan {
    /// Consumes the scan and returns the tasks. Empty for [`GroupScan::Missing`] and [`GroupScan::Empty`].
    pub fn into_tasks(self) -> Vec<ConversionTask> {
        match self {
            GroupScan::Tasks(tasks) => tasks,
            GroupScan::Missing(_) | GroupScan::Empty(_) => Vec::new(),
        }
    }
}

/// Finds the source files of the `group` in `source_dir` and creates a [`ConversionTask`] for each.
///
/// Only the files directly in the directory of the group are considered. A missing
/// directory isn't an error because groups are independent of each other.
pub fn scan_group(source_dir: &Path, output_dir: &Path, group: &GroupConfig, format: OutputFormat) -> Result<GroupScan> {
    let group_path = source_dir.join(&group.name);
    if !group_path.is_dir() {
        warn!("  WARNING: Source directory {} does not exist", group_path.display());
        return Ok(GroupScan::Missing(group_path));
    }

    let pattern = group.wildcard_pattern()?;
    let mut sources = Vec::new();
    for entry in WalkDir::new(&group_path).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to read directory entry in {}: {err}", group_path.display());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(file_name) = extract_file_name_from_path(entry.path()) else {
            warn!("Ignoring file with a name that is not valid UTF-8: {}", entry.path().display());
            continue;
        };
        if !pattern.matches(&file_name) {
            trace!("Ignoring '{file_name}' because it doesn't match '{}'", pattern.as_str());
            continue;
        }

        sources.push(entry.into_path());
    }

    if sources.is_empty() {
        info!("  No {} files found in {}", pattern.as_str(), group_path.display());
        return Ok(GroupScan::Empty(group_path));
    }

    let tasks = sources
        .into_iter()
        .map(|source| ConversionTask::new(source, output_dir, group.name.clone(), format))
        .collect::<Result<Vec<_>>>()?;
    trace!("Found {} files for group '{}'", tasks.len(), group.name);
    Ok(GroupScan::Tasks(tasks))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use darkrust_test::{setup_logger, write_file};
    use tempdir::TempDir;

    use super::*;

    fn stems(scan: GroupScan) -> Vec<String> {
        scan.into_tasks().iter().map(|task| task.stem().to_owned()).collect()
    }

    #[test]
    fn matching_files_sorted() {
        setup_logger();
        let root = TempDir::new("walker").unwrap();
        let source = root.path().join("source");
        write_file(source.join("Aurora/Jog_Fwd.FBX"), "");
        write_file(source.join("Aurora/Idle.FBX"), "");
        write_file(source.join("Aurora/Death.FBX"), "");
        write_file(source.join("Aurora/notes.txt"), "");
        write_file(source.join("Aurora/lower.fbx"), "");

        let group = GroupConfig::new("Aurora", "*.FBX");
        let scan = scan_group(&source, &root.path().join("output"), &group, OutputFormat::Glb).unwrap();
        let tasks = scan.clone().into_tasks();
        assert_eq!(stems(scan), vec!["Death", "Idle", "Jog_Fwd"]);
        assert_eq!(tasks[0].destination(), root.path().join("output/Aurora/Death.glb"));
        assert_eq!(tasks[0].group(), "Aurora");
    }

    #[test]
    fn case_insensitive_group() {
        setup_logger();
        let root = TempDir::new("walker").unwrap();
        let source = root.path().join("source");
        write_file(source.join("Props/a.FBX"), "");
        write_file(source.join("Props/b.fbx"), "");

        let group = GroupConfig {
            case_sensitive: false,
            ..GroupConfig::new("Props", "*.fbx")
        };
        let scan = scan_group(&source, root.path(), &group, OutputFormat::Gltf).unwrap();
        assert_eq!(stems(scan), vec!["a", "b"]);
    }

    #[test]
    fn subdirectories_are_not_descended() {
        setup_logger();
        let root = TempDir::new("walker").unwrap();
        let source = root.path().join("source");
        write_file(source.join("Aurora/Idle.FBX"), "");
        write_file(source.join("Aurora/Old/Idle_v1.FBX"), "");
        fs::create_dir_all(source.join("Aurora/Folder.FBX")).unwrap();

        let group = GroupConfig::new("Aurora", "*.FBX");
        let scan = scan_group(&source, root.path(), &group, OutputFormat::Gltf).unwrap();
        assert_eq!(stems(scan), vec!["Idle"]);
    }

    #[test]
    fn missing_directory() {
        setup_logger();
        let root = TempDir::new("walker").unwrap();
        let group = GroupConfig::new("Great_Sword", "*.fbx");
        let scan = scan_group(root.path(), root.path(), &group, OutputFormat::Gltf).unwrap();
        assert_eq!(scan, GroupScan::Missing(root.path().join("Great_Sword")));
        assert!(scan.into_tasks().is_empty());
    }

    #[test]
    fn no_matching_files() {
        setup_logger();
        let root = TempDir::new("walker").unwrap();
        write_file(root.path().join("Great_Sword/readme.md"), "");
        let group = GroupConfig::new("Great_Sword", "*.fbx");
        let scan = scan_group(root.path(), root.path(), &group, OutputFormat::Gltf).unwrap();
        assert_eq!(scan, GroupScan::Empty(root.path().join("Great_Sword")));
    }
}
