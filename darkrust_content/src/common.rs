use std::{
    fmt::{self, Formatter},
    io,
    path::{Path, PathBuf},
    result,
};

use darkrust_shared::thiserror;
use serde::{Deserialize, Serialize};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
    #[error("The converter '{tool}' is not installed or not in PATH. {hint}")]
    ConverterUnavailable { tool: String, hint: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Failed to serialize '{path}': {message}")]
    Serialization { path: PathBuf, message: String },
    #[error("Other: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// The interchange format the converted files are written in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON based GLTF with embedded images
    #[default]
    Gltf,
    /// Binary GLB
    Glb,
}

impl OutputFormat {
    /// Selects [`OutputFormat::Glb`] when `binary` is set and [`OutputFormat::Gltf`] otherwise.
    ///
    /// # Example
    ///
    /// ```rust
    /// use darkrust_content::OutputFormat;
    /// assert_eq!(OutputFormat::from_binary(true), OutputFormat::Glb);
    /// assert_eq!(OutputFormat::from_binary(false).extension(), "gltf");
    /// ```
    pub fn from_binary(binary: bool) -> Self {
        if binary {
            Self::Glb
        } else {
            Self::Gltf
        }
    }

    /// Returns whether the format is the binary one.
    pub fn is_binary(self) -> bool {
        self == Self::Glb
    }

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Glb => "glb",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

pub(crate) fn extract_extension_from_path(path: &Path) -> Result<String> {
    Ok(path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_lowercase())
        .ok_or(Error::InvalidPath(path.to_owned()))?
        .to_owned())
}

pub(crate) fn extract_file_stem_from_path(path: &Path) -> Result<String> {
    Ok(path
        .file_stem()
        .and_then(|file_stem| file_stem.to_str())
        .ok_or(Error::InvalidPath(path.to_owned()))?
        .to_owned())
}

pub(crate) fn extract_file_name_from_path(path: &Path) -> Result<String> {
    Ok(path
        .file_name()
        .and_then(|file_name| file_name.to_str())
        .ok_or(Error::InvalidPath(path.to_owned()))?
        .to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_display() {
        assert_eq!(OutputFormat::Gltf.to_string(), "GLTF");
        assert_eq!(OutputFormat::Glb.to_string(), "GLB");
        assert!(OutputFormat::Glb.is_binary());
        assert!(!OutputFormat::Gltf.is_binary());
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extract_extension_from_path(Path::new("Aurora/Idle.FBX")).unwrap(), "fbx");
        assert!(extract_extension_from_path(Path::new("Aurora/Idle")).is_err());
    }

    #[test]
    fn file_stem_keeps_spaces() {
        let stem = extract_file_stem_from_path(Path::new("Great_Sword/Great Sword Idle.fbx")).unwrap();
        assert_eq!(stem, "Great Sword Idle");
        let name = extract_file_name_from_path(Path::new("Great_Sword/Great Sword Idle.fbx")).unwrap();
        assert_eq!(name, "Great Sword Idle.fbx");
    }
}
