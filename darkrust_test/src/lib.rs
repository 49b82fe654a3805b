use std::{fs, path::Path, sync::Once};

use darkrust_shared::log::LevelFilter;

static LOGGER: Once = Once::new();

/// Installs a logger for the tests. Can be called from every test; only the first call has an effect.
pub fn setup_logger() {
    LOGGER.call_once(|| {
        // Another test binary in the same process might already have installed a logger.
        let _ = simple_logger::SimpleLogger::new().with_level(LevelFilter::Trace).init();
    });
}

/// Writes `content` to `path` and creates the parent directories when necessary.
pub fn write_file(path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|err| panic!("Failed to create directory {parent:?}: {err}"));
    }
    fs::write(path, content).unwrap_or_else(|err| panic!("Failed to write file {path:?}: {err}"));
}

/// Returns the sorted file names in the given directory. Panics when the directory can't be read.
pub fn file_names_in(directory: impl AsRef<Path>) -> Vec<String> {
    let directory = directory.as_ref();
    let mut names = fs::read_dir(directory)
        .unwrap_or_else(|err| panic!("Failed to read directory {directory:?}: {err}"))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}
