pub use chrono;
pub use indoc;
pub use log;
pub use pathdiff;
pub use serde_json;
pub use serde_yaml;
pub use thiserror;
pub use walkdir;

/// Joins the given lines with `\n` and appends a trailing newline when `lines` is not empty.
pub fn join_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = String::new();
    for line in lines {
        result.push_str(line.as_ref());
        result.push('\n');
    }
    result
}
