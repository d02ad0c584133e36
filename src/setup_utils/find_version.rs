use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref VERSION_RE: Regex =
        Regex::new(r#"(?m)^__version__ = ['"]([^'"]*)['"]"#).expect("valid version regex");
}

/// Parse `__version__ = "x.y.z"` out of a Python source file.
pub fn find_version(file_path: impl AsRef<Path>) -> Result<String> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path)?;
    parse_version(&content).ok_or_else(|| Error::VersionNotFound {
        path: file_path.to_path_buf(),
    })
}

/// First line of a `version.txt`, trimmed.
pub fn read_version_txt(file_path: impl AsRef<Path>) -> Result<String> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path)?;
    match content.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => Ok(line.to_string()),
        _ => Err(Error::VersionNotFound {
            path: file_path.to_path_buf(),
        }),
    }
}

fn parse_version(content: &str) -> Option<String> {
    VERSION_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
