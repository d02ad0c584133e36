// Copyright (C) 2025 Nuwaira
// All Rights Reserved.
//
// NOTICE: All information contained herein is, and remains
// the property of Nuwaira.
// The intellectual and technical concepts contained
// herein are proprietary to Nuwaira
// and are protected by trade secret or copyright law.
// Dissemination of this information or reproduction of this material
// is strictly forbidden unless prior written permission is obtained
// from Nuwaira.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Files that are installed under one package namespace.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DataFileEntry {
    /// Dotted installed-package name, e.g. `pynq_helloworld.notebooks`.
    pub package: String,
    /// Paths relative to the scanned root, `/`-separated.
    pub files: Vec<String>,
}

impl DataFileEntry {
    pub fn new(package: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            package: package.into(),
            files,
        }
    }
}

/// Ordered collection of [`DataFileEntry`]. Packaging tools apply entries in
/// insertion order, so nothing here ever reorders or deduplicates.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFileManifest {
    #[serde(rename = "entry", default)]
    entries: Vec<DataFileEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestFormat {
    #[default]
    Json,
    Toml,
    Python,
}

impl FromStr for ManifestFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ManifestFormat::Json),
            "toml" => Ok(ManifestFormat::Toml),
            "python" | "py" => Ok(ManifestFormat::Python),
            other => Err(format!(
                "unknown manifest format '{}', expected json, toml or python",
                other
            )),
        }
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManifestFormat::Json => "json",
            ManifestFormat::Toml => "toml",
            ManifestFormat::Python => "python",
        };
        f.write_str(s)
    }
}

impl DataFileManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DataFileEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[DataFileEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataFileEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every file path across all entries, in manifest order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|e| e.files.iter().map(String::as_str))
    }

    pub fn render(&self, format: ManifestFormat) -> Result<String> {
        match format {
            ManifestFormat::Json => Ok(serde_json::to_string_pretty(&self.entries)?),
            ManifestFormat::Toml => Ok(toml::to_string(self)?),
            ManifestFormat::Python => Ok(self.to_python()),
        }
    }

    // A list of `(package, [files])` tuples. JSON string escaping is a valid
    // subset of Python string literal syntax.
    fn to_python(&self) -> String {
        if self.entries.is_empty() {
            return "[]".to_string();
        }
        let mut out = String::from("[\n");
        for entry in &self.entries {
            let files = entry
                .files
                .iter()
                .map(|f| py_str(f))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("    ({}, [{}]),\n", py_str(&entry.package), files));
        }
        out.push(']');
        out
    }
}

fn py_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl Extend<DataFileEntry> for DataFileManifest {
    fn extend<T: IntoIterator<Item = DataFileEntry>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a DataFileManifest {
    type Item = &'a DataFileEntry;
    type IntoIter = std::slice::Iter<'a, DataFileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFileManifest {
        let mut m = DataFileManifest::new();
        m.push(DataFileEntry::new(
            "pkg.notebooks",
            vec!["notebooks/intro.ipynb".to_string()],
        ));
        m.push(DataFileEntry::new(
            "pkg.notebooks.assets",
            vec!["notebooks/assets/logo.png".to_string()],
        ));
        m
    }

    #[test]
    fn test_push_preserves_order() {
        let m = sample();
        assert_eq!(m.len(), 2);
        assert_eq!(m.entries()[0].package, "pkg.notebooks");
        assert_eq!(m.entries()[1].package, "pkg.notebooks.assets");
        assert_eq!(
            m.files().collect::<Vec<_>>(),
            vec!["notebooks/intro.ipynb", "notebooks/assets/logo.png"]
        );
    }

    #[test]
    fn test_render_json() {
        let out = sample().render(ManifestFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["package"], "pkg.notebooks");
        assert_eq!(value[1]["files"][0], "notebooks/assets/logo.png");
    }

    #[test]
    fn test_render_toml_reads_back() {
        let m = sample();
        let out = m.render(ManifestFormat::Toml).unwrap();
        assert!(out.contains("[[entry]]"));
        let back: DataFileManifest = toml::from_str(&out).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_render_python() {
        let out = sample().render(ManifestFormat::Python).unwrap();
        assert_eq!(
            out,
            "[\n    (\"pkg.notebooks\", [\"notebooks/intro.ipynb\"]),\n    (\"pkg.notebooks.assets\", [\"notebooks/assets/logo.png\"]),\n]"
        );
        assert_eq!(
            DataFileManifest::new().render(ManifestFormat::Python).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<ManifestFormat>(), Ok(ManifestFormat::Json));
        assert_eq!("py".parse::<ManifestFormat>(), Ok(ManifestFormat::Python));
        assert!("yaml".parse::<ManifestFormat>().is_err());
    }
}
