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

use crate::error::{Error, Result};
use crate::fileutil::{scan_files, ScanOptions};
use crate::manifest::{DataFileEntry, DataFileManifest};
use crate::stringutil::{to_package_name, to_posix_path};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub use crate::fileutil::{PermissionPolicy, ScanOptions as ExtendOptions};

/// Append one manifest entry per non-empty directory under `root`.
///
/// Each directory that directly holds at least one regular file becomes an
/// entry whose package name is `prefix` joined with the directory's relative
/// path by dots, and whose files are `/`-separated paths relative to `root`.
/// Entries are ordered by relative directory path (root first), files by
/// name.
///
/// On error the manifest is left untouched.
pub fn extend_package(
    root: impl AsRef<Path>,
    manifest: &mut DataFileManifest,
    prefix: &str,
) -> Result<()> {
    extend_package_with(root, manifest, prefix, &ExtendOptions::default())
}

pub fn extend_package_with(
    root: impl AsRef<Path>,
    manifest: &mut DataFileManifest,
    prefix: &str,
    options: &ExtendOptions,
) -> Result<()> {
    let root = root.as_ref();
    let staged = package_entries(root, prefix, options)?;

    tracing::debug!(
        "Adding {} package data entr{} from {:?}",
        staged.len(),
        if staged.len() == 1 { "y" } else { "ies" },
        root
    );
    manifest.extend(staged);
    Ok(())
}

fn package_entries(
    root: &Path,
    prefix: &str,
    options: &ScanOptions,
) -> Result<Vec<DataFileEntry>> {
    Ok(group_by_dir(scan_files(root, options)?)
        .into_iter()
        .map(|(dir, files)| DataFileEntry::new(to_package_name(prefix, Path::new(&dir)), files))
        .collect())
}

// Keyed by the `/`-joined relative directory so iteration order is the byte
// order of that path, with the root ("") first.
fn group_by_dir(files: Vec<PathBuf>) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for rel in files {
        let dir = rel.parent().map(to_posix_path).unwrap_or_default();
        groups.entry(dir).or_default().push(to_posix_path(&rel));
    }
    for files in groups.values_mut() {
        files.sort();
    }
    groups
}

/// Flat variant used directly in build scripts: append `../<path>/<file>`
/// for every regular file below a directory, or `../<path>` for a single
/// file. The leading `..` anchors the paths one level below the project
/// root, where the package directory lives.
pub fn collect_package_files(path: impl AsRef<Path>, data_files: &mut Vec<String>) -> Result<()> {
    let path = path.as_ref();
    let meta = fs::metadata(path).map_err(|_| Error::not_found(path))?;
    let base = Path::new("..").join(path);

    if meta.is_file() {
        data_files.push(to_posix_path(&base));
        return Ok(());
    }
    if !meta.is_dir() {
        return Err(Error::not_found(path));
    }

    let staged: Vec<String> = group_by_dir(scan_files(path, &ScanOptions::default())?)
        .into_values()
        .flatten()
        .map(|rel| to_posix_path(&base.join(rel)))
        .collect();
    data_files.extend(staged);
    Ok(())
}
