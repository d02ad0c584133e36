use std::path::{Component, Path};

/// Join a package prefix with the segments of a relative directory path
/// using the dotted module separator.
/// For example, given `pkg` and `a/b`, it returns `pkg.a.b`.
/// Segments are kept verbatim, so a hidden `.config` directory becomes
/// `pkg..config`; renaming it would point the entry at another directory.
pub fn to_package_name(prefix: &str, rel_dir: &Path) -> String {
    let prefix = prefix.trim_matches('.');
    let mut result = String::with_capacity(prefix.len() + rel_dir.as_os_str().len() + 1);
    result.push_str(prefix);
    for segment in path_segments(rel_dir) {
        if !result.is_empty() {
            result.push('.');
        }
        result.push_str(&segment);
    }
    result
}

/// Render a relative path with `/` separators regardless of host platform.
pub fn to_posix_path(path: &Path) -> String {
    let joined = path_segments(path).collect::<Vec<_>>().join("/");
    if path.has_root() {
        format!("/{}", joined)
    } else {
        joined
    }
}

fn path_segments(path: &Path) -> impl Iterator<Item = String> + '_ {
    path.components().filter_map(|c| match c {
        Component::Normal(s) => Some(s.to_string_lossy().to_string()),
        Component::ParentDir => Some("..".to_string()),
        _ => None,
    })
}

/// Board names as used in overlay and notebook folders: lowercase, no dashes.
/// `Pynq-Z2` becomes `pynqz2`.
pub fn normalize_board_name(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "")
}
