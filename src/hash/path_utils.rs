// Key construction for output records
// Keys are the file path relative to the scanned root, optionally under a prefix

use std::path::{Component, Path, PathBuf};

/// Path of `path` relative to the scanned `root`
///
/// Both come from the same walk, so this is a lexical strip rather than a
/// canonicalization. A path outside the root is returned unchanged.
pub fn relative_to_root(path: &Path, root: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf()),
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

/// Join the relative path onto the configured prefix; an empty prefix is a no-op
pub fn join_prefix(prefix: &str, relative: &Path) -> PathBuf {
    if prefix.is_empty() {
        clean_path(relative)
    } else {
        clean_path(&Path::new(prefix).join(relative))
    }
}

/// Unescaped key for a file found under `root`
pub fn record_key(root: &Path, prefix: &str, path: &Path) -> String {
    let relative = relative_to_root(path, root);
    join_prefix(prefix, &relative).to_string_lossy().into_owned()
}

/// Clean a path by removing redundant components like "." and ".."
/// This provides a normalized form without requiring the path to exist
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // ".." directly under the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    let result: PathBuf = components.iter().collect();
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}
