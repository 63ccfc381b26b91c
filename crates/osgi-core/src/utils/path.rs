//! Path utilities for classpath construction.
//!
//! Bundle classpath entries are relative to the bundle location; these
//! helpers resolve them without touching the file system.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut components: Vec<Utf8Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {
                // Skip current directory
            },
            Utf8Component::ParentDir => match components.last() {
                Some(Utf8Component::Normal(_)) => {
                    components.pop();
                },
                _ => components.push(component),
            },
            other => {
                components.push(other);
            },
        }
    }

    if components.is_empty() {
        return Utf8PathBuf::from(".");
    }
    components.iter().collect()
}

/// Get the file extension as a lowercase string
pub fn get_extension(path: &Utf8Path) -> Option<String> {
    path.extension().map(|ext| ext.to_lowercase())
}

/// True for packed bundles (`.jar` or `.zip`)
pub fn is_archive(path: &Utf8Path) -> bool {
    matches!(get_extension(path).as_deref(), Some("jar") | Some("zip"))
}

/// Resolve one Bundle-ClassPath entry against the bundle location
pub fn join_classpath_entry(location: &Utf8Path, entry: &str) -> Utf8PathBuf {
    let entry = entry.trim();
    if entry.is_empty() || entry == "." {
        return normalize_path(location);
    }
    let entry = Utf8Path::new(entry);
    if entry.is_absolute() {
        return normalize_path(entry);
    }
    normalize_path(&location.join(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Utf8Path::new("./src/../lib/./file.rs");
        assert_eq!(normalize_path(path), Utf8Path::new("lib/file.rs"));
        assert_eq!(normalize_path(Utf8Path::new("../a/../b")), Utf8Path::new("../b"));
        assert_eq!(normalize_path(Utf8Path::new("./")), Utf8Path::new("."));
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension(Utf8Path::new("a.JAR")), Some("jar".to_string()));
        assert_eq!(get_extension(Utf8Path::new("no_extension")), None);
    }

    #[test]
    fn test_is_archive() {
        assert!(is_archive(Utf8Path::new("/plugins/org.acme_1.0.0.jar")));
        assert!(is_archive(Utf8Path::new("lib/x.zip")));
        assert!(!is_archive(Utf8Path::new("/workspace/org.acme")));
    }

    #[test]
    fn test_join_classpath_entry() {
        let location = Utf8Path::new("/plugins/org.acme");
        assert_eq!(join_classpath_entry(location, "."), Utf8Path::new("/plugins/org.acme"));
        assert_eq!(
            join_classpath_entry(location, "lib/./util.jar"),
            Utf8Path::new("/plugins/org.acme/lib/util.jar")
        );
        assert_eq!(
            join_classpath_entry(location, "/opt/ext.jar"),
            Utf8Path::new("/opt/ext.jar")
        );
    }
}
