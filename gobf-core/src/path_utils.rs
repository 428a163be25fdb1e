//! Import path and filesystem path utilities
//!
//! Go import paths always use forward slashes, while file paths reported by
//! the toolchain use the host separator. These helpers keep the two apart.

use std::path::{Path, PathBuf};

/// Normalize path to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert a filesystem path to a normalized string
#[inline]
pub fn path_to_string(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

/// True when `id` is the module path itself or a package beneath it.
///
/// A shared string prefix is not enough: `example.com/application` is not part
/// of `example.com/app`.
pub fn is_module_descendant(module: &str, id: &str) -> bool {
    match id.strip_prefix(module) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Final element of an import path
pub fn last_path_element(import_path: &str) -> &str {
    import_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(import_path)
}

/// Best guess at the name an import path binds without loading it.
///
/// Major-version suffixes are not the package name: `gopkg.in/yaml.v3` binds
/// `yaml` and `github.com/x/y/v2` binds `y`.
pub fn package_binding(import_path: &str) -> &str {
    let trimmed = import_path.trim_end_matches('/');
    let mut elements = trimmed.rsplit('/');
    let last = elements.next().unwrap_or(trimmed);
    let last = match elements.next() {
        Some(parent) if is_major_version(last) => parent,
        _ => last,
    };
    match last.rsplit_once('.') {
        Some((base, version)) if !base.is_empty() && is_major_version(version) => base,
        _ => last,
    }
}

fn is_major_version(element: &str) -> bool {
    element
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Import path of a directory inside the output module
#[inline]
pub fn module_import_path(module: &str, dir: &str) -> String {
    format!("{}/{}", module, dir)
}

/// Resolve `path` against `base` unless it is already absolute
pub fn absolutize(base: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

/// True for module replacement targets that point at the filesystem
/// (`./x`, `../x`, or an absolute path) rather than another module.
pub fn is_local_replacement(target: &str) -> bool {
    target.starts_with("./")
        || target.starts_with("../")
        || target == "."
        || target == ".."
        || Path::new(target).is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("foo\\bar\\baz"), "foo/bar/baz");
        assert_eq!(normalize_path("foo/bar/baz"), "foo/bar/baz");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_path_to_string() {
        let path = PathBuf::from("internal").join("util");
        let result = path_to_string(&path);
        assert!(!result.contains('\\'));
        assert!(result.ends_with("util"));
    }

    #[test]
    fn test_module_descendant() {
        assert!(is_module_descendant("example.com/app", "example.com/app"));
        assert!(is_module_descendant("example.com/app", "example.com/app/util"));
        assert!(is_module_descendant("example.com/app", "example.com/app/a/b"));
        assert!(!is_module_descendant("example.com/app", "example.com/application"));
        assert!(!is_module_descendant("example.com/app", "fmt"));
    }

    #[test]
    fn test_last_path_element() {
        assert_eq!(last_path_element("github.com/user/pkg"), "pkg");
        assert_eq!(last_path_element("fmt"), "fmt");
        assert_eq!(last_path_element("net/http/"), "http");
    }

    #[test]
    fn test_package_binding() {
        assert_eq!(package_binding("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(package_binding("github.com/x/y/v2"), "y");
        assert_eq!(package_binding("github.com/x/y/v10/"), "y");
        assert_eq!(package_binding("fmt"), "fmt");
        assert_eq!(package_binding("github.com/x/v2"), "x");
        assert_eq!(package_binding("v2"), "v2");
        assert_eq!(package_binding("example.com/vendor"), "vendor");
        assert_eq!(package_binding("example.com/lib.go"), "lib.go");
    }

    #[test]
    fn test_module_import_path() {
        assert_eq!(module_import_path("I", "a"), "I/a");
    }

    #[test]
    fn test_local_replacement() {
        assert!(is_local_replacement("./fork"));
        assert!(is_local_replacement("../shared"));
        assert!(!is_local_replacement("github.com/fork/lib"));
        let base = Path::new("/home/dev/app");
        assert_eq!(absolutize(base, "../shared"), PathBuf::from("/home/dev/app/../shared"));
    }
}
