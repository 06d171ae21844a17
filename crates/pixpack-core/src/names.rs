//! Entry names that can be written into an archive

use std::path::{Component, Path};

/// True when `name` is a plain relative path: no root, no `.` or `..`
/// components, and no NUL bytes.
pub fn is_portable_name(name: &str) -> bool {
    if name.is_empty() || name.contains('\0') || name.starts_with('/') || name.starts_with('\\') {
        return false;
    }
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

/// The final path component of `name`, for callers that may reduce a path
/// to a bare file name
pub fn base_name(name: &str) -> Option<&str> {
    let base = Path::new(name).file_name()?.to_str()?;
    is_portable_name(base).then_some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portable_names() {
        assert!(is_portable_name("a.png"));
        assert!(is_portable_name("nested/dir/a.png"));
        assert!(!is_portable_name(""));
        assert!(!is_portable_name("../a.png"));
        assert!(!is_portable_name("nested/../../a.png"));
        assert!(!is_portable_name("/abs/b.png"));
        assert!(!is_portable_name("./a.png"));
        assert!(!is_portable_name("a\0.png"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/abs/b.png"), Some("b.png"));
        assert_eq!(base_name("../a.png"), Some("a.png"));
        assert_eq!(base_name("a.png"), Some("a.png"));
        assert_eq!(base_name(".."), None);
        assert_eq!(base_name("/"), None);
    }
}
