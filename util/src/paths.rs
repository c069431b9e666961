use crate::config;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let p = PathBuf::from(config::storage_root());
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Folder holding everything stored for one account: {STORAGE_ROOT}/users/{user_id}
pub fn user_dir(user_id: i64) -> PathBuf {
    storage_root().join("users").join(user_id.to_string())
}

/// Relative reference stored in `users.photo`, e.g. `users/42/photo-1700000000000.png`.
///
/// Always uses forward slashes so it doubles as the `/uploads/...` URL suffix.
pub fn user_file_relative(user_id: i64, file_name: &str) -> String {
    format!("users/{user_id}/{file_name}")
}

/// Resolve a stored relative reference to an absolute path under the storage root.
///
/// Returns `None` for references that try to escape the root.
pub fn resolve_stored(relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    if rel.is_absolute()
        || rel
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return None;
    }
    Some(storage_root().join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::setup_test_storage_root;
    use serial_test::serial;

    #[test]
    #[serial]
    fn photo_reference_resolves_under_user_dir() {
        let _tmp = setup_test_storage_root();
        let rel = user_file_relative(7, "photo.jpg");
        assert_eq!(rel, "users/7/photo.jpg");
        let abs = resolve_stored(&rel).unwrap();
        assert!(abs.starts_with(user_dir(7)));
    }

    #[test]
    #[serial]
    fn traversal_references_are_refused() {
        let _tmp = setup_test_storage_root();
        assert!(resolve_stored("../etc/passwd").is_none());
        assert!(resolve_stored("/etc/passwd").is_none());
    }
}
