// Local folder traversal for uploads.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A regular file found under the walked root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute or root-prefixed path used to read the file.
    pub path: PathBuf,
    /// Path relative to the root, always `/`-separated.
    pub relative_path: String,
}

/// List every regular file under `root`, depth-first with entries sorted by
/// file name so the order is stable across platforms.
///
/// Symlinks are followed, so a link to a file is yielded under the link's
/// own path. Directories are not yielded. An unreadable entry or a link
/// cycle aborts the walk with an error naming it.
pub fn walk_files(root: &Path) -> Result<Vec<LocalFile>> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", entry.path().display(), root.display()))?;
        files.push(LocalFile {
            path: entry.path().to_path_buf(),
            relative_path: to_remote_path(relative),
        });
    }
    Ok(files)
}

/// Join path components with `/` regardless of the host separator.
fn to_remote_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn yields_nested_files_with_forward_slashes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::create_dir_all(dir.path().join("sub").join("deeper")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), "world").unwrap();
        std::fs::write(dir.path().join("sub").join("deeper").join("c.bin"), [0u8, 1]).unwrap();

        let files = walk_files(dir.path()).unwrap();
        let relative: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(relative, vec!["a.txt", "sub/b.txt", "sub/deeper/c.bin"]);
        assert_eq!(files[1].path, dir.path().join("sub").join("b.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_yielded_under_the_link_path() {
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("target.txt"), "linked").unwrap();
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("plain.txt"), "plain").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("target.txt"),
            dir.path().join("link.txt"),
        )
        .unwrap();

        let files = walk_files(dir.path()).unwrap();
        let relative: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(relative, vec!["link.txt", "plain.txt"]);
        assert_eq!(std::fs::read_to_string(&files[0].path).unwrap(), "linked");
    }

    #[test]
    fn empty_directories_yield_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        assert!(walk_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = walk_files(&dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}
