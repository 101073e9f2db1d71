//! Static asset copying.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Asset directories copied when no other list is configured.
pub const DEFAULT_ASSET_DIRS: [&str; 4] = ["css", "js", "images", "fonts"];

/// Errors that can occur while copying assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },
}

/// Copy each named directory under `root` into `output`.
///
/// Directories that do not exist are skipped. Returns the names of the
/// directories that were copied.
pub fn copy_asset_dirs(
    root: &Path,
    output: &Path,
    dirs: &[String],
) -> Result<Vec<String>, AssetError> {
    let mut copied = Vec::new();

    for dir in dirs {
        let source = root.join(dir);
        if !source.is_dir() {
            continue;
        }

        copy_dir(&source, &output.join(dir))?;
        tracing::info!("  Copied: {}/", dir);
        copied.push(dir.clone());
    }

    Ok(copied)
}

/// Recursively copy `source` into `dest`, overwriting existing files.
pub fn copy_dir(source: &Path, dest: &Path) -> Result<usize, AssetError> {
    let mut files = 0;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|source_err| AssetError::Walk {
            path: source.display().to_string(),
            source: source_err,
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target: PathBuf = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_error(entry.path(), &target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| copy_error(entry.path(), parent, e))?;
        }
        fs::copy(entry.path(), &target).map_err(|e| copy_error(entry.path(), &target, e))?;
        files += 1;
    }

    Ok(files)
}

fn copy_error(from: &Path, to: &Path, source: std::io::Error) -> AssetError {
    AssetError::Copy {
        from: from.display().to_string(),
        to: to.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dirs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn copies_nested_files_verbatim() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("site");
        let out = temp.path().join("dist");

        fs::create_dir_all(root.join("images/works")).unwrap();
        let bytes = [0u8, 159, 146, 150, 255];
        fs::write(root.join("images/works/cover.png"), bytes).unwrap();
        fs::write(root.join("images/logo.svg"), "<svg/>").unwrap();

        let copied = copy_asset_dirs(&root, &out, &dirs(&["images"])).unwrap();

        assert_eq!(copied, ["images"]);
        assert_eq!(fs::read(out.join("images/works/cover.png")).unwrap(), bytes);
        assert_eq!(
            fs::read_to_string(out.join("images/logo.svg")).unwrap(),
            "<svg/>"
        );
    }

    #[test]
    fn skips_missing_directories() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("site");
        let out = temp.path().join("dist");
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("css/main.css"), "body {}").unwrap();

        let copied = copy_asset_dirs(&root, &out, &dirs(&DEFAULT_ASSET_DIRS)).unwrap();

        assert_eq!(copied, ["css"]);
        assert!(out.join("css/main.css").exists());
        assert!(!out.join("images").exists());
        assert!(!out.join("fonts").exists());
    }

    #[test]
    fn overwrites_existing_files() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("js");
        let dest = temp.path().join("dist/js");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(source.join("index.js"), "new").unwrap();
        fs::write(dest.join("index.js"), "old").unwrap();

        assert_eq!(copy_dir(&source, &dest).unwrap(), 1);
        assert_eq!(fs::read_to_string(dest.join("index.js")).unwrap(), "new");
    }
}
