//! Filesystem and formatting helpers.

use crate::data::DataNode;
use crate::error::{Result, TestingError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Recursively copy the contents of `src` into `dst`.
///
/// Missing directories are created, existing files are overwritten and
/// entries only present in `dst` are left alone. Returns the number of
/// files copied.
///
/// Symlinks are followed, so linked files land as regular files. A linked
/// directory that points back at one of its ancestors is skipped.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut ancestors = Vec::new();
    let copied = copy_tree_recursive(src, dst, &mut ancestors)?;
    tracing::debug!("Copied {} files from {} to {}", copied, src.display(), dst.display());
    Ok(copied)
}

fn copy_tree_recursive(src: &Path, dst: &Path, ancestors: &mut Vec<PathBuf>) -> Result<usize> {
    let entries = fs::read_dir(src).map_err(|e| TestingError::file_open(src.to_path_buf(), e))?;
    let canonical = fs::canonicalize(src)?;
    fs::create_dir_all(dst)?;
    ancestors.push(canonical);

    let mut copied = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        let metadata = fs::metadata(&path)?;

        if metadata.is_dir() {
            if ancestors.contains(&fs::canonicalize(&path)?) {
                tracing::warn!("Skipping {}: symlink cycle", path.display());
                continue;
            }
            copied += copy_tree_recursive(&path, &target, ancestors)?;
        } else {
            fs::copy(&path, &target)?;
            copied += 1;
        }
    }

    ancestors.pop();
    Ok(copied)
}

/// Copy `src` to `dst` so that `dst` is never observed half-written.
pub fn atomic_copy(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_file() {
        return Err(TestingError::file_open(
            src.to_path_buf(),
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        ));
    }
    replace_with(dst, |tmp| {
        fs::copy(src, tmp)?;
        Ok(())
    })
}

/// Build a file next to `dst` with `write`, then rename it over `dst`.
///
/// `write` receives the path of a fresh temporary file in the same directory.
/// On error the temporary file is removed and `dst` is untouched.
pub fn replace_with<F>(dst: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let parent = dst.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let tmp = tempfile::Builder::new().prefix(".tmp-").tempfile_in(parent)?;
    write(tmp.path())?;
    tmp.persist(dst).map_err(|e| TestingError::Io(e.error))?;
    Ok(())
}

/// Render a dataset tree as text.
pub fn format_tree(node: &DataNode) -> String {
    format_tree_recursive(node, "", true)
}

fn format_tree_recursive(node: &DataNode, prefix: &str, is_last: bool) -> String {
    let mut result = String::new();

    let connector = if is_last { "└── " } else { "├── " };
    result.push_str(&format!("{}{}{}\n", prefix, connector, node.display_name()));

    let new_prefix = format!("{}{}   ", prefix, if is_last { " " } else { "│" });

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        result.push_str(&format_tree_recursive(child, &new_prefix, is_last_child));
    }

    result
}
