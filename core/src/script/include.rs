//! File and line resolution for `Read` and `Play`.

use std::path::{Path, PathBuf};

use tasrun_shared::comment_line::matches_label;

const EXTENSION: &str = ".tas";

/// Why a `Read` target could not be found
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadTargetError {
    #[error("no file path specified")]
    NoPath,

    #[error("parent directory of '{0}' not found")]
    NoParent(String),

    #[error("couldn't find directory '{0}'")]
    DirectoryNotFound(String),

    #[error("ambiguous match for directory '{0}'")]
    AmbiguousDirectory(String),

    #[error("couldn't find file '{0}'")]
    FileNotFound(String),

    #[error("ambiguous match for file '{0}'")]
    AmbiguousFile(String),
}

/// Find the script named by a `Read` argument, relative to `dir`.
///
/// Tries the exact path (with `.tas` appended when missing), then matches
/// each directory component case-insensitively, then accepts a unique file
/// whose name starts with the requested one (`9D_04` finds `9D_04_Curiosity.tas`).
pub fn resolve_read_target(dir: &Path, target: &str) -> Result<PathBuf, ReadTargetError> {
    let with_extension = if target.ends_with(EXTENSION) {
        target.to_string()
    } else {
        format!("{}{}", target, EXTENSION)
    };
    let exact = dir.join(&with_extension);
    if exact.is_file() {
        return Ok(exact);
    }

    let components: Vec<&str> = target
        .split(['/', '\\'])
        .filter(|component| !component.is_empty())
        .collect();
    let Some((file, directories)) = components.split_last() else {
        return Err(ReadTargetError::NoPath);
    };

    let mut real_dir = dir.to_path_buf();
    for &directory in directories {
        match directory {
            "." => continue,
            ".." => {
                real_dir = real_dir
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| ReadTargetError::NoParent(real_dir.display().to_string()))?;
            }
            _ => {
                let matches = list_dir(&real_dir, |path| {
                    path.is_dir() && file_name(path).eq_ignore_ascii_case(directory)
                });
                real_dir = single(matches, directory, ReadTargetError::DirectoryNotFound, || {
                    ReadTargetError::AmbiguousDirectory(directory.to_string())
                })?;
            }
        }
    }

    let stem = file.strip_suffix(EXTENSION).unwrap_or(file).to_lowercase();
    let candidates = list_dir(&real_dir, |path| {
        path.is_file()
            && path.extension().is_some_and(|ext| ext == "tas")
            && file_stem(path).to_lowercase().starts_with(&stem)
    });

    // An exact name beats a longer one sharing its prefix
    if let Some(exact) = candidates
        .iter()
        .find(|path| file_stem(path).to_lowercase() == stem)
    {
        return Ok(exact.clone());
    }
    single(candidates, &stem, ReadTargetError::FileNotFound, || {
        ReadTargetError::AmbiguousFile(stem.clone())
    })
}

/// Resolve a line number or `#label` to a 1-based line.
pub fn find_line(label_or_line: &str, lines: &[String]) -> Option<usize> {
    if let Ok(line) = label_or_line.trim().parse::<usize>() {
        return Some(line);
    }
    lines
        .iter()
        .position(|line| matches_label(line, label_or_line))
        .map(|index| index + 1)
}

/// Whether both paths name the same file on disk.
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn list_dir(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| keep(path))
        .collect();
    paths.sort();
    paths
}

fn single(
    mut matches: Vec<PathBuf>,
    name: &str,
    not_found: fn(String) -> ReadTargetError,
    ambiguous: impl FnOnce() -> ReadTargetError,
) -> Result<PathBuf, ReadTargetError> {
    match matches.len() {
        0 => Err(not_found(name.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(ambiguous()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
