//! Archive creation from a host directory

use std::path::{Component, Path};

use walkdir::WalkDir;

use super::archive::PakArchive;
use super::table::ContentSource;
use super::types::{LoadReport, ProgressCallback};
use crate::error::{Error, Result};
use crate::sbon::ValueMap;

/// Pack every regular file under `source_dir` into a fresh archive at
/// `output_pak`.
///
/// Virtual paths are the `/`-separated paths relative to `source_dir`,
/// rooted with a leading `/`. Symlinks and `.DS_Store` files are
/// skipped. `metadata` becomes the archive's metadata map.
///
/// # Errors
/// Returns [`Error::Io`] if the directory walk or the save fails and
/// [`Error::InvalidArgument`] for paths that cannot be expressed as
/// UTF-8.
///
/// [`Error::Io`]: crate::Error::Io
pub fn create_pak(
    source_dir: impl AsRef<Path>,
    output_pak: impl AsRef<Path>,
    metadata: ValueMap,
) -> Result<LoadReport> {
    create_pak_with_progress(source_dir, output_pak, metadata, &|_| {})
}

/// Pack a directory into a fresh archive, reporting save steps to
/// `progress`.
///
/// # Errors
/// As [`create_pak`].
pub fn create_pak_with_progress(
    source_dir: impl AsRef<Path>,
    output_pak: impl AsRef<Path>,
    metadata: ValueMap,
    progress: ProgressCallback<'_>,
) -> Result<LoadReport> {
    let source_dir = source_dir.as_ref();
    tracing::info!(source = %source_dir.display(), "scanning directory");

    let mut archive = PakArchive::new(output_pak.as_ref());
    archive.set_metadata(metadata);

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|err| Error::Io(std::io::Error::other(err)))?;
        if entry.path_is_symlink() {
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name() == ".DS_Store" {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| Error::InvalidArgument(entry.path().display().to_string()))?;
        let virtual_path = virtual_path_for(relative)?;

        archive.files_mut().set(
            virtual_path,
            ContentSource::Path {
                path: entry.path().to_path_buf(),
                offset: None,
                length: None,
            },
        );
    }

    tracing::info!(files = archive.files().len(), "creating archive");
    archive.save_with_progress(progress)
}

fn virtual_path_for(relative: &Path) -> Result<String> {
    let mut virtual_path = String::new();
    for component in relative.components() {
        let part = match component {
            Component::Normal(part) => part.to_str().ok_or_else(|| {
                Error::InvalidArgument(format!("non-UTF-8 path: {}", relative.display()))
            })?,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unsupported path component in {}",
                    relative.display()
                )))
            }
        };
        virtual_path.push('/');
        virtual_path.push_str(part);
    }
    if virtual_path.is_empty() {
        return Err(Error::InvalidArgument("empty relative path".to_string()));
    }
    Ok(virtual_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_path_for() {
        let path = Path::new("items/food/soup.item");
        assert_eq!(virtual_path_for(path).unwrap(), "/items/food/soup.item");

        assert_eq!(virtual_path_for(Path::new("top.txt")).unwrap(), "/top.txt");
        assert!(virtual_path_for(Path::new("")).is_err());
    }
}
