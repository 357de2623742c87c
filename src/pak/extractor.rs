//! Archive extraction to a host directory

use std::path::{Component, Path, PathBuf};

use super::archive::PakArchive;
use super::types::{PakPhase, PakProgress, ProgressCallback};
use crate::error::{Error, Result};

/// Extract every entry of the archive at `pak_path` into `output_dir`.
///
/// # Errors
/// Returns [`Error::NotAnArchive`] / [`Error::CorruptMetatable`] for an
/// unreadable archive, [`Error::InvalidArgument`] for entries whose
/// virtual path would escape `output_dir`, and [`Error::Io`] for host
/// failures.
///
/// [`Error::Io`]: crate::Error::Io
pub fn extract_pak(pak_path: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<usize> {
    extract_pak_with_progress(pak_path, output_dir, &|_| {})
}

/// Extract an archive, reporting one progress update per entry.
///
/// # Errors
/// As [`extract_pak`].
pub fn extract_pak_with_progress(
    pak_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    progress: ProgressCallback<'_>,
) -> Result<usize> {
    let output_dir = output_dir.as_ref();
    let mut archive = PakArchive::open(pak_path.as_ref())?;

    std::fs::create_dir_all(output_dir)?;

    let paths: Vec<String> = archive
        .files()
        .list()
        .into_iter()
        .map(str::to_string)
        .collect();
    let total = paths.len();

    for (index, virtual_path) in paths.iter().enumerate() {
        progress(&PakProgress::with_file(
            PakPhase::ExtractFileProgress,
            index + 1,
            total,
            virtual_path.clone(),
        ));

        let host_path = output_dir.join(host_relative_path(virtual_path)?);
        if let Some(parent) = host_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = archive.get(virtual_path)?;
        std::fs::write(&host_path, bytes)?;
    }

    tracing::info!(
        output = %output_dir.display(),
        files = total,
        "extracted archive"
    );
    Ok(total)
}

// Virtual paths are attacker-controlled; only plain components may reach
// the filesystem.
fn host_relative_path(virtual_path: &str) -> Result<PathBuf> {
    let trimmed = virtual_path.trim_start_matches('/');
    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "virtual path escapes the output directory: {virtual_path}"
                )))
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(Error::InvalidArgument(format!(
            "virtual path has no file name: {virtual_path}"
        )));
    }
    Ok(relative)
}
