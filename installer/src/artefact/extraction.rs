//! Source archive extraction.
//!
//! Unpacks tar (plain, gzip, bzip2, xz, zstd) and zip archives into a
//! destination directory. Every entry and every link target is confined to
//! the destination.

use super::archive_format::ArchiveFormat;
use log::debug;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Trait for extracting source archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use recipe_installer::artefact::extraction::DetectingExtractor;
///
/// let extractor = DetectingExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedFormat`] when the format cannot
    /// be determined, [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory, and
    /// [`ExtractionError::Io`] or [`ExtractionError::Zip`] on read failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// Neither the extension nor the content identifies a known format.
    #[error("unsupported archive format: {file_name}")]
    UnsupportedFormat {
        /// Base name of the archive.
        file_name: String,
    },

    /// The zip container is malformed.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Production extractor that picks the decoder from [`ArchiveFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectingExtractor;

impl ArchiveExtractor for DetectingExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError> {
        let format = ArchiveFormat::detect(archive_path)?.ok_or_else(|| {
            ExtractionError::UnsupportedFormat {
                file_name: archive_path
                    .file_name()
                    .map_or_else(String::new, |n| n.to_string_lossy().into_owned()),
            }
        })?;
        debug!("extracting {} as {format}", archive_path.display());

        let reader = BufReader::new(File::open(archive_path)?);
        match format {
            ArchiveFormat::Tar => unpack_tar(reader, dest_dir),
            ArchiveFormat::TarGz => {
                unpack_tar(flate2::read::MultiGzDecoder::new(reader), dest_dir)
            }
            ArchiveFormat::TarBz2 => unpack_tar(bzip2::read::BzDecoder::new(reader), dest_dir),
            ArchiveFormat::TarXz => unpack_tar(xz2::read::XzDecoder::new(reader), dest_dir),
            ArchiveFormat::TarZst => unpack_tar(zstd::Decoder::with_buffer(reader)?, dest_dir),
            ArchiveFormat::Zip => unpack_zip(reader, dest_dir),
        }
    }
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<usize, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut written = 0;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let kind = entry.header().entry_type();
        if kind.is_pax_global_extensions() {
            continue;
        }
        let entry_path = entry.path()?.into_owned();
        validate_entry_path(&entry_path)?;

        if let Some(target) = entry.link_name()?.map(Cow::into_owned) {
            if kind.is_symlink() {
                validate_symlink_target(&entry_path, &target)?;
            } else if kind.is_hard_link() {
                validate_entry_path(&target)?;
            }
        }

        // `unpack_in` refuses writes through links that leave `dest_dir` and
        // resolves hard link targets against it.
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractionError::PathTraversal {
                path: entry_path.display().to_string(),
            });
        }
        written += 1;
    }

    Ok(written)
}

fn unpack_zip<R: Read + std::io::Seek>(
    reader: R,
    dest_dir: &Path,
) -> Result<usize, ExtractionError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let root = dest_dir.canonicalize()?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let entry_path = PathBuf::from(file.name());
        validate_entry_path(&entry_path)?;

        let dest_path = root.join(&entry_path);
        ensure_inside(&root, &dest_path, &entry_path)?;
        if file.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            if is_zip_symlink(file.unix_mode()) {
                let mut target = String::new();
                file.read_to_string(&mut target)?;
                validate_symlink_target(&entry_path, Path::new(&target))?;
                write_symlink(&target, &dest_path)?;
            } else {
                let mode = file.unix_mode();
                write_zip_file(&mut file, mode, &dest_path)?;
            }
        }
        written += 1;
    }

    Ok(written)
}

fn write_zip_file(
    file: &mut impl Read,
    mode: Option<u32>,
    dest_path: &Path,
) -> Result<(), ExtractionError> {
    let mut out = File::create(dest_path)?;
    std::io::copy(file, &mut out)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            std::fs::set_permissions(dest_path, std::fs::Permissions::from_mode(mode & 0o7777))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}

/// Zip stores symlinks as entries with `S_IFLNK` in the Unix mode and the
/// target as the content.
fn is_zip_symlink(mode: Option<u32>) -> bool {
    const S_IFMT: u32 = 0o170_000;
    const S_IFLNK: u32 = 0o120_000;
    mode.is_some_and(|m| m & S_IFMT == S_IFLNK)
}

#[cfg(unix)]
fn write_symlink(target: &str, dest_path: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, dest_path)
}

#[cfg(not(unix))]
fn write_symlink(target: &str, dest_path: &Path) -> std::io::Result<()> {
    std::fs::write(dest_path, target)
}

/// Fail when the nearest existing ancestor of `path` resolves outside `root`,
/// which happens once an earlier entry planted a link leading elsewhere.
fn ensure_inside(root: &Path, path: &Path, entry_path: &Path) -> Result<(), ExtractionError> {
    let Some(existing) = path.ancestors().find(|p| p.symlink_metadata().is_ok()) else {
        return Ok(());
    };
    if existing.canonicalize()?.starts_with(root) {
        Ok(())
    } else {
        Err(ExtractionError::PathTraversal {
            path: entry_path.display().to_string(),
        })
    }
}

/// Validate that an archive entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Validate that a symlink at `entry_path` pointing at `target` stays inside
/// the destination. Targets are relative to the link's own directory;
/// absolute targets are refused.
fn validate_symlink_target(entry_path: &Path, target: &Path) -> Result<(), ExtractionError> {
    let escape = || ExtractionError::PathTraversal {
        path: format!("{} -> {}", entry_path.display(), target.display()),
    };
    let mut depth = entry_path.parent().map_or(0, |parent| {
        parent
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count()
    });
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => depth = depth.checked_sub(1).ok_or_else(escape)?,
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }
    Ok(())
}
