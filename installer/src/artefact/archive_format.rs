//! Source archive format detection.
//!
//! The file extension decides first; when it is missing or unfamiliar the
//! leading bytes of the file are sniffed instead.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes read from the start of a file for sniffing; covers the ustar magic
/// at offset 257.
const SNIFF_LEN: usize = 512;
const USTAR_OFFSET: usize = 257;

/// Archive formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed tar.
    Tar,
    /// Gzip-compressed tar.
    TarGz,
    /// Bzip2-compressed tar.
    TarBz2,
    /// Xz-compressed tar.
    TarXz,
    /// Zstandard-compressed tar.
    TarZst,
    /// Zip archive.
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from a file name's extension, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use recipe_installer::artefact::archive_format::ArchiveFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(
    ///     ArchiveFormat::from_path(Path::new("zlib-1.3.tar.GZ")),
    ///     Some(ArchiveFormat::TarGz),
    /// );
    /// assert_eq!(ArchiveFormat::from_path(Path::new("download")), None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        let by_suffix = [
            (".tar.gz", Self::TarGz),
            (".tgz", Self::TarGz),
            (".tar.bz2", Self::TarBz2),
            (".tbz2", Self::TarBz2),
            (".tar.xz", Self::TarXz),
            (".txz", Self::TarXz),
            (".tar.zst", Self::TarZst),
            (".tzst", Self::TarZst),
            (".tar", Self::Tar),
            (".zip", Self::Zip),
        ];
        by_suffix
            .into_iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, format)| format)
    }

    /// Identify the format from the first bytes of a file.
    ///
    /// Compressed streams are assumed to contain a tar archive.
    #[must_use]
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if header.starts_with(b"BZh") {
            Some(Self::TarBz2)
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Self::TarXz)
        } else if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Some(Self::TarZst)
        } else if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if header
            .get(USTAR_OFFSET..USTAR_OFFSET + 5)
            .is_some_and(|magic| magic == b"ustar")
        {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Detect the format of the file at `path`, by extension and then by
    /// content.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file must be sniffed and cannot be read.
    pub fn detect(path: &Path) -> std::io::Result<Option<Self>> {
        if let Some(format) = Self::from_path(path) {
            return Ok(Some(format));
        }
        let mut header = Vec::with_capacity(SNIFF_LEN);
        File::open(path)?
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut header)?;
        Ok(Self::sniff(&header))
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        };
        f.write_str(label)
    }
}
