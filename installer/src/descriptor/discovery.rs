//! Descriptor discovery under a recipes root.
//!
//! Descriptors live at `<root>/<package>/<descriptor_file>`; the package name
//! is the name of the directory holding the file.

use super::error::DescriptorError;
use super::parser::parse_descriptor;
use super::PackageDescriptor;
use crate::package_name::PackageName;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};

/// Discover and parse every descriptor under `root`, in lexicographic path
/// order.
///
/// All descriptors are parsed before this returns, so a malformed descriptor
/// is reported before any source is fetched.
///
/// # Errors
///
/// Returns [`DescriptorError::RootNotFound`] when `root` is not a directory,
/// and any read or parse error for the first descriptor that fails.
pub fn discover(
    root: &Utf8Path,
    descriptor_file: &str,
) -> Result<Vec<PackageDescriptor>, DescriptorError> {
    if !root.is_dir() {
        return Err(DescriptorError::RootNotFound {
            path: root.to_owned(),
        });
    }

    let paths = descriptor_paths(root, descriptor_file)?;
    debug!("found {} descriptor(s) under {root}", paths.len());

    paths.iter().map(|path| load_descriptor(path)).collect()
}

/// List `root/*/descriptor_file` in lexicographic order.
fn descriptor_paths(
    root: &Utf8Path,
    descriptor_file: &str,
) -> Result<Vec<Utf8PathBuf>, DescriptorError> {
    let pattern = format!(
        "{}/*/{}",
        glob::Pattern::escape(root.as_str()),
        glob::Pattern::escape(descriptor_file)
    );
    let entries = glob::glob(&pattern).map_err(|source| DescriptorError::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?;
        let path = Utf8PathBuf::try_from(path)
            .map_err(|e| DescriptorError::NonUtf8Path { path: e.into_path_buf() })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_descriptor(path: &Utf8Path) -> Result<PackageDescriptor, DescriptorError> {
    let name = path
        .parent()
        .and_then(Utf8Path::file_name)
        .map(PackageName::from)
        .ok_or_else(|| DescriptorError::NonUtf8Path {
            path: path.as_std_path().to_path_buf(),
        })?;
    let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
        path: path.to_owned(),
        source,
    })?;
    let descriptor = parse_descriptor(name, path, &text)?;
    info!(
        "loaded {} with {} source(s)",
        descriptor.name,
        descriptor.len()
    );
    Ok(descriptor)
}
