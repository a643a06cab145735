//! Parsing of a single `conandata.yml`-style descriptor.
//!
//! Only the `sources` mapping is read. Each entry maps a version key to
//! `{url, filename?, sha256?, user?, channel?}`; other keys (such as
//! `patches`) are ignored.

use super::error::DescriptorError;
use super::{PackageDescriptor, SourceSpec};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::namespace::Namespace;
use crate::package_name::PackageName;
use camino::Utf8Path;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_yaml::{Mapping, Value};

/// Parse descriptor text for `name`, read from `path`.
///
/// # Errors
///
/// Returns a [`DescriptorError`] naming `path` (and the version, where
/// applicable) for malformed YAML, a missing or non-mapping `sources`, a
/// non-scalar or repeated version key, a non-mapping source, a missing `url`,
/// a non-scalar field, or a malformed `sha256`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use recipe_installer::descriptor::parser::parse_descriptor;
/// use recipe_installer::package_name::PackageName;
///
/// let text = "sources:\n  \"1.0\":\n    url: https://example.test/a-1.0.tar.gz\n";
/// let descriptor = parse_descriptor(
///     PackageName::from("a"),
///     Utf8Path::new("recipes/a/conandata.yml"),
///     text,
/// )?;
/// assert_eq!(descriptor.len(), 1);
/// # Ok::<(), recipe_installer::descriptor::DescriptorError>(())
/// ```
pub fn parse_descriptor(
    name: PackageName,
    path: &Utf8Path,
    text: &str,
) -> Result<PackageDescriptor, DescriptorError> {
    let document: Value = serde_yaml::from_str(text).map_err(|source| DescriptorError::Yaml {
        path: path.to_owned(),
        source,
    })?;

    let sources = match document.get("sources") {
        None | Some(Value::Null) => {
            return Err(DescriptorError::MissingSources {
                path: path.to_owned(),
            });
        }
        Some(Value::Mapping(mapping)) => mapping,
        Some(_) => {
            return Err(DescriptorError::SourcesNotMapping {
                path: path.to_owned(),
            });
        }
    };

    let mut parsed = IndexMap::with_capacity(sources.len());
    for (key, value) in sources {
        let version = render_version(path, key)?;
        let spec = parse_source(path, &version, value)?;
        match parsed.entry(version) {
            Entry::Occupied(entry) => {
                return Err(DescriptorError::DuplicateVersion {
                    path: path.to_owned(),
                    version: entry.key().clone(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(spec);
            }
        }
    }

    Ok(PackageDescriptor {
        name,
        path: path.to_owned(),
        sources: parsed,
    })
}

/// Render a version key as text. Numbers keep their parsed form, so `1.10`
/// becomes `1.1`; quote versions to keep them exact.
fn render_version(path: &Utf8Path, key: &Value) -> Result<String, DescriptorError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(DescriptorError::InvalidVersionKey {
            path: path.to_owned(),
            key: format!("{other:?}"),
        }),
    }
}

fn parse_source(
    path: &Utf8Path,
    version: &str,
    value: &Value,
) -> Result<SourceSpec, DescriptorError> {
    let Value::Mapping(entry) = value else {
        return Err(DescriptorError::SourceNotMapping {
            path: path.to_owned(),
            version: version.to_owned(),
        });
    };
    let field = |name: &'static str| scalar_field(entry, name, path, version);

    let url = field("url")?.ok_or_else(|| DescriptorError::MissingUrl {
        path: path.to_owned(),
        version: version.to_owned(),
    })?;
    let sha256 = field("sha256")?
        .map(Sha256Digest::try_from)
        .transpose()
        .map_err(|source| DescriptorError::InvalidSha256 {
            path: path.to_owned(),
            version: version.to_owned(),
            source,
        })?;

    Ok(SourceSpec {
        url,
        filename: field("filename")?,
        sha256,
        namespace: Namespace::new(field("user")?, field("channel")?),
    })
}

/// Read an optional scalar field as trimmed text; null and blank are absent.
fn scalar_field(
    entry: &Mapping,
    name: &'static str,
    path: &Utf8Path,
    version: &str,
) -> Result<Option<String>, DescriptorError> {
    let text = match entry.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(_) => {
            return Err(DescriptorError::InvalidField {
                path: path.to_owned(),
                version: version.to_owned(),
                field: name,
            });
        }
    };
    Ok(Some(text).filter(|t| !t.is_empty()))
}
