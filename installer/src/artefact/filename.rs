//! Destination filename inference for downloads.
//!
//! The order is fixed: an explicit filename from the descriptor wins, then a
//! `Content-Disposition` filename, then the last segment of the URL path.
//! Header and URL values are reduced to a bare file name so a hostile server
//! cannot steer the download outside its temporary directory.

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use url::Url;

/// Extract the filename parameter from a `Content-Disposition` header value.
///
/// `filename*` (RFC 5987, e.g. `UTF-8''na%C3%AFve.tar.gz`) takes precedence
/// over `filename`. Quoted values may contain `;` and backslash escapes.
///
/// # Examples
///
/// ```
/// use recipe_installer::artefact::filename::filename_from_content_disposition;
///
/// let header = r#"attachment; filename="lib-1.0.tar.gz""#;
/// assert_eq!(
///     filename_from_content_disposition(header).as_deref(),
///     Some("lib-1.0.tar.gz"),
/// );
/// ```
#[must_use]
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let params = split_params(header);
    let extended = params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, value)| decode_extended_value(value));
    let plain = || {
        params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("filename"))
            .map(|(_, value)| value.clone())
    };
    extended
        .or_else(plain)
        .and_then(|name| sanitize_file_name(&name))
}

/// Derive a filename from the last non-empty segment of a URL path.
///
/// Percent-encoding is decoded; an empty path yields `None`.
#[must_use]
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment).ok()?;
    sanitize_file_name(&decoded)
}

/// Reduce a candidate to its final path component, rejecting empty names and
/// the `.`/`..` pseudo-entries.
#[must_use]
pub fn sanitize_file_name(candidate: &str) -> Option<String> {
    let normalised = candidate.replace('\\', "/");
    let base = normalised.rsplit('/').next()?.trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Path::new(base)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Whether an explicitly configured filename is usable verbatim.
#[must_use]
pub fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

fn decode_extended_value(value: &str) -> Option<String> {
    // charset'language'percent-encoded
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") && !charset.is_empty() {
        return None;
    }
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

/// Split `type; key=value; key="quoted; value"` into key/value pairs,
/// skipping the disposition type.
fn split_params(header: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = header.chars().peekable();

    // Skip the disposition type.
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    loop {
        let mut key = String::new();
        let mut has_value = false;
        for c in chars.by_ref() {
            if c == '=' {
                has_value = true;
                break;
            }
            if c == ';' {
                break;
            }
            key.push(c);
        }

        if has_value {
            let value = read_value(&mut chars);
            let key = key.trim();
            if !key.is_empty() {
                params.push((key.to_owned(), value));
            }
        }
        if chars.peek().is_none() {
            break;
        }
    }

    params
}

/// Read one parameter value, consuming input up to and including the next
/// `;` outside quotes.
fn read_value(chars: &mut Peekable<Chars<'_>>) -> String {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}

    let mut value = String::new();
    if chars.next_if_eq(&'"').is_some() {
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                }
                '"' => break,
                other => value.push(other),
            }
        }
        for c in chars.by_ref() {
            if c == ';' {
                break;
            }
        }
    } else {
        for c in chars.by_ref() {
            if c == ';' {
                break;
            }
            value.push(c);
        }
    }
    value.trim().to_owned()
}
