//! Entry name derivation and collision resolution.
//!
//! The in-archive name of a reference is the final path segment of its URL.
//! Its extension is everything after the first `.`, so `report.tar.gz` has
//! extension `tar.gz` and stem `report`.

use crate::error::{Error, Result};

/// A name derived from a URL, split at its first dot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateName {
    /// Part before the first `.`
    pub stem: String,
    /// Part after the first `.`
    pub extension: String,
}

impl CandidateName {
    /// The full file name (`stem.extension`)
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension)
    }

    /// The name with `-n` inserted before the extension
    pub fn with_suffix(&self, n: usize) -> String {
        format!("{}-{}.{}", self.stem, n, self.extension)
    }
}

/// Derive the candidate entry name from a reference URL
///
/// Only `http` and `https` URLs are accepted. Query and fragment never take
/// part in the name; the last path segment is percent-decoded.
///
/// # Errors
///
/// - [`Error::InvalidUrl`] if the URL does not parse or uses another scheme
/// - [`Error::MalformedName`] if the last segment is empty, has no `.`,
///   or decodes to something containing a path separator
pub fn candidate_name(url: &str) -> Result<CandidateName> {
    let parsed = url::Url::parse(url.trim()).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {:?}", parsed.scheme()),
        });
    }

    let malformed = || Error::MalformedName {
        url: url.to_string(),
    };

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .ok_or_else(malformed)?;
    let decoded = urlencoding::decode(segment).map_err(|_| malformed())?;

    if decoded.is_empty() || decoded.contains(['/', '\\']) {
        return Err(malformed());
    }

    let (stem, extension) = decoded.split_once('.').ok_or_else(malformed)?;

    Ok(CandidateName {
        stem: stem.to_string(),
        extension: extension.to_string(),
    })
}

/// Pick the final entry name for `candidate` given the names already taken
///
/// A free candidate keeps its own name. On collision the suffix starts at
/// `entry_count + 1`; if that renamed name is itself taken (possible when
/// earlier renames used the same number) the suffix keeps counting up until
/// the name is free.
pub fn resolve_collision<F>(candidate: &CandidateName, entry_count: usize, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let name = candidate.file_name();
    if !is_taken(&name) {
        return name;
    }

    let mut n = entry_count + 1;
    loop {
        let renamed = candidate.with_suffix(n);
        if !is_taken(&renamed) {
            return renamed;
        }
        n += 1;
    }
}
