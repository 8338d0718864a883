//! Normalized navigation targets and the address-input rewrite rule.

use crate::config::SearchRewrite;
use core::fmt;
use url::Url;

/// URI schemes the shell forwards to the page host unchanged.
const RECOGNIZED_SCHEMES: [&str; 4] = ["http", "https", "file", "about"];

/// A normalized navigable target: an absolute URL or a synthesized
/// search-engine query URL. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Destination(String);

impl Destination {
    /// Resolves raw address-bar input into a destination.
    ///
    /// Precedence: a recognized scheme passes through unchanged; scheme-less
    /// input containing a `.` gets an explicit `http://` prefix; anything
    /// else becomes a search-engine query URL. Empty or whitespace-only
    /// input resolves to nothing so callers can ignore it.
    pub fn resolve(raw: &str, rewrite: &SearchRewrite) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if has_recognized_scheme(trimmed) {
            return Some(Self(trimmed.to_owned()));
        }

        if trimmed.contains('.') {
            return Some(Self(format!("http://{trimmed}")));
        }

        Some(Self(rewrite.query_url(trimmed)))
    }

    /// Wraps a destination string read back from the store. Stored values
    /// were normalized when written, so no rewrite is applied.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn has_recognized_scheme(input: &str) -> bool {
    // `Url::parse` rejects scheme-less input like `example.com/docs`, and
    // accepts things like `localhost:3000` with `localhost` as the scheme;
    // the recognized-scheme allowlist keeps those on the rewrite path.
    let Ok(parsed) = Url::parse(input) else {
        return false;
    };

    RECOGNIZED_SCHEMES.contains(&parsed.scheme())
}
