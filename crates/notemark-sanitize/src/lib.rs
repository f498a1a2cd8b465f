//! Allow-list HTML sanitization for note rendering.
//!
//! Second stage of the note rendering pipeline. Takes HTML produced by
//! the markup transform — or any HTML an adversary managed to embed in
//! it — and projects it onto an [`AllowPolicy`]: disallowed elements
//! are unwrapped (their readable text survives), `script`/`style` are
//! dropped with their content, attributes outside the allow-list are
//! removed, URL-bearing attributes must carry an allowed scheme, and
//! bare URLs in text are wrapped in anchors.
//!
//! Sanitization never fails: every input, however malformed, produces
//! some [`SafeHtml`]. The stage parses into a tree and walks it; no
//! regex-based tag stripping is involved anywhere.
//!
//! # Example
//!
//! ```
//! use notemark_sanitize::{AllowPolicy, sanitize};
//!
//! let policy = AllowPolicy::default();
//! let safe = sanitize(r#"<p onclick="evil()">hoi</p>"#, &policy);
//! assert_eq!(safe.as_str(), "<p>hoi</p>");
//! ```

mod clean;
mod entities;
mod linkify;
mod parser;
mod policy;
mod serializer;
mod tree;

use std::fmt;

pub use policy::{AllowPolicy, PolicyError};

/// HTML that complies with the [`AllowPolicy`] it was sanitized under.
///
/// A distinct type rather than a bare `String` so callers can neither
/// treat arbitrary strings as already-safe nor feed a sanitized value
/// back through an escaping template layer by accident. Values can only
/// be produced by [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// View the sanitized HTML.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the value, returning the underlying string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether the sanitized output is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeHtml {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sanitize untrusted HTML against `policy`.
///
/// Total function: never fails, for any input. Malformed markup
/// degrades to a best-effort sanitized tree; the worst case is lost
/// fidelity, never an unsafe output. Sanitizing already-sanitized
/// output is a no-op.
#[must_use]
pub fn sanitize(html: &str, policy: &AllowPolicy) -> SafeHtml {
    let nodes = parser::parse_fragment(html);
    let nodes = clean::clean_fragment(nodes, policy);
    let nodes = linkify::linkify_fragment(nodes, policy);
    SafeHtml(serializer::serialize_fragment(&nodes))
}
