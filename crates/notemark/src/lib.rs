//! Note markup rendering with allow-list sanitization.
//!
//! Turns raw, untrusted note text into HTML that is safe to embed in a
//! page without further escaping. Rendering is a strictly linear, pure
//! pipeline:
//!
//! 1. **Markup transform** (`notemark-markup`) — parses the lightweight
//!    note grammar (headings, bold, italic, inline code, fenced code
//!    blocks, lists, blockquotes, links) into HTML. Literal HTML in the
//!    input passes through unchanged.
//! 2. **Sanitize & normalize** (`notemark-sanitize`) — projects that
//!    HTML onto an [`AllowPolicy`], strips everything outside the
//!    allow-list, enforces URL schemes and auto-links bare URLs,
//!    returning [`SafeHtml`].
//!
//! Every input produces output; rendering sits on a user-facing display
//! path and never fails. The only fallible operation is policy loading,
//! which fails fast at startup.
//!
//! Rendering holds no shared mutable state: a single [`AllowPolicy`]
//! can be shared by reference across any number of threads.
//!
//! # Example
//!
//! ```
//! use notemark::{AllowPolicy, render};
//!
//! let policy = AllowPolicy::default();
//! let safe = render("# Titel\n\n**vet** en `code`", &policy);
//! assert_eq!(
//!     safe.as_str(),
//!     "<h1>Titel</h1>\n<p><strong>vet</strong> en <code>code</code></p>"
//! );
//! ```

pub use notemark_markup::transform;
pub use notemark_sanitize::{AllowPolicy, PolicyError, SafeHtml, sanitize};

/// Render raw note text to policy-compliant HTML.
///
/// Total function: any input, including empty or malformed markup and
/// embedded hostile HTML, produces some [`SafeHtml`].
#[must_use]
pub fn render(raw_text: &str, policy: &AllowPolicy) -> SafeHtml {
    let html = transform(raw_text);
    let safe = sanitize(&html, policy);
    tracing::debug!(
        input_len = raw_text.len(),
        output_len = safe.as_str().len(),
        "rendered note markup"
    );
    safe
}

/// Renderer owning its policy, for callers that keep one policy for the
/// process lifetime.
///
/// # Example
///
/// ```
/// use notemark::Renderer;
///
/// let renderer = Renderer::new();
/// let safe = renderer.render("**vet**");
/// assert_eq!(safe.as_str(), "<p><strong>vet</strong></p>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    policy: AllowPolicy,
}

impl Renderer {
    /// Create a renderer with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with a custom policy.
    ///
    /// The policy should have been validated at load time; see
    /// [`AllowPolicy::from_toml_str`] and [`AllowPolicy::load`].
    #[must_use]
    pub fn with_policy(policy: AllowPolicy) -> Self {
        Self { policy }
    }

    /// The policy this renderer applies.
    #[must_use]
    pub fn policy(&self) -> &AllowPolicy {
        &self.policy
    }

    /// Render raw note text to policy-compliant HTML.
    #[must_use]
    pub fn render(&self, raw_text: &str) -> SafeHtml {
        render(raw_text, &self.policy)
    }
}
