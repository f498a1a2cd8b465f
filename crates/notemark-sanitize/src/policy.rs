//! Allow-list policy configuration.
//!
//! The policy is loaded once at startup (TOML file or [`Default`]) and
//! then shared by reference across all render calls. Malformed policy
//! fails fast here; the render path itself never fails.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

/// Error raised when loading or validating an [`AllowPolicy`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PolicyError {
    /// I/O error reading a policy file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantic validation error.
    #[error("policy error: {0}")]
    Validation(String),
}

/// Immutable allow-list: which elements, attributes and URL schemes may
/// survive sanitization.
///
/// All names are matched lowercased; [`AllowPolicy::load`] and
/// [`AllowPolicy::from_toml_str`] normalize their input, and
/// [`AllowPolicy::validate`] rejects non-lowercase entries in
/// hand-built policies.
///
/// The default policy mirrors a conservative note-display allow-list:
/// text structure, emphasis, code, lists, headings, links and tables,
/// with `href`/`title`/`rel` on anchors, `class` on code spans, and
/// `http`/`https`/`mailto` URL schemes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AllowPolicy {
    /// Element names permitted in output.
    pub allowed_tags: HashSet<String>,
    /// Per-element attribute allow-lists.
    pub allowed_attributes: HashMap<String, HashSet<String>>,
    /// Attributes permitted on every retained element.
    pub global_attributes: HashSet<String>,
    /// URL schemes permitted in URL-bearing attributes.
    pub allowed_url_schemes: HashSet<String>,
}

impl Default for AllowPolicy {
    fn default() -> Self {
        let tags: &[&str] = &[
            "p",
            "br",
            "hr",
            "strong",
            "b",
            "em",
            "i",
            "code",
            "pre",
            "blockquote",
            "ul",
            "ol",
            "li",
            "h1",
            "h2",
            "h3",
            "h4",
            "h5",
            "h6",
            "a",
            "table",
            "thead",
            "tbody",
            "tr",
            "th",
            "td",
            "span",
        ];
        let attributes: &[(&str, &[&str])] = &[
            ("a", &["href", "title", "rel"]),
            ("code", &["class"]),
            ("span", &["class"]),
            ("th", &["align"]),
            ("td", &["align"]),
            ("p", &["align"]),
        ];
        let schemes: &[&str] = &["http", "https", "mailto"];

        Self {
            allowed_tags: tags.iter().map(|&t| t.to_owned()).collect(),
            allowed_attributes: attributes
                .iter()
                .map(|&(tag, names)| {
                    (tag.to_owned(), names.iter().map(|&n| n.to_owned()).collect())
                })
                .collect(),
            global_attributes: HashSet::new(),
            allowed_url_schemes: schemes.iter().map(|&s| s.to_owned()).collect(),
        }
    }
}

impl AllowPolicy {
    /// Load and validate a policy from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML,
    /// or fails [`AllowPolicy::validate`].
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a policy from a TOML string.
    ///
    /// Missing fields fall back to the [`Default`] policy, so a file
    /// can override only `allowed_tags` and keep the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid TOML or the resulting
    /// policy fails [`AllowPolicy::validate`].
    pub fn from_toml_str(input: &str) -> Result<Self, PolicyError> {
        let mut policy: Self = toml::from_str(input)?;
        policy.normalize();
        policy.validate()?;
        Ok(policy)
    }

    /// Validate the policy.
    ///
    /// Rejects attribute allow-lists that reference elements not in
    /// `allowed_tags`, non-lowercase names, and malformed URL schemes.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Validation`] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.allowed_tags.is_empty() && !self.allowed_attributes.is_empty() {
            return Err(PolicyError::Validation(
                "allowed_attributes is set but allowed_tags is empty".to_owned(),
            ));
        }
        for tag in self.allowed_tags.iter().chain(self.allowed_attributes.keys()) {
            require_name(tag, "tag")?;
        }
        for tag in self.allowed_attributes.keys() {
            if !self.allowed_tags.contains(tag) {
                return Err(PolicyError::Validation(format!(
                    "allowed_attributes references tag not in allowed_tags: {tag}"
                )));
            }
        }
        for attr in self
            .allowed_attributes
            .values()
            .flatten()
            .chain(&self.global_attributes)
        {
            require_name(attr, "attribute")?;
        }
        for scheme in &self.allowed_url_schemes {
            require_scheme(scheme)?;
        }
        Ok(())
    }

    /// Lowercase every name in the policy.
    fn normalize(&mut self) {
        self.allowed_tags = std::mem::take(&mut self.allowed_tags)
            .into_iter()
            .map(|t| t.to_ascii_lowercase())
            .collect();
        self.allowed_attributes = std::mem::take(&mut self.allowed_attributes)
            .into_iter()
            .map(|(tag, attrs)| {
                (
                    tag.to_ascii_lowercase(),
                    attrs.into_iter().map(|a| a.to_ascii_lowercase()).collect(),
                )
            })
            .collect();
        self.global_attributes = std::mem::take(&mut self.global_attributes)
            .into_iter()
            .map(|a| a.to_ascii_lowercase())
            .collect();
        self.allowed_url_schemes = std::mem::take(&mut self.allowed_url_schemes)
            .into_iter()
            .map(|s| s.to_ascii_lowercase())
            .collect();
    }

    pub(crate) fn is_tag_allowed(&self, tag: &str) -> bool {
        self.allowed_tags.contains(tag)
    }

    pub(crate) fn is_attr_allowed(&self, tag: &str, attr: &str) -> bool {
        self.global_attributes.contains(attr)
            || self
                .allowed_attributes
                .get(tag)
                .is_some_and(|attrs| attrs.contains(attr))
    }

    pub(crate) fn is_scheme_allowed(&self, scheme: &str) -> bool {
        self.allowed_url_schemes.contains(scheme)
    }
}

/// Require a lowercase ASCII element or attribute name.
fn require_name(name: &str, kind: &str) -> Result<(), PolicyError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PolicyError::Validation(format!(
            "{kind} name must be lowercase ASCII: {name:?}"
        )))
    }
}

/// Require a valid lowercase URL scheme (RFC 3986 shape).
fn require_scheme(scheme: &str) -> Result<(), PolicyError> {
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|first| first.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PolicyError::Validation(format!(
            "invalid URL scheme: {scheme:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = AllowPolicy::default();
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_default_policy_contents() {
        let policy = AllowPolicy::default();
        assert!(policy.is_tag_allowed("strong"));
        assert!(policy.is_tag_allowed("h6"));
        assert!(!policy.is_tag_allowed("script"));
        assert!(!policy.is_tag_allowed("img"));
        assert!(policy.is_attr_allowed("a", "href"));
        assert!(!policy.is_attr_allowed("a", "onclick"));
        assert!(!policy.is_attr_allowed("p", "href"));
        assert!(policy.is_scheme_allowed("https"));
        assert!(!policy.is_scheme_allowed("javascript"));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let policy = AllowPolicy::from_toml_str("").unwrap();
        assert!(policy.is_tag_allowed("p"));
    }

    #[test]
    fn test_parse_toml_overrides() {
        let toml = r#"
allowed_tags = ["p", "em", "a", "code", "span", "th", "td"]
allowed_url_schemes = ["https"]
"#;
        let policy = AllowPolicy::from_toml_str(toml).unwrap();
        assert!(policy.is_tag_allowed("em"));
        assert!(!policy.is_tag_allowed("strong"));
        assert!(!policy.is_scheme_allowed("http"));
        assert!(policy.is_scheme_allowed("https"));
    }

    #[test]
    fn test_parse_toml_attribute_table() {
        let toml = r#"
allowed_tags = ["a"]
global_attributes = ["title"]
allowed_url_schemes = ["https"]

[allowed_attributes]
a = ["href"]
"#;
        let policy = AllowPolicy::from_toml_str(toml).unwrap();
        assert!(policy.is_attr_allowed("a", "href"));
        assert!(policy.is_attr_allowed("a", "title"));
        assert!(!policy.is_attr_allowed("a", "rel"));
    }

    #[test]
    fn test_toml_names_are_normalized() {
        let toml = r#"
allowed_tags = ["P", "A"]
allowed_url_schemes = ["HTTPS"]

[allowed_attributes]
A = ["HREF"]
"#;
        let policy = AllowPolicy::from_toml_str(toml).unwrap();
        assert!(policy.is_tag_allowed("p"));
        assert!(policy.is_attr_allowed("a", "href"));
        assert!(policy.is_scheme_allowed("https"));
    }

    #[test]
    fn test_empty_tags_with_attributes_rejected() {
        let toml = r#"
allowed_tags = []

[allowed_attributes]
a = ["href"]
"#;
        let err = AllowPolicy::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, PolicyError::Validation(_)));
        assert!(err.to_string().contains("allowed_tags is empty"));
    }

    #[test]
    fn test_attributes_for_unknown_tag_rejected() {
        let toml = r#"
allowed_tags = ["p"]

[allowed_attributes]
img = ["src"]
"#;
        let err = AllowPolicy::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("img"));
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let toml = r#"
allowed_tags = ["p"]
allowed_url_schemes = ["java script"]
"#;
        let err = AllowPolicy::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, PolicyError::Validation(_)));
    }

    #[test]
    fn test_empty_scheme_rejected() {
        let mut policy = AllowPolicy::default();
        policy.allowed_url_schemes.insert(String::new());
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_hand_built_uppercase_rejected() {
        let mut policy = AllowPolicy::default();
        policy.allowed_tags.insert("DIV".to_owned());
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = AllowPolicy::from_toml_str("allowed_tags = 7").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }
}
