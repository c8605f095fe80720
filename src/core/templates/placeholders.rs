//! Placeholder vocabulary and the values that fill it.
//!
//! Template files carry `{{key}}` tokens: exact key, double braces, no
//! whitespace inside. A [`PlaceholderMap`] is built once from the collected
//! [`ServiceValues`] and never changes afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::core::error::{Error, Result};

pub const SERVICE_NAME_KEY: &str = "service_name";
pub const DISPLAY_NAME_KEY: &str = "Service Name";
pub const DESCRIPTION_KEY: &str = "Service Description";
pub const DOMAIN_KEY: &str = "Domain";
pub const DOMAIN_LOWER_KEY: &str = "domain";
pub const AUTHOR_KEY: &str = "author";
pub const EMAIL_KEY: &str = "email";

static SERVICE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("valid service name regex"));

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid placeholder regex"));

/// Format `key` as the token that appears in template files.
pub fn token(key: &str) -> String {
    format!("{{{{{key}}}}}")
}

/// Mapping from placeholder key to substitution value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaceholderMap {
    values: BTreeMap<String, String>,
}

impl PlaceholderMap {
    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every `{{key}}` occurrence for every key in the map.
    ///
    /// Values must not themselves contain placeholder tokens, otherwise a
    /// later key could rewrite text produced by an earlier one.
    pub fn apply(&self, text: &str) -> String {
        let mut output = text.to_string();
        for (key, value) in &self.values {
            let pattern = token(key);
            if output.contains(&pattern) {
                output = output.replace(&pattern, value);
            }
        }
        output
    }

    /// Tokens in `text` whose key has no entry in this map.
    pub fn unresolved_in(&self, text: &str) -> BTreeSet<String> {
        find_tokens(text)
            .into_iter()
            .filter(|key| !self.values.contains_key(key))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for PlaceholderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Every distinct placeholder key referenced in `text`.
pub fn find_tokens(text: &str) -> BTreeSet<String> {
    TOKEN_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Values collected from the user for one setup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceValues {
    pub target_directory: PathBuf,
    pub service_name: String,
    pub display_name: String,
    pub description: String,
    pub domain: String,
    pub author: Option<String>,
    pub email: Option<String>,
}

impl ServiceValues {
    /// Build the placeholder map; optional keys are only present when given.
    pub fn placeholders(&self) -> PlaceholderMap {
        let mut pairs = vec![
            (SERVICE_NAME_KEY, self.service_name.clone()),
            (DISPLAY_NAME_KEY, self.display_name.clone()),
            (DESCRIPTION_KEY, self.description.clone()),
            (DOMAIN_KEY, self.domain.clone()),
            (DOMAIN_LOWER_KEY, self.domain.to_lowercase()),
        ];
        if let Some(author) = &self.author {
            pairs.push((AUTHOR_KEY, author.clone()));
        }
        if let Some(email) = &self.email {
            pairs.push((EMAIL_KEY, email.clone()));
        }
        pairs.into_iter().collect()
    }
}

/// Check a service identifier.
///
/// It must be lowercase, start with a letter and use only letters, digits,
/// underscores and hyphens, and it must also be usable as a package
/// identifier in the generated project (so no hyphens in practice).
pub fn validate_service_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation("Service name cannot be empty"));
    }
    if !SERVICE_NAME_RE.is_match(name) {
        return Err(Error::validation(
            "Service name must be lowercase, start with a letter, and contain only letters, numbers, underscores, and hyphens",
        ));
    }
    if !is_package_identifier(name) {
        return Err(Error::validation(
            "Service name must be a valid package identifier",
        ));
    }
    Ok(())
}

fn is_package_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Check a required free-text value such as the display name.
pub fn validate_text(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!("{label} cannot be empty")));
    }
    validate_optional_text(label, value)
}

/// Free text may not introduce new placeholder tokens.
pub fn validate_optional_text(label: &str, value: &str) -> Result<()> {
    if value.contains("{{") || value.contains("}}") {
        return Err(Error::validation(format!(
            "{label} must not contain '{{{{' or '}}}}'"
        )));
    }
    Ok(())
}
