//! In-place placeholder substitution for a single file.

use std::path::Path;

use tracing::{debug, warn};

use super::files::rewrite_text;
use super::placeholders::PlaceholderMap;
use crate::core::error::Result;

/// Replace every `{{key}}` token from `placeholders` in the file at `path`.
///
/// The file is rewritten only if its content changed; the return value says
/// whether it did. Undecodable files fail with `Error::Encoding`, which the
/// caller records without stopping the run. No backup is kept, so this must
/// only ever run on a disposable copy.
pub fn substitute(path: &Path, placeholders: &PlaceholderMap) -> Result<bool> {
    let mut unresolved = Default::default();
    let changed = rewrite_text(path, |text| {
        let output = placeholders.apply(text);
        unresolved = placeholders.unresolved_in(&output);
        output
    })?;

    if !unresolved.is_empty() {
        warn!(
            path = %path.display(),
            keys = ?unresolved,
            "placeholders without a value remain in file"
        );
    }
    debug!(path = %path.display(), changed, "substituted placeholders");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn billing_map() -> PlaceholderMap {
        [("service_name", "billing"), ("Domain", "Billing Analytics")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_substitute_greeting_then_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("greeting.txt");
        fs::write(&path, "Hello {{service_name}}, welcome to {{Domain}}!").unwrap();

        assert!(substitute(&path, &billing_map()).unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Hello billing, welcome to Billing Analytics!"
        );

        assert!(!substitute(&path, &billing_map()).unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Hello billing, welcome to Billing Analytics!"
        );
    }

    #[test]
    fn test_substitute_leaves_file_without_tokens_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.md");
        fs::write(&path, "nothing to see").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        assert!(!substitute(&path, &billing_map()).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn test_substitute_reports_encoding_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xe9]).unwrap();

        let err = substitute(&path, &billing_map()).unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));
    }

    #[test]
    #[traced_test]
    fn test_substitute_warns_about_keys_missing_from_map() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pyproject.toml");
        fs::write(&path, "name = \"{{service_name}}\"\nauthors = [\"{{author}}\"]").unwrap();

        assert!(substitute(&path, &billing_map()).unwrap());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("name = \"billing\""));
        assert!(content.contains("{{author}}"));
        assert!(logs_contain("placeholders without a value remain"));
    }
}
