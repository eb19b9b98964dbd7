//! Finding and substituting `{{key}}` tokens in markup

use crate::PlaceholderValues;
use regex_lite::Regex;
use std::sync::OnceLock;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap())
}

/// Whether a key may be used in a placeholder token
///
/// A key is one or more characters other than `}`; keys are compared
/// verbatim, whitespace included.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('}')
}

/// Every distinct placeholder key in `markup`, in first-appearance order
pub fn extract_placeholders(markup: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in token_re().captures_iter(markup) {
        if let Some(key) = caps.get(1) {
            let key = key.as_str().to_string();
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
    }
    seen
}

/// Substitute saved values into `markup` in one pass
///
/// Tokens with no saved value keep their literal `{{key}}` form.
/// Substituted values are never rescanned, so a value containing braces
/// cannot trigger further replacement.
pub fn apply_values(markup: &str, values: &PlaceholderValues) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut last = 0;
    for caps in token_re().captures_iter(markup) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let key = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        out.push_str(&markup[last..whole.start()]);
        match values.get(key) {
            Some(value) => out.push_str(value),
            None => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&markup[last..]);
    out
}

/// Build the value set for a document: one entry per extracted key,
/// carrying over any previously saved value
pub fn seed_values(markup: &str, saved: &PlaceholderValues) -> PlaceholderValues {
    extract_placeholders(markup)
        .into_iter()
        .map(|key| {
            let value = saved.get(&key).unwrap_or("").to_string();
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_distinct_in_order() {
        let markup = "<p>{{client_name}} pays {{budget}} to {{client_name}}</p>";
        assert_eq!(
            extract_placeholders(markup),
            vec!["client_name".to_string(), "budget".to_string()]
        );
    }

    #[test]
    fn test_extract_requires_nonempty_key() {
        assert!(extract_placeholders("<p>{{}}</p>").is_empty());
    }

    #[test]
    fn test_keys_are_verbatim() {
        // Whitespace is part of the key, and `{` is an ordinary character.
        assert_eq!(
            extract_placeholders("<p>{{a}} {{ a }} {{a{b}}</p>"),
            vec!["a".to_string(), " a ".to_string(), "a{b".to_string()]
        );
        let mut values = PlaceholderValues::new();
        values.set(" a ", "spaced");
        values.set("a{b", "braced");
        assert_eq!(
            apply_values("{{a}} {{ a }} {{a{b}}", &values),
            "{{a}} spaced braced"
        );
    }

    #[test]
    fn test_apply_known_and_unknown() {
        let mut values = PlaceholderValues::new();
        values.set("client_name", "Acme");
        let out = apply_values("<p>{{client_name}}: {{budget}}</p>", &values);
        assert_eq!(out, "<p>Acme: {{budget}}</p>");
    }

    #[test]
    fn test_apply_is_not_recursive() {
        let mut values = PlaceholderValues::new();
        values.set("a", "{{b}}");
        values.set("b", "deep");
        assert_eq!(apply_values("{{a}}", &values), "{{b}}");
    }

    #[test]
    fn test_apply_empty_value_erases_token() {
        let mut values = PlaceholderValues::new();
        values.set("gone", "");
        assert_eq!(apply_values("x{{gone}}y", &values), "xy");
    }

    #[test]
    fn test_seed_keeps_saved_values() {
        let mut saved = PlaceholderValues::new();
        saved.set("budget", "$5,000");
        saved.set("stale_key", "old");
        let seeded = seed_values("<p>{{budget}} {{client_name}}</p>", &saved);
        assert_eq!(seeded.get("budget"), Some("$5,000"));
        assert_eq!(seeded.get("client_name"), Some(""));
        assert_eq!(seeded.get("stale_key"), None);
    }

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("client_name"));
        assert!(is_valid_key("Budget 2026"));
        assert!(is_valid_key("a{b"));
        assert!(is_valid_key(" padded "));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("a}b"));
    }
}
