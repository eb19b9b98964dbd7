//! Validation of color values and link targets
//!
//! Colors accepted here are the print-safe subset: hex, rgb()/rgba(),
//! hsl()/hsla(), and common named colors. Wide-gamut CSS functions such
//! as oklch() render as black in the PDF pipeline and are rejected at
//! the model boundary.

use regex_lite::Regex;
use std::sync::OnceLock;

const NAMED_COLORS: &[&str] = &[
    "black", "silver", "gray", "grey", "white", "maroon", "red", "purple", "fuchsia", "green",
    "lime", "olive", "yellow", "navy", "blue", "teal", "aqua", "orange", "transparent",
];

const UNSAFE_COLOR_FUNCTIONS: &[&str] = &["oklch(", "oklab(", "color-mix(", "lab(", "lch("];

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap())
}

fn func_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:rgb|rgba|hsl|hsla)\(\s*[\d.%]+\s*,\s*[\d.%]+\s*,\s*[\d.%]+\s*(?:,\s*[\d.]+\s*)?\)$")
            .unwrap()
    })
}

/// Whether a value is an acceptable color for marks and cell attributes
pub fn is_valid_color(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if hex_re().is_match(value) || func_re().is_match(value) {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    NAMED_COLORS.contains(&lower.as_str())
}

/// Whether a color value (or any CSS text) avoids wide-gamut functions
/// that the print pipeline cannot rasterize
pub fn is_print_safe(css: &str) -> bool {
    let lower = css.to_ascii_lowercase();
    !UNSAFE_COLOR_FUNCTIONS.iter().any(|f| lower.contains(f))
}

/// Whether a link target uses an allowed scheme
///
/// `javascript:` and other script-capable schemes are refused; scheme-less
/// values are treated as relative references and allowed.
pub fn is_valid_url(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    let lower = value.to_ascii_lowercase();
    if let Some(colon) = lower.find(':') {
        let scheme = &lower[..colon];
        if scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') {
            return matches!(scheme, "http" | "https" | "mailto" | "tel" | "data");
        }
    }
    true
}
