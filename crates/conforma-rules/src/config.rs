use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_IMAGE_SIZE_KIB: u64 = 500;
pub const DEFAULT_ACCEPTED_IMAGE_EXTENSIONS: &[&str] = &["webp", "svg"];
pub const DEFAULT_ACCEPTED_FONT_SUBSTRINGS: &[&str] = &["bradesco", "sans-serif"];
pub const DEFAULT_REQUIRED_HTML_SUFFIX: &str = ".shtm";

/// Third-party origins pages may load from without breaking the
/// external-resource rule. Entries carrying a path are reduced to their
/// origin when a [`crate::RuleSet`] is built.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://www.google.com",
    "https://www.google.com.br",
    "https://googleads.g.doubleclick.net",
    "https://www.googletagmanager.com",
    "https://www.google-analytics.com",
    "https://connect.facebook.net",
    "https://t.co",
    "https://analytics.twitter.com",
    "https://td.doubleclick.net",
    "http://static.ads-twitter.com",
    "https://static.ads-twitter.com/uwt.js",
    "https://analytics.google.com",
    "https://stats.g.doubleclick.net",
    "https://static.ads-twitter.com",
];

/// Scripts whose requests are exempt from the external-resource rule
/// wherever they point.
pub const DEFAULT_ALLOWED_INITIATORS: &[&str] = &["http://static.ads-twitter.com/uwt.js"];

/// Thresholds and allow-lists for the five compliance rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub max_image_size_kib: u64,
    pub accepted_image_extensions: Vec<String>,
    pub accepted_font_substrings: Vec<String>,
    pub required_html_suffix: String,
    pub allowed_origins: Vec<String>,
    pub allowed_initiators: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            max_image_size_kib: DEFAULT_MAX_IMAGE_SIZE_KIB,
            accepted_image_extensions: owned(DEFAULT_ACCEPTED_IMAGE_EXTENSIONS),
            accepted_font_substrings: owned(DEFAULT_ACCEPTED_FONT_SUBSTRINGS),
            required_html_suffix: DEFAULT_REQUIRED_HTML_SUFFIX.to_string(),
            allowed_origins: owned(DEFAULT_ALLOWED_ORIGINS),
            allowed_initiators: owned(DEFAULT_ALLOWED_INITIATORS),
        }
    }
}

impl RuleConfig {
    pub fn max_image_size_bytes(&self) -> u64 {
        self.max_image_size_kib.saturating_mul(1024)
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
