//! Key normalization for the lookup tables
//!
//! Phone numbers are expanded into every variant they should be reachable
//! by; names are folded to lowercase ASCII where a decomposition exists.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Produces lookup keys for phone numbers and names
pub trait Normalizer: Send + Sync {
    /// All variants under which `number` is indexed and searched.
    /// Returns an empty list for a blank number.
    fn phone_variants(&self, number: &str) -> Vec<String>;

    /// Folded form of a name. Returns an empty string for a blank name.
    fn normalize_name(&self, name: &str) -> String;
}

/// Minimum local-number length kept when a country code is stripped
const MIN_LOCAL_DIGITS: usize = 6;

/// Built-in normalizer
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl DefaultNormalizer {
    pub fn new() -> Self {
        Self
    }
}

fn push_unique(out: &mut Vec<String>, candidate: String) {
    if !candidate.is_empty() && !out.contains(&candidate) {
        out.push(candidate);
    }
}

impl Normalizer for DefaultNormalizer {
    fn phone_variants(&self, number: &str) -> Vec<String> {
        let trimmed = number.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let mut variants = Vec::new();
        push_unique(&mut variants, trimmed.to_string());

        let mut sanitized = String::with_capacity(trimmed.len());
        for (i, c) in trimmed.chars().enumerate() {
            if c.is_ascii_digit() || (c == '+' && i == 0) {
                sanitized.push(c);
            }
        }
        push_unique(&mut variants, sanitized.clone());

        let digits: String = sanitized.chars().filter(char::is_ascii_digit).collect();
        push_unique(&mut variants, digits.clone());

        let international = if let Some(rest) = digits.strip_prefix("00") {
            push_unique(&mut variants, format!("+{}", rest));
            Some(rest.to_string())
        } else if sanitized.starts_with('+') {
            Some(digits.clone())
        } else {
            None
        };

        if let Some(intl) = international {
            push_unique(&mut variants, format!("+{}", intl));
            for cc_len in 1..=3 {
                if intl.len() >= cc_len + MIN_LOCAL_DIGITS {
                    push_unique(&mut variants, intl[cc_len..].to_string());
                }
            }
        }

        variants
    }

    fn normalize_name(&self, name: &str) -> String {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        trimmed
            .to_lowercase()
            .nfd()
            .filter(|c| !is_combining_mark(*c))
            .collect()
    }
}
