//! Value Extraction
//!
//! Converts a finalized transcript into a typed field value. Numbers come
//! from digits, locale digit glyphs or number-words; select values come from
//! matching option labels. Range checking is left to the host form.

use crate::fields::{FieldKind, FieldSpec, SelectOption};
use crate::i18n::{Catalog, LocaleResources};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Transcripts shorter than this (in characters) are rejected outright
pub const MIN_TRANSCRIPT_CHARS: usize = 2;

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("valid decimal regex");
    static ref LABEL_SPLIT: Regex = Regex::new(r"[\s\-,]+").expect("valid label regex");
}

/// Extracts field values using the session's locale resources
#[derive(Debug, Clone)]
pub struct ValueExtractor {
    catalog: Arc<Catalog>,
}

impl ValueExtractor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Extract a value for `field`, or `None` when nothing plausible was said
    pub fn extract(&self, field: &FieldSpec, transcript: &str) -> Option<String> {
        let text = transcript.trim();
        if text.chars().count() < MIN_TRANSCRIPT_CHARS {
            debug!("Transcript too short: '{}'", text);
            return None;
        }

        let value = match &field.kind {
            FieldKind::Number { .. } => self.extract_number(text),
            FieldKind::Select { options } => match_option(text, options),
            FieldKind::Text => Some(text.to_string()),
        };

        debug!("Extracted {:?} for '{}' from '{}'", value, field.name, text);
        value.filter(|v| !v.is_empty())
    }

    /// Numeric token from text, as a string
    pub fn extract_number(&self, text: &str) -> Option<String> {
        let active = self.catalog.active();
        // Glyphs and ASCII digits may be mixed within one number
        let found = if active.has_digit_glyphs() {
            find_decimal(&active.normalize_digits(text))
        } else {
            find_decimal(text)
        };
        if found.is_some() {
            return found;
        }

        sum_number_words(active, text).or_else(|| {
            self.catalog
                .fallback()
                .and_then(|default| sum_number_words(default, text))
        })
    }
}

/// First ASCII decimal number in the text
pub fn find_decimal(text: &str) -> Option<String> {
    DECIMAL.find(text).map(|m| m.as_str().to_string())
}

/// Sum every recognized number-word token ("seventy two" -> 72)
pub fn sum_number_words(resources: &LocaleResources, text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let mut total: u64 = 0;
    let mut found = false;

    for token in lower.split(|c: char| c.is_whitespace() || c == '-') {
        let clean = token.trim_matches(|c: char| c.is_ascii_punctuation());
        if let Some(n) = resources.number_word(clean) {
            total += u64::from(n);
            found = true;
        }
    }

    found.then(|| total.to_string())
}

/// Match a transcript against option labels.
///
/// Tiers, each scanned over all options in list order: exact
/// (case-insensitive), label contained in transcript, any label word longer
/// than two characters contained in transcript. First hit wins.
pub fn match_option(text: &str, options: &[SelectOption]) -> Option<String> {
    if text.is_empty() || options.is_empty() {
        return None;
    }

    let lower = text.trim().to_lowercase();

    if let Some(opt) = options.iter().find(|o| o.label.to_lowercase() == lower) {
        return Some(opt.value.clone());
    }

    if let Some(opt) = options
        .iter()
        .find(|o| lower.contains(&o.label.to_lowercase()))
    {
        return Some(opt.value.clone());
    }

    options
        .iter()
        .find(|o| {
            let label = o.label.to_lowercase();
            LABEL_SPLIT
                .split(&label)
                .filter(|w| w.chars().count() > 2)
                .any(|w| lower.contains(w))
        })
        .map(|o| o.value.clone())
}
