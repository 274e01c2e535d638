use std::collections::HashMap;

use crate::model::LanguageTag;
use crate::text::normalize;

/// Decides how close a pronunciation has to be before it counts.
///
/// Short phrases leave little room for recognizer noise, so they demand a
/// higher similarity than long ones. Per-language offsets shift the bar for
/// languages the recognizer handles unusually well or badly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdPolicy {
    offsets: HashMap<LanguageTag, f64>,
}

impl ThresholdPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a threshold offset for one language. Positive values make
    /// that language stricter, negative ones more forgiving.
    #[must_use]
    pub fn with_offset(mut self, language: LanguageTag, offset: f64) -> Self {
        self.offsets.insert(language, offset);
        self
    }

    #[must_use]
    pub fn offset_for(&self, language: &LanguageTag) -> f64 {
        self.offsets.get(language).copied().unwrap_or(0.0)
    }

    /// Minimum similarity a transcript must reach to pass `target_text`,
    /// always within `[0.0, 1.0]`.
    #[must_use]
    pub fn acceptance_threshold(&self, target_text: &str, language: &LanguageTag) -> f64 {
        let words = normalize(target_text).split_whitespace().count();
        let base = match words {
            0 | 1 => 0.80,
            2 => 0.75,
            _ => 0.70,
        };
        (base + self.offset_for(language)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(code: &str) -> LanguageTag {
        LanguageTag::new(code).unwrap()
    }

    #[test]
    fn threshold_tiers_by_word_count() {
        let policy = ThresholdPolicy::new();
        let de = tag("de");

        assert!((policy.acceptance_threshold("Hi", &de) - 0.80).abs() < f64::EPSILON);
        assert!((policy.acceptance_threshold("Guten Morgen", &de) - 0.75).abs() < f64::EPSILON);
        assert!(
            (policy.acceptance_threshold("Good morning everyone", &de) - 0.70).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn threshold_counts_words_after_normalization() {
        let policy = ThresholdPolicy::new();
        let de = tag("de");

        // Punctuation does not create extra words.
        assert!((policy.acceptance_threshold("  Hallo!  ", &de) - 0.80).abs() < f64::EPSILON);
        assert!((policy.acceptance_threshold("", &de) - 0.80).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_applies_language_offset() {
        let policy = ThresholdPolicy::new()
            .with_offset(tag("de"), -0.05)
            .with_offset(tag("ja"), 0.10);

        assert!(
            (policy.acceptance_threshold("Guten Morgen", &tag("de")) - 0.70).abs() < f64::EPSILON
        );
        assert!((policy.acceptance_threshold("Ohayō", &tag("ja")) - 0.90).abs() < f64::EPSILON);
        // Unknown languages keep the base threshold.
        assert!((policy.acceptance_threshold("Bonjour", &tag("fr")) - 0.80).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_clamps_to_unit_interval() {
        let policy = ThresholdPolicy::new()
            .with_offset(tag("xx"), 5.0)
            .with_offset(tag("yy"), -5.0);

        assert!((policy.acceptance_threshold("Hi", &tag("xx")) - 1.0).abs() < f64::EPSILON);
        assert!(policy.acceptance_threshold("Hi", &tag("yy")).abs() < f64::EPSILON);
    }
}
