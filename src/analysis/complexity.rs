use std::collections::BTreeSet;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::complexity::{ ComplexityConfig, ConfigError };

static PARENTHETICAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Pattern categories that nudge the adaptive multiplier upward.
const HIGH_COMPLEXITY_CATEGORIES: &[&str] = &["academic", "technical", "analytical"];

struct CompiledPattern {
    regex: Regex,
    base_score: f64,
    category: String,
}

/// Heuristic estimate of how demanding a prompt is, on a clamped integer
/// scale. Drives how long the generated reply gets.
pub struct ComplexityAnalyzer {
    config: Arc<ComplexityConfig>,
    patterns: Vec<CompiledPattern>,
}

impl ComplexityAnalyzer {
    pub fn new(config: Arc<ComplexityConfig>) -> Result<Self, ConfigError> {
        let mut patterns = Vec::with_capacity(config.patterns.len());
        for phrase in &config.patterns {
            let regex = Regex::new(&phrase.pattern).map_err(|source| ConfigError::Pattern {
                pattern: phrase.pattern.clone(),
                source,
            })?;
            patterns.push(CompiledPattern {
                regex,
                base_score: phrase.base_score,
                category: phrase.category.clone(),
            });
        }
        Ok(Self { config, patterns })
    }

    /// Scores `message` for the given local hour. Never fails; empty or
    /// whitespace input yields the minimum score.
    pub fn score(&self, message: &str, hour: u32) -> i32 {
        let scoring = &self.config.scoring;
        if message.trim().is_empty() {
            return scoring.min_score;
        }

        let text = message.to_lowercase();
        let mut score = (text.len() as f64 / scoring.length_divisor).min(scoring.max_length_score);

        score += self.semantic_term(&text);
        score += self.structural_term(&text);

        let (pattern_score, matched_categories) = self.pattern_term(&text);
        score += pattern_score;
        score += self.keyword_term(&text);

        let question_marks = text.matches('?').count() as f64;
        score += question_marks * scoring.question_multiplier;
        let exclamation_marks = text.matches('!').count() as f64;
        score += exclamation_marks * scoring.exclamation_multiplier;

        let sentences = text
            .split(|c: char| matches!(c, '.' | '!' | '?'))
            .filter(|s| !s.trim().is_empty())
            .count();
        score += (sentences.saturating_sub(1) as f64) * scoring.sentence_multiplier;

        let complex_words = text
            .split_whitespace()
            .filter(|word| {
                word.chars().filter(|c| c.is_ascii_alphabetic()).count() >
                    scoring.complex_word_threshold
            })
            .count();
        score += (complex_words as f64) * scoring.complex_word_multiplier;

        score += self.reduction_term(text.trim());
        score += self.time_term(hour);
        score *= self.adaptive_multiplier(text.len(), &matched_categories);

        let clamped = (score.round() as i32).clamp(scoring.min_score, scoring.max_score);
        debug!("complexity {} for {:?} (hour {})", clamped, message, hour);
        clamped
    }

    fn semantic_term(&self, text: &str) -> f64 {
        let scoring = &self.config.scoring;
        let count = |words: &[String]| {
            words
                .iter()
                .filter(|w| text.contains(w.as_str()))
                .count() as f64
        };
        count(&self.config.relationship_words) * scoring.relationship_weight +
            count(&self.config.abstract_words) * scoring.abstract_weight +
            count(&self.config.quantitative_words) * scoring.quantitative_weight
    }

    fn structural_term(&self, text: &str) -> f64 {
        let scoring = &self.config.scoring;
        let commas = text.matches(',').count() as f64;
        let semicolons = text.matches(';').count() as f64;
        let colons = text.matches(':').count() as f64;
        let parentheticals = PARENTHETICAL_RE.find_iter(text).count() as f64;
        let quote_pairs =
            (text
                .chars()
                .filter(|c| matches!(c, '"' | '\''))
                .count() as f64) / 2.0;

        commas * scoring.comma_weight +
            semicolons * scoring.semicolon_weight +
            colons * scoring.colon_weight +
            parentheticals * scoring.parenthetical_weight +
            quote_pairs * scoring.quotation_weight
    }

    fn pattern_term(&self, text: &str) -> (f64, BTreeSet<String>) {
        let mut pattern_score = 0.0;
        let mut matched_categories = BTreeSet::new();

        for pattern in &self.patterns {
            if pattern.regex.is_match(text) {
                let multiplier = self.multiplier_for(&pattern.category);
                pattern_score += (pattern.base_score * multiplier).round();
                matched_categories.insert(pattern.category.clone());
            }
        }

        // Interdisciplinary bonus when several request categories combine.
        if matched_categories.len() >= 2 {
            let avg_multiplier =
                matched_categories
                    .iter()
                    .map(|c| self.multiplier_for(c))
                    .sum::<f64>() / (matched_categories.len() as f64);
            pattern_score += (
                ((matched_categories.len() - 1) as f64) *
                3.0 *
                avg_multiplier
            ).round();
        }

        (pattern_score, matched_categories)
    }

    fn keyword_term(&self, text: &str) -> f64 {
        let mut keyword_score = 0.0;
        for (category, entry) in &self.config.keyword_categories {
            let matches = entry.words
                .iter()
                .filter(|w| text.contains(w.as_str()))
                .count();
            if matches == 0 {
                continue;
            }
            // Repeated hits from one category grow sub-linearly.
            let diminishing = (1.0 / (matches as f64).sqrt()).min(1.0);
            let multiplier = self.multiplier_for(category);
            keyword_score += (entry.base_score * multiplier * (matches as f64) * diminishing).round();
        }
        keyword_score
    }

    fn reduction_term(&self, trimmed: &str) -> f64 {
        let mut reduction = 0.0;
        for rule in &self.config.reduction_rules {
            for word in &rule.words {
                if trimmed == word.as_str() || trimmed == format!("{}!", word) {
                    reduction += rule.penalty;
                }
            }
        }
        reduction
    }

    fn time_term(&self, hour: u32) -> f64 {
        for adjustment in &self.config.time_adjustments {
            let [start, end] = adjustment.hours;
            let hit = if start <= end {
                hour >= start && hour <= end
            } else {
                hour >= start || hour <= end
            };
            if hit {
                return adjustment.score;
            }
        }
        0.0
    }

    fn adaptive_multiplier(&self, text_len: usize, matched_categories: &BTreeSet<String>) -> f64 {
        let mut multiplier = 1.0;
        for threshold in [100, 200, 300] {
            if text_len > threshold {
                multiplier += 0.1;
            }
        }
        if
            matched_categories
                .iter()
                .any(|c| HIGH_COMPLEXITY_CATEGORIES.contains(&c.as_str()))
        {
            multiplier += 0.05;
        }
        multiplier
    }

    fn multiplier_for(&self, category: &str) -> f64 {
        self.config.category_multipliers.get(category).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOON: u32 = 10;

    fn analyzer() -> ComplexityAnalyzer {
        ComplexityAnalyzer::new(Arc::new(ComplexityConfig::default())).unwrap()
    }

    #[test]
    fn score_stays_within_bounds_for_arbitrary_input() {
        let analyzer = analyzer();
        let inputs = [
            "",
            "   ",
            "hi",
            "?!?!?!?!?!",
            "a",
            &"very long sentence about quantum physics and consciousness. ".repeat(40),
            "(((((((((",
            "\"\"\"'''''",
        ];
        for input in inputs {
            for hour in [0, 7, 13, 21] {
                let score = analyzer.score(input, hour);
                assert!((2..=80).contains(&score), "score {} for {:?}", score, input);
            }
        }
    }

    #[test]
    fn empty_input_yields_minimum_score() {
        let analyzer = analyzer();
        assert_eq!(analyzer.score("", 21), 2);
        assert_eq!(analyzer.score("   \t  ", 21), 2);
    }

    #[test]
    fn bare_greeting_lands_in_the_lowest_band() {
        let analyzer = analyzer();
        for greeting in ["hi", "hello", "hey", "hey!"] {
            for hour in [0, 7, 13, 21] {
                assert!(analyzer.score(greeting, hour) <= 6, "greeting {:?}", greeting);
            }
        }
    }

    #[test]
    fn elaborate_academic_prompt_scores_high() {
        let analyzer = analyzer();
        let prompt =
            "Please write me a comprehensive analysis of quantum physics and its philosophical implications, however surprising";
        assert!(analyzer.score(prompt, NOON) > 45);
    }

    #[test]
    fn pattern_and_keyword_terms_raise_the_score() {
        let analyzer = analyzer();
        let plain = analyzer.score("cats sit on mats today", NOON);
        let patterned = analyzer.score("write me a story about cats on mats", NOON);
        assert!(patterned > plain);
    }

    #[test]
    fn repeated_keywords_grow_sublinearly() {
        let analyzer = analyzer();
        let single = analyzer.score("physics", NOON);
        let triple = analyzer.score("physics quantum astronomy", NOON);
        // Three keywords from one category must not triple the score.
        assert!(triple < single * 3);
    }

    #[test]
    fn score_is_idempotent_at_a_fixed_hour() {
        let analyzer = analyzer();
        let prompt = "Explain how rainbows form, please!";
        assert_eq!(analyzer.score(prompt, NOON), analyzer.score(prompt, NOON));
    }

    #[test]
    fn time_of_day_term_is_isolated_to_the_hour_argument() {
        let analyzer = analyzer();
        let prompt = "tell me about the weather patterns of the pacific";
        let evening = analyzer.score(prompt, 21);
        let night = analyzer.score(prompt, 3);
        assert!(evening > night);
    }

    #[test]
    fn structural_punctuation_raises_the_score() {
        let analyzer = analyzer();
        let flat = analyzer.score("explain how trees grow tall in forests", NOON);
        let structured = analyzer.score(
            "explain how trees (both conifers and broadleafs) grow tall; roots, trunks, and canopies",
            NOON
        );
        assert!(structured > flat);
    }
}
