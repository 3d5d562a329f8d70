use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use once_cell::sync::Lazy;
use serde::{ Serialize, Deserialize };
use thiserror::Error;

/// Polarity threshold; scores closer to zero than this are neutral.
const NEUTRAL_BAND: f64 = 0.08;
/// Negation words flip a sentiment word this many tokens back.
const NEGATION_WINDOW: usize = 3;
/// Per-word normalization step for the length-scaled denominator.
const LENGTH_SCALE: f64 = 0.05;

const EXCLAMATION_BONUS: f64 = 0.12;
const CAPS_BONUS: f64 = 0.1;
const STRETCH_BONUS: f64 = 0.08;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    None,
    Low,
    Moderate,
    High,
    Extreme,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub intensity: Intensity,
    pub score: f64,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        Self { sentiment: Sentiment::Neutral, intensity: Intensity::None, score: 0.0 }
    }
}

#[derive(Debug, Error)]
#[error("tokenizer failed: {0}")]
pub struct TokenizeError(pub String);

/// Seam for swapping in a smarter tokenizer; the analyzer falls back to a
/// rule-based scan if an implementation errors.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, TokenizeError>;
}

pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, TokenizeError> {
        Ok(text.split_whitespace().collect())
    }
}

static SENTIMENT_WEIGHTS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let tiers: [(f64, &[&str]); 6] = [
        (
            1.0,
            &[
                "amazing",
                "incredible",
                "awesome",
                "fantastic",
                "wonderful",
                "perfect",
                "brilliant",
                "outstanding",
                "magnificent",
                "phenomenal",
                "spectacular",
            ],
        ),
        (
            0.7,
            &[
                "love",
                "excellent",
                "great",
                "beautiful",
                "delightful",
                "superb",
                "joyful",
                "thrilled",
                "adore",
                "marvelous",
            ],
        ),
        (
            0.4,
            &[
                "good",
                "nice",
                "happy",
                "fun",
                "cool",
                "pleasant",
                "sweet",
                "cute",
                "like",
                "enjoy",
                "glad",
                "fine",
                "lovely",
            ],
        ),
        (
            -0.4,
            &[
                "bad",
                "sad",
                "meh",
                "boring",
                "annoying",
                "wrong",
                "gross",
                "dislike",
                "unhappy",
                "bland",
            ],
        ),
        (
            -0.7,
            &[
                "hate",
                "awful",
                "terrible",
                "horrible",
                "angry",
                "disgusting",
                "miserable",
                "furious",
                "dreadful",
                "nasty",
            ],
        ),
        (
            -1.0,
            &[
                "abysmal",
                "atrocious",
                "horrendous",
                "despise",
                "loathe",
                "unbearable",
                "worst",
                "vile",
            ],
        ),
    ];
    let mut weights = HashMap::new();
    for (weight, words) in tiers {
        for word in words {
            weights.insert(*word, weight);
        }
    }
    weights
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("very", 1.5),
        ("really", 1.4),
        ("extremely", 2.0),
        ("so", 1.3),
        ("incredibly", 1.8),
        ("absolutely", 1.7),
        ("totally", 1.5),
        ("quite", 1.2),
        ("super", 1.6),
    ])
});

const NEGATIONS: &[&str] = &[
    "not",
    "no",
    "never",
    "none",
    "don't",
    "doesn't",
    "didn't",
    "can't",
    "cannot",
    "won't",
    "isn't",
    "aren't",
    "wasn't",
    "weren't",
];

const POSITIVE_STEMS: &[&str] = &["lov", "enjoy", "happ", "great", "good", "nic", "wonderf", "amaz", "excit"];
const NEGATIVE_STEMS: &[&str] = &["hat", "terribl", "horribl", "awful", "bad", "sad", "angr", "disgust", "annoy"];

/// Lexicon-based mood estimate for a prompt. Never fails: the weighted scan
/// is primary, and a simpler stem lookup covers tokenizer failures.
pub struct SentimentAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self { tokenizer: Arc::new(WhitespaceTokenizer) }
    }

    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    pub fn analyze(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() {
            return SentimentResult::neutral();
        }
        match self.weighted_scan(text) {
            Ok(result) => result,
            Err(e) => {
                warn!("Sentiment tokenizer failed, using stem fallback: {}", e);
                self.stem_scan(text)
            }
        }
    }

    fn weighted_scan(&self, text: &str) -> Result<SentimentResult, TokenizeError> {
        let tokens = self.tokenizer.tokenize(text)?;
        let cleaned: Vec<String> = tokens.iter().map(|t| clean_word(t)).collect();

        let mut raw = 0.0;
        for (i, word) in cleaned.iter().enumerate() {
            let Some(&weight) = SENTIMENT_WEIGHTS.get(word.as_str()) else {
                continue;
            };
            let mut contribution = weight;
            if i > 0 {
                if let Some(&boost) = INTENSIFIERS.get(cleaned[i - 1].as_str()) {
                    contribution *= boost;
                }
            }
            let window = &cleaned[i.saturating_sub(NEGATION_WINDOW)..i];
            if window.iter().any(|w| NEGATIONS.contains(&w.as_str())) {
                contribution = -contribution;
            }
            raw += contribution;
        }

        // Emphasis cues amplify whatever leaning the words established.
        if raw != 0.0 {
            let sign = raw.signum();
            let exclamations = text.matches('!').count().min(3) as f64;
            raw += sign * exclamations * EXCLAMATION_BONUS;
            let shouted = tokens
                .iter()
                .filter(|t| is_shouted(t))
                .count()
                .min(3) as f64;
            raw += sign * shouted * CAPS_BONUS;
            let stretches = letter_stretches(text).min(3) as f64;
            raw += sign * stretches * STRETCH_BONUS;
        }

        let denominator = 1.0 + LENGTH_SCALE * (cleaned.len() as f64);
        Ok(classify((raw / denominator).clamp(-1.0, 1.0)))
    }

    fn stem_scan(&self, text: &str) -> SentimentResult {
        let words: Vec<String> = text.split_whitespace().map(clean_word).collect();
        let mut raw = 0.0;
        for word in &words {
            if POSITIVE_STEMS.iter().any(|stem| word.starts_with(stem)) {
                raw += 0.4;
            } else if NEGATIVE_STEMS.iter().any(|stem| word.starts_with(stem)) {
                raw -= 0.4;
            }
        }
        let denominator = 1.0 + LENGTH_SCALE * (words.len() as f64);
        classify((raw / denominator).clamp(-1.0, 1.0))
    }
}

fn classify(score: f64) -> SentimentResult {
    let sentiment = if score > NEUTRAL_BAND {
        Sentiment::Positive
    } else if score < -NEUTRAL_BAND {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };
    let magnitude = score.abs();
    let intensity = if sentiment == Sentiment::Neutral {
        Intensity::None
    } else if magnitude < 0.15 {
        Intensity::Low
    } else if magnitude < 0.3 {
        Intensity::Moderate
    } else if magnitude < 0.55 {
        Intensity::High
    } else {
        Intensity::Extreme
    };
    SentimentResult { sentiment, intensity, score }
}

fn clean_word(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

fn is_shouted(token: &str) -> bool {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// Counts runs of three or more identical letters ("soooo", "hmmm").
fn letter_stretches(text: &str) -> usize {
    let mut stretches = 0;
    let mut run_char = '\0';
    let mut run_len = 0;
    for c in text.chars() {
        if c.is_alphabetic() && c.eq_ignore_ascii_case(&run_char) {
            run_len += 1;
            if run_len == 3 {
                stretches += 1;
            }
        } else {
            run_char = c;
            run_len = 1;
        }
    }
    stretches
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenTokenizer;

    impl Tokenizer for BrokenTokenizer {
        fn tokenize<'a>(&self, _text: &'a str) -> Result<Vec<&'a str>, TokenizeError> {
            Err(TokenizeError("model unavailable".to_string()))
        }
    }

    #[test]
    fn score_stays_in_range() {
        let analyzer = SentimentAnalyzer::new();
        let inputs = [
            "",
            "hello there",
            "I LOVE LOVE LOVE this amazing wonderful fantastic perfect day!!!!!",
            "worst vile atrocious horrendous abysmal experience ever!!!",
            "soooo goooood",
        ];
        for input in inputs {
            let result = analyzer.analyze(input);
            assert!((-1.0..=1.0).contains(&result.score), "score for {:?}", input);
        }
    }

    #[test]
    fn empty_input_is_neutral_none() {
        let result = SentimentAnalyzer::new().analyze("   ");
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.intensity, Intensity::None);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn score_sign_matches_sentiment_category() {
        let analyzer = SentimentAnalyzer::new();
        let positive = analyzer.analyze("what a lovely sweet happy day");
        assert_eq!(positive.sentiment, Sentiment::Positive);
        assert!(positive.score > 0.0);

        let negative = analyzer.analyze("this is awful and boring");
        assert_eq!(negative.sentiment, Sentiment::Negative);
        assert!(negative.score < 0.0);
    }

    #[test]
    fn adding_positive_words_never_lowers_the_score() {
        let analyzer = SentimentAnalyzer::new();
        let mut text = "the afternoon was".to_string();
        let mut last = analyzer.analyze(&text).score;
        for word in ["nice", "good", "lovely", "great", "wonderful", "amazing"] {
            text.push(' ');
            text.push_str(word);
            let score = analyzer.analyze(&text).score;
            assert!(score >= last, "score dropped after adding {:?}", word);
            last = score;
        }
    }

    #[test]
    fn negation_flips_polarity() {
        let analyzer = SentimentAnalyzer::new();
        let plain = analyzer.analyze("this is good");
        let negated = analyzer.analyze("this is not good");
        assert_eq!(plain.sentiment, Sentiment::Positive);
        assert_eq!(negated.sentiment, Sentiment::Negative);
    }

    #[test]
    fn intensifier_strengthens_the_signal() {
        let analyzer = SentimentAnalyzer::new();
        let plain = analyzer.analyze("the food was good");
        let boosted = analyzer.analyze("the food was extremely good");
        assert!(boosted.score > plain.score);
    }

    #[test]
    fn hostile_outburst_reads_as_strongly_negative() {
        let result = SentimentAnalyzer::new().analyze("I hate this, it's horrible!!!");
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert!(result.intensity >= Intensity::High);
    }

    #[test]
    fn tokenizer_failure_falls_back_to_stem_scan() {
        let analyzer = SentimentAnalyzer::with_tokenizer(Arc::new(BrokenTokenizer));
        let result = analyzer.analyze("I love this wonderful day");
        assert_eq!(result.sentiment, Sentiment::Positive);

        let result = analyzer.analyze("I hate this terrible day");
        assert_eq!(result.sentiment, Sentiment::Negative);
    }
}
