use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use log::info;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read complexity config '{path}': {source}")] Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse complexity config '{path}': {source}")] Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid phrase pattern '{pattern}': {source}")] Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("min_score {min} must be below max_score {max}")] ScoreBounds {
        min: i32,
        max: i32,
    },
    #[error("length band {index} is not monotonically non-decreasing")] BandOrder {
        index: usize,
    },
    #[error("length band {index} has min_tokens {min} above max_tokens {max}")] BandRange {
        index: usize,
        min: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringWeights {
    pub length_divisor: f64,
    pub max_length_score: f64,
    pub relationship_weight: f64,
    pub abstract_weight: f64,
    pub quantitative_weight: f64,
    pub comma_weight: f64,
    pub semicolon_weight: f64,
    pub colon_weight: f64,
    pub parenthetical_weight: f64,
    pub quotation_weight: f64,
    pub question_multiplier: f64,
    pub exclamation_multiplier: f64,
    pub sentence_multiplier: f64,
    pub complex_word_multiplier: f64,
    pub complex_word_threshold: usize,
    pub min_score: i32,
    pub max_score: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            length_divisor: 3.0,
            max_length_score: 25.0,
            relationship_weight: 3.0,
            abstract_weight: 4.0,
            quantitative_weight: 2.0,
            comma_weight: 0.5,
            semicolon_weight: 2.0,
            colon_weight: 1.5,
            parenthetical_weight: 2.0,
            quotation_weight: 1.0,
            question_multiplier: 5.0,
            exclamation_multiplier: 3.0,
            sentence_multiplier: 4.0,
            complex_word_multiplier: 1.5,
            complex_word_threshold: 5,
            min_score: 2,
            max_score: 80,
        }
    }
}

/// Partial counterpart of [`ScoringWeights`] used by overlay files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringOverlay {
    pub length_divisor: Option<f64>,
    pub max_length_score: Option<f64>,
    pub relationship_weight: Option<f64>,
    pub abstract_weight: Option<f64>,
    pub quantitative_weight: Option<f64>,
    pub comma_weight: Option<f64>,
    pub semicolon_weight: Option<f64>,
    pub colon_weight: Option<f64>,
    pub parenthetical_weight: Option<f64>,
    pub quotation_weight: Option<f64>,
    pub question_multiplier: Option<f64>,
    pub exclamation_multiplier: Option<f64>,
    pub sentence_multiplier: Option<f64>,
    pub complex_word_multiplier: Option<f64>,
    pub complex_word_threshold: Option<usize>,
    pub min_score: Option<i32>,
    pub max_score: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhrasePattern {
    /// Stable key used when overlays replace a pattern.
    pub kind: String,
    pub pattern: String,
    pub base_score: f64,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCategory {
    pub base_score: f64,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeywordCategoryOverlay {
    pub base_score: Option<f64>,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReductionRule {
    pub name: String,
    pub penalty: f64,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAdjustment {
    /// Inclusive hour range; start above end wraps past midnight.
    pub hours: [u32; 2],
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthBand {
    /// Upper complexity bound for this band, inclusive.
    pub max_complexity: i32,
    pub min_tokens: usize,
    pub max_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct ComplexityConfig {
    pub scoring: ScoringWeights,
    pub relationship_words: Vec<String>,
    pub abstract_words: Vec<String>,
    pub quantitative_words: Vec<String>,
    pub patterns: Vec<PhrasePattern>,
    pub keyword_categories: BTreeMap<String, KeywordCategory>,
    pub category_multipliers: BTreeMap<String, f64>,
    pub reduction_rules: Vec<ReductionRule>,
    pub time_adjustments: Vec<TimeAdjustment>,
    pub length_bands: Vec<LengthBand>,
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn pattern(kind: &str, pattern: &str, base_score: f64, category: &str) -> PhrasePattern {
    PhrasePattern {
        kind: kind.to_string(),
        pattern: pattern.to_string(),
        base_score,
        category: category.to_string(),
    }
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        let mut keyword_categories = BTreeMap::new();
        keyword_categories.insert("creative".to_string(), KeywordCategory {
            base_score: 8.0,
            words: strings(
                &[
                    "poem",
                    "story",
                    "song",
                    "lyrics",
                    "novel",
                    "essay",
                    "article",
                    "script",
                    "dialogue",
                    "character",
                    "plot",
                    "narrative",
                    "creative",
                    "artistic",
                    "design",
                    "imagine",
                    "invent",
                    "original",
                ]
            ),
        });
        keyword_categories.insert("academic".to_string(), KeywordCategory {
            base_score: 10.0,
            words: strings(
                &[
                    "universe",
                    "philosophy",
                    "theory",
                    "concept",
                    "analysis",
                    "research",
                    "science",
                    "physics",
                    "mathematics",
                    "history",
                    "literature",
                    "psychology",
                    "sociology",
                    "economics",
                    "politics",
                    "biology",
                    "chemistry",
                    "astronomy",
                    "quantum",
                    "relativity",
                    "evolution",
                    "consciousness",
                    "existence",
                ]
            ),
        });
        keyword_categories.insert("complexity".to_string(), KeywordCategory {
            base_score: 7.0,
            words: strings(
                &[
                    "explain",
                    "elaborate",
                    "detail",
                    "comprehensive",
                    "thorough",
                    "complete",
                    "understand",
                    "analyze",
                    "examine",
                    "explore",
                    "investigate",
                    "discuss",
                    "evaluate",
                    "assess",
                    "critique",
                    "interpret",
                    "synthesize",
                ]
            ),
        });
        keyword_categories.insert("technical".to_string(), KeywordCategory {
            base_score: 9.0,
            words: strings(
                &[
                    "algorithm",
                    "programming",
                    "software",
                    "technology",
                    "computer",
                    "coding",
                    "development",
                    "engineering",
                    "technical",
                    "implementation",
                    "architecture",
                    "framework",
                    "methodology",
                    "optimization",
                    "debugging",
                ]
            ),
        });

        let mut category_multipliers = BTreeMap::new();
        for (category, multiplier) in [
            ("creative", 1.0),
            ("academic", 1.2),
            ("technical", 1.1),
            ("educational", 1.1),
            ("analytical", 1.15),
            ("informational", 1.0),
            ("instructional", 1.05),
            ("questioning", 0.9),
            ("requesting", 0.95),
            ("demonstrative", 1.0),
            ("assistance", 1.0),
            ("descriptive", 1.0),
            ("listing", 0.9),
            ("advisory", 1.0),
            ("evaluative", 1.05),
            ("tutorial", 1.1),
        ] {
            category_multipliers.insert(category.to_string(), multiplier);
        }

        Self {
            scoring: ScoringWeights::default(),
            relationship_words: strings(
                &[
                    "because",
                    "therefore",
                    "however",
                    "moreover",
                    "furthermore",
                    "nevertheless",
                    "consequently",
                    "meanwhile",
                    "although",
                    "whereas",
                ]
            ),
            abstract_words: strings(
                &[
                    "concept",
                    "principle",
                    "theory",
                    "hypothesis",
                    "assumption",
                    "perspective",
                    "approach",
                    "methodology",
                    "framework",
                ]
            ),
            quantitative_words: strings(
                &[
                    "percent",
                    "ratio",
                    "proportion",
                    "statistics",
                    "data",
                    "measurement",
                    "calculate",
                    "estimate",
                    "approximately",
                ]
            ),
            patterns: vec![
                pattern("Creative Writing", r"write (me )?a", 15.0, "creative"),
                pattern("Creative Request", r"create (me )?a", 15.0, "creative"),
                pattern("Composition", r"compose a", 15.0, "creative"),
                pattern("Information Request", r"tell me about", 12.0, "informational"),
                pattern("Detailed Explanation", r"explain (how|why|what|when|where)", 14.0, "educational"),
                pattern("Instructional", r"how (do|to|can)", 12.0, "instructional"),
                pattern("Definition/Question", r"what (is|are|would|should)", 10.0, "questioning"),
                pattern("Request", r"give me (a|an|some)", 10.0, "requesting"),
                pattern("Demonstration", r"show me", 10.0, "demonstrative"),
                pattern("Educational", r"teach me", 14.0, "educational"),
                pattern("Assistance", r"help me (with|understand)", 12.0, "assistance"),
                pattern("Analytical", r"compare", 13.0, "analytical"),
                pattern("Analysis", r"analyze", 13.0, "analytical"),
                pattern("Description", r"describe", 11.0, "descriptive"),
                pattern("Listing", r"list|give me examples", 10.0, "listing"),
                pattern("Recommendation", r"recommend", 9.0, "advisory"),
                pattern("Review", r"review", 11.0, "evaluative"),
                pattern("Tutorial", r"(step by step|tutorial|guide)", 14.0, "tutorial")
            ],
            keyword_categories,
            category_multipliers,
            reduction_rules: vec![
                ReductionRule {
                    name: "simple_greetings".to_string(),
                    penalty: -5.0,
                    words: strings(&["hi", "hello", "hey"]),
                },
                ReductionRule {
                    name: "simple_responses".to_string(),
                    penalty: -4.0,
                    words: strings(&["yes", "no", "ok", "thanks", "bye", "cool", "nice", "lol"]),
                }
            ],
            time_adjustments: vec![
                TimeAdjustment { hours: [6, 9], score: 2.0 },
                TimeAdjustment { hours: [12, 14], score: -1.0 },
                TimeAdjustment { hours: [20, 23], score: 3.0 },
                TimeAdjustment { hours: [0, 5], score: -3.0 }
            ],
            length_bands: vec![
                LengthBand { max_complexity: 6, min_tokens: 2, max_tokens: 5 },
                LengthBand { max_complexity: 12, min_tokens: 5, max_tokens: 10 },
                LengthBand { max_complexity: 20, min_tokens: 10, max_tokens: 19 },
                LengthBand { max_complexity: 30, min_tokens: 20, max_tokens: 34 },
                LengthBand { max_complexity: 45, min_tokens: 30, max_tokens: 49 },
                LengthBand { max_complexity: 60, min_tokens: 45, max_tokens: 69 },
                LengthBand { max_complexity: i32::MAX, min_tokens: 60, max_tokens: 94 }
            ],
        }
    }
}

/// Overlay file shape. Every section is optional; see [`ComplexityConfig::merge`]
/// for how each section combines with the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComplexityOverlay {
    pub scoring: Option<ScoringOverlay>,
    pub relationship_words: Option<Vec<String>>,
    pub abstract_words: Option<Vec<String>>,
    pub quantitative_words: Option<Vec<String>>,
    pub patterns: Option<Vec<PhrasePattern>>,
    pub keyword_categories: Option<BTreeMap<String, KeywordCategoryOverlay>>,
    pub category_multipliers: Option<BTreeMap<String, f64>>,
    pub reduction_rules: Option<Vec<ReductionRule>>,
    pub time_adjustments: Option<Vec<TimeAdjustment>>,
    pub length_bands: Option<Vec<LengthBand>>,
}

macro_rules! overlay_scalar {
    ($target:expr, $overlay:expr, $($field:ident),+ $(,)?) => {
        $(if let Some(value) = $overlay.$field {
            $target.$field = value;
        })+
    };
}

impl ComplexityConfig {
    /// Builds the effective config: defaults, optionally merged with an
    /// overlay file, validated and frozen behind an `Arc`.
    pub fn load(overlay_path: Option<&str>) -> Result<Arc<Self>, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = overlay_path {
            let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;
            let overlay: ComplexityOverlay = serde_json
                ::from_str(&raw)
                .map_err(|source| ConfigError::Json { path: path.to_string(), source })?;
            config.merge(overlay);
            info!("Merged complexity overlay from: {}", path);
        }
        config.validate()?;
        Ok(Arc::new(config))
    }

    /// Merge semantics: scoring scalars replace individually; word lists and
    /// multiplier tables replace/extend per entry; patterns and reduction
    /// rules replace by key or append; time adjustments and length bands
    /// replace wholesale when present.
    pub fn merge(&mut self, overlay: ComplexityOverlay) {
        if let Some(scoring) = overlay.scoring {
            overlay_scalar!(
                self.scoring,
                scoring,
                length_divisor,
                max_length_score,
                relationship_weight,
                abstract_weight,
                quantitative_weight,
                comma_weight,
                semicolon_weight,
                colon_weight,
                parenthetical_weight,
                quotation_weight,
                question_multiplier,
                exclamation_multiplier,
                sentence_multiplier,
                complex_word_multiplier,
                complex_word_threshold,
                min_score,
                max_score,
            );
        }
        if let Some(words) = overlay.relationship_words {
            self.relationship_words = words;
        }
        if let Some(words) = overlay.abstract_words {
            self.abstract_words = words;
        }
        if let Some(words) = overlay.quantitative_words {
            self.quantitative_words = words;
        }
        if let Some(patterns) = overlay.patterns {
            for incoming in patterns {
                match self.patterns.iter_mut().find(|p| p.kind == incoming.kind) {
                    Some(existing) => {
                        *existing = incoming;
                    }
                    None => self.patterns.push(incoming),
                }
            }
        }
        if let Some(categories) = overlay.keyword_categories {
            for (name, incoming) in categories {
                match self.keyword_categories.get_mut(&name) {
                    Some(existing) => {
                        if let Some(base_score) = incoming.base_score {
                            existing.base_score = base_score;
                        }
                        for word in incoming.words {
                            if !existing.words.contains(&word) {
                                existing.words.push(word);
                            }
                        }
                    }
                    None => {
                        self.keyword_categories.insert(name, KeywordCategory {
                            base_score: incoming.base_score.unwrap_or(1.0),
                            words: incoming.words,
                        });
                    }
                }
            }
        }
        if let Some(multipliers) = overlay.category_multipliers {
            for (category, multiplier) in multipliers {
                self.category_multipliers.insert(category, multiplier);
            }
        }
        if let Some(rules) = overlay.reduction_rules {
            for incoming in rules {
                match self.reduction_rules.iter_mut().find(|r| r.name == incoming.name) {
                    Some(existing) => {
                        *existing = incoming;
                    }
                    None => self.reduction_rules.push(incoming),
                }
            }
        }
        if let Some(adjustments) = overlay.time_adjustments {
            self.time_adjustments = adjustments;
        }
        if let Some(bands) = overlay.length_bands {
            self.length_bands = bands;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scoring.min_score >= self.scoring.max_score {
            return Err(ConfigError::ScoreBounds {
                min: self.scoring.min_score,
                max: self.scoring.max_score,
            });
        }
        for phrase in &self.patterns {
            Regex::new(&phrase.pattern).map_err(|source| ConfigError::Pattern {
                pattern: phrase.pattern.clone(),
                source,
            })?;
        }
        for (index, band) in self.length_bands.iter().enumerate() {
            if band.min_tokens > band.max_tokens {
                return Err(ConfigError::BandRange {
                    index,
                    min: band.min_tokens,
                    max: band.max_tokens,
                });
            }
            if index > 0 {
                let previous = &self.length_bands[index - 1];
                if
                    band.max_complexity <= previous.max_complexity ||
                    band.min_tokens < previous.min_tokens ||
                    band.max_tokens < previous.max_tokens
                {
                    return Err(ConfigError::BandOrder { index });
                }
            }
        }
        Ok(())
    }
}
