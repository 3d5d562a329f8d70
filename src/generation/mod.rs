pub mod delay;
pub mod length;
pub mod sentence;
pub mod tone;

use std::sync::Arc;

use rand::Rng;

use crate::analysis::complexity::ComplexityAnalyzer;
use crate::analysis::sentiment::{ SentimentAnalyzer, SentimentResult };
use crate::config::complexity::{ ComplexityConfig, ConfigError };
use length::UtteranceLengthPolicy;
use sentence::{ emoticon_probability, format_sentences };
use tone::{ pool_for, ToneContext, ToneSelector, ToneToken };

/// A fully generated reply, before the transport streams it out.
#[derive(Clone, Debug)]
pub struct ReplyPlan {
    pub complexity: i32,
    pub sentiment: SentimentResult,
    pub sentences: Vec<String>,
    /// The sentence text exploded on spaces, in emission order.
    pub tokens: Vec<String>,
}

/// Runs the whole pipeline: complexity and sentiment analysis, length
/// sampling, per-token tone selection and sentence formatting.
pub struct ReplyPlanner {
    analyzer: ComplexityAnalyzer,
    sentiment: SentimentAnalyzer,
    length_policy: UtteranceLengthPolicy,
}

impl ReplyPlanner {
    pub fn new(config: Arc<ComplexityConfig>) -> Result<Self, ConfigError> {
        let length_policy = UtteranceLengthPolicy::new(&config);
        let analyzer = ComplexityAnalyzer::new(config)?;
        Ok(Self {
            analyzer,
            sentiment: SentimentAnalyzer::new(),
            length_policy,
        })
    }

    pub fn plan<R: Rng>(&self, message: &str, hour: u32, rng: &mut R) -> ReplyPlan {
        let complexity = self.analyzer.score(message, hour);
        let sentiment = self.sentiment.analyze(message);
        let count = self.length_policy.token_count(complexity, rng);

        let selector = ToneSelector::new(message, &sentiment, hour, rng);
        let tones: Vec<ToneToken> = (0..count).map(|_| selector.select(rng)).collect();

        let sentences = format_sentences(&tones, emoticon_probability(&sentiment), &sentiment, rng);
        let tokens = sentences
            .join(" ")
            .split(' ')
            .map(str::to_string)
            .collect();

        ReplyPlan { complexity, sentiment, sentences, tokens }
    }

    /// Short upbeat line shown as the greeting subtitle: 5-7 sounds from the
    /// friendlier pools, almost always ending on an exclamation mark.
    pub fn welcome_line<R: Rng>(&self, rng: &mut R) -> String {
        let count = rng.gen_range(5..=7);
        let mut sounds = Vec::with_capacity(count);
        for _ in 0..count {
            let roll: f64 = rng.gen();
            let pool = if roll < 0.5 {
                pool_for(ToneContext::Standard)
            } else if roll < 0.75 {
                pool_for(ToneContext::Question)
            } else {
                pool_for(ToneContext::Excited)
            };
            sounds.push(pool[rng.gen_range(0..pool.len())]);
        }
        let terminal = if rng.gen_bool(0.75) { "!" } else { "?" };
        format!("{}{}", sounds.join(" "), terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const DAY_HOUR: u32 = 10;

    fn planner() -> ReplyPlanner {
        ReplyPlanner::new(Arc::new(ComplexityConfig::default())).unwrap()
    }

    #[test]
    fn plan_tokens_match_the_sentences() {
        let planner = planner();
        let mut rng = StdRng::seed_from_u64(61);
        let plan = planner.plan("tell me about the sea", DAY_HOUR, &mut rng);
        assert!(!plan.sentences.is_empty());
        assert_eq!(plan.tokens.join(" "), plan.sentences.join(" "));
    }

    #[test]
    fn greeting_stays_short() {
        let planner = planner();
        let mut rng = StdRng::seed_from_u64(67);
        for _ in 0..50 {
            let plan = planner.plan("hi", DAY_HOUR, &mut rng);
            assert!(plan.complexity <= 6);
        }
    }

    #[test]
    fn welcome_line_shape() {
        let planner = planner();
        let mut rng = StdRng::seed_from_u64(71);
        for _ in 0..100 {
            let line = planner.welcome_line(&mut rng);
            assert!(line.ends_with('!') || line.ends_with('?'));
            let sounds = line.trim_end_matches(['!', '?']).split(' ').count();
            assert!((5..=7).contains(&sounds), "welcome line {:?}", line);
        }
    }
}
