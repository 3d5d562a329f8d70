use rand::Rng;

use crate::analysis::sentiment::{ Intensity, SentimentResult };
use crate::generation::tone::{ ToneContext, ToneToken };

const MIN_RUN: usize = 3;
const MAX_RUN: usize = 6;
const BASE_EMOTICON_PROBABILITY: f64 = 0.2;
const MAX_EMOTICON_PROBABILITY: f64 = 0.8;

fn emoticons_for(context: ToneContext) -> Option<&'static [&'static str]> {
    match context {
        ToneContext::Standard => Some(&[":3", ":>", "=^.^=", "^.^"]),
        ToneContext::Question => Some(&[":3?", ":>?", "=^.^=?", "^.^?"]),
        ToneContext::Curious => Some(&[":3?", "=^.^=?", "^.^?"]),
        ToneContext::Excited => Some(&[":D", ":3!", "X3", "=^o^=", "^o^", ">:3"]),
        ToneContext::Affectionate => Some(&["♡~", ":3♡", "=^.^=♡"]),
        ToneContext::Content => Some(&[":3", "=^.^=", "^.^"]),
        ToneContext::Playful => Some(&[":3", ":P", "X3", "=^.^=", ">:3", "^o^"]),
        ToneContext::Sad => Some(&[":(", ":c", ";-;", "=T.T="]),
        ToneContext::Sleepy => Some(&["=.=", "-.-", "=~.~=", "zzz :3"]),
        ToneContext::Demanding => Some(&[">:3", ">:(", "=^x^=", "(>_<)"]),
        ToneContext::Annoyed => Some(&[">:(", ">:["]),
        // Wary, defensive and hostile runs stay on plain punctuation.
        ToneContext::Wary | ToneContext::Defensive | ToneContext::Hostile => None,
    }
}

fn terminal_for(context: ToneContext, intensity: Intensity) -> &'static str {
    let base = match context {
        ToneContext::Question | ToneContext::Curious => "?",
        | ToneContext::Excited
        | ToneContext::Demanding
        | ToneContext::Annoyed
        | ToneContext::Defensive
        | ToneContext::Hostile => "!",
        ToneContext::Sad | ToneContext::Sleepy => "...",
        _ => ".",
    };
    // Extreme moods lean on the keyboard.
    match (base, intensity) {
        ("!", Intensity::Extreme) => "!!!",
        ("...", Intensity::Extreme) => "......",
        _ => base,
    }
}

/// Emoticon chance for a reply: base rate scaled up with emotional
/// intensity, capped so punctuation still dominates.
pub fn emoticon_probability(sentiment: &SentimentResult) -> f64 {
    let boost = match sentiment.intensity {
        Intensity::None | Intensity::Low => 1.0,
        Intensity::Moderate => 1.5,
        Intensity::High => 2.0,
        Intensity::Extreme => 3.0,
    };
    (BASE_EMOTICON_PROBABILITY * boost).min(MAX_EMOTICON_PROBABILITY)
}

/// Groups sounds into short pseudo-sentences. A run's mood is the first
/// non-standard context it contains; every sentence ends in punctuation or
/// an emoticon, and no token is dropped or reordered.
pub fn format_sentences<R: Rng>(
    tokens: &[ToneToken],
    emoticon_probability: f64,
    sentiment: &SentimentResult,
    rng: &mut R
) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_context = ToneContext::Standard;
    let mut run_target = rng.gen_range(MIN_RUN..=MAX_RUN);

    for (index, token) in tokens.iter().enumerate() {
        run.push(token.sound);
        if run_context == ToneContext::Standard && token.context != ToneContext::Standard {
            run_context = token.context;
        }

        let is_last = index == tokens.len() - 1;
        if run.len() >= run_target || is_last {
            let mut sentence = run.join(" ");
            let emoticons = emoticons_for(run_context);
            match emoticons {
                Some(table) if rng.gen_bool(emoticon_probability) => {
                    sentence.push(' ');
                    sentence.push_str(table[rng.gen_range(0..table.len())]);
                }
                _ => {
                    sentence.push_str(terminal_for(run_context, sentiment.intensity));
                }
            }
            sentences.push(sentence);

            run.clear();
            run_context = ToneContext::Standard;
            run_target = rng.gen_range(MIN_RUN..=MAX_RUN);
        }
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sentiment::Sentiment;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tokens(pairs: &[(&'static str, ToneContext)]) -> Vec<ToneToken> {
        pairs
            .iter()
            .map(|(sound, context)| ToneToken { sound, context: *context })
            .collect()
    }

    fn uniform(count: usize, context: ToneContext) -> Vec<ToneToken> {
        tokens(&vec![("meow", context); count])
    }

    fn neutral() -> SentimentResult {
        SentimentResult::neutral()
    }

    fn is_terminated(sentence: &str) -> bool {
        sentence.ends_with('.') ||
            sentence.ends_with('?') ||
            sentence.ends_with('!') ||
            emoticon_suffix(sentence)
    }

    fn emoticon_suffix(sentence: &str) -> bool {
        sentence
            .rsplit(' ')
            .next()
            .map(|tail| !tail.is_empty() && !tail.chars().all(|c| c.is_ascii_alphabetic()))
            .unwrap_or(false)
    }

    #[test]
    fn every_sentence_is_non_empty_and_terminated() {
        let mut rng = StdRng::seed_from_u64(17);
        for count in [1, 2, 5, 23, 94] {
            let sentences = format_sentences(
                &uniform(count, ToneContext::Standard),
                0.5,
                &neutral(),
                &mut rng
            );
            assert!(!sentences.is_empty());
            for sentence in &sentences {
                assert!(!sentence.is_empty());
                assert!(is_terminated(sentence), "unterminated sentence {:?}", sentence);
            }
        }
    }

    #[test]
    fn all_tokens_survive_in_order() {
        let mut rng = StdRng::seed_from_u64(19);
        let input: Vec<ToneToken> = (0..40)
            .map(|i| ToneToken {
                sound: if i % 2 == 0 { "meow" } else { "purr" },
                context: ToneContext::Standard,
            })
            .collect();
        let sentences = format_sentences(&input, 0.0, &neutral(), &mut rng);

        let mut reassembled = Vec::new();
        for sentence in &sentences {
            let stripped = sentence.trim_end_matches(['.', '!', '?']);
            reassembled.extend(stripped.split(' ').map(str::to_string));
        }
        let expected: Vec<String> = input
            .iter()
            .map(|t| t.sound.to_string())
            .collect();
        assert_eq!(reassembled, expected);
    }

    #[test]
    fn run_lengths_stay_between_three_and_six() {
        let mut rng = StdRng::seed_from_u64(23);
        let sentences = format_sentences(&uniform(60, ToneContext::Standard), 0.0, &neutral(), &mut rng);
        for sentence in &sentences[..sentences.len() - 1] {
            let words = sentence.trim_end_matches(['.', '!', '?']).split(' ').count();
            assert!((MIN_RUN..=MAX_RUN).contains(&words), "{} words in {:?}", words, sentence);
        }
    }

    #[test]
    fn question_runs_end_with_question_marks() {
        let mut rng = StdRng::seed_from_u64(29);
        let sentences = format_sentences(&uniform(12, ToneContext::Question), 0.0, &neutral(), &mut rng);
        for sentence in sentences {
            assert!(sentence.ends_with('?'), "expected question mark: {:?}", sentence);
        }
    }

    #[test]
    fn extreme_sentiment_stretches_the_terminal() {
        let mut rng = StdRng::seed_from_u64(31);
        let extreme = SentimentResult {
            sentiment: Sentiment::Negative,
            intensity: Intensity::Extreme,
            score: -0.9,
        };
        let sentences = format_sentences(&uniform(12, ToneContext::Hostile), 0.0, &extreme, &mut rng);
        for sentence in sentences {
            assert!(sentence.ends_with("!!!"), "expected !!! on {:?}", sentence);
        }
    }

    #[test]
    fn hostile_runs_fall_back_to_punctuation_even_at_full_emoticon_rate() {
        let mut rng = StdRng::seed_from_u64(37);
        let sentences = format_sentences(
            &uniform(12, ToneContext::Hostile),
            MAX_EMOTICON_PROBABILITY,
            &neutral(),
            &mut rng
        );
        for sentence in sentences {
            assert!(sentence.ends_with('!'), "expected bang on {:?}", sentence);
        }
    }

    #[test]
    fn emoticon_probability_scales_with_intensity_and_caps() {
        let result = |intensity| SentimentResult {
            sentiment: Sentiment::Positive,
            intensity,
            score: 0.5,
        };
        assert_eq!(emoticon_probability(&result(Intensity::Low)), 0.2);
        assert_eq!(emoticon_probability(&result(Intensity::Moderate)), 0.3);
        assert_eq!(emoticon_probability(&result(Intensity::High)), 0.4);
        assert_eq!(emoticon_probability(&result(Intensity::Extreme)), 0.6);
    }

    #[test]
    fn certain_emoticon_probability_appends_an_emoticon() {
        let mut rng = StdRng::seed_from_u64(41);
        let sentences = format_sentences(&uniform(6, ToneContext::Playful), 1.0, &neutral(), &mut rng);
        for sentence in sentences {
            let tail = sentence.rsplit(' ').next().unwrap();
            assert!(
                emoticons_for(ToneContext::Playful).unwrap().contains(&tail),
                "expected playful emoticon on {:?}",
                sentence
            );
        }
    }
}
