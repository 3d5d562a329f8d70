use rand::Rng;

use crate::analysis::sentiment::{ Intensity, Sentiment, SentimentResult };

/// Emotional context attached to each generated sound; drives sentence
/// punctuation and emoticon choice downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToneContext {
    Standard,
    Question,
    Curious,
    Excited,
    Affectionate,
    Content,
    Playful,
    Sad,
    Sleepy,
    Demanding,
    Wary,
    Annoyed,
    Defensive,
    Hostile,
}

#[derive(Clone, Debug)]
pub struct ToneToken {
    pub sound: &'static str,
    pub context: ToneContext,
}

const STANDARD_SOUNDS: &[&str] = &["meow", "mrow", "mrrow", "mew", "miau"];
const QUESTION_SOUNDS: &[&str] = &["meow", "mrow", "mrrow", "mew"];
const EXCITED_SOUNDS: &[&str] = &["MEOW", "MROW", "meow", "mrow", "MEW"];
const CONTENT_SOUNDS: &[&str] = &["purr", "purrr", "mrrrr", "prrrr"];
const PLAYFUL_SOUNDS: &[&str] = &["mrow", "mrp", "prr", "mew", "mewmew", "miau"];
const SAD_SOUNDS: &[&str] = &["mew", "meow", "mrow"];
const SLEEPY_SOUNDS: &[&str] = &["mrow", "mrrrr", "yawn", "*yawn*", "zzz"];
const CURIOUS_SOUNDS: &[&str] = &["mrow", "mrrow", "mew", "meow", "miau"];
const DEMANDING_SOUNDS: &[&str] = &["MEOW", "MROW", "MEW", "FEED ME", "OVERTHROW THE GOVERNMENT"];
const AFFECTIONATE_SOUNDS: &[&str] = &["purr", "mrow", "meow", "mrrow"];
const WARY_SOUNDS: &[&str] = &["mrow", "mrrr", "hmph", "mrrow"];
const ANNOYED_SOUNDS: &[&str] = &["mrow", "hiss", "grr", "HMPH"];
const DEFENSIVE_SOUNDS: &[&str] = &["hiss", "hsss", "growl", "mrrr"];
const HOSTILE_SOUNDS: &[&str] = &["HISS", "GROWL", "hiss", "growl", "grrr"];

pub fn pool_for(context: ToneContext) -> &'static [&'static str] {
    match context {
        ToneContext::Standard => STANDARD_SOUNDS,
        ToneContext::Question => QUESTION_SOUNDS,
        ToneContext::Curious => CURIOUS_SOUNDS,
        ToneContext::Excited => EXCITED_SOUNDS,
        ToneContext::Affectionate => AFFECTIONATE_SOUNDS,
        ToneContext::Content => CONTENT_SOUNDS,
        ToneContext::Playful => PLAYFUL_SOUNDS,
        ToneContext::Sad => SAD_SOUNDS,
        ToneContext::Sleepy => SLEEPY_SOUNDS,
        ToneContext::Demanding => DEMANDING_SOUNDS,
        ToneContext::Wary => WARY_SOUNDS,
        ToneContext::Annoyed => ANNOYED_SOUNDS,
        ToneContext::Defensive => DEFENSIVE_SOUNDS,
        ToneContext::Hostile => HOSTILE_SOUNDS,
    }
}

pub fn is_night(hour: u32) -> bool {
    hour >= 22 || hour <= 5
}

/// Per-message keyword cues, scanned once before token generation.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordSignals {
    pub question: bool,
    pub excited: bool,
    pub affection: bool,
    pub sadness: bool,
    pub sleepy: bool,
    pub playful: bool,
    pub hunger: bool,
    pub content: bool,
}

impl KeywordSignals {
    pub fn scan(text: &str) -> Self {
        let any = |words: &[&str]| words.iter().any(|w| text.contains(w));
        Self {
            question: text.contains('?'),
            excited: text.contains('!') || any(&["excited", "happy", "amazing"]),
            affection: any(&["love", "cute", "adorable", "sweet"]),
            sadness: any(&["sad", "sorry", "terrible", "awful"]),
            sleepy: any(&["tired", "sleep", "nap"]),
            playful: any(&["play", "fun", "game", "toy"]),
            hunger: any(&["food", "hungry", "treat", "feed"]),
            content: any(&["good", "nice", "relaxed", "comfortable"]),
        }
    }
}

/// Picks a tone pool per token. Sentiment dominates; neutral messages fall
/// back to keyword and punctuation cues on the raw text.
pub struct ToneSelector {
    signals: KeywordSignals,
    sentiment: SentimentResult,
    sleepy_mode: bool,
}

impl ToneSelector {
    pub fn new<R: Rng>(
        message: &str,
        sentiment: &SentimentResult,
        hour: u32,
        rng: &mut R
    ) -> Self {
        let signals = KeywordSignals::scan(&message.to_lowercase());
        // The whole reply goes drowsy on sleep talk, or sometimes at night.
        let sleepy_mode = signals.sleepy || (is_night(hour) && rng.gen_bool(0.25));
        Self { signals, sentiment: *sentiment, sleepy_mode }
    }

    pub fn select<R: Rng>(&self, rng: &mut R) -> ToneToken {
        let context = self.pick_context(rng);
        ToneToken { sound: pick(pool_for(context), rng), context }
    }

    fn pick_context<R: Rng>(&self, rng: &mut R) -> ToneContext {
        if self.sleepy_mode && rng.gen_bool(0.25) {
            return ToneContext::Sleepy;
        }
        match self.sentiment.sentiment {
            Sentiment::Positive => self.positive_context(rng),
            Sentiment::Negative => self.negative_context(rng),
            Sentiment::Neutral => self.neutral_context(rng),
        }
    }

    fn positive_context<R: Rng>(&self, rng: &mut R) -> ToneContext {
        match self.sentiment.intensity {
            Intensity::None | Intensity::Low => either(ToneContext::Content, ToneContext::Standard, rng),
            Intensity::Moderate => either(ToneContext::Content, ToneContext::Playful, rng),
            Intensity::High => either(ToneContext::Excited, ToneContext::Affectionate, rng),
            Intensity::Extreme => ToneContext::Excited,
        }
    }

    fn negative_context<R: Rng>(&self, rng: &mut R) -> ToneContext {
        match self.sentiment.intensity {
            Intensity::None | Intensity::Low => either(ToneContext::Wary, ToneContext::Sad, rng),
            Intensity::Moderate => either(ToneContext::Wary, ToneContext::Annoyed, rng),
            Intensity::High => either(ToneContext::Defensive, ToneContext::Annoyed, rng),
            Intensity::Extreme => either(ToneContext::Hostile, ToneContext::Defensive, rng),
        }
    }

    fn neutral_context<R: Rng>(&self, rng: &mut R) -> ToneContext {
        let signals = &self.signals;
        if signals.question && rng.gen_bool(0.4) {
            either(ToneContext::Question, ToneContext::Curious, rng)
        } else if signals.excited && rng.gen_bool(0.35) {
            ToneContext::Excited
        } else if signals.affection && rng.gen_bool(0.3) {
            ToneContext::Affectionate
        } else if signals.sadness && rng.gen_bool(0.25) {
            ToneContext::Sad
        } else if signals.playful && rng.gen_bool(0.3) {
            ToneContext::Playful
        } else if signals.hunger && rng.gen_bool(0.4) {
            ToneContext::Demanding
        } else if signals.content && rng.gen_bool(0.25) {
            ToneContext::Content
        } else if rng.gen_bool(0.2) {
            // Occasional variety so long neutral replies do not drone.
            [ToneContext::Playful, ToneContext::Content, ToneContext::Curious][rng.gen_range(0..3)]
        } else {
            ToneContext::Standard
        }
    }
}

fn either<R: Rng>(a: ToneContext, b: ToneContext, rng: &mut R) -> ToneContext {
    if rng.gen_bool(0.5) {
        a
    } else {
        b
    }
}

fn pick<'a, R: Rng>(pool: &'a [&'a str], rng: &mut R) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}
