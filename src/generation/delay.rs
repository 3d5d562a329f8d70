use rand::Rng;

pub const MIN_DELAY_MS: u64 = 20;
pub const MAX_DELAY_MS: u64 = 800;

const BASE_DELAY_MS: f64 = 45.0;
const CHAR_COST_MS: f64 = 8.0;
const ATTENTION_SPIKE_CHANCE: f64 = 0.15;
const THINKING_PAUSE_CHANCE: f64 = 0.08;
const CACHE_BURST_CHANCE: f64 = 0.2;
const CACHE_BURST_FACTOR: f64 = 0.6;
const FINAL_STRETCH: f64 = 0.8;

/// Per-token emission latency imitating a generative model: warm-up on the
/// first token, complexity-scaled inference cost, per-character cost,
/// attention spikes, end-of-sequence slowdown, jitter, occasional longer
/// pauses and cache bursts. Pure given its `Rng`; always lands inside
/// `[MIN_DELAY_MS, MAX_DELAY_MS]`.
pub fn token_delay<R: Rng>(
    token: &str,
    position: usize,
    total_tokens: usize,
    complexity: i32,
    rng: &mut R
) -> u64 {
    let mut delay = BASE_DELAY_MS;

    if position == 0 {
        delay += 100.0 + rng.gen_range(0.0..200.0);
    }

    delay *= 1.0 + (complexity as f64) / 100.0;
    delay += (token.chars().count() as f64) * CHAR_COST_MS;

    if token.contains('!') || token.contains('?') || token.contains("...") {
        delay += 20.0 + rng.gen_range(0.0..40.0);
    }

    if rng.gen_bool(ATTENTION_SPIKE_CHANCE) {
        delay += 30.0 + rng.gen_range(0.0..70.0);
    }

    if total_tokens > 0 && (position as f64) > (total_tokens as f64) * FINAL_STRETCH {
        delay += 15.0 + rng.gen_range(0.0..25.0);
    }

    delay += rng.gen_range(-15.0..15.0);

    if rng.gen_bool(THINKING_PAUSE_CHANCE) {
        delay += 100.0 + rng.gen_range(0.0..150.0);
    }

    if position > 0 && rng.gen_bool(CACHE_BURST_CHANCE) {
        delay *= CACHE_BURST_FACTOR;
    }

    (delay.round() as i64).clamp(MIN_DELAY_MS as i64, MAX_DELAY_MS as i64) as u64
}
