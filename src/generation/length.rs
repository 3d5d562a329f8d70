use rand::Rng;

use crate::config::complexity::{ ComplexityConfig, LengthBand };

/// Maps a complexity score to a reply length, sampled inside the band the
/// score falls into. Bands are validated monotonic at config load.
pub struct UtteranceLengthPolicy {
    bands: Vec<LengthBand>,
}

impl UtteranceLengthPolicy {
    pub fn new(config: &ComplexityConfig) -> Self {
        Self { bands: config.length_bands.clone() }
    }

    pub fn token_count<R: Rng>(&self, complexity: i32, rng: &mut R) -> usize {
        let band = self.bands
            .iter()
            .find(|b| complexity <= b.max_complexity)
            .unwrap_or_else(|| self.bands.last().expect("length bands are never empty"));
        rng.gen_range(band.min_tokens..=band.max_tokens)
    }
}
