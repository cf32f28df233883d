//! Noise generation utilities for terrain generation.
//!
//! Provides deterministic noise functions for biome classification and per-biome height fields.

use noise::{NoiseFn, Perlin};

/// Configuration for multi-octave noise generation.
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    /// Number of octaves (layers of detail)
    pub octaves: u32,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves (persistence)
    pub persistence: f64,
    /// Base frequency (scale)
    pub frequency: f64,
    /// Seed for deterministic generation
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 1.0,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Create config for temperature noise (biome classification).
    pub fn temperature(seed: u32) -> Self {
        Self {
            octaves: 3,
            frequency: 0.012,
            seed,
            ..Self::default()
        }
    }

    /// Create config for humidity noise (biome classification).
    pub fn humidity(seed: u32) -> Self {
        Self {
            octaves: 3,
            frequency: 0.01,
            seed: seed.wrapping_add(1000), // Offset seed
            ..Self::default()
        }
    }

    /// Create config for a biome's height field: 4 octaves, persistence 0.5, lacunarity 2.
    pub fn biome_height(seed: u32, biome_index: u32, frequency: f64) -> Self {
        Self {
            frequency,
            seed: seed.wrapping_add(biome_index.wrapping_mul(100)),
            ..Self::default()
        }
    }
}

/// Noise generator using Perlin noise.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    perlin: Perlin,
    config: NoiseConfig,
}

impl NoiseGenerator {
    /// Create a new noise generator with the given configuration.
    pub fn new(config: NoiseConfig) -> Self {
        Self {
            perlin: Perlin::new(config.seed),
            config,
        }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Generate noise value at 2D coordinates with multi-octave sampling.
    ///
    /// Returns value in range [-1.0, 1.0].
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves {
            value += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            max_value += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        // Normalize to [-1.0, 1.0]
        (value / max_value).clamp(-1.0, 1.0)
    }

    /// Sample noise mapped to [0.0, 1.0].
    pub fn sample_2d_unit(&self, x: f64, y: f64) -> f64 {
        (self.sample_2d(x, y) + 1.0) * 0.5
    }
}
