//! Seeded random source
//!
//! Every random decision in the simulation is drawn from one of these. Two
//! instances built from the same seed and queried with the same sequence of
//! calls produce bit-identical results.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone)]
pub struct DeterministicRandom {
    seed: u64,
    rng: Pcg32,
}

impl DeterministicRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// The seed this generator was built from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in [min, max). Returns `min` when the range is empty.
    pub fn next_int(&mut self, min: i32, max: i32) -> SimResult<i32> {
        if min > max {
            return Err(SimError::InvalidRange {
                min: min as f64,
                max: max as f64,
            });
        }
        if min == max {
            return Ok(min);
        }
        Ok(self.rng.random_range(min..max))
    }

    /// Uniform float in [min, max)
    pub fn next_float(&mut self, min: f32, max: f32) -> SimResult<f32> {
        check_float_range(min as f64, max as f64)?;
        if min == max {
            return Ok(min);
        }
        let u: f32 = self.rng.random();
        let value = min + (max - min) * u;
        // Rounding can land on `max` for narrow ranges
        Ok(if value < max { value } else { f32_below(max) })
    }

    /// Uniform double in [min, max)
    pub fn next_double(&mut self, min: f64, max: f64) -> SimResult<f64> {
        check_float_range(min, max)?;
        if min == max {
            return Ok(min);
        }
        let u: f64 = self.rng.random();
        let value = min + (max - min) * u;
        Ok(if value < max { value } else { f64_below(max) })
    }
}

/// Largest f32 strictly below a finite `x`
fn f32_below(x: f32) -> f32 {
    let bits = x.to_bits();
    if x == 0.0 {
        -f32::from_bits(1)
    } else if x > 0.0 {
        f32::from_bits(bits - 1)
    } else {
        f32::from_bits(bits + 1)
    }
}

/// Largest f64 strictly below a finite `x`
fn f64_below(x: f64) -> f64 {
    let bits = x.to_bits();
    if x == 0.0 {
        -f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(bits - 1)
    } else {
        f64::from_bits(bits + 1)
    }
}

fn check_float_range(min: f64, max: f64) -> SimResult<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(SimError::InvalidRange { min, max });
    }
    Ok(())
}
