use crate::error::{EngineError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Uniform;

/// Range neuron weights are drawn from.
pub const WEIGHT_RANGE: (f64, f64) = (-1.0, 1.0);
/// Range neuron biases are drawn from.
pub const BIAS_RANGE: (f64, f64) = (-5.0, 5.0);

/// Uniform distribution over `[low, high)`.
pub fn uniform(low: f64, high: f64) -> Result<Uniform<f64>> {
    Uniform::new(low, high).map_err(|e| {
        EngineError::InvalidConfig(format!("invalid uniform range [{}, {}): {}", low, high, e))
    })
}

/// Deterministic generator for reproducible initialization.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_distr::Distribution;

    #[test]
    fn test_uniform_samples_in_range() {
        let dist = uniform(WEIGHT_RANGE.0, WEIGHT_RANGE.1).unwrap();
        let mut rng = seeded_rng(7);
        for _ in 0..1000 {
            let x = dist.sample(&mut rng);
            assert!((-1.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_uniform_rejects_empty_range() {
        assert!(matches!(uniform(1.0, 1.0), Err(EngineError::InvalidConfig(_))));
        assert!(uniform(2.0, -2.0).is_err());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let dist = uniform(BIAS_RANGE.0, BIAS_RANGE.1).unwrap();
        let a: Vec<f64> = (&dist).sample_iter(seeded_rng(1337)).take(5).collect();
        let b: Vec<f64> = (&dist).sample_iter(seeded_rng(1337)).take(5).collect();
        assert_eq!(a, b);
    }
}
