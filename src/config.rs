use crate::error::{EngineError, Result};

/// Configuration for MLP model architecture
#[derive(Debug, Clone, PartialEq)]
pub struct MlpConfig {
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub output_size: usize,
}

impl MlpConfig {
    pub fn new(input_size: usize, hidden_sizes: Vec<usize>, output_size: usize) -> Self {
        Self {
            input_size,
            hidden_sizes,
            output_size,
        }
    }

    /// Configuration for scalar regression
    pub fn regression(input_size: usize) -> Self {
        Self::new(input_size, vec![8, 8], 1)
    }

    /// Layer widths from input to output, e.g. `[3, 4, 4, 1]`.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.input_size);
        sizes.extend(&self.hidden_sizes);
        sizes.push(self.output_size);
        sizes
    }

    pub fn validate(&self) -> Result<()> {
        if self.sizes().contains(&0) {
            return Err(EngineError::InvalidConfig(format!(
                "layer sizes must be positive, got {:?}",
                self.sizes()
            )));
        }
        Ok(())
    }
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self::new(3, vec![4, 4], 1)
    }
}

/// Training configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// Seed for parameter initialization.
    pub seed: u64,
    pub print_every: usize,
}

impl TrainingConfig {
    pub fn new(learning_rate: f64, epochs: usize, seed: u64) -> Self {
        Self {
            learning_rate,
            epochs,
            seed,
            print_every: 10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if self.print_every == 0 {
            return Err(EngineError::InvalidConfig(
                "print_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(0.05, 100, 1337)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_and_validation() {
        let config = MlpConfig::default();
        assert_eq!(config.sizes(), vec![3, 4, 4, 1]);
        assert!(config.validate().is_ok());

        let bad = MlpConfig::new(2, vec![0], 1);
        assert!(matches!(bad.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_training_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());
        assert!(TrainingConfig::new(0.0, 10, 1).validate().is_err());
        assert!(TrainingConfig::new(f64::NAN, 10, 1).validate().is_err());

        let mut config = TrainingConfig::default();
        config.print_every = 0;
        assert!(config.validate().is_err());
    }
}
