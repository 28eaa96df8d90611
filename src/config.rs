use serde::{Deserialize, Serialize};

/// Exponents of the 2D correlation scaling `S * var^(-alpha) * |S / std|^beta`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        ScalingConfig {
            alpha: 0.8,
            beta: 0.0,
        }
    }
}

/// Settings of the 2D correlation engine.
///
/// Centering and scaling are independent: scaling data that was not mean-centered
/// is allowed (the engine only warns about it).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Corr2dConfig {
    /// Subtract the per-row mean instead of the reference spectrum.
    pub centered: bool,
    pub scaling: Option<ScalingConfig>,
}

impl Corr2dConfig {
    pub fn centered() -> Self {
        Corr2dConfig {
            centered: true,
            scaling: None,
        }
    }

    pub fn with_scaling(mut self, alpha: f64, beta: f64) -> Self {
        self.scaling = Some(ScalingConfig { alpha, beta });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Corr2dConfig::default();
        assert!(!config.centered);
        assert_eq!(config.scaling, None);
        assert_eq!(
            ScalingConfig::default(),
            ScalingConfig {
                alpha: 0.8,
                beta: 0.0
            }
        );
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: Corr2dConfig =
            serde_json::from_str(r#"{ "centered": true, "scaling": { "beta": 1.5 } }"#).unwrap();
        assert!(config.centered);
        assert_eq!(
            config.scaling,
            Some(ScalingConfig {
                alpha: 0.8,
                beta: 1.5
            })
        );

        let empty: Corr2dConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Corr2dConfig::default());
    }

    #[test]
    fn test_builder() {
        let config = Corr2dConfig::centered().with_scaling(0.5, 0.0);
        assert!(config.centered);
        assert_eq!(config.scaling.map(|s| s.alpha), Some(0.5));
    }
}
