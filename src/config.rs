use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::damping::DampingSpec;
use crate::prelude::*;
use crate::solver::modal::check_frequencies;
use crate::solver::FrequencyUnit;

//------------------------------------------------------------------------------
// Time integration
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    pub time_step: f64, // nominal time step (sec)
    pub end_time: f64,  // end time (sec)
    #[serde(default)]
    pub record_velocity: bool,
}

impl StepConfig {
    pub fn new(time_step: f64, end_time: f64) -> Self {
        StepConfig {
            time_step,
            end_time,
            record_velocity: false,
        }
    }

    pub fn with_velocity(mut self) -> Self {
        self.record_velocity = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.) || !self.time_step.is_finite() {
            return Err(Error::invalid(
                "time_step",
                format!("must be positive and finite, got {}", self.time_step),
            ));
        }
        if !(self.end_time > 0.) || !self.end_time.is_finite() {
            return Err(Error::invalid(
                "end_time",
                format!("must be positive and finite, got {}", self.end_time),
            ));
        }
        Ok(())
    }

    /// Number of steps needed to reach the end time, counting a truncated final step.
    ///
    /// `end_time / time_step` is only rounded down when it is an integer up to
    /// float noise, so the final step never exceeds the nominal step.
    pub fn num_steps(&self) -> usize {
        let n = self.end_time / self.time_step;
        let n_round = n.round();
        let num_steps = if (n - n_round).abs() <= STEP_SNAP_TOL * n.max(1.) {
            n_round as usize
        } else {
            n.ceil() as usize
        };
        num_steps.max(1)
    }
}

/// Relative float noise allowed per step when snapping onto the end time
pub(crate) const STEP_SNAP_TOL: f64 = 64. * f64::EPSILON;

//------------------------------------------------------------------------------
// Frequency sweep
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub frequencies: Vec<f64>,
    #[serde(default)]
    pub unit: FrequencyUnit,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Size of a dedicated thread pool, the global rayon pool is used when absent or zero
    #[serde(default)]
    pub num_threads: Option<usize>,
}

fn default_parallel() -> bool {
    true
}

impl SweepConfig {
    pub fn new(frequencies: Vec<f64>, unit: FrequencyUnit) -> Self {
        SweepConfig {
            frequencies,
            unit,
            parallel: true,
            num_threads: None,
        }
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.frequencies.is_empty() {
            return Err(Error::EmptyFrequencyList);
        }
        check_frequencies(&self.frequencies)
    }

    /// Requested frequencies converted to angular frequency (rad/s)
    pub fn angular_frequencies(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .map(|&f| self.unit.to_angular(f))
            .collect_vec()
    }
}

//------------------------------------------------------------------------------
// Analysis
//------------------------------------------------------------------------------

/// Complete analysis settings as read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub damping: DampingSpec,
    pub step: Option<StepConfig>,
    pub sweep: Option<SweepConfig>,
}

impl AnalysisConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> Result<()> {
        self.damping.coefficients()?;
        if let Some(step) = &self.step {
            step.validate()?;
        }
        if let Some(sweep) = &self.sweep {
            sweep.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_num_steps() {
        assert_eq!(StepConfig::new(0.1, 1.0).num_steps(), 10);
        assert_eq!(StepConfig::new(0.3, 1.0).num_steps(), 4);
        assert_eq!(StepConfig::new(0.25, 1.0).num_steps(), 4);
        assert_eq!(StepConfig::new(2.0, 1.0).num_steps(), 1);

        // A remainder well above float noise always adds a step
        assert_eq!(StepConfig::new(1e-5, 1.0).num_steps(), 100_000);
        assert_eq!(StepConfig::new(1e-5, 1.0 + 5e-10).num_steps(), 100_001);
        assert_eq!(StepConfig::new(0.1, 1.0 + 1e-12).num_steps(), 11);
    }

    #[test]
    fn test_step_validation() {
        assert!(StepConfig::new(0.1, 1.0).validate().is_ok());
        assert!(StepConfig::new(0.0, 1.0).validate().is_err());
        assert!(StepConfig::new(-0.1, 1.0).validate().is_err());
        assert!(StepConfig::new(0.1, 0.0).validate().is_err());
        assert!(StepConfig::new(f64::NAN, 1.0).validate().is_err());
    }

    #[test]
    fn test_sweep_validation() {
        let sweep = SweepConfig::new(vec![], FrequencyUnit::Hertz);
        assert!(matches!(sweep.validate(), Err(Error::EmptyFrequencyList)));

        let sweep = SweepConfig::new(vec![1., f64::INFINITY], FrequencyUnit::Hertz);
        assert!(sweep.validate().is_err());
    }

    #[test]
    fn test_analysis_from_json() {
        let config = AnalysisConfig::from_json_str(
            r#"{
                "damping": {"type": "rayleigh", "alpha": 0.1, "beta": 0.001},
                "step": {"time_step": 0.01, "end_time": 2.0},
                "sweep": {"frequencies": [1.0, 2.0], "unit": "hertz"}
            }"#,
        )
        .unwrap();

        let step = config.step.unwrap();
        assert_eq!(step.num_steps(), 200);
        assert!(!step.record_velocity);

        let sweep = config.sweep.unwrap();
        assert!(sweep.parallel);
        assert_eq!(sweep.num_threads, None);
        let w = sweep.angular_frequencies();
        assert_relative_eq!(w[1], 4. * PI);
    }

    #[test]
    fn test_analysis_rejects_bad_step() {
        let res = AnalysisConfig::from_json_str(r#"{"step": {"time_step": -1.0, "end_time": 2.0}}"#);
        assert!(matches!(res, Err(Error::InvalidParameter { name: "time_step", .. })));

        let res = AnalysisConfig::from_json_str(r#"{"step": {"time_step": 1.0}}"#);
        assert!(matches!(res, Err(Error::Json { .. })));
    }
}
