//! Attempt counters of an attack simulation and the rates derived from them.

use pipewarden_entities::simulation_results;
use serde::{Deserialize, Serialize};

use crate::services::SecurityError;

/// Outcome of every attempt in a simulation run.
///
/// Each attempt ends in at most one of detected, blocked or successful, so
/// the three never add up to more than `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationCounters {
    pub total: i32,
    pub detected: i32,
    pub blocked: i32,
    pub successful: i32,
}

impl SimulationCounters {
    pub fn new(total: i32, detected: i32, blocked: i32, successful: i32) -> Self {
        Self {
            total,
            detected,
            blocked,
            successful,
        }
    }

    pub fn from_model(model: &simulation_results::Model) -> Self {
        Self::new(
            model.attempts_total,
            model.attempts_detected,
            model.attempts_blocked,
            model.attempts_successful,
        )
    }

    fn rate(&self, part: i32) -> Option<f64> {
        (self.total > 0).then(|| part as f64 / self.total as f64)
    }

    pub fn detection_rate(&self) -> Option<f64> {
        self.rate(self.detected)
    }

    pub fn block_rate(&self) -> Option<f64> {
        self.rate(self.blocked)
    }

    pub fn success_rate(&self) -> Option<f64> {
        self.rate(self.successful)
    }

    pub fn validate(&self) -> Result<(), SecurityError> {
        if self.total < 0 || self.detected < 0 || self.blocked < 0 || self.successful < 0 {
            return Err(SecurityError::Validation(
                "attempt counters must not be negative".to_string(),
            ));
        }

        // i64 so that three large counters cannot overflow
        let accounted = self.detected as i64 + self.blocked as i64 + self.successful as i64;
        if accounted > self.total as i64 {
            return Err(SecurityError::Validation(format!(
                "detected + blocked + successful ({}) exceeds total attempts ({})",
                accounted, self.total
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let counters = SimulationCounters::new(10, 5, 3, 2);
        assert_eq!(counters.detection_rate(), Some(0.5));
        assert_eq!(counters.block_rate(), Some(0.3));
        assert_eq!(counters.success_rate(), Some(0.2));
    }

    #[test]
    fn test_rates_undefined_without_attempts() {
        let counters = SimulationCounters::default();
        assert_eq!(counters.detection_rate(), None);
        assert_eq!(counters.block_rate(), None);
        assert_eq!(counters.success_rate(), None);
        assert!(counters.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(SimulationCounters::new(10, 5, 3, 2).validate().is_ok());
        assert!(SimulationCounters::new(10, 5, 4, 2).validate().is_err());
        assert!(SimulationCounters::new(10, -1, 0, 0).validate().is_err());
        assert!(SimulationCounters::new(-1, 0, 0, 0).validate().is_err());
        assert!(SimulationCounters::new(i32::MAX, i32::MAX, i32::MAX, 0)
            .validate()
            .is_err());
    }
}
