//! Explicit pass/fail counters.
//!
//! The Fortran library keeps these as module variables; here they are a value the caller owns, so two sessions
//! can never leak counts into each other.

/// Outcome of a single assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
}

/// Running pass/fail counts for one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    passed: u64,
    failed: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset both counts to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn passed(&self) -> u64 {
        self.passed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_reset() {
        let mut c = Counters::new();
        c.record(Outcome::Passed);
        c.record(Outcome::Failed);
        c.record(Outcome::Passed);
        assert_eq!((c.passed(), c.failed(), c.total()), (2, 1, 3));
        c.reset();
        assert_eq!(c, Counters::default());
    }
}
