//! Confidence-gated jump rejection.

use super::position::NormalizedPosition;

/// Tunables of the [`ValidityGate`].
///
/// `trust_level` lets a sustained detection streak follow a fast legitimate
/// move: above it, any jump is accepted regardless of distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatePolicy {
    /// Jumps strictly shorter than this (normalized units) are always accepted.
    pub max_jump: f32,
    /// Confidence strictly above this bypasses the jump check.
    pub trust_level: u32,
    /// Upper bound of the confidence counter.
    pub max_confidence: u32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_jump: 0.2,
            trust_level: 3,
            max_confidence: 10,
        }
    }
}

/// Outcome of offering a candidate to the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateVerdict {
    /// Candidate became the last accepted position.
    Accepted { jump: f32 },
    /// Candidate discarded; gate state unchanged.
    Rejected { jump: f32 },
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted { .. })
    }

    /// Distance from the previously accepted position.
    pub fn jump(&self) -> f32 {
        match *self {
            GateVerdict::Accepted { jump } | GateVerdict::Rejected { jump } => jump,
        }
    }
}

/// Debounces teleporting false detections.
#[derive(Debug, Clone)]
pub struct ValidityGate {
    policy: GatePolicy,
    confidence: u32,
    last_accepted: NormalizedPosition,
}

impl ValidityGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self::with_state(policy, 0, NormalizedPosition::CENTER)
    }

    /// Start from a given confidence (capped) and last accepted position.
    pub fn with_state(policy: GatePolicy, confidence: u32, last_accepted: NormalizedPosition) -> Self {
        Self {
            confidence: confidence.min(policy.max_confidence),
            policy,
            last_accepted,
        }
    }

    /// Offer this tick's candidate.
    pub fn observe(&mut self, candidate: NormalizedPosition) -> GateVerdict {
        let jump = candidate.distance(&self.last_accepted);
        if jump < self.policy.max_jump || self.confidence > self.policy.trust_level {
            self.confidence = (self.confidence + 1).min(self.policy.max_confidence);
            self.last_accepted = candidate;
            GateVerdict::Accepted { jump }
        } else {
            GateVerdict::Rejected { jump }
        }
    }

    /// Record a tick without any candidate.
    pub fn miss(&mut self) {
        self.confidence = self.confidence.saturating_sub(1);
    }

    pub fn confidence(&self) -> u32 {
        self.confidence
    }

    pub fn last_accepted(&self) -> NormalizedPosition {
        self.last_accepted
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }
}

impl Default for ValidityGate {
    fn default() -> Self {
        Self::new(GatePolicy::default())
    }
}
