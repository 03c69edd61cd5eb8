// src/queue/gate.rs - Operator enablement and readiness flags

/// `enabled` lets the queue accept mutating requests; `ready` lets the
/// scheduler hand jobs to the plotter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessGate {
    enabled: bool,
    ready: bool,
}

impl ReadinessGate {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, ready: false }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::info!(enabled, "Remote print queue enablement changed");
        }
        self.enabled = enabled;
    }

    pub fn set_ready(&mut self, ready: bool) {
        if self.ready != ready {
            tracing::info!(ready, "Remote print readiness changed");
        }
        self.ready = ready;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(true)
    }
}
