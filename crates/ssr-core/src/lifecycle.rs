//! Render lifecycle tracking.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Phases of a single prerender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// Request received.
    Start,
    /// Route matched and context built.
    Matched,
    /// Extra-parameter providers ran.
    ParamsResolved,
    /// Cache contributions resolved and hydrated.
    CacheResolved,
    /// Route preload hook ran.
    Preloaded,
    /// Markup rendered.
    Rendered,
    /// Final document composed.
    Composed,
}

impl RenderPhase {
    /// Every phase in lifecycle order.
    pub const ALL: [RenderPhase; 7] = [
        Self::Start,
        Self::Matched,
        Self::ParamsResolved,
        Self::CacheResolved,
        Self::Preloaded,
        Self::Rendered,
        Self::Composed,
    ];

    /// Stable name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Matched => "matched",
            Self::ParamsResolved => "params_resolved",
            Self::CacheResolved => "cache_resolved",
            Self::Preloaded => "preloaded",
            Self::Rendered => "rendered",
            Self::Composed => "composed",
        }
    }
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<RenderPhase, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record that a phase completed now.
    pub fn mark(&mut self, phase: RenderPhase) {
        self.marks.insert(phase, Instant::now());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start until the phase was marked.
    pub fn time_to(&self, phase: RenderPhase) -> Option<Duration> {
        self.marks.get(&phase).map(|t| t.duration_since(self.start))
    }

    /// Time spent between two marked phases.
    pub fn between(&self, from: RenderPhase, to: RenderPhase) -> Option<Duration> {
        let from = self.marks.get(&from)?;
        let to = self.marks.get(&to)?;
        Some(to.saturating_duration_since(*from))
    }

    /// Whether the phase has been reached.
    pub fn reached(&self, phase: RenderPhase) -> bool {
        self.marks.contains_key(&phase)
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_recorded() {
        let mut timing = TimingContext::new();
        assert!(!timing.reached(RenderPhase::Matched));

        timing.mark(RenderPhase::Matched);
        timing.mark(RenderPhase::Rendered);

        assert!(timing.reached(RenderPhase::Matched));
        assert!(timing.time_to(RenderPhase::Matched).is_some());
        assert!(timing.between(RenderPhase::Matched, RenderPhase::Rendered).is_some());
        assert!(timing.between(RenderPhase::Matched, RenderPhase::Composed).is_none());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(RenderPhase::CacheResolved.to_string(), "cache_resolved");
    }
}
