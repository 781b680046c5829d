//! Per-render timing and cache metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ssr_core::{RenderPhase, RequestId, TimingContext};

/// Metrics for a single render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMetrics {
    /// Request ID for correlation.
    pub request_id: String,
    /// Matched route template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Normalized request path.
    pub path: String,
    /// How the render ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Time from start to each reached phase (microseconds).
    pub phases: BTreeMap<String, u64>,
    /// Total duration (microseconds).
    pub total_duration_us: u64,
    /// Cache hits.
    pub cache_hits: usize,
    /// Cache misses.
    pub cache_misses: usize,
    /// Contributions skipped for lack of a key.
    pub cache_bypassed: usize,
    /// Size of the composed document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_bytes: Option<usize>,
}

impl RenderMetrics {
    /// Snapshot the phases reached so far.
    pub fn from_timing(request_id: &RequestId, path: impl Into<String>, timing: &TimingContext) -> Self {
        let phases = RenderPhase::ALL
            .iter()
            .filter_map(|phase| {
                timing
                    .time_to(*phase)
                    .map(|d| (phase.name().to_string(), d.as_micros() as u64))
            })
            .collect();

        Self {
            request_id: request_id.to_string(),
            path: path.into(),
            phases,
            total_duration_us: timing.elapsed().as_micros() as u64,
            ..Default::default()
        }
    }

    /// Set the matched route.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set the outcome label.
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    /// Set cache counts.
    pub fn with_cache_counts(mut self, hits: usize, misses: usize, bypassed: usize) -> Self {
        self.cache_hits = hits;
        self.cache_misses = misses;
        self.cache_bypassed = bypassed;
        self
    }

    /// Set the document size.
    pub fn with_document_bytes(mut self, bytes: usize) -> Self {
        self.document_bytes = Some(bytes);
        self
    }

    /// Time to a phase, if reached.
    pub fn phase_us(&self, phase: RenderPhase) -> Option<u64> {
        self.phases.get(phase.name()).copied()
    }

    /// Emit the metrics as a structured `info` event.
    pub fn log(&self) {
        tracing::info!(
            request_id = %self.request_id,
            route = self.route.as_deref().unwrap_or("-"),
            path = %self.path,
            outcome = self.outcome.as_deref().unwrap_or("-"),
            total_us = self.total_duration_us,
            cache_hits = self.cache_hits,
            cache_misses = self.cache_misses,
            cache_bypassed = self.cache_bypassed,
            document_bytes = self.document_bytes,
            "render finished"
        );
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Render: {} {}", self.request_id, self.path));
        if let Some(route) = &self.route {
            lines.push(format!("  Route: {}", route));
        }
        if let Some(outcome) = &self.outcome {
            lines.push(format!("  Outcome: {}", outcome));
        }

        for phase in RenderPhase::ALL {
            if let Some(us) = self.phase_us(phase) {
                lines.push(format!("  {}: {}us ({:.2}ms)", phase, us, us as f64 / 1000.0));
            }
        }

        lines.push(format!(
            "  Cache: {} hit / {} miss / {} bypass",
            self.cache_hits, self.cache_misses, self.cache_bypassed
        ));
        lines.push(format!(
            "  Total: {}us ({:.2}ms)",
            self.total_duration_us,
            self.total_duration_us as f64 / 1000.0
        ));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reached_phases_recorded() {
        let mut timing = TimingContext::new();
        timing.mark(RenderPhase::Start);
        timing.mark(RenderPhase::Matched);

        let metrics = RenderMetrics::from_timing(&RequestId::from_string("r1"), "/a", &timing);

        assert!(metrics.phase_us(RenderPhase::Matched).is_some());
        assert!(metrics.phase_us(RenderPhase::Rendered).is_none());
        assert_eq!(metrics.phases.len(), 2);
        assert_eq!(metrics.request_id, "r1");
    }

    #[test]
    fn test_summary_and_json() {
        let metrics = RenderMetrics::from_timing(&RequestId::from_string("r2"), "/g/1", &TimingContext::new())
            .with_route("/g/:id")
            .with_outcome("rendered")
            .with_cache_counts(1, 2, 0)
            .with_document_bytes(512);

        let summary = metrics.to_summary();
        assert!(summary.contains("Route: /g/:id"));
        assert!(summary.contains("1 hit / 2 miss / 0 bypass"));

        let json: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(json["cache_misses"], 2);
        assert_eq!(json["document_bytes"], 512);
    }
}
