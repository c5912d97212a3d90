//! Session context and running statistics.

use crate::text::truncate_chars;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

/// Context entries kept per session; the oldest is evicted first.
pub const CONTEXT_CAPACITY: usize = 10;

/// Entries returned by [`SessionTracker::recent_context`].
pub const RECENT_CONTEXT_LIMIT: usize = 5;

/// Characters of source text kept per context entry.
pub const SNAPSHOT_CHARS: usize = 200;

/// Confidence above which a detection counts as successful.
pub const SUCCESS_CONFIDENCE: f64 = 0.7;

/// One successful detection remembered for context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    pub text_snapshot: String,
    pub question_count: usize,
    pub timestamp_ms: i64,
    pub types: BTreeSet<String>,
}

/// Running statistics for a session.
///
/// `average_confidence` and `processing_time_ms` are running averages
/// updated as `(old + new) / 2`, except that the first recorded detection
/// seeds them with its own values rather than halving against zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_questions: u64,
    pub successful_detections: u64,
    pub classification_accuracy: f64,
    pub average_confidence: f64,
    pub processing_time_ms: f64,
}

/// One reported item of a detection batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<'a> {
    pub label: &'a str,
    pub confidence: f64,
}

/// Mutable per-session state behind the detector.
#[derive(Debug, Default)]
pub struct SessionTracker {
    context: VecDeque<ContextEntry>,
    stats: Stats,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful detection batch.
    ///
    /// Averages after the first update are `(old + new) / 2`, so recent
    /// batches weigh more than older ones.
    pub fn record(
        &mut self,
        source_text: &str,
        batch: &[Observation<'_>],
        processing_time_ms: u64,
        timestamp: DateTime<Utc>,
    ) {
        if batch.is_empty() {
            return;
        }

        let first_update = self.stats.total_questions == 0;
        let batch_average =
            batch.iter().map(|o| o.confidence).sum::<f64>() / batch.len() as f64;
        let elapsed = processing_time_ms as f64;

        let stats = &mut self.stats;
        stats.total_questions += batch.len() as u64;
        stats.successful_detections += batch
            .iter()
            .filter(|o| o.confidence > SUCCESS_CONFIDENCE)
            .count() as u64;

        if first_update {
            stats.average_confidence = batch_average;
            stats.processing_time_ms = elapsed;
        } else {
            stats.average_confidence = (stats.average_confidence + batch_average) / 2.0;
            stats.processing_time_ms = (stats.processing_time_ms + elapsed) / 2.0;
        }

        stats.classification_accuracy =
            stats.successful_detections as f64 / stats.total_questions as f64;

        self.context.push_front(ContextEntry {
            text_snapshot: truncate_chars(source_text, SNAPSHOT_CHARS),
            question_count: batch.len(),
            timestamp_ms: timestamp.timestamp_millis(),
            types: batch.iter().map(|o| o.label.to_string()).collect(),
        });
        self.context.truncate(CONTEXT_CAPACITY);
    }

    pub fn stats(&self) -> Stats {
        self.stats.clone()
    }

    /// Most recent entries first, at most [`RECENT_CONTEXT_LIMIT`].
    pub fn recent_context(&self) -> Vec<ContextEntry> {
        self.context
            .iter()
            .take(RECENT_CONTEXT_LIMIT)
            .cloned()
            .collect()
    }

    pub fn context_len(&self) -> usize {
        self.context.len()
    }

    /// Zero the statistics. Context is kept.
    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    pub fn clear_context(&mut self) {
        self.context.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(label: &str, confidence: f64) -> Observation<'_> {
        Observation { label, confidence }
    }

    #[test]
    fn test_first_update_sets_averages() {
        let mut tracker = SessionTracker::new();
        tracker.record("text", &[obs("technical", 0.9), obs("general", 0.5)], 12, Utc::now());

        let stats = tracker.stats();
        assert_eq!(stats.total_questions, 2);
        assert_eq!(stats.successful_detections, 1);
        assert!((stats.average_confidence - 0.7).abs() < 1e-9);
        assert_eq!(stats.processing_time_ms, 12.0);
        assert!((stats.classification_accuracy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_later_updates_halve() {
        let mut tracker = SessionTracker::new();
        tracker.record("a", &[obs("technical", 0.8)], 10, Utc::now());
        tracker.record("b", &[obs("technical", 0.6)], 30, Utc::now());
        tracker.record("c", &[obs("personal", 1.0)], 20, Utc::now());

        let stats = tracker.stats();
        assert_eq!(stats.total_questions, 3);
        // ((0.8 + 0.6) / 2 + 1.0) / 2
        assert!((stats.average_confidence - 0.85).abs() < 1e-9);
        assert_eq!(stats.processing_time_ms, 20.0);
        assert!(stats.classification_accuracy <= 1.0);
    }

    #[test]
    fn test_empty_batch_is_ignored() {
        let mut tracker = SessionTracker::new();
        tracker.record("a", &[], 10, Utc::now());
        assert_eq!(tracker.stats(), Stats::default());
        assert_eq!(tracker.context_len(), 0);
    }

    #[test]
    fn test_context_capacity_and_order() {
        let mut tracker = SessionTracker::new();
        for i in 0..12 {
            tracker.record(&format!("text {}", i), &[obs("general", 0.6)], 1, Utc::now());
        }

        assert_eq!(tracker.context_len(), CONTEXT_CAPACITY);
        let recent = tracker.recent_context();
        assert_eq!(recent.len(), RECENT_CONTEXT_LIMIT);
        assert_eq!(recent[0].text_snapshot, "text 11");
        assert_eq!(recent[4].text_snapshot, "text 7");
    }

    #[test]
    fn test_snapshot_is_truncated() {
        let mut tracker = SessionTracker::new();
        tracker.record(&"x".repeat(500), &[obs("general", 0.6), obs("company", 0.9)], 1, Utc::now());

        let entry = &tracker.recent_context()[0];
        assert_eq!(entry.text_snapshot.chars().count(), SNAPSHOT_CHARS);
        assert_eq!(entry.question_count, 2);
        assert_eq!(
            entry.types.iter().cloned().collect::<Vec<_>>(),
            vec!["company".to_string(), "general".to_string()]
        );
    }

    #[test]
    fn test_reset_stats_keeps_context() {
        let mut tracker = SessionTracker::new();
        tracker.record("a", &[obs("technical", 0.8)], 10, Utc::now());
        tracker.reset_stats();

        assert_eq!(tracker.stats(), Stats::default());
        assert_eq!(tracker.context_len(), 1);

        tracker.record("b", &[obs("technical", 0.6)], 4, Utc::now());
        assert!((tracker.stats().average_confidence - 0.6).abs() < 1e-9);
    }
}
