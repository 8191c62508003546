//! Batch plumbing shared by the workers: progress, cancellation and the result sink

use crate::path::PropagationPath;
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Progress and cancellation flag of one batch.
///
/// Shared by reference between the caller and every worker.
#[derive(Debug, Default)]
pub struct ProgressToken {
    total: AtomicUsize,
    processed: AtomicUsize,
    cancelled: AtomicBool,
}

impl ProgressToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the workers to stop after their current receiver
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn start(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
    }

    pub(crate) fn step(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Receivers done so far
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// Receivers in the batch
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in [0, 1]; an empty batch is complete
    pub fn fraction(&self) -> f64 {
        match self.total() {
            0 => 1.0,
            total => (self.processed() as f64 / total as f64).min(1.0),
        }
    }
}

/// Paths found for one source-receiver pair, in production order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    pub source_id: usize,
    pub receiver_id: usize,
    pub paths: Vec<PropagationPath>,
}

/// Unbounded channel end the workers push their results into.
///
/// Pushing never blocks. Results pushed after the receiving end was dropped are discarded.
#[derive(Debug, Clone)]
pub struct PathSink {
    sender: Sender<PairResult>,
}

impl PathSink {
    /// New sink and the receiving end of its channel
    pub fn unbounded() -> (Self, Receiver<PairResult>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (PathSink { sender }, receiver)
    }

    /// Returns `false` when nobody listens anymore
    pub fn push(&self, result: PairResult) -> bool {
        self.sender.send(result).is_ok()
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Receivers fully processed
    pub receivers: usize,
    /// Source-receiver pairs within range that were computed
    pub pairs: usize,
    /// Pairs whose computation failed
    pub failed_pairs: usize,
    /// Paths pushed into the sink
    pub paths: usize,
    /// Whether the batch stopped on the token
    pub cancelled: bool,
}

impl BatchReport {
    pub(crate) fn merge(mut self, other: BatchReport) -> BatchReport {
        self.receivers += other.receivers;
        self.pairs += other.pairs;
        self.failed_pairs += other.failed_pairs;
        self.paths += other.paths;
        self.cancelled |= other.cancelled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let token = ProgressToken::new();
        assert_eq!(token.fraction(), 1.0);
        token.start(4);
        token.step();
        assert_eq!(token.processed(), 1);
        assert_eq!(token.fraction(), 0.25);
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_sink_after_receiver_dropped() {
        let (sink, receiver) = PathSink::unbounded();
        let result = PairResult { source_id: 1, receiver_id: 2, paths: Vec::new() };
        assert!(sink.push(result.clone()));
        assert_eq!(receiver.try_recv().ok(), Some(result.clone()));
        drop(receiver);
        assert!(!sink.push(result));
    }

    #[test]
    fn test_report_merge() {
        let a = BatchReport { receivers: 1, pairs: 3, failed_pairs: 1, paths: 5, cancelled: false };
        let b = BatchReport { receivers: 2, pairs: 1, failed_pairs: 0, paths: 2, cancelled: true };
        let merged = a.merge(b);
        assert_eq!(merged, BatchReport { receivers: 3, pairs: 4, failed_pairs: 1, paths: 7, cancelled: true });
    }
}
