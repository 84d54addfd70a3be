//! Weighted aggregate progress across concurrent operations.
//!
//! Each operation (query resolution phase, every download) registers a
//! weighted input and reports fractions into it; the aggregate is
//! Σ(weightᵢ × fractionᵢ) / Σ(weightᵢ). When every current input has
//! completed, the baseline resets so a fresh batch starts from zero instead
//! of being diluted by stale completed inputs. Observers read the aggregate
//! through a `watch` channel snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

struct Slot {
    weight: f64,
    fraction: f64,
    completed: bool,
}

#[derive(Default)]
struct State {
    next_id: u64,
    slots: HashMap<u64, Slot>,
}

impl State {
    fn aggregate(&self) -> f64 {
        let total_weight: f64 = self.slots.values().map(|s| s.weight).sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = self.slots.values().map(|s| s.weight * s.fraction).sum();
        (weighted / total_weight).clamp(0.0, 1.0)
    }
}

/// Aggregates weighted progress inputs into one overall fraction.
pub struct ProgressAggregator {
    state: Arc<Mutex<State>>,
    tx: Arc<watch::Sender<f64>>,
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressAggregator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0.0);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            tx: Arc::new(tx),
        }
    }

    /// Registers a new input with the given weight (clamped to be positive).
    pub fn input(&self, weight: f64) -> ProgressInput {
        let weight = if weight > 0.0 { weight } else { 1.0 };
        let id = {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id;
            state.next_id += 1;
            state.slots.insert(
                id,
                Slot {
                    weight,
                    fraction: 0.0,
                    completed: false,
                },
            );
            id
        };
        self.publish();
        ProgressInput {
            state: Arc::clone(&self.state),
            tx: Arc::clone(&self.tx),
            id,
        }
    }

    /// Current overall fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        self.state.lock().unwrap().aggregate()
    }

    /// Snapshot channel for observers; yields the aggregate after every mutation.
    pub fn watch(&self) -> watch::Receiver<f64> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        let fraction = self.fraction();
        let _ = self.tx.send(fraction);
    }
}

/// Handle for reporting one operation's progress into the aggregator.
///
/// Reports after the aggregator has auto-reset are ignored (the slot is gone).
pub struct ProgressInput {
    state: Arc<Mutex<State>>,
    tx: Arc<watch::Sender<f64>>,
    id: u64,
}

impl ProgressInput {
    pub fn report(&self, fraction: f64) {
        let aggregate = {
            let mut state = self.state.lock().unwrap();
            if let Some(slot) = state.slots.get_mut(&self.id) {
                slot.fraction = fraction.clamp(0.0, 1.0);
            }
            state.aggregate()
        };
        let _ = self.tx.send(aggregate);
    }

    /// Marks this input complete. When all current inputs are complete the
    /// aggregate publishes 1.0 and the input set resets to a clean baseline.
    pub fn complete(&self) {
        let aggregate = {
            let mut state = self.state.lock().unwrap();
            if let Some(slot) = state.slots.get_mut(&self.id) {
                slot.fraction = 1.0;
                slot.completed = true;
            }
            if !state.slots.is_empty() && state.slots.values().all(|s| s.completed) {
                state.slots.clear();
                1.0
            } else {
                state.aggregate()
            }
        };
        let _ = self.tx.send(aggregate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_is_weighted_mean() {
        let agg = ProgressAggregator::new();
        let a = agg.input(1.0);
        let b = agg.input(3.0);

        a.report(1.0);
        b.report(0.5);
        let expected = (1.0 * 1.0 + 3.0 * 0.5) / 4.0;
        assert!((agg.fraction() - expected).abs() < 1e-9);
    }

    #[test]
    fn fractions_are_clamped() {
        let agg = ProgressAggregator::new();
        let a = agg.input(1.0);
        a.report(7.5);
        assert!((agg.fraction() - 1.0).abs() < 1e-9);
        a.report(-2.0);
        assert!(agg.fraction().abs() < 1e-9);
    }

    #[test]
    fn completing_all_inputs_resets_the_baseline() {
        let agg = ProgressAggregator::new();
        let a = agg.input(1.0);
        let b = agg.input(1.0);
        a.complete();
        assert!((agg.fraction() - 0.5).abs() < 1e-9);
        b.complete();

        // Fresh batch is not diluted by the completed inputs.
        let c = agg.input(1.0);
        c.report(0.25);
        assert!((agg.fraction() - 0.25).abs() < 1e-9);

        // Stale handle reports are ignored after the reset.
        a.report(0.0);
        assert!((agg.fraction() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn watch_observes_updates() {
        let agg = ProgressAggregator::new();
        let rx = agg.watch();
        let a = agg.input(1.0);
        a.report(0.5);
        assert!((*rx.borrow() - 0.5).abs() < 1e-9);
    }
}
