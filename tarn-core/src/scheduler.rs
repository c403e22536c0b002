//! Coalescing per-position delayed-callback scheduler.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tarn_utils::BlockPos;

/// A pending delayed callback.
#[derive(Debug, Clone)]
struct ScheduledUpdate {
    pos: BlockPos,
    /// Absolute time when this should fire.
    trigger_at_ms: u64,
    /// Registration order, used for FIFO tie-breaking and to detect
    /// superseded entries.
    sequence: u64,
}

impl PartialEq for ScheduledUpdate {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for ScheduledUpdate {}

impl Ord for ScheduledUpdate {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest trigger pops
        // first, FIFO within the same trigger time.
        other
            .trigger_at_ms
            .cmp(&self.trigger_at_ms)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for ScheduledUpdate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The liquid update scheduler.
///
/// Registrations coalesce per position: scheduling a position that already
/// has a pending callback replaces the pending one. This is required, not an
/// optimization - every mutation re-arms its neighborhood, and without
/// coalescing a settling pool would register a storm of duplicate callbacks.
///
/// Superseded heap entries are invalidated lazily: the position map records
/// the live sequence number and stale entries are skipped on pop.
#[derive(Default)]
pub struct LiquidScheduler {
    pending: BinaryHeap<ScheduledUpdate>,
    armed: FxHashMap<BlockPos, u64>,
    next_sequence: u64,
}

impl LiquidScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a delayed callback for a position, replacing any pending
    /// callback for that exact position.
    pub fn schedule(&mut self, pos: BlockPos, now_ms: u64, delay_ms: u32) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let trigger_at_ms = now_ms + u64::from(delay_ms);
        self.armed.insert(pos, sequence);
        self.pending.push(ScheduledUpdate {
            pos,
            trigger_at_ms,
            sequence,
        });

        log::trace!("scheduled liquid update at {pos:?} for t={trigger_at_ms}ms");
    }

    /// Removes and returns all positions due at or before `now_ms`, earliest
    /// first.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<BlockPos> {
        let mut due = Vec::new();

        while let Some(update) = self.pending.peek() {
            if update.trigger_at_ms > now_ms {
                break;
            }
            let update = match self.pending.pop() {
                Some(update) => update,
                None => break,
            };
            // Skip entries replaced by a later registration.
            if self.armed.get(&update.pos) != Some(&update.sequence) {
                continue;
            }
            self.armed.remove(&update.pos);
            due.push(update.pos);
        }

        due
    }

    /// True if a callback is pending for the position.
    #[must_use]
    pub fn is_scheduled(&self, pos: BlockPos) -> bool {
        self.armed.contains_key(&pos)
    }

    /// Number of positions with a pending callback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.armed.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Drops all pending callbacks (used when unloading a region).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.armed.clear();
    }
}
