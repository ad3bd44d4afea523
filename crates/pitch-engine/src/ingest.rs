//! Input ingestion and ordering.
//!
//! The [`InputQueue`] is the only way inputs reach the physics step. Each
//! submitted [`InputRecord`] is:
//!
//! 1. parsed into a typed [`PlayerInput`] (required and forbidden
//!    parameters, finite numbers, fixed ranges),
//! 2. checked against the match (tick before the final whistle, MOVE on the
//!    pitch, PASS to a teammate, TACKLE on an opponent),
//! 3. dropped as late if its tick has already been simulated,
//! 4. otherwise queued under its tick.
//!
//! Rejections never stop the match. They are logged at `warn`, counted in
//! the [`IngestSummary`], and the input is simply never consumed.
//!
//! When the driver asks for a tick's batch, inputs come out ordered by
//! `timestamp`, ties broken by submission order. Timestamps order inputs
//! within a tick; they never move an input to another tick.

use std::collections::BTreeMap;

use pitch_core::config::MatchConfig;
use pitch_core::input::{InputRecord, PlayerInput, Side};
use pitch_core::ValidationError;
use pitch_ledger::result::IngestSummary;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// What happened to one submitted record.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Queued for its tick.
    Accepted,
    /// Failed validation.
    Rejected(ValidationError),
    /// Valid, but its tick has already been simulated.
    Late { tick: u64, current_tick: u64 },
}

impl Admission {
    /// Whether the input was queued.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

// ---------------------------------------------------------------------------
// InputQueue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Queued {
    /// Submission index within the side's stream.
    seq: u64,
    input: PlayerInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SideQueue {
    pending: BTreeMap<u64, Vec<Queued>>,
    next_seq: u64,
}

impl SideQueue {
    fn push(&mut self, input: PlayerInput) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending
            .entry(input.tick)
            .or_default()
            .push(Queued { seq, input });
    }

    fn sorted(batch: &mut [Queued]) {
        batch.sort_by_key(|q| (q.input.timestamp, q.seq));
    }

    fn take(&mut self, tick: u64) -> Vec<PlayerInput> {
        let mut batch = self.pending.remove(&tick).unwrap_or_default();
        Self::sorted(&mut batch);
        batch.into_iter().map(|q| q.input).collect()
    }

    fn peek(&self, tick: u64) -> Vec<PlayerInput> {
        let mut batch = self.pending.get(&tick).cloned().unwrap_or_default();
        Self::sorted(&mut batch);
        batch.into_iter().map(|q| q.input).collect()
    }

    fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }
}

/// Validated inputs waiting for their tick, per side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputQueue {
    config: MatchConfig,
    home: SideQueue,
    away: SideQueue,
    summary: IngestSummary,
}

impl InputQueue {
    /// An empty queue for a match played under `config`.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            home: SideQueue::default(),
            away: SideQueue::default(),
            summary: IngestSummary::default(),
        }
    }

    fn side(&self, side: Side) -> &SideQueue {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideQueue {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    /// Validate one record from `side` and queue it if it is usable.
    /// `current_tick` is the next tick the driver will simulate.
    pub fn submit(&mut self, side: Side, record: &InputRecord, current_tick: u64) -> Admission {
        let checked = record
            .parse()
            .and_then(|input| input.check_context(side, &self.config).map(|()| input));

        let input = match checked {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!(
                    %side,
                    tick = record.tick,
                    action = ?record.action,
                    error = %err,
                    "rejected input"
                );
                self.summary.side_mut(side).rejected += 1;
                return Admission::Rejected(err);
            }
        };

        if input.tick < current_tick {
            tracing::warn!(
                %side,
                tick = input.tick,
                current_tick,
                "dropped late input"
            );
            self.summary.side_mut(side).late += 1;
            return Admission::Late {
                tick: input.tick,
                current_tick,
            };
        }

        self.side_mut(side).push(input);
        self.summary.side_mut(side).accepted += 1;
        Admission::Accepted
    }

    /// Submit records in order. Returns how many were accepted.
    pub fn submit_all(&mut self, side: Side, records: &[InputRecord], current_tick: u64) -> usize {
        records
            .iter()
            .filter(|record| self.submit(side, record, current_tick).is_accepted())
            .count()
    }

    /// Remove and return `side`'s batch for `tick`, in application order.
    /// The returned inputs are counted as consumed.
    pub fn take_batch(&mut self, side: Side, tick: u64) -> Vec<PlayerInput> {
        let batch = self.side_mut(side).take(tick);
        self.summary.side_mut(side).consumed += batch.len() as u64;
        batch
    }

    /// `side`'s batch for `tick` in application order, without removing it.
    pub fn peek_batch(&self, side: Side, tick: u64) -> Vec<PlayerInput> {
        self.side(side).peek(tick)
    }

    /// Number of queued inputs across both sides.
    pub fn pending_len(&self) -> usize {
        self.home.len() + self.away.len()
    }

    /// Running counts.
    pub fn summary(&self) -> &IngestSummary {
        &self.summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_core::input::{Action, ActionKind, InputParams};

    fn sprint(tick: i64, timestamp: u64) -> InputRecord {
        InputRecord {
            tick,
            action: ActionKind::Sprint,
            params: InputParams::default(),
            timestamp,
        }
    }

    fn mv(tick: i64, timestamp: u64, x: f64) -> InputRecord {
        InputRecord {
            tick,
            action: ActionKind::Move,
            params: InputParams {
                x: Some(x),
                y: Some(30.0),
                ..Default::default()
            },
            timestamp,
        }
    }

    #[test]
    fn batches_are_ordered_by_timestamp_then_submission() {
        let mut q = InputQueue::new(MatchConfig::default());
        q.submit(Side::Home, &mv(3, 900, 1.0), 0);
        q.submit(Side::Home, &mv(3, 100, 2.0), 0);
        q.submit(Side::Home, &mv(3, 900, 3.0), 0);

        let xs: Vec<i64> = q
            .take_batch(Side::Home, 3)
            .iter()
            .map(|i| match i.action {
                Action::Move { x, .. } => x.floor_int(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(xs, vec![2, 1, 3]);
        assert_eq!(q.summary().home.consumed, 3);
        assert_eq!(q.pending_len(), 0);
    }

    #[test]
    fn timestamps_never_move_inputs_between_ticks() {
        let mut q = InputQueue::new(MatchConfig::default());
        q.submit(Side::Away, &sprint(7, 1), 0);
        q.submit(Side::Away, &sprint(2, 1_000_000), 0);
        assert_eq!(q.take_batch(Side::Away, 2).len(), 1);
        assert_eq!(q.take_batch(Side::Away, 7).len(), 1);
    }

    #[test]
    fn sides_are_independent() {
        let mut q = InputQueue::new(MatchConfig::default());
        q.submit(Side::Home, &sprint(1, 0), 0);
        assert!(q.take_batch(Side::Away, 1).is_empty());
        assert_eq!(q.take_batch(Side::Home, 1).len(), 1);
    }

    #[test]
    fn invalid_inputs_are_counted_and_skipped() {
        let mut q = InputQueue::new(MatchConfig::default());
        let mut bad = mv(1, 0, 1.0);
        bad.params.power = Some(5.0);
        assert!(matches!(
            q.submit(Side::Home, &bad, 0),
            Admission::Rejected(ValidationError::UnexpectedParam { .. })
        ));
        assert!(matches!(
            q.submit(Side::Home, &sprint(-4, 0), 0),
            Admission::Rejected(ValidationError::NegativeTick { .. })
        ));
        assert!(matches!(
            q.submit(Side::Home, &sprint(900, 0), 0),
            Admission::Rejected(ValidationError::TickBeyondMatch { .. })
        ));
        assert_eq!(q.summary().home.rejected, 3);
        assert_eq!(q.summary().home.accepted, 0);
        assert_eq!(q.pending_len(), 0);
    }

    #[test]
    fn late_inputs_are_dropped() {
        let mut q = InputQueue::new(MatchConfig::default());
        assert_eq!(
            q.submit(Side::Away, &sprint(4, 0), 5),
            Admission::Late {
                tick: 4,
                current_tick: 5
            }
        );
        assert!(q.submit(Side::Away, &sprint(5, 0), 5).is_accepted());
        assert_eq!(q.summary().away.late, 1);
        assert_eq!(q.summary().away.accepted, 1);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut q = InputQueue::new(MatchConfig::default());
        q.submit_all(Side::Home, &[sprint(2, 5), sprint(2, 1)], 0);
        let peeked = q.peek_batch(Side::Home, 2);
        assert_eq!(peeked.len(), 2);
        assert_eq!(peeked[0].timestamp, 1);
        assert_eq!(q.take_batch(Side::Home, 2), peeked);
    }
}
