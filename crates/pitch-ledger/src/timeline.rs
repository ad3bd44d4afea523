//! Match event timeline.
//!
//! The physics step reports what happened during a tick as [`MatchEvent`]s
//! (goals, shots, passes, tackles, possession changes). The tick driver
//! appends them to a [`MatchTimeline`], which ends up in the match result for
//! match-history display.
//!
//! Events are derived data: they are never part of a hash, and replaying the
//! same inputs always reproduces the same timeline.
//!
//! # Example
//!
//! ```
//! use pitch_core::input::{PlayerId, Side};
//! use pitch_ledger::timeline::{EventKind, MatchEvent, MatchTimeline};
//!
//! let mut timeline = MatchTimeline::new();
//! timeline.record(MatchEvent {
//!     tick: 42,
//!     kind: EventKind::Goal { side: Side::Home, scorer: Some(PlayerId(9)) },
//! });
//! assert_eq!(timeline.goals().count(), 1);
//! assert_eq!(timeline.for_side(Side::Away).count(), 0);
//! ```

use pitch_core::input::{PlayerId, Side};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchEvent
// ---------------------------------------------------------------------------

/// Something notable that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchEvent {
    /// The tick during which the event occurred.
    pub tick: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    /// The ball crossed the goal line inside the goal mouth.
    Goal {
        side: Side,
        scorer: Option<PlayerId>,
    },
    /// A shot was struck. `on_target` reports the accuracy draw.
    Shot {
        side: Side,
        player: PlayerId,
        on_target: bool,
    },
    /// A pass was played. `accurate` reports the accuracy draw; the ball may
    /// still be intercepted in flight.
    Pass {
        side: Side,
        from: PlayerId,
        to: PlayerId,
        accurate: bool,
    },
    /// A tackle was attempted.
    Tackle {
        side: Side,
        tackler: PlayerId,
        target: PlayerId,
        won: bool,
    },
    /// A carrier took on a defender.
    Skill {
        side: Side,
        player: PlayerId,
        beaten: bool,
    },
    /// Control of the ball changed.
    PossessionChange {
        from: Option<Side>,
        to: Option<Side>,
        player: Option<PlayerId>,
    },
    /// Play restarted from the centre spot.
    Kickoff,
}

impl EventKind {
    /// The side credited with the event, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            EventKind::Goal { side, .. }
            | EventKind::Shot { side, .. }
            | EventKind::Pass { side, .. }
            | EventKind::Tackle { side, .. }
            | EventKind::Skill { side, .. } => Some(*side),
            EventKind::PossessionChange { to, .. } => *to,
            EventKind::Kickoff => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchTimeline
// ---------------------------------------------------------------------------

/// Ordered list of events for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchTimeline {
    events: Vec<MatchEvent>,
}

impl MatchTimeline {
    /// An empty timeline.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append one event.
    pub fn record(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    /// Append events in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = MatchEvent>) {
        self.events.extend(events);
    }

    /// All events, in the order they happened.
    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Goal events only.
    pub fn goals(&self) -> impl Iterator<Item = &MatchEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Goal { .. }))
    }

    /// Events credited to `side`.
    pub fn for_side(&self, side: Side) -> impl Iterator<Item = &MatchEvent> {
        self.events
            .iter()
            .filter(move |e| e.kind.side() == Some(side))
    }

    /// Events with `from <= tick < to`.
    pub fn between(&self, from: u64, to: u64) -> impl Iterator<Item = &MatchEvent> {
        self.events
            .iter()
            .filter(move |e| e.tick >= from && e.tick < to)
    }

    /// Consume the timeline and return the events.
    pub fn into_events(self) -> Vec<MatchEvent> {
        self.events
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
