//! Player inputs: the untrusted wire record and its validated form.
//!
//! Collaborators submit [`InputRecord`]s: a tick, an action kind, a loose
//! bag of optional parameters, and a timestamp. Validation turns a record
//! into a [`PlayerInput`] whose [`Action`] carries exactly the fields its
//! kind requires, so ambiguous combinations (a MOVE with a `power`, a SHOOT
//! without an `angle`) cannot exist past this point.
//!
//! Validation happens in two layers:
//!
//! - [`InputRecord::parse`] checks the record on its own: required and
//!   forbidden parameters, finiteness, fixed ranges. This is also what
//!   deserializing a `PlayerInput` runs.
//! - [`PlayerInput::check_context`] checks the parsed input against a
//!   specific match: MOVE targets inside the pitch, PASS to a teammate,
//!   TACKLE on an opponent, tick before the final whistle.
//!
//! # Example
//!
//! ```
//! use pitch_core::prelude::*;
//!
//! let record: InputRecord = serde_json::from_str(
//!     r#"{"tick":5,"action":"SHOOT","params":{"power":80,"angle":45},"timestamp":500}"#,
//! ).unwrap();
//! let input = record.parse().unwrap();
//! assert!(matches!(input.action, Action::Shoot { .. }));
//! ```

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::fixed::Fixed;
use crate::ValidationError;

/// Outfield players plus goalkeeper.
pub const PLAYERS_PER_SIDE: u32 = 11;

// ---------------------------------------------------------------------------
// Side / PlayerId
// ---------------------------------------------------------------------------

/// One of the two teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Defends `x = 0`, attacks toward `x = field_width`.
    Home,
    /// Defends `x = field_width`, attacks toward `x = 0`.
    Away,
}

impl Side {
    /// Both sides in application order.
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    /// The other team.
    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    /// `+1` for home (attacks toward increasing `x`), `-1` for away.
    pub fn attack_sign(self) -> i64 {
        match self {
            Side::Home => 1,
            Side::Away => -1,
        }
    }

    /// Lower-case name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable player identifier. Home players are `1..=11`, away `12..=22`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// The id of the `slot`-th player (0-based, goalkeeper first) of `side`.
    pub fn for_slot(side: Side, slot: u32) -> PlayerId {
        match side {
            Side::Home => PlayerId(1 + slot),
            Side::Away => PlayerId(1 + PLAYERS_PER_SIDE + slot),
        }
    }

    /// The side this id belongs to, or `None` if it is not a valid id.
    pub fn side(self) -> Option<Side> {
        match self.0 {
            id if (1..=PLAYERS_PER_SIDE).contains(&id) => Some(Side::Home),
            id if (PLAYERS_PER_SIDE + 1..=2 * PLAYERS_PER_SIDE).contains(&id) => Some(Side::Away),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Wire record
// ---------------------------------------------------------------------------

/// Action kind as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Move,
    Pass,
    Shoot,
    Tackle,
    Sprint,
    Skill,
}

/// Loosely-typed parameter bag. Only the fields the action needs may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u32>,
}

/// An input as submitted by a player, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    /// Tick the input applies to. Signed so a negative value is rejected as a
    /// single bad input instead of failing the whole batch at parse time.
    pub tick: i64,
    pub action: ActionKind,
    #[serde(default)]
    pub params: InputParams,
    /// Submission order hint; orders inputs within a tick, never overrides it.
    pub timestamp: u64,
}

impl InputRecord {
    /// Validate the record in isolation and produce a typed [`PlayerInput`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first problem found.
    pub fn parse(&self) -> Result<PlayerInput, ValidationError> {
        if self.tick < 0 {
            return Err(ValidationError::NegativeTick { tick: self.tick });
        }
        let p = &self.params;
        let kind = self.action;

        let allowed: &[&'static str] = match kind {
            ActionKind::Move => &["x", "y"],
            ActionKind::Shoot => &["power", "angle"],
            ActionKind::Pass | ActionKind::Tackle => &["targetId"],
            ActionKind::Sprint | ActionKind::Skill => &[],
        };
        let present = [
            ("x", p.x.is_some()),
            ("y", p.y.is_some()),
            ("power", p.power.is_some()),
            ("angle", p.angle.is_some()),
            ("targetId", p.target_id.is_some()),
        ];
        for (name, is_set) in present {
            if is_set && !allowed.contains(&name) {
                return Err(ValidationError::UnexpectedParam {
                    action: kind,
                    param: name,
                });
            }
        }

        let action = match kind {
            ActionKind::Move => Action::Move {
                x: fixed_param(kind, "x", p.x)?,
                y: fixed_param(kind, "y", p.y)?,
            },
            ActionKind::Shoot => {
                let power = fixed_param(kind, "power", p.power)?;
                let angle = fixed_param(kind, "angle", p.angle)?;
                check_range("power", p.power, power, 0, 100)?;
                check_range("angle", p.angle, angle, -180, 180)?;
                Action::Shoot { power, angle }
            }
            ActionKind::Pass => Action::Pass {
                target_id: target_param(kind, p.target_id)?,
            },
            ActionKind::Tackle => Action::Tackle {
                target_id: target_param(kind, p.target_id)?,
            },
            ActionKind::Sprint => Action::Sprint,
            ActionKind::Skill => Action::Skill,
        };

        Ok(PlayerInput {
            tick: self.tick as u64,
            timestamp: self.timestamp,
            action,
        })
    }
}

fn fixed_param(
    action: ActionKind,
    param: &'static str,
    value: Option<f64>,
) -> Result<Fixed, ValidationError> {
    let value = value.ok_or(ValidationError::MissingParam { action, param })?;
    Fixed::from_f64(value).ok_or(ValidationError::NonFinite { param })
}

fn target_param(action: ActionKind, value: Option<u32>) -> Result<PlayerId, ValidationError> {
    let raw = value.ok_or(ValidationError::MissingParam {
        action,
        param: "targetId",
    })?;
    let id = PlayerId(raw);
    match id.side() {
        Some(_) => Ok(id),
        None => Err(ValidationError::UnknownPlayer { target_id: raw }),
    }
}

fn check_range(
    param: &'static str,
    raw: Option<f64>,
    value: Fixed,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if value < Fixed::from_int(min) || value > Fixed::from_int(max) {
        return Err(ValidationError::OutOfRange {
            param,
            value: raw.unwrap_or_default(),
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validated input
// ---------------------------------------------------------------------------

/// What a player asked to do, with exactly the data that action needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Run toward a point on the pitch.
    Move { x: Fixed, y: Fixed },
    /// Pass to a teammate.
    Pass { target_id: PlayerId },
    /// Shoot. `power` in `0..=100`; `angle` in degrees relative to the
    /// direction of attack, counter-clockwise, in `-180..=180`.
    Shoot { power: Fixed, angle: Fixed },
    /// Tackle an opponent.
    Tackle { target_id: PlayerId },
    /// Burst of speed for one second.
    Sprint,
    /// Take on the nearest defender.
    Skill,
}

impl Action {
    /// The wire kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Pass { .. } => ActionKind::Pass,
            Action::Shoot { .. } => ActionKind::Shoot,
            Action::Tackle { .. } => ActionKind::Tackle,
            Action::Sprint => ActionKind::Sprint,
            Action::Skill => ActionKind::Skill,
        }
    }
}

/// A validated input. Immutable once accepted.
///
/// Serializes in the [`InputRecord`] wire shape; deserializing runs
/// [`InputRecord::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "InputRecord", try_from = "InputRecord")]
pub struct PlayerInput {
    pub tick: u64,
    pub timestamp: u64,
    pub action: Action,
}

impl PlayerInput {
    /// Check the input against a specific match and the submitting side.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::TickBeyondMatch`] if `tick >= total_ticks`.
    /// - [`ValidationError::OutOfRange`] if a MOVE target is off the pitch.
    /// - [`ValidationError::WrongTarget`] if a PASS targets an opponent or a
    ///   TACKLE targets a teammate.
    pub fn check_context(&self, side: Side, config: &MatchConfig) -> Result<(), ValidationError> {
        let total_ticks = config.total_ticks();
        if self.tick >= total_ticks {
            return Err(ValidationError::TickBeyondMatch {
                tick: self.tick,
                total_ticks,
            });
        }
        match self.action {
            Action::Move { x, y } => {
                if x < Fixed::ZERO || x > config.width() {
                    return Err(ValidationError::OutOfRange {
                        param: "x",
                        value: x.to_f64(),
                        min: 0.0,
                        max: config.field_width as f64,
                    });
                }
                if y < Fixed::ZERO || y > config.height() {
                    return Err(ValidationError::OutOfRange {
                        param: "y",
                        value: y.to_f64(),
                        min: 0.0,
                        max: config.field_height as f64,
                    });
                }
            }
            Action::Pass { target_id } if target_id.side() != Some(side) => {
                return Err(ValidationError::WrongTarget {
                    action: ActionKind::Pass,
                    target_id,
                });
            }
            Action::Tackle { target_id } if target_id.side() != Some(side.opponent()) => {
                return Err(ValidationError::WrongTarget {
                    action: ActionKind::Tackle,
                    target_id,
                });
            }
            _ => {}
        }
        Ok(())
    }
}

impl From<PlayerInput> for InputRecord {
    fn from(input: PlayerInput) -> Self {
        let mut params = InputParams::default();
        match input.action {
            Action::Move { x, y } => {
                params.x = Some(x.to_f64());
                params.y = Some(y.to_f64());
            }
            Action::Shoot { power, angle } => {
                params.power = Some(power.to_f64());
                params.angle = Some(angle.to_f64());
            }
            Action::Pass { target_id } | Action::Tackle { target_id } => {
                params.target_id = Some(target_id.0);
            }
            Action::Sprint | Action::Skill => {}
        }
        InputRecord {
            tick: input.tick as i64,
            action: input.action.kind(),
            params,
            timestamp: input.timestamp,
        }
    }
}

impl TryFrom<InputRecord> for PlayerInput {
    type Error = ValidationError;

    fn try_from(record: InputRecord) -> Result<Self, Self::Error> {
        record.parse()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
