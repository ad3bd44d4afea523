//! The mutable match aggregate and the entities inside it.
//!
//! [`MatchState`] is the single piece of mutable state in a match. The tick
//! driver owns it for the duration of a run; only the physics step mutates
//! players and ball. Entities refer to each other by [`PlayerId`] lookup keys,
//! never by reference: the ball's last touch is an id plus a tick.

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::fixed::{Fixed, Vec2};
use crate::input::{PlayerId, Side, PLAYERS_PER_SIDE};
use crate::tactics::{Formation, MatchTactics};
use crate::{ConfigError, DeterminismViolation};

/// Full stamina.
pub const MAX_STAMINA: Fixed = Fixed::from_int(100);

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Fixed attribute block, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub pace: u8,
    pub shooting: u8,
    pub passing: u8,
    pub defense: u8,
    pub dribbling: u8,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            pace: 60,
            shooting: 60,
            passing: 60,
            defense: 60,
            dribbling: 60,
        }
    }
}

impl PlayerStats {
    fn validate(&self) -> Result<(), String> {
        let all = [
            ("pace", self.pace),
            ("shooting", self.shooting),
            ("passing", self.passing),
            ("defense", self.defense),
            ("dribbling", self.dribbling),
        ];
        match all.iter().find(|(_, v)| *v > 100) {
            Some((name, v)) => Err(format!("{name} is {v}, must be within 0..=100")),
            None => Ok(()),
        }
    }
}

/// Stat blocks for both squads, goalkeeper first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Squads {
    pub home: Vec<PlayerStats>,
    pub away: Vec<PlayerStats>,
}

impl Default for Squads {
    fn default() -> Self {
        let squad = vec![PlayerStats::default(); PLAYERS_PER_SIDE as usize];
        Self {
            home: squad.clone(),
            away: squad,
        }
    }
}

impl Squads {
    /// Each squad must have exactly eleven players with stats in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (side, squad) in [(Side::Home, &self.home), (Side::Away, &self.away)] {
            if squad.len() != PLAYERS_PER_SIDE as usize {
                return Err(ConfigError::InvalidSquad {
                    side: side.as_str(),
                    reason: format!("expected {PLAYERS_PER_SIDE} players, got {}", squad.len()),
                });
            }
            for stats in squad {
                stats.validate().map_err(|reason| ConfigError::InvalidSquad {
                    side: side.as_str(),
                    reason,
                })?;
            }
        }
        Ok(())
    }

    /// The squad for `side`.
    pub fn get(&self, side: Side) -> &[PlayerStats] {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// One player on the pitch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub side: Side,
    /// Always inside the pitch rectangle.
    pub position: Vec2,
    /// Always within `0..=100`.
    pub stamina: Fixed,
    pub stats: PlayerStats,
    /// Point the player is running toward, set by MOVE.
    pub target: Option<Vec2>,
    /// Ticks of sprint remaining.
    pub sprint_ticks: u32,
}

// ---------------------------------------------------------------------------
// Ball
// ---------------------------------------------------------------------------

/// Who last played the ball, and when. A lookup key, not an owning link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Touch {
    pub player_id: PlayerId,
    pub tick: u64,
}

/// The ball.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BallState {
    pub position: Vec2,
    /// Field units per tick.
    pub velocity: Vec2,
    /// Side in control. When set, the carrier is `last_touch.player_id`.
    pub possession: Option<Side>,
    pub last_touch: Option<Touch>,
}

impl BallState {
    /// A stationary, uncontrolled ball at `position`.
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            possession: None,
            last_touch: None,
        }
    }

    /// The player carrying the ball, if any.
    pub fn carrier(&self) -> Option<PlayerId> {
        self.possession
            .and(self.last_touch)
            .map(|touch| touch.player_id)
    }
}

// ---------------------------------------------------------------------------
// MatchStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a match. Moves forward only: `Waiting -> Started -> Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Waiting,
    Started,
    Ended,
}

impl MatchStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Waiting, MatchStatus::Started) | (MatchStatus::Started, MatchStatus::Ended)
        )
    }
}

// ---------------------------------------------------------------------------
// Teams / match
// ---------------------------------------------------------------------------

/// One team's score and players.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamState {
    pub score: u32,
    /// Formation label at the last kickoff.
    pub formation: String,
    /// Goalkeeper first, ids ascending.
    pub players: Vec<PlayerState>,
}

/// The whole match at one tick boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchState {
    pub match_id: String,
    pub status: MatchStatus,
    /// Number of ticks simulated so far.
    pub tick: u64,
    pub home: TeamState,
    pub away: TeamState,
    pub ball: BallState,
    /// Elapsed match seconds, rounded up.
    pub duration: u32,
    pub seed: String,
}

impl MatchState {
    /// Line up both teams in their starting formations with the ball on the
    /// centre spot. Status is [`MatchStatus::Waiting`], tick 0.
    pub fn kickoff(
        match_id: &str,
        seed: &str,
        config: &MatchConfig,
        tactics: &MatchTactics,
        squads: &Squads,
    ) -> Self {
        let team = |side: Side| {
            let formation = &tactics.effective(side, 0).formation;
            let players = formation
                .kickoff_positions(side, config)
                .into_iter()
                .zip(squads.get(side))
                .enumerate()
                .map(|(slot, (position, stats))| PlayerState {
                    id: PlayerId::for_slot(side, slot as u32),
                    side,
                    position,
                    stamina: MAX_STAMINA,
                    stats: *stats,
                    target: None,
                    sprint_ticks: 0,
                })
                .collect();
            TeamState {
                score: 0,
                formation: formation.label().to_owned(),
                players,
            }
        };

        Self {
            match_id: match_id.to_owned(),
            status: MatchStatus::Waiting,
            tick: 0,
            home: team(Side::Home),
            away: team(Side::Away),
            ball: BallState::at_rest(config.center()),
            duration: 0,
            seed: seed.to_owned(),
        }
    }

    /// Return players to formation and the ball to the centre spot, keeping
    /// scores and stamina. Used after a goal.
    pub fn reset_for_kickoff(&mut self, config: &MatchConfig, formations: [&Formation; 2]) {
        for (side, formation) in Side::BOTH.into_iter().zip(formations) {
            let positions = formation.kickoff_positions(side, config);
            let team = self.team_mut(side);
            team.formation = formation.label().to_owned();
            for (player, position) in team.players.iter_mut().zip(positions) {
                player.position = position;
                player.target = None;
                player.sprint_ticks = 0;
            }
        }
        self.ball = BallState::at_rest(config.center());
    }

    /// Side in possession.
    pub fn possession(&self) -> Option<Side> {
        self.ball.possession
    }

    /// Team for `side`.
    pub fn team(&self, side: Side) -> &TeamState {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Mutable team for `side`.
    pub fn team_mut(&mut self, side: Side) -> &mut TeamState {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    /// All players, home first, ids ascending.
    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.home.players.iter().chain(self.away.players.iter())
    }

    /// Look up a player by id.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        let side = id.side()?;
        self.team(side).players.iter().find(|p| p.id == id)
    }

    /// Look up a player by id, mutably.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut PlayerState> {
        let side = id.side()?;
        self.team_mut(side).players.iter_mut().find(|p| p.id == id)
    }

    /// Move the status forward.
    ///
    /// # Errors
    ///
    /// [`DeterminismViolation::IllegalTransition`] for any transition other
    /// than `Waiting -> Started` or `Started -> Ended`.
    pub fn transition(&mut self, next: MatchStatus) -> Result<(), DeterminismViolation> {
        if !self.status.can_transition_to(next) {
            return Err(DeterminismViolation::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Check the per-tick invariants: positions inside the pitch, stamina in
    /// range, possession consistent with the last touch.
    pub fn check_invariants(&self, config: &MatchConfig) -> Result<(), DeterminismViolation> {
        if !config.contains(self.ball.position) {
            return Err(DeterminismViolation::OutOfBounds {
                entity: "ball".to_owned(),
                tick: self.tick,
            });
        }
        for player in self.players() {
            if !config.contains(player.position) {
                return Err(DeterminismViolation::OutOfBounds {
                    entity: format!("player {}", player.id),
                    tick: self.tick,
                });
            }
            if player.stamina < Fixed::ZERO || player.stamina > MAX_STAMINA {
                return Err(DeterminismViolation::StaminaOutOfRange {
                    player: player.id,
                    raw: player.stamina.raw(),
                    tick: self.tick,
                });
            }
        }
        if let Some(side) = self.ball.possession {
            let carrier_side = self.ball.last_touch.and_then(|t| t.player_id.side());
            if carrier_side != Some(side) {
                return Err(DeterminismViolation::PossessionMismatch { tick: self.tick });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
