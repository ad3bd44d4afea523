//! Tactics layer: formations, sliders, and the multipliers they produce.
//!
//! Tactics never act directly. They are a pure mapping from a team's
//! formation and slider values to [`BehaviorMultipliers`] that the physics
//! step folds into movement, stamina decay, and its seeded outcome draws.
//!
//! Tactics can change during a match through [`TacticsUpdate`]s. An update
//! recorded at `updated_at = T` takes effect from tick `T + 1`; tick `T`
//! itself and everything before it still see the previous tactics.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::fixed::{Fixed, Vec2};
use crate::input::{Side, PLAYERS_PER_SIDE};
use crate::ConfigError;

// ---------------------------------------------------------------------------
// Formation
// ---------------------------------------------------------------------------

/// An outfield shape such as `4-4-2`, defenders first.
///
/// Between two and five lines, each non-empty, summing to ten outfield
/// players. The goalkeeper is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formation {
    label: String,
    lines: Vec<u8>,
}

impl Formation {
    /// The label as given, e.g. `"4-2-3-1"`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Player count per line, defence first.
    pub fn lines(&self) -> &[u8] {
        &self.lines
    }

    /// Players in the most advanced line.
    pub fn forwards(&self) -> u8 {
        self.lines.last().copied().unwrap_or(0)
    }

    /// Kickoff positions for `side`, goalkeeper first, in player-slot order.
    ///
    /// Home lines span 15%..40% of the pitch length; away mirrors them. The
    /// most advanced line stays at least a tenth of the pitch away from the
    /// centre spot, well outside the capture radius.
    pub fn kickoff_positions(&self, side: Side, config: &MatchConfig) -> Vec<Vec2> {
        let width = config.width();
        let height = config.height();
        let mut own_half = Vec::with_capacity(PLAYERS_PER_SIDE as usize);
        own_half.push(Vec2::new(width.percent(5), height / 2));

        let n = self.lines.len() as i64;
        for (i, &count) in self.lines.iter().enumerate() {
            let depth_pct = if n > 1 {
                15 + 25 * i as i64 / (n - 1)
            } else {
                25
            };
            let x = width.percent(depth_pct as u8);
            for j in 0..count as i64 {
                let y = height * (j + 1) / (count as i64 + 1);
                own_half.push(Vec2::new(x, y));
            }
        }

        match side {
            Side::Home => own_half,
            Side::Away => own_half
                .into_iter()
                .map(|p| Vec2::new(width - p.x, p.y))
                .collect(),
        }
    }
}

impl Default for Formation {
    fn default() -> Self {
        "4-4-2".parse().unwrap_or_else(|_| Formation {
            label: "4-4-2".to_owned(),
            lines: vec![4, 4, 2],
        })
    }
}

impl FromStr for Formation {
    type Err = ConfigError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidFormation {
            label: label.to_owned(),
            reason: reason.to_owned(),
        };

        let mut lines = Vec::new();
        for part in label.split('-') {
            let count: u8 = part
                .trim()
                .parse()
                .map_err(|_| invalid("each line must be a number"))?;
            if count == 0 {
                return Err(invalid("lines must not be empty"));
            }
            lines.push(count);
        }
        if !(2..=5).contains(&lines.len()) {
            return Err(invalid("expected between 2 and 5 lines"));
        }
        let total: u32 = lines.iter().map(|&c| c as u32).sum();
        if total != PLAYERS_PER_SIDE - 1 {
            return Err(invalid("outfield lines must sum to 10"));
        }
        Ok(Formation {
            label: label.to_owned(),
            lines,
        })
    }
}

impl TryFrom<String> for Formation {
    type Error = ConfigError;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        label.parse()
    }
}

impl From<Formation> for String {
    fn from(formation: Formation) -> Self {
        formation.label
    }
}

// ---------------------------------------------------------------------------
// Sliders
// ---------------------------------------------------------------------------

/// Team instruction sliders, each in `0..=100` with 50 as neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TacticalSliders {
    pub pressing: u8,
    pub tempo: u8,
    pub width: u8,
    pub defensive_line: u8,
    pub offensive_aggression: u8,
    pub build_up_play: u8,
    pub transition_speed: u8,
    pub creativity: u8,
}

impl Default for TacticalSliders {
    fn default() -> Self {
        Self {
            pressing: 50,
            tempo: 50,
            width: 50,
            defensive_line: 50,
            offensive_aggression: 50,
            build_up_play: 50,
            transition_speed: 50,
            creativity: 50,
        }
    }
}

impl TacticalSliders {
    /// # Errors
    ///
    /// [`ConfigError::SliderOutOfRange`] for the first slider above 100.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.named() {
            if value > 100 {
                return Err(ConfigError::SliderOutOfRange { name, value });
            }
        }
        Ok(())
    }

    fn named(&self) -> [(&'static str, u8); 8] {
        [
            ("pressing", self.pressing),
            ("tempo", self.tempo),
            ("width", self.width),
            ("defensiveLine", self.defensive_line),
            ("offensiveAggression", self.offensive_aggression),
            ("buildUpPlay", self.build_up_play),
            ("transitionSpeed", self.transition_speed),
            ("creativity", self.creativity),
        ]
    }
}

// ---------------------------------------------------------------------------
// Team / match tactics
// ---------------------------------------------------------------------------

/// One team's formation and sliders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamTactics {
    #[serde(default)]
    pub formation: Formation,
    #[serde(default)]
    pub sliders: TacticalSliders,
}

/// A mid-match change of one team's tactics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TacticsUpdate {
    pub side: Side,
    /// Tick at which the change was recorded. Effective from the next tick.
    pub updated_at: u64,
    pub tactics: TeamTactics,
}

/// Both teams' starting tactics plus any scheduled changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTactics {
    pub home: TeamTactics,
    pub away: TeamTactics,
    #[serde(default)]
    pub updates: Vec<TacticsUpdate>,
}

impl MatchTactics {
    /// Validate every slider set (initial and updates).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.home.sliders.validate()?;
        self.away.sliders.validate()?;
        for update in &self.updates {
            update.tactics.sliders.validate()?;
        }
        Ok(())
    }

    /// The tactics `side` plays with during `tick`.
    ///
    /// The latest update with `updated_at < tick` wins; among updates recorded
    /// at the same tick, the one listed last wins.
    pub fn effective(&self, side: Side, tick: u64) -> &TeamTactics {
        let initial = match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        };
        self.updates
            .iter()
            .filter(|u| u.side == side && u.updated_at < tick)
            .fold(None::<&TacticsUpdate>, |best, u| match best {
                Some(b) if b.updated_at > u.updated_at => Some(b),
                _ => Some(u),
            })
            .map(|u| &u.tactics)
            .unwrap_or(initial)
    }

    /// Multipliers for `side` during `tick`.
    pub fn multipliers_at(&self, side: Side, tick: u64) -> BehaviorMultipliers {
        BehaviorMultipliers::from_tactics(self.effective(side, tick))
    }
}

// ---------------------------------------------------------------------------
// BehaviorMultipliers
// ---------------------------------------------------------------------------

/// Per-tick scaling factors derived from a team's tactics. `ONE` is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorMultipliers {
    /// Stamina lost per tick.
    pub stamina_decay: Fixed,
    /// Probability scale for pass success.
    pub pass_accuracy: Fixed,
    /// Probability scale for shot accuracy.
    pub shot_accuracy: Fixed,
    /// Reach of tackles and pressing.
    pub pressing_radius: Fixed,
    /// Weight of the tackler in tackle draws.
    pub tackle_weight: Fixed,
    /// Weight of the dribbler in skill draws.
    pub skill_weight: Fixed,
    /// Player running speed.
    pub move_speed: Fixed,
}

impl Default for BehaviorMultipliers {
    fn default() -> Self {
        Self::from_tactics(&TeamTactics::default())
    }
}

impl BehaviorMultipliers {
    /// Pure mapping from tactics to multipliers.
    pub fn from_tactics(tactics: &TeamTactics) -> Self {
        let s = &tactics.sliders;
        let forwards = tactics.formation.forwards() as i64;
        let one = Fixed::ONE;

        Self {
            stamina_decay: one + offset(s.pressing) + offset(s.tempo) / 2,
            pass_accuracy: one + offset(s.build_up_play) / 2 + offset(s.creativity) / 4,
            shot_accuracy: one
                + offset(s.creativity) / 2
                + offset(s.offensive_aggression) / 4
                + Fixed::from_ratio(forwards - 2, 40),
            pressing_radius: one + offset(s.width) / 2 + offset(s.defensive_line) / 2,
            tackle_weight: one + offset(s.pressing) / 2 + offset(s.offensive_aggression) / 2,
            skill_weight: one + offset(s.creativity) / 2 + offset(s.transition_speed) / 4,
            move_speed: one + offset(s.tempo) / 4 + offset(s.transition_speed) / 4,
        }
    }
}

/// Slider value mapped to `[-0.5, 0.5]`.
fn offset(slider: u8) -> Fixed {
    Fixed::from_ratio(slider as i64 - 50, 100)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
