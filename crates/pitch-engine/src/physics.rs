//! One tick of match physics and rules.
//!
//! [`step`] is a pure function of the previous state, the match context, the
//! two input batches, and the PRNG. It never reads anything else, and it is
//! the only code that draws from the [`MatchRng`]. Within a tick, work is
//! done in a fixed order:
//!
//! 1. apply the home batch, then the away batch, each input acting on the
//!    side's controlled player,
//! 2. move players toward their targets,
//! 3. decay stamina,
//! 4. move the ball (carried balls follow the carrier; loose balls travel,
//!    bounce off the touchlines and bylines, and slow by [`FRICTION`]),
//! 5. detect goals and reset for kickoff,
//! 6. resolve who, if anyone, takes control of a loose ball.
//!
//! The controlled player of a side is the ball carrier when that side has
//! possession, otherwise the side's player nearest the ball (lower id on
//! ties).
//!
//! The number of PRNG draws for a decision depends only on the state, never
//! on an earlier draw's value.

use pitch_core::config::MatchConfig;
use pitch_core::fixed::{Fixed, Vec2};
use pitch_core::input::{Action, PlayerId, PlayerInput, Side};
use pitch_core::rng::MatchRng;
use pitch_core::state::{MatchState, PlayerState, Touch};
use pitch_core::tactics::{BehaviorMultipliers, MatchTactics};
use pitch_ledger::timeline::{EventKind, MatchEvent};

/// Loose-ball velocity retained per tick: 62915 / 65536, about 0.96.
pub const FRICTION: Fixed = Fixed::from_raw(62_915);

/// A loose ball whose velocity components both fall below this stops.
pub const REST_SPEED: Fixed = Fixed::from_raw(64);

/// Ticks after touching the ball during which the same player cannot take
/// control of it again.
pub const CAPTURE_COOLDOWN_TICKS: u64 = 3;

/// Stamina lost per second at neutral tactics, before sprinting.
const STAMINA_DECAY_PER_SECOND: Fixed = Fixed::from_ratio(1, 6);

/// Stamina cost multiplier while sprinting.
const SPRINT_STAMINA_COST: i64 = 3;

/// Speed multiplier while sprinting.
const SPRINT_SPEED: Fixed = Fixed::from_ratio(3, 2);

/// Largest deviation, in degrees, of an inaccurate pass.
const PASS_DEVIATION_DEG: i64 = 25;

/// Largest deviation, in degrees, of an off-target shot.
const SHOT_DEVIATION_DEG: i64 = 15;

// ---------------------------------------------------------------------------
// Context / outcome
// ---------------------------------------------------------------------------

/// The read-only inputs to a step besides state and batches.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub config: &'a MatchConfig,
    pub tactics: &'a MatchTactics,
}

/// The state after one tick and what happened during it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub state: MatchState,
    pub events: Vec<MatchEvent>,
}

/// Advance `prev` by one tick.
///
/// `home` and `away` must already be in application order. The returned
/// state's tick is `prev.tick + 1`.
pub fn step(
    prev: &MatchState,
    ctx: &StepContext<'_>,
    home: &[PlayerInput],
    away: &[PlayerInput],
    rng: &mut MatchRng,
) -> StepOutcome {
    let tick = prev.tick;
    let mut sim = Sim {
        state: prev.clone(),
        events: Vec::new(),
        rng,
        config: ctx.config,
        tactics: ctx.tactics,
        tick,
        multipliers: [
            ctx.tactics.multipliers_at(Side::Home, tick),
            ctx.tactics.multipliers_at(Side::Away, tick),
        ],
    };

    for (side, batch) in [(Side::Home, home), (Side::Away, away)] {
        for input in batch {
            sim.apply(side, input);
        }
    }
    sim.move_players();
    sim.decay_stamina();
    match sim.move_ball() {
        Some(side) => sim.score(side),
        None => sim.resolve_capture(),
    }

    sim.state.tick = tick + 1;
    sim.state.duration = ctx.config.duration_for_ticks(tick + 1);
    StepOutcome {
        state: sim.state,
        events: sim.events,
    }
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

/// Performance factor from stamina: 0.5 when exhausted, 1.0 when fresh.
fn freshness(stamina: Fixed) -> Fixed {
    Fixed::from_ratio(1, 2) + stamina / 200
}

/// A stat scaled by freshness, in `[0, 1]`.
fn rating(stat: u8, stamina: Fixed) -> Fixed {
    Fixed::from_ratio(stat as i64, 100) * freshness(stamina)
}

/// Probability of a clean execution: a quarter for free, the rest earned.
fn execution(stat: u8, stamina: Fixed) -> Fixed {
    Fixed::from_ratio(1, 4) + rating(stat, stamina) * Fixed::from_ratio(3, 4)
}

/// `a / (a + b)`, or one half when both are zero.
fn share(a: Fixed, b: Fixed) -> Fixed {
    let total = a + b;
    if total <= Fixed::ZERO {
        return Fixed::from_ratio(1, 2);
    }
    a / total
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Home => 0,
        Side::Away => 1,
    }
}

// ---------------------------------------------------------------------------
// Sim
// ---------------------------------------------------------------------------

struct Sim<'a> {
    state: MatchState,
    events: Vec<MatchEvent>,
    rng: &'a mut MatchRng,
    config: &'a MatchConfig,
    tactics: &'a MatchTactics,
    tick: u64,
    multipliers: [BehaviorMultipliers; 2],
}

impl Sim<'_> {
    fn mult(&self, side: Side) -> BehaviorMultipliers {
        self.multipliers[side_index(side)]
    }

    fn emit(&mut self, kind: EventKind) {
        self.events.push(MatchEvent {
            tick: self.tick,
            kind,
        });
    }

    fn is_carrier(&self, id: PlayerId) -> bool {
        self.state.ball.carrier() == Some(id)
    }

    fn controlled(&self, side: Side) -> Option<PlayerId> {
        if self.state.ball.possession == Some(side) {
            return self.state.ball.carrier();
        }
        let ball = self.state.ball.position;
        self.state
            .team(side)
            .players
            .iter()
            .min_by_key(|p| (p.position.distance_sq_raw(ball), p.id))
            .map(|p| p.id)
    }

    // -- inputs -------------------------------------------------------------

    fn apply(&mut self, side: Side, input: &PlayerInput) {
        let Some(id) = self.controlled(side) else {
            return;
        };
        match input.action {
            Action::Move { x, y } => {
                let target = self.config.clamp(Vec2::new(x, y));
                if let Some(player) = self.state.player_mut(id) {
                    player.target = Some(target);
                }
            }
            Action::Sprint => {
                let ticks = self.config.tick_rate;
                if let Some(player) = self.state.player_mut(id) {
                    player.sprint_ticks = ticks;
                }
            }
            Action::Pass { target_id } => self.pass(side, id, target_id),
            Action::Shoot { power, angle } => self.shoot(side, id, power, angle),
            Action::Tackle { target_id } => self.tackle(side, id, target_id),
            Action::Skill => self.skill(side, id),
        }
    }

    /// Let go of the ball with `velocity`. The releasing player keeps the
    /// last touch.
    fn release(&mut self, from: PlayerId, velocity: Vec2) {
        let ball = &mut self.state.ball;
        ball.velocity = velocity;
        ball.possession = None;
        ball.last_touch = Some(Touch {
            player_id: from,
            tick: self.tick,
        });
    }

    fn pass(&mut self, side: Side, from: PlayerId, to: PlayerId) {
        if from == to || !self.is_carrier(from) {
            return;
        }
        let (Some(passer), Some(receiver)) = (
            self.state.player(from).cloned(),
            self.state.player(to).map(|p| p.position),
        ) else {
            return;
        };

        let p = execution(passer.stats.passing, passer.stamina) * self.mult(side).pass_accuracy;
        let accurate = self.rng.chance(p);
        let deviation = self.rng.signed_unit() * PASS_DEVIATION_DEG;

        let speed = self.config.per_tick(self.config.width() / 2);
        let mut velocity = passer.position.toward(receiver, speed);
        if !accurate {
            velocity = velocity.rotate(deviation);
        }
        self.release(from, velocity);
        self.emit(EventKind::Pass {
            side,
            from,
            to,
            accurate,
        });
    }

    fn shoot(&mut self, side: Side, id: PlayerId, power: Fixed, angle: Fixed) {
        if !self.is_carrier(id) {
            return;
        }
        let Some(shooter) = self.state.player(id).cloned() else {
            return;
        };

        let p = execution(shooter.stats.shooting, shooter.stamina) * self.mult(side).shot_accuracy;
        let on_target = self.rng.chance(p);
        let deviation = self.rng.signed_unit() * SHOT_DEVIATION_DEG;

        let attack = match side {
            Side::Home => Fixed::ZERO,
            Side::Away => Fixed::from_int(180),
        };
        let mut heading = attack + angle;
        if !on_target {
            heading += deviation;
        }
        let speed = self.config.per_tick(self.config.width()) * power / 100;
        self.release(id, Vec2::from_angle(heading).scale(speed));
        self.emit(EventKind::Shot {
            side,
            player: id,
            on_target,
        });
    }

    fn tackle(&mut self, side: Side, id: PlayerId, target: PlayerId) {
        if !self.is_carrier(target) || target.side() != Some(side.opponent()) {
            return;
        }
        let (Some(tackler), Some(carrier)) = (
            self.state.player(id).cloned(),
            self.state.player(target).cloned(),
        ) else {
            return;
        };
        let reach = self.config.tackle_radius() * self.mult(side).pressing_radius;
        if !tackler.position.within(carrier.position, reach) {
            return;
        }

        let win = rating(tackler.stats.defense, tackler.stamina) * self.mult(side).tackle_weight;
        let hold = rating(carrier.stats.dribbling, carrier.stamina)
            * self.mult(side.opponent()).skill_weight;
        let won = self.rng.chance(share(win, hold));

        self.emit(EventKind::Tackle {
            side,
            tackler: id,
            target,
            won,
        });
        if won {
            self.take_possession(id, side);
        }
    }

    fn skill(&mut self, side: Side, id: PlayerId) {
        if !self.is_carrier(id) {
            return;
        }
        let Some(carrier) = self.state.player(id).cloned() else {
            return;
        };
        let opponent = side.opponent();
        let reach = self.config.tackle_radius() * self.mult(opponent).pressing_radius;
        let Some(defender) = nearest(
            self.state
                .team(opponent)
                .players
                .iter()
                .filter(|p| p.position.within(carrier.position, reach)),
            carrier.position,
        )
        .cloned() else {
            return;
        };

        let beat = rating(carrier.stats.dribbling, carrier.stamina) * self.mult(side).skill_weight;
        let stop = rating(defender.stats.defense, defender.stamina)
            * self.mult(opponent).tackle_weight;
        let beaten = self.rng.chance(share(beat, stop));

        if beaten {
            let burst = Vec2::new(
                self.config.tackle_radius() * side.attack_sign(),
                Fixed::ZERO,
            );
            let position = self.config.clamp(carrier.position + burst);
            if let Some(player) = self.state.player_mut(id) {
                player.position = position;
            }
            self.state.ball.position = position;
        } else {
            self.release(id, Vec2::ZERO);
        }
        self.emit(EventKind::Skill {
            side,
            player: id,
            beaten,
        });
    }

    fn take_possession(&mut self, id: PlayerId, side: Side) {
        let previous = self
            .state
            .ball
            .last_touch
            .and_then(|touch| touch.player_id.side());
        let position = self.state.player(id).map(|p| p.position);

        let ball = &mut self.state.ball;
        if let Some(position) = position {
            ball.position = position;
        }
        ball.velocity = Vec2::ZERO;
        ball.possession = Some(side);
        ball.last_touch = Some(Touch {
            player_id: id,
            tick: self.tick,
        });

        if previous != Some(side) {
            self.emit(EventKind::PossessionChange {
                from: previous,
                to: Some(side),
                player: Some(id),
            });
        }
    }

    // -- movement -----------------------------------------------------------

    fn run_speed(&self, player: &PlayerState, mult: &BehaviorMultipliers) -> Fixed {
        let base = self.config.per_tick(self.config.width() / 10);
        let pace = Fixed::from_ratio(1, 2) + Fixed::from_ratio(player.stats.pace as i64, 200);
        let mut speed = base * pace * freshness(player.stamina) * mult.move_speed;
        if player.sprint_ticks > 0 {
            speed = speed * SPRINT_SPEED;
        }
        speed
    }

    fn move_players(&mut self) {
        for side in Side::BOTH {
            let mult = self.mult(side);
            let speeds: Vec<Fixed> = self
                .state
                .team(side)
                .players
                .iter()
                .map(|p| self.run_speed(p, &mult))
                .collect();
            let config = self.config;
            for (player, speed) in self.state.team_mut(side).players.iter_mut().zip(speeds) {
                let Some(target) = player.target else {
                    continue;
                };
                if player.position.within(target, speed) {
                    player.position = target;
                    player.target = None;
                } else {
                    let next = player.position + player.position.toward(target, speed);
                    player.position = config.clamp(next);
                }
            }
        }
    }

    fn decay_stamina(&mut self) {
        for side in Side::BOTH {
            let base = self.config.per_tick(STAMINA_DECAY_PER_SECOND) * self.mult(side).stamina_decay;
            for player in self.state.team_mut(side).players.iter_mut() {
                let mut loss = base;
                if player.sprint_ticks > 0 {
                    loss = loss * SPRINT_STAMINA_COST;
                    player.sprint_ticks -= 1;
                }
                player.stamina = (player.stamina - loss).max(Fixed::ZERO);
            }
        }
    }

    /// Move the ball. Returns the scoring side if it crossed a goal line
    /// inside the goal mouth.
    fn move_ball(&mut self) -> Option<Side> {
        if let Some(carrier) = self.state.ball.carrier() {
            if let Some(position) = self.state.player(carrier).map(|p| p.position) {
                self.state.ball.position = position;
                self.state.ball.velocity = Vec2::ZERO;
            }
            return None;
        }

        let ball = &mut self.state.ball;
        if ball.velocity == Vec2::ZERO {
            return None;
        }

        let (w, h) = (self.config.width(), self.config.height());
        let (mouth_low, mouth_high) = self.config.goal_mouth();
        let mut position = ball.position + ball.velocity;
        let mut velocity = ball.velocity;

        if position.y < Fixed::ZERO {
            position.y = -position.y;
            velocity.y = -velocity.y;
        } else if position.y > h {
            position.y = h * 2 - position.y;
            velocity.y = -velocity.y;
        }
        position.y = position.y.clamp(Fixed::ZERO, h);

        let mut scored = None;
        if position.x < Fixed::ZERO || position.x > w {
            if position.y >= mouth_low && position.y <= mouth_high {
                scored = Some(if position.x < Fixed::ZERO {
                    Side::Away
                } else {
                    Side::Home
                });
            } else if position.x < Fixed::ZERO {
                position.x = -position.x;
                velocity.x = -velocity.x;
            } else {
                position.x = w * 2 - position.x;
                velocity.x = -velocity.x;
            }
        }
        position.x = position.x.clamp(Fixed::ZERO, w);

        velocity = velocity.scale(FRICTION);
        if velocity.x.abs() < REST_SPEED && velocity.y.abs() < REST_SPEED {
            velocity = Vec2::ZERO;
        }
        ball.position = position;
        ball.velocity = velocity;
        scored
    }

    fn score(&mut self, side: Side) {
        self.state.team_mut(side).score += 1;
        let scorer = self
            .state
            .ball
            .last_touch
            .map(|touch| touch.player_id)
            .filter(|id| id.side() == Some(side));
        self.emit(EventKind::Goal { side, scorer });

        let tactics = self.tactics;
        let formations = [
            &tactics.effective(Side::Home, self.tick).formation,
            &tactics.effective(Side::Away, self.tick).formation,
        ];
        self.state.reset_for_kickoff(self.config, formations);
        self.emit(EventKind::Kickoff);
    }

    fn resolve_capture(&mut self) {
        let ball = self.state.ball.clone();
        if ball.possession.is_some() {
            return;
        }
        let radius = self.config.capture_radius();
        let cooling = ball
            .last_touch
            .filter(|touch| self.tick.saturating_sub(touch.tick) < CAPTURE_COOLDOWN_TICKS)
            .map(|touch| touch.player_id);

        let Some(candidate) = nearest(
            self.state
                .players()
                .filter(|p| Some(p.id) != cooling && p.position.within(ball.position, radius)),
            ball.position,
        )
        .cloned() else {
            return;
        };

        let fast = !Vec2::ZERO.within(ball.velocity, radius);
        if fast {
            let toucher_side = ball.last_touch.and_then(|touch| touch.player_id.side());
            let stat = if toucher_side == Some(candidate.side) {
                ((candidate.stats.passing as u16 + candidate.stats.dribbling as u16) / 2) as u8
            } else {
                candidate.stats.defense
            };
            if !self.rng.chance(execution(stat, candidate.stamina)) {
                return;
            }
        }
        self.take_possession(candidate.id, candidate.side);
    }
}

/// The player in `players` nearest `point`, lower id on ties.
fn nearest<'p>(
    players: impl Iterator<Item = &'p PlayerState>,
    point: Vec2,
) -> Option<&'p PlayerState> {
    players.min_by_key(|p| (p.position.distance_sq_raw(point), p.id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
