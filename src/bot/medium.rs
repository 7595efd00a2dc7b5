use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use super::{
    highest_scoring, reverse_horizontal, waited_longer_than, Heading, MotionHistory,
};
use crate::actor::{Actor, ActorView, ControlIntent};
use crate::collision::Platform;

const PROFILE_REFRESH: Duration = Duration::from_millis(3000);
const PREDICTION_SAMPLES: usize = 5;
const CHASE_ACCURACY: f32 = 0.9;
const CORNER_MARGIN: f32 = 30.0;
const CORNER_JUMP_CHANCE: f32 = 0.8;
const PLATFORM_LOOKAHEAD: f32 = 50.0;
const PLATFORM_JUMP_CHANCE: f32 = 0.6;
const TARGET_ABOVE: f32 = 30.0;
const MIN_DASH_DISTANCE: f32 = 50.0;
/// Platforms above the bot look this much closer when picking a refuge.
const HIGHER_PLATFORM_BONUS: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Aggressive,
    Defensive,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyProfile {
    pub kind: ProfileKind,
    pub chase_threshold: f32,
    pub retreat_threshold: f32,
    pub jump_frequency: f32,
    pub dash_threshold: f32,
}

impl ProfileKind {
    pub const fn profile(self) -> StrategyProfile {
        match self {
            Self::Aggressive => StrategyProfile {
                kind: self,
                chase_threshold: 150.0,
                retreat_threshold: 100.0,
                jump_frequency: 0.6,
                dash_threshold: 120.0,
            },
            Self::Defensive => StrategyProfile {
                kind: self,
                chase_threshold: 200.0,
                retreat_threshold: 150.0,
                jump_frequency: 0.4,
                dash_threshold: 100.0,
            },
            Self::Balanced => StrategyProfile {
                kind: self,
                chase_threshold: 180.0,
                retreat_threshold: 120.0,
                jump_frequency: 0.5,
                dash_threshold: 110.0,
            },
        }
    }
}

impl StrategyProfile {
    /// Chasers lean aggressive, runners lean defensive; both fall back to balanced 30% of the time.
    pub fn pick<R: Rng>(is_it: bool, rng: &mut R) -> Self {
        let lean = if is_it {
            ProfileKind::Aggressive
        } else {
            ProfileKind::Defensive
        };
        if rng.gen::<f32>() < 0.7 {
            lean.profile()
        } else {
            ProfileKind::Balanced.profile()
        }
    }
}

/// Reacts inside a distance band and leads its target using recent velocity samples.
#[derive(Debug, Clone)]
pub struct MediumBrain {
    pub history: MotionHistory,
    pub profile: StrategyProfile,
    profile_since: Option<Duration>,
}

impl MediumBrain {
    pub fn new<R: Rng>(is_it: bool, history_len: usize, rng: &mut R) -> Self {
        Self {
            history: MotionHistory::new(history_len),
            profile: StrategyProfile::pick(is_it, rng),
            profile_since: None,
        }
    }

    /// Runs every tick, decision or not.
    pub(super) fn tick<R: Rng>(
        &mut self,
        target: &ActorView,
        is_it: bool,
        now: Duration,
        rng: &mut R,
    ) {
        self.history.record(target, now);

        if waited_longer_than(self.profile_since, PROFILE_REFRESH, now) {
            self.profile_since = Some(now);
            let next = StrategyProfile::pick(is_it, rng);
            if next.kind != self.profile.kind {
                debug!("Medium bot switched to {:?}", next.kind);
            }
            self.profile = next;
        }
    }

    /// Where the target will be: the mean of the last five velocities over ten ticks, plus
    /// the latest acceleration. Falls back to the current position until five samples exist.
    pub fn predict(&self, target: &ActorView) -> Vec2 {
        if self.history.len() < PREDICTION_SAMPLES {
            return target.position;
        }
        let velocity = self.history.mean_velocity(PREDICTION_SAMPLES);
        let acceleration = self.history.acceleration_per_ms();
        target.position + velocity * 10.0 + 0.5 * acceleration * 100.0
    }

    pub(super) fn steer<R: Rng>(
        &self,
        actor: &mut Actor,
        target: &ActorView,
        platforms: &[Platform],
        distance: f32,
        rng: &mut R,
    ) {
        if actor.is_it {
            if distance < self.profile.chase_threshold && rng.gen::<f32>() < CHASE_ACCURACY {
                let predicted = self.predict(target);
                Heading::toward(predicted.x - actor.position.x).press(&mut actor.controls);
            }
            return;
        }

        if distance < self.profile.retreat_threshold {
            let heading = match safe_platform(actor, platforms) {
                Some(platform) => {
                    Heading::toward(platform.x + platform.width * 0.5 - actor.position.x)
                }
                None => Heading::away_from(target.position.x - actor.position.x),
            };
            heading.press(&mut actor.controls);
        }
    }

    pub(super) fn should_jump<R: Rng>(
        &self,
        actor: &Actor,
        target: &ActorView,
        platforms: &[Platform],
        rng: &mut R,
    ) -> bool {
        let predicted = self.predict(target);
        if predicted.y < actor.position.y - TARGET_ABOVE
            && rng.gen::<f32>() < self.profile.jump_frequency
        {
            return true;
        }
        if in_corner(actor, platforms) && rng.gen::<f32>() < CORNER_JUMP_CHANCE {
            return true;
        }
        platform_ahead(actor, platforms, rng)
    }

    pub(super) fn should_dash(&self, actor: &Actor, distance: f32) -> bool {
        if actor.is_it {
            distance < self.profile.dash_threshold && distance > MIN_DASH_DISTANCE
        } else {
            distance < self.profile.dash_threshold * 0.8
        }
    }

    /// Jumps, and turns around if boxed in near a platform end.
    pub(super) fn escape(&self, actor: &mut Actor, previous: &ControlIntent, platforms: &[Platform]) {
        actor.controls.up = true;
        if in_corner(actor, platforms) {
            reverse_horizontal(&mut actor.controls, previous);
        }
    }
}

/// Nearest platform, biased toward ones above the bot.
pub fn safe_platform<'a>(actor: &Actor, platforms: &'a [Platform]) -> Option<&'a Platform> {
    let me = actor.position;
    highest_scoring(platforms, |p| {
        let distance = Vec2::new(p.x + p.width * 0.5, p.y).distance(me);
        let bias = if p.y < me.y {
            -HIGHER_PLATFORM_BONUS
        } else {
            HIGHER_PLATFORM_BONUS
        };
        -(distance + bias)
    })
}

fn in_corner(actor: &Actor, platforms: &[Platform]) -> bool {
    let x = actor.position.x;
    platforms
        .iter()
        .any(|p| (x - p.x).abs() < CORNER_MARGIN || (x - p.right()).abs() < CORNER_MARGIN)
}

/// A platform slightly above the bot's head, just ahead in the direction it is pressing.
fn platform_ahead<R: Rng>(actor: &Actor, platforms: &[Platform], rng: &mut R) -> bool {
    let ahead = if actor.controls.right {
        PLATFORM_LOOKAHEAD
    } else {
        -PLATFORM_LOOKAHEAD
    };
    let future_x = actor.position.x + ahead;
    let y = actor.position.y;

    platforms.iter().any(|p| {
        p.y < y + actor.size.y * 1.5
            && p.y > y
            && future_x > p.x
            && future_x < p.right()
            && rng.gen::<f32>() < PLATFORM_JUMP_CHANCE
    })
}
