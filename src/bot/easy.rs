use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use super::{waited_longer_than, Heading};
use crate::actor::{Actor, ActorView, Skill};
use crate::collision::Platform;

const STATE_REROLL: Duration = Duration::from_millis(2000);
const EDGE_MARGIN: f32 = 20.0;
/// How far the feet may sit from a platform top and still count as standing on it.
const STANDING_TOLERANCE: f32 = 5.0;
const TARGET_ABOVE: f32 = 50.0;
const DASH_RANGE: f32 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementState {
    Idle,
    Wander,
    Chase,
    Retreat,
}

impl MovementState {
    const ALL: [Self; 4] = [Self::Idle, Self::Wander, Self::Chase, Self::Retreat];

    fn weights(is_it: bool) -> [f32; 4] {
        if is_it {
            [0.1, 0.2, 0.7, 0.0]
        } else {
            [0.2, 0.3, 0.0, 0.5]
        }
    }
}

/// Mostly random play with a loose bias toward the right behavior for its role.
#[derive(Debug, Clone)]
pub struct EasyBrain {
    pub state: MovementState,
    pub preferred: Heading,
    state_since: Option<Duration>,
}

impl EasyBrain {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            state: MovementState::Idle,
            preferred: Heading::random(rng),
            state_since: None,
        }
    }

    pub(super) fn tick<R: Rng>(&mut self, is_it: bool, now: Duration, rng: &mut R) {
        if waited_longer_than(self.state_since, STATE_REROLL, now) {
            self.state_since = Some(now);
            self.reroll(is_it, rng);
        }
    }

    fn reroll<R: Rng>(&mut self, is_it: bool, rng: &mut R) {
        let roll: f32 = rng.gen();
        let mut cumulative = 0.0;
        for (state, weight) in MovementState::ALL.into_iter().zip(MovementState::weights(is_it)) {
            cumulative += weight;
            if roll <= cumulative {
                self.state = state;
                self.preferred = Heading::random(rng);
                return;
            }
        }
    }

    pub(super) fn steer<R: Rng>(
        &mut self,
        actor: &mut Actor,
        target: &ActorView,
        platforms: &[Platform],
        rng: &mut R,
    ) {
        let dx = target.position.x - actor.position.x;
        match self.state {
            MovementState::Idle => {
                if rng.gen::<f32>() < 0.3 {
                    Heading::random(rng).press(&mut actor.controls);
                }
            }
            MovementState::Wander => {
                self.preferred.press(&mut actor.controls);
                if near_platform_edge(actor, platforms) {
                    self.preferred = self.preferred.reversed();
                }
            }
            MovementState::Chase => {
                let heading = if rng.gen::<f32>() < 0.8 {
                    Heading::toward(dx)
                } else {
                    Heading::random(rng)
                };
                heading.press(&mut actor.controls);
            }
            MovementState::Retreat => {
                if rng.gen::<f32>() < 0.7 {
                    Heading::away_from(dx).press(&mut actor.controls);
                }
            }
        }
    }

    pub(super) fn should_jump<R: Rng>(
        &self,
        actor: &Actor,
        target: &ActorView,
        platforms: &[Platform],
        rng: &mut R,
    ) -> bool {
        if target.position.y < actor.position.y - TARGET_ABOVE && rng.gen::<f32>() < 0.4 {
            return true;
        }
        if near_platform_edge(actor, platforms) && rng.gen::<f32>() < 0.5 {
            return true;
        }
        rng.gen::<f32>() < 0.1
    }

    pub(super) fn should_dash<R: Rng>(&self, actor: &Actor, distance: f32, rng: &mut R) -> bool {
        rng.gen::<f32>() < 0.3 && actor.skill == Skill::Dash && distance < DASH_RANGE
    }
}

/// Standing on a platform with the actor's left edge near either end of it.
pub fn near_platform_edge(actor: &Actor, platforms: &[Platform]) -> bool {
    let feet = actor.feet_y();
    let x = actor.position.x;
    platforms.iter().any(|p| {
        let standing = feet >= p.y - STANDING_TOLERANCE && feet <= p.y + STANDING_TOLERANCE;
        standing && ((x - p.x).abs() < EDGE_MARGIN || (x - p.right()).abs() < EDGE_MARGIN)
    })
}
