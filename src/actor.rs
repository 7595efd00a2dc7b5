//! Actor data model: the physics body, skill bookkeeping and control intent of one contestant.
//! Humans and bots share this component; only the source of [`ControlIntent`] differs.

use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{ACTOR_HEIGHT, ACTOR_WIDTH, IMMUNITY_TIME, MAX_JUMPS_WITH_DOUBLE_JUMP};

/// Movement ability picked before the match. Never changes mid-match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skill {
    #[default]
    None,
    Dash,
    Teleport,
    DoubleJump,
}

/// The four buttons an actor acts on. Written by an input source or a bot, read once per tick by
/// the integrator and left standing until overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub dash: bool,
    /// `up` as seen by the previous integration tick. Owned by the integrator.
    pub was_up_pressed: bool,
}

impl ControlIntent {
    /// Releases every button. The jump latch is left alone so a held `up` is not re-triggered.
    pub fn release_all(&mut self) {
        self.left = false;
        self.right = false;
        self.up = false;
        self.dash = false;
    }

    pub fn up_just_pressed(&self) -> bool {
        self.up && !self.was_up_pressed
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillState {
    pub dashing: bool,
    pub dash_expires_at: Option<Duration>,
    pub jump_count: u8,
    pub max_jumps: u8,
    pub last_dash_at: Option<Duration>,
    pub last_teleport_at: Option<Duration>,
    pub last_double_jump_at: Option<Duration>,
}

/// The visible part of the viewport in world space. Actors are kept inside it horizontally and
/// the bottom edge is the arena floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub camera_x: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(camera_x: f32, width: f32, height: f32) -> Self {
        Self {
            camera_x,
            width,
            height,
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Actor {
    /// Top-left corner of the bounding box, y growing downward.
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub on_ground: bool,
    pub is_it: bool,
    pub last_tagged_at: Option<Duration>,
    pub skill: Skill,
    pub skills: SkillState,
    pub controls: ControlIntent,
}

impl Actor {
    pub fn new(position: Vec2, skill: Skill) -> Self {
        let max_jumps = if skill == Skill::DoubleJump {
            MAX_JUMPS_WITH_DOUBLE_JUMP
        } else {
            1
        };

        Self {
            position,
            size: Vec2::new(ACTOR_WIDTH, ACTOR_HEIGHT),
            velocity: Vec2::ZERO,
            on_ground: false,
            is_it: false,
            last_tagged_at: None,
            skill,
            skills: SkillState {
                max_jumps,
                ..default()
            },
            controls: ControlIntent::default(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds_at(self.position)
    }

    pub fn bounds_at(&self, position: Vec2) -> Rect {
        Rect::from_corners(position, position + self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    pub fn feet_y(&self) -> f32 {
        self.position.y + self.size.y
    }

    /// Grounds the actor. The jump counter resets together with the flag.
    pub fn land(&mut self) {
        self.on_ground = true;
        self.skills.jump_count = 0;
    }

    pub fn is_dashing(&self) -> bool {
        self.skills.dashing
    }

    pub fn is_immune(&self, now: Duration) -> bool {
        self.last_tagged_at
            .is_some_and(|at| now.saturating_sub(at) < IMMUNITY_TIME)
    }

    pub fn view(&self) -> ActorView {
        ActorView {
            position: self.position,
            velocity: self.velocity,
            is_it: self.is_it,
        }
    }
}

/// Read-only snapshot of another actor, as handed to bots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorView {
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_it: bool,
}

impl ActorView {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            is_it: false,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// `true` when a cooldown that last fired at `last` has elapsed by `now`. A skill that never
/// fired is always ready.
pub fn cooldown_ready(last: Option<Duration>, cooldown: Duration, now: Duration) -> bool {
    last.map_or(true, |at| now.saturating_sub(at) >= cooldown)
}
