use std::time::Duration;

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;
use rand::Rng;

use crate::actor::{Actor, Skill, Viewport};
use crate::camera::ArenaCamera;
use crate::collision::{self, Platform, PlatformMap};
use crate::config::MatchRng;
use crate::constants::{GRAVITY, GROUND_DAMPING, JUMP_FORCE, MOVE_SPEED};
use crate::skills::{self, DashDirection};
use crate::state::{GameSet, GameState};

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MovementSettings>().add_systems(
            FixedUpdate,
            (
                read_human_input.in_set(GameSet::Input),
                integrate_actors.in_set(GameSet::Movement),
            )
                .run_if(in_state(GameState::Playing)),
        );
    }
}

#[derive(Resource, Debug, Clone)]
pub struct MovementSettings {
    pub gravity: f32,
    pub jump_force: f32,
    pub move_speed: f32,
    /// Horizontal velocity multiplier applied each tick while no direction is held.
    pub damping: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_force: JUMP_FORCE,
            move_speed: MOVE_SPEED,
            damping: GROUND_DAMPING,
        }
    }
}

/// Marks an actor driven by the keyboard.
#[derive(Component, Debug, Clone, Copy)]
pub struct HumanControlled {
    pub keys: KeyScheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyScheme {
    pub up: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub skill: KeyCode,
}

impl KeyScheme {
    /// Keyboard layout for the human in roster slot `slot`. Slots past the fourth reuse the last
    /// layout.
    pub fn for_slot(slot: usize) -> Self {
        match slot {
            0 => Self {
                up: KeyCode::KeyW,
                left: KeyCode::KeyA,
                right: KeyCode::KeyD,
                skill: KeyCode::KeyE,
            },
            1 => Self {
                up: KeyCode::ArrowUp,
                left: KeyCode::ArrowLeft,
                right: KeyCode::ArrowRight,
                skill: KeyCode::Slash,
            },
            2 => Self {
                up: KeyCode::KeyI,
                left: KeyCode::KeyJ,
                right: KeyCode::KeyL,
                skill: KeyCode::KeyO,
            },
            _ => Self {
                up: KeyCode::Numpad8,
                left: KeyCode::Numpad4,
                right: KeyCode::Numpad6,
                skill: KeyCode::Numpad9,
            },
        }
    }
}

impl Actor {
    /// Advances the actor by one tick.
    ///
    /// Order matters: skills, horizontal input, gravity, jump, then the collision-constrained
    /// position update and finally the view/floor clamp.
    pub fn integrate<R: Rng>(
        &mut self,
        settings: &MovementSettings,
        platforms: &[Platform],
        viewport: Viewport,
        now: Duration,
        rng: &mut R,
    ) {
        skills::expire_dash(self, now);

        if self.controls.dash {
            match self.skill {
                Skill::Dash => {
                    let direction = DashDirection::from_intent(self);
                    skills::try_dash(self, direction, now);
                }
                Skill::Teleport => {
                    skills::try_teleport(self, platforms, viewport, now, rng);
                }
                Skill::DoubleJump | Skill::None => {}
            }
        }

        if !self.skills.dashing {
            let right_limit = viewport.camera_x + viewport.width - self.size.x;
            if self.controls.left && self.position.x > viewport.camera_x {
                self.velocity.x = -settings.move_speed;
            } else if self.controls.right && self.position.x < right_limit {
                self.velocity.x = settings.move_speed;
            } else {
                self.velocity.x *= settings.damping;
            }
        }

        // Gravity applies even when grounded; collision puts the actor back on the surface.
        self.velocity.y += settings.gravity;

        if self.controls.up_just_pressed() {
            if self.skill == Skill::DoubleJump {
                skills::double_jump(self, now);
            } else if self.on_ground {
                self.velocity.y = settings.jump_force;
                self.on_ground = false;
            }
        }
        self.controls.was_up_pressed = self.controls.up;

        let prospective = self.position + self.velocity;
        match collision::resolve_against(self.bounds_at(prospective), self.velocity, platforms) {
            Some(hit) => {
                self.position = hit.position;
                self.velocity = hit.velocity;
                if hit.on_ground {
                    self.land();
                } else {
                    self.on_ground = false;
                }
            }
            None => {
                self.position = prospective;
                self.on_ground = false;
            }
        }

        self.clamp_to(viewport);
    }

    fn clamp_to(&mut self, viewport: Viewport) {
        let right_limit = viewport.camera_x + viewport.width - self.size.x;
        if self.position.x < viewport.camera_x {
            self.position.x = viewport.camera_x;
        }
        if self.position.x > right_limit {
            self.position.x = right_limit;
        }

        let floor = viewport.height - self.size.y;
        if self.position.y > floor {
            self.position.y = floor;
            self.velocity.y = 0.0;
            self.land();
        }
    }
}

fn read_human_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<(&HumanControlled, &mut Actor)>,
) {
    for (human, mut actor) in &mut query {
        let keys = human.keys;
        actor.controls.left = keyboard.pressed(keys.left);
        actor.controls.right = keyboard.pressed(keys.right);
        actor.controls.up = keyboard.pressed(keys.up);
        actor.controls.dash = keyboard.pressed(keys.skill);
    }
}

fn integrate_actors(
    time: Res<Time>,
    settings: Res<MovementSettings>,
    platforms: Res<PlatformMap>,
    camera: Res<ArenaCamera>,
    mut rng: ResMut<MatchRng>,
    mut query: Query<&mut Actor>,
) {
    let now = time.elapsed();
    let viewport = camera.viewport();

    for mut actor in &mut query {
        actor.integrate(&settings, &platforms.platforms, viewport, now, &mut rng.0);
    }
}
