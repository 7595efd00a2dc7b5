//! Gameplay tuning. Distances are world units (one unit per pixel of the 1920×1080 reference view),
//! velocities are units per tick, and the tick runs at [`TICK_HZ`].

use std::time::Duration;

pub const TICK_HZ: f64 = 60.0;

// Movement
pub const GRAVITY: f32 = 0.5;
pub const JUMP_FORCE: f32 = -12.0;
pub const MOVE_SPEED: f32 = 5.0;
pub const GROUND_DAMPING: f32 = 0.8;

// Actor box
pub const ACTOR_WIDTH: f32 = 35.0;
pub const ACTOR_HEIGHT: f32 = 40.0;

// Dash
pub const DASH_SPEED: f32 = 15.0;
pub const DASH_COOLDOWN: Duration = Duration::from_millis(1000);
pub const DASH_DURATION: Duration = Duration::from_millis(200);

// Teleport
pub const TELEPORT_COOLDOWN: Duration = Duration::from_millis(2000);
pub const TELEPORT_ATTEMPTS: u32 = 50;
/// Candidates are never sampled in the bottom strip of this height.
pub const TELEPORT_FLOOR_MARGIN: f32 = 100.0;
/// How far below a platform top the candidate's feet may sit and still count as standing on it.
pub const TELEPORT_LANDING_TOLERANCE: f32 = 10.0;

// Double jump
pub const DOUBLE_JUMP_FORCE: f32 = -15.0;
pub const DOUBLE_JUMP_COOLDOWN: Duration = Duration::from_millis(800);
pub const MAX_JUMPS_WITH_DOUBLE_JUMP: u8 = 2;

// Match rules
pub const IMMUNITY_TIME: Duration = Duration::from_millis(1000);
pub const MATCH_SECONDS: u32 = 60;
pub const MAX_ACTORS: usize = 4;
pub const SPAWN_FLOOR_OFFSET: f32 = 100.0;

// View / camera
pub const VIEW_WIDTH: f32 = 1920.0;
pub const VIEW_HEIGHT: f32 = 1080.0;
pub const ARENA_WIDTH_IN_VIEWS: f32 = 3.0;
pub const CAMERA_SMOOTHING: f32 = 0.1;
