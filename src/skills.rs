//! Skill activations. Every handler is a silent no-op when its cooldown has not elapsed or a
//! precondition fails; cooldowns are stamped only on a successful activation.

use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use crate::actor::{cooldown_ready, Actor, Skill, Viewport};
use crate::collision::Platform;
use crate::constants::{
    DASH_COOLDOWN, DASH_DURATION, DASH_SPEED, DOUBLE_JUMP_COOLDOWN, DOUBLE_JUMP_FORCE,
    TELEPORT_ATTEMPTS, TELEPORT_COOLDOWN, TELEPORT_FLOOR_MARGIN, TELEPORT_LANDING_TOLERANCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashDirection {
    Left,
    Right,
    Up,
}

impl DashDirection {
    /// Up wins while `up` is held; otherwise keep going the way the actor is moving, defaulting
    /// to left when standing still.
    pub fn from_intent(actor: &Actor) -> Self {
        if actor.controls.up {
            Self::Up
        } else if actor.velocity.x > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }
}

pub fn try_dash(actor: &mut Actor, direction: DashDirection, now: Duration) -> bool {
    if actor.skill != Skill::Dash
        || actor.skills.dashing
        || !cooldown_ready(actor.skills.last_dash_at, DASH_COOLDOWN, now)
    {
        return false;
    }

    actor.skills.dashing = true;
    actor.skills.dash_expires_at = Some(now + DASH_DURATION);
    actor.skills.last_dash_at = Some(now);

    actor.velocity = match direction {
        DashDirection::Left => Vec2::new(-DASH_SPEED, 0.0),
        DashDirection::Right => Vec2::new(DASH_SPEED, 0.0),
        DashDirection::Up => Vec2::new(0.0, -DASH_SPEED),
    };

    debug!("dash {:?} at {:?}", direction, now);
    true
}

/// Clears the dashing flag once its expiry has been reached.
pub fn expire_dash(actor: &mut Actor, now: Duration) {
    if let Some(expires_at) = actor.skills.dash_expires_at {
        if now >= expires_at {
            actor.skills.dashing = false;
            actor.skills.dash_expires_at = None;
        }
    }
}

/// Moves the actor to a random spot in view that rests on a platform. Gives up after
/// [`TELEPORT_ATTEMPTS`] candidates without touching any state.
pub fn try_teleport<R: Rng>(
    actor: &mut Actor,
    platforms: &[Platform],
    viewport: Viewport,
    now: Duration,
    rng: &mut R,
) -> bool {
    if actor.skill != Skill::Teleport
        || !cooldown_ready(actor.skills.last_teleport_at, TELEPORT_COOLDOWN, now)
    {
        return false;
    }

    let span_x = (viewport.width - actor.size.x).max(0.0);
    let span_y = (viewport.height - actor.size.y - TELEPORT_FLOOR_MARGIN).max(0.0);

    for _ in 0..TELEPORT_ATTEMPTS {
        let candidate = Vec2::new(
            viewport.camera_x + rng.gen::<f32>() * span_x,
            rng.gen::<f32>() * span_y,
        );

        if is_safe_landing(candidate, actor.size, platforms) {
            actor.position = candidate;
            actor.velocity = Vec2::ZERO;
            actor.skills.last_teleport_at = Some(now);
            debug!("teleport to {:?} at {:?}", candidate, now);
            return true;
        }
    }

    debug!("teleport found no landing spot");
    false
}

/// A spot is safe when the box horizontally overlaps a platform and its feet sit on that
/// platform's top edge, allowing a few units of sinking.
pub fn is_safe_landing(position: Vec2, size: Vec2, platforms: &[Platform]) -> bool {
    let feet = position.y + size.y;
    platforms.iter().any(|platform| {
        position.x < platform.right()
            && position.x + size.x > platform.x
            && feet >= platform.y
            && feet <= platform.y + TELEPORT_LANDING_TOLERANCE
    })
}

/// Jump handler for double-jump actors. The grounded jump is free; the air jump needs a spare
/// jump slot and its own cooldown.
pub fn double_jump(actor: &mut Actor, now: Duration) -> bool {
    if actor.on_ground {
        actor.velocity.y = DOUBLE_JUMP_FORCE;
        actor.on_ground = false;
        actor.skills.jump_count = 1;
        return true;
    }

    if actor.skill == Skill::DoubleJump
        && actor.skills.jump_count < actor.skills.max_jumps
        && cooldown_ready(actor.skills.last_double_jump_at, DOUBLE_JUMP_COOLDOWN, now)
    {
        actor.velocity.y = DOUBLE_JUMP_FORCE;
        actor.skills.jump_count += 1;
        actor.skills.last_double_jump_at = Some(now);
        debug!("air jump {} at {:?}", actor.skills.jump_count, now);
        return true;
    }

    false
}

/// Time until the actor's skill can fire again, zero when ready. `None` for actors without a
/// skill.
pub fn cooldown_remaining(actor: &Actor, now: Duration) -> Option<Duration> {
    let (last, cooldown) = match actor.skill {
        Skill::None => return None,
        Skill::Dash => (actor.skills.last_dash_at, DASH_COOLDOWN),
        Skill::Teleport => (actor.skills.last_teleport_at, TELEPORT_COOLDOWN),
        Skill::DoubleJump => (actor.skills.last_double_jump_at, DOUBLE_JUMP_COOLDOWN),
    };
    Some(last.map_or(Duration::ZERO, |at| {
        cooldown.saturating_sub(now.saturating_sub(at))
    }))
}
