//! Side-scrolling camera. The simulation only cares about `ArenaCamera::x`, because actors are
//! clamped to the visible slice of the arena. The Bevy camera entity mirrors it for rendering.

use bevy::prelude::*;
use bevy::render::camera::ScalingMode;

use crate::actor::{Actor, Viewport};
use crate::constants::{ARENA_WIDTH_IN_VIEWS, CAMERA_SMOOTHING, VIEW_HEIGHT, VIEW_WIDTH};
use crate::movement::HumanControlled;
use crate::player::ActorSlot;
use crate::state::GameSet;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArenaCamera>()
            .add_systems(Startup, spawn_camera)
            .add_systems(FixedUpdate, follow_focus_actor.in_set(GameSet::Camera))
            .add_systems(
                Update,
                sync_camera_transform.run_if(resource_changed::<ArenaCamera>),
            );
    }
}

/// Marker for the rendering camera.
#[derive(Component)]
pub struct FollowCamera;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ArenaCamera {
    /// Left edge of the visible slice, in world units.
    pub x: f32,
    pub view_width: f32,
    pub view_height: f32,
    pub arena_width: f32,
}

impl Default for ArenaCamera {
    fn default() -> Self {
        Self::new(VIEW_WIDTH, VIEW_HEIGHT)
    }
}

impl ArenaCamera {
    pub fn new(view_width: f32, view_height: f32) -> Self {
        Self {
            x: 0.0,
            view_width,
            view_height,
            arena_width: view_width * ARENA_WIDTH_IN_VIEWS,
        }
    }

    /// Stretches the arena to at least `right_edge`, so platforms past three views stay in reach.
    pub fn widened_to(mut self, right_edge: f32) -> Self {
        self.arena_width = self.arena_width.max(right_edge);
        self
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.x, self.view_width, self.view_height)
    }

    pub fn max_x(&self) -> f32 {
        (self.arena_width - self.view_width).max(0.0)
    }

    /// Eases toward centering `focus_x`, then clamps to the arena.
    pub fn follow(&mut self, focus_x: f32) {
        let target = focus_x - self.view_width * 0.5;
        self.x += (target - self.x) * CAMERA_SMOOTHING;
        self.x = self.x.clamp(0.0, self.max_x());
    }
}

/// Converts a top-left, y-down world box into a Bevy translation for its center.
pub fn world_to_translation(position: Vec2, size: Vec2, z: f32) -> Vec3 {
    Vec3::new(position.x + size.x * 0.5, -(position.y + size.y * 0.5), z)
}

fn spawn_camera(mut commands: Commands, arena: Res<ArenaCamera>) {
    let mut camera = Camera2dBundle::default();
    camera.projection.scaling_mode = ScalingMode::Fixed {
        width: arena.view_width,
        height: arena.view_height,
    };
    camera.transform.translation.x = arena.x + arena.view_width * 0.5;
    camera.transform.translation.y = -arena.view_height * 0.5;

    commands.spawn((Name::new("MainCamera"), camera, FollowCamera));
}

/// Follows the first human actor, or the first actor when everyone is a bot.
fn follow_focus_actor(
    mut arena: ResMut<ArenaCamera>,
    actors: Query<(&Actor, &ActorSlot, Option<&HumanControlled>)>,
) {
    let focus = actors
        .iter()
        .filter(|(_, _, human)| human.is_some())
        .min_by_key(|(_, slot, _)| slot.0)
        .or_else(|| actors.iter().min_by_key(|(_, slot, _)| slot.0));

    if let Some((actor, _, _)) = focus {
        arena.follow(actor.position.x);
    }
}

fn sync_camera_transform(
    arena: Res<ArenaCamera>,
    mut camera_query: Query<(&mut Transform, &mut OrthographicProjection), With<FollowCamera>>,
) {
    let Ok((mut transform, mut projection)) = camera_query.get_single_mut() else {
        return;
    };

    // The view size can change between matches.
    if let ScalingMode::Fixed { width, height } = projection.scaling_mode {
        if width != arena.view_width || height != arena.view_height {
            projection.scaling_mode = ScalingMode::Fixed {
                width: arena.view_width,
                height: arena.view_height,
            };
        }
    }

    transform.translation.x = arena.x + arena.view_width * 0.5;
    transform.translation.y = -arena.view_height * 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_eases_toward_focus() {
        let mut camera = ArenaCamera::new(1000.0, 500.0);
        camera.follow(1500.0);
        assert!((camera.x - 100.0).abs() < 1e-4);
        camera.follow(1500.0);
        assert!((camera.x - 190.0).abs() < 1e-4);
    }

    #[test]
    fn follow_stays_inside_arena() {
        let mut camera = ArenaCamera::new(1000.0, 500.0);
        camera.follow(0.0);
        assert_eq!(camera.x, 0.0);

        for _ in 0..500 {
            camera.follow(10_000.0);
        }
        assert_eq!(camera.x, camera.max_x());
        assert_eq!(camera.max_x(), 2000.0);
    }

    #[test]
    fn wide_maps_widen_the_arena() {
        let camera = ArenaCamera::new(1000.0, 500.0);
        assert_eq!(camera.clone().widened_to(1200.0).arena_width, 3000.0);

        let mut wide = camera.widened_to(4500.0);
        assert_eq!(wide.arena_width, 4500.0);
        for _ in 0..500 {
            wide.follow(10_000.0);
        }
        assert_eq!(wide.x, 3500.0);
    }

    #[test]
    fn translation_flips_y_and_centers_box() {
        let t = world_to_translation(Vec2::new(10.0, 20.0), Vec2::new(4.0, 6.0), 2.0);
        assert_eq!(t, Vec3::new(12.0, -23.0, 2.0));
    }
}
