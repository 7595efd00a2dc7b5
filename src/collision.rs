//! Rotated-platform collision. Actor boxes stay axis-aligned in world space; platforms rotate
//! about their own center. Every test happens in the platform's local (unrotated) frame and the
//! resulting displacement is rotated back into world space.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlatformMap>().add_systems(
            PostUpdate,
            report_platform_map
                .run_if(resource_changed::<PlatformMap>)
                .in_set(CollisionSystems),
        );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollisionSystems;

/// One rectangle of map geometry, in screen-style coordinates (y grows downward, `x`/`y` is the
/// top-left corner of the unrotated rectangle). `angle` is in degrees, clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub angle: f32,
}

impl Platform {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle: 0.0,
        }
    }

    pub const fn rotated(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn radians(&self) -> f32 {
        self.angle.to_radians()
    }

    /// The platform's own rectangle, which is also its footprint in the local frame.
    pub fn local_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.right(), self.y + self.height)
    }

    /// Moves an axis-aligned world box into the platform frame. Only the box center is rotated;
    /// the box keeps its extents.
    pub fn to_local_box(&self, world_box: Rect) -> Rect {
        let center = rotate_about(world_box.center(), self.center(), -self.radians());
        Rect::from_center_half_size(center, world_box.half_size())
    }

    /// Rotates a displacement expressed in the platform frame into world space.
    pub fn to_world_offset(&self, local: Vec2) -> Vec2 {
        rotate(local, self.radians())
    }
}

/// Rotates `v` by `radians` (clockwise on screen because y points down).
pub fn rotate(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}

pub fn rotate_about(point: Vec2, pivot: Vec2, radians: f32) -> Vec2 {
    rotate(point - pivot, radians) + pivot
}

/// Strict overlap: boxes that only share an edge do not collide.
pub fn aabb_overlap(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

pub fn overlaps(actor_box: Rect, platform: &Platform) -> bool {
    aabb_overlap(platform.to_local_box(actor_box), platform.local_rect())
}

/// Signed local-frame displacement that would push `local_box` out of the platform along each
/// axis. The sign picks the side nearest to the box center.
pub fn penetration(local_box: Rect, platform: &Platform) -> Vec2 {
    let bounds = platform.local_rect();
    let center = bounds.center();
    let box_center = local_box.center();

    let x = if box_center.x < center.x {
        bounds.min.x - local_box.max.x
    } else {
        bounds.max.x - local_box.min.x
    };
    let y = if box_center.y < center.y {
        bounds.min.y - local_box.max.y
    } else {
        bounds.max.y - local_box.min.y
    };

    Vec2::new(x, y)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAxis {
    X,
    Y,
}

/// Collision response for one platform: where the box ends up and what is left of its velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Top-left corner of the resolved box.
    pub position: Vec2,
    pub velocity: Vec2,
    pub on_ground: bool,
    pub axis: ResolvedAxis,
}

/// Resolves the prospective `actor_box` against one platform, or `None` if they do not overlap.
///
/// The axis with the smaller absolute penetration wins; a tie resolves vertically, which is what
/// turns a clean corner hit into a landing.
pub fn resolve(actor_box: Rect, velocity: Vec2, platform: &Platform) -> Option<Resolution> {
    let local_box = platform.to_local_box(actor_box);
    if !aabb_overlap(local_box, platform.local_rect()) {
        return None;
    }

    let depth = penetration(local_box, platform);

    let resolution = if depth.x.abs() < depth.y.abs() {
        Resolution {
            position: actor_box.min + platform.to_world_offset(Vec2::new(depth.x, 0.0)),
            velocity: Vec2::new(0.0, velocity.y),
            on_ground: false,
            axis: ResolvedAxis::X,
        }
    } else {
        Resolution {
            position: actor_box.min + platform.to_world_offset(Vec2::new(0.0, depth.y)),
            velocity: Vec2::new(velocity.x, 0.0),
            on_ground: depth.y < 0.0,
            axis: ResolvedAxis::Y,
        }
    };

    Some(resolution)
}

/// Runs [`resolve`] against every platform in list order. Each hit is computed from the same
/// prospective box and overwrites the previous one, so the last colliding platform decides the
/// position. Velocity carries over between hits.
pub fn resolve_against(
    actor_box: Rect,
    velocity: Vec2,
    platforms: &[Platform],
) -> Option<Resolution> {
    let mut current_velocity = velocity;
    let mut last = None;

    for platform in platforms {
        if let Some(resolution) = resolve(actor_box, current_velocity, platform) {
            current_velocity = resolution.velocity;
            last = Some(resolution);
        }
    }

    last
}

/// Read-only platform list shared by the integrator, teleport sampling and every bot.
#[derive(Resource, Default, Debug, Clone)]
pub struct PlatformMap {
    pub name: String,
    pub platforms: Vec<Platform>,
}

impl PlatformMap {
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

fn report_platform_map(map: Res<PlatformMap>) {
    if map.is_empty() {
        warn!("Platform map is empty; actors will only collide with the arena floor.");
        return;
    }

    let rotated = map.platforms.iter().filter(|p| p.angle != 0.0).count();
    info!(
        "Loaded map '{}' with {} platforms ({} rotated).",
        map.name,
        map.platforms.len(),
        rotated
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn actor_box(x: f32, y: f32) -> Rect {
        Rect::new(x, y, x + 35.0, y + 40.0)
    }

    /// Plain axis-aligned version of the response, used as the reference for unrotated platforms.
    fn axis_aligned_response(b: Rect, v: Vec2, p: &Platform) -> Option<(Vec2, Vec2, bool)> {
        let r = p.local_rect();
        if !(b.min.x < r.max.x && b.max.x > r.min.x && b.min.y < r.max.y && b.max.y > r.min.y) {
            return None;
        }
        let ox = if b.center().x < r.center().x {
            r.min.x - b.max.x
        } else {
            r.max.x - b.min.x
        };
        let oy = if b.center().y < r.center().y {
            r.min.y - b.max.y
        } else {
            r.max.y - b.min.y
        };
        if ox.abs() < oy.abs() {
            Some((b.min + Vec2::new(ox, 0.0), Vec2::new(0.0, v.y), false))
        } else {
            Some((b.min + Vec2::new(0.0, oy), Vec2::new(v.x, 0.0), oy < 0.0))
        }
    }

    #[test]
    fn rotate_about_quarter_turn_is_clockwise_on_screen() {
        let rotated = rotate_about(Vec2::new(10.0, 0.0), Vec2::ZERO, 90f32.to_radians());
        assert!((rotated - Vec2::new(0.0, 10.0)).length() < EPS);
    }

    #[test]
    fn overlap_ignores_touching_edges() {
        let platform = Platform::new(0.0, 100.0, 200.0, 20.0);
        assert!(!overlaps(actor_box(10.0, 60.0), &platform));
        assert!(overlaps(actor_box(10.0, 61.0), &platform));
        assert!(!overlaps(actor_box(200.0, 90.0), &platform));
    }

    #[test]
    fn landing_on_flat_platform_grounds_and_stops_fall() {
        let platform = Platform::new(0.0, 100.0, 200.0, 20.0);
        let hit = resolve(actor_box(50.0, 64.0), Vec2::new(3.0, 6.0), &platform)
            .expect("box overlaps the platform top");

        assert_eq!(hit.axis, ResolvedAxis::Y);
        assert!(hit.on_ground);
        assert_eq!(hit.velocity, Vec2::new(3.0, 0.0));
        assert!((hit.position.y + 40.0 - platform.y).abs() < EPS);
        assert!(!overlaps(actor_box(hit.position.x, hit.position.y), &platform));
    }

    #[test]
    fn side_hit_resolves_horizontally() {
        let platform = Platform::new(100.0, 0.0, 40.0, 400.0);
        let hit = resolve(actor_box(68.0, 150.0), Vec2::new(5.0, 1.5), &platform)
            .expect("box overlaps the wall");

        assert_eq!(hit.axis, ResolvedAxis::X);
        assert!(!hit.on_ground);
        assert_eq!(hit.velocity, Vec2::new(0.0, 1.5));
        assert!((hit.position.x + 35.0 - platform.x).abs() < EPS);
    }

    #[test]
    fn ceiling_hit_does_not_ground() {
        let platform = Platform::new(0.0, 100.0, 300.0, 20.0);
        let hit = resolve(actor_box(100.0, 115.0), Vec2::new(0.0, -8.0), &platform)
            .expect("box overlaps the underside");

        assert_eq!(hit.axis, ResolvedAxis::Y);
        assert!(!hit.on_ground);
        assert_eq!(hit.velocity.y, 0.0);
        assert!((hit.position.y - platform.local_rect().max.y).abs() < EPS);
    }

    #[test]
    fn equal_penetration_treats_corner_as_landing() {
        let platform = Platform::new(100.0, 100.0, 100.0, 100.0);
        // Both penetrations are exactly 5 units.
        let hit = resolve(
            Rect::new(70.0, 65.0, 105.0, 105.0),
            Vec2::new(2.0, 2.0),
            &platform,
        )
        .expect("corner overlap");

        assert_eq!(hit.axis, ResolvedAxis::Y);
        assert!(hit.on_ground);
    }

    #[test]
    fn contained_on_resolved_axis_for_unrotated_platforms() {
        let platform = Platform::new(200.0, 300.0, 150.0, 30.0);
        for ix in 0..24 {
            for iy in 0..16 {
                let x = 160.0 + ix as f32 * 8.0;
                let y = 255.0 + iy as f32 * 5.0;
                let b = actor_box(x, y);
                let Some(hit) = resolve(b, Vec2::new(4.0, 7.0), &platform) else {
                    continue;
                };
                let resolved = actor_box(hit.position.x, hit.position.y);
                let r = platform.local_rect();
                match hit.axis {
                    ResolvedAxis::X => {
                        assert_eq!(hit.velocity.x, 0.0);
                        assert!(resolved.max.x <= r.min.x + EPS || resolved.min.x >= r.max.x - EPS);
                    }
                    ResolvedAxis::Y => {
                        assert_eq!(hit.velocity.y, 0.0);
                        assert!(resolved.max.y <= r.min.y + EPS || resolved.min.y >= r.max.y - EPS);
                    }
                }
            }
        }
    }

    #[test]
    fn zero_rotation_matches_axis_aligned_reference() {
        let platform = Platform::new(200.0, 300.0, 150.0, 30.0).rotated(0.0);
        let velocity = Vec2::new(-3.0, 9.0);
        for ix in 0..30 {
            for iy in 0..20 {
                let b = actor_box(150.0 + ix as f32 * 7.0, 250.0 + iy as f32 * 5.0);
                let expected = axis_aligned_response(b, velocity, &platform);
                let actual = resolve(b, velocity, &platform)
                    .map(|hit| (hit.position, hit.velocity, hit.on_ground));
                match (expected, actual) {
                    (None, None) => {}
                    (Some(e), Some(a)) => {
                        assert!((e.0 - a.0).length() < EPS);
                        assert_eq!(e.1, a.1);
                        assert_eq!(e.2, a.2);
                    }
                    other => panic!("mismatch at {b:?}: {other:?}"),
                }
            }
        }
    }

    #[test]
    fn full_turn_behaves_like_no_rotation() {
        let flat = Platform::new(0.0, 100.0, 200.0, 20.0);
        let spun = flat.rotated(360.0);
        let b = actor_box(40.0, 70.0);
        let a = resolve(b, Vec2::new(0.0, 5.0), &flat).unwrap();
        let c = resolve(b, Vec2::new(0.0, 5.0), &spun).unwrap();
        assert!((a.position - c.position).length() < EPS);
        assert_eq!(a.on_ground, c.on_ground);
    }

    #[test]
    fn quarter_turn_swaps_footprint() {
        // A 200x20 bar rotated 90 degrees stands upright around its center (100, 110).
        let bar = Platform::new(0.0, 100.0, 200.0, 20.0).rotated(90.0);
        // Far outside the unrotated footprint but inside the rotated one.
        assert!(overlaps(Rect::new(95.0, 20.0, 105.0, 30.0), &bar));
        // Inside the unrotated footprint, outside the rotated one.
        assert!(!overlaps(Rect::new(10.0, 105.0, 20.0, 115.0), &bar));
    }

    #[test]
    fn resolution_on_rotated_platform_pushes_along_platform_normal() {
        let ramp = Platform::new(0.0, 100.0, 200.0, 20.0).rotated(30.0);
        let b = Rect::from_center_half_size(Vec2::new(100.0, 95.0), Vec2::new(17.5, 20.0));
        let hit = resolve(b, Vec2::new(0.0, 4.0), &ramp).expect("box sits inside the ramp");

        let push = hit.position - b.min;
        let normal = rotate(Vec2::new(0.0, -1.0), ramp.radians());
        assert!(push.normalize().dot(normal) > 0.999);
        assert!(hit.on_ground);
    }

    #[test]
    fn last_colliding_platform_wins() {
        let floor = Platform::new(0.0, 100.0, 400.0, 20.0);
        let wall = Platform::new(80.0, 0.0, 20.0, 200.0);
        let b = actor_box(50.0, 62.0);

        let floor_only = resolve(b, Vec2::new(5.0, 5.0), &floor).unwrap();
        let both = resolve_against(b, Vec2::new(5.0, 5.0), &[floor, wall]).unwrap();

        assert_eq!(floor_only.axis, ResolvedAxis::Y);
        assert_eq!(both.axis, ResolvedAxis::X);
        assert!(!both.on_ground);
        // Velocity is chained: the floor hit zeroed vy, the wall hit zeroed vx.
        assert_eq!(both.velocity, Vec2::ZERO);
    }

    #[test]
    fn no_platforms_means_no_response() {
        assert!(resolve_against(actor_box(0.0, 0.0), Vec2::ONE, &[]).is_none());
    }
}
