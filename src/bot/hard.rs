use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use super::path::LineOfSight;
use super::{
    highest_scoring, platform_anchor, reverse_horizontal, waited_longer_than, Heading,
    MotionHistory,
};
use crate::actor::{Actor, ActorView, ControlIntent};
use crate::collision::Platform;
use crate::constants::MOVE_SPEED;

const STRATEGY_REFRESH: Duration = Duration::from_millis(2000);
const PREDICTION_MIN_SAMPLES: usize = 2;
const PREDICTION_WINDOW: usize = 3;
const PREDICTION_TICKS: f32 = 5.0;

const INTERCEPT_BEYOND: f32 = 300.0;
const DIRECT_WITHIN: f32 = 100.0;
const EMERGENCY_WITHIN: f32 = 150.0;
const PLATFORM_ESCAPE_WITHIN: f32 = 300.0;

const PATH_RANGE: f32 = 300.0;
const ESCAPE_PROBE_STEP: f32 = 50.0;
const ESCAPE_PROBE_STEPS: usize = 6;
const ESCAPE_PROBE_HEIGHT: f32 = 100.0;
const CORNER_REACH: f32 = 50.0;
const OBSTACLE_LOOKAHEAD: f32 = 100.0;
const TARGET_ABOVE: f32 = 30.0;
const REFUGE_ABOVE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardStrategy {
    Direct,
    Predict,
    Intercept,
    EmergencyEscape,
    PlatformEscape,
    Position,
}

impl HardStrategy {
    pub fn for_situation(is_it: bool, distance: f32) -> Self {
        if is_it {
            if distance > INTERCEPT_BEYOND {
                Self::Intercept
            } else if distance < DIRECT_WITHIN {
                Self::Direct
            } else {
                Self::Predict
            }
        } else if distance < EMERGENCY_WITHIN {
            Self::EmergencyEscape
        } else if distance < PLATFORM_ESCAPE_WITHIN {
            Self::PlatformEscape
        } else {
            Self::Position
        }
    }

    /// Whether the strategy is one a chaser uses.
    pub fn chases(self) -> bool {
        matches!(self, Self::Direct | Self::Predict | Self::Intercept)
    }
}

/// Commits to a strategy for two seconds at a time and plans around platforms. A tag in
/// either direction re-picks the strategy on the next decision.
#[derive(Debug, Clone)]
pub struct HardBrain {
    pub history: MotionHistory,
    pub strategy: HardStrategy,
    pub line_of_sight: LineOfSight,
    strategy_since: Option<Duration>,
}

impl HardBrain {
    pub fn new(history_len: usize) -> Self {
        Self {
            history: MotionHistory::new(history_len),
            strategy: HardStrategy::Direct,
            line_of_sight: LineOfSight::default(),
            strategy_since: None,
        }
    }

    /// Runs once per decision, before the controls are rewritten.
    pub(super) fn prepare(&mut self, actor: &Actor, target: &ActorView, now: Duration) {
        self.history.record(target, now);

        let role_changed = self.strategy.chases() != actor.is_it;
        if role_changed || waited_longer_than(self.strategy_since, STRATEGY_REFRESH, now) {
            self.strategy_since = Some(now);
            let distance = actor.position.distance(target.position);
            let next = HardStrategy::for_situation(actor.is_it, distance);
            if next != self.strategy {
                debug!("Hard bot switched to {next:?} at distance {distance:.0}");
            }
            self.strategy = next;
        }
    }

    pub fn predict(&self, target: &ActorView) -> Vec2 {
        if self.history.len() < PREDICTION_MIN_SAMPLES {
            return target.position;
        }
        target.position + self.history.mean_velocity(PREDICTION_WINDOW) * PREDICTION_TICKS
    }

    /// Predicted position pushed further along the target's current velocity by the time it
    /// takes to run there.
    pub fn interception_point(&self, actor: &Actor, target: &ActorView) -> Vec2 {
        let predicted = self.predict(target);
        let time_to_reach = predicted.distance(actor.position) / MOVE_SPEED;
        predicted + target.velocity * time_to_reach
    }

    /// Platform top corners and the goal that are in range and unobstructed, nearest first.
    pub fn waypoints(&self, actor: &Actor, goal: Vec2, platforms: &[Platform]) -> Vec<Vec2> {
        let from = actor.position;
        let mut points: Vec<Vec2> = platforms
            .iter()
            .flat_map(|p| [Vec2::new(p.x, p.y), Vec2::new(p.right(), p.y)])
            .chain(std::iter::once(goal))
            .filter(|point| self.reachable(from, *point, platforms))
            .collect();
        points.sort_by(|a, b| from.distance(*a).total_cmp(&from.distance(*b)));
        points
    }

    fn reachable(&self, from: Vec2, to: Vec2, platforms: &[Platform]) -> bool {
        from.distance(to) <= PATH_RANGE
            && !platforms
                .iter()
                .any(|p| self.line_of_sight.blocked(from, to, p.local_rect()))
    }

    pub(super) fn steer(&self, actor: &mut Actor, target: &ActorView, platforms: &[Platform]) {
        let x = actor.position.x;
        let away = Heading::away_from(target.position.x - x);

        let heading = match (actor.is_it, self.strategy) {
            (true, HardStrategy::Direct) => Some(Heading::toward(target.position.x - x)),
            (true, HardStrategy::Predict) => Some(Heading::toward(self.predict(target).x - x)),
            (true, HardStrategy::Intercept) => {
                let goal = self.interception_point(actor, target);
                Some(
                    self.waypoints(actor, goal, platforms)
                        .first()
                        .map_or(Heading::toward(goal.x - x), |next| {
                            Heading::toward(next.x - x)
                        }),
                )
            }
            (false, HardStrategy::EmergencyEscape) => {
                if safest_platform(actor, target, platforms)
                    .is_some_and(|p| p.y < actor.position.y - REFUGE_ABOVE)
                {
                    actor.controls.up = true;
                }
                Some(emergency_heading(actor, target, platforms))
            }
            (false, HardStrategy::PlatformEscape) => Some(
                safest_platform(actor, target, platforms)
                    .map_or(away, |p| Heading::toward(platform_anchor(p).x - x)),
            ),
            (false, HardStrategy::Position) => Some(
                strategic_position(target, platforms)
                    .map_or(away, |spot| Heading::toward(spot.x - x)),
            ),
            // Only reachable when `prepare` has not run since the role changed.
            _ => None,
        };

        if let Some(heading) = heading {
            heading.press(&mut actor.controls);
        }
    }

    pub(super) fn should_jump(
        &self,
        actor: &Actor,
        target: &ActorView,
        platforms: &[Platform],
    ) -> bool {
        if actor.is_it && self.predict(target).y < actor.position.y - TARGET_ABOVE {
            return true;
        }
        if !actor.is_it && in_corner(actor, platforms) {
            return true;
        }
        obstacle_ahead(actor, platforms)
    }

    pub(super) fn should_dash(actor: &Actor, distance: f32) -> bool {
        if actor.is_it {
            distance < 200.0 && distance > 50.0
        } else {
            distance < 100.0
        }
    }

    /// Jumps, and half the time turns around.
    pub(super) fn escape<R: Rng>(actor: &mut Actor, previous: &ControlIntent, rng: &mut R) {
        actor.controls.up = true;
        if rng.gen::<f32>() > 0.5 {
            reverse_horizontal(&mut actor.controls, previous);
        }
    }
}

/// Units of platform floor found stepping 50 units at a time up to 300 units in `heading`.
pub fn escape_space(actor: &Actor, heading: Heading, platforms: &[Platform]) -> f32 {
    let y = actor.position.y;
    (1..=ESCAPE_PROBE_STEPS)
        .map(|step| actor.position.x + heading.sign() * ESCAPE_PROBE_STEP * step as f32)
        .filter(|probe| {
            platforms.iter().any(|p| {
                *probe >= p.x && *probe <= p.right() && (p.y - y).abs() < ESCAPE_PROBE_HEIGHT
            })
        })
        .count() as f32
        * ESCAPE_PROBE_STEP
}

/// Away from the chaser unless that side has less than half the floor of the other.
pub fn emergency_heading(actor: &Actor, target: &ActorView, platforms: &[Platform]) -> Heading {
    let left = escape_space(actor, Heading::Left, platforms);
    let right = escape_space(actor, Heading::Right, platforms);

    if target.position.x - actor.position.x > 0.0 {
        if left > right / 2.0 {
            Heading::Left
        } else {
            Heading::Right
        }
    } else if right > left / 2.0 {
        Heading::Right
    } else {
        Heading::Left
    }
}

/// Far from the chaser, near the bot.
pub fn safest_platform<'a>(
    actor: &Actor,
    target: &ActorView,
    platforms: &'a [Platform],
) -> Option<&'a Platform> {
    highest_scoring(platforms, |p| {
        let anchor = platform_anchor(p);
        anchor.distance(target.position) - anchor.distance(actor.position) / 2.0
    })
}

/// Top-center of the platform that is far from the chaser, high relative to it, and wide.
pub fn strategic_position(target: &ActorView, platforms: &[Platform]) -> Option<Vec2> {
    highest_scoring(platforms, |p| {
        0.5 * platform_anchor(p).distance(target.position)
            + 0.3 * (target.position.y - p.y)
            + 0.2 * p.width
    })
    .map(platform_anchor)
}

fn in_corner(actor: &Actor, platforms: &[Platform]) -> bool {
    let Vec2 { x, y } = actor.position;
    let left_blocked = platforms
        .iter()
        .any(|p| p.x > x - CORNER_REACH && p.x < x && (p.y - y).abs() < CORNER_REACH);
    let right_blocked = platforms.iter().any(|p| {
        p.right() > x && p.right() < x + CORNER_REACH && (p.y - y).abs() < CORNER_REACH
    });
    left_blocked || right_blocked
}

fn obstacle_ahead(actor: &Actor, platforms: &[Platform]) -> bool {
    let ahead = if actor.controls.right {
        OBSTACLE_LOOKAHEAD
    } else {
        -OBSTACLE_LOOKAHEAD
    };
    let future_x = actor.position.x + ahead;
    let y = actor.position.y;

    platforms.iter().any(|p| {
        p.y < y + actor.size.y * 1.5 && p.y > y && future_x > p.x && future_x < p.right()
    })
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::actor::Skill;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn target(x: f32, y: f32, vx: f32) -> ActorView {
        ActorView {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, 0.0),
            is_it: false,
        }
    }

    fn chaser_at(x: f32, y: f32) -> Actor {
        let mut actor = Actor::new(Vec2::new(x, y), Skill::None);
        actor.is_it = true;
        actor
    }

    #[test]
    fn strategy_bands_follow_distance_and_role() {
        use HardStrategy::*;
        assert_eq!(HardStrategy::for_situation(true, 301.0), Intercept);
        assert_eq!(HardStrategy::for_situation(true, 99.0), Direct);
        assert_eq!(HardStrategy::for_situation(true, 200.0), Predict);
        assert_eq!(HardStrategy::for_situation(false, 149.0), EmergencyEscape);
        assert_eq!(HardStrategy::for_situation(false, 299.0), PlatformEscape);
        assert_eq!(HardStrategy::for_situation(false, 300.0), Position);
    }

    #[test]
    fn prediction_with_fewer_than_two_samples_is_raw_position() {
        let mut brain = HardBrain::new(10);
        let t = target(400.0, 200.0, 6.0);
        assert_eq!(brain.predict(&t), t.position);

        brain.history.record(&t, ms(0));
        assert_eq!(brain.predict(&t), t.position);

        brain.history.record(&t, ms(300));
        assert_eq!(brain.predict(&t), Vec2::new(430.0, 200.0));
    }

    #[test]
    fn interception_leads_by_travel_time() {
        let brain = HardBrain::new(10);
        let actor = chaser_at(0.0, 0.0);
        let t = target(100.0, 0.0, 2.0);
        // No history, so the prediction is the raw position: 100 away at speed 5 is 20 ticks.
        assert_eq!(brain.interception_point(&actor, &t), Vec2::new(140.0, 0.0));
    }

    #[test]
    fn strategy_refreshes_every_two_seconds() {
        let mut brain = HardBrain::new(10);
        let actor = chaser_at(0.0, 0.0);

        brain.prepare(&actor, &target(500.0, 0.0, 0.0), ms(0));
        assert_eq!(brain.strategy, HardStrategy::Intercept);

        brain.prepare(&actor, &target(50.0, 0.0, 0.0), ms(1500));
        assert_eq!(brain.strategy, HardStrategy::Intercept);

        brain.prepare(&actor, &target(50.0, 0.0, 0.0), ms(2001));
        assert_eq!(brain.strategy, HardStrategy::Direct);
        assert_eq!(brain.history.len(), 3);
    }

    #[test]
    fn waypoints_skip_far_and_blocked_points() {
        let brain = HardBrain::new(10);
        let actor = chaser_at(100.0, 400.0);
        let platforms = [
            Platform::new(150.0, 300.0, 100.0, 20.0),
            Platform::new(1000.0, 300.0, 100.0, 20.0),
        ];
        let goal = Vec2::new(180.0, 400.0);

        // The far corner of the near platform can only be reached through it.
        let points = brain.waypoints(&actor, goal, &platforms);
        assert_eq!(points, vec![goal, Vec2::new(150.0, 300.0)]);

        let wall = [Platform::new(130.0, 350.0, 20.0, 100.0)];
        assert_eq!(
            brain.waypoints(&actor, goal, &wall),
            vec![Vec2::new(130.0, 350.0)]
        );
    }

    #[test]
    fn conservative_sight_rejects_more_waypoints() {
        let mut brain = HardBrain::new(10);
        let actor = chaser_at(100.0, 400.0);
        let platforms = [Platform::new(150.0, 300.0, 100.0, 20.0)];
        let goal = Vec2::new(160.0, 420.0);

        let exact = brain.waypoints(&actor, goal, &platforms);
        assert_eq!(exact, vec![goal, Vec2::new(150.0, 300.0)]);

        brain.line_of_sight = LineOfSight::Conservative;
        assert_eq!(brain.waypoints(&actor, goal, &platforms), vec![goal]);
    }

    #[test]
    fn escape_space_counts_floor_steps() {
        let actor = Actor::new(Vec2::new(500.0, 500.0), Skill::None);
        let platforms = [Platform::new(520.0, 540.0, 160.0, 20.0)];
        assert_eq!(escape_space(&actor, Heading::Right, &platforms), 150.0);
        assert_eq!(escape_space(&actor, Heading::Left, &platforms), 0.0);
    }

    #[test]
    fn emergency_escape_prefers_open_floor() {
        let actor = Actor::new(Vec2::new(500.0, 500.0), Skill::None);
        let chaser = ActorView {
            is_it: true,
            ..target(560.0, 500.0, 0.0)
        };
        assert_eq!(emergency_heading(&actor, &chaser, &[]), Heading::Right);

        let floor_left = [Platform::new(100.0, 540.0, 390.0, 20.0)];
        assert_eq!(emergency_heading(&actor, &chaser, &floor_left), Heading::Left);
    }

    #[test]
    fn safest_platform_balances_both_distances() {
        let actor = Actor::new(Vec2::new(500.0, 500.0), Skill::None);
        let chaser = target(600.0, 500.0, 0.0);
        let platforms = [
            Platform::new(650.0, 500.0, 100.0, 20.0),
            Platform::new(150.0, 500.0, 100.0, 20.0),
        ];
        let refuge = safest_platform(&actor, &chaser, &platforms).unwrap();
        assert_eq!(refuge.x, 150.0);
    }

    #[test]
    fn strategic_position_rewards_height_and_width() {
        let chaser = target(500.0, 500.0, 0.0);
        let platforms = [
            Platform::new(450.0, 700.0, 100.0, 20.0),
            Platform::new(450.0, 300.0, 100.0, 20.0),
        ];
        assert_eq!(
            strategic_position(&chaser, &platforms),
            Some(Vec2::new(500.0, 300.0))
        );
        assert_eq!(strategic_position(&chaser, &[]), None);
    }

    #[test]
    fn runner_without_platforms_moves_away() {
        let mut brain = HardBrain::new(10);
        let mut actor = Actor::new(Vec2::new(500.0, 500.0), Skill::None);
        for (strategy, chaser_x) in [
            (HardStrategy::PlatformEscape, 700.0),
            (HardStrategy::Position, 300.0),
        ] {
            brain.strategy = strategy;
            actor.controls.release_all();
            brain.steer(&mut actor, &target(chaser_x, 500.0, 0.0), &[]);
            assert_eq!(actor.controls.left, chaser_x > 500.0);
            assert_eq!(actor.controls.right, chaser_x < 500.0);
        }
    }

    #[test]
    fn intercept_without_waypoints_heads_for_the_goal() {
        let mut brain = HardBrain::new(10);
        let mut actor = chaser_at(100.0, 1000.0);
        let runner = target(700.0, 1000.0, 0.0);

        brain.prepare(&actor, &runner, ms(0));
        assert_eq!(brain.strategy, HardStrategy::Intercept);
        let goal = brain.interception_point(&actor, &runner);
        assert!(brain.waypoints(&actor, goal, &[]).is_empty());

        brain.steer(&mut actor, &runner, &[]);
        assert!(actor.controls.right);
        assert!(!actor.controls.left);
    }

    #[test]
    fn role_change_repicks_strategy_immediately() {
        let mut brain = HardBrain::new(10);
        let mut actor = chaser_at(500.0, 500.0);
        let other = target(560.0, 500.0, 0.0);

        brain.prepare(&actor, &other, ms(0));
        assert_eq!(brain.strategy, HardStrategy::Direct);

        // Tagged away well inside the refresh window.
        actor.is_it = false;
        brain.prepare(&actor, &other, ms(500));
        assert_eq!(brain.strategy, HardStrategy::EmergencyEscape);

        actor.controls.release_all();
        brain.steer(&mut actor, &other, &[]);
        assert!(actor.controls.left || actor.controls.right);

        // The refresh timer restarted with the new pick.
        brain.prepare(&actor, &target(900.0, 500.0, 0.0), ms(2000));
        assert_eq!(brain.strategy, HardStrategy::EmergencyEscape);
        brain.prepare(&actor, &target(900.0, 500.0, 0.0), ms(2501));
        assert_eq!(brain.strategy, HardStrategy::Position);
    }

    #[test]
    fn strategy_for_the_other_role_presses_nothing() {
        let mut brain = HardBrain::new(10);
        brain.strategy = HardStrategy::Position;
        let mut actor = chaser_at(0.0, 0.0);
        brain.steer(&mut actor, &target(100.0, 0.0, 0.0), &[]);
        assert_eq!(actor.controls, ControlIntent::default());
    }

    #[test]
    fn jump_rules_by_role() {
        let brain = HardBrain::new(10);
        let chaser = chaser_at(500.0, 500.0);
        assert!(brain.should_jump(&chaser, &target(500.0, 400.0, 0.0), &[]));
        assert!(!brain.should_jump(&chaser, &target(500.0, 480.0, 0.0), &[]));

        let runner = Actor::new(Vec2::new(500.0, 500.0), Skill::None);
        let ledge = [Platform::new(300.0, 510.0, 220.0, 20.0)];
        assert!(brain.should_jump(&runner, &target(0.0, 500.0, 0.0), &ledge));
    }

    #[test]
    fn dash_bands_by_role() {
        let chaser = chaser_at(0.0, 0.0);
        assert!(HardBrain::should_dash(&chaser, 150.0));
        assert!(!HardBrain::should_dash(&chaser, 40.0));
        let runner = Actor::new(Vec2::ZERO, Skill::None);
        assert!(HardBrain::should_dash(&runner, 99.0));
        assert!(!HardBrain::should_dash(&runner, 150.0));
    }

    #[test]
    fn stuck_escape_always_jumps() {
        let mut rng = StdRng::seed_from_u64(31);
        let previous = ControlIntent {
            right: true,
            ..Default::default()
        };
        let mut reversed = 0;
        for _ in 0..100 {
            let mut actor = Actor::new(Vec2::ZERO, Skill::None);
            HardBrain::escape(&mut actor, &previous, &mut rng);
            assert!(actor.controls.up);
            assert!(!actor.controls.right);
            reversed += usize::from(actor.controls.left);
        }
        assert!(reversed > 20 && reversed < 80);
    }
}
