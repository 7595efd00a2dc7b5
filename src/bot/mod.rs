//! Bot decision engine. Every bot shares one decision cycle (throttled re-evaluation, input reset,
//! stuck escape, jump and skill gating); the tier decides how to steer and when to jump or dash.
//!
//! Bots only ever write [`ControlIntent`](crate::actor::ControlIntent); the integrator turns that
//! into motion on the same tick.

mod easy;
mod hard;
mod medium;
mod path;

use std::collections::VecDeque;
use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorView, ControlIntent};
use crate::collision::{Platform, PlatformMap};
use crate::config::MatchRng;
use crate::state::GameSet;

pub use easy::{EasyBrain, MovementState};
pub use hard::{HardBrain, HardStrategy};
pub use medium::{MediumBrain, ProfileKind, StrategyProfile};
pub use path::LineOfSight;

pub struct BotPlugin;

impl Plugin for BotPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, drive_bots.in_set(GameSet::Decision));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotTier {
    Easy,
    Medium,
    Hard,
}

/// Per-tier timing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierParams {
    pub decision_interval: Duration,
    pub jump_cooldown: Duration,
    pub skill_cooldown: Duration,
    /// Number of target samples kept for prediction. Zero disables the history.
    pub history_len: usize,
    /// How long the bot may stand still before it forces an escape. `None` disables detection.
    pub stuck_threshold: Option<Duration>,
}

impl BotTier {
    pub const fn params(self) -> TierParams {
        match self {
            Self::Easy => TierParams {
                decision_interval: Duration::from_millis(800),
                jump_cooldown: Duration::from_millis(1000),
                skill_cooldown: Duration::from_millis(2000),
                history_len: 0,
                stuck_threshold: None,
            },
            Self::Medium => TierParams {
                decision_interval: Duration::from_millis(500),
                jump_cooldown: Duration::from_millis(800),
                skill_cooldown: Duration::from_millis(2000),
                history_len: 20,
                stuck_threshold: Some(Duration::from_millis(1500)),
            },
            Self::Hard => TierParams {
                decision_interval: Duration::from_millis(300),
                jump_cooldown: Duration::from_millis(500),
                skill_cooldown: Duration::from_millis(2000),
                history_len: 10,
                stuck_threshold: Some(Duration::from_millis(1000)),
            },
        }
    }
}

/// Horizontal direction a bot can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Left,
    Right,
}

impl Heading {
    /// Right for a positive offset, left otherwise.
    pub fn toward(dx: f32) -> Self {
        if dx > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn away_from(dx: f32) -> Self {
        Self::toward(dx).reversed()
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.gen::<f32>() < 0.5 {
            Self::Left
        } else {
            Self::Right
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn press(self, controls: &mut ControlIntent) {
        match self {
            Self::Left => controls.left = true,
            Self::Right => controls.right = true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSample {
    pub position: Vec2,
    pub velocity: Vec2,
    pub at: Duration,
}

/// Bounded rolling window of target observations, oldest first.
#[derive(Debug, Clone, Default)]
pub struct MotionHistory {
    samples: VecDeque<TargetSample>,
    capacity: usize,
}

impl MotionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: TargetSample) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn record(&mut self, target: &ActorView, at: Duration) {
        self.push(TargetSample {
            position: target.position,
            velocity: target.velocity,
            at,
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The newest `count` samples, oldest first.
    pub fn latest(&self, count: usize) -> impl Iterator<Item = &TargetSample> {
        self.samples.iter().skip(self.samples.len().saturating_sub(count))
    }

    pub fn mean_velocity(&self, count: usize) -> Vec2 {
        let (sum, n) = self
            .latest(count)
            .fold((Vec2::ZERO, 0u32), |(sum, n), s| (sum + s.velocity, n + 1));
        if n == 0 {
            Vec2::ZERO
        } else {
            sum / n as f32
        }
    }

    /// Change in velocity per millisecond between the two newest samples. Zero when there are
    /// fewer than two samples or they share a timestamp.
    pub fn acceleration_per_ms(&self) -> Vec2 {
        let mut newest = self.samples.iter().rev();
        let (Some(last), Some(before)) = (newest.next(), newest.next()) else {
            return Vec2::ZERO;
        };
        let dt_ms = last.at.saturating_sub(before.at).as_secs_f32() * 1000.0;
        if dt_ms <= 0.0 {
            return Vec2::ZERO;
        }
        (last.velocity - before.velocity) / dt_ms
    }
}

/// Movement below this on both axes between two decisions counts as standing still.
const STUCK_DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StuckDetector {
    last_position: Vec2,
    stuck_for: Duration,
    threshold: Duration,
}

impl StuckDetector {
    pub fn new(position: Vec2, threshold: Duration) -> Self {
        Self {
            last_position: position,
            stuck_for: Duration::ZERO,
            threshold,
        }
    }

    /// Called once per decision with the bot's position after deciding.
    pub fn record(&mut self, position: Vec2, interval: Duration) {
        let moved = (position - self.last_position).abs();
        if moved.x < STUCK_DISTANCE && moved.y < STUCK_DISTANCE {
            self.stuck_for += interval;
        } else {
            self.stuck_for = Duration::ZERO;
        }
        self.last_position = position;
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck_for > self.threshold
    }

    pub fn stuck_for(&self) -> Duration {
        self.stuck_for
    }

    pub fn clear(&mut self) {
        self.stuck_for = Duration::ZERO;
    }
}

#[derive(Debug, Clone)]
pub enum Brain {
    Easy(EasyBrain),
    Medium(MediumBrain),
    Hard(HardBrain),
}

#[derive(Component, Debug, Clone)]
pub struct Bot {
    pub tier: BotTier,
    params: TierParams,
    last_decision: Option<Duration>,
    last_jump: Option<Duration>,
    last_skill_use: Option<Duration>,
    stuck: Option<StuckDetector>,
    brain: Brain,
}

impl Bot {
    pub fn new<R: Rng>(tier: BotTier, actor: &Actor, rng: &mut R) -> Self {
        let params = tier.params();
        let brain = match tier {
            BotTier::Easy => Brain::Easy(EasyBrain::new(rng)),
            BotTier::Medium => {
                Brain::Medium(MediumBrain::new(actor.is_it, params.history_len, rng))
            }
            BotTier::Hard => Brain::Hard(HardBrain::new(params.history_len)),
        };

        Self {
            tier,
            params,
            last_decision: None,
            last_jump: None,
            last_skill_use: None,
            stuck: params
                .stuck_threshold
                .map(|threshold| StuckDetector::new(actor.position, threshold)),
            brain,
        }
    }

    /// Only hard bots plan paths; other tiers ignore the policy.
    pub fn with_line_of_sight(mut self, line_of_sight: LineOfSight) -> Self {
        if let Brain::Hard(brain) = &mut self.brain {
            brain.line_of_sight = line_of_sight;
        }
        self
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    pub fn stuck_detector(&self) -> Option<&StuckDetector> {
        self.stuck.as_ref()
    }

    /// Called every tick. Re-decides at most once per decision interval; in between, the last
    /// control intent stays on the actor. Without a target nothing happens.
    pub fn update<R: Rng>(
        &mut self,
        actor: &mut Actor,
        target: Option<ActorView>,
        platforms: &[Platform],
        now: Duration,
        rng: &mut R,
    ) {
        let Some(target) = target else {
            return;
        };

        match &mut self.brain {
            Brain::Easy(brain) => brain.tick(actor.is_it, now, rng),
            Brain::Medium(brain) => brain.tick(&target, actor.is_it, now, rng),
            Brain::Hard(_) => {}
        }

        if !waited_longer_than(self.last_decision, self.params.decision_interval, now) {
            return;
        }

        if let Brain::Hard(brain) = &mut self.brain {
            brain.prepare(actor, &target, now);
        }

        self.decide(actor, &target, platforms, now, rng);
        self.last_decision = Some(now);

        if let Some(stuck) = &mut self.stuck {
            stuck.record(actor.position, self.params.decision_interval);
        }
    }

    fn decide<R: Rng>(
        &mut self,
        actor: &mut Actor,
        target: &ActorView,
        platforms: &[Platform],
        now: Duration,
        rng: &mut R,
    ) {
        let previous = actor.controls;
        actor.controls.release_all();

        if self.stuck.as_ref().is_some_and(StuckDetector::is_stuck) {
            match &self.brain {
                Brain::Medium(brain) => brain.escape(actor, &previous, platforms),
                Brain::Hard(_) => HardBrain::escape(actor, &previous, rng),
                Brain::Easy(_) => {}
            }
            if let Some(stuck) = &mut self.stuck {
                stuck.clear();
            }
            debug!("{:?} bot stuck, forcing escape", self.tier);
            return;
        }

        let distance = actor.position.distance(target.position);

        match &mut self.brain {
            Brain::Easy(brain) => brain.steer(actor, target, platforms, rng),
            Brain::Medium(brain) => brain.steer(actor, target, platforms, distance, rng),
            Brain::Hard(brain) => brain.steer(actor, target, platforms),
        }

        if waited_longer_than(self.last_jump, self.params.jump_cooldown, now) {
            let jump = match &self.brain {
                Brain::Easy(brain) => brain.should_jump(actor, target, platforms, rng),
                Brain::Medium(brain) => brain.should_jump(actor, target, platforms, rng),
                Brain::Hard(brain) => brain.should_jump(actor, target, platforms),
            };
            if jump {
                actor.controls.up = true;
                self.last_jump = Some(now);
            }
        }

        if waited_longer_than(self.last_skill_use, self.params.skill_cooldown, now) {
            let dash = match &self.brain {
                Brain::Easy(brain) => brain.should_dash(actor, distance, rng),
                Brain::Medium(brain) => brain.should_dash(actor, distance),
                Brain::Hard(_) => HardBrain::should_dash(actor, distance),
            };
            if dash {
                actor.controls.dash = true;
                self.last_skill_use = Some(now);
            }
        }
    }
}

/// `true` if `span` has strictly passed since `last`, or if `last` never happened.
pub(crate) fn waited_longer_than(last: Option<Duration>, span: Duration, now: Duration) -> bool {
    last.map_or(true, |at| now.saturating_sub(at) > span)
}

/// Presses the opposite of whatever horizontal direction was held before.
pub(crate) fn reverse_horizontal(controls: &mut ControlIntent, previous: &ControlIntent) {
    controls.left = previous.right;
    controls.right = previous.left;
}

/// Highest-scoring item; the earliest one wins ties.
pub(crate) fn highest_scoring<T>(
    items: impl IntoIterator<Item = T>,
    mut score: impl FnMut(&T) -> f32,
) -> Option<T> {
    let mut best: Option<(T, f32)> = None;
    for item in items {
        let value = score(&item);
        if best.as_ref().map_or(true, |(_, top)| value > *top) {
            best = Some((item, value));
        }
    }
    best.map(|(item, _)| item)
}

/// Top-center of a platform, the reference point bots navigate toward.
pub(crate) fn platform_anchor(platform: &Platform) -> Vec2 {
    Vec2::new(platform.x + platform.width * 0.5, platform.y)
}

/// Who a bot reacts to: a runner watches whoever is "it"; the "it" bot hunts the closest actor.
pub fn choose_target(
    me: &Actor,
    others: impl IntoIterator<Item = ActorView>,
) -> Option<ActorView> {
    let mut others = others.into_iter();
    if me.is_it {
        others.min_by(|a, b| {
            me.position
                .distance_squared(a.position)
                .total_cmp(&me.position.distance_squared(b.position))
        })
    } else {
        others.find(|other| other.is_it)
    }
}

fn drive_bots(
    time: Res<Time>,
    platforms: Res<PlatformMap>,
    mut rng: ResMut<MatchRng>,
    mut actors: Query<(Entity, &mut Actor, Option<&mut Bot>)>,
) {
    let now = time.elapsed();
    let views: Vec<(Entity, ActorView)> = actors
        .iter()
        .map(|(entity, actor, _)| (entity, actor.view()))
        .collect();

    for (entity, mut actor, bot) in &mut actors {
        let Some(mut bot) = bot else {
            continue;
        };

        let others = views
            .iter()
            .filter(|(other, _)| *other != entity)
            .map(|(_, view)| *view);
        let target = choose_target(&actor, others);

        bot.update(&mut actor, target, &platforms.platforms, now, &mut rng.0);
    }
}
