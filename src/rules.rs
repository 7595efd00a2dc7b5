//! Match rules: tag transfers between overlapping actors, the countdown, and the winner.

use std::time::Duration;

use bevy::prelude::*;

use crate::actor::Actor;
use crate::collision::aabb_overlap;
use crate::config::MatchConfig;
use crate::constants::IMMUNITY_TIME;
use crate::player::ActorSlot;
use crate::state::{GameSet, GameState};

pub struct RulesPlugin;

impl Plugin for RulesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MatchState>()
            .add_systems(OnExit(GameState::Loading), start_match_clock)
            .add_systems(
                FixedUpdate,
                (detect_tags, run_countdown).chain().in_set(GameSet::Rules),
            );
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct MatchState {
    pub started_at: Duration,
    pub duration: Duration,
    pub tag_count: u32,
    /// Global tag clock: no transfer happens within `IMMUNITY_TIME` of the last one.
    pub last_tag_at: Option<Duration>,
    pub finished: bool,
    /// Slot of the first actor that was not "it" when time ran out.
    pub winner: Option<usize>,
}

impl MatchState {
    pub fn new(started_at: Duration, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
            ..default()
        }
    }

    pub fn remaining(&self, now: Duration) -> Duration {
        self.duration
            .saturating_sub(now.saturating_sub(self.started_at))
    }

    /// Whole seconds left, rounded up, as shown on the HUD.
    pub fn seconds_left(&self, now: Duration) -> u64 {
        let remaining = self.remaining(now);
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    pub fn time_is_up(&self, now: Duration) -> bool {
        self.remaining(now).is_zero()
    }

    pub fn tag_window_open(&self, now: Duration) -> bool {
        self.last_tag_at
            .map_or(true, |at| now.saturating_sub(at) >= IMMUNITY_TIME)
    }
}

/// Transfers "it" between two overlapping actors when exactly one of them holds it and the
/// global immunity window has passed. Returns `true` on a transfer.
pub fn try_tag(a: &mut Actor, b: &mut Actor, state: &mut MatchState, now: Duration) -> bool {
    if a.is_it == b.is_it
        || !state.tag_window_open(now)
        || !aabb_overlap(a.bounds(), b.bounds())
    {
        return false;
    }

    let (tagger, tagged) = if a.is_it { (a, b) } else { (b, a) };
    tagger.is_it = false;
    tagged.is_it = true;
    tagged.last_tagged_at = Some(now);

    state.last_tag_at = Some(now);
    state.tag_count += 1;
    true
}

/// Lowest slot that is not "it".
pub fn winner_slot(actors: impl IntoIterator<Item = (usize, bool)>) -> Option<usize> {
    actors
        .into_iter()
        .filter(|(_, is_it)| !is_it)
        .map(|(slot, _)| slot)
        .min()
}

fn start_match_clock(
    time: Res<Time<Fixed>>,
    config: Res<MatchConfig>,
    mut state: ResMut<MatchState>,
) {
    *state = MatchState::new(time.elapsed(), config.duration());
}

fn detect_tags(
    time: Res<Time>,
    mut state: ResMut<MatchState>,
    mut actors: Query<(Entity, &ActorSlot, &mut Actor)>,
) {
    let now = time.elapsed();
    let mut order: Vec<(usize, Entity)> = actors
        .iter()
        .map(|(entity, slot, _)| (slot.0, entity))
        .collect();
    order.sort_unstable();

    for (i, &(slot_a, first)) in order.iter().enumerate() {
        for &(slot_b, second) in &order[i + 1..] {
            let Ok([(_, _, mut a), (_, _, mut b)]) = actors.get_many_mut([first, second]) else {
                continue;
            };
            if try_tag(&mut a, &mut b, &mut state, now) {
                let it = if a.is_it { slot_a } else { slot_b };
                info!("Player {} is it (tag #{})", it + 1, state.tag_count);
            }
        }
    }
}

fn run_countdown(
    time: Res<Time>,
    mut state: ResMut<MatchState>,
    actors: Query<(&ActorSlot, &Actor)>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let now = time.elapsed();
    if state.finished || !state.time_is_up(now) {
        return;
    }

    state.finished = true;
    state.winner = winner_slot(actors.iter().map(|(slot, actor)| (slot.0, actor.is_it)));
    match state.winner {
        Some(slot) => info!(
            "Time is up: player {} wins after {} tags",
            slot + 1,
            state.tag_count
        ),
        None => warn!("Time is up but every actor is it"),
    }
    next_state.set(GameState::Finished);
}
