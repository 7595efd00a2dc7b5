//! Global game state definitions. States are stored by Bevy in a stack; switching states simply
//! updates an enum value and triggers on-enter/on-exit schedules.

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

/// High-level state machine for a match.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    /// Map and roster are (re)built here; actors spawn on exit.
    #[default]
    Loading,
    Playing,
    Paused,
    Finished,
}

/// Stages of one simulation tick, chained in this order inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Camera,
    Input,
    Decision,
    Movement,
    Rules,
}

/// Toggles between Playing and Paused when `ESC` is pressed. Virtual time is paused alongside so
/// cooldowns, decision timers and the countdown do not advance while the overlay is up.
pub fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut time: ResMut<Time<Virtual>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }

    match state.get() {
        GameState::Playing => {
            time.pause();
            next_state.set(GameState::Paused);
        }
        GameState::Paused => {
            time.unpause();
            next_state.set(GameState::Playing);
        }
        GameState::Loading | GameState::Finished => {}
    }
}

/// `R` on the game-over screen starts a fresh match with the same configuration.
pub fn restart_match(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if *state.get() == GameState::Finished && keyboard.just_pressed(KeyCode::KeyR) {
        next_state.set(GameState::Loading);
    }
}
