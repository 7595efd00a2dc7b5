//! High-level plugin composition.
//!
//! `TagArenaPlugin` glues together the domain plugins (config, maps, actors, bots, rules, UI)
//! and fixes the order of one simulation tick. Each subsystem owns its own state; this module
//! only registers them with the Bevy application.

use bevy::prelude::*;

use crate::bot::BotPlugin;
use crate::camera::CameraPlugin;
use crate::collision::CollisionPlugin;
use crate::config::ConfigPlugin;
use crate::constants::TICK_HZ;
use crate::level::LevelPlugin;
use crate::movement::MovementPlugin;
use crate::player::PlayerPlugin;
use crate::rules::RulesPlugin;
use crate::state::{restart_match, toggle_pause, GameSet, GameState};
use crate::ui::UiPlugin;

pub struct TagArenaPlugin;

impl Plugin for TagArenaPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .init_state::<GameState>()
            .add_plugins((
                ConfigPlugin,    // Match roster, seed, launch options.
                LevelPlugin,     // Map loading + platform sprites.
                PlayerPlugin,    // Actor spawning.
                CameraPlugin,    // Side-scrolling follow.
                CollisionPlugin, // Platform map resource.
                MovementPlugin,  // Input + integrator.
                BotPlugin,       // Bot decisions.
                RulesPlugin,     // Tagging + countdown.
                UiPlugin,        // HUD and overlays.
            ))
            // One tick: camera, then intents (keyboard and bots), then physics, then rules.
            .configure_sets(
                FixedUpdate,
                (
                    GameSet::Camera,
                    GameSet::Input,
                    GameSet::Decision,
                    GameSet::Movement,
                    GameSet::Rules,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(Update, (toggle_pause, restart_match));
    }
}
