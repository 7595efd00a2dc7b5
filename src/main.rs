//! Application entry point: parses launch flags, configures the window and logging, and hands
//! over to `TagArenaPlugin`.

use std::path::PathBuf;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};
use clap::Parser;

use tag_arena::app::TagArenaPlugin;
use tag_arena::config::LaunchOptions;

#[derive(Parser, Debug)]
#[command(name = "tag_arena", about = "Platformer tag for humans and bots")]
struct Cli {
    /// Match configuration JSON (roster, duration, seed).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map JSON in the map-editor format. Defaults to the built-in arena.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Seed for bots and teleports; overrides the config file.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    tag_arena::wasm::set_panic_hook();

    let cli = Cli::parse();

    let primary_window = Window {
        title: "Tag Arena".to_string(),
        resolution: WindowResolution::new(1280.0, 720.0),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: 640.0,
            min_height: 360.0,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        canvas: cfg!(all(target_arch = "wasm32", feature = "web"))
            .then(|| "#bevy-canvas".to_owned()),
        ..default()
    };

    let default_plugins = DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        })
        .set(LogPlugin {
            filter: "wgpu=error,naga=warn,tag_arena=info".to_owned(),
            ..default()
        });

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.1)))
        .insert_resource(LaunchOptions {
            config_path: cli.config,
            map_path: cli.map,
            seed: cli.seed,
        })
        .add_plugins(default_plugins)
        .add_plugins(TagArenaPlugin)
        .run();
}
