//! Multiplayer tag on a side-scrolling arena of (optionally rotated) platforms, for up to four
//! humans and bots.

pub mod actor;
pub mod app;
pub mod bot;
pub mod camera;
pub mod collision;
pub mod config;
pub mod constants;
pub mod level;
pub mod movement;
pub mod player;
pub mod rules;
pub mod skills;
pub mod state;
pub mod ui;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod wasm;
