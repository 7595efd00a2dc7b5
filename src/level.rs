//! Arena maps: the built-in layout, JSON loading in the map-editor format, and the platform
//! sprites. Loading runs once per match on entering `Loading` and hands over to `Playing`.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{world_to_translation, ArenaCamera};
use crate::collision::{Platform, PlatformMap};
use crate::config::{load_match_config, LaunchOptions, MatchConfig};
use crate::constants::ARENA_WIDTH_IN_VIEWS;
use crate::state::GameState;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(GameState::Loading),
            (load_map, spawn_platform_sprites)
                .chain()
                .after(load_match_config),
        );
    }
}

const PLATFORM_COLOR: Color = Color::srgb(0.298, 0.686, 0.314);
const BUILTIN_NAME: &str = "Arena";

/// A named platform layout. Same shape the map editor saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid map JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("platform {index} needs a finite position and positive size")]
    InvalidPlatform { index: usize },
    #[error("map has no platforms")]
    Empty,
}

impl MapDefinition {
    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        let map: Self = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    pub fn load(path: &Path) -> Result<Self, MapError> {
        let json = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.platforms.is_empty() {
            return Err(MapError::Empty);
        }
        for (index, p) in self.platforms.iter().enumerate() {
            let finite = [p.x, p.y, p.width, p.height, p.angle]
                .iter()
                .all(|v| v.is_finite());
            if !finite || p.width <= 0.0 || p.height <= 0.0 {
                return Err(MapError::InvalidPlatform { index });
            }
        }
        Ok(())
    }

    /// Rightmost platform edge, ignoring rotation.
    pub fn right_edge(&self) -> f32 {
        self.platforms
            .iter()
            .map(Platform::right)
            .fold(0.0, f32::max)
    }
}

/// The default arena: a full-width floor plus five sections of ledges spread over three view
/// widths, two of them tilted by 15 degrees.
pub fn arena_map(view_width: f32, view_height: f32) -> MapDefinition {
    let w = view_width * ARENA_WIDTH_IN_VIEWS;
    let h = view_height;
    let ledge = |x: f32, rise: f32, width: f32| Platform::new(w * x, h - rise, w * width, 15.0);

    let platforms = vec![
        Platform::new(0.0, h - 20.0, w, 20.0),
        // left
        ledge(0.05, 100.0, 0.06),
        ledge(0.15, 150.0, 0.1),
        ledge(0.1, 250.0, 0.08).rotated(15.0),
        ledge(0.05, 350.0, 0.05),
        ledge(0.15, 450.0, 0.1),
        // center-left
        ledge(0.3, 200.0, 0.15),
        ledge(0.35, 300.0, 0.1),
        ledge(0.25, 400.0, 0.1),
        ledge(0.35, 500.0, 0.15),
        // center
        ledge(0.45, 250.0, 0.1),
        ledge(0.5, 350.0, 0.15),
        ledge(0.45, 450.0, 0.1),
        ledge(0.5, 550.0, 0.2),
        // center-right
        ledge(0.65, 200.0, 0.15),
        ledge(0.7, 300.0, 0.1),
        ledge(0.65, 400.0, 0.1),
        ledge(0.7, 500.0, 0.15),
        // right
        ledge(0.85, 100.0, 0.06),
        ledge(0.9, 150.0, 0.1),
        ledge(0.85, 250.0, 0.08).rotated(-15.0),
        ledge(0.9, 350.0, 0.05),
        ledge(0.85, 450.0, 0.1),
        // upper tier
        ledge(0.2, 550.0, 0.1),
        ledge(0.7, 550.0, 0.1),
        ledge(0.45, 600.0, 0.1),
    ];

    MapDefinition {
        name: BUILTIN_NAME.to_owned(),
        platforms,
    }
}

#[derive(Component)]
pub struct PlatformSprite;

fn load_map(
    options: Res<LaunchOptions>,
    config: Res<MatchConfig>,
    mut platform_map: ResMut<PlatformMap>,
    mut arena: ResMut<ArenaCamera>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let (view_width, view_height) = (config.view_width, config.view_height);

    let map = match options.map_path.as_deref() {
        Some(path) => match MapDefinition::load(path) {
            Ok(map) => {
                info!("Loaded map '{}' from {}", map.name, path.display());
                map
            }
            Err(err) => {
                warn!("{err}; falling back to the built-in arena.");
                arena_map(view_width, view_height)
            }
        },
        None => arena_map(view_width, view_height),
    };

    *arena = ArenaCamera::new(view_width, view_height).widened_to(map.right_edge());

    platform_map.name = map.name;
    platform_map.platforms = map.platforms;

    next_state.set(GameState::Playing);
}

fn spawn_platform_sprites(
    mut commands: Commands,
    platform_map: Res<PlatformMap>,
    existing: Query<Entity, With<PlatformSprite>>,
) {
    for entity in &existing {
        commands.entity(entity).despawn_recursive();
    }

    for (index, platform) in platform_map.platforms.iter().enumerate() {
        let size = Vec2::new(platform.width, platform.height);
        let translation = world_to_translation(Vec2::new(platform.x, platform.y), size, 0.0);

        commands.spawn((
            Name::new(format!("Platform {index}")),
            PlatformSprite,
            SpriteBundle {
                sprite: Sprite {
                    color: PLATFORM_COLOR,
                    custom_size: Some(size),
                    ..default()
                },
                // World y points down, so a clockwise on-screen tilt is a negative z rotation.
                transform: Transform::from_translation(translation)
                    .with_rotation(Quat::from_rotation_z(-platform.radians())),
                ..default()
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_arena_spans_three_views() {
        let map = arena_map(1920.0, 1080.0);
        assert_eq!(map.name, "Arena");
        assert_eq!(map.platforms.len(), 26);
        assert_eq!(map.platforms[0], Platform::new(0.0, 1060.0, 5760.0, 20.0));
        assert_eq!(map.right_edge(), 5760.0);
        map.validate().unwrap();

        let tilted: Vec<f32> = map
            .platforms
            .iter()
            .filter(|p| p.angle != 0.0)
            .map(|p| p.angle)
            .collect();
        assert_eq!(tilted, vec![15.0, -15.0]);
    }

    #[test]
    fn parses_editor_output_with_default_angle() {
        let map = MapDefinition::from_json_str(
            r#"{
                "name": "custom_map",
                "platforms": [
                    { "x": 0, "y": 1060, "width": 4000, "height": 20, "angle": 0 },
                    { "x": 300, "y": 800, "width": 200, "height": 15 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(map.platforms[1].angle, 0.0);
        assert_eq!(map.right_edge(), 4000.0);
    }

    #[test]
    fn rejects_empty_and_degenerate_maps() {
        let empty = r#"{ "name": "void", "platforms": [] }"#;
        assert!(matches!(
            MapDefinition::from_json_str(empty),
            Err(MapError::Empty)
        ));

        let thin = r#"{ "name": "thin", "platforms": [
            { "x": 0, "y": 0, "width": 10, "height": 10 },
            { "x": 0, "y": 0, "width": 0, "height": 10 }
        ] }"#;
        assert!(matches!(
            MapDefinition::from_json_str(thin),
            Err(MapError::InvalidPlatform { index: 1 })
        ));

        assert!(matches!(
            MapDefinition::from_json_str("{ not json"),
            Err(MapError::Parse(_))
        ));
    }

    #[test]
    fn saved_map_loads_back_identically() {
        let original = arena_map(1280.0, 720.0);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(original.to_json().unwrap().as_bytes())
            .unwrap();

        let loaded = MapDefinition::load(file.path()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = MapDefinition::load(Path::new("/no/such/map.json")).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
        assert!(err.to_string().contains("/no/such/map.json"));
    }
}
