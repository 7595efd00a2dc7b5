//! Actor entity lifecycle. Spawns one entity per roster entry when a match leaves `Loading`, and
//! clears them when the next match starts loading.

use bevy::prelude::*;

use crate::actor::Actor;
use crate::bot::Bot;
use crate::camera::world_to_translation;
use crate::config::{ActorKind, MatchConfig, MatchRng};
use crate::constants::SPAWN_FLOOR_OFFSET;
use crate::movement::{HumanControlled, KeyScheme};
use crate::state::GameState;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Loading), despawn_actors)
            .add_systems(OnExit(GameState::Loading), spawn_actors)
            .add_systems(Update, sync_actor_sprites);
    }
}

/// Roster position of an actor. Slot 0 starts as "it" and the HUD numbers players from slot + 1.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorSlot(pub usize);

/// Small badge above whoever is "it".
#[derive(Component)]
pub struct ItMarker;

const SLOT_COLORS: [[f32; 3]; 4] = [
    [0.255, 0.412, 0.882],
    [0.863, 0.078, 0.235],
    [0.196, 0.804, 0.196],
    [1.0, 0.843, 0.0],
];
const IMMUNE_ALPHA: f32 = 0.5;
const MARKER_SIZE: f32 = 12.0;

fn slot_color(slot: usize, alpha: f32) -> Color {
    let [r, g, b] = SLOT_COLORS[slot % SLOT_COLORS.len()];
    Color::srgba(r, g, b, alpha)
}

/// Evenly spaced along the bottom of the first view.
pub fn spawn_positions(count: usize, view_width: f32, view_height: f32) -> Vec<Vec2> {
    let spacing = view_width / (count + 1) as f32;
    (0..count)
        .map(|i| Vec2::new(spacing * (i + 1) as f32, view_height - SPAWN_FLOOR_OFFSET))
        .collect()
}

fn spawn_actors(mut commands: Commands, config: Res<MatchConfig>, mut rng: ResMut<MatchRng>) {
    let positions = spawn_positions(config.roster.len(), config.view_width, config.view_height);

    for (slot, (entry, position)) in config.roster.iter().zip(positions).enumerate() {
        let mut actor = Actor::new(position, entry.skill);
        actor.is_it = slot == 0;

        let translation = world_to_translation(actor.position, actor.size, 1.0);
        let mut entity = commands.spawn((
            Name::new(format!("Player {}", slot + 1)),
            ActorSlot(slot),
            SpriteBundle {
                sprite: Sprite {
                    color: slot_color(slot, 1.0),
                    custom_size: Some(actor.size),
                    ..default()
                },
                transform: Transform::from_translation(translation),
                ..default()
            },
        ));

        match entry.kind {
            ActorKind::Human => {
                entity.insert(HumanControlled {
                    keys: KeyScheme::for_slot(slot),
                });
            }
            ActorKind::Bot(tier) => {
                entity.insert(
                    Bot::new(tier, &actor, &mut rng.0).with_line_of_sight(config.line_of_sight),
                );
            }
        }

        let marker_visibility = if actor.is_it {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        let marker_offset = actor.size.y * 0.5 + MARKER_SIZE;

        entity.insert(actor).with_children(|parent| {
            parent.spawn((
                ItMarker,
                SpriteBundle {
                    sprite: Sprite {
                        color: Color::WHITE,
                        custom_size: Some(Vec2::splat(MARKER_SIZE)),
                        ..default()
                    },
                    transform: Transform::from_xyz(0.0, marker_offset, 0.1),
                    visibility: marker_visibility,
                    ..default()
                },
            ));
        });

        debug!(
            "Spawned player {} ({:?}, {:?}) at {:?}",
            slot + 1,
            entry.kind,
            entry.skill,
            position
        );
    }

    info!("Spawned {} players", config.roster.len());
}

fn despawn_actors(mut commands: Commands, query: Query<Entity, With<ActorSlot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

/// Mirrors simulation state onto sprites: position, the "it" badge, and a faded body while the
/// actor is immune after being tagged.
fn sync_actor_sprites(
    time: Res<Time<Fixed>>,
    mut actors: Query<(&Actor, &ActorSlot, &mut Transform, &mut Sprite, &Children)>,
    mut markers: Query<&mut Visibility, With<ItMarker>>,
) {
    let now = time.elapsed();

    for (actor, slot, mut transform, mut sprite, children) in &mut actors {
        let z = transform.translation.z;
        transform.translation = world_to_translation(actor.position, actor.size, z);

        let alpha = if actor.is_immune(now) { IMMUNE_ALPHA } else { 1.0 };
        sprite.color = slot_color(slot.0, alpha);

        for &child in children.iter() {
            if let Ok(mut visibility) = markers.get_mut(child) {
                *visibility = if actor.is_it {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }
}
