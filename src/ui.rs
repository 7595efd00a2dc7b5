//! Match HUD plus the pause and game-over overlays.
//!
//! UI entities are part of Bevy's ECS; once despawned, all associated style/text components are
//! dropped automatically.

use std::time::Duration;

use bevy::prelude::*;

use crate::actor::{Actor, Skill};
use crate::player::ActorSlot;
use crate::rules::MatchState;
use crate::skills::cooldown_remaining;
use crate::state::GameState;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnExit(GameState::Loading), spawn_hud)
            .add_systems(OnEnter(GameState::Loading), despawn_ui::<Hud>)
            .add_systems(
                Update,
                update_hud.run_if(not(in_state(GameState::Loading))),
            )
            .add_systems(OnEnter(GameState::Paused), spawn_pause_menu)
            .add_systems(OnExit(GameState::Paused), despawn_ui::<PauseMenu>)
            .add_systems(OnEnter(GameState::Finished), spawn_game_over)
            .add_systems(OnExit(GameState::Finished), despawn_ui::<GameOverMenu>);
    }
}

#[derive(Component)]
struct Hud;

#[derive(Component)]
struct HudText;

#[derive(Component)]
struct SkillText;

#[derive(Component)]
struct PauseMenu;

#[derive(Component)]
struct GameOverMenu;

const TEXT_COLOR: Color = Color::srgba(0.9, 0.9, 0.9, 1.0);

pub fn hud_line(seconds_left: u64, tag_count: u32) -> String {
    format!("Time: {seconds_left}    Tags: {tag_count}")
}

/// One row per player: skill name and either "ready" or the seconds left, to a tenth.
pub fn skill_line(slot: usize, skill: Skill, remaining: Option<Duration>) -> String {
    let name = match skill {
        Skill::None => "No skill",
        Skill::Dash => "Dash",
        Skill::Teleport => "Teleport",
        Skill::DoubleJump => "Double jump",
    };
    match remaining {
        Some(left) if !left.is_zero() => {
            format!("P{}  {name}: {:.1}s", slot + 1, left.as_secs_f32())
        }
        Some(_) => format!("P{}  {name}: ready", slot + 1),
        None => format!("P{}  {name}", slot + 1),
    }
}

pub fn game_over_text(winner: Option<usize>, tag_count: u32) -> String {
    let winner = match winner {
        Some(slot) => format!("Winner: Player {}", slot + 1),
        None => "No winner".to_owned(),
    };
    format!("Game Over!\n{winner}\nTotal tags: {tag_count}\nPress R to play again")
}

fn spawn_hud(mut commands: Commands, state: Res<MatchState>) {
    commands
        .spawn((
            Hud,
            Name::new("Hud"),
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(16.0),
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(4.0),
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                HudText,
                TextBundle::from_section(
                    hud_line(state.duration.as_secs(), 0),
                    TextStyle {
                        font_size: 28.0,
                        color: TEXT_COLOR,
                        ..default()
                    },
                ),
            ));
            parent.spawn((
                SkillText,
                TextBundle::from_section(
                    String::new(),
                    TextStyle {
                        font_size: 18.0,
                        color: TEXT_COLOR,
                        ..default()
                    },
                ),
            ));
        });
}

fn update_hud(
    time: Res<Time<Fixed>>,
    state: Res<MatchState>,
    actors: Query<(&Actor, &ActorSlot)>,
    mut hud_texts: Query<&mut Text, (With<HudText>, Without<SkillText>)>,
    mut skill_texts: Query<&mut Text, (With<SkillText>, Without<HudText>)>,
) {
    let now = time.elapsed();

    let line = hud_line(state.seconds_left(now), state.tag_count);
    for mut text in &mut hud_texts {
        set_first_section(&mut text, &line);
    }

    let mut rows: Vec<(usize, String)> = actors
        .iter()
        .map(|(actor, slot)| {
            let row = skill_line(slot.0, actor.skill, cooldown_remaining(actor, now));
            (slot.0, row)
        })
        .collect();
    rows.sort_by_key(|(slot, _)| *slot);
    let skills = rows
        .into_iter()
        .map(|(_, row)| row)
        .collect::<Vec<_>>()
        .join("\n");
    for mut text in &mut skill_texts {
        set_first_section(&mut text, &skills);
    }
}

fn set_first_section(text: &mut Text, value: &str) {
    if let Some(section) = text.sections.first_mut() {
        if section.value != value {
            section.value = value.to_owned();
        }
    }
}

/// Full-screen dimmed node with centered text.
fn spawn_overlay(commands: &mut Commands, marker: impl Component, name: &'static str, text: String) {
    commands
        .spawn((
            marker,
            Name::new(name),
            NodeBundle {
                background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(
                TextBundle::from_section(
                    text,
                    TextStyle {
                        font_size: 36.0,
                        color: TEXT_COLOR,
                        ..default()
                    },
                )
                .with_text_justify(JustifyText::Center),
            );
        });
}

fn spawn_pause_menu(mut commands: Commands) {
    spawn_overlay(
        &mut commands,
        PauseMenu,
        "PauseMenu",
        "Paused\nPress ESC to resume".to_owned(),
    );
}

fn spawn_game_over(mut commands: Commands, state: Res<MatchState>) {
    spawn_overlay(
        &mut commands,
        GameOverMenu,
        "GameOverMenu",
        game_over_text(state.winner, state.tag_count),
    );
}

fn despawn_ui<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}
