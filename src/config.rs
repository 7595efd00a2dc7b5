//! Match configuration: who plays, with which skill, for how long. Built once before a match
//! starts; nothing in the simulation reads UI state directly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::Skill;
use crate::bot::{BotTier, LineOfSight};
use crate::constants::{MATCH_SECONDS, MAX_ACTORS, VIEW_HEIGHT, VIEW_WIDTH};
use crate::state::GameState;

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LaunchOptions>()
            .init_resource::<MatchConfig>()
            .insert_resource(MatchRng::seeded(None))
            .add_systems(OnEnter(GameState::Loading), load_match_config);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Human,
    Bot(BotTier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub kind: ActorKind,
    #[serde(default)]
    pub skill: Skill,
}

impl RosterEntry {
    pub fn human(skill: Skill) -> Self {
        Self {
            kind: ActorKind::Human,
            skill,
        }
    }

    pub fn bot(tier: BotTier, skill: Skill) -> Self {
        Self {
            kind: ActorKind::Bot(tier),
            skill,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Ordered roster; slot 0 starts as "it".
    pub roster: Vec<RosterEntry>,
    pub duration_secs: u32,
    /// Fixed seed for reproducible bots and teleports. `None` draws one from the OS.
    pub seed: Option<u64>,
    pub view_width: f32,
    pub view_height: f32,
    /// How hard bots test whether a waypoint is visible.
    pub line_of_sight: LineOfSight,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            roster: vec![
                RosterEntry::human(Skill::Dash),
                RosterEntry::bot(BotTier::Medium, Skill::Dash),
            ],
            duration_secs: MATCH_SECONDS,
            seed: None,
            view_width: VIEW_WIDTH,
            view_height: VIEW_HEIGHT,
            line_of_sight: LineOfSight::Exact,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read match config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid match config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("roster must have between 2 and 4 entries, got {0}")]
    RosterSize(usize),
    #[error("view size must be positive, got {width}x{height}")]
    InvalidView { width: f32, height: f32 },
    #[error("match duration must be at least one second")]
    InvalidDuration,
}

impl MatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_ACTORS).contains(&self.roster.len()) {
            return Err(ConfigError::RosterSize(self.roster.len()));
        }
        if !(self.view_width > 0.0 && self.view_height > 0.0) {
            return Err(ConfigError::InvalidView {
                width: self.view_width,
                height: self.view_height,
            });
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::InvalidDuration);
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_secs))
    }
}

/// Where the launcher asked us to read the match and map from. Empty means built-in defaults.
#[derive(Resource, Debug, Clone, Default)]
pub struct LaunchOptions {
    pub config_path: Option<PathBuf>,
    pub map_path: Option<PathBuf>,
    pub seed: Option<u64>,
}

/// Randomness shared by bots and teleports, seeded per match.
#[derive(Resource)]
pub struct MatchRng(pub StdRng);

impl MatchRng {
    pub fn seeded(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

pub fn load_match_config(
    options: Res<LaunchOptions>,
    mut config: ResMut<MatchConfig>,
    mut rng: ResMut<MatchRng>,
) {
    if let Some(path) = options.config_path.as_deref() {
        match MatchConfig::load(path) {
            Ok(loaded) => {
                info!("Loaded match config from {}", path.display());
                *config = loaded;
            }
            Err(err) => warn!("{err}; keeping the current match config."),
        }
    }

    if options.seed.is_some() {
        config.seed = options.seed;
    }

    *rng = MatchRng::seeded(config.seed);
    info!(
        "Match: {} actors, {}s, seed {:?}",
        config.roster.len(),
        config.duration_secs,
        config.seed
    );
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        MatchConfig::default().validate().unwrap();
    }

    #[test]
    fn parses_roster_with_bot_tiers() {
        let config = MatchConfig::from_json_str(
            r#"{
                "roster": [
                    { "kind": "human", "skill": "double-jump" },
                    { "kind": { "bot": "hard" }, "skill": "teleport" },
                    { "kind": { "bot": "easy" } }
                ],
                "seed": 9,
                "line_of_sight": "conservative"
            }"#,
        )
        .unwrap();

        assert_eq!(config.roster.len(), 3);
        assert_eq!(config.roster[0], RosterEntry::human(Skill::DoubleJump));
        assert_eq!(
            config.roster[1],
            RosterEntry::bot(BotTier::Hard, Skill::Teleport)
        );
        assert_eq!(config.roster[2].skill, Skill::None);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.line_of_sight, LineOfSight::Conservative);
        assert_eq!(config.duration_secs, MATCH_SECONDS);
    }

    #[test]
    fn rejects_bad_roster_sizes() {
        let one = r#"{ "roster": [ { "kind": "human" } ] }"#;
        assert!(matches!(
            MatchConfig::from_json_str(one),
            Err(ConfigError::RosterSize(1))
        ));

        let mut five = MatchConfig::default();
        five.roster = vec![RosterEntry::human(Skill::None); 5];
        assert!(matches!(five.validate(), Err(ConfigError::RosterSize(5))));
    }

    #[test]
    fn rejects_zero_duration_and_view() {
        let mut config = MatchConfig::default();
        config.duration_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDuration)));

        let mut config = MatchConfig::default();
        config.view_height = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidView { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file_and_reads_real_one() {
        let missing = MatchConfig::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "roster": [ {{ "kind": "human" }}, {{ "kind": {{ "bot": "medium" }} }} ], "duration_secs": 30 }}"#
        )
        .unwrap();
        let config = MatchConfig::load(file.path()).unwrap();
        assert_eq!(config.duration(), Duration::from_secs(30));
    }

    #[test]
    fn same_seed_same_stream() {
        use rand::Rng;
        let mut a = MatchRng::seeded(Some(4));
        let mut b = MatchRng::seeded(Some(4));
        let xs: Vec<u32> = (0..8).map(|_| a.0.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.0.gen()).collect();
        assert_eq!(xs, ys);
    }
}
