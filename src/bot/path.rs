use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// How a bot decides whether a straight segment is blocked by a platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOfSight {
    /// Blocked only when the segment passes through the platform's interior.
    #[default]
    Exact,
    /// Blocked whenever the segment's endpoints do not fall cleanly on one side of the
    /// platform. Over-reports, which keeps hard bots close to the ground.
    Conservative,
}

impl LineOfSight {
    pub fn blocked(self, from: Vec2, to: Vec2, rect: Rect) -> bool {
        match self {
            Self::Exact => crosses_interior(from, to, rect),
            Self::Conservative => not_separated(from, to, rect),
        }
    }
}

/// Liang-Barsky clip against `rect`. Touching an edge or a corner does not count.
pub fn crosses_interior(from: Vec2, to: Vec2, rect: Rect) -> bool {
    let d = to - from;
    let mut enter = 0.0f32;
    let mut exit = 1.0f32;

    let edges = [
        (-d.x, from.x - rect.min.x),
        (d.x, rect.max.x - from.x),
        (-d.y, from.y - rect.min.y),
        (d.y, rect.max.y - from.y),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > exit {
                return false;
            }
            enter = enter.max(t);
        } else {
            if t < enter {
                return false;
            }
            exit = exit.min(t);
        }
    }

    let mid = from + d * ((enter + exit) * 0.5);
    mid.x > rect.min.x && mid.x < rect.max.x && mid.y > rect.min.y && mid.y < rect.max.y
}

fn not_separated(from: Vec2, to: Vec2, rect: Rect) -> bool {
    let separated = (from.x < rect.min.x && to.x < rect.min.x)
        || (from.x > rect.max.x && to.x > rect.max.x)
        || (from.y < rect.min.y && to.y < rect.min.y)
        || (from.y > rect.max.y && to.y > rect.max.y);
    !separated
}
