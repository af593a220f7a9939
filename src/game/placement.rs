//! Tower placement rules

use super::catalog::{TowerKind, TowerStats, Tunables};
use super::path::{Point, Surface};
use super::registry::Tower;

/// Why a tower could not be placed. No state is changed on rejection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("insufficient credits: tower costs {cost}, have {available}")]
    InsufficientCredits { cost: u32, available: u32 },

    #[error("position is on the enemy path")]
    OnPath,

    #[error("position is too close to another tower")]
    TooCloseToTower,

    #[error("game is not running")]
    Inactive,
}

/// Decides whether a proposed tower position is legal
pub struct PlacementValidator<'a> {
    tunables: &'a Tunables,
    surface: Surface,
    path: &'a [Point],
}

impl<'a> PlacementValidator<'a> {
    /// `path` must already be scaled to `surface`
    pub fn new(tunables: &'a Tunables, surface: Surface, path: &'a [Point]) -> Self {
        Self {
            tunables,
            surface,
            path,
        }
    }

    /// Check a placement without mutating anything
    pub fn validate(
        &self,
        at: Point,
        kind: TowerKind,
        credits: u32,
        towers: &[Tower],
    ) -> Result<(), PlacementError> {
        let cost = TowerStats::for_kind(kind).cost;
        if credits < cost {
            return Err(PlacementError::InsufficientCredits {
                cost,
                available: credits,
            });
        }

        let scale = self.surface.scale_x();

        let separation = self.tunables.tower_separation * scale;
        if towers.iter().any(|t| t.position().distance_to(at) < separation) {
            return Err(PlacementError::TooCloseToTower);
        }

        let clearance = self.tunables.path_clearance * scale;
        if self.path.iter().any(|p| p.distance_to(at) < clearance) {
            return Err(PlacementError::OnPath);
        }

        Ok(())
    }

    /// Validate, then deduct the cost and append the new tower
    pub fn place(
        &self,
        at: Point,
        kind: TowerKind,
        credits: &mut u32,
        towers: &mut Vec<Tower>,
    ) -> Result<Tower, PlacementError> {
        self.validate(at, kind, *credits, towers)?;

        let stats = TowerStats::for_kind(kind);
        let tower = Tower {
            x: at.x,
            y: at.y,
            kind,
            level: 1,
            range: stats.range * self.surface.scale_x(),
            last_shot: None,
        };

        *credits -= stats.cost;
        towers.push(tower.clone());
        Ok(tower)
    }
}
