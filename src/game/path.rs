//! Path model and surface scaling

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Width of the surface the path patterns are authored for
pub const BASE_WIDTH: f32 = 800.0;
/// Height of the surface the path patterns are authored for
pub const BASE_HEIGHT: f32 = 400.0;

/// A point on the playing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Rendering surface the simulation is currently laid out on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn scale_x(&self) -> f32 {
        self.width / BASE_WIDTH
    }

    pub fn scale_y(&self) -> f32 {
        self.height / BASE_HEIGHT
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            width: BASE_WIDTH,
            height: BASE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("a path needs at least two waypoints, got {0}")]
    TooShort(usize),
}

/// Ordered waypoints enemies walk from the first to the last (the core).
/// Coordinates are in base surface units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Path {
    waypoints: Vec<Point>,
}

impl Path {
    pub fn new(waypoints: Vec<Point>) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooShort(waypoints.len()));
        }
        Ok(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }

    /// Waypoints laid out on the given surface
    pub fn scaled(&self, surface: Surface) -> Vec<Point> {
        let (sx, sy) = (surface.scale_x(), surface.scale_y());
        self.waypoints
            .iter()
            .map(|p| Point::new(p.x * sx, p.y * sy))
            .collect()
    }

    /// Pick one of the built-in patterns at random
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let patterns = PathPattern::ALL;
        let pattern = patterns[rng.gen_range(0..patterns.len())];
        pattern.path()
    }
}

impl TryFrom<Vec<Point>> for Path {
    type Error = PathError;

    fn try_from(waypoints: Vec<Point>) -> Result<Self, Self::Error> {
        Path::new(waypoints)
    }
}

impl From<Path> for Vec<Point> {
    fn from(path: Path) -> Self {
        path.waypoints
    }
}

/// Built-in path layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    Zigzag,
    Spiral,
    SCurve,
    LShape,
    DoubleBend,
}

impl PathPattern {
    pub const ALL: [PathPattern; 5] = [
        PathPattern::Zigzag,
        PathPattern::Spiral,
        PathPattern::SCurve,
        PathPattern::LShape,
        PathPattern::DoubleBend,
    ];

    fn coordinates(self) -> &'static [(f32, f32)] {
        match self {
            PathPattern::Zigzag => &[
                (0.0, 200.0),
                (150.0, 200.0),
                (150.0, 100.0),
                (300.0, 100.0),
                (300.0, 300.0),
                (450.0, 300.0),
                (450.0, 150.0),
                (600.0, 150.0),
                (600.0, 250.0),
                (750.0, 250.0),
            ],
            PathPattern::Spiral => &[
                (0.0, 350.0),
                (200.0, 350.0),
                (200.0, 100.0),
                (600.0, 100.0),
                (600.0, 300.0),
                (300.0, 300.0),
                (300.0, 200.0),
                (500.0, 200.0),
                (500.0, 250.0),
                (400.0, 250.0),
            ],
            PathPattern::SCurve => &[
                (0.0, 100.0),
                (200.0, 100.0),
                (300.0, 200.0),
                (400.0, 300.0),
                (500.0, 200.0),
                (600.0, 100.0),
                (750.0, 200.0),
            ],
            PathPattern::LShape => &[
                (0.0, 300.0),
                (300.0, 300.0),
                (300.0, 100.0),
                (500.0, 100.0),
                (500.0, 350.0),
                (700.0, 350.0),
                (700.0, 200.0),
            ],
            PathPattern::DoubleBend => &[
                (0.0, 150.0),
                (150.0, 150.0),
                (250.0, 250.0),
                (350.0, 150.0),
                (450.0, 250.0),
                (550.0, 150.0),
                (650.0, 250.0),
                (750.0, 150.0),
            ],
        }
    }

    pub fn path(self) -> Path {
        Path {
            waypoints: self
                .coordinates()
                .iter()
                .map(|&(x, y)| Point::new(x, y))
                .collect(),
        }
    }
}
