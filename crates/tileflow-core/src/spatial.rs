//! Grid coordinates, cardinal directions, and world-space rectangles.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GridPosition
// ---------------------------------------------------------------------------

/// A position on a 2D grid, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position in the given direction.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        self.translate(dx, dy)
    }

    /// Position translated by a signed offset. Saturates at the `i32` range,
    /// which lies outside every grid.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Centre of this cell in world units.
    pub fn to_world(self, tile_size: f32) -> (f32, f32) {
        (self.x as f32 * tile_size, self.y as f32 * tile_size)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Cardinal directions, indexed clockwise from north. North is +y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions in index order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Direction for a rotation index; wraps modulo 4.
    pub fn from_index(index: u8) -> Self {
        Self::all()[(index % 4) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Offset for this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Rotate 90 degrees clockwise.
    pub fn rotate_cw(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Rotate 90 degrees counter-clockwise.
    pub fn rotate_ccw(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Direction of travel from `from` into `to`, if they are cardinally adjacent.
    pub fn between(from: GridPosition, to: GridPosition) -> Option<Self> {
        let dx = i64::from(to.x) - i64::from(from.x);
        let dy = i64::from(to.y) - i64::from(from.y);
        match (dx, dy) {
            (0, 1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, -1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle in world units. `x`/`y` is the minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on a point.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_follows_direction() {
        let p = GridPosition::new(5, 5);
        assert_eq!(p.step(Direction::North), GridPosition::new(5, 6));
        assert_eq!(p.step(Direction::East), GridPosition::new(6, 5));
        assert_eq!(p.step(Direction::South), GridPosition::new(5, 4));
        assert_eq!(p.step(Direction::West), GridPosition::new(4, 5));
    }

    #[test]
    fn rotation_wraps() {
        assert_eq!(Direction::North.rotate_ccw(), Direction::West);
        assert_eq!(Direction::West.rotate_cw(), Direction::North);
        assert_eq!(Direction::from_index(6), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
    }

    #[test]
    fn between_adjacent_only() {
        let a = GridPosition::new(5, 4);
        let b = GridPosition::new(5, 5);
        assert_eq!(Direction::between(a, b), Some(Direction::North));
        assert_eq!(Direction::between(b, a), Some(Direction::South));
        assert_eq!(Direction::between(a, GridPosition::new(6, 5)), None);
        assert_eq!(Direction::between(a, a), None);
    }

    #[test]
    fn far_positions_saturate_instead_of_overflowing() {
        let far = GridPosition::new(i32::MIN, 5);
        assert_eq!(Direction::between(far, GridPosition::new(5, 5)), None);
        assert_eq!(Direction::between(GridPosition::new(i32::MAX, 0), far), None);
        assert_eq!(far.step(Direction::West), far);
        assert_eq!(
            GridPosition::new(i32::MAX, 0).translate(3, -1),
            GridPosition::new(i32::MAX, -1)
        );
        assert_eq!(far.manhattan_distance(&GridPosition::new(i32::MAX, 5)), u32::MAX);
    }

    #[test]
    fn manhattan_distance() {
        let a = GridPosition::new(-2, 5);
        let b = GridPosition::new(3, -1);
        assert_eq!(a.manhattan_distance(&b), 11);
    }

    #[test]
    fn rect_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 8.0, 8.0);
        let touching = Rect::new(8.0, 0.0, 8.0, 8.0);
        let inside = Rect::centered(4.0, 4.0, 2.0, 2.0);
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
    }
}
