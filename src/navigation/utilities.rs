//! Shared structures and tools used by the navigation components
//!

use bevy::prelude::*;

/// Integer cost of stepping between two orthogonally adjacent cells
pub const STRAIGHT_COST: u32 = 5;
/// Integer cost of stepping between two diagonally adjacent cells, `7/5` approximates `sqrt(2)`
pub const DIAGONAL_COST: u32 = 7;
/// Number of ring buckets in the search frontier queue, costs beyond this horizon from the current minimum spill into an overflow bucket
pub const NUM_QUEUE_BUCKETS: usize = 32;
/// Upper bound on the number of waypoints a reconstructed path may contain
pub const MAX_POINTS: usize = 500;
/// Number of frontier expansions a single search invocation may perform before yielding back to the caller
pub const SEARCH_BUDGET_PER_TICK: usize = 4000;
/// Fixed iteration count used when bisecting the final waypoint against the goal tolerance circle
pub const BISECTION_ITERATIONS: usize = 12;

/// ID of a cell within the occupancy grid, derived from world coordinates by
/// `floor((world - origin) / cell_size)`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct GridCell((i32, i32));

impl GridCell {
	/// Create a new instance of [GridCell]
	pub fn new(x: i32, y: i32) -> Self {
		GridCell((x, y))
	}
	/// Get the `(x, y)` tuple
	pub fn get_xy(&self) -> (i32, i32) {
		self.0
	}
	/// Get the cell column
	pub fn get_x(&self) -> i32 {
		self.0 .0
	}
	/// Get the cell row
	pub fn get_y(&self) -> i32 {
		self.0 .1
	}
	/// Produce the cell offset from this one by `(dx, dy)`
	pub fn offset(&self, dx: i32, dy: i32) -> GridCell {
		GridCell((self.0 .0 + dx, self.0 .1 + dy))
	}
	/// Chebyshev-style octile distance to `other` using the integer step costs, an
	/// admissible estimate of the true 8-connected path cost
	pub fn octile_distance(&self, other: &GridCell) -> u32 {
		let dx = (self.get_x() - other.get_x()).unsigned_abs();
		let dy = (self.get_y() - other.get_y()).unsigned_abs();
		let diag = dx.min(dy);
		let straight = dx.max(dy) - diag;
		diag * DIAGONAL_COST + straight * STRAIGHT_COST
	}
}

/// Convenience way of accessing the 8 directions of movement across the occupancy grid
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Reflect)]
pub enum Heading {
	North,
	NorthEast,
	East,
	SouthEast,
	South,
	SouthWest,
	West,
	NorthWest,
}

impl Heading {
	/// All 8 headings in clockwise order starting from [Heading::North]
	pub fn all() -> [Heading; 8] {
		[
			Heading::North,
			Heading::NorthEast,
			Heading::East,
			Heading::SouthEast,
			Heading::South,
			Heading::SouthWest,
			Heading::West,
			Heading::NorthWest,
		]
	}
	/// The `(dx, dy)` cell offset of a single step along this heading
	pub fn step(&self) -> (i32, i32) {
		match self {
			Heading::North => (0, -1),
			Heading::NorthEast => (1, -1),
			Heading::East => (1, 0),
			Heading::SouthEast => (1, 1),
			Heading::South => (0, 1),
			Heading::SouthWest => (-1, 1),
			Heading::West => (-1, 0),
			Heading::NorthWest => (-1, -1),
		}
	}
	/// Whether a step along this heading crosses a cell corner
	pub fn is_diagonal(&self) -> bool {
		matches!(
			self,
			Heading::NorthEast | Heading::SouthEast | Heading::SouthWest | Heading::NorthWest
		)
	}
	/// Integer cost of a single step along this heading
	pub fn step_cost(&self) -> u32 {
		if self.is_diagonal() {
			DIAGONAL_COST
		} else {
			STRAIGHT_COST
		}
	}
}

/// Drop a world position onto the horizontal plane, i.e. `(x, z)`
pub fn flat(pos: Vec3) -> Vec2 {
	Vec2::new(pos.x, pos.z)
}

/// Wrap an angle in radians into the range `(-PI, PI]`
pub fn normalize_angle(mut angle: f32) -> f32 {
	use std::f32::consts::PI;
	while angle > PI {
		angle -= 2.0 * PI;
	}
	while angle <= -PI {
		angle += 2.0 * PI;
	}
	angle
}

/// The yaw angle of a horizontal direction vector, measured about the vertical
/// axis with `0` along `+z`
pub fn yaw_of(dir: Vec2) -> f32 {
	dir.x.atan2(dir.y)
}

/// The horizontal unit vector pointing along `yaw`
pub fn dir_of(yaw: f32) -> Vec2 {
	Vec2::new(yaw.sin(), yaw.cos())
}
