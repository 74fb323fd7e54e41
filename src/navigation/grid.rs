//! The [OccupancyGrid] classifies a bounded square region of the world into
//! `blocked` and `free` cells for one navigation attempt. It is a two-layer
//! bitmap: layer 0 records blocked cells derived from steep terrain, deep
//! water and the inflated collision circles of other objects, layer 1 is the
//! `visited` scratch marker the frontier search writes as it expands.
//!
//! An example blocked layer with an object circle and a steep ridge may look:
//!
//! ```text
//!  _____________________________
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|xx|xx|__|__|__|__|
//! |__|__|__|xx|xx|xx|xx|__|__|__|
//! |__|__|__|__|xx|xx|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |xx|xx|__|__|__|__|__|__|__|__|
//! |xx|xx|xx|__|__|__|__|__|__|__|
//! |xx|xx|xx|xx|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! ```
//!
//! Terrain-derived blocking is rasterized lazily: the covered rectangle grows
//! monotonically as queries touch cells outside it and never shrinks for the
//! lifetime of the bitmap. Reads outside the grid answer "not blocked" by
//! convention.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Two-layer occupancy bitmap over a square region of the world
pub struct OccupancyGrid {
	/// Number of cells per side
	side: usize,
	/// Width of a cell in world units
	cell_size: f32,
	/// World position of the corner of cell `(0, 0)`
	origin: Vec2,
	/// Layer 0, one bit per cell marking the cell as blocked
	blocked: Vec<u8>,
	/// Layer 1, one bit per cell marking the cell as visited during a search
	visited: Vec<u8>,
	/// Inclusive rectangle of cells whose terrain classification has been
	/// rasterized, grows monotonically
	covered: Option<(GridCell, GridCell)>,
}

impl OccupancyGrid {
	/// Create a grid of `side` by `side` cells of `cell_size` world units,
	/// centred on `center`
	pub fn new(center: Vec2, side: usize, cell_size: f32) -> Self {
		let half = side as f32 * cell_size * 0.5;
		let bytes = (side * side).div_ceil(8);
		OccupancyGrid {
			side,
			cell_size,
			origin: center - Vec2::splat(half),
			blocked: vec![0; bytes],
			visited: vec![0; bytes],
			covered: None,
		}
	}
	/// Number of cells per side
	pub fn get_side(&self) -> usize {
		self.side
	}
	/// Width of a cell in world units
	pub fn get_cell_size(&self) -> f32 {
		self.cell_size
	}
	/// The cell containing a world position
	pub fn world_to_cell(&self, pos: Vec2) -> GridCell {
		let local = (pos - self.origin) / self.cell_size;
		GridCell::new(local.x.floor() as i32, local.y.floor() as i32)
	}
	/// World position of the centre of a cell
	pub fn cell_center(&self, cell: GridCell) -> Vec2 {
		self.origin
			+ Vec2::new(
				(cell.get_x() as f32 + 0.5) * self.cell_size,
				(cell.get_y() as f32 + 0.5) * self.cell_size,
			)
	}
	/// Whether a cell lies inside the grid
	pub fn in_bounds(&self, cell: GridCell) -> bool {
		cell.get_x() >= 0
			&& cell.get_y() >= 0
			&& (cell.get_x() as usize) < self.side
			&& (cell.get_y() as usize) < self.side
	}
	/// Flat index of an in-bounds cell
	fn index(&self, cell: GridCell) -> usize {
		cell.get_y() as usize * self.side + cell.get_x() as usize
	}
	/// Read one bit of a layer
	fn get_bit(plane: &[u8], index: usize) -> bool {
		plane[index / 8] & (1 << (index % 8)) != 0
	}
	/// Write one bit of a layer
	fn set_bit(plane: &mut [u8], index: usize, value: bool) {
		if value {
			plane[index / 8] |= 1 << (index % 8);
		} else {
			plane[index / 8] &= !(1 << (index % 8));
		}
	}
	/// Whether a cell is blocked, cells outside the grid are never blocked
	pub fn is_blocked(&self, cell: GridCell) -> bool {
		if !self.in_bounds(cell) {
			return false;
		}
		Self::get_bit(&self.blocked, self.index(cell))
	}
	/// Mark a cell as blocked, out-of-range cells are ignored
	pub fn set_blocked(&mut self, cell: GridCell) {
		if self.in_bounds(cell) {
			let index = self.index(cell);
			Self::set_bit(&mut self.blocked, index, true);
		}
	}
	/// Clear the blocked marker of a cell, out-of-range cells are ignored
	pub fn clear_blocked(&mut self, cell: GridCell) {
		if self.in_bounds(cell) {
			let index = self.index(cell);
			Self::set_bit(&mut self.blocked, index, false);
		}
	}
	/// Whether a cell carries the search `visited` marker
	pub fn is_visited(&self, cell: GridCell) -> bool {
		if !self.in_bounds(cell) {
			return false;
		}
		Self::get_bit(&self.visited, self.index(cell))
	}
	/// Set the search `visited` marker of a cell
	pub fn mark_visited(&mut self, cell: GridCell) {
		if self.in_bounds(cell) {
			let index = self.index(cell);
			Self::set_bit(&mut self.visited, index, true);
		}
	}
	/// Clear the whole `visited` layer ready for a fresh search
	pub fn reset_visited(&mut self) {
		self.visited.fill(0);
	}
	/// Mark every cell whose centre lies within `radius` of `center` as
	/// blocked
	pub fn rasterize_circle(&mut self, center: Vec2, radius: f32) {
		self.stamp_circle(center, radius, true);
	}
	/// Clear the blocked marker of every cell whose centre lies within
	/// `radius` of `center`. Used to free the departure footprint so an agent
	/// is never trapped by the rasterization of its own surroundings
	pub fn clear_circle(&mut self, center: Vec2, radius: f32) {
		self.stamp_circle(center, radius, false);
	}
	/// Write `value` into the blocked layer for every cell centre within the
	/// circle
	fn stamp_circle(&mut self, center: Vec2, radius: f32, value: bool) {
		let min = self.world_to_cell(center - Vec2::splat(radius));
		let max = self.world_to_cell(center + Vec2::splat(radius));
		for y in min.get_y()..=max.get_y() {
			for x in min.get_x()..=max.get_x() {
				let cell = GridCell::new(x, y);
				if !self.in_bounds(cell) {
					continue;
				}
				if self.cell_center(cell).distance(center) <= radius {
					let index = self.index(cell);
					Self::set_bit(&mut self.blocked, index, value);
				}
			}
		}
	}
	/// Rasterize the inflated collision circles of every active obstacle onto
	/// the blocked layer. Transported objects, entities in `exclude` (the
	/// agent itself and any cargo being approached) and kinds the profile
	/// declares exempt leave no footprint
	pub fn rasterize_objects(
		&mut self,
		obstacles: &[NavObstacle],
		exclude: &[Entity],
		inflate: f32,
		profile: &AgentProfile,
	) {
		for obstacle in obstacles {
			if obstacle.transported
				|| exclude.contains(&obstacle.entity)
				|| profile.is_exempt(obstacle.kind)
			{
				continue;
			}
			for sphere in &obstacle.spheres {
				self.rasterize_circle(flat(sphere.center), sphere.radius + inflate);
			}
		}
	}
	/// Lazily rasterize terrain-derived blocking for every cell of the
	/// rectangle `min..=max` not yet covered, expanding the covered rectangle
	/// monotonically
	pub fn ensure_region_loaded(&mut self, min: GridCell, max: GridCell, sampler: &TerrainSampler) {
		let min = GridCell::new(
			min.get_x().clamp(0, self.side as i32 - 1),
			min.get_y().clamp(0, self.side as i32 - 1),
		);
		let max = GridCell::new(
			max.get_x().clamp(0, self.side as i32 - 1),
			max.get_y().clamp(0, self.side as i32 - 1),
		);
		let (new_min, new_max, old) = match self.covered {
			None => (min, max, None),
			Some((cmin, cmax)) => {
				if min.get_x() >= cmin.get_x()
					&& min.get_y() >= cmin.get_y()
					&& max.get_x() <= cmax.get_x()
					&& max.get_y() <= cmax.get_y()
				{
					return;
				}
				(
					GridCell::new(
						min.get_x().min(cmin.get_x()),
						min.get_y().min(cmin.get_y()),
					),
					GridCell::new(
						max.get_x().max(cmax.get_x()),
						max.get_y().max(cmax.get_y()),
					),
					Some((cmin, cmax)),
				)
			}
		};
		for y in new_min.get_y()..=new_max.get_y() {
			for x in new_min.get_x()..=new_max.get_x() {
				if let Some((cmin, cmax)) = old {
					if x >= cmin.get_x()
						&& x <= cmax.get_x() && y >= cmin.get_y()
						&& y <= cmax.get_y()
					{
						continue;
					}
				}
				let cell = GridCell::new(x, y);
				if sampler.is_terrain_blocked(self.cell_center(cell)) {
					self.set_blocked(cell);
				}
			}
		}
		self.covered = Some((new_min, new_max));
	}
	/// The covered rectangle of terrain-classified cells, [None] before the
	/// first load
	pub fn get_coverage(&self) -> Option<(GridCell, GridCell)> {
		self.covered
	}
	/// Voxel traversal from `a` to `b` answering whether the straight segment
	/// between them crosses no blocked cell. The degenerate same-cell case is
	/// always clear. Endpoints are canonically ordered first so the test is
	/// symmetric in its arguments
	pub fn test_line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
		let cell_a = self.world_to_cell(a);
		let cell_b = self.world_to_cell(b);
		if cell_a == cell_b {
			return true;
		}
		// canonical ordering makes the traversal independent of direction
		let (start, end, start_cell, end_cell) = if cell_b < cell_a {
			(b, a, cell_b, cell_a)
		} else {
			(a, b, cell_a, cell_b)
		};
		let delta = end - start;
		let mut cell = start_cell;
		let step_x: i32 = if delta.x > 0.0 { 1 } else { -1 };
		let step_y: i32 = if delta.y > 0.0 { 1 } else { -1 };
		// distance along the segment, as a fraction of its length, to the
		// next cell boundary on each axis
		let mut t_max_x = if delta.x == 0.0 {
			f32::INFINITY
		} else {
			let edge = self.origin.x
				+ (cell.get_x() + if step_x > 0 { 1 } else { 0 }) as f32 * self.cell_size;
			(edge - start.x) / delta.x
		};
		let mut t_max_y = if delta.y == 0.0 {
			f32::INFINITY
		} else {
			let edge = self.origin.y
				+ (cell.get_y() + if step_y > 0 { 1 } else { 0 }) as f32 * self.cell_size;
			(edge - start.y) / delta.y
		};
		let t_delta_x = if delta.x == 0.0 {
			f32::INFINITY
		} else {
			(self.cell_size / delta.x).abs()
		};
		let t_delta_y = if delta.y == 0.0 {
			f32::INFINITY
		} else {
			(self.cell_size / delta.y).abs()
		};
		let max_steps = ((end_cell.get_x() - start_cell.get_x()).unsigned_abs()
			+ (end_cell.get_y() - start_cell.get_y()).unsigned_abs()
			+ 2) as usize;
		for _ in 0..max_steps {
			if self.is_blocked(cell) {
				return false;
			}
			if cell == end_cell {
				return true;
			}
			if t_max_x < t_max_y {
				t_max_x += t_delta_x;
				cell = cell.offset(step_x, 0);
			} else {
				t_max_y += t_delta_y;
				cell = cell.offset(0, step_y);
			}
		}
		!self.is_blocked(end_cell)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Flat frictionless terrain for exercising the grid in isolation
	struct FlatTerrain;
	impl TerrainOracle for FlatTerrain {
		fn floor_height(&self, _pos: Vec2) -> f32 {
			0.0
		}
		fn fine_slope(&self, _pos: Vec2) -> f32 {
			0.0
		}
		fn water_level(&self) -> f32 {
			-10.0
		}
		fn max_flying_height(&self) -> f32 {
			100.0
		}
	}

	/// Terrain with an impassably steep band for `x > 0`
	struct RidgeTerrain;
	impl TerrainOracle for RidgeTerrain {
		fn floor_height(&self, _pos: Vec2) -> f32 {
			0.0
		}
		fn fine_slope(&self, pos: Vec2) -> f32 {
			if pos.x > 0.0 {
				1.2
			} else {
				0.0
			}
		}
		fn water_level(&self) -> f32 {
			-10.0
		}
		fn max_flying_height(&self) -> f32 {
			100.0
		}
	}

	#[test]
	fn world_cell_round_trip() {
		let grid = OccupancyGrid::new(Vec2::ZERO, 10, 1.0);
		let cell = grid.world_to_cell(Vec2::new(0.5, 0.5));
		assert_eq!(cell, GridCell::new(5, 5));
		assert_eq!(grid.cell_center(cell), Vec2::new(0.5, 0.5));
	}
	#[test]
	fn out_of_range_is_not_blocked() {
		let grid = OccupancyGrid::new(Vec2::ZERO, 10, 1.0);
		assert!(!grid.is_blocked(GridCell::new(-3, 2)));
		assert!(!grid.is_blocked(GridCell::new(25, 25)));
	}
	#[test]
	fn circle_blocks_and_clears() {
		let mut grid = OccupancyGrid::new(Vec2::ZERO, 10, 1.0);
		grid.rasterize_circle(Vec2::new(0.5, 0.5), 1.6);
		let centre = grid.world_to_cell(Vec2::new(0.5, 0.5));
		assert!(grid.is_blocked(centre));
		assert!(grid.is_blocked(centre.offset(1, 0)));
		assert!(!grid.is_blocked(centre.offset(3, 3)));
		grid.clear_circle(Vec2::new(0.5, 0.5), 1.6);
		assert!(!grid.is_blocked(centre));
	}
	#[test]
	fn line_of_sight_same_cell() {
		let mut grid = OccupancyGrid::new(Vec2::ZERO, 10, 1.0);
		grid.rasterize_circle(Vec2::new(0.5, 0.5), 0.4);
		// degenerate case is clear even over a blocked cell
		assert!(grid.test_line_of_sight(Vec2::new(0.4, 0.4), Vec2::new(0.6, 0.6)));
	}
	#[test]
	fn line_of_sight_blocked_by_wall() {
		//  _____________________________
		// |__|__|__|__|__|__|__|__|__|__|
		// |__|__|__|__|xx|__|__|__|__|__|
		// |__|__|__|__|xx|__|__|__|__|__|
		// |A_|__|__|__|xx|__|__|__|__|B_|
		// |__|__|__|__|xx|__|__|__|__|__|
		let mut grid = OccupancyGrid::new(Vec2::ZERO, 10, 1.0);
		for y in 1..5 {
			grid.set_blocked(GridCell::new(4, y));
		}
		let a = grid.cell_center(GridCell::new(0, 3));
		let b = grid.cell_center(GridCell::new(9, 3));
		assert!(!grid.test_line_of_sight(a, b));
		let above = grid.cell_center(GridCell::new(0, 7));
		let target = grid.cell_center(GridCell::new(9, 7));
		assert!(grid.test_line_of_sight(above, target));
	}
	#[test]
	fn line_of_sight_is_symmetric() {
		let mut grid = OccupancyGrid::new(Vec2::ZERO, 16, 1.0);
		grid.rasterize_circle(Vec2::new(1.0, 2.0), 1.5);
		grid.rasterize_circle(Vec2::new(-3.0, -1.0), 2.0);
		let probes = [
			(Vec2::new(-7.0, -7.0), Vec2::new(7.0, 7.0)),
			(Vec2::new(-6.5, 3.2), Vec2::new(5.1, -4.4)),
			(Vec2::new(0.3, -6.0), Vec2::new(0.8, 6.0)),
			(Vec2::new(-7.0, 2.0), Vec2::new(7.0, 2.0)),
		];
		for (a, b) in probes {
			assert_eq!(
				grid.test_line_of_sight(a, b),
				grid.test_line_of_sight(b, a)
			);
		}
	}
	#[test]
	fn region_load_marks_steep_terrain() {
		let mut grid = OccupancyGrid::new(Vec2::ZERO, 10, 1.0);
		let profile = AgentProfile::default();
		let sampler = TerrainSampler {
			terrain: &RidgeTerrain,
			profile: &profile,
		};
		grid.ensure_region_loaded(GridCell::new(0, 0), GridCell::new(9, 9), &sampler);
		// cells east of the origin (x > 0 in world space) sit on the ridge
		assert!(grid.is_blocked(GridCell::new(7, 5)));
		assert!(!grid.is_blocked(GridCell::new(2, 5)));
	}
	#[test]
	fn coverage_grows_monotonically() {
		let mut grid = OccupancyGrid::new(Vec2::ZERO, 20, 1.0);
		let profile = AgentProfile::default();
		let sampler = TerrainSampler {
			terrain: &FlatTerrain,
			profile: &profile,
		};
		grid.ensure_region_loaded(GridCell::new(5, 5), GridCell::new(8, 8), &sampler);
		assert_eq!(
			grid.get_coverage(),
			Some((GridCell::new(5, 5), GridCell::new(8, 8)))
		);
		// a query inside the covered rectangle leaves it untouched
		grid.ensure_region_loaded(GridCell::new(6, 6), GridCell::new(7, 7), &sampler);
		assert_eq!(
			grid.get_coverage(),
			Some((GridCell::new(5, 5), GridCell::new(8, 8)))
		);
		// a query outside expands it to the union
		grid.ensure_region_loaded(GridCell::new(2, 7), GridCell::new(3, 12), &sampler);
		assert_eq!(
			grid.get_coverage(),
			Some((GridCell::new(2, 5), GridCell::new(8, 12)))
		);
	}
	#[test]
	fn exempt_kinds_leave_no_footprint() {
		let mut grid = OccupancyGrid::new(Vec2::ZERO, 10, 1.0);
		let profile = AgentProfile {
			exempt_kinds: vec![NavObstacleKind::Pickup],
			..Default::default()
		};
		let obstacles = vec![
			NavObstacle {
				entity: Entity::from_raw(1),
				spheres: vec![CollisionSphere {
					center: Vec3::new(-2.5, 0.0, -2.5),
					radius: 1.0,
				}],
				kind: NavObstacleKind::Pickup,
				team: 0,
				transported: false,
			},
			NavObstacle {
				entity: Entity::from_raw(2),
				spheres: vec![CollisionSphere {
					center: Vec3::new(2.5, 0.0, 2.5),
					radius: 1.0,
				}],
				kind: NavObstacleKind::Building,
				team: 0,
				transported: false,
			},
		];
		grid.rasterize_objects(&obstacles, &[], 0.5, &profile);
		assert!(!grid.is_blocked(grid.world_to_cell(Vec2::new(-2.5, -2.5))));
		assert!(grid.is_blocked(grid.world_to_cell(Vec2::new(2.5, 2.5))));
	}
}
