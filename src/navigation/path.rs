//! Turning a settled distance field into an ordered waypoint list and keeping
//! that list as straight as the obstacle field allows.
//!
//! Extraction backtracks from the start cell by always stepping to the
//! neighbour with the smallest settled distance until a distance of zero (a
//! goal or goal-tolerance cell) is reached. A waypoint is only recorded where
//! the backtrack changes direction, so long straight runs compress to their
//! two endpoints. When the search was seeded with a tolerance radius the
//! final waypoint is refined by interval bisection against the tolerance
//! circle instead of stopping at a coarse cell centre.
//!
//! [shortcut] is invoked every time the agent reaches a waypoint: it scans
//! from the far end of the list for the furthest waypoint still reachable by
//! an unobstructed straight segment, so the executed path is never worse
//! than the raw grid path and typically much straighter.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Reconstruct the waypoint list for a search that reported
/// [SearchStatus::Found]. The list starts at the exact continuous
/// `start_pos` and ends at the exact goal, or at the radius-refined
/// tolerance point when the search was seeded with one. Returns [None] when
/// the distance field is degenerate (no strictly-decreasing neighbour) or
/// the path exceeds [MAX_POINTS]
pub fn extract_path(
	search: &FrontierSearch,
	grid: &OccupancyGrid,
	start_pos: Vec2,
) -> Option<Vec<Vec2>> {
	let mut cell = search.get_start();
	let mut remaining = search.get_distance(cell)?;
	let mut waypoints = vec![start_pos];
	let mut last_step: Option<(i32, i32)> = None;
	while remaining > 0 {
		let mut best: Option<(GridCell, u32, (i32, i32))> = None;
		for heading in Heading::all() {
			let (dx, dy) = heading.step();
			let neighbour = cell.offset(dx, dy);
			if let Some(d) = search.get_distance(neighbour) {
				if d < remaining && best.is_none_or(|(_, bd, _)| d < bd) {
					best = Some((neighbour, d, (dx, dy)));
				}
			}
		}
		// a settled cell with no cheaper neighbour means the field is corrupt
		let (next, next_distance, step) = best?;
		if let Some(previous) = last_step {
			if previous != step {
				waypoints.push(grid.cell_center(cell));
				if waypoints.len() >= MAX_POINTS {
					return None;
				}
			}
		}
		last_step = Some(step);
		cell = next;
		remaining = next_distance;
	}
	let goal = search.get_goal();
	let radius = search.get_goal_radius();
	if radius > 0.0 {
		waypoints.push(refine_against_circle(
			*waypoints.last()?,
			grid.cell_center(cell),
			goal,
			radius,
		));
	} else {
		waypoints.push(goal);
	}
	Some(waypoints)
}

/// Bisect between an outside point and a point inside the tolerance circle to
/// land the final waypoint on the circle of `radius` around `goal` instead
/// of a coarse cell centre
fn refine_against_circle(outside: Vec2, inside: Vec2, goal: Vec2, radius: f32) -> Vec2 {
	if outside.distance(goal) <= radius {
		// the whole final segment is already within tolerance
		return outside;
	}
	let mut low = outside;
	let mut high = inside;
	for _ in 0..BISECTION_ITERATIONS {
		let mid = (low + high) * 0.5;
		if mid.distance(goal) > radius {
			low = mid;
		} else {
			high = mid;
		}
	}
	high
}

/// From the waypoint at `current`, the index of the furthest waypoint
/// reachable by an unobstructed straight segment. Falls back to the next
/// waypoint when nothing further qualifies
pub fn shortcut(grid: &OccupancyGrid, waypoints: &[Vec2], current: usize) -> usize {
	let last = waypoints.len().saturating_sub(1);
	if current >= last {
		return last;
	}
	let from = waypoints[current];
	for candidate in ((current + 2)..=last).rev() {
		if grid.test_line_of_sight(from, waypoints[candidate]) {
			return candidate;
		}
	}
	current + 1
}
