//! An incremental uniform-cost search across the [OccupancyGrid] from the
//! goal back to the agent. Searching goal-to-start means the goal tolerance
//! circle becomes a natural multi-source seed set while the continuous start
//! position stays the single termination cell.
//!
//! The frontier is ordered by an approximate priority queue: a small ring of
//! [NUM_QUEUE_BUCKETS] buckets keyed by `total_cost % NUM_QUEUE_BUCKETS`
//! where `total_cost` is the settled distance from the goal plus the octile
//! heuristic towards the start (weights [STRAIGHT_COST]/[DIAGONAL_COST]).
//! Costs beyond the bucket horizon from the current minimum wait in an
//! overflow bucket and are folded back into the ring as the minimum
//! advances. Entries are never removed on improvement, instead a cheaper
//! duplicate is enqueued and the stale entry is recognised at pop time by
//! re-comparing its cost.
//!
//! The whole expansion is amortized: each [FrontierSearch::advance] call
//! performs at most a bounded number of expansions and then yields
//! [SearchStatus::InProgress], so the host loop can spread a long search
//! across frames.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Outcome of one [FrontierSearch::advance] invocation
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SearchStatus {
	/// The frontier reached the start cell, the distance field is ready for
	/// path extraction
	Found,
	/// The per-invocation expansion budget ran out, call again next tick
	InProgress,
	/// The frontier emptied without reaching the start, no path exists under
	/// the current obstacle classification
	Unreachable,
}

/// Pending frontier entries in a ring of cost-keyed buckets plus one
/// overflow bucket for entries beyond the horizon
pub struct BucketQueue {
	/// The ring, bucket `i` holds entries whose cost is congruent to `i`
	/// modulo [NUM_QUEUE_BUCKETS] and within the horizon of the minimum
	buckets: Vec<Vec<(u32, u32)>>,
	/// Entries whose cost exceeded the horizon when they were pushed
	overflow: Vec<(u32, u32)>,
	/// Lower bound on the cost of every pending entry
	min_cost: u32,
	/// Entries currently in the ring
	ring_len: usize,
	/// Total pending entries
	len: usize,
}

impl Default for BucketQueue {
	fn default() -> Self {
		BucketQueue {
			buckets: vec![Vec::new(); NUM_QUEUE_BUCKETS],
			overflow: Vec::new(),
			min_cost: 0,
			ring_len: 0,
			len: 0,
		}
	}
}

impl BucketQueue {
	/// Number of pending entries
	pub fn len(&self) -> usize {
		self.len
	}
	/// Whether no entries are pending
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
	/// Lower bound on the cost of every pending entry
	pub fn get_min_cost(&self) -> u32 {
		self.min_cost
	}
	/// Number of entries waiting beyond the horizon
	pub fn get_overflow_len(&self) -> usize {
		self.overflow.len()
	}
	/// Queue an entry of `(cell index, total cost)`. Costs below the current
	/// minimum are clamped up to it, the caller never produces them when the
	/// heuristic is consistent
	pub fn push(&mut self, cell: u32, cost: u32) {
		let cost = cost.max(self.min_cost);
		if cost >= self.min_cost + NUM_QUEUE_BUCKETS as u32 {
			self.overflow.push((cell, cost));
		} else {
			self.buckets[cost as usize % NUM_QUEUE_BUCKETS].push((cell, cost));
			self.ring_len += 1;
		}
		self.len += 1;
	}
	/// Take the lowest-cost pending entry, advancing the minimum past empty
	/// buckets and folding the overflow back into the ring as it goes
	pub fn pop(&mut self) -> Option<(u32, u32)> {
		if self.len == 0 {
			return None;
		}
		loop {
			if self.ring_len == 0 {
				// everything pending sits beyond the horizon, jump to it
				let next = self.overflow.iter().map(|entry| entry.1).min()?;
				self.min_cost = next;
				self.redistribute();
				continue;
			}
			let bucket = self.min_cost as usize % NUM_QUEUE_BUCKETS;
			if let Some(entry) = self.buckets[bucket].pop() {
				self.ring_len -= 1;
				self.len -= 1;
				return Some(entry);
			}
			self.min_cost += 1;
			if self.min_cost as usize % NUM_QUEUE_BUCKETS == 0 {
				self.redistribute();
			}
		}
	}
	/// Move every overflow entry now within the horizon into the ring
	fn redistribute(&mut self) {
		let horizon = self.min_cost + NUM_QUEUE_BUCKETS as u32;
		let mut kept = Vec::new();
		for entry in std::mem::take(&mut self.overflow) {
			if entry.1 < horizon {
				self.buckets[entry.1 as usize % NUM_QUEUE_BUCKETS].push(entry);
				self.ring_len += 1;
			} else {
				kept.push(entry);
			}
		}
		self.overflow = kept;
	}
}

/// Incremental goal-to-start search state, owned by one navigation attempt
pub struct FrontierSearch {
	/// Cells per grid side, used to map cells to distance indices
	side: usize,
	/// The cell containing the agent, reaching it terminates the search
	start: GridCell,
	/// Exact goal position in world space
	goal: Vec2,
	/// Tolerance circle around the goal seeding the frontier when positive
	goal_radius: f32,
	/// Cost from the goal per cell, `u32::MAX` marks an unreached cell. Once
	/// set a value only ever decreases for the lifetime of the search
	distance: Vec<u32>,
	/// Pending frontier entries
	queue: BucketQueue,
	/// Whether the seed set has been populated
	seeded: bool,
	/// How many cells the seed pass managed to enqueue
	seeded_count: usize,
}

impl FrontierSearch {
	/// Create a search across `grid` from `start_pos` (the agent) to
	/// `goal_pos` with an optional tolerance circle of `goal_radius`
	pub fn new(grid: &OccupancyGrid, start_pos: Vec2, goal_pos: Vec2, goal_radius: f32) -> Self {
		let side = grid.get_side();
		FrontierSearch {
			side,
			start: grid.world_to_cell(start_pos),
			goal: goal_pos,
			goal_radius,
			distance: vec![u32::MAX; side * side],
			queue: BucketQueue::default(),
			seeded: false,
			seeded_count: 0,
		}
	}
	/// The cell the search is working back towards
	pub fn get_start(&self) -> GridCell {
		self.start
	}
	/// The exact goal position the search was seeded from
	pub fn get_goal(&self) -> Vec2 {
		self.goal
	}
	/// The goal tolerance radius the search was seeded with
	pub fn get_goal_radius(&self) -> f32 {
		self.goal_radius
	}
	/// Whether the seed pass enqueued at least one cell, distinguishes a
	/// pre-occupied destination from a frontier that died out later
	pub fn seeded_any(&self) -> bool {
		self.seeded_count > 0
	}
	/// Flat distance index of a cell, [None] outside the grid
	fn index_of(&self, cell: GridCell) -> Option<usize> {
		if cell.get_x() < 0
			|| cell.get_y() < 0
			|| cell.get_x() as usize >= self.side
			|| cell.get_y() as usize >= self.side
		{
			return None;
		}
		Some(cell.get_y() as usize * self.side + cell.get_x() as usize)
	}
	/// The cell of a flat distance index
	fn cell_of(&self, index: u32) -> GridCell {
		GridCell::new(
			(index as usize % self.side) as i32,
			(index as usize / self.side) as i32,
		)
	}
	/// Settled cost from the goal of a cell, [None] while unreached
	pub fn get_distance(&self, cell: GridCell) -> Option<u32> {
		let index = self.index_of(cell)?;
		let value = self.distance[index];
		if value == u32::MAX {
			None
		} else {
			Some(value)
		}
	}
	/// Populate the seed set: the goal cell plus every unblocked cell whose
	/// centre lies within the tolerance circle, each at distance zero
	fn seed(&mut self, grid: &mut OccupancyGrid, sampler: &TerrainSampler) {
		self.seeded = true;
		// the grid may carry marks from an abandoned earlier search
		grid.reset_visited();
		let goal_cell = grid.world_to_cell(self.goal);
		let reach = (self.goal_radius / grid.get_cell_size()).ceil() as i32;
		grid.ensure_region_loaded(
			goal_cell.offset(-reach - 1, -reach - 1),
			goal_cell.offset(reach + 1, reach + 1),
			sampler,
		);
		for dy in -reach..=reach {
			for dx in -reach..=reach {
				let cell = goal_cell.offset(dx, dy);
				if !grid.in_bounds(cell) || grid.is_blocked(cell) {
					continue;
				}
				let within = cell == goal_cell
					|| grid.cell_center(cell).distance(self.goal) <= self.goal_radius;
				if !within {
					continue;
				}
				if let Some(index) = self.index_of(cell) {
					self.distance[index] = 0;
					grid.mark_visited(cell);
					self.queue
						.push(index as u32, cell.octile_distance(&self.start));
					self.seeded_count += 1;
				}
			}
		}
	}
	/// Run up to `budget` frontier expansions. State persists between calls
	/// so the search can be spread across ticks
	pub fn advance(
		&mut self,
		grid: &mut OccupancyGrid,
		sampler: &TerrainSampler,
		budget: usize,
	) -> SearchStatus {
		if !self.seeded {
			self.seed(grid, sampler);
			if self.seeded_count == 0 {
				return SearchStatus::Unreachable;
			}
			// start already inside the seed set, trivial path
			if self.get_distance(self.start) == Some(0) {
				return SearchStatus::Found;
			}
		}
		for _ in 0..budget {
			let Some((index, popped_cost)) = self.queue.pop() else {
				return SearchStatus::Unreachable;
			};
			let cell = self.cell_of(index);
			let settled = self.distance[index as usize];
			let current_cost = settled.saturating_add(cell.octile_distance(&self.start));
			if current_cost != popped_cost {
				if current_cost < popped_cost {
					// superseded by a cheaper duplicate that was already processed
					continue;
				}
				// cost drifted upward, move the entry to its correct bucket
				self.queue.push(index, current_cost);
				continue;
			}
			if cell == self.start {
				return SearchStatus::Found;
			}
			grid.ensure_region_loaded(cell.offset(-1, -1), cell.offset(1, 1), sampler);
			for heading in Heading::all() {
				let (dx, dy) = heading.step();
				let neighbour = cell.offset(dx, dy);
				if !grid.in_bounds(neighbour) || grid.is_blocked(neighbour) {
					continue;
				}
				let Some(n_index) = self.index_of(neighbour) else {
					continue;
				};
				let candidate = settled + heading.step_cost();
				if grid.is_visited(neighbour) && candidate >= self.distance[n_index] {
					continue;
				}
				self.distance[n_index] = candidate;
				grid.mark_visited(neighbour);
				self.queue.push(
					n_index as u32,
					candidate + neighbour.octile_distance(&self.start),
				);
			}
		}
		trace!("search budget spent, frontier size {}", self.queue.len());
		SearchStatus::InProgress
	}
	/// Drive the search to a terminal status with no per-tick budget, used by
	/// tests and benchmarks
	pub fn run_to_completion(
		&mut self,
		grid: &mut OccupancyGrid,
		sampler: &TerrainSampler,
	) -> SearchStatus {
		loop {
			match self.advance(grid, sampler, SEARCH_BUDGET_PER_TICK) {
				SearchStatus::InProgress => continue,
				status => return status,
			}
		}
	}
}
