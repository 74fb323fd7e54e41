//! Measure a frontier search threading a grid littered with random blocked
//! circles, closer to the obstacle fields a real settlement produces.
//!

use bevy::prelude::*;
use bevy_goto_nav_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};

/// Side length of the benchmark grid in cells
const SIDE: usize = 192;
/// Width of a grid cell in world units
const CELL_SIZE: f32 = 2.0;
/// Number of randomly placed blocked circles
const OBSTACLE_COUNT: usize = 400;

/// Flat, dry, unblocked terrain
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

/// Scatter reproducible blocked circles across the middle of the world,
/// keeping the corners free for the start and goal
fn scatter_obstacles() -> Vec<(Vec2, f32)> {
	let mut rng = rand::rngs::StdRng::seed_from_u64(7);
	let half = SIDE as f32 * CELL_SIZE * 0.5;
	let mut circles = Vec::with_capacity(OBSTACLE_COUNT);
	for _ in 0..OBSTACLE_COUNT {
		let center = Vec2::new(
			rng.random_range(-half * 0.8..half * 0.8),
			rng.random_range(-half * 0.8..half * 0.8),
		);
		let radius = rng.random_range(2.0..6.0);
		circles.push((center, radius));
	}
	circles
}

/// Build the littered grid, flood it corner to corner and extract the path
fn search_maze(circles: &[(Vec2, f32)]) {
	let profile = AgentProfile::default();
	let terrain = FlatTerrain;
	let sampler = TerrainSampler {
		terrain: &terrain,
		profile: &profile,
	};
	let mut grid = OccupancyGrid::new(Vec2::ZERO, SIDE, CELL_SIZE);
	for (center, radius) in circles {
		grid.rasterize_circle(*center, *radius);
	}
	let half = SIDE as f32 * CELL_SIZE * 0.5 - CELL_SIZE;
	let start = Vec2::splat(-half);
	let goal = Vec2::splat(half);
	let mut search = FrontierSearch::new(&grid, start, goal, 0.0);
	if search.run_to_completion(&mut grid, &sampler) == SearchStatus::Found {
		let path = extract_path(&search, &grid, start);
		assert!(path.is_some());
	}
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let circles = scatter_obstacles();
	group.bench_function("search_maze", |b| {
		b.iter(|| black_box(search_maze(black_box(&circles))))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
