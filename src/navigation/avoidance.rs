//! A continuous potential-field corrector biasing steering away from nearby
//! obstacles. Unlike the occupancy grid this never blocks progress outright,
//! it only nudges the desired heading (and, for flying agents, the vertical
//! speed), so it coexists with the grid-based global path rather than
//! replacing it.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Weight of the repulsion contribution of a single obstacle sphere at zero
/// separation
const REPULSION_WEIGHT: f32 = 0.2;

/// Corrective steering produced by [repulsion]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Repulsion {
	/// Horizontal vector to add to the raw desired-heading vector
	pub lateral: Vec2,
	/// Vertical speed bias in `[-1, 1]` for flying agents
	pub vertical: f32,
}

/// Accumulate the repulsion field at the agent position. Every collision
/// sphere of every active, non-excluded, non-exempt obstacle contributes a
/// vector pointing away from its centre, scaled by
/// `(1 - (d / reach)^factor) * 0.2` where `reach` is the combined radii plus
/// `braking_margin`. Spheres farther from the agent than the agent is from
/// its goal never contribute, so the goal object itself is not treated as an
/// obstacle
pub fn repulsion(
	self_pos: Vec3,
	self_radius: f32,
	goal: Vec2,
	obstacles: &[NavObstacle],
	exclude: &[Entity],
	braking_margin: f32,
	profile: &AgentProfile,
) -> Repulsion {
	let here = flat(self_pos);
	let goal_distance = here.distance(goal);
	let mut field = Repulsion::default();
	for obstacle in obstacles {
		if obstacle.transported
			|| exclude.contains(&obstacle.entity)
			|| profile.is_exempt(obstacle.kind)
		{
			continue;
		}
		for sphere in &obstacle.spheres {
			let centre = flat(sphere.center);
			let separation = here.distance(centre);
			if separation >= goal_distance {
				continue;
			}
			let reach = self_radius + sphere.radius + profile.repulsion_margin + braking_margin;
			if separation >= reach || reach <= 0.0 {
				continue;
			}
			let strength =
				(1.0 - (separation / reach).powf(profile.repulsion_factor)) * REPULSION_WEIGHT;
			let away = if separation > f32::EPSILON {
				(here - centre) / separation
			} else {
				// sitting exactly on the centre, any fixed direction will do
				Vec2::X
			};
			field.lateral += away * strength;
			// bias over low obstacles and under overhanging ones
			let vertical_gap = self_pos.y - sphere.center.y;
			field.vertical += strength * vertical_gap.signum();
		}
	}
	field.vertical = field.vertical.clamp(-1.0, 1.0);
	field
}
