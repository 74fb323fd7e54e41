//! The interfaces the navigation core consumes from the rest of the engine.
//!
//! The core never reaches into global state, instead the terrain oracle and
//! the locomotion actuator are supplied as trait objects and the set of
//! obstacle objects is collected into a snapshot each tick by the plugin
//! layer and handed down explicitly.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Read access to terrain geometry
pub trait TerrainOracle {
	/// Height of the terrain floor at a horizontal position
	fn floor_height(&self, pos: Vec2) -> f32;
	/// Fine-grained slope angle in radians at a horizontal position
	fn fine_slope(&self, pos: Vec2) -> f32;
	/// Global water surface height
	fn water_level(&self) -> f32;
	/// Ceiling above which no agent may fly
	fn max_flying_height(&self) -> f32;
}

/// The low-level locomotion actuator a navigating agent drives. All speed and
/// turn commands are normalized to `[-1, 1]`
pub trait Actuator {
	/// Command a forward (positive) or reverse (negative) speed
	fn set_forward_speed(&mut self, speed: f32);
	/// Command a turn rate, positive turns clockwise when viewed from above
	fn set_turn_rate(&mut self, rate: f32);
	/// Command a vertical speed for flying agents
	fn set_vertical_speed(&mut self, speed: f32);
	/// Whether the agent is currently resting on the ground
	fn is_grounded(&self) -> bool;
	/// Take and reset the flag recording whether a collision occurred this tick
	fn consume_collision_flag(&mut self) -> bool;
	/// Distance needed to come to a halt from the given commanded speed
	fn braking_distance(&self, speed: f32) -> f32;
}

/// A single collision sphere of an obstacle object
#[derive(Clone, Copy, Debug)]
pub struct CollisionSphere {
	/// Sphere centre in world space
	pub center: Vec3,
	/// Sphere radius in world units
	pub radius: f32,
}

/// Snapshot of one active world object as seen by the navigation core,
/// collected by the plugin layer from the ECS each tick
#[derive(Clone, Debug)]
pub struct NavObstacle {
	/// The entity this snapshot was taken from
	pub entity: Entity,
	/// Collision spheres in world space
	pub spheres: Vec<CollisionSphere>,
	/// Coarse classification used by obstacle-exemption rules
	pub kind: NavObstacleKind,
	/// Team the object belongs to
	pub team: u8,
	/// Objects being carried by another agent do not block anything
	pub transported: bool,
}

impl NavObstacle {
	/// Smallest horizontal distance from `pos` to any collision sphere centre,
	/// paired with that sphere
	pub fn nearest_sphere(&self, pos: Vec2) -> Option<(f32, &CollisionSphere)> {
		self.spheres
			.iter()
			.map(|s| (flat(s.center).distance(pos), s))
			.min_by(|a, b| a.0.total_cmp(&b.0))
	}
}

/// Bundles the terrain oracle with the profile of the querying agent so the
/// occupancy grid can classify terrain cells on demand
pub struct TerrainSampler<'a> {
	/// The terrain geometry oracle
	pub terrain: &'a dyn TerrainOracle,
	/// Traversability limits of the agent the grid belongs to
	pub profile: &'a AgentProfile,
}

impl TerrainSampler<'_> {
	/// Whether terrain alone forbids the agent from occupying `pos`
	pub fn is_terrain_blocked(&self, pos: Vec2) -> bool {
		if self.terrain.fine_slope(pos) > self.profile.max_slope {
			return true;
		}
		if !self.profile.accepts_water {
			let depth = self.terrain.water_level() - self.terrain.floor_height(pos);
			if depth > self.profile.max_wade_depth {
				return true;
			}
		}
		false
	}
}
