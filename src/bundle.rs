//! ECS-facing components: the agent marker carrying its species profile, the
//! normalized motor interface the game integrates into real motion, the
//! obstacle declaration and the live goto attempt.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Marks an entity as a navigating agent and carries the tuning of its
/// species
#[derive(Component)]
pub struct NavAgent {
	/// Traversability and behaviour tuning for this agent
	pub profile: AgentProfile,
}

impl NavAgent {
	/// Create a new instance of [NavAgent]
	pub fn new(profile: AgentProfile) -> Self {
		NavAgent { profile }
	}
	/// Create a new instance of [NavAgent] with its [AgentProfile] derived
	/// from disk
	#[cfg(feature = "ron")]
	pub fn from_disk(path: &str) -> Self {
		NavAgent {
			profile: AgentProfile::from_ron(path.to_string()),
		}
	}
}

/// Normalized locomotion commands written by the navigation systems and
/// feedback flags written by whatever physics integration the game runs. The
/// game is responsible for turning `forward`, `turn` and `vertical` into real
/// motion each tick and for setting `grounded` and `collided`
#[derive(Component)]
pub struct NavMotor {
	/// Commanded forward (positive) or reverse (negative) speed in `[-1, 1]`
	pub forward: f32,
	/// Commanded turn rate in `[-1, 1]`, positive is clockwise from above
	pub turn: f32,
	/// Commanded vertical speed in `[-1, 1]` for flying agents
	pub vertical: f32,
	/// Physics feedback: the agent is resting on the ground
	pub grounded: bool,
	/// Physics feedback: the agent hit something since the flag was last
	/// consumed
	pub collided: bool,
	/// World distance needed to stop from full commanded speed
	pub brake_scale: f32,
}

impl Default for NavMotor {
	fn default() -> Self {
		NavMotor {
			forward: 0.0,
			turn: 0.0,
			vertical: 0.0,
			grounded: true,
			collided: false,
			brake_scale: 2.0,
		}
	}
}

impl Actuator for NavMotor {
	fn set_forward_speed(&mut self, speed: f32) {
		self.forward = speed;
	}
	fn set_turn_rate(&mut self, rate: f32) {
		self.turn = rate;
	}
	fn set_vertical_speed(&mut self, speed: f32) {
		self.vertical = speed;
	}
	fn is_grounded(&self) -> bool {
		self.grounded
	}
	fn consume_collision_flag(&mut self) -> bool {
		let hit = self.collided;
		self.collided = false;
		hit
	}
	fn braking_distance(&self, speed: f32) -> f32 {
		speed.abs() * self.brake_scale
	}
}

/// Declares an entity as part of the obstacle field. Sphere centres are
/// offsets from the entity transform and are resolved into world space when
/// the per-tick snapshot is collected
#[derive(Component)]
pub struct ObstacleBody {
	/// Collision spheres as offsets from the entity translation
	pub spheres: Vec<CollisionSphere>,
	/// Coarse classification used by obstacle-exemption rules
	pub kind: NavObstacleKind,
	/// Team the object belongs to
	pub team: u8,
}

impl ObstacleBody {
	/// Create a new instance of [ObstacleBody] with a single sphere centred
	/// on the entity
	pub fn new(kind: NavObstacleKind, radius: f32) -> Self {
		ObstacleBody {
			spheres: vec![CollisionSphere {
				center: Vec3::ZERO,
				radius,
			}],
			kind,
			team: 0,
		}
	}
}

/// Marker for objects currently being carried by an agent, carried objects
/// neither block the grid nor contribute repulsion
#[derive(Component, Default)]
pub struct BeingTransported;

/// The live navigation attempt attached to an agent, removed on completion,
/// failure, abort or supersession
#[derive(Component)]
pub struct ActiveGoto(pub GotoTask);

/// Everything a navigating agent entity needs besides its transform
#[derive(Bundle)]
pub struct NavAgentBundle {
	/// The species profile
	agent: NavAgent,
	/// The normalized motor interface
	motor: NavMotor,
	/// The agent's own obstacle footprint
	body: ObstacleBody,
}

impl NavAgentBundle {
	/// Create a new instance of [NavAgentBundle], the obstacle footprint is a
	/// single sphere matching the profile radius
	pub fn new(profile: AgentProfile) -> Self {
		let body = ObstacleBody::new(NavObstacleKind::Vehicle, profile.radius);
		NavAgentBundle {
			agent: NavAgent::new(profile),
			motor: NavMotor::default(),
			body,
		}
	}
}
