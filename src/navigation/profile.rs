//! Per-species navigation tuning. An [AgentProfile] collects every knob the
//! navigation core recognises about a kind of agent: traversable slope,
//! water tolerance, flight, default approach and collision behaviour and the
//! declarative obstacle-exemption list evaluated uniformly when obstacles
//! are rasterized onto the occupancy grid.
//!

use bevy::prelude::*;

/// How close to the goal counts as having arrived
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Reflect)]
pub enum ApproachMode {
	/// The goal position must be reached within the tight arrival tolerance
	#[default]
	Exact,
	/// Arrival anywhere within the goal radius is acceptable
	Tolerant,
}

/// What an agent does when the actuator reports it has hit something
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Reflect)]
pub enum CollisionReaction {
	/// Stop and report failure immediately
	Halt,
	/// Back off, turn right a fixed angle and probe forward
	TurnRight,
	/// Back off, turn left a fixed angle and probe forward
	TurnLeft,
	/// Alternate between right and left probes on successive collisions
	#[default]
	Alternate,
}

/// Coarse classification of world objects used by obstacle-exemption rules,
/// e.g. a species that tramples pickups simply lists
/// [NavObstacleKind::Pickup] as exempt instead of special-casing object types
/// at every call site
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Reflect)]
pub enum NavObstacleKind {
	/// A mobile agent or vehicle
	Vehicle,
	/// A fixed structure
	Building,
	/// A small carryable object
	Pickup,
	/// A wild creature
	Creature,
	/// Decorative scenery
	Scenery,
}

/// Optional locomotion capabilities an agent species may support
#[derive(Debug, PartialEq, Eq, Clone, Copy, Reflect)]
pub enum Capability {
	/// The agent can leave the ground and hold a cruise altitude
	Flying,
	/// Flight is driven by a jet that overheats under sustained use
	JetPropulsion,
}

/// Navigation tuning for one species of agent
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
pub struct AgentProfile {
	/// Collision radius of the agent body
	pub radius: f32,
	/// Steepest slope in radians the agent will path across
	pub max_slope: f32,
	/// Whether the agent may enter water deeper than `max_wade_depth`
	pub accepts_water: bool,
	/// Water depth the agent can wade through even when it does not accept
	/// full submersion
	pub max_wade_depth: f32,
	/// Whether the agent supports flight
	pub can_fly: bool,
	/// Whether flight is jet-driven and subject to overheating
	pub has_jet: bool,
	/// Default approach mode when a goto request does not name one
	pub approach: ApproachMode,
	/// Default collision reaction when a goto request does not name one
	pub collision: CollisionReaction,
	/// Whether an object goal may be approached from any angle, otherwise the
	/// final segment turns to face the object and advances in a straight line
	pub any_angle_approach: bool,
	/// Exponent shaping the repulsion falloff curve
	pub repulsion_factor: f32,
	/// Extra clearance in world units added around obstacle spheres when
	/// computing repulsion
	pub repulsion_margin: f32,
	/// Object kinds this species walks straight through
	pub exempt_kinds: Vec<NavObstacleKind>,
}

impl Default for AgentProfile {
	fn default() -> Self {
		AgentProfile {
			radius: 1.0,
			max_slope: 0.5,
			accepts_water: false,
			max_wade_depth: 0.5,
			can_fly: false,
			has_jet: false,
			approach: ApproachMode::default(),
			collision: CollisionReaction::default(),
			any_angle_approach: true,
			repulsion_factor: 2.0,
			repulsion_margin: 1.5,
			exempt_kinds: Vec::new(),
		}
	}
}

impl AgentProfile {
	/// Whether the species supports an optional locomotion capability
	pub fn supports(&self, capability: Capability) -> bool {
		match capability {
			Capability::Flying => self.can_fly,
			Capability::JetPropulsion => self.can_fly && self.has_jet,
		}
	}
	/// Whether obstacles of `kind` are ignored by this species
	pub fn is_exempt(&self, kind: NavObstacleKind) -> bool {
		self.exempt_kinds.contains(&kind)
	}
	/// From a `ron` file generate the [AgentProfile]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: String) -> Self {
		let file = std::fs::File::open(path).expect("Failed opening AgentProfile file");
		let profile: AgentProfile = match ron::de::from_reader(file) {
			Ok(profile) => profile,
			Err(e) => panic!("Failed deserializing AgentProfile: {}", e),
		};
		profile
	}
}
