//! The top-level controller of one navigation attempt. A [GotoTask] owns the
//! occupancy bitmap, the incremental search and the waypoint list for the
//! lifetime of a single goto request and converts the current phase plus the
//! nearest waypoint into actuator commands every simulation tick.
//!
//! Phase flow, terminal states aside:
//!
//! ```text
//! (LeakEscape ->) Searching -> (Climbing ->) FollowingPath
//!     -> (Descending ->) Turning -> MovingFinalSegment -> done
//! ```
//!
//! with the collision-recovery loop `CollisionWait -> CollisionTurn ->
//! CollisionAdvance -> FollowingPath` reachable whenever the actuator
//! reports a collision, a stuck detector that restarts the search from the
//! agent's current position, and an [NavPhase::EmergencyDescent] that forces
//! a jet-propelled agent down when its propulsion overheats.
//!
//! Every terminal path, success or failure, zeroes the actuator before the
//! status is reported.
//!

use bevy::prelude::*;
use thiserror::Error;

use crate::prelude::*;

/// Width of an occupancy cell in world units
const CELL_SIZE: f32 = 2.0;
/// Cells of slack added around the start-goal span when sizing the grid
const GRID_MARGIN_CELLS: usize = 24;
/// Upper bound on grid side length in cells
const MAX_GRID_SIDE: usize = 512;
/// Horizontal reach of a single planning grid. Requests beyond it plan to an
/// interim goal on the line towards the target and re-plan on arrival
const GRID_REACH: f32 = (MAX_GRID_SIDE - 2 * GRID_MARGIN_CELLS) as f32 * CELL_SIZE;
/// Tolerance circle seeded around an interim goal
const INTERIM_GOAL_RADIUS: f32 = 2.0 * CELL_SIZE;
/// Safety clearance added around obstacle radii when rasterizing
const SAFETY_MARGIN: f32 = 0.8;
/// Axis-aligned arrival tolerance while driving on the ground
const ARRIVAL_GROUND: f32 = 1.0;
/// Axis-aligned arrival tolerance while in flight
const ARRIVAL_FLIGHT: f32 = 4.0;
/// Axis-aligned arrival tolerance for requests flagged approximate
const ARRIVAL_APPROX: f32 = 8.0;
/// Goal tolerance radius used for tolerant position requests
const TOLERANT_GOAL_RADIUS: f32 = 2.0;
/// Extra clearance between an agent and an object goal surface
const CARGO_APPROACH_MARGIN: f32 = 0.5;
/// Seconds without displacement before the stuck detector fires
const STUCK_SECONDS: f32 = 1.0;
/// Displacement below which the agent counts as making no progress
const STUCK_DISTANCE: f32 = 0.2;
/// Stuck-triggered re-searches tolerated before the request fails
const MAX_STUCK_RESTARTS: u32 = 3;
/// Collisions tolerated before the request fails
const MAX_COLLISION_RETRIES: u32 = 5;
/// Pause after a collision before turning away
const COLLISION_WAIT_SECONDS: f32 = 0.4;
/// Reverse speed commanded while backing off after a collision
const COLLISION_BACKOFF_SPEED: f32 = 0.3;
/// Fixed angle of the post-collision probe turn
const COLLISION_TURN_ANGLE: f32 = 0.7;
/// Duration of the post-collision forward probe
const COLLISION_PROBE_SECONDS: f32 = 1.0;
/// Commanded speed during the post-collision probe
const COLLISION_PROBE_SPEED: f32 = 0.5;
/// Remaining distance at which the final segment counts as complete
const FINAL_SEGMENT_TOLERANCE: f32 = 0.5;
/// Commanded speed during the final precise segment
const FINAL_SEGMENT_SPEED: f32 = 0.4;
/// Wall-clock bound on the final precise segment
const FINAL_SEGMENT_TIMEOUT: f32 = 5.0;
/// Heading error below which a turn-in-place phase completes
const TURN_COMPLETE_ERROR: f32 = 0.05;
/// Proportional gain converting heading error to turn rate
const TURN_GAIN: f32 = 2.0;
/// Heading error beyond which the agent turns in place instead of driving
const TURN_IN_PLACE_ERROR: f32 = 1.2;
/// Proportional gain converting altitude error to vertical speed
const ALTITUDE_GAIN: f32 = 0.5;
/// Forward projection distance for the altitude-hold floor sample
const ALTITUDE_LOOKAHEAD: f32 = 8.0;
/// Height slack accepted when deciding a climb is complete
const CLIMB_TOLERANCE: f32 = 0.5;
/// Wall-clock bound on the vertical convergence phases
const VERTICAL_PHASE_TIMEOUT: f32 = 30.0;
/// Wall-clock bound on the turn-in-place phases
const TURN_PHASE_TIMEOUT: f32 = 5.0;
/// Jet heat gained per second of flight, full heat forces a descent
const HEAT_RATE: f32 = 1.0 / 20.0;
/// Jet heat shed per second on the ground
const COOL_RATE: f32 = 1.0 / 5.0;
/// Heat level below which an emergency-descended agent resumes flying
const HEAT_RESUME: f32 = 0.2;
/// Assumed world speed at full forward command, used to size leak timers
const LEAK_ESCAPE_RATE: f32 = 2.0;

/// What a goto request is aimed at
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GotoTarget {
	/// A fixed world position
	Position(Vec3),
	/// A world object, re-resolved against its current position whenever a
	/// search starts
	Object(Entity),
}

/// Terminal failure reasons surfaced through polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavError {
	/// No path exists under the current obstacle classification
	#[error("goal is unreachable")]
	Unreachable,
	/// Bug-guard: path reconstruction exceeded its iteration limit
	#[error("path reconstruction exceeded its iteration limit")]
	SearchIterationExceeded,
	/// The destination cell itself is pre-occupied
	#[error("destination is blocked")]
	ApproachBlocked,
	/// A collision occurred under the halt reaction, or retries ran out
	#[error("halted on collision")]
	CollisionHalt,
	/// The agent made no progress for too long, even after re-searching
	#[error("stuck for too long")]
	StuckTimeout,
	/// Jet propulsion overheated and the request could not recover
	#[error("propulsion overheated")]
	Overheat,
}

/// Result of advancing a [GotoTask] by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GotoStatus {
	/// Still working, call again next tick
	Continue,
	/// The agent arrived, the actuator has been zeroed
	Succeeded,
	/// The request failed terminally, the actuator has been zeroed
	Failed(NavError),
}

/// Execution phase of a [GotoTask], transitions are the only mutator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum NavPhase {
	/// Backing out of an overlap with another object before planning
	LeakEscape,
	/// Driving the incremental frontier search to completion
	Searching,
	/// Taking off towards cruise altitude
	Climbing,
	/// Steering along the waypoint list
	FollowingPath,
	/// Landing at the end of a flight
	Descending,
	/// Rotating to face an object goal for the final precise approach
	Turning,
	/// Advancing a fixed distance onto the object goal
	MovingFinalSegment,
	/// Post-collision pause, backing off the contact
	CollisionWait,
	/// Post-collision fixed-angle turn
	CollisionTurn,
	/// Post-collision forward probe
	CollisionAdvance,
	/// Forced landing after jet overheat
	EmergencyDescent,
}

/// The parameters of one goto request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GotoRequest {
	/// Where to go
	pub target: GotoTarget,
	/// Cruise altitude above the floor, zero keeps the agent on the ground
	pub altitude: f32,
	/// How close to the goal counts as arrival
	pub approach: ApproachMode,
	/// Reaction to collisions along the way
	pub collision: CollisionReaction,
	/// Accept a loose arrival tolerance
	pub approximate: bool,
}

/// Per-tick snapshot of the agent driving a task
#[derive(Debug, Clone, Copy)]
pub struct AgentState {
	/// The agent entity, excluded from its own obstacle field
	pub entity: Entity,
	/// World position
	pub position: Vec3,
	/// Heading about the vertical axis, `0` along `+z`
	pub yaw: f32,
}

/// One navigation attempt: bitmap, search state, waypoints and phase,
/// destroyed on completion, failure or supersession
#[derive(Component)]
pub struct GotoTask {
	/// The request being executed
	request: GotoRequest,
	/// Current execution phase
	phase: NavPhase,
	/// Occupancy bitmap owned exclusively by this attempt
	grid: OccupancyGrid,
	/// Incremental search state while a search is live
	search: Option<FrontierSearch>,
	/// Ordered waypoint list produced by extraction, start first
	waypoints: Vec<Vec2>,
	/// Index of the waypoint currently steered towards
	waypoint_index: usize,
	/// Goal position after the latest resolution against the target object
	resolved_goal: Vec3,
	/// Tolerance circle radius seeded into the search
	goal_radius: f32,
	/// Whether the current waypoint list ends at an interim goal short of the
	/// requested target, arrival there re-plans instead of finishing
	interim: bool,
	/// Object goal treated as cargo and excluded from the obstacle field
	cargo: Option<Entity>,
	/// Countdown used by the timed phases
	phase_timer: f32,
	/// Escape heading while leaking out of an overlap
	leak_yaw: f32,
	/// Collisions consumed so far
	collision_retries: u32,
	/// Next probe direction under the alternate collision reaction
	alternate_right: bool,
	/// Heading the post-collision turn is converging on
	collision_target_yaw: f32,
	/// Seconds of commanded motion without displacement
	stuck_timer: f32,
	/// Re-searches already triggered by the stuck detector
	stuck_restarts: u32,
	/// Anchor position for stuck detection and the final segment
	anchor: Vec3,
	/// Forward speed commanded last tick, stuck detection only applies while
	/// it is non-zero
	commanded_speed: f32,
	/// Length of the final precise segment
	final_distance: f32,
	/// Phase the convergence watchdog last saw
	watchdog_phase: NavPhase,
	/// Seconds spent in the watchdog's current phase
	phase_elapsed: f32,
	/// Jet heat in `[0, 1]`, only meaningful for jet-propelled agents
	heat: f32,
}

impl GotoTask {
	/// Create a task for `request`. When the agent's own collision volume
	/// already overlaps a nearby obstacle the task starts in
	/// [NavPhase::LeakEscape] and no search state is populated until the
	/// escape completes
	pub fn new(
		request: GotoRequest,
		agent: &AgentState,
		obstacles: &[NavObstacle],
		profile: &AgentProfile,
	) -> Self {
		let cargo = match request.target {
			GotoTarget::Object(entity) => Some(entity),
			GotoTarget::Position(_) => None,
		};
		let resolved_goal = match request.target {
			GotoTarget::Position(pos) => pos,
			GotoTarget::Object(entity) => find_obstacle(obstacles, entity)
				.and_then(|o| o.spheres.first())
				.map(|s| s.center)
				.unwrap_or(agent.position),
		};
		let goal_radius = match request.target {
			GotoTarget::Object(entity) => {
				let surface = find_obstacle(obstacles, entity)
					.and_then(|o| o.nearest_sphere(flat(agent.position)))
					.map(|(_, s)| s.radius)
					.unwrap_or(0.0);
				surface + profile.radius + CARGO_APPROACH_MARGIN
			}
			GotoTarget::Position(_) => {
				if request.approximate || request.approach == ApproachMode::Tolerant {
					TOLERANT_GOAL_RADIUS
				} else {
					0.0
				}
			}
		};
		let mut task = GotoTask {
			request,
			phase: NavPhase::Searching,
			grid: build_grid(flat(agent.position), flat(resolved_goal)),
			search: None,
			waypoints: Vec::new(),
			waypoint_index: 0,
			resolved_goal,
			goal_radius,
			interim: false,
			cargo,
			phase_timer: 0.0,
			leak_yaw: 0.0,
			collision_retries: 0,
			alternate_right: true,
			collision_target_yaw: 0.0,
			stuck_timer: 0.0,
			stuck_restarts: 0,
			anchor: agent.position,
			commanded_speed: 0.0,
			final_distance: 0.0,
			watchdog_phase: NavPhase::Searching,
			phase_elapsed: 0.0,
			heat: 0.0,
		};
		if let Some((away_yaw, penetration)) = task.find_leak(agent, obstacles, profile) {
			task.phase = NavPhase::LeakEscape;
			task.leak_yaw = away_yaw;
			task.phase_timer =
				((penetration + profile.radius) / LEAK_ESCAPE_RATE).clamp(0.2, 3.0);
			debug!("goto starts leaking out of an overlap for {}s", task.phase_timer);
		}
		task
	}
	/// Current phase, read-only
	pub fn get_phase(&self) -> NavPhase {
		self.phase
	}
	/// The waypoint list currently being followed
	pub fn get_waypoints(&self) -> &[Vec2] {
		&self.waypoints
	}
	/// Zero the actuator, used on abort and before every terminal report
	pub fn release(&self, actuator: &mut dyn Actuator) {
		actuator.set_forward_speed(0.0);
		actuator.set_turn_rate(0.0);
		actuator.set_vertical_speed(0.0);
	}
	/// Whether this request flies at a cruise altitude
	fn is_airborne_request(&self, profile: &AgentProfile) -> bool {
		profile.supports(Capability::Flying) && self.request.altitude > 0.0
	}
	/// Find the deepest overlap between the agent body and a non-exempt
	/// obstacle, answering the escape heading and penetration depth
	fn find_leak(
		&self,
		agent: &AgentState,
		obstacles: &[NavObstacle],
		profile: &AgentProfile,
	) -> Option<(f32, f32)> {
		let here = flat(agent.position);
		let mut worst: Option<(f32, f32)> = None;
		for obstacle in obstacles {
			if obstacle.transported
				|| obstacle.entity == agent.entity
				|| Some(obstacle.entity) == self.cargo
				|| profile.is_exempt(obstacle.kind)
			{
				continue;
			}
			for sphere in &obstacle.spheres {
				let centre = flat(sphere.center);
				let separation = here.distance(centre);
				let penetration = profile.radius + sphere.radius - separation;
				if penetration > 0.0 && worst.is_none_or(|(_, p)| penetration > p) {
					let away = if separation > f32::EPSILON {
						(here - centre) / separation
					} else {
						Vec2::X
					};
					worst = Some((yaw_of(away), penetration));
				}
			}
		}
		worst
	}
	/// Re-resolve the goal position against the target object's current
	/// position
	fn resolve_goal(&mut self, obstacles: &[NavObstacle]) {
		if let GotoTarget::Object(entity) = self.request.target {
			if let Some(sphere) =
				find_obstacle(obstacles, entity).and_then(|o| o.spheres.first())
			{
				self.resolved_goal = sphere.center;
			}
		}
	}
	/// Tear down any previous bitmap and search state and start a fresh
	/// search from the agent's current position
	fn begin_search(
		&mut self,
		agent: &AgentState,
		obstacles: &[NavObstacle],
		profile: &AgentProfile,
	) {
		self.resolve_goal(obstacles);
		let here = flat(agent.position);
		let span = flat(self.resolved_goal) - here;
		// goals beyond the reach of one grid are planned in legs, each leg
		// ends at an interim goal on the line towards the target
		self.interim = span.length() > GRID_REACH;
		let goal = if self.interim {
			here + span.normalize_or_zero() * GRID_REACH
		} else {
			flat(self.resolved_goal)
		};
		let radius = if self.interim {
			INTERIM_GOAL_RADIUS
		} else {
			self.goal_radius
		};
		self.grid = build_grid(here, goal);
		let mut exclude = vec![agent.entity];
		if let Some(cargo) = self.cargo {
			exclude.push(cargo);
		}
		self.grid.rasterize_objects(
			obstacles,
			&exclude,
			profile.radius + SAFETY_MARGIN,
			profile,
		);
		// free the departure footprint so the rasterization of close
		// neighbours cannot trap the agent in its own start cell
		self.grid.clear_circle(
			here,
			profile.radius * 2.0 + SAFETY_MARGIN + self.grid.get_cell_size(),
		);
		self.search = Some(FrontierSearch::new(&self.grid, here, goal, radius));
		self.waypoints.clear();
		self.waypoint_index = 0;
		self.phase = NavPhase::Searching;
		debug!("goto searching from {:?} to {:?}", here, goal);
	}
	/// Make sure terrain blocking is rasterized across the whole waypoint
	/// list before line-of-sight shortcutting runs over it
	fn load_path_region(&mut self, sampler: &TerrainSampler) {
		let mut min = Vec2::splat(f32::MAX);
		let mut max = Vec2::splat(f32::MIN);
		for wp in &self.waypoints {
			min = min.min(*wp);
			max = max.max(*wp);
		}
		if min.x <= max.x {
			let min_cell = self.grid.world_to_cell(min);
			let max_cell = self.grid.world_to_cell(max);
			self.grid.ensure_region_loaded(min_cell, max_cell, sampler);
		}
	}
	/// Terminal or near-terminal handling once the last waypoint is reached:
	/// land first when airborne, then either finish or begin the precise
	/// object approach
	fn arrive(&mut self, actuator: &mut dyn Actuator, profile: &AgentProfile) -> GotoStatus {
		if self.is_airborne_request(profile) && !actuator.is_grounded() {
			self.phase = NavPhase::Descending;
			return GotoStatus::Continue;
		}
		if self.cargo.is_some() && !profile.any_angle_approach {
			self.phase = NavPhase::Turning;
			return GotoStatus::Continue;
		}
		self.release(actuator);
		GotoStatus::Succeeded
	}
	/// React to a collision reported by the actuator this tick
	fn on_collision(&mut self, actuator: &mut dyn Actuator) -> GotoStatus {
		if self.request.collision == CollisionReaction::Halt {
			self.release(actuator);
			return GotoStatus::Failed(NavError::CollisionHalt);
		}
		self.collision_retries += 1;
		if self.collision_retries > MAX_COLLISION_RETRIES {
			self.release(actuator);
			return GotoStatus::Failed(NavError::CollisionHalt);
		}
		self.release(actuator);
		self.phase = NavPhase::CollisionWait;
		self.phase_timer = COLLISION_WAIT_SECONDS;
		GotoStatus::Continue
	}
	/// Steer towards a horizontal waypoint, blending in the repulsion field,
	/// and hand back the commanded forward speed
	#[allow(clippy::too_many_arguments)]
	fn steer_towards(
		&mut self,
		target: Vec2,
		final_leg: bool,
		agent: &AgentState,
		obstacles: &[NavObstacle],
		terrain: &dyn TerrainOracle,
		actuator: &mut dyn Actuator,
		profile: &AgentProfile,
	) -> f32 {
		let here = flat(agent.position);
		let delta = target - here;
		let mut exclude = vec![agent.entity];
		if let Some(cargo) = self.cargo {
			exclude.push(cargo);
		}
		let field = repulsion(
			agent.position,
			profile.radius,
			flat(self.resolved_goal),
			obstacles,
			&exclude,
			actuator.braking_distance(1.0),
			profile,
		);
		let desired = delta.normalize_or_zero() + field.lateral;
		let error = normalize_angle(yaw_of(desired) - agent.yaw);
		actuator.set_turn_rate((error * TURN_GAIN).clamp(-1.0, 1.0));
		let mut speed = if error.abs() > TURN_IN_PLACE_ERROR {
			0.0
		} else {
			error.cos().max(0.0)
		};
		if final_leg {
			let braking = actuator.braking_distance(1.0).max(f32::EPSILON);
			if delta.length() < braking {
				speed *= (delta.length() / braking).max(0.1);
			}
		}
		actuator.set_forward_speed(speed);
		if self.is_airborne_request(profile) && !actuator.is_grounded() {
			// cruise above the lower of the floor here and the floor ahead
			// so descents into hollows happen early, clamped to the ceiling
			let ahead = here + dir_of(agent.yaw) * ALTITUDE_LOOKAHEAD;
			let floor = terrain.floor_height(here).min(terrain.floor_height(ahead));
			let target_y = (floor + self.request.altitude).min(terrain.max_flying_height());
			let vertical = (target_y - agent.position.y) * ALTITUDE_GAIN + field.vertical;
			actuator.set_vertical_speed(vertical.clamp(-1.0, 1.0));
		} else {
			actuator.set_vertical_speed(0.0);
		}
		speed
	}
	/// Advance the task by one simulation tick
	pub fn update(
		&mut self,
		agent: &AgentState,
		obstacles: &[NavObstacle],
		terrain: &dyn TerrainOracle,
		actuator: &mut dyn Actuator,
		profile: &AgentProfile,
		dt: f32,
	) -> GotoStatus {
		let sampler = TerrainSampler { terrain, profile };
		// jet heat bookkeeping runs regardless of phase
		if profile.supports(Capability::JetPropulsion) {
			if actuator.is_grounded() {
				self.heat = (self.heat - COOL_RATE * dt).max(0.0);
			} else {
				self.heat += HEAT_RATE * dt;
				if self.heat >= 1.0 && self.phase != NavPhase::EmergencyDescent {
					warn!("jet overheated, forcing an emergency descent");
					self.phase = NavPhase::EmergencyDescent;
				}
			}
		}
		// convergence watchdog: the phases below carry no timer of their own
		// yet depend on the actuator achieving the commanded motion
		if self.phase != self.watchdog_phase {
			self.watchdog_phase = self.phase;
			self.phase_elapsed = 0.0;
		}
		self.phase_elapsed += dt;
		let stalled = match self.phase {
			NavPhase::Climbing | NavPhase::Descending | NavPhase::EmergencyDescent => {
				self.phase_elapsed > VERTICAL_PHASE_TIMEOUT
			}
			NavPhase::Turning | NavPhase::CollisionTurn => self.phase_elapsed > TURN_PHASE_TIMEOUT,
			_ => false,
		};
		if stalled {
			warn!("goto phase {:?} stalled, giving up", self.phase);
			self.release(actuator);
			return GotoStatus::Failed(NavError::StuckTimeout);
		}
		match self.phase {
			NavPhase::LeakEscape => {
				self.phase_timer -= dt;
				// drive straight out of the overlap without turning first
				let alignment = dir_of(agent.yaw).dot(dir_of(self.leak_yaw));
				actuator.set_turn_rate(0.0);
				actuator.set_forward_speed(alignment.clamp(-1.0, 1.0));
				actuator.set_vertical_speed(0.0);
				if self.phase_timer <= 0.0 {
					self.begin_search(agent, obstacles, profile);
				}
				GotoStatus::Continue
			}
			NavPhase::Searching => {
				self.release(actuator);
				if self.search.is_none() {
					self.begin_search(agent, obstacles, profile);
				}
				let Some(search) = self.search.as_mut() else {
					return GotoStatus::Continue;
				};
				match search.advance(&mut self.grid, &sampler, SEARCH_BUDGET_PER_TICK) {
					SearchStatus::InProgress => GotoStatus::Continue,
					SearchStatus::Unreachable => {
						let blocked_at_seed = !search.seeded_any();
						self.search = None;
						// a blocked interim goal says nothing about the real
						// destination, only the dead frontier does
						if blocked_at_seed && !self.interim {
							GotoStatus::Failed(NavError::ApproachBlocked)
						} else {
							GotoStatus::Failed(NavError::Unreachable)
						}
					}
					SearchStatus::Found => {
						let Some(path) =
							extract_path(search, &self.grid, flat(agent.position))
						else {
							self.search = None;
							return GotoStatus::Failed(NavError::SearchIterationExceeded);
						};
						self.search = None;
						self.waypoints = path;
						self.load_path_region(&sampler);
						self.waypoint_index = shortcut(&self.grid, &self.waypoints, 0);
						self.anchor = agent.position;
						self.stuck_timer = 0.0;
						debug!("goto path of {} waypoints", self.waypoints.len());
						if self.is_airborne_request(profile) && actuator.is_grounded() {
							self.phase = NavPhase::Climbing;
						} else {
							self.phase = NavPhase::FollowingPath;
						}
						GotoStatus::Continue
					}
				}
			}
			NavPhase::Climbing => {
				actuator.set_forward_speed(0.0);
				actuator.set_turn_rate(0.0);
				actuator.set_vertical_speed(1.0);
				let floor = terrain.floor_height(flat(agent.position));
				let ceiling = terrain.max_flying_height();
				let target_y = (floor + self.request.altitude).min(ceiling);
				if agent.position.y >= target_y - CLIMB_TOLERANCE {
					// the path can have been cleared by a restart under us
					self.phase = if self.waypoints.is_empty() {
						NavPhase::Searching
					} else {
						NavPhase::FollowingPath
					};
					self.anchor = agent.position;
					self.stuck_timer = 0.0;
				}
				GotoStatus::Continue
			}
			NavPhase::FollowingPath => {
				if actuator.consume_collision_flag() {
					return self.on_collision(actuator);
				}
				if let Some(status) = self.detect_stuck(agent, obstacles, actuator, profile, dt)
				{
					return status;
				}
				if self.waypoints.is_empty() {
					self.begin_search(agent, obstacles, profile);
					return GotoStatus::Continue;
				}
				let last = self.waypoints.len().saturating_sub(1);
				let target = self.waypoints[self.waypoint_index.min(last)];
				let here = flat(agent.position);
				let delta = target - here;
				let tolerance = if self.request.approximate {
					ARRIVAL_APPROX
				} else if self.is_airborne_request(profile) && !actuator.is_grounded() {
					ARRIVAL_FLIGHT
				} else {
					ARRIVAL_GROUND
				};
				if delta.x.abs() < tolerance && delta.y.abs() < tolerance {
					if self.waypoint_index >= last {
						if self.interim {
							// end of a leg, plan the next one from here
							self.begin_search(agent, obstacles, profile);
							return GotoStatus::Continue;
						}
						return self.arrive(actuator, profile);
					}
					self.load_path_region(&sampler);
					self.waypoint_index =
						shortcut(&self.grid, &self.waypoints, self.waypoint_index);
				}
				let target = self.waypoints[self.waypoint_index.min(last)];
				let final_leg = self.waypoint_index >= last;
				let speed = self.steer_towards(
					target, final_leg, agent, obstacles, terrain, actuator, profile,
				);
				self.commanded_speed = speed;
				GotoStatus::Continue
			}
			NavPhase::Descending => {
				actuator.set_forward_speed(0.0);
				actuator.set_turn_rate(0.0);
				actuator.set_vertical_speed(-1.0);
				if actuator.is_grounded() {
					actuator.set_vertical_speed(0.0);
					if self.cargo.is_some() && !profile.any_angle_approach {
						self.phase = NavPhase::Turning;
					} else {
						self.release(actuator);
						return GotoStatus::Succeeded;
					}
				}
				GotoStatus::Continue
			}
			NavPhase::Turning => {
				self.resolve_goal(obstacles);
				let error = normalize_angle(
					yaw_of(flat(self.resolved_goal) - flat(agent.position)) - agent.yaw,
				);
				actuator.set_forward_speed(0.0);
				actuator.set_vertical_speed(0.0);
				actuator.set_turn_rate((error * TURN_GAIN).clamp(-1.0, 1.0));
				if error.abs() < TURN_COMPLETE_ERROR {
					self.final_distance = flat(self.resolved_goal)
						.distance(flat(agent.position))
						- profile.radius;
					self.anchor = agent.position;
					self.phase = NavPhase::MovingFinalSegment;
					self.phase_timer = FINAL_SEGMENT_TIMEOUT;
				}
				GotoStatus::Continue
			}
			NavPhase::MovingFinalSegment => {
				if actuator.consume_collision_flag() {
					return self.on_collision(actuator);
				}
				self.phase_timer -= dt;
				if self.phase_timer <= 0.0 {
					self.release(actuator);
					return GotoStatus::Failed(NavError::StuckTimeout);
				}
				let travelled = flat(agent.position).distance(flat(self.anchor));
				let remaining = flat(self.resolved_goal).distance(flat(agent.position));
				if travelled >= self.final_distance - FINAL_SEGMENT_TOLERANCE
					|| remaining <= profile.radius + FINAL_SEGMENT_TOLERANCE
				{
					self.release(actuator);
					return GotoStatus::Succeeded;
				}
				let error = normalize_angle(
					yaw_of(flat(self.resolved_goal) - flat(agent.position)) - agent.yaw,
				);
				actuator.set_turn_rate((error * TURN_GAIN).clamp(-1.0, 1.0));
				actuator.set_forward_speed(FINAL_SEGMENT_SPEED);
				actuator.set_vertical_speed(0.0);
				GotoStatus::Continue
			}
			NavPhase::CollisionWait => {
				// back off from the contact while the pause runs down
				actuator.set_forward_speed(-COLLISION_BACKOFF_SPEED);
				actuator.set_turn_rate(0.0);
				actuator.set_vertical_speed(0.0);
				self.phase_timer -= dt;
				if self.phase_timer <= 0.0 {
					let right = match self.request.collision {
						CollisionReaction::TurnRight => true,
						CollisionReaction::TurnLeft => false,
						CollisionReaction::Alternate => {
							self.alternate_right = !self.alternate_right;
							self.alternate_right
						}
						// unreachable, halt reports failure before this phase
						CollisionReaction::Halt => true,
					};
					let swing = if right {
						COLLISION_TURN_ANGLE
					} else {
						-COLLISION_TURN_ANGLE
					};
					self.collision_target_yaw = normalize_angle(agent.yaw + swing);
					self.phase = NavPhase::CollisionTurn;
				}
				GotoStatus::Continue
			}
			NavPhase::CollisionTurn => {
				let error = normalize_angle(self.collision_target_yaw - agent.yaw);
				actuator.set_forward_speed(0.0);
				actuator.set_vertical_speed(0.0);
				actuator.set_turn_rate((error * TURN_GAIN).clamp(-1.0, 1.0));
				if error.abs() < TURN_COMPLETE_ERROR {
					self.phase = NavPhase::CollisionAdvance;
					self.phase_timer = COLLISION_PROBE_SECONDS;
				}
				GotoStatus::Continue
			}
			NavPhase::CollisionAdvance => {
				if actuator.consume_collision_flag() {
					return self.on_collision(actuator);
				}
				self.phase_timer -= dt;
				actuator.set_turn_rate(0.0);
				actuator.set_vertical_speed(0.0);
				actuator.set_forward_speed(COLLISION_PROBE_SPEED);
				if self.phase_timer <= 0.0 {
					self.phase = NavPhase::FollowingPath;
					self.anchor = agent.position;
					self.stuck_timer = 0.0;
				}
				GotoStatus::Continue
			}
			NavPhase::EmergencyDescent => {
				actuator.set_forward_speed(0.0);
				actuator.set_turn_rate(0.0);
				if actuator.is_grounded() {
					actuator.set_vertical_speed(0.0);
					// cool off on the ground, then resume the climb, or the
					// search when the overheat interrupted one mid-flight
					if self.heat <= HEAT_RESUME {
						if self.is_airborne_request(profile) {
							self.phase = if self.waypoints.is_empty() {
								NavPhase::Searching
							} else {
								NavPhase::Climbing
							};
						} else {
							self.release(actuator);
							return GotoStatus::Failed(NavError::Overheat);
						}
					}
				} else {
					actuator.set_vertical_speed(-1.0);
				}
				GotoStatus::Continue
			}
		}
	}
	/// Stuck detection: commanded motion without displacement for over a
	/// second restarts the search from the agent's current position, and
	/// repeated restarts fail the request
	fn detect_stuck(
		&mut self,
		agent: &AgentState,
		obstacles: &[NavObstacle],
		actuator: &mut dyn Actuator,
		profile: &AgentProfile,
		dt: f32,
	) -> Option<GotoStatus> {
		if self.commanded_speed.abs() < 0.1 {
			return None;
		}
		if agent.position.distance(self.anchor) > STUCK_DISTANCE {
			self.anchor = agent.position;
			self.stuck_timer = 0.0;
			return None;
		}
		self.stuck_timer += dt;
		if self.stuck_timer <= STUCK_SECONDS {
			return None;
		}
		self.stuck_restarts += 1;
		if self.stuck_restarts > MAX_STUCK_RESTARTS {
			self.release(actuator);
			return Some(GotoStatus::Failed(NavError::StuckTimeout));
		}
		debug!("goto stuck, re-searching from the current position");
		self.stuck_timer = 0.0;
		self.begin_search(agent, obstacles, profile);
		Some(GotoStatus::Continue)
	}
}

/// Find an obstacle snapshot by entity
fn find_obstacle<'a>(obstacles: &'a [NavObstacle], entity: Entity) -> Option<&'a NavObstacle> {
	obstacles.iter().find(|o| o.entity == entity)
}

/// Size and centre an occupancy grid over the span between the agent and the
/// goal with margin on every side
fn build_grid(here: Vec2, goal: Vec2) -> OccupancyGrid {
	let span_cells = (here.distance(goal) / CELL_SIZE).ceil() as usize;
	let side = (span_cells + 2 * GRID_MARGIN_CELLS).clamp(2 * GRID_MARGIN_CELLS, MAX_GRID_SIDE);
	OccupancyGrid::new((here + goal) * 0.5, side, CELL_SIZE)
}

#[cfg(test)]
mod tests {
	use super::*;
	/// Simulation tick length
	const DT: f32 = 0.05;
	/// World speed at full forward command
	const SIM_SPEED: f32 = 4.0;
	/// Yaw rate at full turn command
	const SIM_TURN: f32 = 2.0;
	/// World vertical speed at full vertical command
	const SIM_VSPEED: f32 = 2.0;
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
	/// An untraversable north-south ridge across `8.0 <= x <= 12.0`
	struct RidgeTerrain;
	impl TerrainOracle for RidgeTerrain {
		fn floor_height(&self, _pos: Vec2) -> f32 {
			0.0
		}
		fn fine_slope(&self, pos: Vec2) -> f32 {
			if (8.0..=12.0).contains(&pos.x) {
				1.5
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
	/// Actuator stub recording the last commands, with a scripted ground
	/// contact and optional collision reporting
	struct SimActuator {
		forward: f32,
		turn: f32,
		vertical: f32,
		grounded: bool,
		collide_always: bool,
		collide_once: bool,
	}
	impl Default for SimActuator {
		fn default() -> Self {
			SimActuator {
				forward: 0.0,
				turn: 0.0,
				vertical: 0.0,
				grounded: true,
				collide_always: false,
				collide_once: false,
			}
		}
	}
	impl Actuator for SimActuator {
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
			self.collide_always || std::mem::take(&mut self.collide_once)
		}
		fn braking_distance(&self, speed: f32) -> f32 {
			speed * 2.0
		}
	}
	/// Apply the commanded motion to the agent for one tick
	fn step_world(agent: &mut AgentState, actuator: &SimActuator) {
		agent.yaw = normalize_angle(agent.yaw + actuator.turn * SIM_TURN * DT);
		let step = dir_of(agent.yaw) * actuator.forward * SIM_SPEED * DT;
		agent.position += Vec3::new(step.x, 0.0, step.y);
	}
	/// Apply the commanded motion including vertical flight for one tick
	fn step_world_flying(agent: &mut AgentState, actuator: &mut SimActuator) {
		agent.yaw = normalize_angle(agent.yaw + actuator.turn * SIM_TURN * DT);
		let step = dir_of(agent.yaw) * actuator.forward * SIM_SPEED * DT;
		agent.position += Vec3::new(step.x, 0.0, step.y);
		agent.position.y = (agent.position.y + actuator.vertical * SIM_VSPEED * DT).max(0.0);
		actuator.grounded = agent.position.y <= 0.01;
	}
	/// Drive a task until it reports a terminal status or `ticks` runs out
	fn run(
		task: &mut GotoTask,
		agent: &mut AgentState,
		obstacles: &[NavObstacle],
		terrain: &dyn TerrainOracle,
		actuator: &mut SimActuator,
		profile: &AgentProfile,
		ticks: usize,
	) -> GotoStatus {
		for _ in 0..ticks {
			let status = task.update(agent, obstacles, terrain, actuator, profile, DT);
			if status != GotoStatus::Continue {
				return status;
			}
			step_world(agent, actuator);
		}
		GotoStatus::Continue
	}
	/// Drive a task with flight integration until it reports a terminal
	/// status or `ticks` runs out
	fn run_flying(
		task: &mut GotoTask,
		agent: &mut AgentState,
		obstacles: &[NavObstacle],
		terrain: &dyn TerrainOracle,
		actuator: &mut SimActuator,
		profile: &AgentProfile,
		ticks: usize,
	) -> GotoStatus {
		for _ in 0..ticks {
			let status = task.update(agent, obstacles, terrain, actuator, profile, DT);
			if status != GotoStatus::Continue {
				return status;
			}
			step_world_flying(agent, actuator);
		}
		GotoStatus::Continue
	}
	/// An exact ground-level position request
	fn request_to(pos: Vec3) -> GotoRequest {
		GotoRequest {
			target: GotoTarget::Position(pos),
			altitude: 0.0,
			approach: ApproachMode::Exact,
			collision: CollisionReaction::Alternate,
			approximate: false,
		}
	}
	#[test]
	fn reaches_position_goal_on_open_ground() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(20.0, 0.0, 20.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut task = GotoTask::new(request_to(goal), &agent, &[], &profile);
		let mut actuator = SimActuator::default();
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			4000,
		);
		assert_eq!(status, GotoStatus::Succeeded);
		assert!(flat(agent.position).distance(flat(goal)) < 2.0);
		assert_eq!(actuator.forward, 0.0);
		assert_eq!(actuator.turn, 0.0);
	}
	#[test]
	fn overlap_at_start_enters_leak_escape_before_any_search() {
		let profile = AgentProfile::default();
		let agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: 0.0,
		};
		let obstacles = vec![NavObstacle {
			entity: Entity::from_raw(2),
			spheres: vec![CollisionSphere {
				center: Vec3::new(0.5, 0.0, 0.0),
				radius: 2.0,
			}],
			kind: NavObstacleKind::Vehicle,
			team: 0,
			transported: false,
		}];
		let task = GotoTask::new(
			request_to(Vec3::new(20.0, 0.0, 0.0)),
			&agent,
			&obstacles,
			&profile,
		);
		assert_eq!(task.get_phase(), NavPhase::LeakEscape);
		assert!(task.search.is_none());
		assert!(task.get_waypoints().is_empty());
	}
	#[test]
	fn halt_reaction_fails_on_first_collision() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(20.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut request = request_to(goal);
		request.collision = CollisionReaction::Halt;
		let mut task = GotoTask::new(request, &agent, &[], &profile);
		let mut actuator = SimActuator {
			collide_always: true,
			..Default::default()
		};
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			50,
		);
		assert_eq!(status, GotoStatus::Failed(NavError::CollisionHalt));
		assert_eq!(actuator.forward, 0.0);
	}
	#[test]
	fn collision_retries_exhaust_into_failure() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(20.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut task = GotoTask::new(request_to(goal), &agent, &[], &profile);
		let mut actuator = SimActuator {
			collide_always: true,
			..Default::default()
		};
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			4000,
		);
		assert_eq!(status, GotoStatus::Failed(NavError::CollisionHalt));
	}
	#[test]
	fn walled_off_goal_reports_unreachable() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(24.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: 0.0,
		};
		let mut task = GotoTask::new(request_to(goal), &agent, &[], &profile);
		let mut actuator = SimActuator::default();
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&RidgeTerrain,
			&mut actuator,
			&profile,
			200,
		);
		assert_eq!(status, GotoStatus::Failed(NavError::Unreachable));
	}
	#[test]
	fn occupied_destination_reports_approach_blocked() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(15.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: 0.0,
		};
		let obstacles = vec![NavObstacle {
			entity: Entity::from_raw(2),
			spheres: vec![CollisionSphere {
				center: goal,
				radius: 2.0,
			}],
			kind: NavObstacleKind::Building,
			team: 0,
			transported: false,
		}];
		let mut task = GotoTask::new(request_to(goal), &agent, &obstacles, &profile);
		let mut actuator = SimActuator::default();
		let status = run(
			&mut task,
			&mut agent,
			&obstacles,
			&FlatTerrain,
			&mut actuator,
			&profile,
			50,
		);
		assert_eq!(status, GotoStatus::Failed(NavError::ApproachBlocked));
	}
	#[test]
	fn overheat_with_a_cleared_path_resumes_into_a_fresh_search() {
		let profile = AgentProfile {
			can_fly: true,
			has_jet: true,
			..Default::default()
		};
		let goal = Vec3::new(30.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut request = request_to(goal);
		request.altitude = 4.0;
		let mut task = GotoTask::new(request, &agent, &[], &profile);
		let mut actuator = SimActuator::default();
		// take off, then hold the world still mid-cruise until the stuck
		// detector throws the path away and starts over
		let mut interrupted = false;
		for _ in 0..2000 {
			let status = task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT);
			assert_eq!(status, GotoStatus::Continue);
			if task.get_phase() == NavPhase::Searching
				&& task.get_waypoints().is_empty()
				&& !actuator.grounded
			{
				interrupted = true;
				break;
			}
			let cruising = task.get_phase() == NavPhase::FollowingPath && !actuator.grounded;
			if !cruising {
				step_world_flying(&mut agent, &mut actuator);
			}
		}
		assert!(interrupted);
		// the jet tops out while the new search is still airborne
		task.heat = 1.0;
		let status = task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT);
		assert_eq!(status, GotoStatus::Continue);
		assert_eq!(task.get_phase(), NavPhase::EmergencyDescent);
		// land, cool off, re-plan and still make the goal
		let status = run_flying(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			8000,
		);
		assert_eq!(status, GotoStatus::Succeeded);
		assert!(actuator.grounded);
		assert!(flat(agent.position).distance(flat(goal)) < 6.0);
	}
	#[test]
	fn climb_that_never_gains_height_times_out() {
		let profile = AgentProfile {
			can_fly: true,
			..Default::default()
		};
		let goal = Vec3::new(20.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut request = request_to(goal);
		request.altitude = 5.0;
		let mut task = GotoTask::new(request, &agent, &[], &profile);
		let mut actuator = SimActuator::default();
		// the ground stepper ignores vertical commands, the climb stalls
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			800,
		);
		assert_eq!(status, GotoStatus::Failed(NavError::StuckTimeout));
		assert_eq!(actuator.forward, 0.0);
		assert_eq!(actuator.vertical, 0.0);
	}
	#[test]
	fn stuck_agent_restarts_the_search_and_finishes() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(20.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut task = GotoTask::new(request_to(goal), &agent, &[], &profile);
		let mut actuator = SimActuator::default();
		assert_eq!(
			task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT),
			GotoStatus::Continue
		);
		assert_eq!(task.get_phase(), NavPhase::FollowingPath);
		// commanded motion with no displacement trips the detector
		for _ in 0..40 {
			let status = task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT);
			assert_eq!(status, GotoStatus::Continue);
			if task.stuck_restarts > 0 {
				break;
			}
		}
		assert!(task.stuck_restarts >= 1);
		// once the world moves again the restarted attempt completes
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			2000,
		);
		assert_eq!(status, GotoStatus::Succeeded);
	}
	#[test]
	fn perpetual_stall_exhausts_restarts_into_failure() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(20.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut task = GotoTask::new(request_to(goal), &agent, &[], &profile);
		let mut actuator = SimActuator::default();
		let mut status = GotoStatus::Continue;
		for _ in 0..400 {
			status = task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT);
			if status != GotoStatus::Continue {
				break;
			}
		}
		assert_eq!(status, GotoStatus::Failed(NavError::StuckTimeout));
		assert!(task.stuck_restarts > MAX_STUCK_RESTARTS);
	}
	#[test]
	fn collision_recovery_backs_off_before_turning() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(20.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut task = GotoTask::new(request_to(goal), &agent, &[], &profile);
		let mut actuator = SimActuator {
			collide_once: true,
			..Default::default()
		};
		assert_eq!(
			task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT),
			GotoStatus::Continue
		);
		assert_eq!(
			task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT),
			GotoStatus::Continue
		);
		assert_eq!(task.get_phase(), NavPhase::CollisionWait);
		let _ = task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT);
		assert!(actuator.forward < 0.0);
		// the back-off, turn and advance loop recovers and the request completes
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			4000,
		);
		assert_eq!(status, GotoStatus::Succeeded);
	}
	#[test]
	fn far_goal_is_reached_across_planning_legs() {
		let profile = AgentProfile::default();
		let goal = Vec3::new(GRID_REACH + 172.0, 0.0, 0.0);
		let mut agent = AgentState {
			entity: Entity::from_raw(1),
			position: Vec3::ZERO,
			yaw: yaw_of(flat(goal)),
		};
		let mut task = GotoTask::new(request_to(goal), &agent, &[], &profile);
		let mut actuator = SimActuator::default();
		assert_eq!(
			task.update(&agent, &[], &FlatTerrain, &mut actuator, &profile, DT),
			GotoStatus::Continue
		);
		assert!(task.interim);
		let status = run(
			&mut task,
			&mut agent,
			&[],
			&FlatTerrain,
			&mut actuator,
			&profile,
			20_000,
		);
		assert_eq!(status, GotoStatus::Succeeded);
		assert!(flat(agent.position).distance(flat(goal)) < 2.0);
	}
}
