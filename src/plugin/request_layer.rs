//! Intake of goto requests and aborts from the rest of the game.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Ask an agent entity to navigate somewhere. A request for an agent that is
/// already navigating supersedes the running attempt silently
#[derive(Event)]
pub struct EventGotoRequest {
	/// The agent entity to drive
	entity: Entity,
	/// The parameters of the attempt
	request: GotoRequest,
}

impl EventGotoRequest {
	/// Create a new instance of [EventGotoRequest]
	pub fn new(entity: Entity, request: GotoRequest) -> Self {
		EventGotoRequest { entity, request }
	}
}

/// Stop an agent's running navigation attempt without reporting completion
#[derive(Event)]
pub struct EventGotoAbort {
	/// The agent entity to stop
	pub entity: Entity,
}

/// Emitted once when a navigation attempt ends, successfully or not
#[derive(Event)]
pub struct EventGotoComplete {
	/// The agent entity the attempt belonged to
	pub entity: Entity,
	/// How the attempt ended
	pub result: Result<(), NavError>,
}

/// Process [EventGotoRequest] by attaching a fresh [GotoTask] to each named
/// agent, tearing down any attempt the request supersedes
#[cfg(not(tarpaulin_include))]
pub fn process_goto_requests(
	mut commands: Commands,
	mut events: EventReader<EventGotoRequest>,
	mut agents: Query<(&Transform, &NavAgent, &mut NavMotor, Option<&ActiveGoto>)>,
	obstacles: Query<(
		Entity,
		&Transform,
		&ObstacleBody,
		Option<&BeingTransported>,
	)>,
) {
	for event in events.read() {
		let Ok((transform, agent, mut motor, active)) = agents.get_mut(event.entity) else {
			warn!("goto request for {:?} which is not a NavAgent", event.entity);
			continue;
		};
		if let Some(active) = active {
			active.0.release(motor.as_mut());
		}
		let snapshot = collect_obstacles(&obstacles);
		let state = agent_state(event.entity, transform);
		let task = GotoTask::new(event.request, &state, &snapshot, &agent.profile);
		commands.entity(event.entity).insert(ActiveGoto(task));
	}
}

/// Process [EventGotoAbort] by zeroing the motor and dropping the attempt,
/// no completion event is emitted
#[cfg(not(tarpaulin_include))]
pub fn process_goto_aborts(
	mut commands: Commands,
	mut events: EventReader<EventGotoAbort>,
	mut agents: Query<(&mut NavMotor, &ActiveGoto)>,
) {
	for event in events.read() {
		if let Ok((mut motor, active)) = agents.get_mut(event.entity) {
			active.0.release(motor.as_mut());
			commands.entity(event.entity).remove::<ActiveGoto>();
		}
	}
}

/// Resolve every obstacle entity into a world-space snapshot for the
/// navigation core
pub fn collect_obstacles(
	obstacles: &Query<(
		Entity,
		&Transform,
		&ObstacleBody,
		Option<&BeingTransported>,
	)>,
) -> Vec<NavObstacle> {
	obstacles
		.iter()
		.map(|(entity, transform, body, transported)| NavObstacle {
			entity,
			spheres: body
				.spheres
				.iter()
				.map(|s| CollisionSphere {
					center: transform.translation + s.center,
					radius: s.radius,
				})
				.collect(),
			kind: body.kind,
			team: body.team,
			transported: transported.is_some(),
		})
		.collect()
}

/// Snapshot an agent transform into the state the navigation core reads
pub fn agent_state(entity: Entity, transform: &Transform) -> AgentState {
	let forward = Vec3::from(transform.forward());
	AgentState {
		entity,
		position: transform.translation,
		yaw: yaw_of(flat(forward)),
	}
}
