//! Per-tick advancement of every live [GotoTask] against the terrain
//! resource and a fresh obstacle snapshot.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Advance every agent's running attempt by one tick, writing motor commands
/// and converting terminal statuses into [EventGotoComplete]
#[cfg(not(tarpaulin_include))]
pub fn advance_goto_tasks<T: TerrainOracle + Resource>(
	mut commands: Commands,
	terrain: Res<T>,
	time: Res<Time>,
	mut agents: Query<(
		Entity,
		&Transform,
		&NavAgent,
		&mut NavMotor,
		&mut ActiveGoto,
	)>,
	obstacles: Query<(
		Entity,
		&Transform,
		&ObstacleBody,
		Option<&BeingTransported>,
	)>,
	mut completions: EventWriter<EventGotoComplete>,
) {
	let snapshot = collect_obstacles(&obstacles);
	let dt = time.delta_secs();
	for (entity, transform, agent, mut motor, mut active) in agents.iter_mut() {
		let state = agent_state(entity, transform);
		let status = active.0.update(
			&state,
			&snapshot,
			terrain.as_ref(),
			motor.as_mut(),
			&agent.profile,
			dt,
		);
		match status {
			GotoStatus::Continue => {}
			GotoStatus::Succeeded => {
				debug!("goto for {:?} succeeded", entity);
				completions.send(EventGotoComplete {
					entity,
					result: Ok(()),
				});
				commands.entity(entity).remove::<ActiveGoto>();
			}
			GotoStatus::Failed(error) => {
				debug!("goto for {:?} failed: {}", entity, error);
				completions.send(EventGotoComplete {
					entity,
					result: Err(error),
				});
				commands.entity(entity).remove::<ActiveGoto>();
			}
		}
	}
}
