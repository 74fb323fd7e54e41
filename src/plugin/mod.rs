//! Defines the Bevy [Plugin] wiring the navigation core into an app.
//!

use std::marker::PhantomData;

use crate::prelude::*;
use bevy::prelude::*;

pub mod request_layer;
pub mod steer_layer;

/// Request intake runs before task advancement so a request lodged this tick
/// steers this tick
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Intake of new requests and aborts
	Request,
	/// Advancement of live tasks
	Steer,
}

/// Plugin generic over the terrain resource of the hosting game
pub struct GotoNavPlugin<T> {
	/// Binds the plugin to the terrain resource type
	_terrain: PhantomData<T>,
}

impl<T> Default for GotoNavPlugin<T> {
	fn default() -> Self {
		GotoNavPlugin {
			_terrain: PhantomData,
		}
	}
}

impl<T: TerrainOracle + Resource> Plugin for GotoNavPlugin<T> {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<GridCell>()
			.register_type::<NavPhase>()
			.register_type::<ApproachMode>()
			.register_type::<CollisionReaction>()
			.register_type::<NavObstacleKind>()
			.add_event::<request_layer::EventGotoRequest>()
			.add_event::<request_layer::EventGotoAbort>()
			.add_event::<request_layer::EventGotoComplete>()
			.configure_sets(Update, (OrderingSet::Request, OrderingSet::Steer).chain())
			.add_systems(
				Update,
				(
					(
						request_layer::process_goto_aborts,
						request_layer::process_goto_requests,
					)
						.chain()
						.in_set(OrderingSet::Request),
					steer_layer::advance_goto_tasks::<T>.in_set(OrderingSet::Steer),
				),
			);
	}
}
