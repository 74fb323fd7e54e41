//! This is a plugin for Bevy game engine to handle autonomous ground and air
//! agent navigation: occupancy-grid search, waypoint following, local
//! avoidance and collision recovery behind a single goto request
//!

pub mod navigation;
pub mod bundle;
pub mod plugin;

pub mod prelude;
