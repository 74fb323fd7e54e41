//! `use bevy_goto_nav_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::navigation::{
	avoidance::*, grid::*, path::*, profile::*, search::*, task::*, utilities::*, world::*,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{request_layer::*, steer_layer::*, *},
};
