//! The navigation core: everything needed to take an agent from a goto
//! request to a stream of actuator commands, independent of the ECS.
//!
//! The pipeline a request flows through:
//!
//! ```text
//!  GotoRequest
//!      |
//!      v
//!  OccupancyGrid  <- obstacle rasterization + lazy terrain classification
//!      |
//!      v
//!  FrontierSearch <- goal-to-start bucket-queue flood, budgeted per tick
//!      |
//!      v
//!  extract_path   <- strictly-decreasing-distance backtrack to waypoints
//!      |
//!      v
//!  GotoTask       <- phase machine: follow, shortcut, avoid, recover
//! ```
//!
//! Only [task::GotoTask] and the traits in [world] are needed by callers, the
//! intermediate layers are exposed for tests and benches.
//!

pub mod avoidance;
pub mod grid;
pub mod path;
pub mod profile;
pub mod search;
pub mod task;
pub mod utilities;
pub mod world;
