//! Command dispatcher
//!
//! Turns a decoded command record into axis operations and a reply. Every
//! command yields exactly one reply; unknown ids and invalid mode values
//! are reported as error replies rather than failures.

pub mod command;
pub mod handler;

pub use command::{AxisValues, Command};
pub use handler::{apply, Reply, Target};
