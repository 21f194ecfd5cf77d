//! Compiled-in stage configuration
//!
//! Generated by build.rs from stage.toml.

use stage_core::config::{AxisConfig, JoystickConfig, SchedulerConfig, StageConfig, SupervisorConfig};

include!(concat!(env!("OUT_DIR"), "/stage_config.rs"));
