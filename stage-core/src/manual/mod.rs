//! Manual control from the joystick and push-button

pub mod joystick;

pub use joystick::{JoystickSample, ManualControl, ManualOutcome};
