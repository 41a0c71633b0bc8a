//! Zone tracking
//!
//! Scroll zone geometry and the per-frame gesture state machine.

pub mod state_machine;
pub mod zone;

pub use state_machine::ZoneStateMachine;
pub use zone::ZoneGeometry;
