//! Logging state machine and fault latches

pub mod faults;
pub mod machine;

pub use faults::{Fault, FaultFlags};
pub use machine::{Event, State};
