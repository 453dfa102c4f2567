//! Embassy async tasks
//!
//! Each task runs independently and communicates through the shared
//! state in [`crate::channels`].

pub mod control;
pub mod indicator;
pub mod rows;
pub mod sample;

pub use control::control_task;
pub use indicator::indicator_task;
pub use rows::rows_task;
pub use sample::sample_task;
