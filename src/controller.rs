//! Round orchestration.
//!
//! - [`Scheduler`]: fixed-interval, drift-free round trigger.
//! - [`CaptureOrchestrator`]: fan-out of one capture task per camera, joined
//!   in chunk order.
//! - [`Controller`]: builds both from the configuration and runs them.

pub mod controller_handler;
pub mod orchestrator;
pub mod scheduler;

pub use controller_handler::Controller;
pub use orchestrator::{CaptureOrchestrator, LaunchPlan};
pub use scheduler::Scheduler;
