//! Background tasks owned by the runtime.

mod clock;
mod simulation;

pub use clock::ClockWorker;
pub use simulation::{Command, SimulationWorker};
