pub mod controller;
pub mod state;

pub use controller::{FreewriteTimer, TimerListener};
pub use state::{format_clock, TickOutcome, TimerState, TimerStatus};
