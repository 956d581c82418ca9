pub mod artifacts;
pub mod executor;
pub mod progress;
pub mod stage;
