// src/lib.rs

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod proctor;
pub mod signals;
pub mod state;
pub mod utils;

// Re-export specific items for convenience if needed
pub use ledger::AttemptLedger;
pub use proctor::{ControllerHandle, IntegrityController, launch_attempt};
