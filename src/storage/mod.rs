pub mod fsync;
pub mod journal;
pub mod snapshot;
pub mod state;
pub mod store;

#[cfg(test)]
mod property_tests;

pub use journal::{Journal, Record};
pub use state::DurableState;
pub use store::{StatePaths, StateStore};
