//! Shared test doubles for Consilium crates.

mod provider;
mod store;

pub use provider::{CapturedCall, FixedProvider, ScriptedProvider, UnconfiguredProvider};
pub use store::{FailingStore, MemoryStore};
