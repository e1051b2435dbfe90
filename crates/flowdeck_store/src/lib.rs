// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow store for Flowdeck.
//!
//! [`FlowStore`] is an owned state object: editing surfaces and the
//! simulation driver hold a reference to it and mutate it only through its
//! methods. Everything is synchronous; active-node eviction is driven by
//! the host calling [`FlowStore::expire_active_nodes`] on its event loop.

pub mod config;
pub mod simulation;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use simulation::{ActivationScheduler, SimulationEvent, SimulationState};
pub use store::{FlowFormatError, FlowStore};
