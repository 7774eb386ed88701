//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: domain types
//! - `wire.rs`: raw serde structs matching backend responses
//! - `client.rs`: sub-client with HTTP methods
//!
//! `giveaway` also carries the state store and the finish workflow.

pub mod giveaway;
pub mod participant;
