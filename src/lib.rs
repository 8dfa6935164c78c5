//! A compute federation broker: resource advertisement intake, reservation
//! decisioning, and instruction dispatch across independent clusters.
//!
//! The library is organized around the broker's own component boundaries:
//! `domain` + `store` are the data model and its persistence contract,
//! `decision` + `locking` are the two pure/concurrent halves of picking and
//! claiming a provider, `broker` is the HTTP surface that wires them
//! together, and `agent` is the per-cluster counterpart that drives it.

pub mod agent;
pub mod api;
pub mod broker;
pub mod config;
pub mod decision;
pub mod domain;
pub mod locking;
pub mod logger;
pub mod store;
