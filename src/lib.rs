//! haven - failover core for a two-node active/passive storage cluster
//!
//! The `failover` module is the heart of the crate: it decides, on receipt
//! of a link-layer election signal, whether this node becomes the active
//! (MASTER) or passive (BACKUP) controller and drives every side effect
//! required to make that change safe. Everything the core talks to (pools,
//! services, fencing, the peer controller) lives behind the contracts in
//! `cluster`.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod failover;
pub mod observability;
