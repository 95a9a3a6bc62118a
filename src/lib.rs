//! Journey: a navigable timeline of development events.
//!
//! The [`engine::Engine`] owns a session's state: the loaded journey, the
//! viewport over it, filters, selection, and playback. Hosts drive it with
//! commands or raw [`input::Input`]s and read derived views back.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod filter;
pub mod input;
pub mod journey;
pub mod model;
pub mod persist;
pub mod playback;
pub mod provider;
pub mod storage;
pub mod viewport;
