//! triviaeval-core: Dataset store, answer normalization, and the evaluation loop.
//!
//! This crate defines the data model, the provider traits, and the collect /
//! evaluate loops that the rest of triviaeval builds on. It performs no HTTP
//! itself; network access goes through the traits in [`traits`].

pub mod collector;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod report;
pub mod statistics;
pub mod throttle;
pub mod traits;
