//! Deterministic engine that replays recorded page loads.
//!
//! A fixture maps page URLs to the requests their load produces, and
//! resource URLs to the body sizes a re-fetch would observe. Nothing touches
//! the network, so identical fixtures always yield identical reports.

mod engine;

pub use engine::{Fixture, FixtureEngine, FixtureFetcher, FixturePage, FixtureResource};
