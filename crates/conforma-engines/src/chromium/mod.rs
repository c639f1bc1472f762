mod engine;

pub use engine::{ChromiumEngine, ChromiumOptions, ChromiumPage};
