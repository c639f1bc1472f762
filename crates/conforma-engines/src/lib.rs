pub mod chromium;
pub mod fixture;
pub mod traits;
pub mod viewport;

pub use traits::{BrowserEngine, EngineKind, PageSession, RequestEventStream};
pub use viewport::ViewportSpec;
