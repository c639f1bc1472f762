pub mod batch;
pub mod engine_factory;
pub mod error;
pub mod handle;
pub mod inspector;
pub mod service;
pub mod store;

pub use batch::{parse_url_list, parse_urls, BatchDriver, PageTarget};
pub use engine_factory::{ChromiumFactory, EngineFactory, FixtureFactory};
pub use error::BatchError;
pub use handle::{ValidationHandle, ValidationRequest};
pub use inspector::{PageInspector, TrialState};
pub use store::{FileReportStore, MemoryReportStore, ReportStore, StoreError};
