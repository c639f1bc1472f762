pub mod fetcher;
pub mod interceptor;
pub mod request;

pub use fetcher::{FetchedResource, HttpFetcher, ResourceFetcher};
pub use interceptor::NetworkInterceptor;
pub use request::{CapturedRequest, ResourceType};
