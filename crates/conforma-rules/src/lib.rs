pub mod classify;
pub mod config;
pub mod report;
pub mod result;

pub use classify::{ImageSample, RuleSet};
pub use config::{
    RuleConfig, DEFAULT_ACCEPTED_FONT_SUBSTRINGS, DEFAULT_ACCEPTED_IMAGE_EXTENSIONS,
    DEFAULT_ALLOWED_INITIATORS, DEFAULT_ALLOWED_ORIGINS, DEFAULT_MAX_IMAGE_SIZE_KIB,
    DEFAULT_REQUIRED_HTML_SUFFIX,
};
pub use report::{ReportError, RuleOutcomes, ValidationReport};
pub use result::{InconsistentRuleResult, RuleResult};
