use serde::{Deserialize, Serialize};

/// Coarse resource classification used by the compliance rules.
///
/// Browser engines report a richer set (xhr, stylesheet, media, ...); anything
/// the rules do not single out collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Image,
    Font,
    Script,
    Document,
    Other,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ResourceType::Image => "image",
            ResourceType::Font => "font",
            ResourceType::Script => "script",
            ResourceType::Document => "document",
            ResourceType::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// One request observed while a page was loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    pub url: String,
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_url: Option<String>,
}

impl CapturedRequest {
    pub fn new(url: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            url: url.into(),
            resource_type,
            initiator_url: None,
        }
    }

    pub fn with_initiator(mut self, initiator_url: impl Into<String>) -> Self {
        self.initiator_url = Some(initiator_url.into());
        self
    }

    pub fn is_data_url(&self) -> bool {
        self.url.starts_with("data:")
    }
}
