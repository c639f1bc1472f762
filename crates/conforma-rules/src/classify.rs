use std::collections::HashSet;

use conforma_network::{CapturedRequest, ResourceType};
use url::Url;

use crate::config::RuleConfig;
use crate::result::RuleResult;

/// A same-origin image that was successfully re-downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSample {
    pub url: String,
    pub size_bytes: u64,
}

/// The five compliance rules, bound to one [`RuleConfig`].
///
/// Every rule is a pure function of its inputs. String matching is ASCII
/// case-insensitive across all rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    config: RuleConfig,
    image_extensions: Vec<String>,
    font_substrings: Vec<String>,
    html_suffix: String,
    allowed_origins: HashSet<String>,
    allowed_initiators: HashSet<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl RuleSet {
    pub fn new(config: RuleConfig) -> Self {
        let image_extensions = lowercase_all(&config.accepted_image_extensions);
        let font_substrings = lowercase_all(&config.accepted_font_substrings);
        let html_suffix = config.required_html_suffix.to_ascii_lowercase();
        let allowed_origins = config
            .allowed_origins
            .iter()
            .map(|entry| origin_of(entry).unwrap_or_else(|| entry.trim().to_string()))
            .collect();
        let allowed_initiators = config
            .allowed_initiators
            .iter()
            .map(|entry| entry.trim().to_ascii_lowercase())
            .collect();

        Self {
            config,
            image_extensions,
            font_substrings,
            html_suffix,
            allowed_origins,
            allowed_initiators,
        }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Image requests served from the page's own origin, in capture order.
    /// These are the only images the image rules look at.
    pub fn same_origin_images<'a>(
        &self,
        requests: &'a [CapturedRequest],
        page_url: &Url,
    ) -> Vec<&'a CapturedRequest> {
        let base = page_url.origin().ascii_serialization();
        requests
            .iter()
            .filter(|request| request.resource_type == ResourceType::Image)
            .filter(|request| origin_of(&request.url).as_deref() == Some(base.as_str()))
            .collect()
    }

    pub fn image_extensions(&self, samples: &[ImageSample]) -> RuleResult {
        samples
            .iter()
            .filter(|sample| {
                let accepted = file_extension(&sample.url)
                    .map(|ext| self.image_extensions.contains(&ext))
                    .unwrap_or(false);
                !accepted
            })
            .map(|sample| sample.url.clone())
            .collect()
    }

    pub fn image_weights(&self, samples: &[ImageSample]) -> RuleResult {
        let limit = self.config.max_image_size_bytes();
        samples
            .iter()
            .filter(|sample| sample.size_bytes > limit)
            .map(|sample| sample.url.clone())
            .collect()
    }

    /// `page_url` is the address as submitted, not a normalized form.
    pub fn html_extension(&self, page_url: &str) -> RuleResult {
        if page_url.to_ascii_lowercase().ends_with(&self.html_suffix) {
            RuleResult::passed()
        } else {
            RuleResult::from_violations(vec![page_url.to_string()])
        }
    }

    pub fn fonts(&self, requests: &[CapturedRequest]) -> RuleResult {
        requests
            .iter()
            .filter(|request| request.resource_type == ResourceType::Font)
            .filter(|request| {
                let name = font_name(&request.url).to_ascii_lowercase();
                !self
                    .font_substrings
                    .iter()
                    .any(|accepted| name.contains(accepted.as_str()))
            })
            .map(|request| request.url.clone())
            .collect()
    }

    /// A request violates the rule only when it leaves the page's origin, is
    /// not inline data, targets no allowed origin and was not initiated by an
    /// allowed script.
    pub fn external_resources(&self, requests: &[CapturedRequest], page_url: &Url) -> RuleResult {
        let base = page_url.origin().ascii_serialization();
        requests
            .iter()
            .filter(|request| {
                let origin = origin_of(&request.url);
                let same_origin = origin.as_deref() == Some(base.as_str());
                let allowed_origin = origin
                    .as_ref()
                    .is_some_and(|origin| self.allowed_origins.contains(origin));
                let allowed_initiator = request
                    .initiator_url
                    .as_ref()
                    .is_some_and(|initiator| {
                        self.allowed_initiators
                            .contains(&initiator.trim().to_ascii_lowercase())
                    });

                !same_origin && !request.is_data_url() && !allowed_origin && !allowed_initiator
            })
            .map(|request| request.url.clone())
            .collect()
    }
}

/// Lower-cased text after the last `.` of the URL's final path segment.
pub fn file_extension(url: &str) -> Option<String> {
    let segment = last_segment(url);
    segment
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Final path segment up to its first `.`.
pub fn font_name(url: &str) -> String {
    let segment = last_segment(url);
    segment.split('.').next().unwrap_or_default().to_string()
}

fn last_segment(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next().unwrap_or_default().to_string()
        }
    }
}

fn origin_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .map(|parsed| parsed.origin())
        .filter(|origin| origin.is_tuple())
        .map(|origin| origin.ascii_serialization())
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|value| value.to_ascii_lowercase()).collect()
}
