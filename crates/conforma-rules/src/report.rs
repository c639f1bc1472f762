use serde::{Deserialize, Serialize};

use crate::result::RuleResult;

/// The five rule results of one trial, before they are sealed into a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcomes {
    pub image_extension: RuleResult,
    pub image_weight: RuleResult,
    pub html_extension: RuleResult,
    pub font: RuleResult,
    pub external_resource: RuleResult,
}

impl RuleOutcomes {
    pub fn all_passed(&self) -> bool {
        self.image_extension.test_passed()
            && self.image_weight.test_passed()
            && self.html_extension.test_passed()
            && self.font.test_passed()
            && self.external_resource.test_passed()
    }
}

/// Compliance report for one (URL, viewport) trial.
///
/// Immutable once built; `overall_passed` is always the conjunction of the
/// five rule results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawValidationReport")]
pub struct ValidationReport {
    label: String,
    url: String,
    viewport: String,
    image_extension_result: RuleResult,
    image_weight_result: RuleResult,
    html_extension_result: RuleResult,
    font_result: RuleResult,
    external_resource_result: RuleResult,
    overall_passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    navigation_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trial_error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("overallPassed={claimed} but rule results evaluate to {derived}")]
    InconsistentOverall { claimed: bool, derived: bool },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValidationReport {
    label: String,
    url: String,
    viewport: String,
    image_extension_result: RuleResult,
    image_weight_result: RuleResult,
    html_extension_result: RuleResult,
    font_result: RuleResult,
    external_resource_result: RuleResult,
    overall_passed: bool,
    #[serde(default)]
    navigation_error: Option<String>,
    #[serde(default)]
    trial_error: Option<String>,
}

impl TryFrom<RawValidationReport> for ValidationReport {
    type Error = ReportError;

    fn try_from(raw: RawValidationReport) -> Result<Self, Self::Error> {
        let outcomes = RuleOutcomes {
            image_extension: raw.image_extension_result,
            image_weight: raw.image_weight_result,
            html_extension: raw.html_extension_result,
            font: raw.font_result,
            external_resource: raw.external_resource_result,
        };
        let derived = outcomes.all_passed();
        if derived != raw.overall_passed {
            return Err(ReportError::InconsistentOverall {
                claimed: raw.overall_passed,
                derived,
            });
        }

        let mut report = ValidationReport::new(&raw.url, &raw.viewport, outcomes);
        report.label = raw.label;
        report.navigation_error = raw.navigation_error;
        report.trial_error = raw.trial_error;
        Ok(report)
    }
}

impl ValidationReport {
    pub fn new(url: &str, viewport: &str, outcomes: RuleOutcomes) -> Self {
        let overall_passed = outcomes.all_passed();
        Self {
            label: format!("{url} - {viewport}"),
            url: url.to_string(),
            viewport: viewport.to_string(),
            image_extension_result: outcomes.image_extension,
            image_weight_result: outcomes.image_weight,
            html_extension_result: outcomes.html_extension,
            font_result: outcomes.font,
            external_resource_result: outcomes.external_resource,
            overall_passed,
            navigation_error: None,
            trial_error: None,
        }
    }

    pub fn with_navigation_error(mut self, error: impl Into<String>) -> Self {
        self.navigation_error = Some(error.into());
        self
    }

    pub fn with_trial_error(mut self, error: impl Into<String>) -> Self {
        self.trial_error = Some(error.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn viewport(&self) -> &str {
        &self.viewport
    }

    pub fn image_extension_result(&self) -> &RuleResult {
        &self.image_extension_result
    }

    pub fn image_weight_result(&self) -> &RuleResult {
        &self.image_weight_result
    }

    pub fn html_extension_result(&self) -> &RuleResult {
        &self.html_extension_result
    }

    pub fn font_result(&self) -> &RuleResult {
        &self.font_result
    }

    pub fn external_resource_result(&self) -> &RuleResult {
        &self.external_resource_result
    }

    pub fn overall_passed(&self) -> bool {
        self.overall_passed
    }

    pub fn navigation_error(&self) -> Option<&str> {
        self.navigation_error.as_deref()
    }

    pub fn trial_error(&self) -> Option<&str> {
        self.trial_error.as_deref()
    }

    /// Rule results in display order, keyed by their report field name.
    pub fn rule_results(&self) -> [(&'static str, &RuleResult); 5] {
        [
            ("imageExtensionResult", &self.image_extension_result),
            ("imageWeightResult", &self.image_weight_result),
            ("htmlExtensionResult", &self.html_extension_result),
            ("fontResult", &self.font_result),
            ("externalResourceResult", &self.external_resource_result),
        ]
    }
}
