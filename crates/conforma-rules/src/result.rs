use serde::{Deserialize, Serialize};

/// Outcome of one compliance rule.
///
/// `test_passed` is derived from the violation list and cannot be set on its
/// own, so a result can never claim to pass while listing offenders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRuleResult")]
pub struct RuleResult {
    test_passed: bool,
    not_passed_urls: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRuleResult {
    test_passed: bool,
    #[serde(default)]
    not_passed_urls: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("testPassed={test_passed} contradicts {violations} listed violation(s)")]
pub struct InconsistentRuleResult {
    pub test_passed: bool,
    pub violations: usize,
}

impl TryFrom<RawRuleResult> for RuleResult {
    type Error = InconsistentRuleResult;

    fn try_from(raw: RawRuleResult) -> Result<Self, Self::Error> {
        if raw.test_passed != raw.not_passed_urls.is_empty() {
            return Err(InconsistentRuleResult {
                test_passed: raw.test_passed,
                violations: raw.not_passed_urls.len(),
            });
        }
        Ok(Self::from_violations(raw.not_passed_urls))
    }
}

impl RuleResult {
    pub fn passed() -> Self {
        Self::from_violations(Vec::new())
    }

    pub fn from_violations(not_passed_urls: Vec<String>) -> Self {
        Self {
            test_passed: not_passed_urls.is_empty(),
            not_passed_urls,
        }
    }

    pub fn record_violation(&mut self, url: impl Into<String>) {
        self.not_passed_urls.push(url.into());
        self.test_passed = false;
    }

    pub fn test_passed(&self) -> bool {
        self.test_passed
    }

    pub fn not_passed_urls(&self) -> &[String] {
        &self.not_passed_urls
    }
}

impl Default for RuleResult {
    fn default() -> Self {
        Self::passed()
    }
}

impl FromIterator<String> for RuleResult {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::from_violations(iter.into_iter().collect())
    }
}
