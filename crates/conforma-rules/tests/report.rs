use conforma_rules::{RuleOutcomes, RuleResult, ValidationReport};

fn failing(url: &str) -> RuleResult {
    RuleResult::from_violations(vec![url.to_string()])
}

#[test]
fn rule_result_flag_follows_violations() {
    let mut result = RuleResult::passed();
    assert!(result.test_passed());

    result.record_violation("https://site.com/a.png");
    assert!(!result.test_passed());
    assert_eq!(result.not_passed_urls().len(), 1);
    assert!(RuleResult::default().test_passed());
}

#[test]
fn overall_is_conjunction_of_rules() {
    let clean = ValidationReport::new("https://site.com/p.shtm", "desktop", RuleOutcomes::default());
    assert!(clean.overall_passed());
    assert_eq!(clean.label(), "https://site.com/p.shtm - desktop");

    let outcomes = RuleOutcomes {
        font: failing("https://site.com/Arial.woff2"),
        ..RuleOutcomes::default()
    };
    let report = ValidationReport::new("https://site.com/p.shtm", "mobile", outcomes);
    assert!(!report.overall_passed());
    assert!(report
        .rule_results()
        .iter()
        .any(|(name, result)| *name == "fontResult" && !result.test_passed()));
}

#[test]
fn report_serializes_with_camel_case_fields() {
    let outcomes = RuleOutcomes {
        html_extension: failing("https://site.com/p.html"),
        ..RuleOutcomes::default()
    };
    let report = ValidationReport::new("https://site.com/p.html", "desktop", outcomes)
        .with_navigation_error("timed out");
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["label"], "https://site.com/p.html - desktop");
    assert_eq!(json["overallPassed"], false);
    assert_eq!(json["htmlExtensionResult"]["testPassed"], false);
    assert_eq!(json["htmlExtensionResult"]["notPassedUrls"][0], "https://site.com/p.html");
    assert_eq!(json["navigationError"], "timed out");
    assert!(json.get("trialError").is_none());

    let back: ValidationReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn deserializing_contradictory_rule_result_fails() {
    let raw = r#"{"testPassed": true, "notPassedUrls": ["https://site.com/x.png"]}"#;
    assert!(serde_json::from_str::<RuleResult>(raw).is_err());
}

#[test]
fn deserializing_contradictory_overall_fails() {
    let report = ValidationReport::new("https://site.com/p.html", "desktop", RuleOutcomes {
        html_extension: failing("https://site.com/p.html"),
        ..RuleOutcomes::default()
    });
    let mut json = serde_json::to_value(&report).unwrap();
    json["overallPassed"] = serde_json::Value::Bool(true);
    assert!(serde_json::from_value::<ValidationReport>(json).is_err());
}
