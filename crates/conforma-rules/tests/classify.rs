use conforma_network::{CapturedRequest, ResourceType};
use conforma_rules::classify::{file_extension, font_name};
use conforma_rules::{ImageSample, RuleConfig, RuleSet};
use url::Url;

fn page() -> Url {
    Url::parse("https://site.com/page.shtm").unwrap()
}

fn sample(url: &str, size_bytes: u64) -> ImageSample {
    ImageSample {
        url: url.to_string(),
        size_bytes,
    }
}

#[test]
fn webp_and_svg_images_pass_extension_rule() {
    let rules = RuleSet::default();
    let result = rules.image_extensions(&[
        sample("https://site.com/img/hero.webp", 10),
        sample("https://site.com/img/icon.svg?v=3", 10),
    ]);
    assert!(result.test_passed());
    assert!(result.not_passed_urls().is_empty());
}

#[test]
fn png_image_fails_extension_rule() {
    let rules = RuleSet::default();
    let result = rules.image_extensions(&[
        sample("https://site.com/img/hero.webp", 10),
        sample("https://site.com/img/banner.png", 10),
    ]);
    assert!(!result.test_passed());
    assert_eq!(result.not_passed_urls(), ["https://site.com/img/banner.png"]);
}

#[test]
fn extension_matching_ignores_case() {
    let rules = RuleSet::default();
    assert!(rules
        .image_extensions(&[sample("https://site.com/HERO.WEBP", 1)])
        .test_passed());
}

#[test]
fn image_weight_limit_is_500_kib() {
    let rules = RuleSet::default();
    let result = rules.image_weights(&[
        sample("https://site.com/small.webp", 400 * 1000),
        sample("https://site.com/exact.webp", 500 * 1024),
        sample("https://site.com/large.webp", 600 * 1000),
    ]);
    assert_eq!(result.not_passed_urls(), ["https://site.com/large.webp"]);
}

#[test]
fn image_weight_threshold_is_configurable() {
    let rules = RuleSet::new(RuleConfig {
        max_image_size_kib: 100,
        ..RuleConfig::default()
    });
    let result = rules.image_weights(&[sample("https://site.com/a.webp", 200 * 1024)]);
    assert!(!result.test_passed());
}

#[test]
fn html_rule_requires_shtm_suffix() {
    let rules = RuleSet::default();
    assert!(rules.html_extension("https://site.com/page.shtm").test_passed());

    let failed = rules.html_extension("https://site.com/page.html");
    assert!(!failed.test_passed());
    assert_eq!(failed.not_passed_urls(), ["https://site.com/page.html"]);
}

#[test]
fn font_rule_accepts_whitelisted_families() {
    let rules = RuleSet::default();
    let requests = vec![
        CapturedRequest::new("https://site.com/fonts/BradescoSans-Regular.woff2", ResourceType::Font),
        CapturedRequest::new("https://site.com/fonts/open-sans-serif.woff", ResourceType::Font),
        CapturedRequest::new("https://site.com/fonts/Arial-Bold.woff2", ResourceType::Font),
        CapturedRequest::new("https://site.com/fonts/Arial-Bold.css", ResourceType::Other),
    ];
    let result = rules.fonts(&requests);
    assert_eq!(
        result.not_passed_urls(),
        ["https://site.com/fonts/Arial-Bold.woff2"]
    );
}

#[test]
fn allow_listed_origins_and_data_urls_pass_external_rule() {
    let rules = RuleSet::default();
    let requests = vec![
        CapturedRequest::new("https://site.com/app.js", ResourceType::Script),
        CapturedRequest::new("https://www.google-analytics.com/analytics.js", ResourceType::Script),
        CapturedRequest::new("https://static.ads-twitter.com/oct.js", ResourceType::Script),
        CapturedRequest::new("data:image/png;base64,AAAA", ResourceType::Image),
    ];
    assert!(rules.external_resources(&requests, &page()).test_passed());
}

#[test]
fn unknown_origin_fails_external_rule() {
    let rules = RuleSet::default();
    let requests = vec![
        CapturedRequest::new("https://unknown-cdn.example/x.js", ResourceType::Script),
        CapturedRequest::new("https://site.com.evil.example/y.js", ResourceType::Script),
    ];
    let result = rules.external_resources(&requests, &page());
    assert_eq!(
        result.not_passed_urls(),
        [
            "https://unknown-cdn.example/x.js",
            "https://site.com.evil.example/y.js"
        ]
    );
}

#[test]
fn allowed_initiator_exempts_its_requests() {
    let rules = RuleSet::default();
    let requests = vec![CapturedRequest::new("https://unknown-cdn.example/pixel.gif", ResourceType::Image)
        .with_initiator("http://static.ads-twitter.com/uwt.js")];
    assert!(rules.external_resources(&requests, &page()).test_passed());
}

#[test]
fn initiator_allow_list_ignores_case() {
    let rules = RuleSet::new(RuleConfig {
        allowed_initiators: vec!["HTTP://Static.Ads-Twitter.com/UWT.js".to_string()],
        ..RuleConfig::default()
    });
    let requests = vec![
        CapturedRequest::new("https://unknown-cdn.example/pixel.gif", ResourceType::Image)
            .with_initiator("http://static.ads-twitter.com/uwt.js"),
        CapturedRequest::new("https://unknown-cdn.example/other.gif", ResourceType::Image)
            .with_initiator("http://static.ads-twitter.com/other.js"),
    ];

    let result = rules.external_resources(&requests, &page());
    assert_eq!(result.not_passed_urls(), ["https://unknown-cdn.example/other.gif"]);
}

#[test]
fn only_same_origin_images_are_selected_for_refetch() {
    let rules = RuleSet::default();
    let requests = vec![
        CapturedRequest::new("https://site.com/a.png", ResourceType::Image),
        CapturedRequest::new("https://cdn.example/b.png", ResourceType::Image),
        CapturedRequest::new("https://site.com/app.js", ResourceType::Script),
    ];
    let selected: Vec<_> = rules
        .same_origin_images(&requests, &page())
        .into_iter()
        .map(|request| request.url.as_str())
        .collect();
    assert_eq!(selected, ["https://site.com/a.png"]);
}

#[test]
fn helpers_extract_extension_and_font_name() {
    assert_eq!(file_extension("https://site.com/a/b.min.SVG#frag").as_deref(), Some("svg"));
    assert_eq!(file_extension("https://site.com/img/noext"), None);
    assert_eq!(font_name("https://site.com/f/BradescoSans-Bold.woff2?v=1"), "BradescoSans-Bold");
}

#[test]
fn rule_config_parses_partial_toml() {
    let config: RuleConfig = toml::from_str(
        r#"
        max_image_size_kib = 250
        accepted_image_extensions = ["webp", "avif"]
        "#,
    )
    .unwrap();
    assert_eq!(config.max_image_size_kib, 250);
    assert_eq!(config.required_html_suffix, ".shtm");
    assert_eq!(config.allowed_initiators, ["http://static.ads-twitter.com/uwt.js"]);
}
