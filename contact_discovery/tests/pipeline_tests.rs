mod common;

use std::time::{Duration, Instant};

use contact_discovery::batch::{run_batch, BatchEntry};
use contact_discovery::{BatchConfig, DiscoveryConfig, NetworkErrorKind, SearchMethod};

use common::{discoverer, discoverer_with, plain_page, test_config, FixtureFetcher};

const ROOT: &str = "https://x.test/";
const FORM_PAGE: &str = r#"<form><input name="email"><input type="submit"></form>"#;
const RECAPTCHA_PAGE: &str = r#"<html><body><h1>お問い合わせ</h1>
    <p>お電話でのお問い合わせ: 03-1234-5678</p>
    <div id="app"></div><div class="g-recaptcha" data-sitekey="site-key"></div>
    <script src="https://www.google.com/recaptcha/api.js"></script></body></html>"#;

fn homepage_with_nav(nav: &str) -> String {
    format!(
        "<html><body><header><nav>{nav}</nav></header>\
         <main><p>Welcome to our company website.</p></main></body></html>"
    )
}

fn inquiry_google_form_page() -> String {
    r#"<html><body><h1>お問い合わせ</h1>
    <p>お問い合わせは以下のフォームからお願いします。</p>
    <iframe src="https://docs.google.com/forms/d/e/1FAIpQLSf_abc123/viewform?embedded=true"
        width="640" height="800"></iframe>
    </body></html>"#
        .to_string()
}

#[tokio::test]
async fn native_form_on_first_pattern_short_circuits() {
    let (d, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/contact/", 200, FORM_PAGE),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::ContactFormPrioritySearch);
    assert_eq!(
        r.contact_url.as_ref().map(|u| u.as_str()),
        Some("https://x.test/contact/")
    );
    assert_eq!(
        r.actual_form_url.as_ref().map(|u| u.as_str()),
        Some("https://x.test/contact/")
    );
    assert_eq!(fx.requests_after(ROOT), vec!["https://x.test/contact/".to_string()]);
}

#[tokio::test]
async fn dns_failure_on_first_pattern_stops_everything() {
    let (d, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .fail("https://x.test/contact/", NetworkErrorKind::Dns),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::DnsError);
    assert!(r.contact_url.is_none());
    assert_eq!(fx.requests_after(ROOT).len(), 1);
}

#[tokio::test]
async fn other_request_failures_are_skipped() {
    let (d, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .fail("https://x.test/contact/", NetworkErrorKind::Connection)
            .fail("https://x.test/contact", NetworkErrorKind::Timeout)
            .page("https://x.test/contact.php", 200, FORM_PAGE),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::ContactFormPrioritySearch);
    assert_eq!(r.contact_url.unwrap().path(), "/contact.php");
    assert_eq!(fx.requests_after(ROOT).len(), 3);
}

#[tokio::test]
async fn bot_block_status_aborts_pattern_search() {
    let (d, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/contact/", 404, "")
            .page("https://x.test/contact", 403, "Forbidden"),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::BotBlocked);
    assert_eq!(fx.requests_after(ROOT).len(), 2);
}

#[tokio::test]
async fn navigation_link_to_google_form() {
    let fixture = FixtureFetcher::new()
        .page(
            ROOT,
            200,
            &homepage_with_nav(r#"<a href="/">Home</a><a href="/inquiry-jp">お問い合わせ</a>"#),
        )
        .page("https://x.test/inquiry-jp", 200, &inquiry_google_form_page());
    let (d, _fx) = discoverer(fixture);

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::HomepageNavigationGoogleForms);
    assert!(r.search_method.as_str().starts_with("homepage_navigation_google_forms"));
    assert_eq!(
        r.contact_url.as_ref().map(|u| u.as_str()),
        Some("https://x.test/inquiry-jp")
    );
    assert_eq!(
        r.actual_form_url.as_ref().map(|u| u.as_str()),
        Some("https://docs.google.com/forms/d/e/1FAIpQLSf_abc123/viewform")
    );
}

#[tokio::test]
async fn same_fixtures_same_result() {
    let build = || {
        FixtureFetcher::new()
            .page(ROOT, 200, &homepage_with_nav(r#"<a href="/inquiry-jp">お問い合わせ</a>"#))
            .page("https://x.test/inquiry-jp", 200, &inquiry_google_form_page())
    };
    let (d1, fx1) = discoverer(build());
    let (d2, fx2) = discoverer(build());

    let a = d1.discover(ROOT).await;
    let b = d2.discover(ROOT).await;

    assert_eq!(a, b);
    assert_eq!(fx1.requests(), fx2.requests());
}

#[tokio::test]
async fn liveness_timeout_is_reported() {
    let (d, fx) = discoverer(FixtureFetcher::new().fail(ROOT, NetworkErrorKind::Timeout));

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::TimeoutError);
    assert!(r.contact_url.is_none());
    assert!(r.actual_form_url.is_none());
    assert_eq!(fx.requests().len(), 1);
}

#[tokio::test]
async fn liveness_connection_failure_means_site_closed() {
    let (d, _fx) = discoverer(FixtureFetcher::new().fail(ROOT, NetworkErrorKind::Connection));
    assert_eq!(d.discover(ROOT).await.search_method, SearchMethod::SiteClosed);
}

#[tokio::test]
async fn liveness_checks_the_bare_domain() {
    let (d, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/jp/contact/", 200, FORM_PAGE),
    );

    let r = d.discover("x.test/jp/").await;

    assert_eq!(r.search_method, SearchMethod::ContactFormPrioritySearch);
    assert_eq!(fx.requests()[0], ROOT);
    assert_eq!(fx.requests()[1], "https://x.test/jp/contact/");
}

#[tokio::test]
async fn social_media_and_invalid_input_make_no_requests() {
    let (d, fx) = discoverer(FixtureFetcher::new());

    assert_eq!(
        d.discover("https://www.facebook.com/acme").await.search_method,
        SearchMethod::SnsNotSupported
    );
    assert_eq!(d.discover("not a url at all").await.search_method, SearchMethod::InvalidUrl);
    assert_eq!(d.discover("ftp://x.test/").await.search_method, SearchMethod::InvalidUrl);
    assert!(fx.requests().is_empty());
}

#[tokio::test]
async fn fallback_prefers_contact_over_other_valid_pages() {
    let (d, _fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/form", 200, &plain_page("Forms and documents"))
            .page("https://x.test/contact", 200, &plain_page("Contact")),
    );

    let report = d.discover_report(ROOT).await;

    assert_eq!(report.result.search_method, SearchMethod::FinalFallbackHighConfidence);
    assert_eq!(report.result.contact_url.unwrap().path(), "/contact");
    assert_eq!(report.valid_urls.len(), 2);
    assert_eq!(report.candidates.len(), 2);
    assert_eq!(report.stage, Some("fallback"));
}

#[tokio::test]
async fn form_response_link_is_never_the_form() {
    let page = r#"<html><body><h1>お問い合わせ</h1>
        <p>送信が完了しました。</p>
        <a href="https://docs.google.com/forms/d/e/1FAIpQLSf_abc123/formResponse">回答を確認</a>
        </body></html>"#;
    let (d, _fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/contact/", 200, page),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::FinalFallbackHighConfidence);
    let actual = r.actual_form_url.unwrap();
    assert!(!actual.as_str().contains("formResponse"));
    assert_eq!(actual.as_str(), "https://x.test/contact/");
}

#[tokio::test]
async fn nothing_anywhere_is_not_found() {
    let (d, _fx) = discoverer(FixtureFetcher::new().page(ROOT, 200, &plain_page("Home")));
    let r = d.discover(ROOT).await;
    assert_eq!(r.search_method, SearchMethod::NotFound);
    assert!(r.contact_url.is_none());
}

#[tokio::test]
async fn spa_shell_is_resolved_by_anchor_section() {
    let shell = r##"<html><body><div id="app">
        <nav><a href="#top">Top</a><a href="#contact">Contact</a></nav>
        <section id="top"><h1>Acme</h1></section>
        <section id="contact"><h2>Contact</h2><p>Mail: info@x.test</p></section>
        </div></body></html>"##;
    let (d, fx) = discoverer(FixtureFetcher::new().default_page(200, shell));

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::SpaAnchorAnalysis);
    assert_eq!(
        r.contact_url.as_ref().map(|u| u.as_str()),
        Some("https://x.test/#contact")
    );
    assert!(r.found_keywords.contains(&"email".to_string()));
    // /contact is the same page as /contact/; /contact.php is the second distinct one
    assert_eq!(fx.requests_after(ROOT).len(), 3);
}

#[tokio::test]
async fn trailing_slash_variant_is_not_a_spa_shell() {
    let (d, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/contact/", 200, RECAPTCHA_PAGE)
            .page("https://x.test/contact", 200, RECAPTCHA_PAGE),
    );

    let report = d.discover_report(ROOT).await;

    assert_ne!(report.result.search_method, SearchMethod::SpaAnchorAnalysis);
    assert_eq!(report.result.search_method, SearchMethod::FinalFallbackHighConfidence);
    assert_eq!(
        report.result.contact_url.as_ref().map(|u| u.as_str()),
        Some("https://x.test/contact/")
    );
    assert_eq!(report.candidates.len(), 1);
    // every pattern is still requested
    assert!(fx.requests().contains(&"https://x.test/contact.php".to_string()));
}

#[tokio::test]
async fn redirect_to_an_earlier_page_is_not_a_spa_shell() {
    let (d, _fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/contact/", 200, RECAPTCHA_PAGE)
            .redirect("https://x.test/contact", "https://x.test/contact/")
            .redirect("https://x.test/contact.php", "https://x.test/contact/"),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::FinalFallbackHighConfidence);
    assert_eq!(r.contact_url.unwrap().as_str(), "https://x.test/contact/");
}

#[tokio::test]
async fn strong_navigation_keyword_is_accepted_without_form() {
    let (d, _fx) = discoverer(
        FixtureFetcher::new()
            .page(
                ROOT,
                200,
                &homepage_with_nav(r#"<a href="/contact-form.html">お問い合わせ</a>"#),
            )
            .page("https://x.test/contact-form.html", 200, &plain_page("Please call us")),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::HomepageNavigationKeywordBased);
    assert_eq!(r.contact_url.unwrap().path(), "/contact-form.html");
    assert!(r.actual_form_url.is_none());
}

#[tokio::test]
async fn navigation_link_with_contact_form() {
    let form = r#"<html><body><form action="/send" method="post">
        <input name="your-name"><input name="your-email"><textarea name="message"></textarea>
        <button type="submit">送信</button></form></body></html>"#;
    let (d, _fx) = discoverer(
        FixtureFetcher::new()
            .page(
                ROOT,
                200,
                &homepage_with_nav(r#"<a href="/support/toiawase">お問い合わせ</a>"#),
            )
            .page("https://x.test/support/toiawase", 200, form),
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::HomepageNavigationForm);
    assert_eq!(r.actual_form_url.unwrap().path(), "/support/toiawase");
}

#[tokio::test]
async fn embedded_form_on_homepage_is_last_resort_before_fallback() {
    let home = r#"<html><body><main><p>Welcome to our company website.</p>
        <script src="//js.hsforms.net/forms/v2.js"></script></main></body></html>"#;
    let (d, _fx) = discoverer(FixtureFetcher::new().page(ROOT, 200, home));

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::HomepageEmbeddedFallback);
    assert_eq!(r.contact_url.as_ref().map(|u| u.as_str()), Some(ROOT));
    assert_eq!(r.actual_form_url.as_ref().map(|u| u.as_str()), Some(ROOT));
}

#[tokio::test]
async fn homepage_google_form_is_returned_directly() {
    let home = r#"<html><body><h2>お問い合わせ</h2>
        <a href="https://forms.gle/AbCdEf123">お問い合わせフォーム</a></body></html>"#;
    let (d, _fx) = discoverer(FixtureFetcher::new().page(ROOT, 200, home));

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::HomepageGoogleFormsDirect);
    assert_eq!(r.actual_form_url.unwrap().as_str(), "https://forms.gle/AbCdEf123");
}

#[tokio::test]
async fn homepage_google_form_needs_no_contact_wording() {
    let home = r#"<html><body><main><p>Welcome to our company website.</p>
        <a href="https://docs.google.com/forms/d/e/1FAIpQLSf_xyz789/viewform">Click here</a>
        </main></body></html>"#;
    let (d, _fx) = discoverer(FixtureFetcher::new().page(ROOT, 200, home));

    let report = d.discover_report(ROOT).await;

    assert_eq!(report.result.search_method, SearchMethod::HomepageGoogleFormsDirect);
    assert_eq!(report.stage, Some("html_analysis"));
    assert_eq!(
        report.result.actual_form_url.unwrap().as_str(),
        "https://docs.google.com/forms/d/e/1FAIpQLSf_xyz789/viewform"
    );
}

#[tokio::test]
async fn spent_budget_skips_pattern_urls() {
    let cfg = DiscoveryConfig {
        time_budget_secs: 0,
        ..test_config()
    };
    let (d, fx) = discoverer_with(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/contact/", 200, FORM_PAGE),
        cfg,
    );

    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::NotFound);
    // liveness, then the homepage read
    assert_eq!(fx.requests(), vec![ROOT.to_string(), ROOT.to_string()]);
}

#[tokio::test]
async fn homepage_timeout_is_reported() {
    let (d, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .fail("https://x.test/jp/", NetworkErrorKind::Timeout),
    );

    let report = d.discover_report("https://x.test/jp/").await;

    assert_eq!(report.result.search_method, SearchMethod::TimeoutError);
    assert_eq!(report.stage, Some("html_analysis"));
    assert!(report.result.contact_url.is_none());
    assert_eq!(fx.requests().last().map(String::as_str), Some("https://x.test/jp/"));
}

#[tokio::test]
async fn homepage_bot_block_is_reported() {
    for status in [403u16, 501] {
        let (d, _fx) = discoverer(
            FixtureFetcher::new()
                .page(ROOT, 200, &plain_page("Home"))
                .page("https://x.test/jp/", status, "Forbidden"),
        );

        let report = d.discover_report("https://x.test/jp/").await;

        assert_eq!(report.result.search_method, SearchMethod::BotBlocked, "status {status}");
        assert_eq!(report.stage, Some("html_analysis"));
    }
}

#[tokio::test]
async fn request_delay_follows_the_run_config() {
    let (base, fx) = discoverer(
        FixtureFetcher::new()
            .page(ROOT, 200, &plain_page("Home"))
            .page("https://x.test/contact/", 200, FORM_PAGE),
    );
    let d = base.with_config(DiscoveryConfig {
        request_delay_ms: 40,
        ..test_config()
    });

    let t0 = Instant::now();
    let r = d.discover(ROOT).await;

    assert_eq!(r.search_method, SearchMethod::ContactFormPrioritySearch);
    assert_eq!(fx.requests().len(), 2);
    assert!(t0.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn batch_keeps_input_order() {
    let fixture = FixtureFetcher::new()
        .page(ROOT, 200, &plain_page("Home"))
        .page("https://x.test/contact/", 200, FORM_PAGE)
        .fail("https://dead.test/", NetworkErrorKind::Dns)
        .page("https://empty.test/", 200, &plain_page("Empty"));
    let (d, _fx) = discoverer(fixture);

    let entries = vec![
        BatchEntry::new("2", "https://dead.test/"),
        BatchEntry::new("3", ROOT),
        BatchEntry::new("5", "https://empty.test/"),
    ];
    let cfg = BatchConfig {
        batch_size: 2,
        rate_limit_delay_ms: 0,
    };

    let summary = run_batch(&d, entries, &cfg).await;

    let ids: Vec<_> = summary.outcomes.iter().map(|o| o.row_id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3", "5"]);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.outcomes[0].search_method, SearchMethod::DnsError);
    assert_eq!(summary.outcomes[1].form_url.as_deref(), Some("https://x.test/contact/"));
    assert_eq!(summary.outcomes[2].search_method, SearchMethod::NotFound);
    assert!(summary.outcomes[2].error_message.is_some());
}
