//! Vocabularies and pattern tables shared by the detectors and strategies.
//! One table per concern; matching code lowercases its input first.

/// Stage A probe paths, in priority order.
pub const PRIORITY_PATTERNS: &[&str] = &[
    "/contact/",
    "/contact",
    "/contact.php",
    "/inquiry/",
    "/inquiry",
    "/inquiry.php",
    "/form",
    "/form/",
    "/form.php",
    "/contact-us/",
    "/contact-us",
    // お問い合わせ
    "/%E3%81%8A%E5%95%8F%E3%81%84%E5%90%88%E3%82%8F%E3%81%9B/",
    // お問合せ
    "/%E3%81%8A%E5%95%8F%E5%90%88%E3%81%9B/",
];

/// Fallback selection order over recorded valid URLs.
pub const FALLBACK_PATTERNS: &[&str] =
    &["/contact/", "/contact", "/inquiry/", "/inquiry", "/form/", "/form"];

/// Localized "contact" path segments (matched on the decoded path).
pub const LOCALIZED_CONTACT_SEGMENTS: &[&str] = &["お問い合わせ", "お問合せ", "問い合わせ", "問合せ", "toiawase"];

// ---- purity scoring -------------------------------------------------------

/// Strong contact intent. No entry is a substring of another.
pub const HIGH_PRIORITY_TERMS: &[&str] = &[
    "問い合わせ",
    "問合せ",
    "問合わせ",
    "ご相談",
    "contact",
    "inquiry",
    "enquiry",
    "toiawase",
];

/// Generic form vocabulary.
pub const MEDIUM_PRIORITY_TERMS: &[&str] = &["form", "フォーム", "submit", "send", "送信"];

/// Links carrying these are never contact links.
pub const EXCLUSION_TERMS: &[&str] = &[
    "download",
    "ダウンロード",
    "recruit",
    "採用",
    "求人",
    "career",
    "キャリア",
];

/// Structural path bonus, first match only. Matched against the decoded
/// path with a trailing slash appended.
pub const CONTACT_PATH_SEGMENTS: &[&str] = &[
    "/contact/",
    "/inquiry/",
    "/contact-us/",
    "/toiawase/",
    "/お問い合わせ/",
    "/お問合せ/",
];

pub const SERVICE_PATH_SEGMENT: &str = "/service/";
pub const GENERIC_PATH_SEGMENTS: &[&str] = &["/about/", "/company/", "/info/"];

// ---- form detection -------------------------------------------------------

/// Contact field vocabulary, grouped by concept. A form matches a group when
/// any `name`/`id` attribute contains one of its terms.
pub const CONTACT_FIELD_GROUPS: &[(&str, &[&str])] = &[
    ("name", &["name", "namae", "氏名", "名前", "shimei"]),
    ("email", &["email", "e-mail", "mail", "メール"]),
    ("phone", &["phone", "tel", "電話"]),
    ("message", &["message", "inquiry", "comment", "body", "content", "内容", "問い合わせ", "naiyou"]),
    ("company", &["company", "organization", "kaisha", "会社", "法人"]),
    ("subject", &["subject", "title", "件名"]),
];

pub const CAPTCHA_FINGERPRINTS: &[&str] = &[
    "google.com/recaptcha",
    "recaptcha/api.js",
    "g-recaptcha",
    "grecaptcha",
    "data-sitekey",
    "hcaptcha.com",
    "h-captcha",
    "cf-turnstile",
    "challenges.cloudflare.com/turnstile",
    "i'm not a robot",
    "私はロボットではありません",
    "ロボットではありません",
];

/// Embedded form SaaS providers.
pub const EMBEDDED_FORM_PROVIDERS: &[&str] = &[
    "js.hsforms.net",
    "hsforms.com",
    "hbspt.forms",
    "form.run",
    "formrun",
    "typeform.com",
    "jotform",
    "formstack.com",
    "wufoo.com",
    "cognitoforms.com",
    "formzu",
    "tayori.com",
    "form-mailer.jp",
    "formmailer",
    "mktoforms",
    "pardot.com",
    "forms.office.com",
    "zohopublic",
    "paperform.co",
    "tally.so",
];

/// Google Forms near these is a recruiting/survey/event form.
pub const GOOGLE_FORM_EXCLUSION_TERMS: &[&str] = &[
    "採用",
    "求人",
    "応募",
    "エントリー",
    "recruit",
    "career",
    "job",
    "アンケート",
    "survey",
    "questionnaire",
    "newsletter",
    "メルマガ",
    "メールマガジン",
    "セミナー",
    "seminar",
    "webinar",
    "イベント",
    "event",
    "説明会",
];

pub const GOOGLE_FORM_CONTACT_TERMS: &[&str] = &[
    "問い合わせ",
    "問合せ",
    "ご相談",
    "ご連絡",
    "contact",
    "inquiry",
    "enquiry",
];

// ---- page checks ----------------------------------------------------------

pub const INVALID_PAGE_MARKERS: &[&str] = &[
    "under construction",
    "page not found",
    "404 not found",
    "工事中",
    "ページが見つかりません",
    "お探しのページは見つかりません",
];

pub const SOCIAL_MEDIA_DOMAINS: &[&str] = &[
    "facebook.com",
    "fb.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "linkedin.com",
    "youtube.com",
    "youtu.be",
    "tiktok.com",
    "line.me",
    "lin.ee",
    "pinterest.com",
    "threads.net",
];

/// Region selectors whose links count as navigation.
pub const NAVIGATION_REGION_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "[role=navigation]",
    "[id*=nav]",
    "[class*=nav]",
    "[id*=menu]",
    "[class*=menu]",
];

pub const FOOTER_REGION_SELECTORS: &[&str] = &["footer", "[id*=footer]", "[class*=footer]"];

pub fn contains_any(haystack: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| haystack.contains(t))
}

pub fn first_match<'a>(haystack: &str, terms: &[&'a str]) -> Option<&'a str> {
    terms.iter().copied().find(|t| haystack.contains(t))
}
