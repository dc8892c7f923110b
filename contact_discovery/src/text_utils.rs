use percent_encoding::percent_decode_str;
use url::Url;

/// Host without a leading `www.`, lowercased.
pub fn extract_domain(u: &Url) -> Option<String> {
    let host = u.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(|s| s.to_string()).unwrap_or(host))
}

/// Parses user input, adding `https://` when no scheme was given.
pub fn parse_target_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let u = Url::parse(&candidate).ok()?;
    match u.scheme() {
        "http" | "https" if u.host_str().is_some() => Some(u),
        _ => None,
    }
}

/// Resolves an href found on `base` to an absolute http(s) URL.
/// Script, mail, phone and data links are not navigable and yield `None`.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let lc = href.to_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:", "sms:"]
        .iter()
        .any(|p| lc.starts_with(p))
    {
        return None;
    }
    let u = base.join(href).ok()?;
    matches!(u.scheme(), "http" | "https").then_some(u)
}

/// `scheme://host[:port]/` of the target.
pub fn origin_root(u: &Url) -> Url {
    let mut root = u.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

/// URL without query, fragment or trailing slash. Prefix for pattern URLs,
/// and the identity of a fetched page.
pub fn url_stem(u: &Url) -> String {
    let mut b = u.clone();
    b.set_query(None);
    b.set_fragment(None);
    b.as_str().trim_end_matches('/').to_string()
}

/// Lowercased, percent-decoded path. Invalid UTF-8 escapes are replaced.
pub fn decoded_path(u: &Url) -> String {
    percent_decode_str(u.path())
        .decode_utf8_lossy()
        .to_lowercase()
}

pub fn content_hash(html: &str) -> u64 {
    xxhash_rust::xxh3::xxh3_64(html.as_bytes())
}

/// Decodes a response body as UTF-8, replacing invalid sequences.
pub fn decode_body(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// True when more than 5% of the characters are replacement characters,
/// which means the page was served in an encoding we did not decode.
pub fn looks_garbled(text: &str) -> bool {
    let mut total = 0usize;
    let mut bad = 0usize;
    for c in text.chars() {
        total += 1;
        if c == char::REPLACEMENT_CHARACTER {
            bad += 1;
        }
    }
    total > 0 && bad * 20 > total
}

/// Slice of `text` spanning `radius` characters on each side of the byte
/// offset `at`. Always cut on char boundaries.
pub fn char_window(text: &str, at: usize, radius: usize) -> &str {
    let at = at.min(text.len());
    let start = text[..at]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let start = if radius == 0 { at } else { start };
    let end = text[at..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| at + i)
        .unwrap_or(text.len());
    &text[start..end]
}

/// First `max_chars` characters of `text` starting at byte offset `from`.
pub fn char_prefix_from(text: &str, from: usize, max_chars: usize) -> &str {
    let from = from.min(text.len());
    let rest = &text[from..];
    let end = rest
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_strips_www() {
        let u = Url::parse("https://WWW.Example.co.jp/about").unwrap();
        assert_eq!(extract_domain(&u).as_deref(), Some("example.co.jp"));
    }

    #[test]
    fn target_parsing_adds_scheme() {
        assert_eq!(
            parse_target_url("example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert!(parse_target_url("ftp://example.com").is_none());
        assert!(parse_target_url("  ").is_none());
    }

    #[test]
    fn resolve_skips_non_navigable() {
        let base = Url::parse("https://a.test/dir/page.html").unwrap();
        assert_eq!(
            resolve_url(&base, "../contact/").unwrap().as_str(),
            "https://a.test/contact/"
        );
        assert_eq!(
            resolve_url(&base, "#contact").unwrap().as_str(),
            "https://a.test/dir/page.html#contact"
        );
        assert!(resolve_url(&base, "mailto:info@a.test").is_none());
        assert!(resolve_url(&base, "javascript:void(0)").is_none());
    }

    #[test]
    fn stem_and_root() {
        let u = Url::parse("https://a.test/jp/?utm=1#top").unwrap();
        assert_eq!(url_stem(&u), "https://a.test/jp");
        let slash = Url::parse("https://a.test/contact/").unwrap();
        let bare = Url::parse("https://a.test/contact").unwrap();
        assert_eq!(url_stem(&slash), url_stem(&bare));
        assert_eq!(origin_root(&u).as_str(), "https://a.test/");
    }

    #[test]
    fn decoded_path_is_lowercase_utf8() {
        let u = Url::parse("https://a.test/%E3%81%8A%E5%95%8F%E5%90%88%E3%81%9B/Form").unwrap();
        assert_eq!(decoded_path(&u), "/お問合せ/form");
    }

    #[test]
    fn hash_is_stable() {
        assert_eq!(content_hash("<html></html>"), content_hash("<html></html>"));
        assert_ne!(content_hash("<html>a</html>"), content_hash("<html>b</html>"));
    }

    #[test]
    fn garbled_detection() {
        assert!(!looks_garbled("お問い合わせフォーム"));
        let bad = decode_body(&[0x82, 0xa8, 0x96, 0xe2, 0x82, 0xa2]);
        assert!(looks_garbled(&bad));
    }

    #[test]
    fn windows_respect_char_boundaries() {
        let text = "あいうえおかきくけこ";
        let at = text.find('お').unwrap();
        assert_eq!(char_window(text, at, 2), "うえおか");
        assert_eq!(char_prefix_from(text, at, 3), "おかき");
        assert_eq!(char_window(text, 0, 1), "あ");
    }
}
