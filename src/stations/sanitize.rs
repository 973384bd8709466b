use url::Url;

/// `//host/path` becomes `https://host/path`; everything else is trimmed and
/// returned as is.
pub fn upgrade_protocol_relative(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Returns the trimmed input when it parses as an absolute http(s) URL with a
/// host. The original spelling is kept so heuristic suffixes survive.
pub fn absolute_http_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some_and(|h| !h.is_empty()) => {
            Some(trimmed.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrades_only_protocol_relative() {
        assert_eq!(
            upgrade_protocol_relative(" //cdn.example.com/x.png "),
            "https://cdn.example.com/x.png"
        );
        assert_eq!(
            upgrade_protocol_relative("http://cdn.example.com/x.png"),
            "http://cdn.example.com/x.png"
        );
        assert_eq!(upgrade_protocol_relative("/x.png"), "/x.png");
    }

    #[test]
    fn absolute_url_keeps_original_spelling() {
        assert_eq!(
            absolute_http_url("http://stream.example.com:8000/;stream.mp3").as_deref(),
            Some("http://stream.example.com:8000/;stream.mp3")
        );
        assert_eq!(
            absolute_http_url("http://stream.example.com:8000").as_deref(),
            Some("http://stream.example.com:8000")
        );
    }

    #[test]
    fn rejects_relative_and_foreign_schemes() {
        assert!(absolute_http_url("").is_none());
        assert!(absolute_http_url("/live.mp3").is_none());
        assert!(absolute_http_url("rtsp://example.com/live").is_none());
        assert!(absolute_http_url("data:text/plain,hi").is_none());
    }
}
