use url::Url;

const TRACKING_PARAMS: &[&str] = &[
    "referer",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "yclid",
    "_openstat",
    "from",
    "ref",
];

const STAGE_NAMES: &[(&str, &str)] = &[
    ("/login", "Authorization"),
    ("/auth", "Authorization"),
    ("/loan/create", "Loan Application"),
    ("/loan/form", "Loan Details Form"),
    ("/mortgage", "Mortgage Calculator"),
    ("/card/order", "Card Ordering"),
    ("/profile", "User Profile"),
    ("/history", "Transaction History"),
];

/// Canonical form of a page URL so the same page matches across versions:
/// lowercase scheme and host, no trailing slash, no tracking parameters,
/// no fragment.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match Url::parse(trimmed) {
        Ok(mut parsed) if parsed.has_host() => {
            let path = trim_path(parsed.path());
            parsed.set_path(&path);

            let kept: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(key, value)| !value.is_empty() && !is_tracking(key))
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            parsed.set_query(None);
            if !kept.is_empty() {
                parsed.query_pairs_mut().extend_pairs(kept.iter());
            }
            parsed.set_fragment(None);
            parsed.to_string()
        }
        _ => normalize_relative(trimmed),
    }
}

fn normalize_relative(raw: &str) -> String {
    let without_fragment = raw.split('#').next().unwrap_or(raw);
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| match pair.split_once('=') {
            Some((key, value)) => !value.is_empty() && !is_tracking(key),
            None => false,
        })
        .collect();

    let path = trim_path(path);
    if kept.is_empty() {
        path
    } else {
        format!("{path}?{}", kept.join("&"))
    }
}

fn trim_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_tracking(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key)
}

/// Business-facing name for a page URL, falling back to its path.
pub fn readable_page_name(url: &str) -> String {
    let lower = url.trim().to_lowercase();

    if let Some((_, name)) = STAGE_NAMES.iter().find(|(pattern, _)| lower.contains(pattern)) {
        return (*name).to_string();
    }
    if lower.ends_with('/') {
        return "Home Page".to_string();
    }

    let path = match Url::parse(&lower) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => lower
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    if path.is_empty() {
        "Unknown Page".to_string()
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tracking_params_and_trailing_slash() {
        assert_eq!(
            normalize_url("HTTPS://Bank.Example.com/loan/create/?utm_source=mail&step=2&ref=x"),
            "https://bank.example.com/loan/create?step=2"
        );
    }

    #[test]
    fn keeps_root_path_and_drops_fragment() {
        assert_eq!(normalize_url("https://example.com#top"), "https://example.com/");
        assert_eq!(normalize_url("/?from=ad"), "/");
    }

    #[test]
    fn normalizes_relative_urls() {
        assert_eq!(normalize_url("/profile/?tab=cards&yclid=123"), "/profile?tab=cards");
        assert_eq!(normalize_url("  /history?empty=  "), "/history");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn same_page_matches_across_versions() {
        assert_eq!(
            normalize_url("https://example.com/card/order?utm_campaign=spring"),
            normalize_url("https://EXAMPLE.com/card/order/")
        );
    }

    #[test]
    fn maps_known_stages_to_business_names() {
        assert_eq!(readable_page_name("https://example.com/login?next=/"), "Authorization");
        assert_eq!(readable_page_name("https://example.com/Loan/Form/step1"), "Loan Details Form");
        assert_eq!(readable_page_name("https://example.com/"), "Home Page");
    }

    #[test]
    fn falls_back_to_path() {
        assert_eq!(readable_page_name("https://example.com/deposits?x=1"), "/deposits");
        assert_eq!(readable_page_name("/faq#contacts"), "/faq");
        assert_eq!(readable_page_name(""), "Unknown Page");
    }
}
