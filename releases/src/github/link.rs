use std::collections::HashMap;

/// Parses an RFC 8288 `Link` header into a map of relation type to URL.
///
/// `<https://api.github.com/x?page=2>; rel="next", <...>; rel="last"` yields
/// `{"next": "...page=2", "last": "..."}`. Segments without a URL or a `rel`
/// parameter are skipped. A segment listing several relations
/// (`rel="next last"`) is recorded under each of them.
pub fn parse(header: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();

    for part in header.split(',') {
        let mut url = None;
        let mut rels = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some((key, value)) = segment.split_once('=')
                && key.trim().eq_ignore_ascii_case("rel")
            {
                rels = Some(value.trim().trim_matches('"'));
            }
        }

        if let (Some(url), Some(rels)) = (url, rels) {
            for rel in rels.split_whitespace() {
                links.insert(rel.to_string(), url.to_string());
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_link_header() {
        let header = r#"<https://api.github.com/repositories/1/milestones?page=2>; rel="next", <https://api.github.com/repositories/1/milestones?page=5>; rel="last""#;
        let links = parse(header);
        assert_eq!(
            links.get("next").map(String::as_str),
            Some("https://api.github.com/repositories/1/milestones?page=2")
        );
        assert_eq!(
            links.get("last").map(String::as_str),
            Some("https://api.github.com/repositories/1/milestones?page=5")
        );
    }

    #[test]
    fn test_parse_without_next() {
        let header = r#"<https://example.com/a?page=1>; rel="first", <https://example.com/a?page=1>; rel="prev""#;
        let links = parse(header);
        assert!(!links.contains_key("next"));
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_parse_multiple_relations_and_unquoted() {
        let links = parse("<https://example.com/2>; rel=next; title=\"x\", <https://example.com/9>; rel=\"last end\"");
        assert_eq!(links["next"], "https://example.com/2");
        assert_eq!(links["last"], "https://example.com/9");
        assert_eq!(links["end"], "https://example.com/9");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse("").is_empty());
        assert!(parse("https://example.com; rel=\"next\"").is_empty());
        assert!(parse("<https://example.com>").is_empty());
    }
}
