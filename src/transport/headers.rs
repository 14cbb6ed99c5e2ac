//! RFC 8288 `Link` headers and `Retry-After` parsing.
use jiff::{Span, Timestamp};

/// One relation parsed out of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRelation {
    pub target: String,
    pub rel: String,
}

/// Parse every `Link` header present (a response may repeat the
/// header, and a single header may list multiple comma-separated
/// links) into `(target, rel)` pairs.
pub fn parse_link_header(values: &[&str]) -> Vec<LinkRelation> {
    values
        .iter()
        .flat_map(|v| split_link_header_value(v))
        .collect()
}

fn split_link_header_value(value: &str) -> Vec<LinkRelation> {
    let mut out = Vec::new();
    for entry in split_top_level_commas(value) {
        let entry = entry.trim();
        let Some((target, params)) = entry.split_once(';') else {
            continue;
        };
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        for param in params.split(';') {
            let param = param.trim();
            if let Some(rel) = param.strip_prefix("rel=") {
                let rel = rel.trim_matches('"');
                out.push(LinkRelation {
                    target: target.to_string(),
                    rel: rel.to_string(),
                });
            }
        }
    }
    out
}

/// Split on commas that aren't inside a `<...>` URI-reference (a
/// target URL can't itself contain a comma that confuses this, but a
/// `Link` header value can list several `<url>; rel="..."` entries
/// separated by top-level commas).
fn split_top_level_commas(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in value.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                out.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&value[start..]);
    out
}

/// Find the first link matching `rel`.
pub fn find_link<'a>(links: &'a [LinkRelation], rel: &str) -> Option<&'a str> {
    links
        .iter()
        .find(|l| l.rel == rel)
        .map(|l| l.target.as_str())
}

/// Parse a `Retry-After` header value (RFC 9110 §10.2.3): either
/// delta-seconds or an IMF-fixdate HTTP-date, resolved against `now`.
pub fn parse_retry_after(value: &str, now: Timestamp) -> Option<Timestamp> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return now.checked_add(Span::new().seconds(seconds)).ok();
    }
    parse_http_date(value)
}

/// Parse the IMF-fixdate form of an HTTP-date, e.g.
/// `Sun, 06 Nov 1994 08:49:37 GMT` (RFC 9110 §5.6.7). The two other
/// legacy HTTP-date forms are not produced by any server this engine
/// targets and are not accepted.
fn parse_http_date(value: &str) -> Option<Timestamp> {
    let rest = value.split_once(", ").map(|(_, r)| r).unwrap_or(value);
    let mut parts = rest.split_whitespace();
    let day: i8 = parts.next()?.parse().ok()?;
    let month = month_number(parts.next()?)?;
    let year: i16 = parts.next()?.parse().ok()?;
    let time = parts.next()?;
    let mut time_parts = time.split(':');
    let hour: i8 = time_parts.next()?.parse().ok()?;
    let minute: i8 = time_parts.next()?.parse().ok()?;
    let second: i8 = time_parts.next()?.parse().ok()?;
    jiff::civil::DateTime::new(year, month, day, hour, minute, second, 0)
        .ok()?
        .to_zoned(jiff::tz::TimeZone::UTC)
        .ok()
        .map(|z| z.timestamp())
}

fn month_number(name: &str) -> Option<i8> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as i8 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_link_header_single_relation() {
        let links = parse_link_header(&[r#"<https://ca.example/tos>; rel="termsOfService""#]);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "https://ca.example/tos");
        assert_eq!(links[0].rel, "termsOfService");
    }

    #[test]
    fn parse_link_header_multiple_comma_separated() {
        let links = parse_link_header(&[
            r#"<https://ca.example/tos>; rel="termsOfService", <https://ca.example/help>; rel="help""#,
        ]);
        assert_eq!(links.len(), 2);
        assert_eq!(find_link(&links, "help"), Some("https://ca.example/help"));
    }

    #[test]
    fn parse_retry_after_delta_seconds() {
        let now: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        let result = parse_retry_after("120", now).unwrap();
        assert_eq!(result, now.checked_add(Span::new().seconds(120)).unwrap());
    }

    #[test]
    fn parse_retry_after_http_date() {
        let now: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        let result = parse_retry_after("Sun, 06 Nov 1994 08:49:37 GMT", now).unwrap();
        let expected: Timestamp = "1994-11-06T08:49:37Z".parse().unwrap();
        assert_eq!(result, expected);
    }
}
