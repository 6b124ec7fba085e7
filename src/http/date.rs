//! HTTP date handling for `Last-Modified` / `If-Modified-Since`

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::SystemTime;

/// Format as IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parse any of the three date formats HTTP/1.1 clients may send.
///
/// Dates without a zone are taken as UTC.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // RFC 850: Sunday, 06-Nov-94 08:49:37 GMT
    // asctime: Sun Nov  6 08:49:37 1994
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Whether a resource last modified at `modified` is unchanged since the
/// client's `If-Modified-Since` value. Sub-second precision is ignored.
pub fn not_modified_since(modified: SystemTime, if_modified_since: &str) -> bool {
    let Some(since) = parse_http_date(if_modified_since) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}
