use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Format `time` as an RFC 1123 HTTP-date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn http_date_from_system(time: SystemTime) -> String {
    http_date(DateTime::<Utc>::from(time))
}
