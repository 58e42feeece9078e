//! Detailed per-API CSV

use std::borrow::Cow;

use crate::results::ApiUsageRecord;

pub const HEADER: [&str; 13] = [
    "api_key",
    "api_key_int",
    "api_version",
    "client_version",
    "server_version",
    "request_count",
    "client_errors",
    "upstream_errors",
    "status",
    "test_name",
    "timestamp",
    "failure_type",
    "status_message",
];

pub fn render(records: &[ApiUsageRecord]) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');

    for record in records {
        let api_key_int = match record.api_key_int {
            Some(key) => key.to_string(),
            None => record.api_key.clone(),
        };
        let row = [
            escape(&record.api_key),
            escape(&api_key_int),
            escape(&record.api_version),
            escape(&record.client_version),
            escape(&record.server_version),
            Cow::Owned(record.request_count.to_string()),
            Cow::Owned(record.client_errors.to_string()),
            Cow::Owned(record.upstream_errors.to_string()),
            Cow::Borrowed(record.status.as_str()),
            escape(&record.test_name),
            escape(&record.timestamp),
            escape(record.failure_type.as_deref().unwrap_or("")),
            escape(record.status_message.as_deref().unwrap_or("")),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
