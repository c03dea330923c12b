//! Login history CSV export

use std::borrow::Cow;
use std::fmt::Write;

use crate::domain::model::LoginRecord;

const HEADER: &str = "id,ip,device,domain,origin,referer,status,timestamp";

/// Render login records as CSV, header row first
pub fn logins_csv(records: &[LoginRecord]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + records.len() * 96);
    out.push_str(HEADER);
    out.push('\n');

    for record in records {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            record.id,
            field(record.ip.as_deref()),
            field(record.device.as_deref()),
            field(record.domain.as_deref()),
            field(record.origin.as_deref()),
            field(record.referer.as_deref()),
            record.status,
            record.timestamp.to_rfc3339(),
        );
    }
    out
}

/// Quote a field when it contains a delimiter, quote or line break
fn field(value: Option<&str>) -> Cow<'_, str> {
    let value = value.unwrap_or_default();
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
