use anyhow::Context;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> anyhow::Result<OffsetDateTime> {
    let value = value.trim();
    if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(ts);
    }
    let date = Date::parse(value, format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid timestamp '{value}' (expected RFC 3339 or YYYY-MM-DD)"))?;
    Ok(date.midnight().assume_utc())
}
