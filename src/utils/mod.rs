use chrono::NaiveDate;

pub const DATE_FMT: &str = "%Y-%m-%d";

/// Lenient date parse for stored TEXT columns: accepts bare ISO dates and
/// datetime strings by reading the leading YYYY-MM-DD. Returns None instead
/// of failing so callers can skip malformed rows.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FMT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

/// Round to one decimal place, the precision surfaced in every report.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
