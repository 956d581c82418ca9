use crate::core::utils::{
    encode_bytea, format_shortest, format_time, format_timestamp, format_utc_offset,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use uuid::Uuid;

/// A single column value as read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    /// `real`, kept single precision so it prints with its own shortest digits.
    Float4(f32),
    Float(f64),
    /// Arbitrary precision decimal, kept as its exact text form.
    Numeric(String),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// Instant already shifted into the session time zone.
    TimestampTz(DateTime<FixedOffset>),
    Uuid(Uuid),
    Bytes(Vec<u8>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Canonical text for a CSV field. `Null` becomes the empty string.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Int(v) => v.to_string(),
            Cell::Float4(v) => format_float(*v),
            Cell::Float(v) => format_float(*v),
            Cell::Numeric(v) => v.clone(),
            Cell::Text(v) => v.clone(),
            Cell::Date(v) => v.format("%Y-%m-%d").to_string(),
            Cell::Time(v) => format_time(v),
            Cell::Timestamp(v) => format_timestamp(v),
            Cell::TimestampTz(v) => format!(
                "{}{}",
                format_timestamp(&v.naive_local()),
                format_utc_offset(v.offset().local_minus_utc())
            ),
            Cell::Uuid(v) => v.hyphenated().to_string(),
            Cell::Bytes(v) => encode_bytea(v),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_field())
    }
}

fn format_float<F: ryu::Float + Into<f64> + Copy>(v: F) -> String {
    let wide: f64 = v.into();
    if wide.is_nan() {
        "nan".to_string()
    } else if wide.is_infinite() {
        let sign = if wide > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else {
        format_shortest(ryu::Buffer::new().format_finite(v))
    }
}
