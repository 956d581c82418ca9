use chrono::{NaiveDateTime, NaiveTime, Timelike};
use std::fmt::Write;

/// Encodes bytes the way PostgreSQL prints `bytea` in hex output mode.
pub fn encode_bytea(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + 2 * bytes.len());
    out.push_str("\\x");
    for b in bytes {
        // writing into a String cannot fail
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// `HH:MM:SS`, with `.ffffff` only when there is a fractional part.
pub fn format_time(time: &NaiveTime) -> String {
    if time.nanosecond() == 0 {
        time.format("%H:%M:%S").to_string()
    } else {
        time.format("%H:%M:%S%.6f").to_string()
    }
}

/// `YYYY-MM-DD HH:MM:SS`, with `.ffffff` only when there is a fractional part.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    format!("{} {}", ts.date().format("%Y-%m-%d"), format_time(&ts.time()))
}

/// Lays out a shortest round-trip float literal (as produced by `ryu`) in the
/// form Python's `repr` uses: positional for decimal exponents in `-4..16`,
/// otherwise `d.ddde+XX` with a signed exponent of at least two digits.
pub fn format_shortest(literal: &str) -> String {
    let (sign, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", literal),
    };
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    // value == 0.<digits> * 10^point
    let mut digits = format!("{int_part}{frac_part}");
    let mut point = int_part.len() as i32 + exponent;
    let leading = digits.len() - digits.trim_start_matches('0').len();
    digits.drain(..leading);
    point -= leading as i32;
    digits.truncate(digits.trim_end_matches('0').len());

    if digits.is_empty() {
        return format!("{sign}0.0");
    }

    let len = digits.len() as i32;
    let body = if (-3..=16).contains(&point) {
        if point <= 0 {
            format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
        } else if point < len {
            let (whole, frac) = digits.split_at(point as usize);
            format!("{whole}.{frac}")
        } else {
            format!("{digits}{}.0", "0".repeat((point - len) as usize))
        }
    } else {
        let exp = point - 1;
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exp < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{head}e{exp_sign}{:02}", exp.unsigned_abs())
        } else {
            format!("{head}.{tail}e{exp_sign}{:02}", exp.unsigned_abs())
        }
    };
    format!("{sign}{body}")
}

/// `+HH:MM` for an offset east of UTC in seconds, `:SS` appended when present.
pub fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, total % 3600 / 60, total % 60);
    if secs == 0 {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{secs:02}")
    }
}
