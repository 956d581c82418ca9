//! Wire-level decoders for values the stock `FromSql` impls cannot give us
//! losslessly: text as raw bytes, and `numeric` as exact decimal text.

use std::error::Error;
use tokio_postgres::types::{FromSql, Kind, Type};

type BoxError = Box<dyn Error + Sync + Send>;

const JSONB_VERSION: u8 = 1;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;
const NBASE_DIGITS: usize = 4;

/// Returns true for types whose binary representation is their text bytes.
pub fn is_text_like(ty: &Type) -> bool {
    match *ty {
        Type::TEXT
        | Type::VARCHAR
        | Type::BPCHAR
        | Type::NAME
        | Type::CHAR
        | Type::UNKNOWN
        | Type::JSON
        | Type::JSONB
        | Type::XML => true,
        _ => matches!(ty.kind(), Kind::Enum(_)) || ty.name() == "citext",
    }
}

/// Undecoded bytes of a text-like column.
///
/// Bypasses the driver's UTF-8 check so data stored under `SQL_ASCII` (or
/// otherwise mislabeled) can still be read and decoded by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawText<'a>(pub &'a [u8]);

impl<'a> FromSql<'a> for RawText<'a> {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if *ty == Type::JSONB {
            return match raw.split_first() {
                Some((&JSONB_VERSION, rest)) => Ok(RawText(rest)),
                Some((version, _)) => Err(format!("unsupported jsonb version {version}").into()),
                None => Err("empty jsonb value".into()),
            };
        }
        Ok(RawText(raw))
    }

    fn accepts(ty: &Type) -> bool {
        is_text_like(ty)
    }
}

/// A `numeric` value rendered to its exact decimal text, honoring display scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgNumeric(pub String);

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        numeric_to_string(raw).map(PgNumeric)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

fn read_u16(raw: &[u8], offset: usize) -> Result<u16, BoxError> {
    raw.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "numeric value truncated".into())
}

/// Renders the binary `numeric` format: `ndigits, weight, sign, dscale`
/// followed by `ndigits` base-10000 digits, most significant first.
pub fn numeric_to_string(raw: &[u8]) -> Result<String, BoxError> {
    let ndigits = read_u16(raw, 0)? as usize;
    let weight = read_u16(raw, 2)? as i16 as i64;
    let sign = read_u16(raw, 4)?;
    let dscale = read_u16(raw, 6)? as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign 0x{other:04x}").into()),
    }

    let digits = (0..ndigits)
        .map(|i| {
            let d = read_u16(raw, 8 + 2 * i)?;
            if d >= 10_000 {
                return Err::<u16, BoxError>(format!("invalid numeric digit {d}").into());
            }
            Ok(d)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let digit_at = |i: i64| -> u16 {
        if i >= 0 && (i as usize) < digits.len() {
            digits[i as usize]
        } else {
            0
        }
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        for i in 0..=weight {
            let d = digit_at(i);
            if i == 0 {
                out.push_str(&d.to_string());
            } else {
                out.push_str(&format!("{d:04}"));
            }
        }
    }

    if dscale > 0 {
        out.push('.');
        let groups = dscale.div_ceil(NBASE_DIGITS);
        let mut fraction = String::with_capacity(groups * NBASE_DIGITS);
        for k in 1..=groups as i64 {
            fraction.push_str(&format!("{:04}", digit_at(weight + k)));
        }
        fraction.truncate(dscale);
        out.push_str(&fraction);
    }

    Ok(out)
}
