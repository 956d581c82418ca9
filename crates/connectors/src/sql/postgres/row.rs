use crate::sql::{
    base::error::DbError,
    postgres::types::{PgNumeric, RawText, is_text_like},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use model::{
    core::{encoding::TextDecoding, value::Cell},
    records::row::Record,
};
use tokio_postgres::{Column, Row, types::Type};
use uuid::Uuid;

/// How a single result column is read off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDecoder {
    Bool,
    Int2,
    Int4,
    Int8,
    Oid,
    Float4,
    Float8,
    Numeric,
    Text,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Bytes,
}

impl ColumnDecoder {
    pub fn for_type(ty: &Type) -> Option<Self> {
        let decoder = match *ty {
            Type::BOOL => ColumnDecoder::Bool,
            Type::INT2 => ColumnDecoder::Int2,
            Type::INT4 => ColumnDecoder::Int4,
            Type::INT8 => ColumnDecoder::Int8,
            Type::OID => ColumnDecoder::Oid,
            Type::FLOAT4 => ColumnDecoder::Float4,
            Type::FLOAT8 => ColumnDecoder::Float8,
            Type::NUMERIC => ColumnDecoder::Numeric,
            Type::DATE => ColumnDecoder::Date,
            Type::TIME => ColumnDecoder::Time,
            Type::TIMESTAMP => ColumnDecoder::Timestamp,
            Type::TIMESTAMPTZ => ColumnDecoder::TimestampTz,
            Type::UUID => ColumnDecoder::Uuid,
            Type::BYTEA => ColumnDecoder::Bytes,
            _ if is_text_like(ty) => ColumnDecoder::Text,
            _ => return None,
        };
        Some(decoder)
    }

    fn decode(
        &self,
        row: &Row,
        idx: usize,
        column: &str,
        session: &SessionFormat,
    ) -> Result<Cell, DbError> {
        let cell = match self {
            ColumnDecoder::Bool => row.try_get::<_, Option<bool>>(idx)?.map(Cell::Bool),
            ColumnDecoder::Int2 => row
                .try_get::<_, Option<i16>>(idx)?
                .map(|v| Cell::Int(v as i64)),
            ColumnDecoder::Int4 => row
                .try_get::<_, Option<i32>>(idx)?
                .map(|v| Cell::Int(v as i64)),
            ColumnDecoder::Int8 => row.try_get::<_, Option<i64>>(idx)?.map(Cell::Int),
            ColumnDecoder::Oid => row
                .try_get::<_, Option<u32>>(idx)?
                .map(|v| Cell::Int(v as i64)),
            ColumnDecoder::Float4 => row
                .try_get::<_, Option<f32>>(idx)?
                .map(Cell::Float4),
            ColumnDecoder::Float8 => row.try_get::<_, Option<f64>>(idx)?.map(Cell::Float),
            ColumnDecoder::Numeric => row
                .try_get::<_, Option<PgNumeric>>(idx)?
                .map(|v| Cell::Numeric(v.0)),
            ColumnDecoder::Text => match row.try_get::<_, Option<RawText>>(idx)? {
                Some(raw) => {
                    let text = session.decoding.decode(raw.0).map_err(|source| DbError::Utf8 {
                        column: column.to_string(),
                        source,
                    })?;
                    Some(Cell::Text(text))
                }
                None => None,
            },
            ColumnDecoder::Date => row.try_get::<_, Option<NaiveDate>>(idx)?.map(Cell::Date),
            ColumnDecoder::Time => row.try_get::<_, Option<NaiveTime>>(idx)?.map(Cell::Time),
            ColumnDecoder::Timestamp => row
                .try_get::<_, Option<NaiveDateTime>>(idx)?
                .map(Cell::Timestamp),
            ColumnDecoder::TimestampTz => row
                .try_get::<_, Option<DateTime<Utc>>>(idx)?
                .map(|v| Cell::TimestampTz(v.with_timezone(&session.time_zone).fixed_offset())),
            ColumnDecoder::Uuid => row.try_get::<_, Option<Uuid>>(idx)?.map(Cell::Uuid),
            ColumnDecoder::Bytes => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Cell::Bytes),
        };
        Ok(cell.unwrap_or(Cell::Null))
    }
}

/// Session settings that shape how values are turned into text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionFormat {
    pub decoding: TextDecoding,
    /// Zone `timestamptz` values are shown in, read from the session `TimeZone`.
    pub time_zone: Tz,
}

impl SessionFormat {
    pub fn new(decoding: TextDecoding, time_zone: Tz) -> Self {
        SessionFormat {
            decoding,
            time_zone,
        }
    }
}

/// Column decoders for a statement, resolved once before any row is fetched.
#[derive(Debug, Clone)]
pub struct RowDecoder {
    columns: Vec<(String, ColumnDecoder)>,
    session: SessionFormat,
}

impl RowDecoder {
    pub fn new(columns: &[Column], session: SessionFormat) -> Result<Self, DbError> {
        let columns = columns
            .iter()
            .map(|col| {
                ColumnDecoder::for_type(col.type_())
                    .map(|decoder| (col.name().to_string(), decoder))
                    .ok_or_else(|| DbError::UnsupportedType {
                        column: col.name().to_string(),
                        type_name: col.type_().name().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RowDecoder { columns, session })
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn decode(&self, row: &Row) -> Result<Record, DbError> {
        let cells = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, (name, decoder))| decoder.decode(row, idx, name, &self.session))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Record::new(cells))
    }
}
