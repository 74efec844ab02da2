//! Binary-protocol column value decoding (spec §4.4) and the parameter
//! bind-value model used by prepared-statement execution and the
//! `:name` substitutor (spec §4.5, Design Notes' "dynamic parameter
//! dispatch").

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{protocol_err, Error, ErrorKind};
use crate::protocol::TypeId;

/// A parameter value as bound to a prepared statement or substituted into
/// a textual query. Every non-null value is ultimately sent to the server
/// as UTF-8 text (this crate never does typed binary parameter encoding,
/// see DESIGN.md); the variant is kept beyond `Null`/`Text` only so the
/// `:name` substitutor (spec §4.5) knows which values render bare
/// (`numeric`, `boolean`) versus which get single-quoted.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Number(String),
    Bool(bool),
    Text(String),
}

impl BindValue {
    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }

    /// The UTF-8 text this value is sent as on the wire (spec §4.2's
    /// `StmtExecute` "length-encoded string of its UTF-8 text").
    pub(crate) fn wire_text(&self) -> Option<&str> {
        match self {
            BindValue::Null => None,
            BindValue::Number(s) => Some(s),
            BindValue::Bool(b) => Some(if *b { "1" } else { "0" }),
            BindValue::Text(s) => Some(s),
        }
    }
}

/// Anything that can be bound as a query parameter. Implemented for the
/// common scalar types; mirrors the teacher's per-type `Encode`
/// implementations but collapsed to a single textual representation.
pub trait ToSqlText {
    fn to_sql_text(&self) -> BindValue;
}

impl ToSqlText for BindValue {
    fn to_sql_text(&self) -> BindValue {
        self.clone()
    }
}

impl<T: ToSqlText> ToSqlText for Option<T> {
    fn to_sql_text(&self) -> BindValue {
        match self {
            Some(v) => v.to_sql_text(),
            None => BindValue::Null,
        }
    }
}

macro_rules! impl_to_sql_text_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSqlText for $ty {
                fn to_sql_text(&self) -> BindValue {
                    BindValue::Number(self.to_string())
                }
            }
        )*
    };
}

impl_to_sql_text_numeric!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ToSqlText for bool {
    fn to_sql_text(&self) -> BindValue {
        BindValue::Bool(*self)
    }
}

impl ToSqlText for str {
    fn to_sql_text(&self) -> BindValue {
        BindValue::Text(self.to_owned())
    }
}

impl ToSqlText for String {
    fn to_sql_text(&self) -> BindValue {
        BindValue::Text(self.clone())
    }
}

/// A MySQL `TIME` value. Kept as distinct fields *and* rendered to the
/// canonical `[-]HH:MM:SS.µs` text via `Display`, per the open-question
/// decision recorded in SPEC_FULL.md §11.1 ("preserve or decompose - flag
/// both").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MySqlTime {
    pub is_negative: bool,
    pub days: u32,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub microseconds: u32,
}

impl std::fmt::Display for MySqlTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total_hours = self.days as u64 * 24 + self.hours as u64;
        if self.is_negative {
            write!(f, "-")?;
        }
        write!(f, "{:02}:{:02}:{:02}", total_hours, self.minutes, self.seconds)?;
        if self.microseconds != 0 {
            write!(f, ".{:06}", self.microseconds)?;
        }
        Ok(())
    }
}

/// A MySQL `DATE`/`DATETIME`/`TIMESTAMP` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MySqlDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
}

impl std::fmt::Display for MySqlDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.microsecond != 0 {
            write!(f, ".{:06}", self.microsecond)?;
        }
        Ok(())
    }
}

pub(crate) fn decode_date_time(bytes: &[u8]) -> Result<MySqlDateTime, Error> {
    // bytes[0] is the field-length byte (0, 4, 7, or 11); the remaining
    // bytes are the fields present at that length.
    let len = bytes[0] as usize;
    let mut v = MySqlDateTime::default();

    if len >= 4 {
        v.year = LittleEndian::read_u16(&bytes[1..3]);
        v.month = bytes[3];
        v.day = bytes[4];
    }
    if len >= 7 {
        v.hour = bytes[5];
        v.minute = bytes[6];
        v.second = bytes[7];
    }
    if len >= 11 {
        v.microsecond = LittleEndian::read_u32(&bytes[8..12]);
    }

    Ok(v)
}

fn decode_time(bytes: &[u8]) -> Result<MySqlTime, Error> {
    let len = bytes[0] as usize;
    let mut v = MySqlTime::default();

    if len >= 8 {
        v.is_negative = bytes[1] != 0;
        v.days = LittleEndian::read_u32(&bytes[2..6]);
        v.hours = bytes[6];
        v.minutes = bytes[7];
        v.seconds = bytes[8];
    }
    if len >= 12 {
        v.microseconds = LittleEndian::read_u32(&bytes[9..13]);
    }

    Ok(v)
}

/// Decode a binary-protocol column value (the byte span `Row::get` returns
/// for a non-null column) into its canonical textual form, per the table
/// in spec §4.4.
pub(crate) fn binary_value_to_text(bytes: &[u8], type_id: TypeId) -> Result<String, Error> {
    let mut int_buf = itoa::Buffer::new();

    let text = match type_id {
        TypeId::TINY_INT => int_buf.format(bytes[0] as i8).to_owned(),
        TypeId::SMALL_INT => int_buf.format(LittleEndian::read_i16(bytes)).to_owned(),
        TypeId::YEAR => int_buf.format(LittleEndian::read_u16(bytes)).to_owned(),
        TypeId::INT | TypeId::INT24 => int_buf.format(LittleEndian::read_i32(bytes)).to_owned(),
        TypeId::BIG_INT => int_buf.format(LittleEndian::read_i64(bytes)).to_owned(),
        TypeId::FLOAT => LittleEndian::read_f32(bytes).to_string(),
        TypeId::DOUBLE => LittleEndian::read_f64(bytes).to_string(),
        TypeId::DATE | TypeId::DATETIME | TypeId::TIMESTAMP => {
            decode_date_time(bytes)?.to_string()
        }
        TypeId::TIME => decode_time(bytes)?.to_string(),
        _ => std::str::from_utf8(bytes)
            .map_err(|_| {
                Error::client(
                    ErrorKind::UnexpectedPayload,
                    "column value is not valid utf-8 text",
                )
            })?
            .to_owned(),
    };

    Ok(text)
}

/// Parse canonical text produced above (or received directly from a text
/// protocol result) as a boolean. Strict: only `TINY(1)`-shaped values
/// (`"0"`/`"1"`) are accepted, matching spec §4.4's "bool only from
/// TINY(1)" rule for typed accessors.
pub(crate) fn text_to_bool(text: &str) -> Result<bool, Error> {
    match text {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(protocol_err!("value {:?} is not a valid boolean", text)),
    }
}

pub(crate) fn text_to_i64(text: &str) -> Result<i64, Error> {
    atoi::atoi::<i64>(text.as_bytes())
        .ok_or_else(|| protocol_err!("value {:?} is not a valid integer", text))
}

pub(crate) fn text_to_f64(text: &str) -> Result<f64, Error> {
    text.parse()
        .map_err(|_| protocol_err!("value {:?} is not a valid float", text).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tiny_int() {
        assert_eq!(
            binary_value_to_text(&[0xFE], TypeId::TINY_INT).unwrap(),
            "-2"
        );
    }

    #[test]
    fn decodes_float_roundtrip() {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, 3.5);
        assert_eq!(binary_value_to_text(&buf, TypeId::FLOAT).unwrap(), "3.5");
    }

    #[test]
    fn decodes_zero_length_date_as_zero() {
        let text = decode_date_time(&[0]).unwrap().to_string();
        assert_eq!(text, "0000-00-00 00:00:00");
    }

    #[test]
    fn decodes_full_datetime() {
        let mut bytes = vec![11u8];
        bytes.extend_from_slice(&2024u16.to_le_bytes());
        bytes.push(3); // month
        bytes.push(4); // day
        bytes.push(5); // hour
        bytes.push(6); // minute
        bytes.push(7); // second
        bytes.extend_from_slice(&8u32.to_le_bytes()); // microsecond
        let text = decode_date_time(&bytes).unwrap().to_string();
        assert_eq!(text, "2024-03-04 05:06:07.000008");
    }

    #[test]
    fn time_formats_days_into_hours() {
        let t = MySqlTime {
            is_negative: false,
            days: 1,
            hours: 2,
            minutes: 3,
            seconds: 4,
            microseconds: 0,
        };
        assert_eq!(t.to_string(), "26:03:04");
    }

    #[test]
    fn bool_accessor_is_strict() {
        assert!(text_to_bool("0").unwrap() == false);
        assert!(text_to_bool("1").unwrap() == true);
        assert!(text_to_bool("2").is_err());
    }
}
