use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{protocol_err, Error};
use crate::io::Buf;
use crate::protocol::TypeId;

/// A single result-set row, text or binary protocol. Column values are not
/// eagerly decoded; [`Row::get`] returns the raw byte span and the caller
/// (see `crate::value`) interprets it per the column's [`TypeId`].
pub(crate) struct Row {
    buffer: Box<[u8]>,
    values: Box<[Option<Range<usize>>]>,
}

impl Row {
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&[u8]> {
        let range = self.values[index].as_ref()?;
        Some(&self.buffer[range.start..range.end])
    }
}

/// Size in bytes, including its own length prefix, of the length-encoded
/// value starting at `buf[0]`.
fn lenenc_span(buf: &[u8]) -> usize {
    match buf[0] {
        0xFB => 1,
        0xFC => 1 + 2 + LittleEndian::read_u16(&buf[1..]) as usize,
        0xFD => 1 + 3 + LittleEndian::read_u24(&buf[1..]) as usize,
        0xFE => 1 + 8 + LittleEndian::read_u64(&buf[1..]) as usize,
        value => 1 + value as usize,
    }
}

impl Row {
    pub(crate) fn decode_text(buf: &[u8], num_columns: usize) -> Result<Self, Error> {
        let buffer: Box<[u8]> = buf.into();
        let mut values = Vec::with_capacity(num_columns);
        let mut index = 0;

        for _ in 0..num_columns {
            if buffer[index] == 0xFB {
                values.push(None);
                index += 1;
            } else {
                let size = lenenc_span(&buffer[index..]);
                // Skip the length prefix itself; store only the value span.
                let value_len = trailing_value_len(&buffer[index..]);
                let value_start = index + (size - value_len);
                values.push(Some(value_start..(value_start + value_len)));
                index += size;
            }
        }

        Ok(Self {
            buffer,
            values: values.into_boxed_slice(),
        })
    }

    pub(crate) fn decode_binary(mut buf: &[u8], columns: &[TypeId]) -> Result<Self, Error> {
        // 0x00 header : byte<1>
        let header = buf.get_u8()?;
        if header != 0 {
            return Err(protocol_err!("expected binary row header 0x00, got {:#04X}", header));
        }

        // NULL-bitmap : byte<(number_of_columns + 9) / 8>, bit (i+2) per column i.
        let null_len = (columns.len() + 9) / 8;
        let null_bitmap = buf.get_bytes(null_len)?;

        let buffer: Box<[u8]> = buf.into();
        let mut values = Vec::with_capacity(columns.len());
        let mut index = 0;

        for (i, type_id) in columns.iter().enumerate() {
            let bit = i + 2;
            let is_null = null_bitmap[bit / 8] & (1 << (bit % 8)) != 0;

            if is_null {
                values.push(None);
                continue;
            }

            let size = match *type_id {
                TypeId::TINY_INT => 1,
                TypeId::SMALL_INT | TypeId::YEAR => 2,
                TypeId::INT | TypeId::INT24 | TypeId::FLOAT => 4,
                TypeId::BIG_INT | TypeId::DOUBLE => 8,

                TypeId::DATE | TypeId::DATETIME | TypeId::TIMESTAMP => {
                    1 + buffer[index] as usize
                }
                TypeId::TIME => 1 + buffer[index] as usize,

                _ => lenenc_span(&buffer[index..]),
            };

            let (start, len) = match *type_id {
                TypeId::TINY_INT
                | TypeId::SMALL_INT
                | TypeId::YEAR
                | TypeId::INT
                | TypeId::INT24
                | TypeId::FLOAT
                | TypeId::BIG_INT
                | TypeId::DOUBLE
                | TypeId::DATE
                | TypeId::DATETIME
                | TypeId::TIMESTAMP
                | TypeId::TIME => (index, size),
                _ => {
                    let value_len = trailing_value_len(&buffer[index..]);
                    (index + (size - value_len), value_len)
                }
            };

            values.push(Some(start..(start + len)));
            index += size;
        }

        Ok(Self {
            buffer,
            values: values.into_boxed_slice(),
        })
    }
}

/// Length of the value payload of a length-encoded field at `buf[0]`,
/// excluding its length prefix.
fn trailing_value_len(buf: &[u8]) -> usize {
    match buf[0] {
        0xFB => 0,
        0xFC => LittleEndian::read_u16(&buf[1..]) as usize,
        0xFD => LittleEndian::read_u24(&buf[1..]) as usize,
        0xFE => LittleEndian::read_u64(&buf[1..]) as usize,
        value => value as usize,
    }
}
