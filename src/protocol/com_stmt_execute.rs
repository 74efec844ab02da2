use byteorder::LittleEndian;

use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode, TypeId};
use crate::value::BindValue;

bitflags::bitflags! {
    // https://dev.mysql.com/doc/dev/mysql-server/8.0.12/mysql__com_8h.html#a3e5e9e744ff6f7b989a604fd669977da
    pub(crate) struct Cursor: u8 {
        const NO_CURSOR = 0;
        const READ_ONLY = 1;
        const FOR_UPDATE = 2;
        const SCROLLABLE = 4;
    }
}

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_com_stmt_execute.html
//
// Per this crate's parameter model (see crate::value::BindValue), every
// non-null parameter is sent as MYSQL_TYPE_VAR_STRING; the client never
// uses typed binary parameter encoding.
#[derive(Debug)]
pub(crate) struct ComStmtExecute<'a> {
    pub(crate) statement_id: u32,
    pub(crate) cursor: Cursor,
    pub(crate) params: &'a [BindValue],
}

impl Encode for ComStmtExecute<'_> {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_STMT_EXECUTE : int<1>
        buf.put_u8(0x17);

        // statement_id : int<4>
        buf.put_u32::<LittleEndian>(self.statement_id);

        // cursor flags : int<1>
        buf.put_u8(self.cursor.bits());

        // iteration-count (always 1) : int<4>
        buf.put_u32::<LittleEndian>(1);

        if !self.params.is_empty() {
            // NULL-bitmap : byte<(param_count + 7)/8>
            let bitmap_len = (self.params.len() + 7) / 8;
            let mut bitmap = vec![0u8; bitmap_len];
            for (i, p) in self.params.iter().enumerate() {
                if matches!(p, BindValue::Null) {
                    bitmap[i / 8] |= 1 << (i % 8);
                }
            }
            buf.put_bytes(&bitmap);

            // new-params-bound flag : int<1>
            buf.put_u8(1);

            for p in self.params {
                let (type_id, unsigned) = match p {
                    BindValue::Null => (TypeId::NULL, 0),
                    _ => (TypeId::VAR_CHAR, 0),
                };

                buf.put_u8(type_id.0);
                buf.put_u8(unsigned);
            }

            for p in self.params {
                if let Some(text) = p.wire_text() {
                    buf.put_str_lenenc(text);
                }
            }
        }
    }
}
