use byteorder::LittleEndian;

use crate::error::{protocol_err, Error};
use crate::io::{Buf, BufExt};
use crate::protocol::{FieldFlags, TypeId};

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_com_query_response_text_resultset_column_definition.html
// https://mariadb.com/kb/en/resultset/#column-definition-packet
#[derive(Debug, Clone)]
pub(crate) struct ColumnDefinition {
    pub(crate) schema: Option<Box<str>>,

    pub(crate) table_alias: Option<Box<str>>,
    pub(crate) table: Option<Box<str>>,

    pub(crate) column_alias: Option<Box<str>>,
    pub(crate) column: Option<Box<str>>,

    pub(crate) char_set: u16,
    pub(crate) max_size: u32,
    pub(crate) type_id: TypeId,
    pub(crate) flags: FieldFlags,
    pub(crate) decimals: u8,
}

impl ColumnDefinition {
    pub(crate) fn name(&self) -> Option<&str> {
        self.column_alias.as_deref().or(self.column.as_deref())
    }

    pub(crate) fn read(mut buf: &[u8]) -> Result<Self, Error> {
        // catalog : string<lenenc>
        let catalog = buf.get_str_lenenc()?;

        if catalog != Some("def") {
            return Err(protocol_err!(
                "expected column definition catalog \"def\"; received {:?}",
                catalog
            ));
        }

        let schema = buf.get_str_lenenc()?.map(Into::into);
        let table_alias = buf.get_str_lenenc()?.map(Into::into);
        let table = buf.get_str_lenenc()?.map(Into::into);
        let column_alias = buf.get_str_lenenc()?.map(Into::into);
        let column = buf.get_str_lenenc()?.map(Into::into);

        let len_fixed_fields = buf.get_uint_lenenc()?.unwrap_or(0);

        if len_fixed_fields != 0x0c {
            return Err(protocol_err!(
                "expected column definition fixed-fields length 0x0c; received {:?}",
                len_fixed_fields
            ));
        }

        let char_set = buf.get_u16::<LittleEndian>()?;
        let max_size = buf.get_u32::<LittleEndian>()?;

        let type_id = buf.get_u8()?;
        let flags = buf.get_u16::<LittleEndian>()?;
        let decimals = buf.get_u8()?;

        Ok(Self {
            schema,
            table,
            table_alias,
            column,
            column_alias,
            char_set,
            max_size,
            type_id: TypeId(type_id),
            flags: FieldFlags::from_bits_truncate(flags),
            decimals,
        })
    }
}
