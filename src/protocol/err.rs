use byteorder::LittleEndian;

use crate::error::{protocol_err, Error, MySqlDatabaseError};
use crate::io::Buf;

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_err_packet.html
// https://mariadb.com/kb/en/err_packet/
#[derive(Debug)]
pub(crate) struct ErrPacket {
    pub(crate) error_code: u16,
    pub(crate) sql_state: Box<str>,
    pub(crate) error_message: Box<str>,
}

impl ErrPacket {
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8()?;
        if header != 0xFF {
            return Err(protocol_err!("expected ERR (0xFF); received 0x{:X}", header));
        }

        let error_code = buf.get_u16::<LittleEndian>()?;

        // sql_state_marker : string<1>
        let _sql_state_marker = buf.get_u8()?;
        let sql_state = buf.get_bytes(5)?;
        let sql_state = std::str::from_utf8(sql_state)
            .map_err(|_| protocol_err!("malformed utf-8 in sql state"))?
            .into();

        let error_message = buf.get_str_eof()?.into();

        Ok(Self {
            error_code,
            sql_state,
            error_message,
        })
    }

    pub(crate) fn into_database_error(self) -> MySqlDatabaseError {
        let mut sql_state = [0u8; 5];
        sql_state.copy_from_slice(self.sql_state.as_bytes());

        MySqlDatabaseError {
            code: self.error_code,
            sql_state: Some(sql_state),
            message: self.error_message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrPacket;

    const ERR_HANDSHAKE_UNKNOWN_DB: &[u8] = b"\xff\x19\x04#42000Unknown database \'unknown\'";

    #[test]
    fn it_decodes_err_packet() {
        let p = ErrPacket::decode(ERR_HANDSHAKE_UNKNOWN_DB).unwrap();

        assert_eq!(p.error_code, 1049);
        assert_eq!(&*p.sql_state, "42000");
        assert_eq!(&*p.error_message, "Unknown database 'unknown'");
    }
}
