use crate::io::BufMut;
use crate::protocol::{Capabilities, Encode};

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_com_init_db.html
#[derive(Debug)]
pub(crate) struct ComInitDb<'a> {
    pub(crate) schema: &'a str,
}

impl Encode for ComInitDb<'_> {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        // COM_INIT_DB : int<1>
        buf.put_u8(0x02);

        // schema name : string<EOF>
        buf.put_bytes(self.schema.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_command_byte_and_schema() {
        let mut buf = Vec::new();
        ComInitDb { schema: "app" }.encode(&mut buf, Capabilities::empty());
        assert_eq!(buf, b"\x02app");
    }
}
