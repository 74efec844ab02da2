use byteorder::LittleEndian;

use crate::error::{protocol_err, Error};
use crate::io::buf::Buf;

/// MySQL-specific extensions to [`Buf`]: length-encoded integers, strings,
/// and byte blobs, per the wire format in the length-encoded-int table.
pub(crate) trait BufExt<'a> {
    /// Decode a length-encoded integer. Returns `None` for the SQL NULL
    /// marker (`0xFB`), which only appears in this position within text
    /// protocol result rows.
    fn get_uint_lenenc(&mut self) -> Result<Option<u64>, Error>;

    fn get_str_lenenc(&mut self) -> Result<Option<&'a str>, Error>;

    fn get_bytes_lenenc(&mut self) -> Result<Option<&'a [u8]>, Error>;
}

impl<'a> BufExt<'a> for &'a [u8] {
    fn get_uint_lenenc(&mut self) -> Result<Option<u64>, Error> {
        let header = self.get_u8()?;

        Ok(match header {
            0xFB => None,
            0xFC => Some(self.get_u16::<LittleEndian>()? as u64),
            0xFD => Some(self.get_u24::<LittleEndian>()? as u64),
            0xFE => Some(self.get_u64::<LittleEndian>()?),
            0xFF => {
                return Err(protocol_err!(
                    "unexpected length-encoded integer marker 0xFF"
                ))
            }
            _ => Some(header as u64),
        })
    }

    fn get_str_lenenc(&mut self) -> Result<Option<&'a str>, Error> {
        match self.get_bytes_lenenc()? {
            Some(bytes) => {
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| protocol_err!("malformed utf-8 in length-encoded string"))?;
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    fn get_bytes_lenenc(&mut self) -> Result<Option<&'a [u8]>, Error> {
        match self.get_uint_lenenc()? {
            Some(len) => Ok(Some(self.get_bytes(len as usize)?)),
            None => Ok(None),
        }
    }
}
