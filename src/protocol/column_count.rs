use crate::error::Error;
use crate::io::BufExt;

#[derive(Debug)]
pub(crate) struct ColumnCount {
    pub(crate) columns: u64,
}

impl ColumnCount {
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let columns = buf.get_uint_lenenc()?.unwrap_or(0);

        Ok(Self { columns })
    }
}
