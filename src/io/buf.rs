use byteorder::ByteOrder;
use memchr::memchr;

use crate::error::{protocol_err, Error};

/// Extends `&[u8]` with cursor-style little-endian get operations over the
/// wire formats this crate needs, advancing the slice as bytes are consumed.
pub(crate) trait Buf<'a> {
    fn advance(&mut self, cnt: usize);

    fn get_u8(&mut self) -> Result<u8, Error>;
    fn get_i8(&mut self) -> Result<i8, Error>;

    fn get_u16<T: ByteOrder>(&mut self) -> Result<u16, Error>;
    fn get_i16<T: ByteOrder>(&mut self) -> Result<i16, Error>;

    fn get_u24<T: ByteOrder>(&mut self) -> Result<u32, Error>;

    fn get_u32<T: ByteOrder>(&mut self) -> Result<u32, Error>;
    fn get_i32<T: ByteOrder>(&mut self) -> Result<i32, Error>;

    fn get_u64<T: ByteOrder>(&mut self) -> Result<u64, Error>;
    fn get_i64<T: ByteOrder>(&mut self) -> Result<i64, Error>;

    fn get_f32<T: ByteOrder>(&mut self) -> Result<f32, Error>;
    fn get_f64<T: ByteOrder>(&mut self) -> Result<f64, Error>;

    fn get_uint<T: ByteOrder>(&mut self, bytes: usize) -> Result<u64, Error>;

    /// Consume a NUL-terminated UTF-8 string, including the NUL.
    fn get_str_nul(&mut self) -> Result<&'a str, Error>;

    /// Consume the remainder of the buffer as a UTF-8 string.
    fn get_str_eof(&mut self) -> Result<&'a str, Error>;

    /// Consume exactly `len` bytes.
    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], Error>;
}

fn eof() -> Error {
    protocol_err!("unexpected eof while decoding packet")
}

impl<'a> Buf<'a> for &'a [u8] {
    fn advance(&mut self, cnt: usize) {
        *self = &self[cnt..];
    }

    fn get_u8(&mut self) -> Result<u8, Error> {
        let val = *self.first().ok_or_else(eof)?;
        self.advance(1);
        Ok(val)
    }

    fn get_i8(&mut self) -> Result<i8, Error> {
        Ok(self.get_u8()? as i8)
    }

    fn get_u16<T: ByteOrder>(&mut self) -> Result<u16, Error> {
        if self.len() < 2 {
            return Err(eof());
        }
        let val = T::read_u16(self);
        self.advance(2);
        Ok(val)
    }

    fn get_i16<T: ByteOrder>(&mut self) -> Result<i16, Error> {
        Ok(self.get_u16::<T>()? as i16)
    }

    fn get_u24<T: ByteOrder>(&mut self) -> Result<u32, Error> {
        self.get_uint::<T>(3).map(|v| v as u32)
    }

    fn get_u32<T: ByteOrder>(&mut self) -> Result<u32, Error> {
        if self.len() < 4 {
            return Err(eof());
        }
        let val = T::read_u32(self);
        self.advance(4);
        Ok(val)
    }

    fn get_i32<T: ByteOrder>(&mut self) -> Result<i32, Error> {
        Ok(self.get_u32::<T>()? as i32)
    }

    fn get_u64<T: ByteOrder>(&mut self) -> Result<u64, Error> {
        if self.len() < 8 {
            return Err(eof());
        }
        let val = T::read_u64(self);
        self.advance(8);
        Ok(val)
    }

    fn get_i64<T: ByteOrder>(&mut self) -> Result<i64, Error> {
        Ok(self.get_u64::<T>()? as i64)
    }

    fn get_f32<T: ByteOrder>(&mut self) -> Result<f32, Error> {
        if self.len() < 4 {
            return Err(eof());
        }
        let val = T::read_f32(self);
        self.advance(4);
        Ok(val)
    }

    fn get_f64<T: ByteOrder>(&mut self) -> Result<f64, Error> {
        if self.len() < 8 {
            return Err(eof());
        }
        let val = T::read_f64(self);
        self.advance(8);
        Ok(val)
    }

    fn get_uint<T: ByteOrder>(&mut self, bytes: usize) -> Result<u64, Error> {
        if self.len() < bytes {
            return Err(eof());
        }
        let val = T::read_uint(self, bytes);
        self.advance(bytes);
        Ok(val)
    }

    fn get_str_nul(&mut self) -> Result<&'a str, Error> {
        let nul = memchr(b'\0', self).ok_or_else(eof)?;
        let s = std::str::from_utf8(&self[..nul])
            .map_err(|_| protocol_err!("malformed utf-8 in nul-terminated string"))?;
        self.advance(nul + 1);
        Ok(s)
    }

    fn get_str_eof(&mut self) -> Result<&'a str, Error> {
        let s = std::str::from_utf8(self)
            .map_err(|_| protocol_err!("malformed utf-8 in eof-terminated string"))?;
        self.advance(self.len());
        Ok(s)
    }

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if self.len() < len {
            return Err(eof());
        }
        let (head, tail) = self.split_at(len);
        *self = tail;
        Ok(head)
    }
}
