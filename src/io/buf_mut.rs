use byteorder::ByteOrder;

/// Extends `Vec<u8>` with little-endian put operations mirroring [`super::buf::Buf`].
pub(crate) trait BufMut {
    fn put_u8(&mut self, v: u8);
    fn put_i8(&mut self, v: i8);

    fn put_u16<T: ByteOrder>(&mut self, v: u16);
    fn put_i16<T: ByteOrder>(&mut self, v: i16);

    fn put_u24<T: ByteOrder>(&mut self, v: u32);

    fn put_u32<T: ByteOrder>(&mut self, v: u32);
    fn put_i32<T: ByteOrder>(&mut self, v: i32);

    fn put_u64<T: ByteOrder>(&mut self, v: u64);
    fn put_i64<T: ByteOrder>(&mut self, v: i64);

    fn put_f32<T: ByteOrder>(&mut self, v: f32);
    fn put_f64<T: ByteOrder>(&mut self, v: f64);

    fn put_bytes(&mut self, v: &[u8]);

    /// Write a string followed by a single NUL byte.
    fn put_str_nul(&mut self, s: &str);

    /// Write a MySQL length-encoded string: var-int length then bytes.
    fn put_str_lenenc(&mut self, s: &str);

    /// Write a MySQL length-encoded integer.
    fn put_uint_lenenc(&mut self, v: u64);
}

impl BufMut for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }

    fn put_i8(&mut self, v: i8) {
        self.push(v as u8);
    }

    fn put_u16<T: ByteOrder>(&mut self, v: u16) {
        let mut buf = [0u8; 2];
        T::write_u16(&mut buf, v);
        self.extend_from_slice(&buf);
    }

    fn put_i16<T: ByteOrder>(&mut self, v: i16) {
        self.put_u16::<T>(v as u16);
    }

    fn put_u24<T: ByteOrder>(&mut self, v: u32) {
        let mut buf = [0u8; 4];
        T::write_u32(&mut buf, v);
        // Little-endian u24 is simply the low 3 bytes of the u32 encoding.
        self.extend_from_slice(&buf[..3]);
    }

    fn put_u32<T: ByteOrder>(&mut self, v: u32) {
        let mut buf = [0u8; 4];
        T::write_u32(&mut buf, v);
        self.extend_from_slice(&buf);
    }

    fn put_i32<T: ByteOrder>(&mut self, v: i32) {
        self.put_u32::<T>(v as u32);
    }

    fn put_u64<T: ByteOrder>(&mut self, v: u64) {
        let mut buf = [0u8; 8];
        T::write_u64(&mut buf, v);
        self.extend_from_slice(&buf);
    }

    fn put_i64<T: ByteOrder>(&mut self, v: i64) {
        self.put_u64::<T>(v as u64);
    }

    fn put_f32<T: ByteOrder>(&mut self, v: f32) {
        let mut buf = [0u8; 4];
        T::write_f32(&mut buf, v);
        self.extend_from_slice(&buf);
    }

    fn put_f64<T: ByteOrder>(&mut self, v: f64) {
        let mut buf = [0u8; 8];
        T::write_f64(&mut buf, v);
        self.extend_from_slice(&buf);
    }

    fn put_bytes(&mut self, v: &[u8]) {
        self.extend_from_slice(v);
    }

    fn put_str_nul(&mut self, s: &str) {
        self.extend_from_slice(s.as_bytes());
        self.push(0);
    }

    fn put_str_lenenc(&mut self, s: &str) {
        self.put_uint_lenenc(s.len() as u64);
        self.extend_from_slice(s.as_bytes());
    }

    fn put_uint_lenenc(&mut self, v: u64) {
        use byteorder::LittleEndian;

        if v < 251 {
            self.put_u8(v as u8);
        } else if v <= 0xFFFF {
            self.put_u8(0xFC);
            self.put_u16::<LittleEndian>(v as u16);
        } else if v <= 0xFF_FFFF {
            self.put_u8(0xFD);
            self.put_u24::<LittleEndian>(v as u32);
        } else {
            self.put_u8(0xFE);
            self.put_u64::<LittleEndian>(v);
        }
    }
}
