//! The subset of BCS (Binary Canonical Serialization) transactions use:
//! little-endian integers, ULEB128 lengths, length-prefixed byte strings.

#[derive(Debug, Default)]
pub struct BcsWriter {
    buf: Vec<u8>,
}

impl BcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uleb128(&mut self, mut value: u64) -> &mut Self {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return self;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn seq_len(&mut self, len: usize) -> &mut Self {
        self.uleb128(len as u64)
    }

    pub fn variant(&mut self, index: u32) -> &mut Self {
        self.uleb128(index as u64)
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Fixed-size data, no length prefix.
    pub fn fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// `Vec<u8>`: length-prefixed.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.seq_len(bytes.len()).fixed(bytes)
    }

    pub fn str(&mut self, s: &str) -> &mut Self {
        self.bytes(s.as_bytes())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uleb(value: u64) -> Vec<u8> {
        let mut w = BcsWriter::new();
        w.uleb128(value);
        w.into_bytes()
    }

    #[test]
    fn uleb128_vectors() {
        assert_eq!(uleb(0), [0x00]);
        assert_eq!(uleb(1), [0x01]);
        assert_eq!(uleb(127), [0x7f]);
        assert_eq!(uleb(128), [0x80, 0x01]);
        assert_eq!(uleb(16_384), [0x80, 0x80, 0x01]);
        assert_eq!(uleb(u32::MAX as u64), [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn strings_and_integers() {
        let mut w = BcsWriter::new();
        w.str("abc").u64(1).u8(7);
        assert_eq!(
            w.into_bytes(),
            [3, b'a', b'b', b'c', 1, 0, 0, 0, 0, 0, 0, 0, 7]
        );
    }
}
