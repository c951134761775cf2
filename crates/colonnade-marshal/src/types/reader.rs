//! Bounds-checked cursor over encoded bytes.

use crate::error::{MarshalError, MarshalResult};

/// Reads length-prefixed encodings without panicking on short input.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    type_name: &'static str,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8], type_name: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            type_name,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn read_u8(&mut self) -> MarshalResult<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub(crate) fn read_u16(&mut self) -> MarshalResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> MarshalResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(MarshalError::Truncated {
                type_name: self.type_name.to_string(),
                expected: len,
                actual: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..self.pos])
    }

    /// Reads a `[u16 length][bytes]` field.
    pub(crate) fn read_short_bytes(&mut self) -> MarshalResult<&'a [u8]> {
        let len = self.read_u16()? as usize;
        self.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_order() {
        let data = [0x00, 0x02, b'h', b'i', 0x07];
        let mut reader = Reader::new(&data, "Test");
        assert_eq!(reader.read_short_bytes().unwrap(), b"hi");
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_short_input_is_truncated() {
        let data = [0x00, 0x05, b'h'];
        let mut reader = Reader::new(&data, "Test");
        let err = reader.read_short_bytes().unwrap_err();
        assert_eq!(
            err,
            MarshalError::Truncated {
                type_name: "Test".to_string(),
                expected: 5,
                actual: 1,
            }
        );
    }
}
