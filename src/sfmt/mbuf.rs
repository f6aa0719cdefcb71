use crate::tools::error::{DectError, ErrorKind, Result};

/// Maximum size of a NWK-layer message buffer.
///
/// S-format PDUs are short; the LCE fragments anything larger before it
/// reaches this layer.
pub const MBUF_SIZE: usize = 128;

///
/// NWK-layer message buffer
///
/// Holds one S-format message body (the IE stream). The message-type octet
/// is kept out-of-band in `mtype` once the transaction layer has decoded
/// the frame header.
///
#[derive(Clone)]
pub struct Mbuf {
    buf: [u8; MBUF_SIZE],
    head: usize,
    len: usize,
    /// Decoded message-type octet
    pub mtype: u8,
}

impl Mbuf {
    /// Creates an empty message buffer
    pub fn new() -> Mbuf {
        Mbuf {
            buf: [0; MBUF_SIZE],
            head: 0,
            len: 0,
            mtype: 0,
        }
    }

    /// Creates a message buffer holding a copy of `data`
    pub fn from_slice(data: &[u8]) -> Result<Mbuf> {
        let mut mb = Mbuf::new();
        mb.append(data)?;
        Ok(mb)
    }

    /// Number of bytes left in the buffer
    pub fn len(&self) -> usize {
        self.len
    }

    /// true when no bytes are left
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remaining capacity for `append`
    pub fn tailroom(&self) -> usize {
        MBUF_SIZE - self.head - self.len
    }

    /// View of the remaining bytes
    pub fn data(&self) -> &[u8] {
        &self.buf[self.head..self.head + self.len]
    }

    /// Appends one octet
    pub fn push(&mut self, octet: u8) -> Result<()> {
        self.append(&[octet])
    }

    /// Appends a byte slice at the tail
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.tailroom() {
            return Err(DectError::new(
                ErrorKind::Truncated,
                format!("mbuf overflow: {} > {}", data.len(), self.tailroom()),
            ));
        }
        let tail = self.head + self.len;
        self.buf[tail..tail + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(())
    }

    /// Removes `n` bytes from the front
    pub fn pull(&mut self, n: usize) -> Result<()> {
        if n > self.len {
            return Err(DectError::new(
                ErrorKind::Truncated,
                format!("mbuf underflow: pull {} of {}", n, self.len),
            ));
        }
        self.head += n;
        self.len -= n;
        Ok(())
    }
}

impl Default for Mbuf {
    fn default() -> Self {
        Mbuf::new()
    }
}

impl std::fmt::Debug for Mbuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mbuf {{ mtype: {:#04x}, data: {:02x?} }}", self.mtype, self.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_pull() {
        let mut mb = Mbuf::new();
        mb.append(&[1, 2, 3, 4]).unwrap();
        assert_eq!(mb.len(), 4);
        mb.pull(2).unwrap();
        assert_eq!(mb.data(), &[3, 4]);
        mb.push(5).unwrap();
        assert_eq!(mb.data(), &[3, 4, 5]);
    }

    #[test]
    fn test_pull_underflow() {
        let mut mb = Mbuf::from_slice(&[1, 2]).unwrap();
        assert!(mb.pull(3).is_err());
        assert_eq!(mb.len(), 2);
    }

    #[test]
    fn test_append_overflow() {
        let mut mb = Mbuf::new();
        let big = [0u8; MBUF_SIZE + 1];
        assert!(mb.append(&big).is_err());
        assert!(mb.is_empty());
        mb.append(&[0u8; MBUF_SIZE]).unwrap();
        assert!(mb.push(0).is_err());
    }
}
