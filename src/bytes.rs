//! Bounds-checked readers for the packed telemetry wire format.
//!
//! Every on-wire telemetry value is little-endian except the SAS variant of
//! the data-header timestamp, which is big-endian. All readers take a slice
//! plus an offset and return `None` when the field does not fit, so callers
//! turn short buffers into diagnostics instead of panics. Nothing in this
//! crate overlays `repr(packed)` structs onto page buffers.

/// Read a `u8` at `off`.
pub fn u8_at(buf: &[u8], off: usize) -> Option<u8> {
    buf.get(off).copied()
}

/// Read a little-endian `u16` at `off`.
pub fn le16(buf: &[u8], off: usize) -> Option<u16> {
    if buf.len() < off.checked_add(2)? {
        return None;
    }
    Some(u16::from_le_bytes([buf[off], buf[off + 1]]))
}

/// Read a little-endian `u32` at `off`.
pub fn le32(buf: &[u8], off: usize) -> Option<u32> {
    if buf.len() < off.checked_add(4)? {
        return None;
    }
    Some(u32::from_le_bytes([
        buf[off],
        buf[off + 1],
        buf[off + 2],
        buf[off + 3],
    ]))
}

/// Read a little-endian `u64` at `off`.
pub fn le64(buf: &[u8], off: usize) -> Option<u64> {
    if buf.len() < off.checked_add(8)? {
        return None;
    }
    Some(u64::from_le_bytes([
        buf[off],
        buf[off + 1],
        buf[off + 2],
        buf[off + 3],
        buf[off + 4],
        buf[off + 5],
        buf[off + 6],
        buf[off + 7],
    ]))
}

/// Read a big-endian `u16` at `off` (SAS timestamp only).
pub fn be16(buf: &[u8], off: usize) -> Option<u16> {
    if buf.len() < off.checked_add(2)? {
        return None;
    }
    Some(u16::from_be_bytes([buf[off], buf[off + 1]]))
}

/// Read a big-endian `u32` at `off` (SAS timestamp only).
pub fn be32(buf: &[u8], off: usize) -> Option<u32> {
    if buf.len() < off.checked_add(4)? {
        return None;
    }
    Some(u32::from_be_bytes([
        buf[off],
        buf[off + 1],
        buf[off + 2],
        buf[off + 3],
    ]))
}

/// Borrow `len` bytes starting at `off`.
pub fn field(buf: &[u8], off: usize, len: usize) -> Option<&[u8]> {
    buf.get(off..off.checked_add(len)?)
}

/// Decode a fixed-width ASCII field: cut at the first NUL, drop trailing
/// spaces, and replace anything non-UTF-8 the lossy way.
pub fn ascii_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut field = &raw[..end];
    while let [head @ .., b' '] = field {
        field = head;
    }
    String::from_utf8_lossy(field).into_owned()
}

/// Render bytes as a single `0xNN`-per-byte line, the form used for scalar
/// fallback values in both report streams.
pub fn hex_line(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 5);
    for (i, b) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("0x{b:02x}"));
    }
    out
}

/// Forward-only cursor over a byte slice, for walking variable-length
/// descriptor bodies.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Take exactly `n` bytes, advancing the cursor.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let out = self.buf.get(self.pos..self.pos.checked_add(n)?)?;
        self.pos += n;
        Some(out)
    }

    pub fn u8(&mut self) -> Option<u8> {
        let v = u8_at(self.buf, self.pos)?;
        self.pos += 1;
        Some(v)
    }

    pub fn le16(&mut self) -> Option<u16> {
        let v = le16(self.buf, self.pos)?;
        self.pos += 2;
        Some(v)
    }

    pub fn le32(&mut self) -> Option<u32> {
        let v = le32(self.buf, self.pos)?;
        self.pos += 4;
        Some(v)
    }

    pub fn le64(&mut self) -> Option<u64> {
        let v = le64(self.buf, self.pos)?;
        self.pos += 8;
        Some(v)
    }

    /// Skip `n` bytes of reserved space.
    pub fn skip(&mut self, n: usize) -> Option<()> {
        self.take(n).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le_readers() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(le16(&buf, 0), Some(0x0201));
        assert_eq!(le32(&buf, 2), Some(0x06050403));
        assert_eq!(le64(&buf, 0), Some(0x0807060504030201));
        assert_eq!(le16(&buf, 7), None);
        assert_eq!(le64(&buf, 1), None);
    }

    #[test]
    fn test_be_readers() {
        let buf = [0x00, 0x00, 0x00, 0x01, 0x00, 0x00];
        assert_eq!(be32(&buf, 0), Some(1));
        assert_eq!(be16(&buf, 4), Some(0));
        assert_eq!(be32(&buf, 3), None);
    }

    #[test]
    fn test_offset_overflow_is_none() {
        let buf = [0u8; 4];
        assert_eq!(le16(&buf, usize::MAX), None);
        assert_eq!(field(&buf, usize::MAX, 2), None);
    }

    #[test]
    fn test_ascii_field_trims_trailing_spaces() {
        assert_eq!(ascii_field(b"FW12345 "), "FW12345");
        assert_eq!(ascii_field(b"        "), "");
        assert_eq!(ascii_field(b"fifo\0garbage"), "fifo");
        assert_eq!(ascii_field(b"a b "), "a b");
    }

    #[test]
    fn test_hex_line() {
        assert_eq!(hex_line(&[0x12, 0x00, 0xff]), "0x12 0x00 0xff");
        assert_eq!(hex_line(&[]), "");
    }

    #[test]
    fn test_cursor_walks_and_stops() {
        let buf = [0x11, 0x22, 0x33, 0x44, 0x55];
        let mut c = Cursor::new(&buf);
        assert_eq!(c.u8(), Some(0x11));
        assert_eq!(c.le16(), Some(0x3322));
        assert_eq!(c.remaining(), 2);
        assert_eq!(c.le32(), None);
        assert_eq!(c.take(2), Some(&buf[3..5]));
        assert_eq!(c.remaining(), 0);
    }
}
