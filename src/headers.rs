//! The two telemetry headers: the Data Header on log 0x24 and the Strings
//! Header on log 0x25, both living at byte 0 of log page 1.
//!
//! Header layout (Data Header, 512 bytes):
//! - major/minor version, 6-byte timestamp plus protocol info word
//! - 16-byte format GUID, device string data size, firmware revision
//! - four `(start, size)` dword pairs: statistics areas 1 and 2, event
//!   FIFOs 1 and 2, all relative to byte 0 of log page 1
//!
//! Strings Header (432 bytes):
//! - log page version, 16-byte GUID
//! - four `(start, size)` dword pairs: statistic-id strings, event strings,
//!   vu-event strings, ASCII pool
//! - two 16-byte ASCII event FIFO names
//!
//! Validation guarantees that no declared region reaches past the sector
//! count reported for the log, so the paged readers can never request an
//! unreadable page.

use serde::Serialize;

use crate::bytes::ascii_field;
use crate::error::{Result, TelemetryError};
use crate::source::{PAGE_DWORDS, SECTOR_SIZE};

/// Data Header size in dwords (one full log page).
pub const DATA_HEADER_DWORDS: u64 = 128;

/// Strings Header size in bytes and dwords.
pub const STRINGS_HEADER_BYTES: usize = 432;
pub const STRINGS_HEADER_DWORDS: u64 = (STRINGS_HEADER_BYTES as u64) / 4;

pub const GUID_LEN: usize = 16;

fn le16_at(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

fn le64_at(buf: &[u8], off: usize) -> u64 {
    u64::from_le_bytes([
        buf[off],
        buf[off + 1],
        buf[off + 2],
        buf[off + 3],
        buf[off + 4],
        buf[off + 5],
        buf[off + 6],
        buf[off + 7],
    ])
}

/// A `(start, size)` span in dword units.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Region {
    pub start_dword: u64,
    pub size_dword: u64,
}

impl Region {
    fn at(buf: &[u8], off: usize) -> Self {
        Self {
            start_dword: le64_at(buf, off),
            size_dword: le64_at(buf, off + 8),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size_dword == 0
    }

    /// First dword past the region, or an error on arithmetic overflow.
    fn end_dword(&self) -> Result<u64> {
        self.start_dword.checked_add(self.size_dword).ok_or_else(|| {
            TelemetryError::HeaderInconsistent(format!(
                "region start 0x{:x} + size 0x{:x} overflows",
                self.start_dword, self.size_dword
            ))
        })
    }

    pub fn size_bytes(&self) -> usize {
        (self.size_dword * 4) as usize
    }
}

/// Format a telemetry GUID the way the log convention prints it: bytes in
/// reverse order, uppercase hex, trailing `h`.
pub fn format_guid(guid: &[u8; GUID_LEN]) -> String {
    let mut out = String::with_capacity(GUID_LEN * 2 + 1);
    for b in guid.iter().rev() {
        out.push_str(&format!("{b:02X}"));
    }
    out.push('h');
    out
}

/// Decoded Telemetry Data Header (log 0x24, page 1).
#[derive(Debug, Clone, Serialize)]
pub struct DataHeader {
    pub major_version: u16,
    pub minor_version: u16,
    pub timestamp: [u8; 6],
    pub timestamp_info: u16,
    pub guid: [u8; GUID_LEN],
    pub device_string_data_size: u16,
    /// Firmware revision, right-trimmed.
    pub firmware_version: String,
    pub statistic1: Region,
    pub statistic2: Region,
    pub event_fifo1: Region,
    pub event_fifo2: Region,
}

impl DataHeader {
    pub fn parse(page: &[u8; SECTOR_SIZE]) -> Self {
        let mut timestamp = [0u8; 6];
        timestamp.copy_from_slice(&page[8..14]);
        let mut guid = [0u8; GUID_LEN];
        guid.copy_from_slice(&page[16..32]);
        Self {
            major_version: le16_at(page, 0),
            minor_version: le16_at(page, 2),
            timestamp,
            timestamp_info: le16_at(page, 14),
            guid,
            device_string_data_size: le16_at(page, 32),
            firmware_version: ascii_field(&page[34..42]),
            statistic1: Region::at(page, 110),
            statistic2: Region::at(page, 126),
            event_fifo1: Region::at(page, 142),
            event_fifo2: Region::at(page, 158),
        }
    }

    /// The four payload regions in the order they are read and concatenated.
    pub fn regions(&self) -> [Region; 4] {
        [
            self.statistic1,
            self.statistic2,
            self.event_fifo1,
            self.event_fifo2,
        ]
    }

    /// Total payload size across the four regions, in dwords.
    pub fn payload_dwords(&self) -> u64 {
        self.regions().iter().map(|r| r.size_dword).sum()
    }

    /// Check that every declared region fits inside the log's sector count.
    pub fn validate(&self, nsectors: u32) -> Result<()> {
        let mut max_end_dword = DATA_HEADER_DWORDS;
        for region in self.regions() {
            if !region.is_empty() {
                max_end_dword = max_end_dword.max(region.end_dword()?);
            }
        }
        let required = max_end_dword.div_ceil(PAGE_DWORDS) + 1;
        if u64::from(nsectors) < required {
            return Err(TelemetryError::HeaderInconsistent(format!(
                "regions need {required} log pages but the log reports {nsectors}"
            )));
        }
        Ok(())
    }

    /// Milliseconds since 1970, decoded per the protocol field in
    /// `timestamp_info` bits 5:4. SAS (1) stores the six bytes big-endian;
    /// SATA (2) stores the low word first, then the high dword, each
    /// little-endian. Unknown protocols decode to 0 with a warning.
    pub fn timestamp_msecs(&self) -> u64 {
        let t = &self.timestamp;
        match (self.timestamp_info & 0x30) >> 4 {
            1 => {
                let high = u64::from(u32::from_be_bytes([t[0], t[1], t[2], t[3]]));
                let low = u64::from(u16::from_be_bytes([t[4], t[5]]));
                (high << 16) + low
            }
            2 => {
                let high = u64::from(u32::from_le_bytes([t[2], t[3], t[4], t[5]]));
                let low = u64::from(u16::from_le_bytes([t[0], t[1]]));
                (high << 16) + low
            }
            protocol => {
                tracing::warn!(protocol, "unknown telemetry timestamp protocol");
                0
            }
        }
    }
}

/// Decoded Telemetry Strings Header (log 0x25, page 1).
#[derive(Debug, Clone, Serialize)]
pub struct StringsHeader {
    pub log_page_version: u8,
    pub guid: [u8; GUID_LEN],
    pub stat_id_table: Region,
    pub event_table: Region,
    pub vu_event_table: Region,
    pub ascii_table: Region,
    /// Event FIFO names, right-trimmed.
    pub event_fifo1_name: String,
    pub event_fifo2_name: String,
}

impl StringsHeader {
    pub fn parse(page: &[u8; SECTOR_SIZE]) -> Self {
        let mut guid = [0u8; GUID_LEN];
        guid.copy_from_slice(&page[16..32]);
        Self {
            log_page_version: page[0],
            guid,
            stat_id_table: Region::at(page, 64),
            event_table: Region::at(page, 80),
            vu_event_table: Region::at(page, 96),
            ascii_table: Region::at(page, 112),
            event_fifo1_name: ascii_field(&page[128..144]),
            event_fifo2_name: ascii_field(&page[144..160]),
        }
    }

    /// The four table regions in their mandated on-wire order.
    pub fn tables(&self) -> [Region; 4] {
        [
            self.stat_id_table,
            self.event_table,
            self.vu_event_table,
            self.ascii_table,
        ]
    }

    /// Combined size of the four tables, in dwords.
    pub fn total_table_dwords(&self) -> u64 {
        self.tables().iter().map(|t| t.size_dword).sum()
    }

    /// Check that header plus tables fit inside the log's sector count.
    pub fn validate(&self, nsectors: u32) -> Result<()> {
        let mut end_dword = STRINGS_HEADER_DWORDS;
        for table in self.tables() {
            end_dword = end_dword.checked_add(table.size_dword).ok_or_else(|| {
                TelemetryError::HeaderInconsistent("string table sizes overflow".into())
            })?;
        }
        let required = end_dword.div_ceil(PAGE_DWORDS) + 1;
        if u64::from(nsectors) < required {
            return Err(TelemetryError::HeaderInconsistent(format!(
                "string tables need {required} log pages but the log reports {nsectors}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_header_page() -> [u8; SECTOR_SIZE] {
        let mut page = [0u8; SECTOR_SIZE];
        page[0..2].copy_from_slice(&2u16.to_le_bytes());
        page[2..4].copy_from_slice(&5u16.to_le_bytes());
        // SAS timestamp protocol, bytes 00 00 00 01 00 00 -> 65536
        page[8..14].copy_from_slice(&[0, 0, 0, 1, 0, 0]);
        page[14..16].copy_from_slice(&(1u16 << 4).to_le_bytes());
        page[34..42].copy_from_slice(b"FW1.2   ");
        // statistic area 1: start 128, size 8
        page[110..118].copy_from_slice(&128u64.to_le_bytes());
        page[118..126].copy_from_slice(&8u64.to_le_bytes());
        page
    }

    #[test]
    fn test_parse_data_header() {
        let header = DataHeader::parse(&data_header_page());
        assert_eq!(header.major_version, 2);
        assert_eq!(header.minor_version, 5);
        assert_eq!(header.firmware_version, "FW1.2");
        assert_eq!(header.statistic1.start_dword, 128);
        assert_eq!(header.statistic1.size_dword, 8);
        assert!(header.statistic2.is_empty());
        assert_eq!(header.payload_dwords(), 8);
    }

    #[test]
    fn test_sas_timestamp() {
        let header = DataHeader::parse(&data_header_page());
        assert_eq!(header.timestamp_msecs(), 65536);
    }

    #[test]
    fn test_sata_timestamp() {
        let mut page = data_header_page();
        // protocol 2: low word first, high dword after
        page[8..14].copy_from_slice(&[0x34, 0x12, 0x78, 0x56, 0x00, 0x00]);
        page[14..16].copy_from_slice(&(2u16 << 4).to_le_bytes());
        let header = DataHeader::parse(&page);
        assert_eq!(header.timestamp_msecs(), (0x5678u64 << 16) + 0x1234);
    }

    #[test]
    fn test_unknown_timestamp_protocol_is_zero() {
        let mut page = data_header_page();
        page[14..16].copy_from_slice(&(3u16 << 4).to_le_bytes());
        assert_eq!(DataHeader::parse(&page).timestamp_msecs(), 0);
    }

    #[test]
    fn test_guid_prints_byte_reversed() {
        let guid = [
            0xE3, 0xF9, 0xF6, 0x79, 0x1C, 0xD1, 0x16, 0xB6, 0x2E, 0x42, 0x33, 0x34, 0xC0, 0xF2,
            0xDA, 0xF5,
        ];
        assert_eq!(format_guid(&guid), "F5DAF2C03433422EB616D11C79F6F9E3h");
    }

    #[test]
    fn test_validate_accepts_fitting_regions() {
        let header = DataHeader::parse(&data_header_page());
        // end dword 136 -> ceil(136/128) + 1 = 3 pages
        assert!(header.validate(3).is_ok());
        assert!(header.validate(2).is_err());
    }

    #[test]
    fn test_validate_empty_header_needs_two_pages() {
        let header = DataHeader::parse(&[0u8; SECTOR_SIZE]);
        // only the header itself: ceil(128/128) + 1
        assert!(header.validate(2).is_ok());
        assert!(header.validate(1).is_err());
    }

    #[test]
    fn test_parse_strings_header() {
        let mut page = [0u8; SECTOR_SIZE];
        page[0] = 1;
        page[64..72].copy_from_slice(&108u64.to_le_bytes());
        page[72..80].copy_from_slice(&8u64.to_le_bytes());
        page[80..88].copy_from_slice(&116u64.to_le_bytes());
        page[88..96].copy_from_slice(&4u64.to_le_bytes());
        page[112..120].copy_from_slice(&120u64.to_le_bytes());
        page[120..128].copy_from_slice(&2u64.to_le_bytes());
        page[128..133].copy_from_slice(b"HOST ");
        page[144..146].copy_from_slice(b"BG");
        let header = StringsHeader::parse(&page);
        assert_eq!(header.log_page_version, 1);
        assert_eq!(header.stat_id_table.start_dword, 108);
        assert_eq!(header.stat_id_table.size_dword, 8);
        assert_eq!(header.vu_event_table.size_dword, 0);
        assert_eq!(header.event_fifo1_name, "HOST");
        assert_eq!(header.event_fifo2_name, "BG");
        assert_eq!(header.total_table_dwords(), 14);
        // 108 + 14 dwords -> ceil(122/128) + 1 = 2 pages
        assert!(header.validate(2).is_ok());
        assert!(header.validate(1).is_err());
    }
}
