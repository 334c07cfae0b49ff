//! ATA Device Internal Status log page 0 (the first page of GP logs 0x24 and
//! 0x25).
//!
//! Page 0 declares where the telemetry payload lives: three areas, each
//! described by its last log page number. Area 1 holds the telemetry header
//! plus data area 1, area 2 the second data area, area 3 vendor telemetry.
//! An `area1_last_log_page` of zero means the device has no telemetry to
//! offer and decoding stops with [`TelemetryError::EmptyLog`].
//!
//! The trailing 128 bytes carry the Reason Identifier: why the device
//! captured this snapshot, with a flag byte gating which fields are valid.

use serde::Serialize;

use crate::source::SECTOR_SIZE;

/// Reason Identifier valid_flags bits.
pub const REASON_LINE_NUMBER: u8 = 1;
pub const REASON_FILE_ID: u8 = 1 << 1;
pub const REASON_ERROR_ID: u8 = 1 << 2;
pub const REASON_VU_EXT: u8 = 1 << 3;

/// Reason Identifier block (last 128 bytes of page 0).
#[derive(Debug, Clone, Serialize)]
pub struct ReasonId {
    /// Low nibble gates the other fields (REASON_* bits).
    pub valid_flags: u8,
    /// 64-byte ASCII error identifier.
    pub error_id: Vec<u8>,
    /// 8-byte file identifier.
    pub file_id: Vec<u8>,
    pub line_number: u16,
    /// 32-byte vendor-unique reason extension.
    pub vu_reason_extension: Vec<u8>,
}

impl ReasonId {
    pub fn has(&self, flag: u8) -> bool {
        self.valid_flags & flag != 0
    }

    fn parse(raw: &[u8]) -> Self {
        Self {
            valid_flags: raw[74],
            error_id: raw[0..64].to_vec(),
            file_id: raw[64..72].to_vec(),
            line_number: u16::from_le_bytes([raw[72], raw[73]]),
            vu_reason_extension: raw[96..128].to_vec(),
        }
    }
}

/// Decoded Device Internal Status page.
#[derive(Debug, Clone, Serialize)]
pub struct InternalStatus {
    pub log_address: u8,
    pub organization_id: u32,
    pub area1_last_log_page: u16,
    pub area2_last_log_page: u16,
    pub area3_last_log_page: u16,
    pub saved_data_available: bool,
    pub saved_data_generation_number: u8,
    pub reason_id: ReasonId,
}

impl InternalStatus {
    /// Decode page 0 of an internal status log.
    pub fn parse(page: &[u8; SECTOR_SIZE]) -> Self {
        Self {
            log_address: page[0],
            organization_id: u32::from_le_bytes([page[4], page[5], page[6], page[7]]),
            area1_last_log_page: u16::from_le_bytes([page[8], page[9]]),
            area2_last_log_page: u16::from_le_bytes([page[10], page[11]]),
            area3_last_log_page: u16::from_le_bytes([page[12], page[13]]),
            saved_data_available: page[382] != 0,
            saved_data_generation_number: page[383],
            reason_id: ReasonId::parse(&page[384..512]),
        }
    }

    /// True when area 1 declares at least one telemetry page.
    pub fn has_telemetry(&self) -> bool {
        self.area1_last_log_page != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_page() -> [u8; SECTOR_SIZE] {
        let mut page = [0u8; SECTOR_SIZE];
        page[0] = 0x24;
        page[4..8].copy_from_slice(&0x0000_1b4du32.to_le_bytes());
        page[8..10].copy_from_slice(&5u16.to_le_bytes());
        page[10..12].copy_from_slice(&9u16.to_le_bytes());
        page[382] = 1;
        page[383] = 7;
        // reason id: error id + line number valid
        page[384 + 74] = REASON_ERROR_ID | REASON_LINE_NUMBER;
        page[384..384 + 4].copy_from_slice(b"ASRT");
        page[384 + 72..384 + 74].copy_from_slice(&1234u16.to_le_bytes());
        page
    }

    #[test]
    fn test_parse_internal_status() {
        let status = InternalStatus::parse(&status_page());
        assert_eq!(status.log_address, 0x24);
        assert_eq!(status.organization_id, 0x1b4d);
        assert_eq!(status.area1_last_log_page, 5);
        assert_eq!(status.area2_last_log_page, 9);
        assert_eq!(status.area3_last_log_page, 0);
        assert!(status.saved_data_available);
        assert_eq!(status.saved_data_generation_number, 7);
        assert!(status.has_telemetry());
    }

    #[test]
    fn test_reason_id_flags() {
        let status = InternalStatus::parse(&status_page());
        let reason = &status.reason_id;
        assert!(reason.has(REASON_ERROR_ID));
        assert!(reason.has(REASON_LINE_NUMBER));
        assert!(!reason.has(REASON_FILE_ID));
        assert!(!reason.has(REASON_VU_EXT));
        assert_eq!(reason.line_number, 1234);
        assert_eq!(&reason.error_id[..4], b"ASRT");
        assert_eq!(reason.error_id.len(), 64);
        assert_eq!(reason.file_id.len(), 8);
        assert_eq!(reason.vu_reason_extension.len(), 32);
    }

    #[test]
    fn test_empty_log_detection() {
        let status = InternalStatus::parse(&[0u8; SECTOR_SIZE]);
        assert!(!status.has_telemetry());
    }
}
