//! Log-page transport: the [`BlockSource`] capability and the paged region
//! reader for the telemetry data log.
//!
//! A telemetry log is addressed as a sequence of 512-byte pages (128 dwords
//! each). The decoder never sees the underlying command plumbing; it only
//! asks a [`BlockSource`] for one page at a time. [`FileImageSource`] adapts
//! captured raw dumps (page N at byte offset 512*N) to the same interface.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::error::{Result, TelemetryError};
use crate::headers::DataHeader;
use crate::status::InternalStatus;

/// One ATA log page, in bytes.
pub const SECTOR_SIZE: usize = 512;

/// One ATA log page, in dwords.
pub const PAGE_DWORDS: u64 = 128;

/// GP log address of the Current Device Internal Status log.
pub const LOG_CURRENT_INTERNAL_STATUS: u8 = 0x24;

/// GP log address of the Saved Device Internal Status log.
pub const LOG_SAVED_INTERNAL_STATUS: u8 = 0x25;

/// Capability to fetch a single 512-byte log page.
///
/// Maps to one ATA Read Log Ext command; `page_feature` is the FEATURES
/// field and is always 0 for the internal status logs. Implementations
/// decide nothing about retries; a failed read surfaces as
/// [`TelemetryError::Io`] and aborts the current log.
pub trait BlockSource {
    fn read_log(
        &mut self,
        log_address: u8,
        page_feature: u8,
        page_index: u16,
        out: &mut [u8; SECTOR_SIZE],
    ) -> Result<()>;
}

/// Convert a computed page number to the 16-bit wire field.
fn page_number(page_idx: u64) -> Result<u16> {
    u16::try_from(page_idx).map_err(|_| {
        TelemetryError::HeaderInconsistent(format!(
            "log page index {page_idx} exceeds ATA page addressing"
        ))
    })
}

/// Read page `page_idx` of `log_address` into a fresh buffer.
pub fn read_page<S: BlockSource + ?Sized>(
    source: &mut S,
    log_address: u8,
    page_idx: u64,
) -> Result<[u8; SECTOR_SIZE]> {
    let mut page = [0u8; SECTOR_SIZE];
    source.read_log(log_address, 0, page_number(page_idx)?, &mut page)?;
    Ok(page)
}

/// Copy a `(start_dword, size_dword)` window of the telemetry payload into
/// `dest`, issuing one page read at a time.
///
/// Start offsets are relative to byte 0 of log page 1 (where the data header
/// lives), so the page holding the first dword is `start / 128 + 1` and the
/// in-page offset is `start % 128`. `dest` must be exactly `size_dword * 4`
/// bytes.
pub fn read_region<S: BlockSource + ?Sized>(
    source: &mut S,
    log_address: u8,
    start_dword: u64,
    size_dword: u64,
    dest: &mut [u8],
) -> Result<()> {
    debug_assert_eq!(dest.len() as u64, size_dword * 4);

    let mut page_idx = start_dword / PAGE_DWORDS + 1;
    let mut page_offset = start_dword % PAGE_DWORDS;
    let mut dwords_to_read = size_dword;
    let mut out = 0usize;

    while dwords_to_read > 0 {
        let dwords_in_page = dwords_to_read.min(PAGE_DWORDS - page_offset);
        let page = read_page(source, log_address, page_idx)?;

        let src = (page_offset * 4) as usize;
        let len = (dwords_in_page * 4) as usize;
        dest[out..out + len].copy_from_slice(&page[src..src + len]);

        out += len;
        dwords_to_read -= dwords_in_page;
        page_idx += 1;
        page_offset = 0;
    }

    Ok(())
}

/// Everything read from log 0x24: page 0, the data header, and the four
/// payload regions concatenated in declared order. Region offsets within
/// `payload` are accumulated sizes, never the header's start fields.
#[derive(Debug)]
pub struct DataState {
    pub internal_status: InternalStatus,
    pub header: DataHeader,
    pub payload: Vec<u8>,
}

/// Read and decode the telemetry data log (0x24): internal status, data
/// header, then every non-empty region into one owned buffer.
pub fn read_data_state<S: BlockSource + ?Sized>(source: &mut S, nsectors: u32) -> Result<DataState> {
    let page0 = read_page(source, LOG_CURRENT_INTERNAL_STATUS, 0)?;
    let internal_status = InternalStatus::parse(&page0);
    if !internal_status.has_telemetry() {
        return Err(TelemetryError::EmptyLog);
    }

    // Area 1 starts at log page 1 with the data header at byte 0.
    let page1 = read_page(source, LOG_CURRENT_INTERNAL_STATUS, 1)?;
    let header = DataHeader::parse(&page1);
    header.validate(nsectors)?;

    let total_bytes = usize::try_from(header.payload_dwords() * 4).map_err(|_| {
        TelemetryError::HeaderInconsistent("payload size exceeds the address space".into())
    })?;
    let mut payload = Vec::new();
    payload
        .try_reserve_exact(total_bytes)
        .map_err(|_| TelemetryError::OutOfMemory)?;
    payload.resize(total_bytes, 0);

    let mut off = 0usize;
    for region in header.regions() {
        if region.is_empty() {
            continue;
        }
        let len = region.size_bytes();
        read_region(
            source,
            LOG_CURRENT_INTERNAL_STATUS,
            region.start_dword,
            region.size_dword,
            &mut payload[off..off + len],
        )?;
        off += len;
    }

    Ok(DataState {
        internal_status,
        header,
        payload,
    })
}

/// [`BlockSource`] over raw page dumps loaded from files, one image per log
/// address. Page N of a log is the 512-byte slice at offset 512*N of its
/// image, matching how capture tools concatenate Read Log Ext output.
#[derive(Default)]
pub struct FileImageSource {
    images: HashMap<u8, Vec<u8>>,
}

impl FileImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the page image for `log_address` from `path`.
    pub fn load(&mut self, log_address: u8, path: &Path) -> Result<()> {
        let image = std::fs::read(path)?;
        if image.is_empty() || image.len() % SECTOR_SIZE != 0 {
            return Err(TelemetryError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}: image length {} is not a positive multiple of {} bytes",
                    path.display(),
                    image.len(),
                    SECTOR_SIZE
                ),
            )));
        }
        self.images.insert(log_address, image);
        Ok(())
    }

    /// Number of whole pages available for `log_address`.
    pub fn nsectors(&self, log_address: u8) -> u32 {
        self.images
            .get(&log_address)
            .map(|image| (image.len() / SECTOR_SIZE) as u32)
            .unwrap_or(0)
    }
}

impl BlockSource for FileImageSource {
    fn read_log(
        &mut self,
        log_address: u8,
        _page_feature: u8,
        page_index: u16,
        out: &mut [u8; SECTOR_SIZE],
    ) -> Result<()> {
        let image = self.images.get(&log_address).ok_or_else(|| {
            TelemetryError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no image loaded for log 0x{log_address:02x}"),
            ))
        })?;
        let start = page_index as usize * SECTOR_SIZE;
        let page = image.get(start..start + SECTOR_SIZE).ok_or_else(|| {
            TelemetryError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "log 0x{log_address:02x} page {page_index} is beyond the captured image"
                ),
            ))
        })?;
        out.copy_from_slice(page);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source whose page N is filled with dwords numbered from N * 128.
    struct NumberedPages;

    impl BlockSource for NumberedPages {
        fn read_log(
            &mut self,
            _log_address: u8,
            _page_feature: u8,
            page_index: u16,
            out: &mut [u8; SECTOR_SIZE],
        ) -> Result<()> {
            for i in 0..PAGE_DWORDS as usize {
                let dword = (page_index as u32) * PAGE_DWORDS as u32 + i as u32;
                out[i * 4..i * 4 + 4].copy_from_slice(&dword.to_le_bytes());
            }
            Ok(())
        }
    }

    fn dword_at(buf: &[u8], idx: usize) -> u32 {
        u32::from_le_bytes([buf[idx * 4], buf[idx * 4 + 1], buf[idx * 4 + 2], buf[idx * 4 + 3]])
    }

    #[test]
    fn test_read_region_page_aligned() {
        let mut dest = vec![0u8; 128 * 4];
        read_region(&mut NumberedPages, 0x24, 0, 128, &mut dest).unwrap();
        // start_dword 0 lives on page 1
        assert_eq!(dword_at(&dest, 0), 128);
        assert_eq!(dword_at(&dest, 127), 255);
    }

    #[test]
    fn test_read_region_unaligned_start_uses_containing_page() {
        // dword 130 sits on page 2 at in-page offset 2
        let mut dest = vec![0u8; 4 * 4];
        read_region(&mut NumberedPages, 0x24, 130, 4, &mut dest).unwrap();
        assert_eq!(dword_at(&dest, 0), 2 * 128 + 2);
        assert_eq!(dword_at(&dest, 3), 2 * 128 + 5);
    }

    #[test]
    fn test_read_region_spans_page_boundary() {
        // 10 dwords starting at dword 124: 4 from page 1, 6 from page 2
        let mut dest = vec![0u8; 10 * 4];
        read_region(&mut NumberedPages, 0x24, 124, 10, &mut dest).unwrap();
        assert_eq!(dword_at(&dest, 0), 128 + 124);
        assert_eq!(dword_at(&dest, 3), 128 + 127);
        assert_eq!(dword_at(&dest, 4), 256);
        assert_eq!(dword_at(&dest, 9), 261);
    }

    #[test]
    fn test_page_number_overflow_is_header_error() {
        let err = page_number(0x1_0000).unwrap_err();
        assert!(matches!(err, TelemetryError::HeaderInconsistent(_)));
    }
}
