//! Device-supplied string tables from the Saved Device Internal Status log
//! (GP log 0x25).
//!
//! The log carries four tables packed back to back after the 432-byte
//! Strings Header: statistic-id string entries, event string entries,
//! vu-event string entries (same 16-byte layout as event strings), and one
//! bulk ASCII pool that the entries point into with `(offset, length)`
//! pairs. Tables never overlap or leave gaps, and the first one starts at
//! dword 108, immediately after the header.
//!
//! Pages do not align to table boundaries, so [`read_string_state`] walks a
//! current dword position across pages and hands each page-sized (or
//! table-remainder-sized) window to the parser for whichever table the
//! position falls in.

use std::collections::BTreeMap;

use crate::bytes;
use crate::error::{Result, TelemetryError};
use crate::headers::{Region, StringsHeader, STRINGS_HEADER_DWORDS};
use crate::source::{read_page, BlockSource, LOG_SAVED_INTERNAL_STATUS, PAGE_DWORDS, SECTOR_SIZE};
use crate::status::InternalStatus;

/// String-table entries are 16 bytes in every table.
const ENTRY_BYTES: usize = 16;

/// A statistic-id string entry: where in the ASCII pool the name of a
/// vendor-unique statistic id lives.
#[derive(Debug, Clone, Copy)]
pub struct StatIdEntry {
    pub ascii_len: u8,
    pub ascii_offset: u64,
}

/// An event (or vu-event) string entry, keyed by class and raw id bytes.
#[derive(Debug, Clone, Copy)]
pub struct EventIdEntry {
    pub ascii_len: u8,
    pub ascii_offset: u64,
}

/// The accumulated device string state: two id-to-entry maps plus the ASCII
/// pool they reference. Entries are value copies; nothing borrows from page
/// buffers.
#[derive(Debug, Default)]
pub struct StringTables {
    pub stat_ids: BTreeMap<u16, StatIdEntry>,
    pub events: BTreeMap<u32, EventIdEntry>,
    pub ascii_pool: Vec<u8>,
}

impl StringTables {
    /// Composite key for the event string map. The id stays in raw byte
    /// order: `(class << 16) | (id[1] << 8) | id[0]`. Lookups must pack a
    /// numeric event id back into the same byte order.
    pub fn event_key(class: u8, id: [u8; 2]) -> u32 {
        u32::from(class) << 16 | u32::from(id[1]) << 8 | u32::from(id[0])
    }

    /// Device-supplied name for a vendor-unique statistic id.
    pub fn stat_name(&self, id: u16) -> Option<String> {
        let entry = self.stat_ids.get(&id)?;
        self.pool_str(entry.ascii_offset, entry.ascii_len)
    }

    /// Device-supplied name for an event id within a class.
    pub fn event_name(&self, class: u8, id: [u8; 2]) -> Option<String> {
        let entry = self.events.get(&Self::event_key(class, id))?;
        self.pool_str(entry.ascii_offset, entry.ascii_len)
    }

    fn pool_str(&self, offset: u64, len: u8) -> Option<String> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::from(len))?;
        match self.ascii_pool.get(start..end) {
            Some(raw) => Some(String::from_utf8_lossy(raw).into_owned()),
            None => {
                tracing::warn!(
                    offset,
                    len,
                    pool_len = self.ascii_pool.len(),
                    "string entry points outside the ASCII pool"
                );
                None
            }
        }
    }

    fn insert_stat_entries(&mut self, window: &[u8]) {
        for raw in window.chunks_exact(ENTRY_BYTES) {
            let id = u16::from_le_bytes([raw[0], raw[1]]);
            self.stat_ids.insert(
                id,
                StatIdEntry {
                    ascii_len: raw[3],
                    ascii_offset: bytes::le64(raw, 4).unwrap_or(0),
                },
            );
        }
    }

    fn insert_event_entries(&mut self, window: &[u8]) {
        for raw in window.chunks_exact(ENTRY_BYTES) {
            let key = Self::event_key(raw[0], [raw[1], raw[2]]);
            self.events.insert(
                key,
                EventIdEntry {
                    ascii_len: raw[3],
                    ascii_offset: bytes::le64(raw, 4).unwrap_or(0),
                },
            );
        }
    }
}

/// Everything decoded from log 0x25.
#[derive(Debug)]
pub struct StringState {
    pub internal_status: InternalStatus,
    pub header: StringsHeader,
    pub tables: StringTables,
}

/// The four table regions, in mandated order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableKind {
    StatId,
    Event,
    VuEvent,
    Ascii,
}

impl TableKind {
    fn label(self) -> &'static str {
        match self {
            TableKind::StatId => "statistic id string table",
            TableKind::Event => "event string table",
            TableKind::VuEvent => "vu event string table",
            TableKind::Ascii => "ascii table",
        }
    }
}

/// Which table contains `dword_pos`, and how many dwords of it remain.
fn classify(header: &StringsHeader, dword_pos: u64) -> Option<(TableKind, u64)> {
    let tables: [(TableKind, Region); 4] = [
        (TableKind::StatId, header.stat_id_table),
        (TableKind::Event, header.event_table),
        (TableKind::VuEvent, header.vu_event_table),
        (TableKind::Ascii, header.ascii_table),
    ];
    for (kind, region) in tables {
        if region.is_empty() {
            continue;
        }
        let end = region.start_dword.saturating_add(region.size_dword);
        if dword_pos >= region.start_dword && dword_pos < end {
            return Some((kind, end - dword_pos));
        }
    }
    None
}

/// Read and decode the whole string state of log 0x25: internal status,
/// strings header, then the four packed tables streamed across pages.
pub fn read_string_state<S: BlockSource + ?Sized>(
    source: &mut S,
    nsectors: u32,
) -> Result<StringState> {
    let page0 = read_page(source, LOG_SAVED_INTERNAL_STATUS, 0)?;
    let internal_status = InternalStatus::parse(&page0);
    if !internal_status.has_telemetry() {
        return Err(TelemetryError::EmptyLog);
    }

    let mut page = read_page(source, LOG_SAVED_INTERNAL_STATUS, 1)?;
    let header = StringsHeader::parse(&page);
    header.validate(nsectors)?;

    let mut tables = StringTables::default();
    let pool_bytes = header.ascii_table.size_bytes();
    tables
        .ascii_pool
        .try_reserve_exact(pool_bytes)
        .map_err(|_| TelemetryError::OutOfMemory)?;

    // The header fills dwords 0..108 of page 1; the tables start right after.
    let mut dwords_to_read = header.total_table_dwords();
    let mut dword_pos = STRINGS_HEADER_DWORDS;
    let mut dwords_in_page = PAGE_DWORDS - STRINGS_HEADER_DWORDS;
    let mut page_offset = (STRINGS_HEADER_DWORDS * 4) as usize;
    let mut page_idx: u64 = 1;

    while dwords_to_read > 0 {
        let Some((kind, table_remaining)) = classify(&header, dword_pos) else {
            tracing::warn!(
                dword_pos,
                dwords_to_read,
                "dword position falls in no declared string table; stopping"
            );
            break;
        };

        let consumed = dwords_in_page.min(table_remaining).min(dwords_to_read);
        let window = &page[page_offset..page_offset + (consumed * 4) as usize];

        match kind {
            TableKind::StatId | TableKind::Event | TableKind::VuEvent => {
                if window.len() % ENTRY_BYTES != 0 {
                    return Err(TelemetryError::CorruptStringTable(format!(
                        "{} slice of {} bytes is not a whole number of {ENTRY_BYTES}-byte entries",
                        kind.label(),
                        window.len()
                    )));
                }
                if kind == TableKind::StatId {
                    tables.insert_stat_entries(window);
                } else {
                    tables.insert_event_entries(window);
                }
            }
            TableKind::Ascii => tables.ascii_pool.extend_from_slice(window),
        }

        dword_pos += consumed;
        page_offset += (consumed * 4) as usize;
        dwords_to_read -= consumed;
        dwords_in_page -= consumed;
        if dwords_in_page > 0 {
            continue;
        }

        if dwords_to_read > 0 {
            dwords_in_page = dwords_to_read.min(PAGE_DWORDS);
            page_idx += 1;
            page = read_page(source, LOG_SAVED_INTERNAL_STATUS, page_idx)?;
            page_offset = 0;
        }
    }

    Ok(StringState {
        internal_status,
        header,
        tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    struct PageVec(Vec<[u8; SECTOR_SIZE]>);

    impl BlockSource for PageVec {
        fn read_log(
            &mut self,
            _log_address: u8,
            _page_feature: u8,
            page_index: u16,
            out: &mut [u8; SECTOR_SIZE],
        ) -> Result<()> {
            let page = self.0.get(page_index as usize).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no such page")
            })?;
            out.copy_from_slice(page);
            Ok(())
        }
    }

    fn status_page() -> [u8; SECTOR_SIZE] {
        let mut page = [0u8; SECTOR_SIZE];
        page[0] = 0x25;
        page[8..10].copy_from_slice(&2u16.to_le_bytes());
        page
    }

    fn stat_entry(id: u16, len: u8, offset: u64) -> [u8; 16] {
        let mut e = [0u8; 16];
        e[0..2].copy_from_slice(&id.to_le_bytes());
        e[3] = len;
        e[4..12].copy_from_slice(&offset.to_le_bytes());
        e
    }

    fn event_entry(class: u8, id: [u8; 2], len: u8, offset: u64) -> [u8; 16] {
        let mut e = [0u8; 16];
        e[0] = class;
        e[1..3].copy_from_slice(&id);
        e[3] = len;
        e[4..12].copy_from_slice(&offset.to_le_bytes());
        e
    }

    /// Two stat entries (8 dwords), one event entry (4 dwords), 8-dword
    /// ASCII pool, all inside page 1.
    fn strings_image() -> PageVec {
        let mut page1 = [0u8; SECTOR_SIZE];
        page1[0] = 1;
        let put_region = |page: &mut [u8; SECTOR_SIZE], off: usize, start: u64, size: u64| {
            page[off..off + 8].copy_from_slice(&start.to_le_bytes());
            page[off + 8..off + 16].copy_from_slice(&size.to_le_bytes());
        };
        put_region(&mut page1, 64, 108, 8);
        put_region(&mut page1, 80, 116, 4);
        put_region(&mut page1, 112, 120, 8);

        page1[432..448].copy_from_slice(&stat_entry(0x8001, 9, 0));
        page1[448..464].copy_from_slice(&stat_entry(0x8002, 10, 9));
        page1[464..480].copy_from_slice(&event_entry(0x0b, [0x05, 0x00], 8, 19));
        let pool = b"Laser AgeWear Level#5 flush     ";
        page1[480..512].copy_from_slice(pool);

        PageVec(vec![status_page(), page1])
    }

    #[test]
    fn test_read_string_state_builds_maps_and_pool() {
        let state = read_string_state(&mut strings_image(), 2).unwrap();
        assert_eq!(state.tables.stat_ids.len(), 2);
        assert_eq!(state.tables.events.len(), 1);
        assert_eq!(state.tables.ascii_pool.len(), 32);
        assert_eq!(state.tables.stat_name(0x8001).as_deref(), Some("Laser Age"));
        assert_eq!(state.tables.stat_name(0x8002).as_deref(), Some("Wear Level"));
        assert_eq!(
            state.tables.event_name(0x0b, [0x05, 0x00]).as_deref(),
            Some("#5 flush")
        );
        assert_eq!(state.tables.event_name(0x0b, [0x00, 0x05]), None);
    }

    #[test]
    fn test_empty_tables_yield_empty_state() {
        let mut page1 = [0u8; SECTOR_SIZE];
        page1[0] = 1;
        let mut source = PageVec(vec![status_page(), page1]);
        let state = read_string_state(&mut source, 2).unwrap();
        assert!(state.tables.stat_ids.is_empty());
        assert!(state.tables.events.is_empty());
        assert!(state.tables.ascii_pool.is_empty());
    }

    #[test]
    fn test_empty_log_aborts() {
        let mut source = PageVec(vec![[0u8; SECTOR_SIZE]]);
        assert!(matches!(
            read_string_state(&mut source, 2),
            Err(TelemetryError::EmptyLog)
        ));
    }

    #[test]
    fn test_gap_between_tables_stops_but_keeps_state() {
        let mut source = strings_image();
        // Move the event table so a gap opens after the stat table.
        source.0[1][80..88].copy_from_slice(&118u64.to_le_bytes());
        let state = read_string_state(&mut source, 2).unwrap();
        assert_eq!(state.tables.stat_ids.len(), 2);
        assert!(state.tables.events.is_empty());
    }

    #[test]
    fn test_pool_reference_past_end_is_rejected() {
        let state = read_string_state(&mut strings_image(), 2).unwrap();
        let tables = StringTables {
            stat_ids: [(
                0x9000u16,
                StatIdEntry {
                    ascii_len: 64,
                    ascii_offset: 0,
                },
            )]
            .into_iter()
            .collect(),
            events: BTreeMap::new(),
            ascii_pool: state.tables.ascii_pool,
        };
        assert_eq!(tables.stat_name(0x9000), None);
    }
}
