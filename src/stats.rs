//! Statistic descriptors and the statistics-area walker.
//!
//! A statistics area is a dense run of descriptors, each an 8-byte header
//! followed by `statistic_data_size` dwords of body, terminated by a zero
//! statistic id. The header's info bytes type the body three ways:
//!
//! - statistic type (info\[0\] high nibble): single value, array, or custom
//! - data type (info\[2\] low nibble): NA / signed / unsigned / float / ASCII
//! - unit, behavior and host-hint codes, resolved to names in [`crate::catalog`]
//!
//! Custom bodies are an inner variant keyed on the statistic id (ATA Log,
//! SCSI Log Page, HDD Spin-Up; anything else stays opaque). Descriptors with
//! out-of-range type codes are kept as [`StatisticEntry::Skipped`] so the
//! report can show the anomaly, and the walker still advances by the
//! declared size to preserve framing. Only a size that no longer fits the
//! region stops the walk.

use serde::{Serialize, Serializer};

use crate::bytes::{self, ascii_field, hex_line, Cursor};

/// Custom statistic ids with a known shape.
pub const STAT_ID_ATA_LOG: u16 = 0x0002;
pub const STAT_ID_SCSI_LOG_PAGE: u16 = 0x0003;
pub const STAT_ID_HDD_SPINUP: u16 = 0x6006;

/// Statistic type field (info\[0\] bits 7:4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatType {
    Single = 0x0,
    Array = 0x1,
    Custom = 0x2,
}

impl StatType {
    pub fn from_info(info0: u8) -> Option<Self> {
        match info0 >> 4 {
            0x0 => Some(StatType::Single),
            0x1 => Some(StatType::Array),
            0x2 => Some(StatType::Custom),
            _ => None,
        }
    }
}

/// Data type field (info\[2\] bits 3:0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    Na = 0x0,
    Int = 0x1,
    Uint = 0x2,
    Fp = 0x3,
    Ascii = 0x4,
}

impl DataType {
    pub fn from_info(info2: u8) -> Option<Self> {
        match info2 & 0xf {
            0x0 => Some(DataType::Na),
            0x1 => Some(DataType::Int),
            0x2 => Some(DataType::Uint),
            0x3 => Some(DataType::Fp),
            0x4 => Some(DataType::Ascii),
            _ => None,
        }
    }
}

/// One fully decoded statistic descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticDescriptor {
    pub id: u16,
    pub stat_type: StatType,
    pub behavior_type: u8,
    pub unit_type: u8,
    pub host_hint_type: u8,
    pub data_type: DataType,
    /// Body size in dwords, excluding the 8-byte header.
    pub data_size_dwords: u16,
    pub body: StatisticBody,
}

/// Descriptor body, discriminated by the statistic type.
#[derive(Debug, Clone, Serialize)]
pub enum StatisticBody {
    /// One value spanning the whole body.
    Single(Vec<u8>),
    /// Fixed-width elements; each is `element_size + 1` bytes on the wire.
    Array {
        element_size: u8,
        elements: Vec<Vec<u8>>,
    },
    Custom(CustomStatistic),
}

/// Custom body shapes, keyed on the statistic id.
#[derive(Debug, Clone, Serialize)]
pub enum CustomStatistic {
    /// 0x0002: captured ATA log pages.
    AtaLog {
        log_addr: u8,
        log_page_count: u8,
        initial_log_page: u16,
        /// 512 bytes per captured page.
        page_data: Vec<u8>,
    },
    /// 0x0003: a captured SCSI log page.
    ScsiLogPage {
        log_page: u8,
        log_subpage: u8,
        data: Vec<u8>,
    },
    /// 0x6006: HDD spin-up times; zeros mean "absent".
    HddSpinup {
        spinup_max: u16,
        spinup_min: u16,
        history: [u16; 10],
    },
    /// Unrecognized id: raw bytes, rendered as typed data.
    Opaque(Vec<u8>),
}

/// A walker slot: either a decoded descriptor or a skip marker for one that
/// was malformed but could be stepped over.
#[derive(Debug, Clone, Serialize)]
pub enum StatisticEntry {
    Decoded(StatisticDescriptor),
    Skipped { id: u16, reason: String },
}

/// Result of walking one statistics area.
#[derive(Debug, Default)]
pub struct StatisticsArea {
    pub entries: Vec<StatisticEntry>,
    /// Diagnostic set when the walk stopped early because framing was lost.
    pub truncated: Option<String>,
}

/// A scalar decoded from a typed byte field.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Int(i64),
    Uint(u64),
    Ascii(String),
    /// FP, NA, and integer widths outside {1, 2, 4, 8}.
    Raw(Vec<u8>),
}

impl Serialize for StatValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            StatValue::Int(v) => serializer.serialize_i64(*v),
            StatValue::Uint(v) => serializer.serialize_u64(*v),
            StatValue::Ascii(s) => serializer.serialize_str(s),
            StatValue::Raw(raw) => serializer.serialize_str(&hex_line(raw)),
        }
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{v}"),
            StatValue::Uint(v) => write!(f, "{v}"),
            StatValue::Ascii(s) => f.write_str(s),
            StatValue::Raw(raw) => f.write_str(&hex_line(raw)),
        }
    }
}

/// Decode a value of `data_type` from `raw`. Integer widths outside
/// {1, 2, 4, 8} and the FP/NA types fall back to a raw dump.
pub fn decode_value(data_type: DataType, raw: &[u8]) -> StatValue {
    match data_type {
        DataType::Int => match raw.len() {
            1 => StatValue::Int(i64::from(raw[0] as i8)),
            2 => StatValue::Int(i64::from(i16::from_le_bytes([raw[0], raw[1]]))),
            4 => StatValue::Int(i64::from(i32::from_le_bytes([
                raw[0], raw[1], raw[2], raw[3],
            ]))),
            8 => StatValue::Int(i64::from_le_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ])),
            _ => StatValue::Raw(raw.to_vec()),
        },
        DataType::Uint => match raw.len() {
            1 => StatValue::Uint(u64::from(raw[0])),
            2 => StatValue::Uint(u64::from(u16::from_le_bytes([raw[0], raw[1]]))),
            4 => StatValue::Uint(u64::from(u32::from_le_bytes([
                raw[0], raw[1], raw[2], raw[3],
            ]))),
            8 => StatValue::Uint(u64::from_le_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ])),
            _ => StatValue::Raw(raw.to_vec()),
        },
        DataType::Ascii => StatValue::Ascii(ascii_field(raw)),
        DataType::Fp | DataType::Na => StatValue::Raw(raw.to_vec()),
    }
}

fn decode_array(body: &[u8]) -> Result<StatisticBody, String> {
    let mut c = Cursor::new(body);
    let element_size = c.u8().ok_or_else(|| "array header does not fit".to_string())?;
    c.skip(1).ok_or_else(|| "array header does not fit".to_string())?;
    let number_of_elements = c
        .le16()
        .ok_or_else(|| "array header does not fit".to_string())?;

    // Both wire fields are 0-indexed.
    let width = usize::from(element_size) + 1;
    let count = usize::from(number_of_elements) + 1;
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = c.take(width).ok_or_else(|| {
            format!("array of {count} x {width}-byte elements exceeds the descriptor body")
        })?;
        elements.push(raw.to_vec());
    }
    Ok(StatisticBody::Array {
        element_size,
        elements,
    })
}

fn decode_custom(id: u16, body: &[u8]) -> Result<CustomStatistic, String> {
    match id {
        STAT_ID_ATA_LOG => {
            let mut c = Cursor::new(body);
            let log_addr = c.u8().ok_or_else(|| "ATA log header does not fit".to_string())?;
            let log_page_count = c.u8().ok_or_else(|| "ATA log header does not fit".to_string())?;
            let initial_log_page = c
                .le16()
                .ok_or_else(|| "ATA log header does not fit".to_string())?;
            let page_data = c
                .take(usize::from(log_page_count) * 512)
                .ok_or_else(|| {
                    format!(
                        "ATA log statistic declares {log_page_count} pages but only {} body bytes follow",
                        c.remaining()
                    )
                })?;
            Ok(CustomStatistic::AtaLog {
                log_addr,
                log_page_count,
                initial_log_page,
                page_data: page_data.to_vec(),
            })
        }
        STAT_ID_SCSI_LOG_PAGE => {
            let mut c = Cursor::new(body);
            let log_page = c
                .u8()
                .ok_or_else(|| "SCSI log page header does not fit".to_string())?;
            let log_subpage = c
                .u8()
                .ok_or_else(|| "SCSI log page header does not fit".to_string())?;
            c.skip(2)
                .ok_or_else(|| "SCSI log page header does not fit".to_string())?;
            Ok(CustomStatistic::ScsiLogPage {
                log_page,
                log_subpage,
                data: body[4..].to_vec(),
            })
        }
        STAT_ID_HDD_SPINUP => {
            let mut c = Cursor::new(body);
            let spinup_max = c
                .le16()
                .ok_or_else(|| "spin-up statistic body does not fit".to_string())?;
            let spinup_min = c
                .le16()
                .ok_or_else(|| "spin-up statistic body does not fit".to_string())?;
            let mut history = [0u16; 10];
            for slot in history.iter_mut() {
                *slot = c
                    .le16()
                    .ok_or_else(|| "spin-up statistic body does not fit".to_string())?;
            }
            Ok(CustomStatistic::HddSpinup {
                spinup_max,
                spinup_min,
                history,
            })
        }
        _ => Ok(CustomStatistic::Opaque(body.to_vec())),
    }
}

/// Decode the descriptor starting at byte `pos` of `region`.
///
/// Returns the entry plus the dwords consumed (`2 + statistic_data_size`,
/// also for skipped descriptors). `Err` means framing is lost: the header or
/// the declared body does not fit in the region.
pub(crate) fn decode_at(region: &[u8], pos: usize) -> Result<(StatisticEntry, u64), String> {
    let header = bytes::field(region, pos, 8)
        .ok_or_else(|| format!("{} trailing bytes cannot hold a statistic header", region.len() - pos))?;
    let id = u16::from_le_bytes([header[0], header[1]]);
    let info = [header[2], header[3], header[4]];
    let data_size = u16::from_le_bytes([header[6], header[7]]);
    let consumed = 2 + u64::from(data_size);

    let body = bytes::field(region, pos + 8, usize::from(data_size) * 4).ok_or_else(|| {
        format!(
            "statistic 0x{id:04x} declares {data_size} body dwords but only {} bytes remain",
            region.len() - pos - 8
        )
    })?;

    let Some(stat_type) = StatType::from_info(info[0]) else {
        return Ok((
            StatisticEntry::Skipped {
                id,
                reason: format!("statistics type 0x{:x} not supported", info[0] >> 4),
            },
            consumed,
        ));
    };
    let Some(data_type) = DataType::from_info(info[2]) else {
        return Ok((
            StatisticEntry::Skipped {
                id,
                reason: format!("data type 0x{:x} not supported", info[2] & 0xf),
            },
            consumed,
        ));
    };

    let body = match stat_type {
        StatType::Single => Ok(StatisticBody::Single(body.to_vec())),
        StatType::Array => decode_array(body),
        StatType::Custom => decode_custom(id, body).map(StatisticBody::Custom),
    };
    let entry = match body {
        Ok(body) => StatisticEntry::Decoded(StatisticDescriptor {
            id,
            stat_type,
            behavior_type: info[0] & 0xf,
            unit_type: info[1],
            host_hint_type: (info[2] >> 4) & 0x3,
            data_type,
            data_size_dwords: data_size,
            body,
        }),
        Err(reason) => StatisticEntry::Skipped { id, reason },
    };
    Ok((entry, consumed))
}

/// Walk a statistics area. Stops at a zero statistic id (the terminator), at
/// the end of the region, or — with a diagnostic — when a descriptor's
/// declared size no longer fits.
pub fn walk_statistics(region: &[u8]) -> StatisticsArea {
    let mut area = StatisticsArea::default();
    let mut pos = 0usize;

    while pos < region.len() {
        let Some(id) = bytes::le16(region, pos) else {
            area.truncated = Some(format!(
                "{} trailing bytes cannot hold a statistic header",
                region.len() - pos
            ));
            break;
        };
        if id == 0 {
            break;
        }
        match decode_at(region, pos) {
            Ok((entry, consumed_dwords)) => {
                if let StatisticEntry::Skipped { id, reason } = &entry {
                    tracing::warn!(id, reason = reason.as_str(), "statistic descriptor skipped");
                }
                area.entries.push(entry);
                pos += (consumed_dwords * 4) as usize;
            }
            Err(reason) => {
                tracing::warn!(reason = reason.as_str(), "statistics area walk stopped");
                area.truncated = Some(reason);
                break;
            }
        }
    }
    area
}
