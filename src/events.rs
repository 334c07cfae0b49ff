//! Event descriptors and the event-FIFO walker.
//!
//! An event FIFO is a run of descriptors, each a 4-byte header (class, two
//! raw id bytes, body size in dwords) followed by the body, terminated by a
//! zero class byte. Classes with structured payloads are decoded here; every
//! class may carry a vendor-unique tail after its structured part, and
//! vendor-unique classes (0x80 and up) have nothing but VU data.
//!
//! The Statistic Snapshot class is the recursive case: its body is a
//! complete statistic descriptor, and the true length comes from the
//! embedded statistic header rather than the event's own size field.

use serde::Serialize;

use crate::bytes;
use crate::stats::{self, StatisticEntry};

/// Debug event class codes.
pub mod class {
    pub const TIMESTAMP: u8 = 0x01;
    pub const RESET: u8 = 0x04;
    pub const BOOT_SEQ: u8 = 0x05;
    pub const FIRMWARE_ASSERT: u8 = 0x06;
    pub const TEMPERATURE: u8 = 0x07;
    pub const MEDIA: u8 = 0x08;
    pub const MEDIA_WEAR: u8 = 0x09;
    pub const STATISTIC_SNAP: u8 = 0x0a;
    pub const VIRTUAL_FIFO: u8 = 0x0b;
    pub const SATA_PHY_LINK: u8 = 0x0c;
    pub const SATA_TRANSPORT: u8 = 0x0d;
    pub const SAS_PHY_LINK: u8 = 0x0e;
    pub const SAS_TRANSPORT: u8 = 0x0f;

    /// Classes at or above this are vendor unique.
    pub const VENDOR_UNIQUE: u8 = 0x80;
}

/// The one sanctioned conversion between raw id bytes and a numeric event
/// id. The string maps key on the raw bytes; everything numeric goes
/// through here.
pub fn event_id_u16(id: [u8; 2]) -> u16 {
    u16::from_le_bytes(id)
}

/// Media Wear payload (class 0x09, event id 0).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MediaWear {
    pub host_tb_written: u32,
    pub media_tb_written: u32,
    pub ssd_media_tb_erased: u32,
}

/// Class-specific event payload.
#[derive(Debug, Clone, Serialize)]
pub enum EventPayload {
    /// 0x01: milliseconds since 1970.
    Timestamp(u64),
    /// 0x09: wear counters; `None` when the event id is not Media Wear
    /// (the 12 payload bytes are still consumed).
    MediaWear(Option<MediaWear>),
    /// 0x0A: the embedded statistic descriptor.
    StatisticSnapshot(Box<StatisticEntry>),
    /// 0x0B: marker bits 10:0 are the FIFO number, 13:11 the data area.
    /// The raw marker bytes double as the key for the FIFO's name in the
    /// device event-string map.
    VirtualFifo {
        fifo_number: u16,
        data_area: u8,
        marker: [u8; 2],
    },
    /// 0x0D: the captured FIS dwords.
    SataTransport { fis: Vec<u32> },
    /// Classes with no structured payload.
    None,
}

/// One fully decoded event descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct EventDescriptor {
    pub class: u8,
    pub event_id: [u8; 2],
    pub data_size_dwords: u8,
    pub payload: EventPayload,
    /// VU trailer id, present for classes below 0x80 with bytes left after
    /// the structured payload.
    pub vu_event_id: Option<[u8; 2]>,
    pub vu_data: Vec<u8>,
}

/// A walker slot: decoded, or skipped with framing preserved.
#[derive(Debug, Clone, Serialize)]
pub enum EventEntry {
    Decoded(EventDescriptor),
    Skipped {
        class: u8,
        event_id: [u8; 2],
        reason: String,
    },
}

/// Result of walking one event FIFO.
#[derive(Debug, Default)]
pub struct EventFifo {
    pub entries: Vec<EventEntry>,
    /// Diagnostic set when the walk stopped early because framing was lost.
    pub truncated: Option<String>,
}

/// Decode the class-specific part of `body`. Returns the payload and how
/// many body bytes it consumed; `Err` marks a body too small for its class.
fn decode_payload(
    class: u8,
    event_id: [u8; 2],
    body: &[u8],
) -> Result<(EventPayload, usize), String> {
    match class {
        class::TIMESTAMP => {
            let ts = bytes::le64(body, 0)
                .ok_or_else(|| "timestamp event body is shorter than 8 bytes".to_string())?;
            Ok((EventPayload::Timestamp(ts), 8))
        }
        class::MEDIA_WEAR => {
            if body.len() < 12 {
                return Err("media wear event body is shorter than 12 bytes".to_string());
            }
            let wear = if event_id_u16(event_id) == 0 {
                Some(MediaWear {
                    host_tb_written: u32::from_le_bytes([body[0], body[1], body[2], body[3]]),
                    media_tb_written: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
                    ssd_media_tb_erased: u32::from_le_bytes([
                        body[8], body[9], body[10], body[11],
                    ]),
                })
            } else {
                None
            };
            Ok((EventPayload::MediaWear(wear), 12))
        }
        class::VIRTUAL_FIFO => {
            let marker_val = bytes::le16(body, 0)
                .ok_or_else(|| "virtual FIFO event body is shorter than 4 bytes".to_string())?;
            if body.len() < 4 {
                return Err("virtual FIFO event body is shorter than 4 bytes".to_string());
            }
            Ok((
                EventPayload::VirtualFifo {
                    fifo_number: marker_val & 0x7ff,
                    data_area: (marker_val >> 11 & 0x7) as u8,
                    marker: [body[0], body[1]],
                },
                4,
            ))
        }
        class::SATA_TRANSPORT => {
            if body.len() < 28 {
                return Err("SATA transport event body is shorter than 28 bytes".to_string());
            }
            let fis = (0..7)
                .map(|i| {
                    u32::from_le_bytes([
                        body[i * 4],
                        body[i * 4 + 1],
                        body[i * 4 + 2],
                        body[i * 4 + 3],
                    ])
                })
                .collect();
            Ok((EventPayload::SataTransport { fis }, 28))
        }
        _ => Ok((EventPayload::None, 0)),
    }
}

/// Split what's left after the structured payload into the VU trailer.
fn decode_vu_tail(class: u8, rest: &[u8]) -> (Option<[u8; 2]>, Vec<u8>) {
    if rest.is_empty() {
        return (None, Vec::new());
    }
    if class >= class::VENDOR_UNIQUE {
        // The whole body of a vendor-unique class is VU data.
        return (None, rest.to_vec());
    }
    if rest.len() < 2 {
        tracing::warn!(class, "VU trailer too short for an event id");
        return (None, rest.to_vec());
    }
    (Some([rest[0], rest[1]]), rest[2..].to_vec())
}

/// Walk an event FIFO. Stops at a zero class byte (end of FIFO), at the end
/// of the region, or — with a diagnostic — when a descriptor no longer fits.
pub fn walk_events(region: &[u8]) -> EventFifo {
    let mut fifo = EventFifo::default();
    let mut pos = 0usize;

    while pos < region.len() {
        if region[pos] == 0 {
            // End of FIFO.
            break;
        }
        let Some(header) = bytes::field(region, pos, 4) else {
            fifo.truncated = Some(format!(
                "{} trailing bytes cannot hold an event header",
                region.len() - pos
            ));
            break;
        };
        let class = header[0];
        let event_id = [header[1], header[2]];
        let data_size = header[3];

        let (entry, consumed_dwords) = if class == class::STATISTIC_SNAP {
            // The embedded statistic header carries the real length; make
            // sure it is even readable first.
            if region.len() - pos < 4 + 8 {
                fifo.truncated = Some(
                    "statistic snapshot event needs at least 12 bytes of region".to_string(),
                );
                break;
            }
            match stats::decode_at(region, pos + 4) {
                Ok((stat_entry, stat_dwords)) => (
                    EventEntry::Decoded(EventDescriptor {
                        class,
                        event_id,
                        data_size_dwords: data_size,
                        payload: EventPayload::StatisticSnapshot(Box::new(stat_entry)),
                        vu_event_id: None,
                        vu_data: Vec::new(),
                    }),
                    1 + stat_dwords,
                ),
                Err(reason) => {
                    fifo.truncated = Some(format!("statistic snapshot event: {reason}"));
                    break;
                }
            }
        } else {
            let consumed = 1 + u64::from(data_size);
            let Some(body) = bytes::field(region, pos + 4, usize::from(data_size) * 4) else {
                fifo.truncated = Some(format!(
                    "event class 0x{class:02x} declares {data_size} body dwords but only {} bytes remain",
                    region.len() - pos - 4
                ));
                break;
            };
            let entry = match decode_payload(class, event_id, body) {
                Ok((payload, used)) => {
                    let (vu_event_id, vu_data) = decode_vu_tail(class, &body[used..]);
                    EventEntry::Decoded(EventDescriptor {
                        class,
                        event_id,
                        data_size_dwords: data_size,
                        payload,
                        vu_event_id,
                        vu_data,
                    })
                }
                Err(reason) => {
                    tracing::warn!(class, reason = reason.as_str(), "event descriptor skipped");
                    EventEntry::Skipped {
                        class,
                        event_id,
                        reason,
                    }
                }
            };
            (entry, consumed)
        };

        fifo.entries.push(entry);
        pos += (consumed_dwords * 4) as usize;
    }
    fifo
}
