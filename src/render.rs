//! Report emission: every section of the telemetry report, written to both
//! sink streams in lockstep, plus the top-level [`print_telemetry_log`]
//! entry point.
//!
//! Reads against log 0x25 happen before any read of log 0x24 so the device
//! string tables are available while statistics and events decode. Output
//! emitted before a failure is retained; each region fails closed on its
//! own.

use serde_json::{json, Map, Value};

use crate::bytes::hex_line;
use crate::catalog;
use crate::error::Result;
use crate::events::{walk_events, EventEntry, EventFifo, EventPayload, event_id_u16};
use crate::headers::{format_guid, DataHeader, Region, StringsHeader};
use crate::report::ReportSink;
use crate::source::{read_data_state, BlockSource};
use crate::stats::{
    decode_value, walk_statistics, CustomStatistic, StatValue, StatisticBody,
    StatisticDescriptor, StatisticEntry, StatisticsArea,
};
use crate::status::{
    InternalStatus, REASON_ERROR_ID, REASON_FILE_ID, REASON_LINE_NUMBER, REASON_VU_EXT,
};
use crate::strings::{read_string_state, StringTables};

/// Emit one `label : value` line at the given indent and label width.
fn kv<R: ReportSink + ?Sized>(sink: &mut R, indent: usize, width: usize, label: &str, value: &str) {
    sink.text(&format!("{:indent$}{label:<width$}: {value}\n", ""));
}

/// Classic hex dump rows: offset prefix, 16 hex bytes, printable gutter.
fn hex_rows(data: &[u8]) -> Vec<String> {
    let mut rows = Vec::with_capacity(data.len().div_ceil(16));
    for (row, chunk) in data.chunks(16).enumerate() {
        let mut line = format!("{:07x}: ", row * 16);
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => line.push_str(&format!("{b:02x} ")),
                None => line.push_str("   "),
            }
        }
        for i in 0..16 {
            match chunk.get(i) {
                Some(&b) if (b' '..=b'~').contains(&b) => line.push(b as char),
                Some(_) => line.push('.'),
                None => line.push(' '),
            }
        }
        rows.push(line);
    }
    rows
}

/// Emit hex rows at `indent` and return them as a JSON array.
fn emit_hex_rows<R: ReportSink + ?Sized>(sink: &mut R, indent: usize, data: &[u8]) -> Value {
    let rows = hex_rows(data);
    for row in &rows {
        sink.text(&format!("{:indent$}{row}\n", ""));
    }
    Value::Array(rows.into_iter().map(Value::String).collect())
}

// ============================================================================
// Device Internal Status
// ============================================================================

fn render_internal_status<R: ReportSink + ?Sized>(
    sink: &mut R,
    node: &mut Map<String, Value>,
    status: &InternalStatus,
    current: bool,
) {
    if current {
        sink.text("Current Device Internal Status log (GP Log 0x24)\n");
    } else {
        sink.text("Saved Device Internal Status log (GP Log 0x25)\n");
    }
    let mut obj = Map::new();

    kv(sink, 2, 28, "Organization ID", &format!("0x{:08x}", status.organization_id));
    obj.insert("organization_id".into(), json!(status.organization_id));
    kv(sink, 2, 28, "Area 1 Last Log Page", &format!("0x{:04x}", status.area1_last_log_page));
    obj.insert("area1_last_log_page".into(), json!(status.area1_last_log_page));
    kv(sink, 2, 28, "Area 2 Last Log Page", &format!("0x{:04x}", status.area2_last_log_page));
    obj.insert("area2_last_log_page".into(), json!(status.area2_last_log_page));
    kv(sink, 2, 28, "Area 3 Last Log Page", &format!("0x{:04x}", status.area3_last_log_page));
    obj.insert("area3_last_log_page".into(), json!(status.area3_last_log_page));
    kv(
        sink,
        2,
        28,
        "Saved Data Available",
        if status.saved_data_available { "true" } else { "false" },
    );
    obj.insert("saved_data_available".into(), json!(status.saved_data_available));
    kv(
        sink,
        2,
        28,
        "Saved Data Generation Number",
        &format!("0x{:04x}", status.saved_data_generation_number),
    );
    obj.insert(
        "saved_data_generation_number".into(),
        json!(status.saved_data_generation_number),
    );

    let reason = &status.reason_id;
    sink.text("  Reason ID:\n");
    let mut reason_obj = Map::new();
    kv(sink, 4, 20, "Valid Flags", &format!("0x{:x}", reason.valid_flags & 0xf));
    reason_obj.insert("valid flags".into(), json!(reason.valid_flags & 0xf));
    if reason.has(REASON_ERROR_ID) {
        let line = hex_line(&reason.error_id);
        kv(sink, 4, 20, "Error ID", &line);
        reason_obj.insert("error id".into(), json!(line));
    }
    if reason.has(REASON_FILE_ID) {
        let line = hex_line(&reason.file_id);
        kv(sink, 4, 20, "File ID", &line);
        reason_obj.insert("file id".into(), json!(line));
    }
    if reason.has(REASON_LINE_NUMBER) {
        kv(sink, 4, 20, "Line number", &format!("0x{:04x}", reason.line_number));
        reason_obj.insert("line number".into(), json!(reason.line_number));
    }
    if reason.has(REASON_VU_EXT) {
        let line = hex_line(&reason.vu_reason_extension);
        kv(sink, 4, 20, "VU Reason Extension", &line);
        reason_obj.insert("vu reason extension".into(), json!(line));
    }
    obj.insert("reason id".into(), Value::Object(reason_obj));
    sink.text("\n");

    let key = if current {
        "ata current device internal status"
    } else {
        "ata saved device internal status"
    };
    node.insert(key.into(), Value::Object(obj));
}

// ============================================================================
// Headers
// ============================================================================

fn emit_region<R: ReportSink + ?Sized>(sink: &mut R, heading: &str, region: &Region) {
    sink.text(&format!("  {heading}:\n"));
    kv(sink, 4, 23, "Start", &format!("0x{:04x}", region.start_dword));
    kv(sink, 4, 23, "Size", &format!("0x{:04x}", region.size_dword));
}

fn render_strings_header<R: ReportSink + ?Sized>(
    sink: &mut R,
    node: &mut Map<String, Value>,
    header: &StringsHeader,
) {
    sink.text("OCP Telemetry Strings Header\n");
    let mut obj = Map::new();

    kv(sink, 2, 25, "Log Page Version", &format!("0x{:04x}", header.log_page_version));
    obj.insert("log_page_version".into(), json!(header.log_page_version));
    let guid = format_guid(&header.guid);
    kv(sink, 2, 25, "GUID", &guid);
    obj.insert("guid".into(), json!(guid));

    emit_region(sink, "Statistics ID String Table", &header.stat_id_table);
    emit_region(sink, "Event String Table", &header.event_table);
    emit_region(sink, "VU Event String Table", &header.vu_event_table);
    emit_region(sink, "ASCII Table", &header.ascii_table);

    kv(sink, 2, 25, "Event FIFO 1 Name", &header.event_fifo1_name);
    obj.insert("event fifo 1 name".into(), json!(header.event_fifo1_name));
    kv(sink, 2, 25, "Event FIFO 2 Name", &header.event_fifo2_name);
    obj.insert("event fifo 2 name".into(), json!(header.event_fifo2_name));
    sink.text("\n");

    node.insert("ocp_telemetry_strings_header".into(), Value::Object(obj));
}

fn render_data_header<R: ReportSink + ?Sized>(
    sink: &mut R,
    node: &mut Map<String, Value>,
    header: &DataHeader,
) {
    sink.text("OCP Telemetry Data Header\n");
    let mut obj = Map::new();

    kv(sink, 2, 25, "Major Version", &format!("0x{:04x}", header.major_version));
    obj.insert("major_version".into(), json!(header.major_version));
    kv(sink, 2, 25, "Minor Version", &format!("0x{:04x}", header.minor_version));
    obj.insert("minor_version".into(), json!(header.minor_version));
    let timestamp = header.timestamp_msecs();
    kv(sink, 2, 25, "Timestamp", &format!("0x{timestamp:04x}"));
    obj.insert("timestamp".into(), json!(timestamp));
    let guid = format_guid(&header.guid);
    kv(sink, 2, 25, "GUID", &guid);
    obj.insert("guid".into(), json!(guid));
    kv(
        sink,
        2,
        25,
        "Device String Data Size",
        &format!("0x{:04x}", header.device_string_data_size),
    );
    obj.insert(
        "device_string_data_size".into(),
        json!(header.device_string_data_size),
    );
    kv(sink, 2, 25, "Firmware version", &header.firmware_version);
    obj.insert("firmware_version".into(), json!(header.firmware_version));

    emit_region(sink, "Statistic Area 1", &header.statistic1);
    emit_region(sink, "Statistic Area 2", &header.statistic2);
    emit_region(sink, "Event FIFO 1", &header.event_fifo1);
    emit_region(sink, "Event FIFO 2", &header.event_fifo2);
    sink.text("\n");

    node.insert("ocp_telemetry_data_header".into(), Value::Object(obj));
}

// ============================================================================
// Statistic descriptors
// ============================================================================

fn stat_value_json(value: &StatValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn render_ata_log_stat<R: ReportSink + ?Sized>(
    sink: &mut R,
    obj: &mut Map<String, Value>,
    indent: usize,
    log_addr: u8,
    log_page_count: u8,
    initial_log_page: u16,
    page_data: &[u8],
) {
    kv(sink, indent, 25, "Log Address", &format!("{log_addr:x}"));
    obj.insert("log_address".into(), json!(log_addr));
    kv(sink, indent, 25, "Log Page Count", &format!("{log_page_count:x}"));
    obj.insert("log_page_count".into(), json!(log_page_count));
    kv(sink, indent, 25, "Initial Log Page", &format!("{initial_log_page:x}"));
    obj.insert("initial_log_page".into(), json!(initial_log_page));

    let mut pages = Vec::new();
    for (i, page) in page_data.chunks_exact(512).enumerate() {
        sink.text(&format!(
            "{:indent$}Log Page 0x{:04x}:\n",
            "",
            initial_log_page as usize + i
        ));
        pages.push(emit_hex_rows(sink, indent + 2, page));
    }
    obj.insert("log_page".into(), Value::Array(pages));
}

fn render_custom_stat<R: ReportSink + ?Sized>(
    sink: &mut R,
    obj: &mut Map<String, Value>,
    desc: &StatisticDescriptor,
    custom: &CustomStatistic,
    indent: usize,
) {
    match custom {
        CustomStatistic::AtaLog {
            log_addr,
            log_page_count,
            initial_log_page,
            page_data,
        } => {
            sink.text("\n");
            render_ata_log_stat(
                sink,
                obj,
                indent + 2,
                *log_addr,
                *log_page_count,
                *initial_log_page,
                page_data,
            );
        }
        CustomStatistic::ScsiLogPage {
            log_page,
            log_subpage,
            data,
        } => {
            sink.text("\n");
            kv(sink, indent + 2, 25, "Log Page", &format!("0x{log_page:04x}"));
            obj.insert("log_page".into(), json!(log_page));
            kv(sink, indent + 2, 25, "Log Subpage", &format!("0x{log_subpage:04x}"));
            obj.insert("log_subpage".into(), json!(log_subpage));
            sink.text(&format!("{:indent$}{:<25}:\n", "", "Log Page Data", indent = indent + 2));
            let rows = emit_hex_rows(sink, indent + 4, data);
            obj.insert("log_page_data".into(), rows);
        }
        CustomStatistic::HddSpinup {
            spinup_max,
            spinup_min,
            history,
        } => {
            sink.text("\n");
            if *spinup_max != 0 {
                kv(sink, indent + 2, 25, "Lifetime Spinup Max", &format!("0x{spinup_max:04x}"));
                obj.insert("lifetime_spinup_max".into(), json!(spinup_max));
            }
            if *spinup_min != 0 {
                kv(sink, indent + 2, 25, "Lifetime Spinup Min", &format!("0x{spinup_min:04x}"));
                obj.insert("lifetime_spinup_min".into(), json!(spinup_min));
            }
            sink.text(&format!("{:indent$}{:<25}:", "", "Spinup History", indent = indent + 2));
            // Zeros mean "absent": the history ends at the first zero slot.
            let mut values = Vec::new();
            for (i, &val) in history.iter().enumerate() {
                if val == 0 {
                    if i == 0 {
                        sink.text("None");
                    }
                    break;
                }
                sink.text(&format!("{}0x{val:04x}", if i > 0 { ", " } else { " " }));
                values.push(json!(val));
            }
            sink.text("\n");
            obj.insert("spinup_history".into(), Value::Array(values));
        }
        CustomStatistic::Opaque(raw) => {
            let value = decode_value(desc.data_type, raw);
            sink.text(&format!("{value}\n"));
            obj.insert("data".into(), stat_value_json(&value));
        }
    }
}

/// Emit one statistic entry. Returns the descriptor's JSON object for
/// decoded descriptors; skipped ones only get a diagnostic line.
fn render_stat_entry<R: ReportSink + ?Sized>(
    sink: &mut R,
    entry: &StatisticEntry,
    indent: usize,
    tables: &StringTables,
) -> Option<Value> {
    let desc = match entry {
        StatisticEntry::Decoded(desc) => desc,
        StatisticEntry::Skipped { reason, .. } => {
            sink.text(&format!("Malformed statistic descriptor skipped - {reason}\n"));
            return None;
        }
    };
    let mut obj = Map::new();

    let name = catalog::stat_id_name(desc.id, tables);
    kv(sink, indent, 25, "Statistic ID", &format!("0x{:04x}, {name}", desc.id));
    obj.insert("ID".into(), json!(name));

    let stat_type_code = desc.stat_type as u8;
    kv(
        sink,
        indent,
        25,
        "Statistic Type",
        &format!("0x{stat_type_code:x}, {}", catalog::stat_type_name(desc.stat_type)),
    );
    obj.insert("statistic type".into(), json!(stat_type_code));
    kv(
        sink,
        indent,
        25,
        "Behavior Type",
        &format!("0x{:02x}, {}", desc.behavior_type, catalog::behavior_name(desc.behavior_type)),
    );
    obj.insert("behavior type".into(), json!(desc.behavior_type));
    let unit = format!("0x{:02x}, {}", desc.unit_type, catalog::unit_name(desc.unit_type));
    kv(sink, indent, 25, "Unit", &unit);
    obj.insert("unit".into(), json!(unit));
    kv(
        sink,
        indent,
        25,
        "Host Hint Type",
        &format!("0x{:x}, {}", desc.host_hint_type, catalog::host_hint_name(desc.host_hint_type)),
    );
    obj.insert("host hint type".into(), json!(desc.host_hint_type));
    let data_type_code = desc.data_type as u8;
    kv(
        sink,
        indent,
        25,
        "Data Type",
        &format!("0x{data_type_code:x}, {}", catalog::data_type_name(desc.data_type)),
    );
    obj.insert("data type".into(), json!(data_type_code));
    kv(sink, indent, 25, "Statistic Data Size", &format!("0x{:x}", desc.data_size_dwords));
    obj.insert("data size".into(), json!(desc.data_size_dwords));

    sink.text(&format!("{:indent$}{:<25}: ", "", "Data"));
    match &desc.body {
        StatisticBody::Single(raw) => {
            let value = decode_value(desc.data_type, raw);
            sink.text(&format!("{value}\n"));
            obj.insert("data".into(), stat_value_json(&value));
        }
        StatisticBody::Array { elements, .. } => {
            sink.text("[ ");
            let mut values = Vec::with_capacity(elements.len());
            for (i, raw) in elements.iter().enumerate() {
                if i > 0 {
                    sink.text(", ");
                }
                let value = decode_value(desc.data_type, raw);
                sink.text(&value.to_string());
                values.push(stat_value_json(&value));
            }
            sink.text(" ]\n");
            obj.insert("data".into(), Value::Array(values));
        }
        StatisticBody::Custom(custom) => {
            render_custom_stat(sink, &mut obj, desc, custom, indent);
        }
    }

    Some(Value::Object(obj))
}

fn render_statistics<R: ReportSink + ?Sized>(
    sink: &mut R,
    area: &StatisticsArea,
    tables: &StringTables,
) -> Value {
    let mut list = Vec::new();
    for entry in &area.entries {
        sink.text(&format!("  Statistic Descriptor {}\n", list.len()));
        if let Some(obj) = render_stat_entry(sink, entry, 4, tables) {
            list.push(obj);
        }
    }
    if let Some(reason) = &area.truncated {
        sink.text(&format!("  Statistics area walk stopped - {reason}\n"));
    }
    sink.text("\n");
    Value::Array(list)
}

// ============================================================================
// Event descriptors
// ============================================================================

fn render_event_entry<R: ReportSink + ?Sized>(
    sink: &mut R,
    entry: &EventEntry,
    indent: usize,
    tables: &StringTables,
) -> Value {
    let mut obj = Map::new();
    let desc = match entry {
        EventEntry::Decoded(desc) => desc,
        EventEntry::Skipped {
            class,
            event_id,
            reason,
        } => {
            let class_name = catalog::event_class_name(*class);
            kv(sink, indent, 25, "Class", &format!("0x{class:02x}, {class_name}"));
            obj.insert("Class".into(), json!(class_name));
            sink.text(&format!("Malformed event descriptor skipped - {reason}\n"));
            obj.insert("skipped".into(), json!(reason));
            obj.insert("ID".into(), json!(event_id_u16(*event_id)));
            return Value::Object(obj);
        }
    };

    let class_name = catalog::event_class_name(desc.class);
    kv(sink, indent, 25, "Class", &format!("0x{:02x}, {class_name}", desc.class));
    obj.insert("Class".into(), json!(class_name));
    if let Some(name) = catalog::event_id_name(desc.class, desc.event_id, tables) {
        kv(
            sink,
            indent,
            25,
            "Id",
            &format!("0x{:04x}, {name}", event_id_u16(desc.event_id)),
        );
        obj.insert("ID".into(), json!(name));
    }

    match &desc.payload {
        EventPayload::Timestamp(msecs) => {
            kv(sink, indent, 25, "Timestamp", &format!("0x{msecs:04x}"));
            obj.insert("Timestamp".into(), json!(msecs));
        }
        EventPayload::MediaWear(Some(wear)) => {
            kv(sink, indent, 25, "Host TB Written", &format!("0x{:04x}", wear.host_tb_written));
            obj.insert("Host TB written".into(), json!(wear.host_tb_written));
            kv(sink, indent, 25, "Media TB Written", &format!("0x{:04x}", wear.media_tb_written));
            obj.insert("media TB written".into(), json!(wear.media_tb_written));
            kv(
                sink,
                indent,
                25,
                "SSD Media TB Erased",
                &format!("0x{:04x}", wear.ssd_media_tb_erased),
            );
            obj.insert("SSD media TB erased".into(), json!(wear.ssd_media_tb_erased));
        }
        EventPayload::MediaWear(None) => {}
        EventPayload::StatisticSnapshot(stat_entry) => {
            sink.text(&format!("{:indent$}Statistic Descriptor Snapshot:\n", ""));
            if let Some(stat_obj) = render_stat_entry(sink, stat_entry, indent + 2, tables) {
                obj.insert("Statistic descriptor".into(), stat_obj);
            }
        }
        EventPayload::VirtualFifo {
            fifo_number,
            data_area,
            marker,
        } => {
            kv(sink, indent, 25, "Virtual FIFO Data Area", &format!("0x{data_area:04x}"));
            obj.insert("data area".into(), json!(data_area));
            // The FIFO's name is stored in the event string map keyed by the
            // raw marker bytes.
            if let Some(name) = catalog::event_id_name(desc.class, *marker, tables) {
                kv(sink, indent, 25, "Virtual FIFO Number", &format!("0x{fifo_number:04x}"));
                kv(sink, indent, 25, "Virtual FIFO Name", &name);
                obj.insert("virtual fifo number".into(), json!(fifo_number));
                obj.insert("virtual fifo name".into(), json!(name));
            }
        }
        EventPayload::SataTransport { fis } => {
            let raw: Vec<u8> = fis.iter().flat_map(|dword| dword.to_le_bytes()).collect();
            let line = hex_line(&raw);
            kv(sink, indent, 25, "FIS", &line);
            obj.insert("FIS".into(), json!(line));
        }
        EventPayload::None => {}
    }

    if let Some(vu_id) = desc.vu_event_id {
        let name = catalog::event_id_name(desc.class, vu_id, tables).unwrap_or_default();
        kv(
            sink,
            indent,
            25,
            "VU Event ID",
            &format!("0x{:04x}, {name}", event_id_u16(vu_id)),
        );
        obj.insert("VU ID".into(), json!(event_id_u16(vu_id)));
    }
    if !desc.vu_data.is_empty() {
        let line = hex_line(&desc.vu_data);
        kv(sink, indent, 25, "VU Data", &line);
        obj.insert("vu data".into(), json!(line));
    }

    Value::Object(obj)
}

fn render_events<R: ReportSink + ?Sized>(
    sink: &mut R,
    fifo: &EventFifo,
    tables: &StringTables,
) -> Value {
    let mut list = Vec::new();
    for entry in &fifo.entries {
        sink.text(&format!("  Event Descriptor {}\n", list.len()));
        list.push(render_event_entry(sink, entry, 4, tables));
    }
    if let Some(reason) = &fifo.truncated {
        sink.text(&format!("  Event FIFO walk stopped - {reason}\n"));
    }
    sink.text("\n");
    Value::Array(list)
}

fn render_event_fifo<R: ReportSink + ?Sized>(
    sink: &mut R,
    node: &mut Map<String, Value>,
    key: &str,
    heading: &str,
    name: &str,
    region: &[u8],
    tables: &StringTables,
) {
    let mut fifo_obj = Map::new();
    sink.text(heading);
    if !name.is_empty() {
        sink.text(&format!(": {name}"));
        fifo_obj.insert("name".into(), json!(name));
    }
    sink.text("\n");
    let fifo = walk_events(region);
    fifo_obj.insert("events".into(), render_events(sink, &fifo, tables));
    node.insert(key.into(), Value::Object(fifo_obj));
}

// ============================================================================
// Top level
// ============================================================================

/// Decode and report both telemetry logs of a device.
///
/// Log 0x25 (strings) is read first so statistic and event ids can be
/// resolved against the device string tables while log 0x24 decodes. FIFO
/// and area sections appear only when their regions are non-empty.
pub fn print_telemetry_log<S, R>(
    source: &mut S,
    nsectors_0x24: u32,
    nsectors_0x25: u32,
    sink: &mut R,
) -> Result<()>
where
    S: BlockSource + ?Sized,
    R: ReportSink + ?Sized,
{
    let strings = read_string_state(source, nsectors_0x25)?;
    let mut strings_node = Map::new();
    render_internal_status(sink, &mut strings_node, &strings.internal_status, false);
    render_strings_header(sink, &mut strings_node, &strings.header);
    sink.attach("ocp_telemetry_strings", Value::Object(strings_node));

    let data = read_data_state(source, nsectors_0x24)?;
    let mut data_node = Map::new();
    render_internal_status(sink, &mut data_node, &data.internal_status, true);
    render_data_header(sink, &mut data_node, &data.header);

    let header = &data.header;
    let mut offset = 0usize;

    if !header.statistic1.is_empty() {
        let region = &data.payload[offset..offset + header.statistic1.size_bytes()];
        sink.text("OCP Statistics Area 1\n");
        let area = walk_statistics(region);
        data_node.insert(
            "statistic_area_1".into(),
            render_statistics(sink, &area, &strings.tables),
        );
        offset += header.statistic1.size_bytes();
    }
    if !header.statistic2.is_empty() {
        let region = &data.payload[offset..offset + header.statistic2.size_bytes()];
        sink.text("OCP Statistics Area 2\n");
        let area = walk_statistics(region);
        data_node.insert(
            "statistic_area_2".into(),
            render_statistics(sink, &area, &strings.tables),
        );
        offset += header.statistic2.size_bytes();
    }
    if !header.event_fifo1.is_empty() {
        let region = &data.payload[offset..offset + header.event_fifo1.size_bytes()];
        render_event_fifo(
            sink,
            &mut data_node,
            "event_fifo_1",
            "OCP Event Fifo 1",
            &strings.header.event_fifo1_name,
            region,
            &strings.tables,
        );
        offset += header.event_fifo1.size_bytes();
    }
    if !header.event_fifo2.is_empty() {
        let region = &data.payload[offset..offset + header.event_fifo2.size_bytes()];
        render_event_fifo(
            sink,
            &mut data_node,
            "event_fifo_2",
            "OCP Event Fifo 2",
            &strings.header.event_fifo2_name,
            region,
            &strings.tables,
        );
    }

    sink.attach("ocp_telemetry_data", Value::Object(data_node));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TextJsonReport;
    use crate::stats::{DataType, StatType};

    #[test]
    fn test_hex_rows_shapes() {
        let rows = hex_rows(&[0x41; 20]);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("0000000: 41 41"));
        assert!(rows[0].ends_with("AAAAAAAAAAAAAAAA"));
        assert!(rows[1].starts_with("0000010: 41 41 41 41 "));
        assert!(rows[1].ends_with("AAAA            "));
    }

    #[test]
    fn test_render_single_statistic_lines() {
        let desc = StatisticDescriptor {
            id: 0x2003,
            stat_type: StatType::Single,
            behavior_type: 1,
            unit_type: 3,
            host_hint_type: 0,
            data_type: DataType::Uint,
            data_size_dwords: 1,
            body: StatisticBody::Single(40321u32.to_le_bytes().to_vec()),
        };
        let mut report = TextJsonReport::new();
        let tables = StringTables::default();
        let obj = render_stat_entry(
            &mut report,
            &StatisticEntry::Decoded(desc),
            4,
            &tables,
        )
        .unwrap();

        let text = report.text_output();
        assert!(text.contains("Statistic ID             : 0x2003, Power-on Hours Count"));
        assert!(text.contains("Unit                     : 0x03, h"));
        assert!(text.contains("Data                     : 40321"));
        assert_eq!(obj["ID"], json!("Power-on Hours Count"));
        assert_eq!(obj["data"], json!(40321));
    }

    #[test]
    fn test_render_spinup_history_truncates_at_zero() {
        let desc = StatisticDescriptor {
            id: 0x6006,
            stat_type: StatType::Custom,
            behavior_type: 1,
            unit_type: 1,
            host_hint_type: 0,
            data_type: DataType::Na,
            data_size_dwords: 6,
            body: StatisticBody::Custom(CustomStatistic::HddSpinup {
                spinup_max: 0x0050,
                spinup_min: 0x0030,
                history: [0x0040, 0x0041, 0, 0, 0, 0, 0, 0, 0, 0],
            }),
        };
        let mut report = TextJsonReport::new();
        let tables = StringTables::default();
        let obj = render_stat_entry(
            &mut report,
            &StatisticEntry::Decoded(desc),
            4,
            &tables,
        )
        .unwrap();

        let text = report.text_output();
        assert!(text.contains("Lifetime Spinup Max      : 0x0050"));
        assert!(text.contains("Lifetime Spinup Min      : 0x0030"));
        assert!(text.contains("Spinup History           : 0x0040, 0x0041\n"));
        assert_eq!(obj["spinup_history"], json!([0x40, 0x41]));
    }

    #[test]
    fn test_render_spinup_empty_history_prints_none() {
        let desc = StatisticDescriptor {
            id: 0x6006,
            stat_type: StatType::Custom,
            behavior_type: 1,
            unit_type: 1,
            host_hint_type: 0,
            data_type: DataType::Na,
            data_size_dwords: 6,
            body: StatisticBody::Custom(CustomStatistic::HddSpinup {
                spinup_max: 0,
                spinup_min: 0,
                history: [0; 10],
            }),
        };
        let mut report = TextJsonReport::new();
        let tables = StringTables::default();
        let obj =
            render_stat_entry(&mut report, &StatisticEntry::Decoded(desc), 4, &tables).unwrap();

        let text = report.text_output();
        assert!(!text.contains("Lifetime Spinup Max"));
        assert!(text.contains("Spinup History           :None"));
        assert_eq!(obj["spinup_history"], json!([]));
        assert!(obj.get("lifetime_spinup_max").is_none());
    }
}
