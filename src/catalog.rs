//! Built-in name catalogs and id-to-name resolution.
//!
//! Statistic and event ids resolve in a fixed order: the built-in catalog
//! first, then the device-supplied string tables (only where the id space
//! allows a device definition), then a Reserved / Vendor Unique label.

use crate::events::{self, class};
use crate::stats::{DataType, StatType};
use crate::strings::StringTables;

/// Built-in statistic identifiers. 0x2xxx are general device statistics,
/// 0x4xxx SSD, 0x6xxx HDD.
pub const BUILTIN_STATISTICS: &[(u16, &str)] = &[
    (0x0002, "ATA Log"),
    (0x0003, "SCSI Log Page"),
    (0x2001, "Reallocated Block Count"),
    (0x2002, "Pending Defects Count"),
    (0x2003, "Power-on Hours Count"),
    (0x2004, "Power-on Cycle Count"),
    (0x2005, "Spare Blocks Used"),
    (0x2006, "Spare Blocks Remaining"),
    (0x2007, "Unexpected Power Loss Count"),
    (0x2008, "Current Temperature"),
    (0x2009, "Minimum Lifetime Temperature"),
    (0x200a, "Maximum Lifetime Temperature"),
    (0x200b, "Uncorrectable Read Error Count"),
    (0x200c, "Background Uncorrectable Read Error Count"),
    (0x200d, "Interface CRC Error Count"),
    (0x200e, "Volatile Memory Backup Source Failure"),
    (0x200f, "Read Only Mode"),
    (0x2010, "Host Write Commands"),
    (0x2011, "Host Read Commands"),
    (0x2012, "Logical Blocks Read"),
    (0x2013, "Logical Blocks Written"),
    (0x2014, "Total Media Writes"),
    (0x2015, "Total Media Reads"),
    (0x2016, "Soft ECC Error Count"),
    (0x2017, "Host Trim/Unmap Commands"),
    (0x2018, "End-to-end Detected Errors"),
    (0x2019, "End-to-end Corrected Errors"),
    (0x201a, "Unaligned I/O count"),
    (0x201b, "Security version number"),
    (0x201c, "Thermal Throttling Status"),
    (0x201d, "Thermal Throttling Count"),
    (0x201e, "DSS Specification Version"),
    (0x201f, "Incomplete Shutdown Count"),
    (0x2020, "Percent Free Blocks"),
    (0x2021, "Lowest Permitted Firmware Revision"),
    (0x2022, "Maximum Peak Power Capability"),
    (0x2023, "Current Maximum Average Power"),
    (0x2024, "Lifetime Power Consumed"),
    (0x2025, "Power Changes"),
    (0x2026, "Phy Reinitialization Count"),
    (0x2027, "Secondary Phy Reinitialization Count"),
    (0x2028, "Command Timeouts"),
    (0x2029, "Hardware Revision"),
    (0x202a, "Firmware Revision"),
    (0x4001, "Raw Capacity"),
    (0x4002, "User Capacity"),
    (0x4003, "Erase Count"),
    (0x4004, "Erase Fail Count"),
    (0x4005, "Maximum Erase Count"),
    (0x4006, "Average Erase Count"),
    (0x4007, "Program Fail Count"),
    (0x4008, "XOR Recovery Count"),
    (0x4009, "Percent Device Life Remaining"),
    (0x400a, "Lifetime Erase Count"),
    (0x400b, "Bad User NAND Blocks"),
    (0x400c, "Bad System NAND Blocks"),
    (0x400d, "Minimum Erase Count"),
    (0x400e, "Power Loss Protection Start Count"),
    (0x400f, "System Data Percent Used"),
    (0x4010, "Power Loss Protection Health"),
    (0x4011, "Endurance Estimate"),
    (0x4012, "Percent User Spare Available"),
    (0x4013, "Percent System Spare Available"),
    (0x4014, "Total Media Dies"),
    (0x4015, "Media Die Failure Tolerance"),
    (0x4016, "Media Dies Offline"),
    (0x4017, "System Area Program Fail Count"),
    (0x4018, "System Area Program Fail Percentage Remaining"),
    (0x4019, "System Area Uncorrectable Read Error Count"),
    (0x401a, "System Area Uncorrectable Read Percentage Remaining"),
    (0x401b, "System Area Erase Fail Count"),
    (0x401c, "System Area Erase Fail Percentage Remaining"),
    (0x6001, "Start/Stop Count"),
    (0x6002, "Load Cycle Count"),
    (0x6003, "Shock Overlimit Count"),
    (0x6004, "Head Flying Hours"),
    (0x6005, "Free Fall Events Count"),
    (0x6006, "Spinup Times"),
];

/// Statistic ids at or above this may be defined by the device string
/// tables; below it the device map is never consulted.
pub const VU_STATISTIC_BASE: u16 = 0x8000;

/// Event ids at or above this are vendor unique.
pub const VU_EVENT_BASE: u16 = 0x8000;

const TIMESTAMP_EVENTS: &[&str] = &[
    "Host Initiated Timestamp",
    "Firmware Initiated Timestamp",
    "Obsolete ID (0x02)",
];

const RESET_EVENTS: &[&str] = &[
    "Main Power Cycle",
    "SATA - SRST",
    "SATA - COMRESET",
    "SAS - Hard Reset",
    "SAS - COMINIT",
    "SAS - DWORD Synchronization Loss",
    "SAS - SPL Packet Synchronization Loss",
    "SAS - Receive Identify Timeout Timer Expired",
    "SAS - Hot-plug Timeout",
];

const SSD_BOOT_SEQ_EVENTS: &[&str] = &[
    "Main Firmware Boot Complete",
    "FTL Load From NVM Complete",
    "FTL Rebuild Started",
    "FTL Ready",
];

/// HDD boot sequence ids start at 0x100.
const HDD_BOOT_SEQ_EVENT_BASE: u16 = 0x100;
const HDD_BOOT_SEQ_EVENTS: &[&str] = &[
    "Main Firmware Boot Complete",
    "Spin-up Start",
    "Spin-up Complete",
    "Device Ready",
];

const FIRMWARE_ASSERT_EVENTS: &[&str] = &[
    "Assert in SAS, SCSI, SATA or ATA Processing Code",
    "Assert in Media Code",
    "Assert in Security Code",
    "Assert in Background Services Code",
    "FTL Rebuild Failed",
    "FTL Data Mismatch",
    "Assert in Bad Block Relocation Code",
    "Assert in Other Code",
];

const TEMPERATURE_EVENTS: &[&str] = &[
    "Temperature decrease ceased thermal throttling",
    "Temperature increase commenced thermal throttling",
    "Temperature increase caused thermal shutdown",
];

const MEDIA_EVENTS: &[&str] = &[
    "XOR (or equivalent) Recovery Invoked",
    "Uncorrectable Media Error",
    "Block Marked Bad Due To SSD Media Program Error",
    "Block Marked Bad Due To SSD Media Erase Error",
    "Block Marked Bad Due To Read Error",
    "SSD Media Plane Failure",
    "SSD Media Die Failure",
    "HDD Head or Surface Failure",
];

const MEDIA_WEAR_EVENTS: &[&str] = &["Media Wear"];

const VIRTUAL_FIFO_EVENTS: &[&str] = &["Virtual FIFO Start", "Virtual FIFO End"];

const SATA_PHY_LINK_EVENTS: &[&str] = &[
    "DR_Reset Entered due to Unexpected COMRESET",
    "DR_Reset Entered due to Phy Signal Not Detected",
    "Device Dropped Link while Host Link is Up",
    "DR_Ready entered at Gen 3",
    "DR_Ready entered at Gen 2",
    "DR_Ready entered at Gen 1",
    "DR_Partial Entered",
    "DR_Partial Exited",
    "DR_Reduce_Speed Entered",
    "DR_Error Entered",
    "Transmitting HOLD",
    "Receiving HOLD",
    "PMNAK Received",
    "PMNAK Transmitted",
    "R_ERR Received",
    "R_ERR Transmitted",
    "Set Device Bits Transmitted with Error Bit Set",
];

const SATA_TRANSPORT_EVENTS: &[&str] = &[
    "Non-Data FIS Received",
    "Non-Data FIS Transmitted",
    "Data FIS Received",
    "Data FIS Transmitted",
];

const SAS_PHY_LINK_EVENTS: &[&str] = &[
    "Link Up - 1.5 Gbps",
    "Link Up - 3.0 Gbps",
    "Link Up - 6.0 Gbps",
    "Link Up - 12.0 Gbps",
    "Link Up - 22.5 Gbps",
    "Identify Received (Data)",
    "HARD_RESET Received",
    "Link Loss",
    "DWORD Synchronization Loss",
    "SPL Packet Synchronization Loss",
    "Identify Receive TImeout",
    "BREAK Received",
    "BREAK_REPLY Received",
];

const SAS_TRANSPORT_EVENTS: &[&str] = &[
    "DATA Frame Received",
    "DATA Frame Sent",
    "XFER_RDY Frame Sent",
    "COMMAND Frame Received",
    "RESPONSE Frame Sent",
    "TASK Frame Received",
    "SSP Frame Received",
    "SSP Frame Sent",
    "NAK Received",
];

/// Unit type names, indexed by the unit code (0x00..=0x12).
const UNIT_NAMES: &[&str] = &[
    "N/A",
    "ms",
    "s",
    "h",
    "d",
    "MB",
    "GB",
    "TB",
    "PB",
    "C",
    "K",
    "F",
    "mV",
    "mA",
    "Ohm",
    "RPM",
    "micrometer",
    "nanometer",
    "angstroms",
];

/// Resolve a statistic id to a display name: built-in catalog first; vendor
/// ids (>= 0x8000) may come from the device string tables; everything else
/// unassigned is reserved.
pub fn stat_id_name(id: u16, tables: &StringTables) -> String {
    for (builtin_id, name) in BUILTIN_STATISTICS {
        if *builtin_id == id {
            return (*name).to_string();
        }
    }
    if id >= VU_STATISTIC_BASE {
        tables
            .stat_name(id)
            .unwrap_or_else(|| "Vendor Unique ID".to_string())
    } else {
        "Reserved ID".to_string()
    }
}

fn builtin_event_name(dbg_class: u8, event_id: u16) -> Option<&'static str> {
    let idx = usize::from(event_id);
    match dbg_class {
        class::TIMESTAMP => TIMESTAMP_EVENTS.get(idx).copied(),
        class::RESET => RESET_EVENTS.get(idx).copied(),
        class::BOOT_SEQ => {
            if let Some(hdd_idx) = event_id.checked_sub(HDD_BOOT_SEQ_EVENT_BASE) {
                HDD_BOOT_SEQ_EVENTS.get(usize::from(hdd_idx)).copied()
            } else {
                SSD_BOOT_SEQ_EVENTS.get(idx).copied()
            }
        }
        class::FIRMWARE_ASSERT => FIRMWARE_ASSERT_EVENTS.get(idx).copied(),
        class::TEMPERATURE => TEMPERATURE_EVENTS.get(idx).copied(),
        class::MEDIA => MEDIA_EVENTS.get(idx).copied(),
        class::MEDIA_WEAR => MEDIA_WEAR_EVENTS.get(idx).copied(),
        class::VIRTUAL_FIFO => VIRTUAL_FIFO_EVENTS.get(idx).copied(),
        class::SATA_PHY_LINK => SATA_PHY_LINK_EVENTS.get(idx).copied(),
        class::SATA_TRANSPORT => SATA_TRANSPORT_EVENTS.get(idx).copied(),
        class::SAS_PHY_LINK => SAS_PHY_LINK_EVENTS.get(idx).copied(),
        class::SAS_TRANSPORT => SAS_TRANSPORT_EVENTS.get(idx).copied(),
        _ => None,
    }
}

/// Resolve an event id within a class. Returns `None` only for the
/// Statistic Snapshot class, whose events have no id of their own. The id
/// stays in raw byte order for the device-map lookup.
pub fn event_id_name(dbg_class: u8, id: [u8; 2], tables: &StringTables) -> Option<String> {
    if dbg_class == class::STATISTIC_SNAP {
        return None;
    }
    let event_id = events::event_id_u16(id);
    if let Some(name) = builtin_event_name(dbg_class, event_id) {
        return Some(name.to_string());
    }
    if let Some(name) = tables.event_name(dbg_class, id) {
        return Some(name);
    }
    Some(if event_id >= VU_EVENT_BASE {
        "Vendor Unique ID".to_string()
    } else {
        "Reserved ID".to_string()
    })
}

/// Display name for a debug event class.
pub fn event_class_name(dbg_class: u8) -> String {
    match dbg_class {
        class::TIMESTAMP => "Timestamp Class".to_string(),
        class::RESET => "Reset Class".to_string(),
        class::BOOT_SEQ => "Boot Sequence Class".to_string(),
        class::FIRMWARE_ASSERT => "Firmware Assert Class".to_string(),
        class::TEMPERATURE => "Temperature Class".to_string(),
        class::MEDIA => "Media Class".to_string(),
        class::MEDIA_WEAR => "Media Wear Class".to_string(),
        class::STATISTIC_SNAP => "Statistic Snapshot Class".to_string(),
        class::VIRTUAL_FIFO => "Virtual FIFO Event Class".to_string(),
        class::SATA_PHY_LINK => "SATA Phy/Link Class".to_string(),
        class::SATA_TRANSPORT => "SATA Transport Class".to_string(),
        class::SAS_PHY_LINK => "SAS Phy/Link Class".to_string(),
        class::SAS_TRANSPORT => "SAS Transport Class".to_string(),
        other if other < class::VENDOR_UNIQUE => format!("Unknown Class {other:02x}"),
        other => format!("Vendor Unique Class {other:02x}"),
    }
}

/// Display name for a unit code.
pub fn unit_name(unit: u8) -> &'static str {
    UNIT_NAMES.get(usize::from(unit)).copied().unwrap_or("Reserved")
}

/// Display name for a statistic type.
pub fn stat_type_name(stat_type: StatType) -> &'static str {
    match stat_type {
        StatType::Single => "Single",
        StatType::Array => "Array",
        StatType::Custom => "Custom",
    }
}

/// Display name for a behavior code (info\[0\] low nibble).
pub fn behavior_name(behavior: u8) -> &'static str {
    match behavior {
        0x0 => "N/A",
        0x1 => "Runtime Value",
        0x2 => "Reset Persistent, Power Cycle Resistent",
        0x3 => "Saturating Counter, Reset Persistent",
        0x4 => "Saturating Counter, Reset Persistent, Power Cycle Resistent",
        0x5 => "Saturating Counter",
        0x6 => "Reset Persistent",
        _ => "Reserved",
    }
}

/// Display name for a host hint code (info\[2\] bits 5:4).
pub fn host_hint_name(hint: u8) -> &'static str {
    match hint {
        0x0 => "No Host Hint",
        0x1 => "Host Hint Type 1",
        _ => "Reserved",
    }
}

/// Display name for a data type.
pub fn data_type_name(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Na => "No Data Type Information",
        DataType::Int => "Signed Integer",
        DataType::Uint => "Unsigned Integer",
        DataType::Fp => "Floating Point",
        DataType::Ascii => "ASCII (7-bit)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::{StatIdEntry, StringTables};

    fn tables_with(id: u16, name: &str) -> StringTables {
        let mut tables = StringTables::default();
        tables.ascii_pool.extend_from_slice(name.as_bytes());
        tables.stat_ids.insert(
            id,
            StatIdEntry {
                ascii_len: name.len() as u8,
                ascii_offset: 0,
            },
        );
        tables
    }

    #[test]
    fn test_builtin_statistic_names() {
        let tables = StringTables::default();
        assert_eq!(stat_id_name(0x2003, &tables), "Power-on Hours Count");
        assert_eq!(stat_id_name(0x6006, &tables), "Spinup Times");
        assert_eq!(stat_id_name(0x0002, &tables), "ATA Log");
    }

    #[test]
    fn test_unassigned_low_ids_are_reserved_even_if_device_defines_them() {
        // A device entry below 0x8000 must never be consulted.
        let tables = tables_with(0x7fff, "Bogus");
        assert_eq!(stat_id_name(0x7fff, &tables), "Reserved ID");
    }

    #[test]
    fn test_vendor_statistic_resolution_and_fallback() {
        let tables = tables_with(0x8123, "Widget Count");
        assert_eq!(stat_id_name(0x8123, &tables), "Widget Count");
        assert_eq!(stat_id_name(0x8124, &tables), "Vendor Unique ID");
    }

    #[test]
    fn test_boot_sequence_has_two_ranges() {
        let tables = StringTables::default();
        assert_eq!(
            event_id_name(0x05, [0x00, 0x00], &tables).unwrap(),
            "Main Firmware Boot Complete"
        );
        assert_eq!(
            event_id_name(0x05, [0x03, 0x00], &tables).unwrap(),
            "FTL Ready"
        );
        assert_eq!(
            event_id_name(0x05, [0x01, 0x01], &tables).unwrap(),
            "Spin-up Start"
        );
        // the gap between the ranges is reserved
        assert_eq!(
            event_id_name(0x05, [0x04, 0x00], &tables).unwrap(),
            "Reserved ID"
        );
        assert_eq!(
            event_id_name(0x05, [0x04, 0x01], &tables).unwrap(),
            "Reserved ID"
        );
    }

    #[test]
    fn test_event_id_fallbacks() {
        let tables = StringTables::default();
        assert_eq!(
            event_id_name(0x01, [0x00, 0x00], &tables).unwrap(),
            "Host Initiated Timestamp"
        );
        assert_eq!(
            event_id_name(0x01, [0x34, 0x12], &tables).unwrap(),
            "Reserved ID"
        );
        assert_eq!(
            event_id_name(0x01, [0x00, 0x80], &tables).unwrap(),
            "Vendor Unique ID"
        );
        assert_eq!(event_id_name(0x0a, [0x00, 0x00], &tables), None);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(event_class_name(0x01), "Timestamp Class");
        assert_eq!(event_class_name(0x0f), "SAS Transport Class");
        assert_eq!(event_class_name(0x42), "Unknown Class 42");
        assert_eq!(event_class_name(0x93), "Vendor Unique Class 93");
    }

    #[test]
    fn test_unit_names_bounded() {
        assert_eq!(unit_name(0x00), "N/A");
        assert_eq!(unit_name(0x0f), "RPM");
        assert_eq!(unit_name(0x12), "angstroms");
        assert_eq!(unit_name(0x13), "Reserved");
    }
}
