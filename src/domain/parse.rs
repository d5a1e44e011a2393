//! Parsers for the text and JSON output of the catalog commands.
//!
//! Every parser is total: malformed input maps to zero or `None`, never to an
//! error, so a single bad command cannot abort a collection pass.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::snapshot::{DiskUsage, LoadAverage, MemoryUsage};

const BLOCK_BYTES: f64 = 1024.0;
const GIB: f64 = 1_073_741_824.0;

/// Known sensor chips, checked before the generic scan.
const KNOWN_TEMPERATURE_SENSORS: &[&str] = &[
    // Raspberry Pi SoC
    "/cpu_thermal-virtual-0/temp1/temp1_input",
    // AMD Zen
    "/k10temp-pci-00c3/Tctl/temp1_input",
];

static DU_LEADING_BLOCKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+").expect("valid du pattern"));

static THREE_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9.]+)\s+([0-9.]+)\s+([0-9.]+)").expect("valid load pattern")
});

static LOAD_AVERAGE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"load averages?:\s*([0-9.]+),?\s+([0-9.]+),?\s+([0-9.]+)")
        .expect("valid load average pattern")
});

static TEMP_INPUT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^temp\d+_input$").expect("valid sensor key pattern"));

/// Convert a count of 1024-byte blocks to whole gigabytes.
pub fn blocks_to_gb(blocks: u64) -> u64 {
    ((blocks as f64 * BLOCK_BYTES) / GIB).round() as u64
}

fn device_line(output: &str) -> Option<Vec<&str>> {
    output
        .lines()
        .find(|l| l.contains("/dev/"))
        .map(|l| l.split_whitespace().collect())
}

fn parse_percent(token: &str) -> u8 {
    token
        .trim_end_matches('%')
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
        .unwrap_or(0)
}

/// `df -k` output: the `/dev/` line's total, used and percent columns.
pub fn parse_df(output: &str) -> DiskUsage {
    let fields = device_line(output).unwrap_or_default();
    let blocks = |idx: usize| {
        fields
            .get(idx)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0)
    };

    let total_gb = blocks_to_gb(blocks(1));
    let used_gb = blocks_to_gb(blocks(2)).min(total_gb);

    DiskUsage {
        total_gb,
        used_gb,
        use_percent: fields.get(4).map(|s| parse_percent(s)).unwrap_or(0),
    }
}

/// Only the percent column of `df -k`. `None` when there is no `/dev/` line
/// or the line is too short to carry a percent column.
pub fn parse_df_percent(output: &str) -> Option<u8> {
    let fields = device_line(output)?;
    if fields.len() > 4 {
        Some(parse_percent(fields[4]))
    } else {
        None
    }
}

/// `du -sk` output: `<blocks>\t<path>`.
pub fn parse_du(output: &str) -> u64 {
    DU_LEADING_BLOCKS
        .captures(output.trim())
        .and_then(|c| c[1].parse::<u64>().ok())
        .map(blocks_to_gb)
        .unwrap_or(0)
}

pub fn parse_file_count(output: &str) -> u64 {
    output.trim().parse().unwrap_or(0)
}

/// Age in seconds of the newest file, given `<unix-ts> <path>` output and the
/// current Unix time.
pub fn parse_newest_age(output: &str, now_secs: f64) -> Option<u64> {
    let ts: f64 = output.split_whitespace().next()?.parse().ok()?;
    if !ts.is_finite() {
        return None;
    }
    Some((now_secs - ts).round().max(0.0) as u64)
}

/// Whole seconds of uptime. Accepts a bare integer or `/proc/uptime` as-is.
pub fn parse_uptime(output: &str) -> Option<u64> {
    let first = output.split_whitespace().next()?;
    first.parse::<u64>().ok().or_else(|| {
        first
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.trunc() as u64)
    })
}

/// The first three whitespace-separated numbers anywhere in the text
/// (`/proc/loadavg`), falling back to `uptime`'s comma-separated
/// `load average:` list.
pub fn parse_load(output: &str) -> LoadAverage {
    let captures = THREE_NUMBERS
        .captures(output)
        .or_else(|| LOAD_AVERAGE_LIST.captures(output));

    match captures {
        Some(c) => LoadAverage {
            one: c[1].parse().ok(),
            five: c[2].parse().ok(),
            fifteen: c[3].parse().ok(),
        },
        None => LoadAverage::default(),
    }
}

/// `sensors -j` output. Known chips first, then the first numeric
/// `temp<N>_input` in document order.
pub fn parse_temperature(output: &str) -> Option<f64> {
    let doc: Value = serde_json::from_str(output).ok()?;

    KNOWN_TEMPERATURE_SENSORS
        .iter()
        .find_map(|pointer| doc.pointer(pointer).and_then(Value::as_f64))
        .or_else(|| scan_temperature(&doc))
}

fn children(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

fn scan_temperature(doc: &Value) -> Option<f64> {
    for chip in children(doc) {
        for feature in children(chip) {
            let Value::Object(fields) = feature else {
                continue;
            };
            for (key, value) in fields {
                if TEMP_INPUT_KEY.is_match(key) {
                    if let Some(celsius) = value.as_f64() {
                        return Some(celsius);
                    }
                }
            }
        }
    }
    None
}

/// `free -k` output: the `Mem:` line's total and used columns.
pub fn parse_memory(output: &str) -> MemoryUsage {
    let fields: Vec<&str> = output
        .lines()
        .find(|l| l.starts_with("Mem:"))
        .map(|l| l.split_whitespace().collect())
        .unwrap_or_default();
    let kib = |idx: usize| {
        fields
            .get(idx)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0)
    };

    let total_gb = blocks_to_gb(kib(1));
    let used_gb = blocks_to_gb(kib(2));
    let used_percent = if total_gb == 0 {
        0
    } else {
        ((used_gb as f64 / total_gb as f64) * 100.0).round().min(100.0) as u8
    };

    MemoryUsage {
        total_gb,
        used_gb,
        used_percent,
    }
}

/// Battery charge in percent. Readings above 100 are treated as absent.
pub fn parse_battery(output: &str) -> Option<u8> {
    output
        .trim()
        .trim_end_matches('%')
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DF_ROOT: &str = "Filesystem     1K-blocks     Used Available Use% Mounted on\n/dev/mmcblk0p2  30358348  7654321  21403080  27% /\n";

    #[test]
    fn df_reads_device_line() {
        let usage = parse_df(DF_ROOT);
        assert_eq!(usage.total_gb, 29);
        assert_eq!(usage.used_gb, 7);
        assert_eq!(usage.use_percent, 27);
    }

    #[test]
    fn df_without_device_line_is_zero() {
        let overlay = "Filesystem 1K-blocks Used Available Use% Mounted on\noverlay 1000 10 990 1% /\n";
        assert_eq!(parse_df(overlay), DiskUsage::default());
        assert_eq!(parse_df(""), DiskUsage::default());
    }

    #[test]
    fn df_malformed_device_line_is_zero() {
        assert_eq!(parse_df("/dev/sda1 lots some ??%"), DiskUsage::default());
        assert_eq!(parse_df("/dev/sda1"), DiskUsage::default());
    }

    #[test]
    fn df_percent_is_bounded() {
        let usage = parse_df("/dev/sda1 1048576 524288 524288 250% /");
        assert!(usage.use_percent <= 100);
        assert!(usage.used_gb <= usage.total_gb);
    }

    #[test]
    fn df_percent_needs_five_columns() {
        assert_eq!(parse_df_percent(DF_ROOT), Some(27));
        assert_eq!(parse_df_percent("/dev/sdb1 100 50 50 x /mnt"), Some(0));
        assert_eq!(parse_df_percent("/dev/sdb1 100 50 50"), None);
        assert_eq!(parse_df_percent("tmpfs 100 50 50 50% /run"), None);
    }

    #[test]
    fn du_reads_leading_blocks() {
        assert_eq!(parse_du("52428800\t/host/data1\n"), 50);
        assert_eq!(parse_du("1024 /host/data1"), 0);
        assert_eq!(parse_du("du: cannot access '/host/x'"), 0);
        assert_eq!(parse_du(""), 0);
    }

    #[test]
    fn file_count_defaults_to_zero() {
        assert_eq!(parse_file_count("  1542\n"), 1542);
        assert_eq!(parse_file_count(""), 0);
        assert_eq!(parse_file_count("n/a"), 0);
    }

    #[test]
    fn newest_age_from_timestamp() {
        let out = "1700000000.7500000000 /host/data1/cam/img_001.jpg\n";
        assert_eq!(parse_newest_age(out, 1_700_000_100.0), Some(99));
        assert_eq!(parse_newest_age(out, 1_699_999_000.0), Some(0));
        assert_eq!(parse_newest_age("", 1_700_000_100.0), None);
        assert_eq!(parse_newest_age("garbage here", 1_700_000_100.0), None);
    }

    #[test]
    fn uptime_accepts_integer_and_proc_format() {
        assert_eq!(parse_uptime("354862\n"), Some(354_862));
        assert_eq!(parse_uptime("354862.31 1401234.56\n"), Some(354_862));
        assert_eq!(parse_uptime(""), None);
        assert_eq!(parse_uptime("up 3 days"), None);
    }

    #[test]
    fn load_from_proc_loadavg() {
        let load = parse_load("0.52 0.58 0.59 1/289 12345\n");
        assert_eq!(load.one, Some(0.52));
        assert_eq!(load.five, Some(0.58));
        assert_eq!(load.fifteen, Some(0.59));
    }

    #[test]
    fn load_from_verbose_uptime() {
        let busybox = " 10:15:02 up 11 days,  5:03,  load average: 1.05 0.70 0.33";
        let load = parse_load(busybox);
        assert_eq!(load.one, Some(1.05));
        assert_eq!(load.fifteen, Some(0.33));

        let procps = " 10:15:02 up 11 days,  5:03,  2 users,  load average: 0.08, 0.03, 0.01";
        let load = parse_load(procps);
        assert_eq!(load.one, Some(0.08));
        assert_eq!(load.five, Some(0.03));
        assert_eq!(load.fifteen, Some(0.01));
    }

    #[test]
    fn load_without_numbers_is_absent() {
        assert_eq!(parse_load(""), LoadAverage::default());
        assert_eq!(parse_load("command not found"), LoadAverage::default());
    }

    #[test]
    fn temperature_prefers_raspberry_pi_chip() {
        let json = r#"{
            "acpitz-acpi-0": {"Adapter": "ACPI interface", "temp1": {"temp1_input": 27.8}},
            "cpu_thermal-virtual-0": {"Adapter": "Virtual device", "temp1": {"temp1_input": 51.121}}
        }"#;
        assert_eq!(parse_temperature(json), Some(51.121));
    }

    #[test]
    fn temperature_uses_amd_chip() {
        let json = r#"{
            "nvme-pci-0100": {"Composite": {"temp1_input": 38.85}},
            "k10temp-pci-00c3": {"Adapter": "PCI adapter", "Tctl": {"temp1_input": 62.5}}
        }"#;
        assert_eq!(parse_temperature(json), Some(62.5));
    }

    #[test]
    fn temperature_falls_back_to_first_temp_input() {
        let json = r#"{
            "coretemp-isa-0000": {
                "Adapter": "ISA adapter",
                "Package id 0": {"temp1_input": 45.0, "temp1_max": 100.0},
                "Core 0": {"temp2_input": 43.0}
            }
        }"#;
        assert_eq!(parse_temperature(json), Some(45.0));
    }

    #[test]
    fn temperature_skips_non_numeric_fields() {
        let json = r#"{
            "cpu_thermal-virtual-0": {"temp1": {"temp1_input": "hot"}},
            "other-isa-0": {"temp1": {"temp1_input": null, "temp2_input": 33}}
        }"#;
        assert_eq!(parse_temperature(json), Some(33.0));
    }

    #[test]
    fn temperature_invalid_json_is_absent() {
        assert_eq!(parse_temperature(""), None);
        assert_eq!(parse_temperature("No sensors found!"), None);
        assert_eq!(parse_temperature("{}"), None);
        assert_eq!(parse_temperature("[1, 2, 3]"), None);
    }

    #[test]
    fn memory_percent_uses_rounded_gb() {
        let out = "               total        used        free      shared  buff/cache   available\nMem:         8000000     4000000     1000000      100000     3000000     3800000\nSwap:         102396           0      102396\n";
        let memory = parse_memory(out);
        assert_eq!(memory.total_gb, 8);
        assert_eq!(memory.used_gb, 4);
        assert_eq!(memory.used_percent, 50);
    }

    #[test]
    fn memory_zero_total_is_zero_percent() {
        assert_eq!(parse_memory(""), MemoryUsage::default());
        let small = parse_memory("Mem: 1000 500 500");
        assert_eq!(small.total_gb, 0);
        assert_eq!(small.used_percent, 0);
    }

    #[test]
    fn battery_parses_integer() {
        assert_eq!(parse_battery("87\n"), Some(87));
        assert_eq!(parse_battery("100%"), Some(100));
        assert_eq!(parse_battery(""), None);
        assert_eq!(parse_battery("Unknown"), None);
    }

    #[test]
    fn battery_above_full_is_absent() {
        assert_eq!(parse_battery("150"), None);
        assert_eq!(parse_battery("255\n"), None);
        assert_eq!(parse_battery("0"), Some(0));
    }
}
