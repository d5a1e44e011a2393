use anyhow::{bail, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

/// Coarse hardware class of the probed host. Selects the catalog entry used
/// for identity files and class-specific commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemClass {
    RaspberryPi,
    X86,
    Virtual,
    Unknown,
}

impl FromStr for SystemClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raspberrypi" => Ok(SystemClass::RaspberryPi),
            "x86" => Ok(SystemClass::X86),
            "virtual" => Ok(SystemClass::Virtual),
            "unknown" => Ok(SystemClass::Unknown),
            other => bail!(
                "unknown system type '{}' (expected 'raspberrypi', 'x86', 'virtual' or 'unknown')",
                other
            ),
        }
    }
}

impl fmt::Display for SystemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemClass::RaspberryPi => write!(f, "raspberrypi"),
            SystemClass::X86 => write!(f, "x86"),
            SystemClass::Virtual => write!(f, "virtual"),
            SystemClass::Unknown => write!(f, "unknown"),
        }
    }
}

// Checked in order; the first pattern that matches decides the class, even
// when a later pattern would also match.
const CLASS_MARKERS: &[(&str, SystemClass)] = &[
    (r"(?i)Raspberry Pi", SystemClass::RaspberryPi),
    (r"(?i)ARMv|AArch|BCM|Cortex|Hardware\s*:\s*BCM", SystemClass::RaspberryPi),
    (
        r"(?i)GenuineIntel|AuthenticAMD|model name\s*:.*Intel|model name\s*:.*AMD",
        SystemClass::X86,
    ),
    (
        r"(?i)QEMU|KVM|VirtualBox|VMware|Microsoft Hv|Hyper-V|Xen",
        SystemClass::Virtual,
    ),
];

static MARKERS: LazyLock<Vec<(Regex, SystemClass)>> = LazyLock::new(|| {
    CLASS_MARKERS
        .iter()
        .map(|(pattern, class)| {
            let re = Regex::new(pattern).expect("class marker patterns are valid regexes");
            (re, *class)
        })
        .collect()
});

/// Classify a CPU description (the contents of `/proc/cpuinfo`).
pub fn classify(cpuinfo: &str) -> SystemClass {
    MARKERS
        .iter()
        .find(|(re, _)| re.is_match(cpuinfo))
        .map(|(_, class)| *class)
        .unwrap_or(SystemClass::Unknown)
}

/// Read the CPU description at `cpuinfo_path` and classify it. An unreadable
/// file yields [`SystemClass::Unknown`].
pub fn detect(cpuinfo_path: &Path) -> SystemClass {
    match std::fs::read_to_string(cpuinfo_path) {
        Ok(cpuinfo) => {
            let class = classify(&cpuinfo);
            debug!(path = %cpuinfo_path.display(), class = %class, "classified host");
            class
        }
        Err(e) => {
            debug!(path = %cpuinfo_path.display(), error = %e, "cpu description unreadable");
            SystemClass::Unknown
        }
    }
}

/// Resolve the class for this run: a configured override wins over detection.
pub fn resolve(override_class: Option<SystemClass>, cpuinfo_path: &Path) -> SystemClass {
    match override_class {
        Some(class) => {
            debug!(class = %class, "using configured system type");
            class
        }
        None => detect(cpuinfo_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI4_CPUINFO: &str = "processor\t: 0\nBogoMIPS\t: 108.00\nFeatures\t: fp asimd evtstrm crc32 cpuid\nCPU implementer\t: 0x41\n\nHardware\t: BCM2711\nRevision\t: c03111\nSerial\t\t: 10000000abcdef01\nModel\t\t: Raspberry Pi 4 Model B Rev 1.1\n";

    const INTEL_CPUINFO: &str = "processor\t: 0\nvendor_id\t: GenuineIntel\ncpu family\t: 6\nmodel\t\t: 142\nmodel name\t: Intel(R) Core(TM) i7-8650U CPU @ 1.90GHz\n";

    #[test]
    fn raspberry_pi_literal_wins() {
        assert_eq!(classify(PI4_CPUINFO), SystemClass::RaspberryPi);
    }

    #[test]
    fn broadcom_soc_is_raspberry_pi() {
        assert_eq!(classify("Hardware : BCM2711"), SystemClass::RaspberryPi);
        assert_eq!(classify("bcm2711"), SystemClass::RaspberryPi);
    }

    #[test]
    fn generic_arm_is_raspberry_pi() {
        assert_eq!(
            classify("model name\t: ARMv7 Processor rev 4 (v7l)"),
            SystemClass::RaspberryPi
        );
        assert_eq!(classify("CPU part : Cortex-A72"), SystemClass::RaspberryPi);
    }

    #[test]
    fn intel_and_amd_are_x86() {
        assert_eq!(classify(INTEL_CPUINFO), SystemClass::X86);
        assert_eq!(classify("vendor_id : AuthenticAMD"), SystemClass::X86);
        assert_eq!(
            classify("model name : AMD Ryzen 7 5800X 8-Core Processor"),
            SystemClass::X86
        );
    }

    #[test]
    fn hypervisors_are_virtual() {
        assert_eq!(
            classify("model name : QEMU Virtual CPU version 2.5+"),
            SystemClass::Virtual
        );
        assert_eq!(classify("hypervisor vendor: VMware"), SystemClass::Virtual);
        assert_eq!(classify("Microsoft Hv"), SystemClass::Virtual);
        assert_eq!(classify("hypervisor vendor : Hyper-V"), SystemClass::Virtual);
        assert_eq!(classify("hypervisor vendor : Xen"), SystemClass::Virtual);
        assert_eq!(classify("model name : Common KVM processor"), SystemClass::Virtual);
    }

    #[test]
    fn priority_order_is_first_match() {
        // ARM marker outranks an x86 vendor string.
        assert_eq!(
            classify("vendor_id : GenuineIntel\nCPU part : Cortex-A53"),
            SystemClass::RaspberryPi
        );
        // x86 vendor outranks a hypervisor marker.
        assert_eq!(
            classify("vendor_id : GenuineIntel\nmodel name : QEMU Virtual CPU"),
            SystemClass::X86
        );
    }

    #[test]
    fn empty_or_unrecognized_is_unknown() {
        assert_eq!(classify(""), SystemClass::Unknown);
        assert_eq!(classify("processor : 0\nisa : rv64imafdc"), SystemClass::Unknown);
    }

    #[test]
    fn missing_cpuinfo_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect(&dir.path().join("cpuinfo")), SystemClass::Unknown);
    }

    #[test]
    fn override_skips_detection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpuinfo");
        std::fs::write(&path, INTEL_CPUINFO).unwrap();
        assert_eq!(resolve(None, &path), SystemClass::X86);
        assert_eq!(
            resolve(Some(SystemClass::Virtual), &path),
            SystemClass::Virtual
        );
    }

    #[test]
    fn parses_and_displays_class_names() {
        for class in [
            SystemClass::RaspberryPi,
            SystemClass::X86,
            SystemClass::Virtual,
            SystemClass::Unknown,
        ] {
            assert_eq!(class.to_string().parse::<SystemClass>().unwrap(), class);
        }
        assert!("arm64".parse::<SystemClass>().is_err());
    }
}
