//! Device Profiles
//!
//! **Fixed sampling ranges for every device/class combination.**
//!
//! Attack ranges are device-independent. DDoS and port scans run at or
//! above every normal `rate` range and at or below every normal `dur`
//! range; shared endpoints never coincide because samples are drawn from
//! `[low, high)`. Mirai overlaps normal traffic on `rate` and `dur` and is
//! told apart by its TTLs and packet volume.

use serde::{Deserialize, Serialize};

use super::types::{DeviceType, TrafficLabel};

/// Sampling range for one feature; samples fall in `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub low: f64,
    pub high: f64,
}

impl FeatureRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Per-feature ranges for one device/class combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub dur: FeatureRange,
    pub spkts: FeatureRange,
    pub dpkts: FeatureRange,
    pub sbytes: FeatureRange,
    pub dbytes: FeatureRange,
    pub rate: FeatureRange,
    pub sttl: FeatureRange,
    pub dttl: FeatureRange,
}

impl DeviceProfile {
    /// Ranges in feature layout order
    pub fn ranges(&self) -> [FeatureRange; 8] {
        [
            self.dur, self.spkts, self.dpkts, self.sbytes,
            self.dbytes, self.rate, self.sttl, self.dttl,
        ]
    }
}

const fn r(low: f64, high: f64) -> FeatureRange {
    FeatureRange::new(low, high)
}

// ============================================================================
// NORMAL PROFILES
// ============================================================================

const TTL_NORMAL: FeatureRange = r(64.0, 128.0);

pub const SMART_CAMERA: DeviceProfile = DeviceProfile {
    dur: r(1.0, 5.0),
    spkts: r(10.0, 50.0),
    dpkts: r(5.0, 30.0),
    sbytes: r(500.0, 2000.0),
    dbytes: r(300.0, 1500.0),
    rate: r(10.0, 100.0),
    sttl: TTL_NORMAL,
    dttl: TTL_NORMAL,
};

pub const SMART_THERMOSTAT: DeviceProfile = DeviceProfile {
    dur: r(0.5, 2.0),
    spkts: r(5.0, 20.0),
    dpkts: r(3.0, 15.0),
    sbytes: r(100.0, 500.0),
    dbytes: r(50.0, 300.0),
    rate: r(5.0, 30.0),
    sttl: TTL_NORMAL,
    dttl: TTL_NORMAL,
};

pub const SMART_LOCK: DeviceProfile = DeviceProfile {
    dur: r(0.1, 1.0),
    spkts: r(2.0, 10.0),
    dpkts: r(2.0, 8.0),
    sbytes: r(50.0, 200.0),
    dbytes: r(50.0, 150.0),
    rate: r(5.0, 20.0),
    sttl: TTL_NORMAL,
    dttl: TTL_NORMAL,
};

pub const SMART_SPEAKER: DeviceProfile = DeviceProfile {
    dur: r(2.0, 10.0),
    spkts: r(20.0, 100.0),
    dpkts: r(15.0, 80.0),
    sbytes: r(1000.0, 5000.0),
    dbytes: r(800.0, 4000.0),
    rate: r(20.0, 200.0),
    sttl: TTL_NORMAL,
    dttl: TTL_NORMAL,
};

pub const SMART_LIGHT: DeviceProfile = DeviceProfile {
    dur: r(0.1, 0.5),
    spkts: r(1.0, 5.0),
    dpkts: r(1.0, 3.0),
    sbytes: r(20.0, 100.0),
    dbytes: r(20.0, 80.0),
    rate: r(2.0, 10.0),
    sttl: TTL_NORMAL,
    dttl: TTL_NORMAL,
};

// ============================================================================
// ATTACK PROFILES
// ============================================================================

/// Very short floods with a high source packet rate and low TTL
pub const DDOS: DeviceProfile = DeviceProfile {
    dur: r(0.01, 0.1),
    spkts: r(100.0, 500.0),
    dpkts: r(5.0, 20.0),
    sbytes: r(5000.0, 20000.0),
    dbytes: r(50.0, 200.0),
    rate: r(500.0, 2000.0),
    sttl: r(32.0, 64.0),
    dttl: r(32.0, 64.0),
};

/// Minimal payload, high rate, almost no replies
pub const PORT_SCAN: DeviceProfile = DeviceProfile {
    dur: r(0.01, 0.05),
    spkts: r(1.0, 3.0),
    dpkts: r(0.0, 2.0),
    sbytes: r(20.0, 100.0),
    dbytes: r(0.0, 50.0),
    rate: r(200.0, 500.0),
    sttl: r(64.0, 128.0),
    dttl: r(64.0, 128.0),
};

/// Sustained bidirectional C2/propagation chatter
pub const MIRAI: DeviceProfile = DeviceProfile {
    dur: r(0.5, 2.0),
    spkts: r(50.0, 200.0),
    dpkts: r(40.0, 180.0),
    sbytes: r(2000.0, 10000.0),
    dbytes: r(1500.0, 8000.0),
    rate: r(100.0, 400.0),
    sttl: r(48.0, 64.0),
    dttl: r(48.0, 64.0),
};

// ============================================================================
// LOOKUP
// ============================================================================

/// Normal-traffic profile of a device
pub fn normal_profile(device: DeviceType) -> &'static DeviceProfile {
    match device {
        DeviceType::SmartCamera => &SMART_CAMERA,
        DeviceType::SmartThermostat => &SMART_THERMOSTAT,
        DeviceType::SmartLock => &SMART_LOCK,
        DeviceType::SmartSpeaker => &SMART_SPEAKER,
        DeviceType::SmartLight => &SMART_LIGHT,
    }
}

/// Profile that generates records of `label` for `device`
pub fn profile_for(device: DeviceType, label: TrafficLabel) -> &'static DeviceProfile {
    match label {
        TrafficLabel::Benign => normal_profile(device),
        TrafficLabel::DDoS => &DDOS,
        TrafficLabel::PortScan => &PORT_SCAN,
        TrafficLabel::Mirai => &MIRAI,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ranges_are_ordered() {
        for device in DeviceType::ALL {
            for label in TrafficLabel::ALL {
                for range in profile_for(device, label).ranges() {
                    assert!(range.low < range.high, "{device} / {label}: {range:?}");
                }
            }
        }
    }

    #[test]
    fn test_attack_profiles_are_device_independent() {
        for label in TrafficLabel::ATTACKS {
            let first = profile_for(DeviceType::SmartCamera, label);
            for device in DeviceType::ALL {
                assert_eq!(profile_for(device, label), first);
            }
        }
    }

    #[test]
    fn test_flood_and_scan_rates_clear_normal_traffic() {
        for device in DeviceType::ALL {
            let normal = normal_profile(device);
            assert!(DDOS.rate.low > normal.rate.high, "{device}");
            assert!(PORT_SCAN.rate.low >= normal.rate.high, "{device}");
        }
    }

    #[test]
    fn test_flood_and_scan_durations_below_normal_traffic() {
        for device in DeviceType::ALL {
            let normal = normal_profile(device);
            for attack in [&DDOS, &PORT_SCAN] {
                assert!(attack.dur.high <= normal.dur.low, "{device}: {:?}", attack.dur);
            }
        }
    }

    #[test]
    fn test_mirai_ttl_below_normal_ttl() {
        for device in DeviceType::ALL {
            let normal = normal_profile(device);
            assert!(MIRAI.sttl.high <= normal.sttl.low);
            assert!(MIRAI.dttl.high <= normal.dttl.low);
        }
    }

    #[test]
    fn test_range_contains_is_closed() {
        let range = FeatureRange::new(1.0, 2.0);
        assert!(range.contains(1.0));
        assert!(range.contains(2.0));
        assert!(!range.contains(2.0001));
    }
}
