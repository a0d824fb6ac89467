//! Traffic Simulator
//!
//! Draws synthetic flow records from the fixed device/attack profiles.
//! Each feature is sampled independently and uniformly from its range;
//! integer features are truncated toward zero.
//!
//! Seeded simulators also run on a simulated clock: records are stamped
//! from a fixed start instant, each one `dur` seconds after the previous,
//! so the same seed writes the same CSV bytes.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::profile::{profile_for, DeviceProfile, FeatureRange};
use super::types::{DeviceType, ProfileError, TrafficLabel, TrafficRecord};

/// Start of the simulated clock (2024-01-01T00:00:00Z)
const SIMULATION_START_SECS: i64 = 1_704_067_200;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Clock {
    Wall,
    Simulated(DateTime<Utc>),
}

/// Synthetic flow generator.
///
/// Two simulators built with the same seed produce identical records,
/// timestamps included, for the same call sequence.
#[derive(Debug, Clone)]
pub struct TrafficSimulator {
    rng: StdRng,
    clock: Clock,
}

impl TrafficSimulator {
    /// Simulator seeded from OS entropy, stamping records with the wall clock
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            clock: Clock::Wall,
        }
    }

    /// Reproducible simulator on the simulated clock
    pub fn with_seed(seed: u64) -> Self {
        let start = DateTime::<Utc>::default() + Duration::seconds(SIMULATION_START_SECS);
        Self::with_seed_at(seed, start)
    }

    /// Reproducible simulator whose first record is stamped `start`
    pub fn with_seed_at(seed: u64, start: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            clock: Clock::Simulated(start),
        }
    }

    // ========================================================================
    // PER-CLASS GENERATORS
    // ========================================================================

    /// `n` benign records drawn from the device's normal profile
    pub fn generate_normal(&mut self, device: &str, n: usize) -> Result<Vec<TrafficRecord>, ProfileError> {
        let device = device.parse()?;
        Ok(self.generate(device, TrafficLabel::Benign, n))
    }

    pub fn generate_ddos(&mut self, device: &str, n: usize) -> Result<Vec<TrafficRecord>, ProfileError> {
        let device = device.parse()?;
        Ok(self.generate(device, TrafficLabel::DDoS, n))
    }

    pub fn generate_port_scan(&mut self, device: &str, n: usize) -> Result<Vec<TrafficRecord>, ProfileError> {
        let device = device.parse()?;
        Ok(self.generate(device, TrafficLabel::PortScan, n))
    }

    pub fn generate_mirai(&mut self, device: &str, n: usize) -> Result<Vec<TrafficRecord>, ProfileError> {
        let device = device.parse()?;
        Ok(self.generate(device, TrafficLabel::Mirai, n))
    }

    /// `n` records of class `label` tagged with `device`
    pub fn generate(&mut self, device: DeviceType, label: TrafficLabel, n: usize) -> Vec<TrafficRecord> {
        let profile = profile_for(device, label);
        (0..n).map(|_| self.sample(device, label, profile)).collect()
    }

    // ========================================================================
    // STREAMING
    // ========================================================================

    /// One record for a random device; an attack of a random class with
    /// probability `attack_probability`, benign otherwise.
    pub fn random_event(&mut self, attack_probability: f64) -> Result<TrafficRecord, ProfileError> {
        if !(0.0..=1.0).contains(&attack_probability) {
            return Err(ProfileError::InvalidProbability(attack_probability));
        }

        let device = *DeviceType::ALL
            .choose(&mut self.rng)
            .unwrap_or(&DeviceType::SmartCamera);

        let label = if self.rng.gen_bool(attack_probability) {
            *TrafficLabel::ATTACKS
                .choose(&mut self.rng)
                .unwrap_or(&TrafficLabel::DDoS)
        } else {
            TrafficLabel::Benign
        };

        let profile = profile_for(device, label);
        Ok(self.sample(device, label, profile))
    }

    // ========================================================================
    // SAMPLING
    // ========================================================================

    fn sample(&mut self, device: DeviceType, label: TrafficLabel, profile: &DeviceProfile) -> TrafficRecord {
        let dur = self.uniform(profile.dur);
        TrafficRecord {
            timestamp: self.tick(dur),
            device,
            dur,
            spkts: self.uniform(profile.spkts) as u32,
            dpkts: self.uniform(profile.dpkts) as u32,
            sbytes: self.uniform(profile.sbytes) as u64,
            dbytes: self.uniform(profile.dbytes) as u64,
            rate: self.uniform(profile.rate),
            sttl: self.uniform(profile.sttl) as u32,
            dttl: self.uniform(profile.dttl) as u32,
            label,
        }
    }

    /// Stamp for the next record; the simulated clock then advances by `dur`
    fn tick(&mut self, dur: f64) -> DateTime<Utc> {
        match &mut self.clock {
            Clock::Wall => Utc::now(),
            Clock::Simulated(now) => {
                let stamp = *now;
                *now = stamp + Duration::microseconds((dur * 1e6) as i64);
                stamp
            }
        }
    }

    fn uniform(&mut self, range: FeatureRange) -> f64 {
        self.rng.gen_range(range.low..range.high)
    }
}

impl Default for TrafficSimulator {
    fn default() -> Self {
        Self::new()
    }
}
