//! Traffic Module - Synthetic IoT Flow Generation
//!
//! Device/attack profiles and the seeded simulator that samples them.

pub mod types;
pub mod profile;
pub mod simulator;


// Re-export common types
pub use types::{DeviceType, ProfileError, TrafficLabel, TrafficRecord};
pub use profile::{DeviceProfile, FeatureRange};
pub use simulator::TrafficSimulator;
