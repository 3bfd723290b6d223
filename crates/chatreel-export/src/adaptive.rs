// SPDX-FileCopyrightText: 2026 Chatreel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device-aware downgrades applied before capture starts.
//!
//! A [`DeviceProfile`] is classified into a [`DeviceTier`]; constrained and
//! minimal tiers cap quality, frame rate and scale. Caps only ever lower a
//! value, and every change is recorded as an [`Adjustment`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use sysinfo::System;
use tracing::debug;

use crate::options::CaptureOptions;

const GIB: u64 = 1024 * 1024 * 1024;

/// Effective network class, in the browser's `effectiveType` vocabulary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum NetworkClass {
    #[strum(serialize = "slow-2g")]
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[strum(serialize = "2g")]
    #[serde(rename = "2g")]
    TwoG,
    #[strum(serialize = "3g")]
    #[serde(rename = "3g")]
    ThreeG,
    #[strum(serialize = "4g")]
    #[serde(rename = "4g")]
    FourG,
    #[default]
    #[strum(serialize = "unknown")]
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviceTier {
    Capable,
    Constrained,
    Minimal,
}

/// Upper bounds a tier imposes on capture options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierCaps {
    pub quality: f32,
    pub frame_rate: u32,
    pub scale: f32,
}

impl DeviceTier {
    pub fn caps(self) -> Option<TierCaps> {
        match self {
            DeviceTier::Capable => None,
            DeviceTier::Constrained => Some(TierCaps {
                quality: 0.6,
                frame_rate: 12,
                scale: 1.0,
            }),
            DeviceTier::Minimal => Some(TierCaps {
                quality: 0.4,
                frame_rate: 8,
                scale: 0.75,
            }),
        }
    }
}

/// Signals used to judge how much work the device can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub cpu_cores: usize,
    pub total_memory_bytes: u64,
    pub network: NetworkClass,
    /// User asked for reduced data usage.
    pub save_data: bool,
}

impl DeviceProfile {
    pub fn new(cpu_cores: usize, total_memory_bytes: u64) -> Self {
        Self {
            cpu_cores,
            total_memory_bytes,
            network: NetworkClass::Unknown,
            save_data: false,
        }
    }

    /// A profile that never triggers a downgrade.
    pub fn unconstrained() -> Self {
        Self::new(usize::MAX, u64::MAX)
    }

    /// Read core count and total memory from the host.
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let profile = Self::new(cores, system.total_memory());
        debug!(
            cpu_cores = profile.cpu_cores,
            total_memory_mb = profile.total_memory_bytes / (1024 * 1024),
            tier = %profile.tier(),
            "device profile detected"
        );
        profile
    }

    pub fn with_network(mut self, network: NetworkClass) -> Self {
        self.network = network;
        self
    }

    pub fn with_save_data(mut self, save_data: bool) -> Self {
        self.save_data = save_data;
        self
    }

    pub fn tier(&self) -> DeviceTier {
        let slow_network = matches!(self.network, NetworkClass::Slow2g | NetworkClass::TwoG);
        if self.save_data
            || slow_network
            || self.cpu_cores <= 2
            || self.total_memory_bytes < 2 * GIB
        {
            return DeviceTier::Minimal;
        }
        if self.network == NetworkClass::ThreeG
            || self.cpu_cores <= 4
            || self.total_memory_bytes < 4 * GIB
        {
            return DeviceTier::Constrained;
        }
        DeviceTier::Capable
    }
}

/// One option lowered by [`adapt`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub field: &'static str,
    pub from: f64,
    pub to: f64,
}

/// Cap `options` for `profile`. Returns the effective options and what changed.
pub fn adapt(options: CaptureOptions, profile: &DeviceProfile) -> (CaptureOptions, Vec<Adjustment>) {
    let tier = profile.tier();
    let Some(caps) = tier.caps() else {
        return (options, Vec::new());
    };

    let mut effective = options;
    let mut adjustments = Vec::new();
    if effective.quality > caps.quality {
        adjustments.push(Adjustment {
            field: "quality",
            from: f64::from(effective.quality),
            to: f64::from(caps.quality),
        });
        effective.quality = caps.quality;
    }
    if effective.frame_rate > caps.frame_rate {
        adjustments.push(Adjustment {
            field: "frame_rate",
            from: f64::from(effective.frame_rate),
            to: f64::from(caps.frame_rate),
        });
        effective.frame_rate = caps.frame_rate;
    }
    if effective.scale > caps.scale {
        adjustments.push(Adjustment {
            field: "scale",
            from: f64::from(effective.scale),
            to: f64::from(caps.scale),
        });
        effective.scale = caps.scale;
    }

    if !adjustments.is_empty() {
        debug!(%tier, changes = adjustments.len(), "capture options downgraded");
    }
    (effective, adjustments)
}
