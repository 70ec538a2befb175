//! Peripheral channel: device-inventory diffing on top of the generic
//! observation pattern.
//!
//! Each poll takes a fresh inventory snapshot; every name not present in the
//! previous snapshot is a newly attached device and scores once. Detached
//! devices are forgotten so a re-attach scores again.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use vigil_core::{
    ChannelLog, GenericChannel, GenericChannelConfig, RiskChannel, VigilResult,
};

/// Inventory snapshot supplier (OS device listing or test fixture).
pub trait DeviceInventory: Send {
    fn snapshot(&mut self) -> VigilResult<Vec<String>>;
}

/// Inventory over the entries of a device directory (`/dev/input` by
/// default). Unreadable directories yield an empty snapshot.
pub struct DirectoryInventory {
    path: PathBuf,
}

impl DirectoryInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for DirectoryInventory {
    fn default() -> Self {
        Self::new("/dev/input")
    }
}

impl DeviceInventory for DirectoryInventory {
    fn snapshot(&mut self) -> VigilResult<Vec<String>> {
        let mut names = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.path) {
            for entry in entries.flatten() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }
}

pub struct PeripheralChannel {
    inner: GenericChannel,
    known: HashSet<String>,
    device_risk: f64,
    primed: bool,
}

impl PeripheralChannel {
    pub fn new(device_risk: f64) -> Self {
        Self {
            inner: GenericChannel::new(
                RiskChannel::Peripheral,
                GenericChannelConfig::default(),
            ),
            known: HashSet::new(),
            device_risk,
            primed: false,
        }
    }

    pub fn log(&self) -> Arc<ChannelLog> {
        self.inner.log()
    }

    /// Diff one inventory snapshot against the previous one, scoring each new
    /// device. The first snapshot only establishes the baseline.
    pub fn scan(&mut self, devices: Vec<String>, now: f64) -> f64 {
        let current: HashSet<String> = devices.into_iter().collect();
        let mut committed = 0.0;

        if self.primed {
            for name in current.difference(&self.known) {
                info!(device = %name, "new peripheral attached");
                if let Some(risk) =
                    self.inner
                        .observe("New Peripheral Attached", name, self.device_risk, now)
                {
                    committed += risk;
                }
            }
            for name in self.known.difference(&current) {
                debug!(device = %name, "peripheral detached");
            }
            if !self.known.is_subset(&current) {
                // Something detached; let a later re-attach score again.
                self.inner.reset();
            }
        } else {
            self.primed = true;
        }

        self.known = current;
        committed
    }
}
