//! # vigil-session — session assembly
//!
//! Wires the vision, voice, clipboard, peripheral, mouse, and window channels
//! into one `SessionMonitor` with a read-only aggregate status and the
//! kickout decision.

pub mod monitor;
pub mod peripheral;

pub use monitor::SessionMonitor;
pub use peripheral::{DeviceInventory, DirectoryInventory, PeripheralChannel};
