//! Session assembly: channel lifecycle and the aggregate decision.
//!
//! `SessionMonitor` owns one instance of each channel. Channels start and
//! stop independently; a channel that cannot start (no camera, no
//! microphone, no clipboard) leaves the rest of the session running. Status
//! is always computed from whatever channels are registered.

use crate::peripheral::{DeviceInventory, PeripheralChannel};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use vigil_core::{
    now_ts, Aggregator, GenericChannel, GenericChannelConfig, MonitorConfig, RiskChannel,
    ShutdownToken, StatusSnapshot, VigilResult,
};
use vigil_audio::VoiceChannel;
use vigil_input::{ClipboardSource, ClipboardWatcher, KeyboardGuard};
use vigil_vision::{FaceDetector, FrameSource, VisionChannel};

struct PeripheralWorker {
    token: ShutdownToken,
    handle: Option<thread::JoinHandle<()>>,
}

pub struct SessionMonitor {
    config: MonitorConfig,
    aggregator: Aggregator,
    vision: Option<VisionChannel>,
    voice: Option<VoiceChannel>,
    clipboard: Option<ClipboardWatcher>,
    guard: KeyboardGuard,
    // Registered for reporting; nothing feeds it, so it reports zero risk.
    mouse: GenericChannel,
    window: GenericChannel,
    peripheral: Option<PeripheralWorker>,
}

impl SessionMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let mut aggregator =
            Aggregator::new().with_kickout_threshold(config.session.kickout_threshold);
        let mouse = GenericChannel::new(RiskChannel::Mouse, GenericChannelConfig::default());
        let window = GenericChannel::new(RiskChannel::Window, GenericChannelConfig::default());
        aggregator.register(mouse.log());
        aggregator.register(window.log());

        Self {
            config,
            aggregator,
            vision: None,
            voice: None,
            clipboard: None,
            guard: KeyboardGuard::new(),
            mouse,
            window,
            peripheral: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start the visual attention channel over the given frame source and
    /// detector. Returns `false` when the channel is already running.
    pub fn start_vision<S, D>(&mut self, source: S, detector: D) -> VigilResult<bool>
    where
        S: FrameSource + 'static,
        D: FaceDetector<S::Frame> + 'static,
    {
        if self.vision.is_some() {
            debug!("vision channel already running");
            return Ok(false);
        }
        let channel = VisionChannel::start(self.config.vision.clone(), source, detector)?;
        self.aggregator.register(channel.log());
        self.vision = Some(channel);
        Ok(true)
    }

    /// Start the voice channel on the default input device.
    pub fn start_voice(&mut self) -> VigilResult<bool> {
        if self.voice.is_some() {
            debug!("voice channel already running");
            return Ok(false);
        }
        let channel = VoiceChannel::start(self.config.audio.clone())?;
        self.aggregator.register(channel.log());
        self.voice = Some(channel);
        Ok(true)
    }

    /// Start the clipboard channel against the system clipboard.
    pub fn start_clipboard(&mut self) -> VigilResult<bool> {
        if self.clipboard.is_some() {
            debug!("clipboard channel already running");
            return Ok(false);
        }
        let watcher = ClipboardWatcher::start(self.config.clipboard.clone())?;
        self.aggregator.register(watcher.log());
        self.clipboard = Some(watcher);
        Ok(true)
    }

    pub fn start_clipboard_with_source<S>(&mut self, source: S) -> VigilResult<bool>
    where
        S: ClipboardSource + 'static,
    {
        if self.clipboard.is_some() {
            return Ok(false);
        }
        let watcher =
            ClipboardWatcher::start_with_source(self.config.clipboard.clone(), source)?;
        self.aggregator.register(watcher.log());
        self.clipboard = Some(watcher);
        Ok(true)
    }

    /// Start peripheral inventory polling.
    pub fn start_peripheral<I>(&mut self, mut inventory: I) -> VigilResult<bool>
    where
        I: DeviceInventory + 'static,
    {
        if self.peripheral.is_some() {
            debug!("peripheral channel already running");
            return Ok(false);
        }
        let mut channel = PeripheralChannel::new(self.config.session.peripheral_risk);
        self.aggregator.register(channel.log());

        let token = ShutdownToken::new();
        let worker_token = token.clone();
        let poll = Duration::from_millis(self.config.session.peripheral_poll_ms.max(1));

        let handle = thread::spawn(move || {
            info!("peripheral polling started");
            loop {
                match inventory.snapshot() {
                    Ok(devices) => {
                        channel.scan(devices, now_ts());
                    }
                    Err(e) => debug!("could not list peripherals: {e}"),
                }
                if worker_token.wait_timeout(poll) {
                    break;
                }
            }
        });

        self.peripheral = Some(PeripheralWorker {
            token,
            handle: Some(handle),
        });
        Ok(true)
    }

    /// Turn on blocked-shortcut suppression. Idempotent.
    pub fn enable_shortcut_block(&mut self) -> VigilResult<bool> {
        self.guard.enable()
    }

    /// Turn off blocked-shortcut suppression. Idempotent.
    pub fn disable_shortcut_block(&mut self) -> bool {
        self.guard.disable()
    }

    pub fn shortcut_block_enabled(&self) -> bool {
        self.guard.is_enabled()
    }

    /// Feed a window-focus observation into the window channel.
    pub fn observe_window(&mut self, title: &str, magnitude: f64) -> Option<f64> {
        self.window.observe("Window Focus Changed", title, magnitude, now_ts())
    }

    pub fn mouse_log(&self) -> std::sync::Arc<vigil_core::ChannelLog> {
        self.mouse.log()
    }

    /// Current per-channel and aggregate risk with the session decision.
    pub fn compute_status(&self) -> StatusSnapshot {
        self.aggregator.compute_status()
    }

    pub fn stop_vision(&mut self) -> bool {
        self.vision.take().map(|mut c| c.stop()).unwrap_or(false)
    }

    pub fn stop_voice(&mut self) -> bool {
        self.voice.take().map(|mut c| c.stop()).unwrap_or(false)
    }

    pub fn stop_clipboard(&mut self) -> bool {
        self.clipboard.take().map(|mut c| c.stop()).unwrap_or(false)
    }

    pub fn stop_peripheral(&mut self) -> bool {
        match self.peripheral.take() {
            Some(mut worker) => {
                worker.token.shutdown();
                if let Some(handle) = worker.handle.take() {
                    let _ = handle.join();
                }
                info!("peripheral polling stopped");
                true
            }
            None => false,
        }
    }

    /// Stop every running channel and release hooks and devices. The channel
    /// logs stay readable afterwards, so a final status can still be taken.
    pub fn shutdown(&mut self) {
        self.stop_vision();
        self.stop_voice();
        self.stop_clipboard();
        self.stop_peripheral();
        self.disable_shortcut_block();
        info!("session monitor shut down");
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
