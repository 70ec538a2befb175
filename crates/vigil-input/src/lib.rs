//! # vigil-input — clipboard and keyboard channel
//!
//! Two cooperating halves:
//! - a clipboard poller that scores pasted content by size, with exponential
//!   escalation for rapid repeats inside a rolling window;
//! - a keyboard interdictor that suppresses blocked shortcuts (copy, paste,
//!   cut, select-all, window switching) at the OS hook level.

pub mod clipboard;
pub mod guard;
pub mod interdict;
pub mod keys;
pub mod paste;

pub use clipboard::{ClipboardSource, ClipboardWatcher, SystemClipboard};
pub use guard::KeyboardGuard;
pub use interdict::{Interdictor, KeyDecision};
pub use keys::{normalize, BlockedCombo, HotKey, BLOCKED_COMBOS};
pub use paste::PasteScorer;
