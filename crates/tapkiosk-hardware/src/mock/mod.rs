//! Mock collaborator implementations for testing and development.
//!
//! Each mock is returned together with a handle that shares its state, so a
//! test (or the CLI) can press the button, present a tag or inject a radio
//! message while the controller owns the device itself.

pub mod button;
pub mod link;
pub mod reader;

pub use button::{MockButton, MockButtonHandle};
pub use link::{MockLink, MockLinkHandle, SentFrame};
pub use reader::{MockTagReader, MockTagReaderHandle};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock shared mock state, recovering from a poisoned mutex.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
