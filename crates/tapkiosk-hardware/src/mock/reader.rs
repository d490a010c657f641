//! Mock tag reader implementation for testing and development.
//!
//! The mock follows the presentation model of an MFRC522-style reader: a
//! presented tag yields its UID once, and after `release()` (the HALT
//! command) it stays silent until it is removed and presented again.

use crate::{
    HardwareError, Result,
    mock::lock,
    traits::TagReader,
    types::ReaderInfo,
};
use std::sync::{Arc, Mutex};
use tapkiosk_core::TagUid;

/// Mock tag reader for testing and development.
///
/// # Examples
///
/// ```
/// use tapkiosk_hardware::mock::MockTagReader;
/// use tapkiosk_hardware::traits::TagReader;
/// use tapkiosk_core::TagUid;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut reader, handle) = MockTagReader::new();
///
/// handle.present(TagUid::from_hex("04ABCDEF")?);
/// assert!(reader.card_present()?);
///
/// let uid = reader.read_uid()?.unwrap();
/// assert_eq!(uid.to_hex(), "04ABCDEF");
///
/// // Once per presentation.
/// assert!(reader.read_uid()?.is_none());
/// reader.release()?;
/// assert!(!reader.card_present()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockTagReader {
    shared: Arc<Mutex<ReaderState>>,

    /// Device name
    name: String,
}

#[derive(Debug, Default)]
struct ReaderState {
    /// Tag currently in the field.
    tag: Option<TagUid>,

    /// UID already returned for this presentation.
    consumed: bool,

    /// Tag halted by `release()`.
    halted: bool,

    /// Injected fault, reported by every call while set.
    fault: Option<String>,

    reads: usize,
    releases: usize,
}

impl MockTagReader {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockTagReaderHandle) {
        Self::with_name("Mock MFRC522")
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTagReaderHandle) {
        let shared = Arc::new(Mutex::new(ReaderState::default()));
        (
            Self {
                shared: Arc::clone(&shared),
                name: name.into(),
            },
            MockTagReaderHandle { shared },
        )
    }
}

impl TagReader for MockTagReader {
    fn card_present(&mut self) -> Result<bool> {
        let state = lock(&self.shared);
        if let Some(fault) = &state.fault {
            return Err(HardwareError::reader_fault(fault.clone()));
        }
        Ok(state.tag.is_some() && !state.halted)
    }

    fn read_uid(&mut self) -> Result<Option<TagUid>> {
        let mut state = lock(&self.shared);
        if let Some(fault) = &state.fault {
            return Err(HardwareError::reader_fault(fault.clone()));
        }
        if state.halted || state.consumed {
            return Ok(None);
        }

        let uid = state.tag.clone();
        if uid.is_some() {
            state.consumed = true;
            state.reads += 1;
        }
        Ok(uid)
    }

    fn release(&mut self) -> Result<()> {
        let mut state = lock(&self.shared);
        if let Some(fault) = &state.fault {
            return Err(HardwareError::reader_fault(fault.clone()));
        }
        if state.tag.is_some() {
            state.halted = true;
        }
        state.releases += 1;
        Ok(())
    }

    fn reader_info(&self) -> ReaderInfo {
        ReaderInfo::new(self.name.clone(), vec!["ISO14443A".to_string()])
            .with_firmware_version("mock")
    }
}

/// Handle for controlling a [`MockTagReader`].
#[derive(Debug, Clone)]
pub struct MockTagReaderHandle {
    shared: Arc<Mutex<ReaderState>>,
}

impl MockTagReaderHandle {
    /// Place a tag in the field. A new presentation can be read again.
    pub fn present(&self, uid: TagUid) {
        let mut state = lock(&self.shared);
        state.tag = Some(uid);
        state.consumed = false;
        state.halted = false;
    }

    /// Place a tag given as a hex string in the field.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidData` if the hex string is not a valid UID.
    pub fn present_hex(&self, hex: &str) -> Result<()> {
        let uid = TagUid::from_hex(hex).map_err(|e| HardwareError::invalid_data(e.to_string()))?;
        self.present(uid);
        Ok(())
    }

    /// Remove the tag from the field.
    pub fn remove(&self) {
        let mut state = lock(&self.shared);
        state.tag = None;
        state.consumed = false;
        state.halted = false;
    }

    /// Make every reader call fail until [`clear_fault`](Self::clear_fault).
    pub fn inject_fault(&self, message: impl Into<String>) {
        lock(&self.shared).fault = Some(message.into());
    }

    pub fn clear_fault(&self) {
        lock(&self.shared).fault = None;
    }

    /// UID of the tag in the field, if any.
    pub fn current_tag(&self) -> Option<TagUid> {
        lock(&self.shared).tag.clone()
    }

    /// Number of successful UID reads.
    pub fn reads(&self) -> usize {
        lock(&self.shared).reads
    }

    /// Number of `release()` calls.
    pub fn releases(&self) -> usize {
        lock(&self.shared).releases
    }
}
