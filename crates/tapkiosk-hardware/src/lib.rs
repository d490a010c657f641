//! Collaborator abstraction layer for the kiosk controller.
//!
//! This crate defines the traits the session controller uses to talk to its
//! peripherals, plus mock implementations for development and testing:
//!
//! - [`TagReader`]: RFID/NFC reader exposing "card present / read UID / halt"
//! - [`ButtonInput`]: the arming button
//! - [`WirelessLink`]: the short-range link to the remote peer
//!
//! # Design
//!
//! - **Polled**: every method is synchronous and non-blocking; the
//!   controller samples devices once per tick.
//! - **Callback-driven link events**: send completion and inbound payloads
//!   arrive through callbacks that may run on another thread.
//! - **Error-aware**: all fallible operations return [`Result<T>`] with a
//!   [`HardwareError`]; none of them is fatal to the controller.
//!
//! # Example
//!
//! ```
//! use tapkiosk_hardware::mock::{MockButton, MockTagReader};
//! use tapkiosk_hardware::{ButtonInput, TagReader};
//!
//! # fn main() -> tapkiosk_hardware::Result<()> {
//! let (mut button, button_handle) = MockButton::new();
//! let (mut reader, reader_handle) = MockTagReader::new();
//!
//! button_handle.press();
//! reader_handle.present_hex("04ABCDEF")?;
//!
//! assert!(button.is_pressed());
//! assert!(reader.card_present()?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{ButtonInput, ReceiveCallback, SendCallback, TagReader, WirelessLink};
pub use types::{DeliveryStatus, ReaderInfo, SendReport};
