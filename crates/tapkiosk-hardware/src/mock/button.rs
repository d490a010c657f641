//! Mock arming button.

use crate::traits::ButtonInput;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock button whose level is set through a [`MockButtonHandle`].
///
/// # Examples
///
/// ```
/// use tapkiosk_hardware::mock::MockButton;
/// use tapkiosk_hardware::traits::ButtonInput;
///
/// let (mut button, handle) = MockButton::new();
/// assert!(!button.is_pressed());
///
/// handle.press();
/// assert!(button.is_pressed());
/// ```
#[derive(Debug)]
pub struct MockButton {
    shared: Arc<ButtonState>,
}

#[derive(Debug, Default)]
struct ButtonState {
    pressed: AtomicBool,
    samples: AtomicUsize,
}

impl MockButton {
    /// Create a released button and its handle.
    pub fn new() -> (Self, MockButtonHandle) {
        let shared = Arc::new(ButtonState::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockButtonHandle { shared },
        )
    }
}

impl ButtonInput for MockButton {
    fn is_pressed(&mut self) -> bool {
        self.shared.samples.fetch_add(1, Ordering::Relaxed);
        self.shared.pressed.load(Ordering::Acquire)
    }
}

/// Handle for controlling a [`MockButton`].
#[derive(Debug, Clone)]
pub struct MockButtonHandle {
    shared: Arc<ButtonState>,
}

impl MockButtonHandle {
    pub fn press(&self) {
        self.shared.pressed.store(true, Ordering::Release);
    }

    pub fn release(&self) {
        self.shared.pressed.store(false, Ordering::Release);
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.shared.pressed.store(pressed, Ordering::Release);
    }

    pub fn is_pressed(&self) -> bool {
        self.shared.pressed.load(Ordering::Acquire)
    }

    /// How many times the button has been sampled.
    pub fn samples(&self) -> usize {
        self.shared.samples.load(Ordering::Relaxed)
    }
}
