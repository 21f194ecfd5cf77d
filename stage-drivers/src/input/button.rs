//! Debounced push-button
//!
//! The joystick button pulls its line low when pressed. A change of level
//! is accepted once it has been read the same way for a number of
//! consecutive samples.

use embedded_hal::digital::InputPin;

/// Default number of agreeing samples before a level change is accepted
pub const DEFAULT_DEBOUNCE_SAMPLES: u8 = 3;

/// Active-low push-button with sample-count debounce
pub struct DebouncedButton<P> {
    pin: P,
    /// Samples that must agree
    threshold: u8,
    /// Debounced level
    pressed: bool,
    /// Consecutive samples disagreeing with `pressed`
    counter: u8,
    read_errors: u32,
}

impl<P: InputPin> DebouncedButton<P> {
    pub fn new(pin: P) -> Self {
        Self::with_threshold(pin, DEFAULT_DEBOUNCE_SAMPLES)
    }

    pub fn with_threshold(pin: P, threshold: u8) -> Self {
        Self {
            pin,
            threshold: threshold.max(1),
            pressed: false,
            counter: 0,
            read_errors: 0,
        }
    }

    /// Sample the pin and return the debounced state
    ///
    /// A failed read keeps the previous state.
    pub fn update(&mut self) -> bool {
        let raw = match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                self.read_errors = self.read_errors.saturating_add(1);
                return self.pressed;
            }
        };

        if raw == self.pressed {
            self.counter = 0;
        } else {
            self.counter += 1;
            if self.counter >= self.threshold {
                self.pressed = raw;
                self.counter = 0;
            }
        }
        self.pressed
    }

    /// Debounced state without sampling
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Number of failed pin reads
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Pin replaying a fixed sequence of levels (true = low)
    struct ScriptPin<'a> {
        levels: &'a [Option<bool>],
        index: usize,
    }

    impl<'a> ScriptPin<'a> {
        fn new(levels: &'a [Option<bool>]) -> Self {
            Self {
                levels,
                index: 0,
            }
        }
    }

    impl ErrorType for ScriptPin<'_> {
        type Error = ErrorKind;
    }

    impl InputPin for ScriptPin<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            self.is_low().map(|low| !low)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            let i = self.index;
            self.index += 1;
            self.levels
                .get(i)
                .copied()
                .flatten()
                .ok_or(ErrorKind::Other)
        }
    }

    #[test]
    fn test_press_needs_stable_samples() {
        let script = [Some(true), Some(true), Some(true), Some(true)];
        let mut button = DebouncedButton::new(ScriptPin::new(&script));

        assert!(!button.update());
        assert!(!button.update());
        assert!(button.update());
        assert!(button.update());
    }

    #[test]
    fn test_bounce_is_ignored() {
        let script = [
            Some(true),
            Some(false),
            Some(true),
            Some(true),
            Some(false),
            Some(false),
        ];
        let mut button = DebouncedButton::new(ScriptPin::new(&script));

        for _ in 0..script.len() {
            assert!(!button.update());
        }
    }

    #[test]
    fn test_release() {
        let script = [Some(true), Some(false), Some(false), Some(false)];
        let mut button = DebouncedButton::with_threshold(ScriptPin::new(&script), 1);

        assert!(button.update());
        assert!(!button.update());
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_read_error_keeps_state() {
        let script = [Some(true), None, Some(false)];
        let mut button = DebouncedButton::with_threshold(ScriptPin::new(&script), 1);

        assert!(button.update());
        assert!(button.update());
        assert_eq!(button.read_errors(), 1);
        assert!(!button.update());
    }
}
