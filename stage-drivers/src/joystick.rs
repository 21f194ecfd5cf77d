//! Analog joystick readings
//!
//! The manual control adapter works on 10-bit readings (0..=1023, center
//! 512). The RP2040 ADC delivers 12-bit counts.

use stage_core::manual::JoystickSample;

/// Largest 12-bit ADC count
pub const ADC_12_MAX: u16 = 4095;

/// Map a 12-bit ADC count onto the 10-bit range
pub fn scale_adc_12_to_10(raw: u16) -> u16 {
    raw.min(ADC_12_MAX) >> 2
}

/// Build a sample from raw 12-bit readings and the debounced button
pub fn sample_from_adc(x_raw: u16, y_raw: u16, button_pressed: bool) -> JoystickSample {
    JoystickSample {
        x: scale_adc_12_to_10(x_raw),
        y: scale_adc_12_to_10(y_raw),
        button_pressed,
    }
}
