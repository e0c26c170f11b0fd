//! Celsius/Fahrenheit conversion at one decimal of precision.
//!
//! Policy temperatures are authored in Fahrenheit while the device reports and
//! stores thresholds in Celsius. Both directions round to the nearest tenth,
//! ties away from zero.

/// Round to one decimal digit, halves away from zero (0.25 -> 0.3, -0.25 -> -0.3).
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn c_to_f(celsius: f64) -> f64 {
    round_tenth(celsius * 9.0 / 5.0 + 32.0)
}

pub fn f_to_c(fahrenheit: f64) -> f64 {
    round_tenth((fahrenheit - 32.0) * 5.0 / 9.0)
}
