//! Time and temperature driven choice of the device configuration.
//!
//! Bands are authored in Fahrenheit. Below 65 F the device warms, above 73 F it
//! cools, and anything in between (inclusive) or outside the schedule window
//! shuts it down. The smart mode thresholds used while warming or cooling are
//! stored in Celsius, converted once when the policy is built.

use crate::models::sensibo::{SmartMode, fan_level, mode};
use crate::snapshot::DeviceState;
use crate::units::{c_to_f, f_to_c};
use log::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Decision {
    Warming,
    Cooling,
    Idle,
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Decision::Warming => write!(f, "warming"),
            Decision::Cooling => write!(f, "cooling"),
            Decision::Idle => write!(f, "idle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Warm when strictly below this (F).
    pub warm_below_f: f64,
    /// Cool when strictly above this (F).
    pub cool_above_f: f64,
    pub warming_low_threshold_c: f64,
    pub warming_high_threshold_c: f64,
    pub cooling_low_threshold_c: f64,
    pub cooling_high_threshold_c: f64,
    /// Setpoints pushed into the active threshold state, in the device's own unit.
    pub warming_target: i32,
    pub cooling_target: i32,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            warm_below_f: 65.0,
            cool_above_f: 73.0,
            warming_low_threshold_c: f_to_c(68.0),
            warming_high_threshold_c: f_to_c(74.0),
            cooling_low_threshold_c: f_to_c(71.0),
            cooling_high_threshold_c: f_to_c(74.0),
            warming_target: 80,
            cooling_target: 65,
        }
    }
}

impl Policy {
    pub fn decide(&self, active: bool, temperature_c: f64) -> Decision {
        if !active {
            return Decision::Idle;
        }
        let temperature_f = c_to_f(temperature_c);
        if temperature_f < self.warm_below_f {
            Decision::Warming
        } else if temperature_f > self.cool_above_f {
            Decision::Cooling
        } else {
            Decision::Idle
        }
    }

    /// Decide and write the outcome into `state`. Only fields the decision
    /// names are touched.
    pub fn apply(&self, active: bool, temperature_c: f64, state: &mut DeviceState) -> Decision {
        let decision = self.decide(active, temperature_c);
        match decision {
            Decision::Warming => {
                info!("{:.1} F is under {} F, setting warming mode", c_to_f(temperature_c), self.warm_below_f);
                self.set_warming(&mut state.smart_mode);
            }
            Decision::Cooling => {
                info!("{:.1} F is over {} F, setting cooling mode", c_to_f(temperature_c), self.cool_above_f);
                self.set_cooling(&mut state.smart_mode);
            }
            Decision::Idle if active => {
                info!("{:.2} F: between temperature zones, shutting down", c_to_f(temperature_c));
                shutdown(state);
            }
            Decision::Idle => {
                info!("Outside active window, shutting down");
                shutdown(state);
            }
        }
        decision
    }

    fn set_warming(&self, sm: &mut SmartMode) {
        sm.enabled = true;

        sm.low_temperature_threshold = self.warming_low_threshold_c;
        let low = &mut sm.low_temperature_state;
        low.on = true;
        low.fan_level = Some(fan_level::STRONG.to_string());
        low.target_temperature = Some(self.warming_target);
        low.mode = Some(mode::HEAT.to_string());

        sm.high_temperature_threshold = self.warming_high_threshold_c;
        sm.high_temperature_state.on = false;
    }

    fn set_cooling(&self, sm: &mut SmartMode) {
        sm.enabled = true;

        sm.low_temperature_threshold = self.cooling_low_threshold_c;
        sm.low_temperature_state.on = false;

        sm.high_temperature_threshold = self.cooling_high_threshold_c;
        let high = &mut sm.high_temperature_state;
        high.on = true;
        high.fan_level = Some(fan_level::STRONG.to_string());
        high.target_temperature = Some(self.cooling_target);
        high.mode = Some(mode::COOL.to_string());
    }
}

/// Disable smart mode and switch the unit off. The remote `enabled` flag is
/// not always honoured, so both threshold states are switched off as well.
fn shutdown(state: &mut DeviceState) {
    state.ac_state.on = false;
    state.smart_mode.enabled = false;
    state.smart_mode.high_temperature_state.on = false;
    state.smart_mode.low_temperature_state.on = false;
}
