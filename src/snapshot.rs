use crate::models::sensibo::{AcState, Pod, PodId, SmartMode};
use log::info;

const THRESHOLD_TOLERANCE_C: f64 = 0.01;

/// The two remote resources the scheduler may rewrite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceState {
    pub ac_state: AcState,
    pub smart_mode: SmartMode,
}

/// Facts reported by the device at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    pub pod_id: PodId,
    /// Ambient temperature in Celsius.
    pub temperature_c: f64,
    pub state: DeviceState,
}

impl DeviceReading {
    /// Returns `None` when the pod reports no temperature measurement.
    pub fn from_pod(pod: Pod) -> Option<Self> {
        let temperature_c = pod.measurements.as_ref().and_then(|m| m.temperature)?;
        Some(DeviceReading {
            pod_id: pod.id,
            temperature_c,
            state: DeviceState {
                ac_state: pod.ac_state,
                smart_mode: pod.smart_mode.unwrap_or_default(),
            },
        })
    }
}

/// Which resources differ from what was loaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Diff {
    pub smart_mode_changed: bool,
    pub ac_state_changed: bool,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        !self.smart_mode_changed && !self.ac_state_changed
    }
}

/// Untouched baseline plus the working copy the policy mutates.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub pod_id: PodId,
    pub temperature_c: f64,
    baseline: DeviceState,
    pub desired: DeviceState,
}

impl Snapshot {
    pub fn new(reading: DeviceReading) -> Self {
        Snapshot {
            pod_id: reading.pod_id,
            temperature_c: reading.temperature_c,
            baseline: reading.state.clone(),
            desired: reading.state,
        }
    }

    pub fn baseline(&self) -> &DeviceState {
        &self.baseline
    }

    pub fn diff(&self) -> Diff {
        Diff {
            smart_mode_changed: !smart_mode_equivalent(&self.desired.smart_mode, &self.baseline.smart_mode),
            ac_state_changed: self.desired.ac_state != self.baseline.ac_state,
        }
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < THRESHOLD_TOLERANCE_C
}

/// Compares the thresholds (within a hundredth of a degree) and both threshold
/// states (exactly). The `enabled` flag and identity fields are not compared.
pub fn smart_mode_equivalent(a: &SmartMode, b: &SmartMode) -> bool {
    if !float_eq(a.low_temperature_threshold, b.low_temperature_threshold) {
        info!("Low threshold differed");
        return false;
    }
    if !float_eq(a.high_temperature_threshold, b.high_temperature_threshold) {
        info!("High threshold differed");
        return false;
    }
    if a.high_temperature_state != b.high_temperature_state {
        info!("High temperature states differed");
        return false;
    }
    if a.low_temperature_state != b.low_temperature_state {
        info!("Low temperature states differed");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sensibo::{Measurements, TemperatureState};

    fn sample_pod() -> Pod {
        Pod {
            id: PodId("pod-1".into()),
            ac_state: AcState {
                on: true,
                fan_level: Some("auto".into()),
                temperature_unit: Some("F".into()),
                target_temperature: Some(72),
                mode: Some("cool".into()),
                swing: Some("stopped".into()),
            },
            measurements: Some(Measurements {
                temperature: Some(22.4),
                humidity: Some(40.0),
            }),
            smart_mode: Some(SmartMode {
                enabled: true,
                low_temperature_threshold: 20.0,
                high_temperature_threshold: 23.3,
                low_temperature_state: TemperatureState {
                    on: true,
                    mode: Some("heat".into()),
                    ..Default::default()
                },
                ..Default::default()
            }),
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(DeviceReading::from_pod(sample_pod()).expect("has temperature"))
    }

    #[test]
    fn reading_requires_temperature() {
        let mut pod = sample_pod();
        pod.measurements = Some(Measurements::default());
        assert!(DeviceReading::from_pod(pod).is_none());
    }

    #[test]
    fn missing_smart_mode_reads_as_default() {
        let mut pod = sample_pod();
        pod.smart_mode = None;
        let reading = DeviceReading::from_pod(pod).expect("has temperature");
        assert_eq!(reading.state.smart_mode, SmartMode::default());
    }

    #[test]
    fn fresh_snapshot_has_no_diff() {
        let snap = sample_snapshot();
        assert_eq!(snap.baseline(), &snap.desired);
        assert!(snap.diff().is_empty());
        assert!(smart_mode_equivalent(&snap.desired.smart_mode, &snap.desired.smart_mode.clone()));
    }

    #[test]
    fn threshold_noise_is_tolerated() {
        let mut snap = sample_snapshot();
        snap.desired.smart_mode.high_temperature_threshold += 0.005;
        assert!(!snap.diff().smart_mode_changed);

        snap.desired.smart_mode.high_temperature_threshold += 0.1;
        assert!(snap.diff().smart_mode_changed);
        assert!(!snap.diff().ac_state_changed);
    }

    #[test]
    fn threshold_state_compared_exactly() {
        let mut snap = sample_snapshot();
        snap.desired.smart_mode.low_temperature_state.target_temperature = Some(80);
        assert!(snap.diff().smart_mode_changed);

        let mut snap = sample_snapshot();
        snap.desired.smart_mode.high_temperature_state.temperature_unit = Some("C".into());
        assert!(snap.diff().smart_mode_changed);
    }

    #[test]
    fn enabled_flag_alone_is_not_a_change() {
        let mut snap = sample_snapshot();
        snap.desired.smart_mode.enabled = false;
        assert!(snap.diff().is_empty());
    }

    #[test]
    fn ac_state_compared_exactly() {
        let mut snap = sample_snapshot();
        snap.desired.ac_state.on = false;
        let diff = snap.diff();
        assert!(diff.ac_state_changed);
        assert!(!diff.smart_mode_changed);
        assert!(snap.baseline().ac_state.on);
    }
}
