//! One reconciliation pass: load, decide, diff, push what changed.

use crate::models::sensibo::{AcState, PodId, SmartMode};
use crate::policy::{Decision, Policy};
use crate::schedule::is_active;
use crate::snapshot::{DeviceReading, Snapshot};
use chrono::{DateTime, TimeZone};
use log::{debug, info};
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Failure reported by a `DeviceService` implementation.
pub type ServiceError = Box<dyn Error + Send + Sync>;

/// Remote device the scheduler manages. Calls are blocking and each is
/// expected to carry its own timeout.
pub trait DeviceService {
    fn load(&self) -> Result<DeviceReading, LoadError>;
    fn push_smart_mode(&self, pod_id: &PodId, smart_mode: &SmartMode) -> Result<(), ServiceError>;
    fn push_ac_state(&self, pod_id: &PodId, ac_state: &AcState) -> Result<(), ServiceError>;
}

#[derive(Debug)]
pub enum LoadError {
    Service(ServiceError),
    NoPods,
    PodNotFound(PodId),
    AmbiguousPods(Vec<PodId>),
    MissingTemperature(PodId),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Service(e) => write!(f, "fetching pods failed: {}", e),
            LoadError::NoPods => write!(f, "account has no pods"),
            LoadError::PodNotFound(id) => write!(f, "pod {} not found on account", id),
            LoadError::AmbiguousPods(ids) => {
                let ids = ids.iter().map(|id| id.0.as_str()).collect::<Vec<_>>().join(", ");
                write!(f, "account has several pods ({}); set SENSIBO_POD_ID to pick one", ids)
            }
            LoadError::MissingTemperature(id) => write!(f, "pod {} reports no temperature", id),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Service(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resource {
    SmartMode,
    AcState,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Resource::SmartMode => write!(f, "smartMode"),
            Resource::AcState => write!(f, "acState"),
        }
    }
}

#[derive(Debug)]
pub struct PushError {
    pub resource: Resource,
    pub source: ServiceError,
}

impl Display for PushError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "pushing {} failed: {}", self.resource, self.source)
    }
}

impl Error for PushError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[derive(Debug)]
pub enum SyncError {
    Load(LoadError),
    Push(PushError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Load(e) => write!(f, "load: {}", e),
            SyncError::Push(e) => write!(f, "push: {}", e),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncError::Load(e) => Some(e),
            SyncError::Push(e) => Some(e),
        }
    }
}

impl From<LoadError> for SyncError {
    fn from(value: LoadError) -> Self {
        SyncError::Load(value)
    }
}

impl From<PushError> for SyncError {
    fn from(value: PushError) -> Self {
        SyncError::Push(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub pod_id: PodId,
    pub active: bool,
    pub decision: Decision,
    pub pushed_smart_mode: bool,
    pub pushed_ac_state: bool,
}

/// Run a single cycle against `now`, which must already be in the policy
/// timezone. Pushes run in order (smartMode, then acState) and the first
/// failure ends the cycle.
pub fn run_cycle<S, T>(service: &S, policy: &Policy, now: &DateTime<T>) -> Result<CycleReport, SyncError>
where
    S: DeviceService + ?Sized,
    T: TimeZone,
{
    let reading = service.load()?;
    info!(
        "Loaded pod {} (temperature={:.1} C, ac on={}, smart mode enabled={})",
        reading.pod_id, reading.temperature_c, reading.state.ac_state.on, reading.state.smart_mode.enabled
    );
    let mut snap = Snapshot::new(reading);

    let active = is_active(now);
    if active {
        info!("In an active window");
    }
    let decision = policy.apply(active, snap.temperature_c, &mut snap.desired);

    let diff = snap.diff();
    if diff.is_empty() {
        info!("Device already matches the {} configuration", decision);
    } else {
        debug!("Baseline: {:?}", snap.baseline());
        debug!("Desired: {:?}", snap.desired);
    }
    let mut report = CycleReport {
        pod_id: snap.pod_id.clone(),
        active,
        decision,
        pushed_smart_mode: false,
        pushed_ac_state: false,
    };

    if diff.smart_mode_changed {
        info!("SmartMode changed, pushing it");
        service
            .push_smart_mode(&snap.pod_id, &snap.desired.smart_mode)
            .map_err(|source| PushError {
                resource: Resource::SmartMode,
                source,
            })?;
        report.pushed_smart_mode = true;
    } else {
        info!("SmartMode config unchanged, not pushing");
    }

    if diff.ac_state_changed {
        info!("AC state changed, pushing it");
        service
            .push_ac_state(&snap.pod_id, &snap.desired.ac_state)
            .map_err(|source| PushError {
                resource: Resource::AcState,
                source,
            })?;
        report.pushed_ac_state = true;
    } else {
        info!("AC state unchanged, not pushing");
    }

    Ok(report)
}
