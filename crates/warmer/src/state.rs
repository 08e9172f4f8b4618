//! Instance identity and warm/cold state.
//!
//! Both live for the lifetime of the hosting process. A fresh process
//! starts cold; any processed event, warming or not, makes it warm.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Process-unique instance id: `<epoch millis>-<4 random digits>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    id: String,
}

impl InstanceIdentity {
    pub fn generate() -> Self {
        let millis = epoch_millis(SystemTime::now()).unwrap_or_default();
        Self {
            id: format!("{millis}-{:04}", random_suffix()),
        }
    }

    pub fn from_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Warm flag and last access time of this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstanceState {
    pub warm: bool,
    pub last_accessed: Option<SystemTime>,
}

impl InstanceState {
    pub fn cold() -> Self {
        Self::default()
    }

    /// Mark warm and stamp `now`, returning the state before the update.
    pub fn touch(&mut self, now: SystemTime) -> InstanceState {
        let previous = *self;
        self.warm = true;
        self.last_accessed = Some(now);
        previous
    }

    pub fn last_accessed_millis(&self) -> Option<u64> {
        self.last_accessed.and_then(epoch_millis)
    }

    /// Seconds between the last access and `now`, rounded to one decimal.
    pub fn seconds_since_access(&self, now: SystemTime) -> Option<f64> {
        let last = self.last_accessed?;
        let elapsed = now.duration_since(last).unwrap_or(Duration::ZERO);
        Some((elapsed.as_secs_f64() * 10.0).round() / 10.0)
    }
}

fn epoch_millis(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as u64)
}

fn random_suffix() -> u16 {
    let mut buf = [0u8; 2];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u16::from_le_bytes(buf) % 1000,
        // Fall back to clock jitter.
        Err(_) => (SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos()
            % 1000) as u16,
    }
}
