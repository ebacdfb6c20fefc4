use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::NotifyError;
use crate::models::Appointment;

/// In-app alert. Holds at most one active appointment; ids dismissed by
/// the user stay suppressed for the lifetime of the banner.
#[derive(Default)]
pub struct InAppBanner {
    state: Mutex<BannerState>,
}

#[derive(Default)]
struct BannerState {
    active: Option<Appointment>,
    viewed: HashSet<Uuid>,
}

impl InAppBanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BannerState>, NotifyError> {
        self.state.lock().map_err(|_| NotifyError::LockPoisoned)
    }

    /// Show `appointment` unless it was already dismissed. Replaces any
    /// other active appointment. Returns whether it is now displayed.
    pub fn raise(&self, appointment: &Appointment) -> Result<bool, NotifyError> {
        let mut state = self.lock()?;
        if state.viewed.contains(&appointment.id) {
            return Ok(false);
        }
        state.active = Some(appointment.clone());
        Ok(true)
    }

    pub fn active(&self) -> Result<Option<Appointment>, NotifyError> {
        Ok(self.lock()?.active.clone())
    }

    /// Dismiss the active appointment, if any. Returns its id.
    pub fn dismiss(&self) -> Result<Option<Uuid>, NotifyError> {
        let mut state = self.lock()?;
        let Some(active) = state.active.take() else {
            return Ok(None);
        };
        state.viewed.insert(active.id);
        Ok(Some(active.id))
    }

    pub fn is_viewed(&self, id: &Uuid) -> Result<bool, NotifyError> {
        Ok(self.lock()?.viewed.contains(id))
    }
}
