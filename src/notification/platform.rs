use url::Url;

use super::{Notice, NotifyError};
use crate::models::enums::PermissionState;

/// Capabilities of the host that can surface notifications outside the
/// app. Probed on every dispatch; implementations must be cheap.
pub trait NotificationPlatform: Send + Sync {
    /// A background (service-worker style) notification can be shown.
    fn background_available(&self) -> bool;

    /// A plain foreground notification can be shown, subject to permission.
    fn foreground_available(&self) -> bool;

    fn permission(&self) -> PermissionState;

    /// Ask the user for permission. Returns the resulting state.
    fn request_permission(&self) -> PermissionState;

    fn show_background(&self, notice: &Notice) -> Result<(), NotifyError>;

    /// Clicking the notification brings the app forward and opens
    /// `notice.open_url`.
    fn show_foreground(&self, notice: &Notice) -> Result<(), NotifyError>;

    /// Hand a link to the host (messaging app, browser). Fire-and-forget.
    fn open_external(&self, url: &Url);
}

/// Host without any notification surface: the server process. Reminders
/// reach the user only through the in-app banner, and outbound links are
/// returned to the API client instead of being opened here.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPlatform;

impl NotificationPlatform for HeadlessPlatform {
    fn background_available(&self) -> bool {
        false
    }

    fn foreground_available(&self) -> bool {
        false
    }

    fn permission(&self) -> PermissionState {
        PermissionState::Denied
    }

    fn request_permission(&self) -> PermissionState {
        PermissionState::Denied
    }

    fn show_background(&self, _notice: &Notice) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("background"))
    }

    fn show_foreground(&self, _notice: &Notice) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("foreground"))
    }

    fn open_external(&self, url: &Url) {
        tracing::debug!(%url, "Headless host, leaving link to the client");
    }
}
