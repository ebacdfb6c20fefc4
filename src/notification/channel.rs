//! Platform delivery strategies, tried in order by the dispatcher.

use std::sync::Arc;

use super::{Notice, NotificationPlatform, NotifyError};
use crate::models::enums::PermissionState;

pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this channel should be attempted right now.
    fn is_available(&self) -> bool;

    fn deliver(&self, notice: &Notice) -> Result<(), NotifyError>;
}

pub struct BackgroundChannel {
    platform: Arc<dyn NotificationPlatform>,
}

impl BackgroundChannel {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self { platform }
    }
}

impl DeliveryChannel for BackgroundChannel {
    fn name(&self) -> &'static str {
        "background"
    }

    fn is_available(&self) -> bool {
        self.platform.background_available()
    }

    fn deliver(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.platform.show_background(notice)
    }
}

/// Needs an explicit grant; never prompts by itself.
pub struct ForegroundChannel {
    platform: Arc<dyn NotificationPlatform>,
}

impl ForegroundChannel {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self { platform }
    }
}

impl DeliveryChannel for ForegroundChannel {
    fn name(&self) -> &'static str {
        "foreground"
    }

    fn is_available(&self) -> bool {
        self.platform.foreground_available() && self.platform.permission() == PermissionState::Granted
    }

    fn deliver(&self, notice: &Notice) -> Result<(), NotifyError> {
        self.platform.show_foreground(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::testing::RecordingPlatform;

    #[test]
    fn foreground_requires_grant() {
        let pending: Arc<dyn NotificationPlatform> =
            Arc::new(RecordingPlatform::new(false, true, PermissionState::Default));
        assert!(!ForegroundChannel::new(pending).is_available());

        let granted: Arc<dyn NotificationPlatform> =
            Arc::new(RecordingPlatform::new(false, true, PermissionState::Granted));
        assert!(ForegroundChannel::new(granted).is_available());
    }

    #[test]
    fn background_ignores_permission() {
        let platform: Arc<dyn NotificationPlatform> =
            Arc::new(RecordingPlatform::new(true, false, PermissionState::Denied));
        assert!(BackgroundChannel::new(platform).is_available());
    }
}
