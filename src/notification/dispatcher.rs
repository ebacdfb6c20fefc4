use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono_tz::Tz;
use serde::Serialize;
use url::Url;

use super::{
    compose_url, BackgroundChannel, DeliveryChannel, ForegroundChannel, InAppBanner, Notice,
    NotificationPlatform, NotifyError,
};
use crate::models::enums::PermissionState;
use crate::models::Appointment;

/// What one dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// Platform channel that was attempted, if any was available.
    pub channel: Option<&'static str>,
    pub delivered: bool,
    pub banner_shown: bool,
}

/// Asks for notification permission at most once per process, and only
/// while the platform still reports `Default`.
#[derive(Default)]
pub struct PermissionGate {
    requested: AtomicBool,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(&self, platform: &dyn NotificationPlatform) -> Option<PermissionState> {
        if platform.permission() != PermissionState::Default {
            return None;
        }
        if self.requested.swap(true, Ordering::SeqCst) {
            return None;
        }
        let state = platform.request_permission();
        tracing::info!(permission = state.as_str(), "Notification permission requested");
        Some(state)
    }
}

pub struct NotificationDispatcher {
    platform: Arc<dyn NotificationPlatform>,
    channels: Vec<Box<dyn DeliveryChannel>>,
    banner: InAppBanner,
    permission: Arc<PermissionGate>,
    timezone: Tz,
}

impl NotificationDispatcher {
    /// Background first, then foreground, then the banner.
    pub fn new(platform: Arc<dyn NotificationPlatform>, timezone: Tz) -> Self {
        Self::with_permission_gate(platform, timezone, Arc::new(PermissionGate::new()))
    }

    /// A fresh banner per session, while the permission prompt stays
    /// once per process.
    pub fn with_permission_gate(
        platform: Arc<dyn NotificationPlatform>,
        timezone: Tz,
        permission: Arc<PermissionGate>,
    ) -> Self {
        let channels: Vec<Box<dyn DeliveryChannel>> = vec![
            Box::new(BackgroundChannel::new(platform.clone())),
            Box::new(ForegroundChannel::new(platform.clone())),
        ];
        Self {
            platform,
            channels,
            banner: InAppBanner::new(),
            permission,
            timezone,
        }
    }

    pub fn banner(&self) -> &InAppBanner {
        &self.banner
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Deliver a reminder. At most one platform channel is attempted (the
    /// first available); the banner is always raised unless the user has
    /// already dismissed this appointment. Never fails.
    pub fn dispatch(&self, appointment: &Appointment) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        match self.banner.is_viewed(&appointment.id) {
            Ok(true) => {
                tracing::debug!(appointment_id = %appointment.id, "Reminder already dismissed");
                return outcome;
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Cannot read dismissed reminders"),
        }

        if let Some(channel) = self.channels.iter().find(|c| c.is_available()) {
            outcome.channel = Some(channel.name());
            match Notice::for_appointment(appointment, self.timezone) {
                Ok(notice) => match channel.deliver(&notice) {
                    Ok(()) => outcome.delivered = true,
                    Err(e) => tracing::warn!(
                        appointment_id = %appointment.id,
                        channel = channel.name(),
                        error = %e,
                        "Platform notification failed"
                    ),
                },
                Err(e) => tracing::warn!(appointment_id = %appointment.id, error = %e, "Cannot build notification"),
            }
        }

        match self.banner.raise(appointment) {
            Ok(shown) => outcome.banner_shown = shown,
            Err(e) => tracing::warn!(error = %e, "Cannot raise in-app banner"),
        }

        tracing::info!(
            appointment_id = %appointment.id,
            channel = outcome.channel.unwrap_or("none"),
            delivered = outcome.delivered,
            "Reminder dispatched"
        );
        outcome
    }

    /// Called whenever a reminder is scheduled.
    pub fn prepare_for_reminder(&self) -> Option<PermissionState> {
        self.permission.ensure(self.platform.as_ref())
    }

    /// Build the outbound message link, hand it to the host and dismiss
    /// the banner.
    pub fn open_composer(&self, appointment: &Appointment) -> Result<Url, NotifyError> {
        let url = compose_url(appointment, self.timezone)?;
        self.platform.open_external(&url);
        if let Ok(Some(active)) = self.banner.active() {
            if active.id == appointment.id {
                self.banner.dismiss()?;
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::testing::{appointment, RecordingPlatform};
    use chrono_tz::America::Argentina::Buenos_Aires;

    fn dispatcher(platform: &Arc<RecordingPlatform>) -> NotificationDispatcher {
        NotificationDispatcher::new(platform.clone(), Buenos_Aires)
    }

    #[test]
    fn background_wins_when_available() {
        let platform = Arc::new(RecordingPlatform::new(true, true, PermissionState::Granted));
        let outcome = dispatcher(&platform).dispatch(&appointment("Ana"));

        assert_eq!(outcome.channel, Some("background"));
        assert!(outcome.delivered);
        assert!(outcome.banner_shown);
        assert_eq!(platform.shown_via(), vec!["background"]);
    }

    #[test]
    fn foreground_used_only_with_permission() {
        let granted = Arc::new(RecordingPlatform::new(false, true, PermissionState::Granted));
        dispatcher(&granted).dispatch(&appointment("Ana"));
        assert_eq!(granted.shown_via(), vec!["foreground"]);

        let denied = Arc::new(RecordingPlatform::new(false, true, PermissionState::Denied));
        let outcome = dispatcher(&denied).dispatch(&appointment("Ana"));
        assert!(denied.shown_via().is_empty());
        assert_eq!(outcome.channel, None);
        assert!(outcome.banner_shown);
    }

    #[test]
    fn foreground_notice_carries_messaging_link() {
        let platform = Arc::new(RecordingPlatform::new(false, true, PermissionState::Granted));
        dispatcher(&platform).dispatch(&appointment("Ana"));
        let shown = platform.shown.lock().unwrap();
        assert!(shown[0].1.open_url.starts_with("https://wa.me/?text=Hi+Ana"));
    }

    #[test]
    fn platform_failure_is_masked_by_banner() {
        let platform = Arc::new(RecordingPlatform::new(true, true, PermissionState::Granted).failing());
        let d = dispatcher(&platform);
        let ana = appointment("Ana");
        let outcome = d.dispatch(&ana);

        assert_eq!(outcome.channel, Some("background"));
        assert!(!outcome.delivered);
        assert!(outcome.banner_shown);
        assert_eq!(d.banner().active().unwrap().map(|a| a.id), Some(ana.id));
    }

    #[test]
    fn headless_host_still_gets_banner() {
        let d = NotificationDispatcher::new(Arc::new(super::super::HeadlessPlatform), Buenos_Aires);
        let outcome = d.dispatch(&appointment("Ana"));
        assert_eq!(outcome.channel, None);
        assert!(outcome.banner_shown);
    }

    #[test]
    fn dismissed_appointment_is_not_redisplayed() {
        let platform = Arc::new(RecordingPlatform::new(true, false, PermissionState::Default));
        let d = dispatcher(&platform);
        let ana = appointment("Ana");

        d.dispatch(&ana);
        d.banner().dismiss().unwrap();
        let again = d.dispatch(&ana);

        assert_eq!(again, DispatchOutcome::default());
        assert!(d.banner().active().unwrap().is_none());
        assert_eq!(platform.shown_via().len(), 1);
    }

    #[test]
    fn permission_requested_at_most_once() {
        let platform = Arc::new(RecordingPlatform::new(false, true, PermissionState::Default));
        let d = dispatcher(&platform);

        assert_eq!(d.prepare_for_reminder(), Some(PermissionState::Granted));
        assert_eq!(d.prepare_for_reminder(), None);
        assert_eq!(platform.permission_requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_gate_spans_dispatchers() {
        let platform = Arc::new(RecordingPlatform::new(false, true, PermissionState::Default));
        let gate = Arc::new(PermissionGate::new());
        let first = NotificationDispatcher::with_permission_gate(platform.clone(), Buenos_Aires, gate.clone());
        let second = NotificationDispatcher::with_permission_gate(platform.clone(), Buenos_Aires, gate);

        // the platform reverts to undecided, e.g. the prompt was closed
        first.prepare_for_reminder();
        *platform.permission.lock().unwrap() = PermissionState::Default;
        assert_eq!(second.prepare_for_reminder(), None);
        assert_eq!(platform.permission_requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn permission_not_requested_once_decided() {
        let platform = Arc::new(RecordingPlatform::new(false, true, PermissionState::Denied));
        assert_eq!(dispatcher(&platform).prepare_for_reminder(), None);
        assert_eq!(platform.permission_requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn composer_opens_link_and_dismisses_banner() {
        let platform = Arc::new(RecordingPlatform::new(false, false, PermissionState::Default));
        let d = dispatcher(&platform);
        let ana = appointment("Ana");
        d.dispatch(&ana);

        let url = d.open_composer(&ana).unwrap();
        assert_eq!(platform.opened.lock().unwrap().as_slice(), &[url.to_string()]);
        assert!(d.banner().active().unwrap().is_none());
        assert!(d.banner().is_viewed(&ana.id).unwrap());
    }
}
