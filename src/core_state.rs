//! Shared application state.
//!
//! `CoreState` is created once at startup and shared (via `Arc`) with
//! every API handler. It owns the database store and at most one signed-in
//! owner session. A session carries its appointment book, its notification
//! dispatcher (banner + dismissed set) and the running reminder engine;
//! replacing or closing the session drops all three.

use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::Utc;
use chrono_tz::Tz;
use uuid::Uuid;

use crate::book::AppointmentBook;
use crate::db::{self, Store};
use crate::models::{AppLogEntry, User, ANONYMOUS_BUSINESS};
use crate::notification::{NotificationDispatcher, NotificationPlatform, NotifyError, PermissionGate};
use crate::reminder::{
    start_reminder_engine, Clock, ReminderContext, ReminderEngineHandle, SystemClock, WriteFailureHook,
};

// ═══════════════════════════════════════════════════════════
// Owner session
// ═══════════════════════════════════════════════════════════

/// Everything that lives exactly as long as one sign-in.
pub struct OwnerSession {
    pub user: User,
    pub book: Arc<AppointmentBook>,
    pub dispatcher: Arc<NotificationDispatcher>,
    engine: ReminderEngineHandle,
}

impl OwnerSession {
    pub fn is_engine_running(&self) -> bool {
        self.engine.is_running()
    }

    fn end(self) {
        self.engine.shutdown();
    }
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    store: Arc<Store>,
    platform: Arc<dyn NotificationPlatform>,
    permission: Arc<PermissionGate>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    session: RwLock<Option<OwnerSession>>,
}

impl CoreState {
    pub fn new(store: Arc<Store>, platform: Arc<dyn NotificationPlatform>, timezone: Tz) -> Self {
        Self {
            store,
            platform,
            permission: Arc::new(PermissionGate::new()),
            clock: Arc::new(SystemClock),
            timezone,
            session: RwLock::new(None),
        }
    }

    /// Replace the reminder clock (tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn now(&self) -> chrono::DateTime<Utc> {
        self.clock.now()
    }

    // ── Session lifecycle ───────────────────────────────────

    /// Sign `user` in: load the book and start the reminder engine. Any
    /// previous session is dropped first, stopping its engine. Must run
    /// inside the tokio runtime.
    pub fn open_session(&self, user: User) -> Result<(), CoreError> {
        let mut guard = self.session.write().map_err(|_| CoreError::LockPoisoned)?;
        if let Some(previous) = guard.take() {
            previous.end();
            tracing::info!("Previous session replaced");
        }

        let book = Arc::new(AppointmentBook::new(user.id));
        book.reload(self.store.as_ref())?;

        let dispatcher = Arc::new(NotificationDispatcher::with_permission_gate(
            self.platform.clone(),
            self.timezone,
            self.permission.clone(),
        ));

        let engine = start_reminder_engine(ReminderContext {
            repo: self.store.clone(),
            book: book.clone(),
            dispatcher: dispatcher.clone(),
            clock: self.clock.clone(),
            on_write_failure: Some(write_failure_hook(
                self.store.clone(),
                user.id,
                user.business_name.clone(),
            )),
        });

        tracing::info!(user_id = %user.id, "Session opened");
        *guard = Some(OwnerSession {
            user,
            book,
            dispatcher,
            engine,
        });
        Ok(())
    }

    /// Sign out. Returns whether a session was open.
    pub fn close_session(&self) -> Result<bool, CoreError> {
        let mut guard = self.session.write().map_err(|_| CoreError::LockPoisoned)?;
        match guard.take() {
            Some(session) => {
                session.end();
                tracing::info!("Session closed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn read_session(&self) -> Result<RwLockReadGuard<'_, Option<OwnerSession>>, CoreError> {
        self.session.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn has_session(&self) -> bool {
        self.session.read().map(|guard| guard.is_some()).unwrap_or(false)
    }

    pub fn active_user(&self) -> Result<User, CoreError> {
        let guard = self.read_session()?;
        let session = guard.as_ref().ok_or(CoreError::NoActiveSession)?;
        Ok(session.user.clone())
    }

    pub fn book(&self) -> Result<Arc<AppointmentBook>, CoreError> {
        let guard = self.read_session()?;
        let session = guard.as_ref().ok_or(CoreError::NoActiveSession)?;
        Ok(session.book.clone())
    }

    pub fn dispatcher(&self) -> Result<Arc<NotificationDispatcher>, CoreError> {
        let guard = self.read_session()?;
        let session = guard.as_ref().ok_or(CoreError::NoActiveSession)?;
        Ok(session.dispatcher.clone())
    }

    /// Re-read the signed-in user after a profile change.
    pub fn refresh_user(&self) -> Result<(), CoreError> {
        let mut guard = self.session.write().map_err(|_| CoreError::LockPoisoned)?;
        let session = guard.as_mut().ok_or(CoreError::NoActiveSession)?;
        let id = session.user.id;
        if let Some(user) = self.store.with_conn(|conn| db::get_user(conn, &id))? {
            session.user = user;
        }
        Ok(())
    }

    pub fn is_engine_running(&self) -> bool {
        self.read_session()
            .map(|guard| guard.as_ref().is_some_and(OwnerSession::is_engine_running))
            .unwrap_or(false)
    }

    // ── Error log ───────────────────────────────────────────

    /// Trace a failure and persist it to the application log, tagged with
    /// the signed-in business (or anonymous).
    pub fn report_error(&self, context: &str, message: &str, detail: &dyn std::fmt::Display) {
        tracing::error!(context, detail = %detail, "{message}");
        let (owner_id, business_name) = match self.active_user() {
            Ok(user) => (Some(user.id), user.business_name),
            Err(_) => (None, ANONYMOUS_BUSINESS.to_string()),
        };
        record_app_log(
            &self.store,
            owner_id,
            &business_name,
            context,
            message,
            Some(detail.to_string()),
        );
    }
}

/// Logs failed reminder write-backs under the business name stored at the
/// time of the failure, so a rename during the session is honoured.
fn write_failure_hook(store: Arc<Store>, owner_id: Uuid, fallback_name: String) -> WriteFailureHook {
    Arc::new(move |id: Uuid, err: &db::DatabaseError| {
        let business_name = match store.with_conn(|conn| db::get_user(conn, &owner_id)) {
            Ok(Some(user)) => user.business_name,
            _ => fallback_name.clone(),
        };
        record_app_log(
            &store,
            Some(owner_id),
            &business_name,
            "reminder.write_back",
            "Error marking reminder as sent",
            Some(format!("appointment {id}: {err}")),
        );
    })
}

/// Best effort; a failing log write is only traced.
fn record_app_log(
    store: &Store,
    owner_id: Option<Uuid>,
    business_name: &str,
    context: &str,
    message: &str,
    detail: Option<String>,
) {
    let entry = AppLogEntry {
        id: Uuid::new_v4(),
        owner_id,
        business_name: business_name.to_string(),
        error_message: message.to_string(),
        error_detail: detail,
        context: context.to_string(),
        created_at: Utc::now(),
    };
    if let Err(e) = store.with_conn(|conn| db::insert_app_log(conn, &entry)) {
        tracing::warn!(error = %e, "Could not write application log");
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No active session")]
    NoActiveSession,
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_user, recent_app_logs, AppointmentRepository};
    use crate::models::{AppointmentPatch, NewAppointment, NewUser};
    use crate::notification::HeadlessPlatform;
    use chrono::{Duration, TimeZone};
    use chrono_tz::America::Argentina::Buenos_Aires;

    fn state_with_user() -> (CoreState, User) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let user = store
            .with_conn(|conn| {
                create_user(conn, &NewUser {
                    email: "ana@example.com".into(),
                    password: "secreto123".into(),
                    business_name: "Salon Ana".into(),
                })
            })
            .unwrap();
        (CoreState::new(store, Arc::new(HeadlessPlatform), Buenos_Aires), user)
    }

    #[test]
    fn no_session_by_default() {
        let (state, _) = state_with_user();
        assert!(!state.has_session());
        assert!(matches!(state.active_user(), Err(CoreError::NoActiveSession)));
        assert!(matches!(state.book(), Err(CoreError::NoActiveSession)));
    }

    #[tokio::test]
    async fn open_session_loads_book_and_starts_engine() {
        let (state, user) = state_with_user();
        state
            .store()
            .create(&NewAppointment {
                owner_id: user.id,
                client_name: "Luz".into(),
                scheduled_at: Utc::now() + Duration::days(1),
                task: None,
                estimated_price: None,
            })
            .unwrap();

        state.open_session(user.clone()).unwrap();
        assert_eq!(state.active_user().unwrap().id, user.id);
        assert_eq!(state.book().unwrap().snapshot().unwrap().len(), 1);
        assert!(state.is_engine_running());

        assert!(state.close_session().unwrap());
        assert!(!state.is_engine_running());
        assert!(!state.close_session().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn session_fires_due_reminder_into_banner() {
        let (state, user) = state_with_user();
        let reminder_at = Utc.with_ymd_and_hms(2024, 6, 1, 16, 30, 0).unwrap();
        let state = state.with_clock(Arc::new(crate::reminder::clock::testing::FixedClock::at(
            reminder_at + Duration::minutes(1),
        )));
        let id = state
            .store()
            .create(&NewAppointment {
                owner_id: user.id,
                client_name: "Luz".into(),
                scheduled_at: reminder_at + Duration::hours(1),
                task: None,
                estimated_price: None,
            })
            .unwrap();
        state
            .store()
            .update(&id, &AppointmentPatch {
                reminder_at: Some(Some(reminder_at)),
                ..AppointmentPatch::default()
            })
            .unwrap();

        state.open_session(user).unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;

        let active = state.dispatcher().unwrap().banner().active().unwrap();
        assert_eq!(active.map(|a| a.id), Some(id));
        assert!(state.store().get(&id).unwrap().unwrap().reminder_sent);
    }

    #[tokio::test]
    async fn new_session_gets_fresh_banner() {
        let (state, user) = state_with_user();
        state.open_session(user.clone()).unwrap();
        let first = state.dispatcher().unwrap();
        state.open_session(user).unwrap();
        let second = state.dispatcher().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn report_error_records_business() {
        let (state, user) = state_with_user();
        state.report_error("appointments.create", "Error creating appointment", &"disk full");
        state.open_session(user.clone()).unwrap();
        state.report_error("expenses.delete", "Error deleting expense", &"locked");

        let logs = state.store().with_conn(|conn| recent_app_logs(conn, 10)).unwrap();
        assert_eq!(logs.len(), 2);
        let anonymous = logs.iter().find(|l| l.context == "appointments.create").unwrap();
        assert_eq!(anonymous.business_name, ANONYMOUS_BUSINESS);
        assert_eq!(anonymous.error_detail.as_deref(), Some("disk full"));
        let signed_in = logs.iter().find(|l| l.context == "expenses.delete").unwrap();
        assert_eq!(signed_in.owner_id, Some(user.id));
        assert_eq!(signed_in.business_name, "Salon Ana");
    }

    #[tokio::test]
    async fn refresh_user_picks_up_rename() {
        let (state, user) = state_with_user();
        state.open_session(user.clone()).unwrap();
        state
            .store()
            .with_conn(|conn| db::update_business_name(conn, &user.id, "Uñas Ana"))
            .unwrap();
        state.refresh_user().unwrap();
        assert_eq!(state.active_user().unwrap().business_name, "Uñas Ana");
    }

    #[tokio::test]
    async fn close_session_stops_engine_tasks() {
        let (state, user) = state_with_user();
        state.open_session(user).unwrap();
        let book = state.book().unwrap();
        assert!(Arc::strong_count(&book) > 2);

        assert!(state.close_session().unwrap());
        for _ in 0..100 {
            if Arc::strong_count(&book) == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(Arc::strong_count(&book), 1);
    }

    #[tokio::test]
    async fn write_back_failure_logged_under_current_name() {
        let (state, user) = state_with_user();
        let hook = write_failure_hook(state.store.clone(), user.id, user.business_name.clone());
        state
            .store()
            .with_conn(|conn| db::update_business_name(conn, &user.id, "Uñas Ana"))
            .unwrap();

        let id = Uuid::new_v4();
        hook(id, &db::DatabaseError::LockPoisoned);

        let logs = state.store().with_conn(|conn| recent_app_logs(conn, 10)).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].context, "reminder.write_back");
        assert_eq!(logs[0].owner_id, Some(user.id));
        assert_eq!(logs[0].business_name, "Uñas Ana");
    }
}
