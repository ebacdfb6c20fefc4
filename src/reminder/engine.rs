use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::Clock;
use crate::book::AppointmentBook;
use crate::config::{REMINDER_INTERVAL, REMINDER_WINDOW_SECS};
use crate::db::{AppointmentRepository, DatabaseError};
use crate::models::{Appointment, AppointmentPatch};
use crate::notification::NotificationDispatcher;

/// Called when persisting `reminder_sent` fails.
pub type WriteFailureHook = Arc<dyn Fn(Uuid, &DatabaseError) + Send + Sync>;

/// A reminder is due from its instant until the window closes. Anything
/// older is missed for good.
pub fn is_due(appointment: &Appointment, now: DateTime<Utc>) -> bool {
    if appointment.reminder_sent {
        return false;
    }
    let Some(reminder_at) = appointment.reminder_at else {
        return false;
    };
    now >= reminder_at && now - reminder_at < Duration::seconds(REMINDER_WINDOW_SECS)
}

/// One scan pass over the book. Holds the set of ids already fired in
/// this session; the set is never persisted.
pub struct ReminderEngine {
    book: Arc<AppointmentBook>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    notified: HashSet<Uuid>,
    write_back: mpsc::UnboundedSender<Uuid>,
}

impl ReminderEngine {
    pub fn new(
        book: Arc<AppointmentBook>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        write_back: mpsc::UnboundedSender<Uuid>,
    ) -> Self {
        Self {
            book,
            dispatcher,
            clock,
            notified: HashSet::new(),
            write_back,
        }
    }

    /// Fire every due reminder not yet fired in this session. Returns the
    /// ids fired by this pass. Never waits on storage.
    pub fn tick(&mut self) -> Vec<Uuid> {
        let appointments = match self.book.upcoming() {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "Reminder scan skipped");
                return Vec::new();
            }
        };
        let now = self.clock.now();

        let mut fired = Vec::new();
        for appointment in &appointments {
            if self.notified.contains(&appointment.id) || !is_due(appointment, now) {
                continue;
            }
            self.notified.insert(appointment.id);
            self.dispatcher.dispatch(appointment);

            if self.write_back.send(appointment.id).is_err() {
                tracing::warn!(appointment_id = %appointment.id, "Reminder write-back closed");
            }
            fired.push(appointment.id);
        }

        if !fired.is_empty() {
            tracing::debug!(count = fired.len(), "Reminder pass fired");
        }
        fired
    }

    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }
}

/// Everything the running engine needs from its owner.
pub struct ReminderContext {
    pub repo: Arc<dyn AppointmentRepository>,
    pub book: Arc<AppointmentBook>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub clock: Arc<dyn Clock>,
    pub on_write_failure: Option<WriteFailureHook>,
}

/// Running engine. Dropping it stops both the scan and the write-back.
pub struct ReminderEngineHandle {
    scan: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ReminderEngineHandle {
    pub fn is_running(&self) -> bool {
        !self.scan.is_finished()
    }

    /// Stop both tasks now. Used when a session ends.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for ReminderEngineHandle {
    fn drop(&mut self) {
        self.scan.abort();
        self.writer.abort();
        tracing::info!("Reminder engine stopped");
    }
}

/// Spawn the scan loop and the write-back task on the current runtime.
pub fn start_reminder_engine(ctx: ReminderContext) -> ReminderEngineHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut engine = ReminderEngine::new(ctx.book.clone(), ctx.dispatcher, ctx.clock, tx);

    let scan = tokio::spawn(async move {
        let mut interval = tokio::time::interval(REMINDER_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            engine.tick();
        }
    });

    let writer = tokio::spawn(write_back_loop(rx, ctx.repo, ctx.book, ctx.on_write_failure));

    tracing::info!(
        period_secs = REMINDER_INTERVAL.as_secs(),
        "Reminder engine started"
    );
    ReminderEngineHandle { scan, writer }
}

/// Persist `reminder_sent` for each fired id, then refresh the book. A
/// failure is reported and dropped; the session's dedup set still holds.
async fn write_back_loop(
    mut rx: mpsc::UnboundedReceiver<Uuid>,
    repo: Arc<dyn AppointmentRepository>,
    book: Arc<AppointmentBook>,
    on_failure: Option<WriteFailureHook>,
) {
    while let Some(id) = rx.recv().await {
        match repo.update(&id, &AppointmentPatch::reminder_sent()) {
            Ok(()) => {
                if let Err(e) = book.reload(repo.as_ref()) {
                    tracing::warn!(error = %e, "Reload after reminder write-back failed");
                }
            }
            Err(e) => {
                tracing::warn!(appointment_id = %id, error = %e, "Could not mark reminder as sent");
                if let Some(hook) = on_failure.as_deref() {
                    hook(id, &e);
                }
            }
        }
    }
}
