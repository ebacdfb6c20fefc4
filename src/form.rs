//! Appointment form controller.
//!
//! Holds the in-progress draft exactly as the pickers produce it (strings),
//! keeps the price field in step with the selected services, and turns a
//! complete draft into an absolute appointment time in the business zone.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::display::{self, LOCAL_INPUT_FORMAT};
use crate::models::{Appointment, AppointmentPatch, NewAppointment, Service, TASK_SEPARATOR};

/// Selector value that switches to free-text task entry.
pub const CUSTOM_OPTION: &str = "custom";

const DEFAULT_TIME: &str = "00:00";
const DEFAULT_HOUR: &str = "00";
const DEFAULT_MINUTE: &str = "00";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLine {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentForm {
    pub client_name: String,
    /// `YYYY-MM-DDTHH:MM`, possibly partial while being filled in.
    pub date_time: String,
    pub selected_tasks: Vec<TaskLine>,
    pub custom_task_name: String,
    pub adding_custom: bool,
    pub estimated_price: String,
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentDraft {
    pub client_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub task: String,
    pub estimated_price: f64,
}

impl AppointmentDraft {
    pub fn into_new(self, owner_id: Uuid) -> NewAppointment {
        NewAppointment {
            owner_id,
            client_name: self.client_name,
            scheduled_at: self.scheduled_at,
            task: Some(self.task),
            estimated_price: Some(self.estimated_price),
        }
    }

    /// Edit submissions overwrite only the form's own fields.
    pub fn into_patch(self) -> AppointmentPatch {
        AppointmentPatch {
            client_name: Some(self.client_name),
            scheduled_at: Some(self.scheduled_at),
            task: Some(Some(self.task)),
            estimated_price: Some(Some(self.estimated_price)),
            ..AppointmentPatch::default()
        }
    }
}

impl AppointmentForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fill from a stored appointment. The stored task text becomes a
    /// single free-text entry; the original service lines are not
    /// recovered.
    pub fn for_edit(appointment: &Appointment, tz: Tz) -> Self {
        Self {
            client_name: appointment.client_name.clone(),
            date_time: display::to_local(&appointment.scheduled_at, tz)
                .format(LOCAL_INPUT_FORMAT)
                .to_string(),
            selected_tasks: Vec::new(),
            custom_task_name: appointment.task.clone().unwrap_or_default(),
            adding_custom: true,
            estimated_price: appointment
                .estimated_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_client_name(&mut self, name: impl Into<String>) {
        self.client_name = name.into();
    }

    // ── Date and time pickers ───────────────────────────────

    pub fn date(&self) -> &str {
        self.date_time.split('T').next().unwrap_or("")
    }

    fn time(&self) -> Option<&str> {
        self.date_time.split('T').nth(1)
    }

    pub fn hour(&self) -> &str {
        self.time().and_then(|t| t.split(':').next()).unwrap_or("")
    }

    pub fn minute(&self) -> &str {
        self.time().and_then(|t| t.split(':').nth(1)).unwrap_or("")
    }

    pub fn set_date_time(&mut self, value: impl Into<String>) {
        self.date_time = value.into();
    }

    /// Keeps the time already picked, or midnight.
    pub fn set_date(&mut self, date: &str) {
        let time = self.time().filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TIME);
        self.date_time = format!("{date}T{time}");
    }

    pub fn set_hour(&mut self, hour: &str) {
        let minute = Some(self.minute()).filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MINUTE);
        self.date_time = format!("{}T{hour}:{minute}", self.date());
    }

    pub fn set_minute(&mut self, minute: &str) {
        let hour = Some(self.hour()).filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOUR);
        self.date_time = format!("{}T{hour}:{minute}", self.date());
    }

    // ── Tasks ───────────────────────────────────────────────

    /// Handle a selection in the service picker. `custom` opens free-text
    /// entry; any other value is looked up by name in the price list.
    /// Returns whether the form changed.
    pub fn select_service(&mut self, value: &str, services: &[Service]) -> bool {
        if value.is_empty() {
            return false;
        }
        if value == CUSTOM_OPTION {
            self.adding_custom = true;
            return true;
        }
        match services.iter().find(|s| s.name == value) {
            Some(service) => {
                self.add_task(TaskLine {
                    name: service.name.clone(),
                    price: service.price,
                });
                true
            }
            None => false,
        }
    }

    pub fn add_task(&mut self, task: TaskLine) {
        self.selected_tasks.push(task);
        self.sync_price();
    }

    pub fn remove_task(&mut self, index: usize) -> Option<TaskLine> {
        if index >= self.selected_tasks.len() {
            return None;
        }
        let removed = self.selected_tasks.remove(index);
        self.sync_price();
        Some(removed)
    }

    pub fn set_custom_task_name(&mut self, name: impl Into<String>) {
        self.custom_task_name = name.into();
    }

    /// Add the typed custom task with no price of its own.
    pub fn confirm_custom_task(&mut self) -> bool {
        let name = self.custom_task_name.trim().to_string();
        if name.is_empty() {
            return false;
        }
        self.add_task(TaskLine { name, price: 0.0 });
        self.custom_task_name.clear();
        self.adding_custom = false;
        true
    }

    pub fn set_estimated_price(&mut self, price: impl Into<String>) {
        self.estimated_price = price.into();
    }

    pub fn tasks_total(&self) -> f64 {
        self.selected_tasks.iter().map(|t| t.price).sum()
    }

    /// A positive total overwrites the price; an empty list clears it; a
    /// zero total over a non-empty list keeps whatever was typed.
    fn sync_price(&mut self) {
        let total = self.tasks_total();
        if total > 0.0 {
            self.estimated_price = total.to_string();
        } else if self.selected_tasks.is_empty() {
            self.estimated_price.clear();
        }
    }

    /// Task text as stored: the selected names joined, or the typed custom
    /// text when nothing was selected.
    pub fn combined_task(&self) -> String {
        if self.selected_tasks.is_empty() {
            self.custom_task_name.trim().to_string()
        } else {
            self.selected_tasks
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(TASK_SEPARATOR)
        }
    }

    // ── Submission ──────────────────────────────────────────

    /// Validate without consuming. `None` means the form is incomplete.
    pub fn draft(&self, tz: Tz) -> Option<AppointmentDraft> {
        let client_name = self.client_name.trim();
        if client_name.is_empty() {
            return None;
        }
        let task = self.combined_task();
        if task.is_empty() {
            return None;
        }
        let estimated_price: f64 = self.estimated_price.trim().parse().ok()?;
        if !estimated_price.is_finite() || estimated_price < 0.0 {
            return None;
        }
        let local = NaiveDateTime::parse_from_str(&self.date_time, LOCAL_INPUT_FORMAT).ok()?;
        let scheduled_at = display::local_instant(local, tz)?;

        Some(AppointmentDraft {
            client_name: client_name.to_string(),
            scheduled_at,
            task,
            estimated_price,
        })
    }

    /// Produce the draft and clear the form. An incomplete form is left
    /// untouched and yields `None`.
    pub fn submit(&mut self, tz: Tz) -> Option<AppointmentDraft> {
        let draft = self.draft(tz)?;
        self.reset();
        Some(draft)
    }
}

/// Form input as posted by a client: the picker values plus the service
/// names chosen in order. Replayed through the controller so the same
/// price and task rules apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormInput {
    pub client_name: String,
    pub date_time: Option<String>,
    pub date: Option<String>,
    pub hour: Option<String>,
    pub minute: Option<String>,
    /// Service names, or `custom`.
    pub services: Vec<String>,
    /// Custom tasks confirmed in order.
    pub custom_tasks: Vec<String>,
    /// Free text left in the custom field without confirming.
    pub custom_task: Option<String>,
    /// Typed price; overrides the derived total when present.
    pub estimated_price: Option<String>,
}

impl FormInput {
    pub fn into_form(self, services: &[Service]) -> AppointmentForm {
        let mut form = AppointmentForm::new();
        self.apply(&mut form, services);
        form
    }

    /// Replay over an existing form. Absent fields, and a blank client
    /// name, leave the form as it was.
    pub fn apply(self, form: &mut AppointmentForm, services: &[Service]) {
        if !self.client_name.trim().is_empty() {
            form.set_client_name(self.client_name);
        }

        if let Some(date_time) = self.date_time {
            form.set_date_time(date_time);
        }
        if let Some(date) = self.date {
            form.set_date(&date);
        }
        if let Some(hour) = self.hour {
            form.set_hour(&hour);
        }
        if let Some(minute) = self.minute {
            form.set_minute(&minute);
        }

        for name in &self.services {
            if !form.select_service(name, services) {
                tracing::debug!(service = %name, "Unknown service ignored");
            }
        }
        for custom in self.custom_tasks {
            form.set_custom_task_name(custom);
            form.confirm_custom_task();
        }
        if let Some(custom) = self.custom_task {
            form.adding_custom = true;
            form.set_custom_task_name(custom);
        }
        if let Some(price) = self.estimated_price {
            form.set_estimated_price(price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{CompletionState, PaymentState};
    use chrono::TimeZone;
    use chrono_tz::America::Argentina::Buenos_Aires;

    fn line(name: &str, price: f64) -> TaskLine {
        TaskLine { name: name.into(), price }
    }

    fn price_list() -> Vec<Service> {
        vec![
            Service { id: Uuid::new_v4(), owner_id: Uuid::nil(), name: "Corte".into(), price: 5000.0 },
            Service { id: Uuid::new_v4(), owner_id: Uuid::nil(), name: "Peinado".into(), price: 3000.0 },
        ]
    }

    #[test]
    fn price_follows_selected_tasks() {
        let mut form = AppointmentForm::new();
        form.add_task(line("A", 10.0));
        form.add_task(line("B", 15.0));
        assert_eq!(form.estimated_price, "25");

        form.remove_task(0);
        assert_eq!(form.estimated_price, "15");

        form.remove_task(0);
        assert_eq!(form.estimated_price, "");
    }

    #[test]
    fn zero_priced_tasks_keep_typed_price() {
        let mut form = AppointmentForm::new();
        form.set_estimated_price("4000");
        form.set_custom_task_name("Color");
        assert!(form.confirm_custom_task());
        assert_eq!(form.estimated_price, "4000");
        assert_eq!(form.selected_tasks, vec![line("Color", 0.0)]);
        assert!(!form.adding_custom);
    }

    #[test]
    fn fractional_totals_keep_decimals() {
        let mut form = AppointmentForm::new();
        form.add_task(line("A", 10.5));
        assert_eq!(form.estimated_price, "10.5");
    }

    #[test]
    fn remove_out_of_range_is_ignored() {
        let mut form = AppointmentForm::new();
        form.set_estimated_price("100");
        assert!(form.remove_task(3).is_none());
        assert_eq!(form.estimated_price, "100");
    }

    #[test]
    fn service_selection() {
        let services = price_list();
        let mut form = AppointmentForm::new();
        assert!(form.select_service("Peinado", &services));
        assert!(!form.select_service("Manicura", &services));
        assert!(!form.select_service("", &services));
        assert!(form.select_service(CUSTOM_OPTION, &services));

        assert!(form.adding_custom);
        assert_eq!(form.selected_tasks, vec![line("Peinado", 3000.0)]);
        assert_eq!(form.estimated_price, "3000");
    }

    #[test]
    fn blank_custom_task_is_not_added() {
        let mut form = AppointmentForm::new();
        form.set_custom_task_name("   ");
        assert!(!form.confirm_custom_task());
        assert!(form.selected_tasks.is_empty());
    }

    #[test]
    fn pickers_preserve_other_fragments() {
        let mut form = AppointmentForm::new();
        form.set_hour("14");
        assert_eq!(form.date_time, "T14:00");
        form.set_date("2024-06-01");
        assert_eq!(form.date_time, "2024-06-01T14:00");
        form.set_minute("30");
        assert_eq!(form.date_time, "2024-06-01T14:30");
        form.set_date("2024-06-02");
        assert_eq!(form.date_time, "2024-06-02T14:30");
        assert_eq!((form.date(), form.hour(), form.minute()), ("2024-06-02", "14", "30"));
    }

    #[test]
    fn date_first_defaults_to_midnight() {
        let mut form = AppointmentForm::new();
        form.set_date("2024-06-01");
        assert_eq!(form.date_time, "2024-06-01T00:00");
        form.set_minute("45");
        assert_eq!(form.date_time, "2024-06-01T00:45");
    }

    #[test]
    fn minute_first_defaults_hour() {
        let mut form = AppointmentForm::new();
        form.set_minute("15");
        assert_eq!(form.date_time, "T00:15");
        assert_eq!((form.hour(), form.minute()), ("00", "15"));
    }

    #[test]
    fn custom_task_submission() {
        let mut form = AppointmentForm::new();
        form.set_client_name("Ana");
        form.set_date("2024-06-01");
        form.set_hour("14");
        form.set_minute("30");
        form.select_service(CUSTOM_OPTION, &[]);
        form.set_custom_task_name("Corte");
        form.confirm_custom_task();
        form.set_estimated_price("5000");

        let draft = form.submit(Buenos_Aires).unwrap();
        assert_eq!(draft.client_name, "Ana");
        assert_eq!(draft.task, "Corte");
        assert_eq!(draft.scheduled_at, Utc.with_ymd_and_hms(2024, 6, 1, 17, 30, 0).unwrap());
        assert_eq!(draft.estimated_price, 5000.0);
        assert_eq!(form, AppointmentForm::default());
    }

    #[test]
    fn selected_tasks_are_joined() {
        let services = price_list();
        let mut form = AppointmentForm::new();
        form.set_client_name("Ana");
        form.set_date_time("2024-06-01T10:00");
        form.select_service("Corte", &services);
        form.select_service("Peinado", &services);

        let draft = form.submit(Buenos_Aires).unwrap();
        assert_eq!(draft.task, "Corte + Peinado");
        assert_eq!(draft.estimated_price, 8000.0);
    }

    #[test]
    fn unconfirmed_custom_text_is_used_when_nothing_selected() {
        let mut form = AppointmentForm::new();
        form.set_client_name("Ana");
        form.set_date_time("2024-06-01T10:00");
        form.select_service(CUSTOM_OPTION, &[]);
        form.set_custom_task_name(" Alisado ");
        form.set_estimated_price("12000");
        assert_eq!(form.submit(Buenos_Aires).unwrap().task, "Alisado");
    }

    #[test]
    fn incomplete_submission_is_a_no_op() {
        let mut complete = AppointmentForm::new();
        complete.set_client_name("Ana");
        complete.set_date_time("2024-06-01T10:00");
        complete.set_custom_task_name("Corte");
        complete.set_estimated_price("100");
        assert!(complete.draft(Buenos_Aires).is_some());

        let cases: Vec<Box<dyn Fn(&mut AppointmentForm)>> = vec![
            Box::new(|f: &mut AppointmentForm| f.set_client_name("  ")),
            Box::new(|f: &mut AppointmentForm| f.set_date_time("2024-06-01T")),
            Box::new(|f: &mut AppointmentForm| f.set_custom_task_name("")),
            Box::new(|f: &mut AppointmentForm| f.set_estimated_price("")),
            Box::new(|f: &mut AppointmentForm| f.set_estimated_price("mucho")),
            Box::new(|f: &mut AppointmentForm| f.set_estimated_price("-5")),
        ];
        for break_it in cases {
            let mut form = complete.clone();
            break_it(&mut form);
            let before = form.clone();
            assert!(form.submit(Buenos_Aires).is_none());
            assert_eq!(form, before);
        }
    }

    #[test]
    fn nonexistent_local_time_blocks_submission() {
        let mut form = AppointmentForm::new();
        form.set_client_name("Ana");
        form.set_date_time("2024-03-31T02:30");
        form.set_custom_task_name("Corte");
        form.set_estimated_price("100");
        assert!(form.submit(chrono_tz::Europe::Madrid).is_none());
    }

    fn stored(task: Option<&str>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            client_name: "Ana".into(),
            scheduled_at: Utc.with_ymd_and_hms(2024, 6, 1, 17, 30, 0).unwrap(),
            task: task.map(String::from),
            completion: CompletionState::Unset,
            estimated_price: Some(8000.0),
            deposit: None,
            payment: PaymentState::Unpaid,
            reminder_at: None,
            reminder_sent: false,
        }
    }

    #[test]
    fn edit_collapses_tasks_into_one_entry() {
        let appointment = stored(Some("Corte + Peinado"));
        let mut form = AppointmentForm::for_edit(&appointment, Buenos_Aires);

        assert_eq!(form.date_time, "2024-06-01T14:30");
        assert!(form.adding_custom);
        assert!(form.selected_tasks.is_empty());
        assert_eq!(form.custom_task_name, "Corte + Peinado");
        assert_eq!(form.estimated_price, "8000");

        let draft = form.submit(Buenos_Aires).unwrap();
        assert_eq!(draft.task, "Corte + Peinado");
        assert_eq!(draft.scheduled_at, appointment.scheduled_at);

        let patch = draft.into_patch();
        assert_eq!(patch.task, Some(Some("Corte + Peinado".to_string())));
        assert_eq!(patch.completion, None);
        assert_eq!(patch.payment, None);
    }

    #[test]
    fn edit_without_task_cannot_resubmit_until_filled() {
        let mut form = AppointmentForm::for_edit(&stored(None), Buenos_Aires);
        assert!(form.submit(Buenos_Aires).is_none());
        form.set_custom_task_name("Corte");
        assert!(form.submit(Buenos_Aires).is_some());
    }

    #[test]
    fn posted_input_replays_through_controller() {
        let input: FormInput = serde_json::from_value(serde_json::json!({
            "client_name": "Ana",
            "date": "2024-06-01",
            "hour": "14",
            "minute": "30",
            "services": ["Corte", "Manicura", "Peinado"],
        }))
        .unwrap();
        let mut form = input.into_form(&price_list());
        assert_eq!(form.estimated_price, "8000");

        let draft = form.submit(Buenos_Aires).unwrap();
        assert_eq!(draft.task, "Corte + Peinado");
        assert_eq!(draft.scheduled_at, Utc.with_ymd_and_hms(2024, 6, 1, 17, 30, 0).unwrap());
    }

    #[test]
    fn posted_price_overrides_total() {
        let input = FormInput {
            client_name: "Ana".into(),
            date_time: Some("2024-06-01T14:30".into()),
            services: vec!["Corte".into()],
            custom_tasks: vec!["Brushing".into()],
            estimated_price: Some("6500".into()),
            ..FormInput::default()
        };
        let draft = input.into_form(&price_list()).submit(Buenos_Aires).unwrap();
        assert_eq!(draft.task, "Corte + Brushing");
        assert_eq!(draft.estimated_price, 6500.0);
    }
}
