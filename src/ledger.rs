//! Money arithmetic over appointments and expenses.

use serde::Serialize;

use crate::models::{Appointment, Expense};

/// Amount left to collect: price minus deposit, floored at zero. A
/// missing price or deposit counts as zero.
pub fn balance_due(estimated_price: Option<f64>, deposit: Option<f64>) -> f64 {
    (estimated_price.unwrap_or(0.0) - deposit.unwrap_or(0.0)).max(0.0)
}

/// Totals shown on the earnings screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsSummary {
    /// Sum of the estimated price of every paid appointment.
    pub total_earnings: f64,
    pub total_expenses: f64,
    /// Earnings minus expenses; may be negative.
    pub balance: f64,
    pub paid_count: usize,
}

pub fn summarize(appointments: &[Appointment], expenses: &[Expense]) -> EarningsSummary {
    let paid = appointments.iter().filter(|a| a.is_paid());
    let total_earnings: f64 = paid.clone().map(|a| a.estimated_price.unwrap_or(0.0)).sum();
    let total_expenses: f64 = expenses.iter().map(|e| e.amount).sum();

    EarningsSummary {
        total_earnings,
        total_expenses,
        balance: total_earnings - total_expenses,
        paid_count: paid.count(),
    }
}

/// Paid appointments, most recent first.
pub fn paid_history(appointments: &[Appointment]) -> Vec<Appointment> {
    let mut paid: Vec<Appointment> = appointments.iter().filter(|a| a.is_paid()).cloned().collect();
    paid.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
    paid
}

/// Whole currency units with `.` as thousands separator, e.g. `$12.500`.
pub fn format_price(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}
