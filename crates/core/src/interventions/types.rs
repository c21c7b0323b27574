use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::InterventionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl InterventionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionStatus::Scheduled => "scheduled",
            InterventionStatus::InProgress => "in_progress",
            InterventionStatus::Completed => "completed",
            InterventionStatus::Cancelled => "cancelled",
        }
    }

    /// Human readable status.
    pub fn label(&self) -> &'static str {
        match self {
            InterventionStatus::Scheduled => "Planifiée",
            InterventionStatus::InProgress => "En cours",
            InterventionStatus::Completed => "Terminée",
            InterventionStatus::Cancelled => "Annulée",
        }
    }

    /// Badge color used by clients to render the status.
    pub fn color(&self) -> &'static str {
        status_color(self.as_str())
    }
}

/// Color for a raw status value. Unknown statuses render gray.
pub fn status_color(status: &str) -> &'static str {
    match status {
        "scheduled" => "blue",
        "in_progress" => "orange",
        "completed" => "green",
        "cancelled" => "red",
        _ => "gray",
    }
}

impl FromStr for InterventionStatus {
    type Err = InterventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(InterventionStatus::Scheduled),
            "in_progress" => Ok(InterventionStatus::InProgress),
            "completed" => Ok(InterventionStatus::Completed),
            "cancelled" => Ok(InterventionStatus::Cancelled),
            other => Err(InterventionError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for InterventionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Material consumed during an intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionMaterial {
    pub id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    /// `quantity * unit_cost`, recomputed on every save.
    pub total_cost: Decimal,
    pub serial_number: Option<String>,
}

impl InterventionMaterial {
    /// The total stays zero until [`recompute_totals`](super::recompute_totals) runs.
    pub fn new(name: impl Into<String>, quantity: Decimal, unit_cost: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            quantity,
            unit_cost,
            total_cost: Decimal::ZERO,
            serial_number: None,
        }
    }

    pub fn recompute_total(&mut self) -> Result<(), InterventionError> {
        self.total_cost = self
            .quantity
            .checked_mul(self.unit_cost)
            .ok_or(InterventionError::AmountOutOfRange("total_cost"))?
            .round_dp(2);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionExpense {
    pub id: Uuid,
    pub expense_type: String,
    pub description: String,
    pub amount: Decimal,
    pub date_incurred: NaiveDate,
}

/// Photo taken during an intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionImage {
    pub id: Uuid,
    pub image: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub order: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: Option<u64>,
    pub file_extension: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A technician's work session against a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: Uuid,
    pub ticket_id: Uuid,
    /// Technician profile ID.
    pub technician_id: Option<Uuid>,
    /// `INT-XXXXXXXX`. Assigned once at creation.
    pub code: String,
    pub report: String,
    pub intervention_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub transport_cost: Decimal,
    pub additional_costs: Decimal,
    /// `transport_cost + additional_costs`, recomputed on every save.
    pub total_cost: Decimal,
    pub hours_worked: Decimal,
    pub travel_time: Decimal,
    pub materials_used: Option<String>,
    pub equipment_used: Option<String>,
    pub status: InterventionStatus,
    pub customer_signature: Option<String>,
    pub customer_feedback: Option<String>,
    pub customer_rating: Option<u8>,
    pub technician_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub materials: Vec<InterventionMaterial>,
    pub expenses: Vec<InterventionExpense>,
    pub images: Vec<InterventionImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Intervention {
    /// Creates a scheduled intervention dated today, without a code.
    pub fn new(ticket_id: Uuid, report: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            technician_id: None,
            code: String::new(),
            report: report.into(),
            intervention_date: now.date_naive(),
            start_time: None,
            end_time: None,
            transport_cost: Decimal::ZERO,
            additional_costs: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            hours_worked: Decimal::ZERO,
            travel_time: Decimal::ZERO,
            materials_used: None,
            equipment_used: None,
            status: InterventionStatus::default(),
            customer_signature: None,
            customer_feedback: None,
            customer_rating: None,
            technician_notes: None,
            internal_notes: None,
            materials: Vec::new(),
            expenses: Vec::new(),
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_technician(mut self, technician_id: Uuid) -> Self {
        self.technician_id = Some(technician_id);
        self
    }

    pub fn with_costs(mut self, transport_cost: Decimal, additional_costs: Decimal) -> Self {
        self.transport_cost = transport_cost;
        self.additional_costs = additional_costs;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.intervention_date = date;
        self
    }

    /// Hours worked plus travel time.
    pub fn total_time(&self) -> Decimal {
        self.hours_worked.saturating_add(self.travel_time)
    }
}
