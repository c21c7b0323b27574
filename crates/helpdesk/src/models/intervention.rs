use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::interventions::{
    Intervention, InterventionExpense, InterventionMaterial, InterventionStatus,
};
use helpdesk_core::media::CloudinaryUrlBuilder;
use helpdesk_core::serde::{
    deserialize_nullable_uuid, deserialize_optional_date, deserialize_optional_string,
    deserialize_optional_time,
};

use super::media::{ImageUpload, ImageView};

fn default_quantity() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Deserialize)]
pub struct MaterialInput {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit_cost: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub serial_number: Option<String>,
}

impl From<MaterialInput> for InterventionMaterial {
    fn from(input: MaterialInput) -> Self {
        let mut material = InterventionMaterial::new(input.name, input.quantity, input.unit_cost);
        material.serial_number = input.serial_number;
        material
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpenseInput {
    pub expense_type: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    /// Defaults to today.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date_incurred: Option<NaiveDate>,
}

impl From<ExpenseInput> for InterventionExpense {
    fn from(input: ExpenseInput) -> Self {
        InterventionExpense {
            id: Uuid::new_v4(),
            expense_type: input.expense_type,
            description: input.description,
            amount: input.amount,
            date_incurred: input
                .date_incurred
                .unwrap_or_else(|| Utc::now().date_naive()),
        }
    }
}

/// Request payload for recording an intervention on a ticket.
#[derive(Debug, Deserialize)]
pub struct CreateIntervention {
    pub ticket_id: Uuid,
    #[serde(default)]
    pub technician_id: Option<Uuid>,
    pub report: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub intervention_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub transport_cost: Decimal,
    #[serde(default)]
    pub additional_costs: Decimal,
    #[serde(default)]
    pub hours_worked: Decimal,
    #[serde(default)]
    pub travel_time: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub materials_used: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub equipment_used: Option<String>,
    #[serde(default)]
    pub status: InterventionStatus,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub customer_signature: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub customer_feedback: Option<String>,
    #[serde(default)]
    pub customer_rating: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub technician_notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub internal_notes: Option<String>,
    #[serde(default)]
    pub materials: Vec<MaterialInput>,
    #[serde(default)]
    pub expenses: Vec<ExpenseInput>,
    #[serde(default)]
    pub images: Vec<ImageUpload>,
}

impl CreateIntervention {
    /// Builds the intervention without code or totals.
    pub fn into_intervention(self) -> Intervention {
        let mut intervention = Intervention::new(self.ticket_id, self.report)
            .with_costs(self.transport_cost, self.additional_costs);
        if let Some(date) = self.intervention_date {
            intervention = intervention.with_date(date);
        }
        intervention.technician_id = self.technician_id;
        intervention.start_time = self.start_time;
        intervention.end_time = self.end_time;
        intervention.hours_worked = self.hours_worked;
        intervention.travel_time = self.travel_time;
        intervention.materials_used = self.materials_used;
        intervention.equipment_used = self.equipment_used;
        intervention.status = self.status;
        intervention.customer_signature = self.customer_signature;
        intervention.customer_feedback = self.customer_feedback;
        intervention.customer_rating = self.customer_rating;
        intervention.technician_notes = self.technician_notes;
        intervention.internal_notes = self.internal_notes;
        intervention.materials = self.materials.into_iter().map(Into::into).collect();
        intervention.expenses = self.expenses.into_iter().map(Into::into).collect();
        intervention.images = self
            .images
            .into_iter()
            .map(ImageUpload::into_intervention_image)
            .collect();
        intervention
    }
}

/// Partial update of an intervention.
///
/// Materials, expenses and images replace the current sets when present.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateIntervention {
    #[serde(default, deserialize_with = "deserialize_nullable_uuid")]
    pub technician_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub report: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub intervention_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub transport_cost: Option<Decimal>,
    #[serde(default)]
    pub additional_costs: Option<Decimal>,
    #[serde(default)]
    pub hours_worked: Option<Decimal>,
    #[serde(default)]
    pub travel_time: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub materials_used: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub equipment_used: Option<String>,
    #[serde(default)]
    pub status: Option<InterventionStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub customer_signature: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub customer_feedback: Option<String>,
    #[serde(default)]
    pub customer_rating: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub technician_notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub internal_notes: Option<String>,
    #[serde(default)]
    pub materials: Option<Vec<MaterialInput>>,
    #[serde(default)]
    pub expenses: Option<Vec<ExpenseInput>>,
    #[serde(default)]
    pub images: Option<Vec<ImageUpload>>,
}

impl UpdateIntervention {
    /// Applies the update. Totals are recomputed by the caller.
    pub fn apply_to(self, intervention: &mut Intervention) {
        intervention.updated_at = Utc::now();

        if let Some(technician_id) = self.technician_id {
            intervention.technician_id = technician_id;
        }
        if let Some(report) = self.report {
            intervention.report = report;
        }
        if let Some(date) = self.intervention_date {
            intervention.intervention_date = date;
        }
        if let Some(start_time) = self.start_time {
            intervention.start_time = Some(start_time);
        }
        if let Some(end_time) = self.end_time {
            intervention.end_time = Some(end_time);
        }
        if let Some(cost) = self.transport_cost {
            intervention.transport_cost = cost;
        }
        if let Some(cost) = self.additional_costs {
            intervention.additional_costs = cost;
        }
        if let Some(hours) = self.hours_worked {
            intervention.hours_worked = hours;
        }
        if let Some(hours) = self.travel_time {
            intervention.travel_time = hours;
        }
        if let Some(value) = self.materials_used {
            intervention.materials_used = Some(value);
        }
        if let Some(value) = self.equipment_used {
            intervention.equipment_used = Some(value);
        }
        if let Some(status) = self.status {
            intervention.status = status;
        }
        if let Some(value) = self.customer_signature {
            intervention.customer_signature = Some(value);
        }
        if let Some(value) = self.customer_feedback {
            intervention.customer_feedback = Some(value);
        }
        if let Some(rating) = self.customer_rating {
            intervention.customer_rating = Some(rating);
        }
        if let Some(value) = self.technician_notes {
            intervention.technician_notes = Some(value);
        }
        if let Some(value) = self.internal_notes {
            intervention.internal_notes = Some(value);
        }
        if let Some(materials) = self.materials {
            intervention.materials = materials.into_iter().map(Into::into).collect();
        }
        if let Some(expenses) = self.expenses {
            intervention.expenses = expenses.into_iter().map(Into::into).collect();
        }
        if let Some(images) = self.images {
            intervention.images = images
                .into_iter()
                .map(ImageUpload::into_intervention_image)
                .collect();
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListInterventionsQuery {
    /// Ticket id.
    pub ticket: Option<Uuid>,
}

/// An intervention as returned by the API.
#[derive(Debug, Serialize)]
pub struct InterventionView {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub code: String,
    pub report: String,
    pub intervention_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub transport_cost: Decimal,
    pub additional_costs: Decimal,
    pub total_cost: Decimal,
    pub hours_worked: Decimal,
    pub travel_time: Decimal,
    pub total_time: Decimal,
    pub materials_used: Option<String>,
    pub equipment_used: Option<String>,
    pub status: InterventionStatus,
    pub status_display: &'static str,
    pub status_color: &'static str,
    pub customer_signature: Option<String>,
    pub customer_feedback: Option<String>,
    pub customer_rating: Option<u8>,
    pub technician_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub materials: Vec<InterventionMaterial>,
    pub expenses: Vec<InterventionExpense>,
    pub images: Vec<ImageView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterventionView {
    pub fn new(intervention: Intervention, media: &CloudinaryUrlBuilder) -> Self {
        Self {
            total_time: intervention.total_time(),
            status_display: intervention.status.label(),
            status_color: intervention.status.color(),
            id: intervention.id,
            ticket_id: intervention.ticket_id,
            technician_id: intervention.technician_id,
            code: intervention.code,
            report: intervention.report,
            intervention_date: intervention.intervention_date,
            start_time: intervention.start_time,
            end_time: intervention.end_time,
            transport_cost: intervention.transport_cost,
            additional_costs: intervention.additional_costs,
            total_cost: intervention.total_cost,
            hours_worked: intervention.hours_worked,
            travel_time: intervention.travel_time,
            materials_used: intervention.materials_used,
            equipment_used: intervention.equipment_used,
            status: intervention.status,
            customer_signature: intervention.customer_signature,
            customer_feedback: intervention.customer_feedback,
            customer_rating: intervention.customer_rating,
            technician_notes: intervention.technician_notes,
            internal_notes: intervention.internal_notes,
            materials: intervention.materials,
            expenses: intervention.expenses,
            images: intervention
                .images
                .into_iter()
                .map(|image| ImageView::from_intervention(image, media))
                .collect(),
            created_at: intervention.created_at,
            updated_at: intervention.updated_at,
        }
    }
}
