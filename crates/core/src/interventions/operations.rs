use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::InterventionError;
use super::types::Intervention;

/// Generates a fresh intervention code: `INT-` and 8 uppercase hex digits.
pub fn generate_intervention_code() -> String {
    intervention_code_from(Uuid::new_v4())
}

/// Derives the intervention code from a uuid.
pub fn intervention_code_from(id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("INT-{}", hex[..8].to_uppercase())
}

/// Digits allowed for money and quantities, 2 of them decimal.
const AMOUNT_DIGITS: u32 = 10;
/// Digits allowed for durations in hours, 2 of them decimal.
const HOURS_DIGITS: u32 = 5;
const DECIMAL_PLACES: u32 = 2;

/// Recomputes every derived amount of an intervention.
///
/// Runs on create and on every update, after [`validate_intervention`].
/// A total that does not fit the amount precision is rejected.
pub fn recompute_totals(intervention: &mut Intervention) -> Result<(), InterventionError> {
    intervention.total_cost = intervention
        .transport_cost
        .checked_add(intervention.additional_costs)
        .ok_or(InterventionError::AmountOutOfRange("total_cost"))?;
    ensure_amount(intervention.total_cost, "total_cost", AMOUNT_DIGITS)?;
    for material in &mut intervention.materials {
        material.recompute_total()?;
        ensure_amount(material.total_cost, "total_cost", AMOUNT_DIGITS)?;
    }
    Ok(())
}

/// Checks a non-negative decimal with at most `max_digits` digits, 2 of them decimal.
fn ensure_amount(
    value: Decimal,
    field: &'static str,
    max_digits: u32,
) -> Result<(), InterventionError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(InterventionError::NegativeAmount(field));
    }
    if value.normalize().scale() > DECIMAL_PLACES {
        return Err(InterventionError::TooManyDecimalPlaces(field));
    }
    let limit = Decimal::from(10_i64.pow(max_digits - DECIMAL_PLACES));
    if value >= limit {
        return Err(InterventionError::AmountOutOfRange(field));
    }
    Ok(())
}

/// Validates the user supplied fields of an intervention.
///
/// Derived totals are checked by [`recompute_totals`].
pub fn validate_intervention(intervention: &Intervention) -> Result<(), InterventionError> {
    if intervention.report.trim().is_empty() {
        return Err(InterventionError::EmptyReport);
    }
    if let (Some(start), Some(end)) = (intervention.start_time, intervention.end_time) {
        if end <= start {
            return Err(InterventionError::InvalidTimeRange);
        }
    }
    ensure_amount(intervention.transport_cost, "transport_cost", AMOUNT_DIGITS)?;
    ensure_amount(intervention.additional_costs, "additional_costs", AMOUNT_DIGITS)?;
    ensure_amount(intervention.hours_worked, "hours_worked", HOURS_DIGITS)?;
    ensure_amount(intervention.travel_time, "travel_time", HOURS_DIGITS)?;
    for material in &intervention.materials {
        ensure_amount(material.quantity, "quantity", AMOUNT_DIGITS)?;
        ensure_amount(material.unit_cost, "unit_cost", AMOUNT_DIGITS)?;
    }
    for expense in &intervention.expenses {
        ensure_amount(expense.amount, "amount", AMOUNT_DIGITS)?;
    }
    if let Some(rating) = intervention.customer_rating {
        if !(1..=5).contains(&rating) {
            return Err(InterventionError::InvalidCustomerRating);
        }
    }
    Ok(())
}

/// Orders interventions by newest `intervention_date`, then newest `created_at`.
pub fn sort_interventions(interventions: &mut [Intervention]) {
    interventions.sort_by(|a, b| {
        b.intervention_date
            .cmp(&a.intervention_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
