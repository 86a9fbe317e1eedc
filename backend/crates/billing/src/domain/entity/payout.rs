//! Payout Entity

use chrono::{DateTime, Utc};
use kernel::id::{PayoutId, UserId};

use crate::domain::value_object::{currency::Currency, payout_status::PayoutStatus};
use crate::error::{BillingError, BillingResult};

pub const NOTE_MAX_LENGTH: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub payout_id: PayoutId,
    pub instructor_id: UserId,
    pub amount_cents: i64,
    pub currency: Currency,
    pub status: PayoutStatus,
    /// Admin remark; required on rejection
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payout {
    pub fn request(
        instructor_id: UserId,
        amount_cents: i64,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            payout_id: PayoutId::new(),
            instructor_id,
            amount_cents,
            currency,
            status: PayoutStatus::Requested,
            note: None,
            requested_at: now,
            processed_at: None,
        }
    }

    pub fn approve(&mut self, note: Option<&str>, now: DateTime<Utc>) -> BillingResult<()> {
        let note = note.map(normalize_note).transpose()?.flatten();
        self.close(PayoutStatus::Paid, note, now)
    }

    pub fn reject(&mut self, note: &str, now: DateTime<Utc>) -> BillingResult<()> {
        let note = normalize_note(note)?.ok_or_else(|| {
            BillingError::Validation("A note is required when rejecting a payout".to_string())
        })?;
        self.close(PayoutStatus::Rejected, Some(note), now)
    }

    fn close(
        &mut self,
        next: PayoutStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> BillingResult<()> {
        if !self.status.is_open() {
            return Err(BillingError::PayoutAlreadyProcessed(self.status));
        }
        self.status = next;
        self.note = note;
        self.processed_at = Some(now);
        Ok(())
    }
}

fn normalize_note(note: &str) -> BillingResult<Option<String>> {
    let note = note.trim();
    if note.chars().count() > NOTE_MAX_LENGTH {
        return Err(BillingError::Validation(format!(
            "Note must be at most {} characters",
            NOTE_MAX_LENGTH
        )));
    }
    Ok((!note.is_empty()).then(|| note.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payout() -> Payout {
        Payout::request(UserId::new(), 2500, Currency::USD, Utc::now())
    }

    #[test]
    fn test_approve() {
        let mut p = payout();
        p.approve(Some("  "), Utc::now()).unwrap();
        assert_eq!(p.status, PayoutStatus::Paid);
        assert_eq!(p.note, None);
        assert!(p.processed_at.is_some());
    }

    #[test]
    fn test_reject_requires_note() {
        let mut p = payout();
        assert!(matches!(
            p.reject("   ", Utc::now()),
            Err(BillingError::Validation(_))
        ));
        assert_eq!(p.status, PayoutStatus::Requested);

        p.reject("Bank details missing", Utc::now()).unwrap();
        assert_eq!(p.note.as_deref(), Some("Bank details missing"));
    }

    #[test]
    fn test_processed_payout_is_final() {
        let mut p = payout();
        p.approve(None, Utc::now()).unwrap();
        let err = p.reject("Changed my mind", Utc::now()).unwrap_err();
        assert!(matches!(err, BillingError::PayoutAlreadyProcessed(PayoutStatus::Paid)));
    }
}
