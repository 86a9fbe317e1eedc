//! Instructor earnings
//!
//! Figures are integer cents. The platform fee is taken per course and
//! rounded down, so the instructor keeps any fractional cent.

use kernel::id::CourseId;

use crate::domain::value_object::currency::Currency;

/// Basis points in 100 %
pub const BPS_SCALE: i64 = 10_000;

/// Succeeded sales of one course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSales {
    pub course_id: CourseId,
    pub title: String,
    pub sales: i64,
    pub gross_cents: i64,
}

/// Payout amounts of one instructor by state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayoutTotals {
    pub paid_cents: i64,
    pub requested_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseEarnings {
    pub course_id: CourseId,
    pub title: String,
    pub sales: i64,
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarningsSummary {
    pub currency: Currency,
    pub courses: Vec<CourseEarnings>,
    pub gross_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub paid_out_cents: i64,
    pub pending_cents: i64,
    /// May go negative after refunds of already paid-out sales
    pub available_cents: i64,
}

/// `gross * fee_bps / 10000`, floored
pub fn platform_fee(gross_cents: i64, fee_bps: i64) -> i64 {
    if gross_cents <= 0 || fee_bps <= 0 {
        return 0;
    }
    let fee = i128::from(gross_cents) * i128::from(fee_bps.min(BPS_SCALE)) / i128::from(BPS_SCALE);
    fee as i64
}

impl EarningsSummary {
    pub fn compute(
        currency: Currency,
        sales: Vec<CourseSales>,
        fee_bps: i64,
        payouts: PayoutTotals,
    ) -> Self {
        let courses: Vec<CourseEarnings> = sales
            .into_iter()
            .map(|s| {
                let fee_cents = platform_fee(s.gross_cents, fee_bps);
                CourseEarnings {
                    course_id: s.course_id,
                    title: s.title,
                    sales: s.sales,
                    gross_cents: s.gross_cents,
                    fee_cents,
                    net_cents: s.gross_cents - fee_cents,
                }
            })
            .collect();

        let gross_cents = courses.iter().map(|c| c.gross_cents).sum();
        let fee_cents = courses.iter().map(|c| c.fee_cents).sum();
        let net_cents: i64 = courses.iter().map(|c| c.net_cents).sum();

        Self {
            currency,
            courses,
            gross_cents,
            fee_cents,
            net_cents,
            paid_out_cents: payouts.paid_cents,
            pending_cents: payouts.requested_cents,
            available_cents: net_cents - payouts.paid_cents - payouts.requested_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales(gross_cents: i64, sales: i64) -> CourseSales {
        CourseSales {
            course_id: CourseId::new(),
            title: "Course".to_string(),
            sales,
            gross_cents,
        }
    }

    #[test]
    fn test_platform_fee_floors() {
        assert_eq!(platform_fee(10_000, 2000), 2000);
        // 999 * 0.2 = 199.8
        assert_eq!(platform_fee(999, 2000), 199);
        assert_eq!(platform_fee(0, 2000), 0);
        assert_eq!(platform_fee(500, 0), 0);
        assert_eq!(platform_fee(500, 20_000), 500);
    }

    #[test]
    fn test_fee_is_per_course() {
        // Two courses of 999: 199 + 199, not floor(1998 * 0.2) = 399
        let summary = EarningsSummary::compute(
            Currency::USD,
            vec![sales(999, 1), sales(999, 1)],
            2000,
            PayoutTotals::default(),
        );
        assert_eq!(summary.gross_cents, 1998);
        assert_eq!(summary.fee_cents, 398);
        assert_eq!(summary.net_cents, 1600);
        assert_eq!(summary.available_cents, 1600);
    }

    #[test]
    fn test_available_subtracts_payouts() {
        let summary = EarningsSummary::compute(
            Currency::USD,
            vec![sales(10_000, 2), sales(0, 0)],
            2000,
            PayoutTotals {
                paid_cents: 3000,
                requested_cents: 1000,
            },
        );
        assert_eq!(summary.courses.len(), 2);
        assert_eq!(summary.net_cents, 8000);
        assert_eq!(summary.paid_out_cents, 3000);
        assert_eq!(summary.pending_cents, 1000);
        assert_eq!(summary.available_cents, 4000);
    }
}
