//! Ledger arithmetic for beams and deliveries.
//!
//! Everything here is a pure function of stored rows, so the same formulas
//! back the beam detail view, the occupancy cards, the reports and the
//! capacity check performed when a delivery is recorded.

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{beam, delivery};
use crate::errors::ServiceError;

/// Precision and scale of a `decimal(p, s)` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalColumn {
    pub precision: u32,
    pub scale: u32,
}

pub const BEAM_METERS: DecimalColumn = DecimalColumn { precision: 14, scale: 3 };
pub const METERS_PER_PIECE: DecimalColumn = DecimalColumn { precision: 10, scale: 3 };
pub const PRICE: DecimalColumn = DecimalColumn { precision: 12, scale: 2 };
pub const AMOUNT: DecimalColumn = DecimalColumn { precision: 14, scale: 2 };

impl DecimalColumn {
    /// True when `value` is stored exactly: no rounding, no overflow.
    pub fn holds(&self, value: Decimal) -> bool {
        let value = value.normalize();
        if value.scale() > self.scale {
            return false;
        }
        let limit = Decimal::from(10_i64.pow(self.precision - self.scale));
        value.abs() < limit
    }

    /// Passes `value` through, or names `field` in an `INVALID_QUANTITY` error.
    pub fn check(&self, field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
        if self.holds(value) {
            Ok(value)
        } else {
            Err(ServiceError::InvalidQuantity(format!(
                "{field} must have at most {} integer digits and {} decimal places",
                self.precision - self.scale,
                self.scale
            )))
        }
    }
}

/// Meters of warp consumed by a delivery: every piece, good or damaged, uses
/// `meters_per_piece`. `None` on overflow.
pub fn meters_used(
    good_pieces: i32,
    damaged_pieces: i32,
    meters_per_piece: Decimal,
) -> Option<Decimal> {
    Decimal::from(i64::from(good_pieces) + i64::from(damaged_pieces))
        .checked_mul(meters_per_piece)
}

/// Amount payable for a delivery. Damaged pieces are not paid for.
pub fn total_amount(good_pieces: i32, price_per_piece: Decimal) -> Option<Decimal> {
    Decimal::from(good_pieces).checked_mul(price_per_piece)
}

/// `part / whole * 100`, rounded to two places; zero when `whole` is zero.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole pieces that still fit in `remaining` meters. Never negative.
pub fn estimated_pieces_remaining(remaining: Decimal, meters_per_piece: Decimal) -> i64 {
    if remaining <= Decimal::ZERO || meters_per_piece <= Decimal::ZERO {
        return 0;
    }
    (remaining / meters_per_piece).floor().to_i64().unwrap_or(0)
}

/// Returns the meters still available when `requested` fits in the beam,
/// otherwise the (possibly negative) remaining meters as the error.
pub fn check_capacity(
    total_beam_meters: Decimal,
    used: Decimal,
    requested: Decimal,
) -> Result<Decimal, Decimal> {
    let remaining = total_beam_meters - used;
    if requested > remaining {
        Err(remaining)
    } else {
        Ok(remaining - requested)
    }
}

/// Running sums over a set of deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySums {
    pub good: i64,
    pub damaged: i64,
    pub meters_used: Decimal,
    pub amount: Decimal,
}

impl DeliverySums {
    pub fn add(&mut self, d: &delivery::Model) {
        self.good += i64::from(d.good_pieces);
        self.damaged += i64::from(d.damaged_pieces);
        self.meters_used += d.meters_used;
        self.amount += d.total_amount;
    }

    pub fn pieces(&self) -> i64 {
        self.good + self.damaged
    }

    /// Damaged pieces per hundred meters of warp consumed.
    pub fn damage_rate_by_meters(&self) -> Decimal {
        percentage(Decimal::from(self.damaged), self.meters_used)
    }

    /// Damaged pieces as a share of all pieces produced.
    pub fn damage_rate_by_pieces(&self) -> Decimal {
        percentage(Decimal::from(self.damaged), Decimal::from(self.pieces()))
    }
}

impl<'a> FromIterator<&'a delivery::Model> for DeliverySums {
    fn from_iter<I: IntoIterator<Item = &'a delivery::Model>>(iter: I) -> Self {
        let mut sums = DeliverySums::default();
        for d in iter {
            sums.add(d);
        }
        sums
    }
}

/// Derived per-beam quantities shown on the beam detail page and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BeamTotals {
    pub total_good: i64,
    pub total_damaged: i64,
    pub total_pieces: i64,
    pub total_meters_used: Decimal,
    pub total_amount: Decimal,
    /// May go negative only for rows recorded before capacity was enforced.
    pub remaining_meters: Decimal,
    pub estimated_pieces_remaining: i64,
    pub meter_usage_percentage: Decimal,
    pub damage_rate_by_meters: Decimal,
    pub damage_rate_by_pieces: Decimal,
}

impl BeamTotals {
    pub fn compute(beam: &beam::Model, sums: &DeliverySums) -> Self {
        let remaining = beam.total_beam_meters - sums.meters_used;
        Self {
            total_good: sums.good,
            total_damaged: sums.damaged,
            total_pieces: sums.pieces(),
            total_meters_used: sums.meters_used,
            total_amount: sums.amount,
            remaining_meters: remaining,
            estimated_pieces_remaining: estimated_pieces_remaining(
                remaining,
                beam.meters_per_piece,
            ),
            meter_usage_percentage: percentage(sums.meters_used, beam.total_beam_meters),
            damage_rate_by_meters: sums.damage_rate_by_meters(),
            damage_rate_by_pieces: sums.damage_rate_by_pieces(),
        }
    }

    pub fn for_deliveries<'a>(
        beam: &beam::Model,
        deliveries: impl IntoIterator<Item = &'a delivery::Model>,
    ) -> Self {
        let sums: DeliverySums = deliveries.into_iter().collect();
        Self::compute(beam, &sums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BeamStatus, FabricType};
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use rstest::rstest;
    use uuid::Uuid;

    fn beam(total: Decimal, mpp: Decimal) -> beam::Model {
        beam::Model {
            id: Uuid::new_v4(),
            beam_number: "WB001".into(),
            machine_id: Uuid::new_v4(),
            workshop_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            fabric_type: FabricType::Veshti,
            total_beam_meters: total,
            meters_per_piece: mpp,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            status: BeamStatus::Active,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn delivery(b: &beam::Model, good: i32, damaged: i32, price: Decimal) -> delivery::Model {
        delivery::Model {
            id: Uuid::new_v4(),
            beam_id: b.id,
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            design_name: "Border".into(),
            price_per_piece: price,
            good_pieces: good,
            damaged_pieces: damaged,
            meters_used: meters_used(good, damaged, b.meters_per_piece).unwrap(),
            total_amount: total_amount(good, price).unwrap(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn delivery_derivation_matches_worked_example() {
        assert_eq!(meters_used(90, 10, dec!(4)), Some(dec!(400)));
        assert_eq!(total_amount(90, dec!(60)), Some(dec!(5400)));
    }

    #[test]
    fn oversized_products_are_none() {
        assert_eq!(meters_used(3, 0, Decimal::from_scientific("3e28").unwrap()), None);
        assert_eq!(total_amount(i32::MAX, Decimal::MAX), None);
    }

    #[rstest]
    #[case(BEAM_METERS, dec!(99999999999.999), true)]
    #[case(BEAM_METERS, dec!(100000000000), false)]
    #[case(BEAM_METERS, Decimal::from_scientific("7e28").unwrap(), false)]
    #[case(METERS_PER_PIECE, dec!(4.125), true)]
    #[case(METERS_PER_PIECE, dec!(4.1255), false)]
    #[case(PRICE, dec!(60.500), true)]
    #[case(PRICE, dec!(10.555), false)]
    #[case(PRICE, dec!(-9999999999.99), true)]
    #[case(AMOUNT, dec!(1000000000000), false)]
    fn column_bounds(#[case] column: DecimalColumn, #[case] value: Decimal, #[case] fits: bool) {
        assert_eq!(column.holds(value), fits);
    }

    #[test]
    fn out_of_range_values_are_invalid_quantities() {
        let err = PRICE.check("price_per_piece", dec!(10.555)).unwrap_err();
        assert_eq!(err.code(), "INVALID_QUANTITY");
        assert_eq!(PRICE.check("price_per_piece", dec!(10.50)).unwrap(), dec!(10.50));
    }

    #[test]
    fn totals_track_two_deliveries() {
        let b = beam(dec!(1000), dec!(4));
        let first = delivery(&b, 90, 10, dec!(60));
        let second = delivery(&b, 50, 0, dec!(60));

        let after_first = BeamTotals::for_deliveries(&b, [&first]);
        assert_eq!(after_first.remaining_meters, dec!(600));
        assert_eq!(after_first.total_amount, dec!(5400));
        assert_eq!(after_first.estimated_pieces_remaining, 150);

        let after_both = BeamTotals::for_deliveries(&b, [&first, &second]);
        assert_eq!(after_both.remaining_meters, dec!(400));
        assert_eq!(after_both.total_good, 140);
        assert_eq!(after_both.total_damaged, 10);
        assert_eq!(after_both.meter_usage_percentage, dec!(60));
        // 10 damaged over 600 meters
        assert_eq!(after_both.damage_rate_by_meters, dec!(1.67));
        // 10 damaged over 150 pieces
        assert_eq!(after_both.damage_rate_by_pieces, dec!(6.67));
    }

    #[test]
    fn empty_beam_has_zero_rates() {
        let b = beam(dec!(500), dec!(5));
        let totals = BeamTotals::for_deliveries(&b, std::iter::empty());
        assert_eq!(totals.remaining_meters, dec!(500));
        assert_eq!(totals.estimated_pieces_remaining, 100);
        assert_eq!(totals.damage_rate_by_meters, Decimal::ZERO);
        assert_eq!(totals.damage_rate_by_pieces, Decimal::ZERO);
        assert_eq!(totals.meter_usage_percentage, Decimal::ZERO);
    }

    #[test]
    fn overflow_is_reported_not_clamped() {
        let b = beam(dec!(100), dec!(4));
        let d = delivery(&b, 30, 0, dec!(10));
        let totals = BeamTotals::for_deliveries(&b, [&d]);
        assert_eq!(totals.remaining_meters, dec!(-20));
        assert_eq!(totals.estimated_pieces_remaining, 0);
    }

    #[rstest]
    #[case(dec!(1000), dec!(0), dec!(1000), Ok(dec!(0)))]
    #[case(dec!(1000), dec!(600), dec!(400), Ok(dec!(0)))]
    #[case(dec!(1000), dec!(600), dec!(200), Ok(dec!(200)))]
    #[case(dec!(1000), dec!(600), dec!(404), Err(dec!(400)))]
    #[case(dec!(10.5), dec!(0), dec!(10.6), Err(dec!(10.5)))]
    fn capacity_boundaries(
        #[case] total: Decimal,
        #[case] used: Decimal,
        #[case] requested: Decimal,
        #[case] expected: Result<Decimal, Decimal>,
    ) {
        assert_eq!(check_capacity(total, used, requested), expected);
    }

    #[rstest]
    #[case(dec!(400), dec!(4), 100)]
    #[case(dec!(401), dec!(4), 100)]
    #[case(dec!(3.9), dec!(4), 0)]
    #[case(dec!(0), dec!(4), 0)]
    #[case(dec!(-8), dec!(4), 0)]
    #[case(dec!(10), dec!(2.5), 4)]
    fn pieces_remaining_floors(#[case] remaining: Decimal, #[case] mpp: Decimal, #[case] expected: i64) {
        assert_eq!(estimated_pieces_remaining(remaining, mpp), expected);
    }

    proptest! {
        #[test]
        fn accepted_deliveries_never_exceed_capacity(
            total in 1u32..5_000,
            mpp in 1u32..20,
            batches in prop::collection::vec((0i32..200, 0i32..50), 0..20),
        ) {
            let total = Decimal::from(total);
            let mpp = Decimal::from(mpp);
            let mut used = Decimal::ZERO;
            for (good, damaged) in batches {
                let requested = meters_used(good, damaged, mpp).unwrap();
                if check_capacity(total, used, requested).is_ok() {
                    used += requested;
                }
                prop_assert!(used <= total);
            }
        }

        #[test]
        fn amount_ignores_damaged_pieces(good in 0i32..10_000, damaged in 0i32..10_000, price in 0u32..1_000) {
            let price = Decimal::from(price);
            prop_assert_eq!(total_amount(good, price), Some(Decimal::from(good) * price));
            prop_assert!(meters_used(good, damaged, dec!(4)) >= meters_used(good, 0, dec!(4)));
        }
    }
}
