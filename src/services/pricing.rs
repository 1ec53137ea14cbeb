use chrono::NaiveDate;

use crate::models::PricingSnapshot;

/// Platform service fee, in basis points of the nightly subtotal.
pub const SERVICE_FEE_BPS: i64 = 1_400;
/// Tax applied to the fee-inclusive subtotal, in basis points.
pub const TAX_BPS: i64 = 800;
/// All amounts are whole rupees.
pub const CURRENCY: &str = "INR";

pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

/// Deterministic quote for a stay. The caller guarantees nights >= 1.
pub fn compute_pricing(base_price: i64, nights: i64, cleaning_fee: i64) -> PricingSnapshot {
    let subtotal = base_price * nights;
    let service_fee = apply_rate(subtotal, SERVICE_FEE_BPS);
    let taxes = apply_rate(subtotal + cleaning_fee + service_fee, TAX_BPS);
    let total = subtotal + cleaning_fee + service_fee + taxes;

    PricingSnapshot {
        base_price,
        nights,
        subtotal,
        cleaning_fee,
        service_fee,
        taxes,
        total,
        currency: CURRENCY.to_string(),
    }
}

// Round half away from zero on integer rupees. Rust integer division
// truncates toward zero, so nudging by half the divisor first gives the
// required rounding for either sign.
fn apply_rate(amount: i64, rate_bps: i64) -> i64 {
    let scaled = amount * rate_bps;
    let half = if scaled >= 0 { 5_000 } else { -5_000 };
    (scaled + half) / 10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_reference_quote() {
        let quote = compute_pricing(3500, 3, 500);
        assert_eq!(quote.subtotal, 10_500);
        assert_eq!(quote.service_fee, 1_470);
        assert_eq!(quote.taxes, 998);
        assert_eq!(quote.total, 13_468);
        assert_eq!(quote.currency, "INR");
    }

    #[test]
    fn test_deterministic() {
        let a = compute_pricing(2750, 4, 300);
        let b = compute_pricing(2750, 4, 300);
        assert_eq!(a.subtotal, b.subtotal);
        assert_eq!(a.service_fee, b.service_fee);
        assert_eq!(a.taxes, b.taxes);
        assert_eq!(a.total, b.total);
    }

    #[test]
    fn test_no_cleaning_fee() {
        let quote = compute_pricing(1000, 2, 0);
        assert_eq!(quote.subtotal, 2_000);
        assert_eq!(quote.service_fee, 280);
        // (2000 + 0 + 280) * 0.08 = 182.4 -> 182
        assert_eq!(quote.taxes, 182);
        assert_eq!(quote.total, 2_462);
    }

    #[test]
    fn test_rounds_half_up() {
        // 25 * 0.14 = 3.5, half away from zero rounds up
        let quote = compute_pricing(25, 1, 0);
        assert_eq!(quote.service_fee, 4);
    }

    #[test]
    fn test_rounds_down_below_half() {
        // 31 * 0.14 = 4.34 -> 4
        let quote = compute_pricing(31, 1, 0);
        assert_eq!(quote.service_fee, 4);
    }

    #[test]
    fn test_nights_between() {
        assert_eq!(nights_between(date("2030-06-10"), date("2030-06-15")), 5);
        assert_eq!(nights_between(date("2030-06-10"), date("2030-06-11")), 1);
    }
}
