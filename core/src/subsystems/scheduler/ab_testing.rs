use crate::data_models::sequence::{AbTestResult, AbWinner, VariantCounts};

/// Runs the chi-square-approximation significance test between two
/// variants, per §4.6.1. Only meaningful once both variants have reached
/// `min_sample_size`; callers are expected to gate on that themselves.
pub fn analyze(a: VariantCounts, b: VariantCounts, min_sample_size: u64) -> Option<AbTestResult> {
    if a.sent < min_sample_size || b.sent < min_sample_size {
        return None;
    }

    let total_sent = (a.sent + b.sent) as f64;
    let total_converted = (a.converted + b.converted) as f64;
    if total_sent == 0.0 {
        return Some(AbTestResult {
            significant: false,
            p_value_approx: 1.0,
            winner: AbWinner::Inconclusive,
        });
    }
    let pooled_rate = total_converted / total_sent;

    let chi_square = [a, b]
        .iter()
        .map(|variant| {
            let expected = pooled_rate * variant.sent as f64;
            if expected == 0.0 {
                0.0
            } else {
                let observed = variant.converted as f64;
                (observed - expected).powi(2) / expected
            }
        })
        .sum::<f64>();

    let p_value_approx = (-chi_square / 2.0).exp();
    let significant = p_value_approx < 0.05;

    let winner = if !significant {
        AbWinner::Inconclusive
    } else if a.conversion_rate() > b.conversion_rate() {
        AbWinner::A
    } else if b.conversion_rate() > a.conversion_rate() {
        AbWinner::B
    } else {
        AbWinner::Inconclusive
    };

    Some(AbTestResult {
        significant,
        p_value_approx,
        winner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_sample_size_returns_none() {
        let a = VariantCounts { sent: 10, opened: 5, responded: 2, converted: 1 };
        let b = VariantCounts { sent: 10, opened: 5, responded: 2, converted: 1 };
        assert!(analyze(a, b, 100).is_none());
    }

    #[test]
    fn clearly_separated_rates_yield_a_significant_winner() {
        let a = VariantCounts { sent: 500, opened: 400, responded: 200, converted: 150 };
        let b = VariantCounts { sent: 500, opened: 300, responded: 100, converted: 40 };
        let result = analyze(a, b, 100).unwrap();
        assert!(result.significant);
        assert_eq!(result.winner, AbWinner::A);
    }

    #[test]
    fn nearly_identical_rates_are_inconclusive() {
        let a = VariantCounts { sent: 200, opened: 100, responded: 50, converted: 40 };
        let b = VariantCounts { sent: 200, opened: 100, responded: 50, converted: 41 };
        let result = analyze(a, b, 100).unwrap();
        assert!(!result.significant);
        assert_eq!(result.winner, AbWinner::Inconclusive);
    }
}
