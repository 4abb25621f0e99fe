use crate::data_models::performance::{classify_trend, PerformanceTrend, TrendDataPoint};

/// Builds a `PerformanceTrend` from ordered data points, comparing the
/// first and last points to derive `change_percent`.
pub fn analyze_trend(metric: &str, data_points: Vec<TrendDataPoint>) -> PerformanceTrend {
    let change_percent = match (data_points.first(), data_points.last()) {
        (Some(first), Some(last)) if first.value != 0.0 => {
            (last.value - first.value) / first.value * 100.0
        }
        _ => 0.0,
    };
    let (trend, significance) = classify_trend(change_percent);
    PerformanceTrend {
        metric: metric.to_string(),
        data_points,
        trend,
        change_percent,
        significance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::performance::{TrendDirection, TrendSignificance};
    use chrono::Utc;

    #[test]
    fn increasing_trend_with_high_significance() {
        let now = Utc::now();
        let points = vec![
            TrendDataPoint { timestamp: now, value: 100.0 },
            TrendDataPoint { timestamp: now, value: 120.0 },
        ];
        let trend = analyze_trend("conversion_rate", points);
        assert_eq!(trend.trend, TrendDirection::Increasing);
        assert_eq!(trend.significance, TrendSignificance::High);
    }

    #[test]
    fn single_point_is_stable_with_zero_change() {
        let now = Utc::now();
        let points = vec![TrendDataPoint { timestamp: now, value: 50.0 }];
        let trend = analyze_trend("csat", points);
        assert_eq!(trend.change_percent, 0.0);
        assert_eq!(trend.trend, TrendDirection::Stable);
    }
}
