use crate::contracts::CoreError;

/// # NDOC
/// component: `invariants`
/// purpose: Shared invariant checks used by multiple subsystems.
/// invariants:
///   - Validation helpers must return `CoreError::validation` for caller-safe failures.
///   - Helpers must not perform I/O or mutate external state.
pub fn ensure_non_empty_trimmed(value: &str, field: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!(
            "'{}' cannot be empty",
            field
        )));
    }
    Ok(())
}

/// # NDOC
/// component: `invariants`
/// purpose: Enforce an inclusive numeric bound with a user-safe error.
pub fn ensure_range_usize(value: usize, min: usize, max: usize, name: &str) -> Result<(), CoreError> {
    if value < min || value > max {
        return Err(CoreError::validation(format!(
            "'{}' must be in range {}..={}",
            name, min, max
        )));
    }
    Ok(())
}

pub fn ensure_range_f64(value: f64, min: f64, max: f64, name: &str) -> Result<(), CoreError> {
    if value < min || value > max {
        return Err(CoreError::validation(format!(
            "'{}' must be in range {}..={}",
            name, min, max
        )));
    }
    Ok(())
}

/// Bounds `duration_s` per channel kind, per the interaction data model invariant.
pub fn ensure_duration_for_channel(channel: &str, duration_s: u32) -> Result<(), CoreError> {
    let (min, max) = match channel {
        "call" => (30, 3600),
        "sms" | "email" | "whatsapp" => (0, 300),
        other => {
            return Err(CoreError::validation(format!(
                "unknown channel '{}' for duration bounds",
                other
            )))
        }
    };
    if duration_s < min || duration_s > max {
        return Err(CoreError::validation(format!(
            "duration_s {} out of range {}..={} for channel '{}'",
            duration_s, min, max, channel
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inv_global_core_001_rejects_empty_trimmed_string() {
        let err = ensure_non_empty_trimmed("   ", "topic").expect_err("must fail");
        assert!(err.message.contains("topic"));
    }

    #[test]
    fn inv_global_core_002_validates_usize_range() {
        assert!(ensure_range_usize(5, 1, 10, "max_sources").is_ok());
        assert!(ensure_range_usize(11, 1, 10, "max_sources").is_err());
    }

    #[test]
    fn inv_global_core_003_validates_f64_range() {
        assert!(ensure_range_f64(0.5, 0.0, 1.0, "score").is_ok());
        assert!(ensure_range_f64(1.5, 0.0, 1.0, "score").is_err());
    }

    #[test]
    fn inv_global_core_004_validates_channel_duration() {
        assert!(ensure_duration_for_channel("call", 45).is_ok());
        assert!(ensure_duration_for_channel("call", 10).is_err());
        assert!(ensure_duration_for_channel("sms", 120).is_ok());
        assert!(ensure_duration_for_channel("sms", 400).is_err());
    }
}
