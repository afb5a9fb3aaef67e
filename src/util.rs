use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Human-readable base-pair count.
pub fn format_bp(length: u64) -> String {
    const UNITS: [&str; 4] = ["bp", "kbp", "Mbp", "Gbp"];

    let mut value = length as f64;
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", length, UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Deterministic value in `[0, 1)` derived from an id.
pub fn stable_unit(id: &str) -> f32 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();
    ((hash >> 40) as f64 / (1u64 << 24) as f64) as f32
}

/// Log-scaled position of `value` within `[min, max]`, 0.5 when the range is empty.
pub fn normalize_log(value: f64, min: f64, max: f64) -> f32 {
    let min = min.max(1.0);
    let max = max.max(min);
    let value = value.max(1.0);

    let denominator = max.ln() - min.ln();
    if denominator.abs() < f64::EPSILON {
        return 0.5;
    }

    ((value.ln() - min.ln()) / denominator).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_base_pairs() {
        assert_eq!(format_bp(950), "950 bp");
        assert_eq!(format_bp(12_500), "12.50 kbp");
        assert_eq!(format_bp(3_200_000), "3.20 Mbp");
    }

    #[test]
    fn stable_unit_is_deterministic_and_bounded() {
        let value = stable_unit("contig_7");
        assert_eq!(value, stable_unit("contig_7"));
        assert!((0.0..1.0).contains(&value));
    }

    #[test]
    fn normalize_log_handles_flat_ranges() {
        assert_eq!(normalize_log(10.0, 5.0, 5.0), 0.5);
        assert_eq!(normalize_log(1_000.0, 10.0, 1_000.0), 1.0);
        assert_eq!(normalize_log(10.0, 10.0, 1_000.0), 0.0);
    }
}
