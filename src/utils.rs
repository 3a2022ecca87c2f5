use crate::schema::MONTHS;

/// `|a - b| <= abs_tol + rel_tol * |b|`.
pub fn is_close(a: f64, b: f64, abs_tol: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= abs_tol + rel_tol * b.abs()
}

/// Output column name for a zero-based month offset, e.g. `Month_1`.
pub fn month_column_name(month: usize) -> String {
    format!("Month_{}", month + 1)
}

pub fn month_column_names() -> Vec<String> {
    (0..MONTHS).map(month_column_name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_close_absolute() {
        assert!(is_close(10.0, 10.5, 0.5, 0.0));
        assert!(is_close(10.5, 10.0, 0.5, 0.0));
        assert!(!is_close(10.0, 10.51, 0.5, 0.0));
    }

    #[test]
    fn test_is_close_relative_scales_with_second_argument() {
        assert!(is_close(1_000_010.0, 1_000_000.0, 0.5, 1e-5));
        assert!(!is_close(1_000_011.0, 1_000_000.0, 0.5, 1e-5));
    }

    #[test]
    fn test_month_column_names() {
        let names = month_column_names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "Month_1");
        assert_eq!(names[11], "Month_12");
    }
}
