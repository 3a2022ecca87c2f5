use crate::schema::{Cell, NumericMatrix, RawGrid};

/// Cell texts that stand for "no value" in hand-built statements.
const BLANK_MARKERS: [&str; 4] = ["", "-", "\u{2014}", "None"];

/// Converts one raw cell to a signed value. Blank, label-like and otherwise
/// unparseable cells are zero so they never disturb row totals.
pub fn normalize_cell(cell: &Cell) -> f64 {
    match cell {
        Cell::Empty => 0.0,
        Cell::Number(value) => finite_or_zero(*value),
        Cell::Text(text) => normalize_text(text),
    }
}

/// Parses accounting-style text: `$1,234.50`, `(500)` and `500-` are all understood.
pub fn normalize_text(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if BLANK_MARKERS.contains(&trimmed) {
        return 0.0;
    }

    let stripped: String = trimmed.chars().filter(|c| *c != '$' && *c != ',').collect();
    let stripped = stripped.trim();

    let signed = if stripped.contains('(') && stripped.contains(')') {
        format!("-{}", stripped.replace(['(', ')'], ""))
    } else if let Some(magnitude) = stripped.strip_suffix('-') {
        format!("-{}", magnitude)
    } else {
        stripped.to_string()
    };

    signed.trim().parse::<f64>().map(finite_or_zero).unwrap_or(0.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl NumericMatrix {
    /// Normalizes every cell of `grid`; short rows are padded with zeros.
    pub fn from_grid(grid: &RawGrid) -> Self {
        let rows = grid.height();
        let cols = grid.width();
        let mut values = vec![0.0; rows * cols];

        for (row_idx, row) in grid.rows().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                values[row_idx * cols + col_idx] = normalize_cell(cell);
            }
        }

        Self { values, rows, cols }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> f64 {
        normalize_cell(&Cell::Text(s.to_string()))
    }

    #[test]
    fn test_currency_and_thousands() {
        assert!((text("$1,234.50") - 1234.50).abs() < 1e-9);
        assert!((text("  $ 12,000 ") - 12000.0).abs() < 1e-9);
        assert!((text("1,000,000") - 1_000_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_accounting_negatives() {
        assert_eq!(text("(500)"), -500.0);
        assert_eq!(text("$(1,250.75)"), -1250.75);
        assert_eq!(text("500-"), -500.0);
        assert_eq!(text("-42"), -42.0);
    }

    #[test]
    fn test_blank_markers_are_zero() {
        assert_eq!(text("\u{2014}"), 0.0);
        assert_eq!(text("-"), 0.0);
        assert_eq!(text("   "), 0.0);
        assert_eq!(text("None"), 0.0);
        assert_eq!(normalize_cell(&Cell::Empty), 0.0);
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(text("abc"), 0.0);
        assert_eq!(text("Total Income"), 0.0);
        assert_eq!(text("--"), 0.0);
        assert_eq!(text("inf"), 0.0);
        assert_eq!(text("NaN"), 0.0);
        assert_eq!(normalize_cell(&Cell::Number(f64::INFINITY)), 0.0);
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(normalize_cell(&Cell::Number(-17.25)), -17.25);
        assert_eq!(text("1e3"), 1000.0);
    }

    #[test]
    fn test_matrix_pads_ragged_rows() {
        let grid = RawGrid::from_rows(vec![
            vec![Cell::from("Rent"), Cell::from("(10)"), Cell::from(5.0)],
            vec![Cell::from("x")],
        ]);
        let matrix = NumericMatrix::from_grid(&grid);
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 3);
        assert_eq!(matrix.row(0), &[0.0, -10.0, 5.0]);
        assert_eq!(matrix.row(1), &[0.0, 0.0, 0.0]);
        assert_eq!(matrix.nonzero_counts(), vec![0, 1, 1]);
    }
}
