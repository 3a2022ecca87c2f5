use crate::labeler::best_label;
use crate::schema::{
    ColumnBand, NumericMatrix, RawGrid, ResultRow, ResultTable, RowRecord, RowStatus,
};

/// One [`RowRecord`] per grid row, with month values taken from `band` and
/// the label from the cells left of it. Every record starts out kept.
pub fn build_records(
    grid: &RawGrid,
    matrix: &NumericMatrix,
    band: ColumnBand,
    min_label_chars: usize,
) -> Vec<RowRecord> {
    grid.rows()
        .enumerate()
        .map(|(index, row)| {
            let label = best_label(row, band.start, min_label_chars);
            RowRecord::new(index, label, matrix.month_values(index, band))
        })
        .collect()
}

/// Applies resolver output to the records. Statuses and records are index-aligned.
pub fn apply_statuses(records: &mut [RowRecord], statuses: Vec<RowStatus>) {
    for (record, status) in records.iter_mut().zip(statuses) {
        if let RowStatus::Pruned(reason) = status {
            record.prune(reason);
        }
    }
}

/// Collects kept, labelled rows in source order. Kept rows without a label
/// (separators, stray noise) are dropped silently.
pub fn extract(records: &[RowRecord]) -> ResultTable {
    let rows = records
        .iter()
        .filter(|record| record.status().is_kept() && !record.label.is_empty())
        .map(|record| ResultRow {
            account: record.label.clone(),
            status: record.status().to_string(),
            source_row: record.index,
            months: *record.monthly_values(),
            total: record.row_sum(),
        })
        .collect();

    ResultTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PruneReason, MONTHS};

    fn record(index: usize, label: &str, monthly: f64) -> RowRecord {
        RowRecord::new(index, label.to_string(), [monthly; MONTHS])
    }

    #[test]
    fn test_extract_keeps_labelled_layer_one_rows_in_order() {
        let mut records = vec![
            record(0, "Rent", 100.0),
            record(1, "", 3.0),
            record(2, "Parking", 20.0),
            record(3, "Total Income", 120.0),
            record(4, "Vacancy", 0.0),
        ];
        records[3].prune(PruneReason::Subtotal { first: 0, last: 2 });

        let table = extract(&records);

        assert_eq!(table.accounts(), vec!["Rent", "Parking", "Vacancy"]);
        assert_eq!(table.rows[1].source_row, 2);
        assert!(table.iter().all(|row| row.status == "Layer 1 Item"));
        assert!((table.rows[0].total - 1200.0).abs() < 1e-9);
        assert_eq!(table.rows[2].months, [0.0; MONTHS]);
    }

    #[test]
    fn test_build_records_reads_band_and_label() {
        let mut row: Vec<crate::schema::Cell> = vec!["".into(), "Utilities".into(), "x".into()];
        row.extend((1..=12).map(|m| crate::schema::Cell::Number(m as f64)));
        let grid = RawGrid::new(vec![row]);
        let matrix = NumericMatrix::from_grid(&grid);

        let records = build_records(&grid, &matrix, ColumnBand::new(3), 2);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Utilities");
        assert_eq!(records[0].monthly_values()[0], 1.0);
        assert_eq!(records[0].monthly_values()[11], 12.0);
        assert!((records[0].row_sum() - 78.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_statuses_marks_pruned_rows() {
        let mut records = vec![record(0, "A", 1.0), record(1, "B", 1.0)];
        apply_statuses(
            &mut records,
            vec![RowStatus::Kept, RowStatus::Pruned(PruneReason::NetCalculation)],
        );
        assert!(records[0].status().is_kept());
        assert_eq!(records[1].status().to_string(), "Pruned: Net Calculation (NOI)");
    }
}
