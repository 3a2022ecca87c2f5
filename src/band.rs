use crate::error::{Result, T12Error};
use crate::schema::{ColumnBand, NumericMatrix, MONTHS};
use log::debug;

/// Finds the densest run of twelve numerically populated columns.
///
/// Every candidate window is scored by the number of non-zero cells it
/// covers. The first maximum wins, so equal scores resolve to the leftmost
/// window and an all-zero sheet resolves to column 0.
pub fn locate_band(matrix: &NumericMatrix) -> Result<ColumnBand> {
    if matrix.rows() == 0 {
        return Err(T12Error::EmptyInput);
    }
    if matrix.cols() < MONTHS {
        return Err(T12Error::GridTooNarrow {
            columns: matrix.cols(),
            required: MONTHS,
        });
    }

    let scores = window_scores(&matrix.nonzero_counts());

    let mut best_start = 0;
    let mut best_score = scores[0];
    for (start, &score) in scores.iter().enumerate().skip(1) {
        if score > best_score {
            best_score = score;
            best_start = start;
        }
    }

    debug!(
        "Month band starts at column {} ({} non-zero cells across {} candidate windows)",
        best_start,
        best_score,
        scores.len()
    );

    Ok(ColumnBand::new(best_start))
}

/// Sliding-window sum of column densities, one entry per candidate start.
/// Callers guarantee `counts.len() >= MONTHS`.
pub fn window_scores(counts: &[usize]) -> Vec<usize> {
    if counts.len() < MONTHS {
        return Vec::new();
    }

    let mut scores = Vec::with_capacity(counts.len() - MONTHS + 1);
    let mut score: usize = counts[..MONTHS].iter().sum();
    scores.push(score);

    for start in 1..=counts.len() - MONTHS {
        score = score + counts[start + MONTHS - 1] - counts[start - 1];
        scores.push(score);
    }

    scores
}
