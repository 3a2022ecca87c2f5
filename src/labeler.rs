use crate::schema::Cell;

/// Picks the account label for a row: the longest trimmed text left of the
/// month band with at least `min_chars` characters. Ties go to the leftmost
/// cell; an empty string means the row has no usable label.
pub fn best_label(row: &[Cell], data_start: usize, min_chars: usize) -> String {
    let mut best: Option<(usize, String)> = None;

    for cell in row.iter().take(data_start) {
        let text = cell.display_text();
        let text = text.trim();
        let len = text.chars().count();
        if len < min_chars {
            continue;
        }
        if best.as_ref().map_or(true, |(best_len, _)| len > *best_len) {
            best = Some((len, text.to_string()));
        }
    }

    best.map(|(_, label)| label).unwrap_or_default()
}
