use crate::error::Result;
use crate::schema::ResultTable;
use crate::utils::month_column_names;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Adds a `Source_Row` column after `Status` pointing back at the sheet row.
    pub include_source_row: bool,
}

pub fn header(options: &ExportOptions) -> Vec<String> {
    let mut columns = vec!["Account".to_string(), "Status".to_string()];
    if options.include_source_row {
        columns.push("Source_Row".to_string());
    }
    columns.extend(month_column_names());
    columns.push("Total".to_string());
    columns
}

/// Writes `table` as CSV: `Account,Status,[Source_Row,]Month_1..Month_12,Total`.
pub fn write_csv<W: Write>(table: &ResultTable, writer: W, options: &ExportOptions) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header(options))?;

    for row in table {
        let mut record = vec![row.account.clone(), row.status.clone()];
        if options.include_source_row {
            record.push(row.source_row.to_string());
        }
        record.extend(row.months.iter().map(f64::to_string));
        record.push(row.total.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(table: &ResultTable, path: &Path, options: &ExportOptions) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file, options)
}

pub fn to_csv_string(table: &ResultTable, options: &ExportOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer, options)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
