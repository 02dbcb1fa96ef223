//! CSV export of a probability table: `Team` followed by one column per bracket, percentages
//! to two decimals.

use std::io::Write;

use crate::projector::table::SimulationResult;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output is not valid utf-8")]
    Utf8,
}

pub fn write_csv<W: Write>(result: &SimulationResult, writer: W) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    let mut header = Vec::with_capacity(result.brackets.len() + 1);
    header.push("Team");
    header.extend(result.brackets.iter().map(String::as_str));
    out.write_record(&header)?;

    for row in &result.rows {
        let mut record = Vec::with_capacity(row.percentages.len() + 1);
        record.push(row.team.clone());
        record.extend(row.percentages.iter().map(|value| format!("{value:.2}")));
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn to_csv_string(result: &SimulationResult) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(result, &mut buffer)?;
    String::from_utf8(buffer).map_err(|_| ExportError::Utf8)
}
