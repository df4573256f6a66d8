use crate::error::IoResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tessera_ml_data::{Cell, DataFrame};

/// Read a CSV file into a [`DataFrame`].
///
/// Each field becomes a `Cell::Float` when it parses as a number and a
/// `Cell::Text` otherwise. Without a header row the columns are named
/// `column_0`, `column_1`, and so on.
pub fn read_csv<P: AsRef<Path>>(path: P, has_header: bool) -> IoResult<DataFrame> {
    let file = File::open(path.as_ref())?;
    let df = read_csv_from(file, has_header)?;
    log::debug!(
        "read {} rows x {} cols from {}",
        df.rows(),
        df.cols(),
        path.as_ref().display()
    );
    Ok(df)
}

/// Same as [`read_csv`] over any reader.
pub fn read_csv_from<R: Read>(reader: R, has_header: bool) -> IoResult<DataFrame> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut names: Vec<String> = if has_header {
        rdr.headers()?.iter().map(|h| h.to_string()).collect()
    } else {
        Vec::new()
    };

    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
    for result in rdr.records() {
        let record = result?;
        if names.is_empty() {
            names = (0..record.len()).map(|i| format!("column_{}", i)).collect();
            columns = vec![Vec::new(); names.len()];
        }
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            column.push(Cell::parse(field));
        }
    }

    let mut df = DataFrame::new();
    for (name, cells) in names.iter().zip(columns) {
        df.add_column(name, cells)?;
    }
    Ok(df)
}
