use crate::error::{DataError, DataResult};
use std::collections::BTreeSet;
use std::fmt;
use tessera_ml_core::DenseMatrix;

/// Rows shown by the `Display` impl before truncating.
const DISPLAY_ROWS: usize = 10;

/// One value of a heterogeneous column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Float(f64),
    Int(i64),
    Text(String),
}

impl Cell {
    /// Infer a cell from raw text: a float when it parses as one, text otherwise.
    pub fn parse(raw: &str) -> Cell {
        match raw.trim().parse::<f64>() {
            Ok(v) => Cell::Float(v),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    /// Numeric value of the cell; text coerces to `0.0`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Float(v) => *v,
            Cell::Int(v) => *v as f64,
            Cell::Text(_) => 0.0,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    cells: Vec<Cell>,
}

/// Column-oriented table of [`Cell`]s with named, ordered columns.
///
/// Every column holds the same number of rows. The first column added fixes
/// the row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Column>,
    rows: usize,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn position(&self, name: &str) -> DataResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Borrow a whole column by name.
    pub fn column(&self, name: &str) -> DataResult<&[Cell]> {
        let idx = self.position(name)?;
        Ok(&self.columns[idx].cells)
    }

    /// Cell at `row` in the named column.
    pub fn at(&self, row: usize, name: &str) -> DataResult<&Cell> {
        if row >= self.rows {
            return Err(DataError::RowOutOfBounds {
                index: row,
                rows: self.rows,
            });
        }
        let idx = self.position(name)?;
        Ok(&self.columns[idx].cells[row])
    }

    /// Cell at `(row, col)` by position.
    pub fn at_index(&self, row: usize, col: usize) -> DataResult<&Cell> {
        if row >= self.rows {
            return Err(DataError::RowOutOfBounds {
                index: row,
                rows: self.rows,
            });
        }
        let column = self.columns.get(col).ok_or(DataError::ColumnOutOfBounds {
            index: col,
            cols: self.columns.len(),
        })?;
        Ok(&column.cells[row])
    }

    /// Append a column. Its length must match the existing row count.
    pub fn add_column(&mut self, name: &str, cells: Vec<Cell>) -> DataResult<()> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(DataError::DuplicateColumn(name.to_string()));
        }
        if self.columns.is_empty() {
            self.rows = cells.len();
        } else if cells.len() != self.rows {
            return Err(DataError::LengthMismatch {
                expected: self.rows,
                got: cells.len(),
            });
        }
        self.columns.push(Column {
            name: name.to_string(),
            cells,
        });
        Ok(())
    }

    /// Remove a column. Dropping the last column resets the row count to zero.
    pub fn drop_column(&mut self, name: &str) -> DataResult<()> {
        let idx = self.position(name)?;
        self.columns.remove(idx);
        if self.columns.is_empty() {
            self.rows = 0;
        }
        Ok(())
    }

    /// New frame holding the first `n` rows (or all of them if fewer).
    pub fn head(&self, n: usize) -> DataFrame {
        let take = n.min(self.rows);
        DataFrame {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    cells: c.cells[..take].to_vec(),
                })
                .collect(),
            rows: take,
        }
    }

    /// New frame with the rows whose cell in `name` satisfies `predicate`.
    pub fn filter<F>(&self, name: &str, predicate: F) -> DataResult<DataFrame>
    where
        F: Fn(&Cell) -> bool,
    {
        let idx = self.position(name)?;
        let keep: Vec<usize> = self.columns[idx]
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| predicate(cell))
            .map(|(i, _)| i)
            .collect();

        Ok(DataFrame {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    cells: keep.iter().map(|&i| c.cells[i].clone()).collect(),
                })
                .collect(),
            rows: keep.len(),
        })
    }

    /// Replace the two text categories of a column with `0.0` and `1.0`.
    ///
    /// With `categories == None` the two distinct text values are detected
    /// and assigned in sorted order. Numeric cells are left as they are. The
    /// column is only modified when every text cell maps to a category.
    pub fn encode_binary(&mut self, name: &str, categories: Option<(&str, &str)>) -> DataResult<()> {
        let idx = self.position(name)?;
        let cells = &self.columns[idx].cells;

        let (zero, one) = match categories {
            Some((zero, one)) => (zero.to_string(), one.to_string()),
            None => {
                let unique: Vec<&str> = cells
                    .iter()
                    .filter_map(Cell::as_text)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                match unique.as_slice() {
                    [zero, one] => (zero.to_string(), one.to_string()),
                    _ => {
                        return Err(DataError::CategoryCount {
                            column: name.to_string(),
                            found: unique.len(),
                        })
                    }
                }
            }
        };

        let mut encoded = Vec::with_capacity(cells.len());
        for cell in cells {
            encoded.push(match cell.as_text() {
                Some(v) if v == zero => Cell::Float(0.0),
                Some(v) if v == one => Cell::Float(1.0),
                Some(v) => {
                    return Err(DataError::UnexpectedCategory {
                        column: name.to_string(),
                        value: v.to_string(),
                    })
                }
                None => cell.clone(),
            });
        }
        self.columns[idx].cells = encoded;
        Ok(())
    }

    /// Gather the named columns into a `(rows, columns.len())` matrix.
    ///
    /// Integers are widened to `f64`; text cells become `0.0`.
    pub fn to_matrix(&self, columns: &[&str]) -> DataResult<DenseMatrix<f64>> {
        let positions = columns
            .iter()
            .map(|name| self.position(name))
            .collect::<DataResult<Vec<_>>>()?;

        let mut m = DenseMatrix::new(self.rows, positions.len())?;
        for (c, &pos) in positions.iter().enumerate() {
            for (r, cell) in self.columns[pos].cells.iter().enumerate() {
                m.set(r, c, cell.as_f64())?;
            }
        }
        Ok(m)
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "Empty DataFrame");
        }
        writeln!(f, "DataFrame ({} rows x {} cols)", self.rows, self.columns.len())?;
        writeln!(f, "{}", self.column_names().join("\t"))?;
        writeln!(f, "{}", "-".repeat(self.columns.len() * 8))?;
        for r in 0..self.rows.min(DISPLAY_ROWS) {
            for c in &self.columns {
                write!(f, "{}\t", c.cells[r])?;
            }
            writeln!(f)?;
        }
        if self.rows > DISPLAY_ROWS {
            writeln!(f, "...")?;
        }
        Ok(())
    }
}
