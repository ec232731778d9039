use serde::{Deserialize, Serialize};

use crate::consts::NGFF_VERSION;
use crate::error::{HcsError, Result};

/// Physical plate formats, by well count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateLayout {
    #[serde(rename = "18")]
    I18,
    #[serde(rename = "24")]
    I24,
    #[default]
    #[serde(rename = "96")]
    I96,
    #[serde(rename = "384")]
    I384,
}

impl PlateLayout {
    fn dimensions(&self) -> (usize, usize) {
        match self {
            Self::I18 => (3, 6),
            Self::I24 => (4, 6),
            Self::I96 => (8, 12),
            Self::I384 => (16, 24),
        }
    }

    /// Row names (`A`, `B`, ...) and zero-padded column names (`01`, ...).
    pub fn rows_and_columns(&self) -> (Vec<String>, Vec<String>) {
        let (rows, cols) = self.dimensions();
        let rows = (b'A'..).take(rows).map(|b| (b as char).to_string()).collect();
        let cols = (1..=cols).map(|c| format!("{c:02}")).collect();
        (rows, cols)
    }

    pub fn well_count(&self) -> usize {
        let (rows, cols) = self.dimensions();
        rows * cols
    }
}

impl std::fmt::Display for PlateLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.well_count())
    }
}

impl std::str::FromStr for PlateLayout {
    type Err = HcsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "18" => Ok(Self::I18),
            "24" => Ok(Self::I24),
            "96" => Ok(Self::I96),
            "384" => Ok(Self::I384),
            other => Err(HcsError::config(format!(
                "unknown plate layout '{other}' (expected 18, 24, 96 or 384)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellRef {
    pub path: String,

    #[serde(rename = "rowIndex")]
    pub row_index: usize,

    #[serde(rename = "columnIndex")]
    pub column_index: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    pub columns: Vec<Column>,

    pub rows: Vec<Row>,

    pub wells: Vec<WellRef>,

    pub name: String,

    // [sic!]
    pub field_count: usize,

    pub version: String,
}

impl Plate {
    /// Plate metadata for `layout` listing the wells at `well_paths`
    /// (`"E/07"` style). Every path must name a row and a column of the layout.
    pub fn new<S: AsRef<str>>(name: &str, layout: PlateLayout, well_paths: &[S]) -> Result<Self> {
        let (rows, columns) = layout.rows_and_columns();
        let wells = well_paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let (row, col) = path.split_once('/').ok_or_else(|| {
                    HcsError::config(format!("well path '{path}' is not of the form row/column"))
                })?;
                let row_index = rows.iter().position(|r| r == row);
                let column_index = columns.iter().position(|c| c == col);
                match (row_index, column_index) {
                    (Some(row_index), Some(column_index)) => Ok(WellRef {
                        path: path.to_string(),
                        row_index,
                        column_index,
                    }),
                    _ => Err(HcsError::config(format!(
                        "well '{path}' does not exist on a {layout}-well plate"
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns: columns.into_iter().map(|name| Column { name }).collect(),
            rows: rows.into_iter().map(|name| Row { name }).collect(),
            wells,
            name: name.to_string(),
            field_count: 1,
            version: NGFF_VERSION.to_string(),
        })
    }
}
