use crate::error::MeetingSheetError;
use regex::Regex;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Errors related to A1-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// Represents an A1-style cell range with optional boundaries and an optional sheet name,
/// e.g. `(unsorted)!D3:L1000`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Range {
    /// Sheet the range belongs to, None for the first visible sheet
    pub sheet_name: Option<String>,
    /// Lower row bound (0-based index), None for unbounded
    pub row_lower_bound: Option<usize>,
    /// Upper row bound (0-based index), None for unbounded
    pub row_upper_bound: Option<usize>,
    /// Lower column bound (0-based index), None for unbounded
    pub col_lower_bound: Option<usize>,
    /// Upper column bound (0-based index), None for unbounded
    pub col_upper_bound: Option<usize>,
}

impl Range {
    /// Number of columns covered, None when either column bound is open.
    pub fn width(&self) -> Option<usize> {
        let (lower, upper) = self.col_lower_bound.zip(self.col_upper_bound)?;
        upper.checked_sub(lower).map(|delta| delta + 1)
    }

    /// Number of rows covered, None when either row bound is open.
    pub fn height(&self) -> Option<usize> {
        let (lower, upper) = self.row_lower_bound.zip(self.row_upper_bound)?;
        upper.checked_sub(lower).map(|delta| delta + 1)
    }
}

/// Converts column letters to a 0-based index: A = 0, Z = 25, AA = 26.
fn col_to_index(letters: &str) -> Option<usize> {
    letters
        .chars()
        .map(|letter| letter as usize - 'A' as usize + 1)
        .reduce(|index, digit| index * 26 + digit)
        .map(|column| column - 1)
}

/// Converts a 1-based row number to a 0-based index.
fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse()
        .ok()
        .filter(|row| *row > 0)
        .map(|row: usize| row - 1)
}

/// Converts a 0-based column index back to letters.
fn index_to_col(index: usize) -> String {
    let mut letters = Vec::new();
    let mut column = index + 1;
    while column > 0 {
        let remainder = (column - 1) % 26;
        letters.push((b'A' + remainder as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl TryFrom<&str> for Range {
    type Error = MeetingSheetError;

    /// Parses an A1 range string (e.g., "A1", "B2:C5", "A:C", "1:10", "Sheet1!D3:L1000").
    /// Sheet names may be quoted with single quotes.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (sheet_name, cells) = match value.rsplit_once('!') {
            Some((sheet, cells)) => (Some(unquote(sheet)), cells),
            None => (None, value),
        };
        if sheet_name.as_deref() == Some("") {
            Err(RangeError::FormatError(value.to_owned()))?;
        }

        let pattern = Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern");
        let cells = cells.to_ascii_uppercase();
        let captures = pattern
            .captures(cells.as_str())
            .filter(|_| !cells.is_empty())
            .ok_or(RangeError::FormatError(value.to_owned()))?;
        Ok(Range {
            sheet_name,
            col_lower_bound: captures
                .get(1)
                .map(|matcher| matcher.as_str())
                .and_then(col_to_index),
            row_lower_bound: captures
                .get(2)
                .map(|matcher| matcher.as_str())
                .and_then(row_to_index),
            col_upper_bound: captures
                .get(4)
                .map(|matcher| matcher.as_str())
                .and_then(col_to_index),
            row_upper_bound: captures
                .get(5)
                .map(|matcher| matcher.as_str())
                .and_then(row_to_index),
        })
    }
}

fn unquote(sheet: &str) -> String {
    sheet
        .strip_prefix('\'')
        .and_then(|sheet| sheet.strip_suffix('\''))
        .map(|sheet| sheet.replace("''", "'"))
        .unwrap_or_else(|| sheet.to_owned())
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(sheet_name) = &self.sheet_name {
            let plain = sheet_name
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || "_()".contains(character));
            if plain {
                write!(f, "{sheet_name}!")?;
            } else {
                write!(f, "'{}'!", sheet_name.replace('\'', "''"))?;
            }
        }
        let cell = |col: Option<usize>, row: Option<usize>| {
            format!(
                "{}{}",
                col.map(index_to_col).unwrap_or_default(),
                row.map(|row| (row + 1).to_string()).unwrap_or_default()
            )
        };
        write!(f, "{}", cell(self.col_lower_bound, self.row_lower_bound))?;
        if self.col_upper_bound.is_some() || self.row_upper_bound.is_some() {
            write!(f, ":{}", cell(self.col_upper_bound, self.row_upper_bound))?;
        }
        Ok(())
    }
}
