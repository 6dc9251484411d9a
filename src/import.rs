use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::model::entity::Entry;
use crate::model::roster::{Roster, RosterError};

const NAME_HEADERS: [&str; 5] = ["姓名", "名字", "name", "学生", "学生姓名"];
const ID_HEADERS: [&str; 5] = ["学号", "id", "编号", "序号", "工号"];

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("input contains no names")]
    Empty,
    #[error("no column looks like a name column (headers: {0})")]
    NoNameColumn(String),
    #[error("no column named `{0}`")]
    UnknownColumn(String),
    #[error("malformed table: {0}")]
    Malformed(String),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// `S001`, `S002`, ... for the zero-based `index`.
pub fn placeholder_id(index: usize) -> String {
    format!("S{:03}", index + 1)
}

/// Names separated by newlines, commas (ASCII or full-width) or whitespace.
/// Ids are assigned by position.
pub fn parse_text(input: &str) -> Result<Roster, ImportError> {
    let entries: Vec<Entry> = input
        .split(|c: char| c == ',' || c == '，' || c.is_whitespace())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .enumerate()
        .map(|(index, name)| Entry::new(placeholder_id(index), name))
        .collect();
    if entries.is_empty() {
        return Err(ImportError::Empty);
    }
    debug!(count = entries.len(), "parsed names from text");
    Ok(Roster::new(entries)?)
}


/// Which columns of a table hold the name and, optionally, the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub name: usize,
    pub id: Option<usize>,
}

impl ColumnMapping {
    /// Guesses columns from header text, case-insensitively.
    pub fn detect(headers: &[&str]) -> Option<ColumnMapping> {
        let matches = |header: &str, keywords: &[&str]| {
            let header = header.to_lowercase();
            keywords.iter().any(|keyword| header.contains(&keyword.to_lowercase()))
        };
        let name = headers.iter().position(|header| matches(*header, &NAME_HEADERS))?;
        let id = headers.iter()
            .enumerate()
            .position(|(index, header)| index != name && matches(*header, &ID_HEADERS));
        Some(ColumnMapping { name, id })
    }

    /// Looks columns up by header text or by letter label (`A`, `B`, ...).
    pub fn choose(headers: &[&str], name: &str, id: Option<&str>) -> Result<ColumnMapping, ImportError> {
        let find = |wanted: &str| {
            headers.iter()
                .enumerate()
                .position(|(index, header)| {
                    header.eq_ignore_ascii_case(wanted) || column_label(index).eq_ignore_ascii_case(wanted)
                })
                .ok_or_else(|| ImportError::UnknownColumn(wanted.to_string()))
        };
        Ok(ColumnMapping { name: find(name)?, id: id.map(find).transpose()? })
    }
}

/// How to read a delimited table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions<'a> {
    /// The first row names the columns. Without it, columns are labelled `A`, `B`, ...
    pub has_headers: bool,
    /// Name column by header text or letter; detected from headers when absent.
    pub name_column: Option<&'a str>,
    pub id_column: Option<&'a str>,
}

impl Default for TableOptions<'_> {
    fn default() -> Self {
        TableOptions { has_headers: true, name_column: None, id_column: None }
    }
}

/// `A`..`Z`, then `AA`, `AB`, ... like spreadsheet columns.
pub fn column_label(index: usize) -> String {
    let mut label = Vec::new();
    let mut rest = index + 1;
    while rest > 0 {
        rest -= 1;
        label.push(b'A' + (rest % 26) as u8);
        rest /= 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// A delimited table, tab-separated when its first line has a tab and
/// comma-separated otherwise. Quoted cells may contain the delimiter. Rows
/// without a name are skipped. Rows without an id get a placeholder numbered
/// by kept rows, moved past any id the table already uses.
pub fn parse_table(input: &str, options: &TableOptions) -> Result<Roster, ImportError> {
    let first_line = input.lines().find(|line| !line.trim().is_empty()).ok_or(ImportError::Empty)?;
    let delimiter = if first_line.contains('\t') { b'\t' } else { b',' };
    let mut records = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes())
        .into_records()
        .collect::<Result<Vec<csv::StringRecord>, csv::Error>>()
        .map_err(|err| ImportError::Malformed(err.to_string()))?
        .into_iter();

    let headers: Vec<String> = if options.has_headers {
        records.next().ok_or(ImportError::Empty)?.iter().map(str::to_string).collect()
    } else {
        let width = records.as_slice().first().map_or(0, csv::StringRecord::len);
        (0..width).map(column_label).collect()
    };
    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();

    let mapping = match options.name_column {
        Some(name) => ColumnMapping::choose(&headers, name, options.id_column)?,
        None => ColumnMapping::detect(&headers)
            .ok_or_else(|| ImportError::NoNameColumn(headers.join(", ")))?,
    };

    let rows: Vec<(String, Option<String>)> = records
        .filter_map(|record| {
            let name = record.get(mapping.name).filter(|name| !name.is_empty())?.to_string();
            let id = mapping.id
                .and_then(|id| record.get(id))
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            Some((name, id))
        })
        .collect();
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }

    let mut used: HashSet<String> = rows.iter().filter_map(|(_, id)| id.clone()).collect();
    let mut entries = Vec::with_capacity(rows.len());
    for (index, (name, id)) in rows.into_iter().enumerate() {
        let id = match id {
            Some(id) => id,
            None => {
                let id = (index..).map(placeholder_id).find(|id| !used.contains(id)).unwrap_or_default();
                used.insert(id.clone());
                id
            }
        };
        entries.push(Entry::new(id, name));
    }
    debug!(count = entries.len(), ?mapping, "parsed rows from table");
    Ok(Roster::new(entries)?)
}
