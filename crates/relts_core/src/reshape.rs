//! In-memory reshaping of query results.
//!
//! Nothing here touches storage. Every transform is deterministic: rows are sorted by
//! timestamp and columns by `(location, parameter)` no matter how the input was ordered.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::{Scalar, ValueRow};

pub const DEFAULT_SEPARATOR: &str = "|";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKey {
    pub location: String,
    pub parameter: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WideRow {
    pub timestamp: i64,
    /// One cell per table column, `None` where the pair has no value at this timestamp.
    pub cells: Vec<Option<Scalar>>,
}

/// One row per timestamp, one column per observed `(location, parameter)` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct WideTable {
    separator: String,
    fixed_location: Option<String>,
    columns: Vec<ColumnKey>,
    rows: Vec<WideRow>,
}

impl WideTable {
    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn fixed_location(&self) -> Option<&str> {
        self.fixed_location.as_deref()
    }

    pub fn label(&self, column: &ColumnKey) -> String {
        match self.fixed_location {
            Some(_) => column.parameter.clone(),
            None => format!("{}{}{}", column.location, self.separator, column.parameter),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|column| self.label(column)).collect()
    }

    /// Cell lookup by label, as rendered by [`WideTable::label`].
    pub fn cell(&self, timestamp: i64, label: &str) -> Option<&Scalar> {
        let index = self
            .columns
            .iter()
            .position(|column| self.label(column) == label)?;
        let row = self
            .rows
            .binary_search_by_key(&timestamp, |row| row.timestamp)
            .ok()?;
        self.rows[row].cells[index].as_ref()
    }

    /// Back to long rows, skipping empty cells. Ordered by timestamp, then column.
    pub fn to_long_rows(&self) -> Vec<ValueRow> {
        let mut out = Vec::new();
        for row in &self.rows {
            for (column, cell) in self.columns.iter().zip(&row.cells) {
                if let Some(value) = cell {
                    out.push(ValueRow {
                        timestamp: row.timestamp,
                        location: column.location.clone(),
                        parameter: column.parameter.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        out
    }

    /// Column-major view of the table, row order preserved.
    pub fn to_columns(&self) -> ColumnSeries {
        let timestamp = self.rows.iter().map(|row| row.timestamp).collect();
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let values = self
                    .rows
                    .iter()
                    .map(|row| row.cells[index].clone())
                    .collect();
                (self.label(column), values)
            })
            .collect();
        ColumnSeries { timestamp, columns }
    }
}

impl Serialize for WideTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let labels = self.labels();
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&WideRecord {
                labels: &labels,
                row,
            })?;
        }
        seq.end()
    }
}

struct WideRecord<'a> {
    labels: &'a [String],
    row: &'a WideRow,
}

impl Serialize for WideRecord<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.labels.len() + 1))?;
        map.serialize_entry("timestamp", &self.row.timestamp)?;
        for (label, cell) in self.labels.iter().zip(&self.row.cells) {
            map.serialize_entry(label, cell)?;
        }
        map.end()
    }
}

/// One sequence per column, the `timestamp` column first.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSeries {
    pub timestamp: Vec<i64>,
    pub columns: Vec<(String, Vec<Option<Scalar>>)>,
}

impl ColumnSeries {
    pub fn column(&self, label: &str) -> Option<&[Option<Scalar>]> {
        self.columns
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, values)| values.as_slice())
    }
}

impl Serialize for ColumnSeries {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        for (label, values) in &self.columns {
            map.serialize_entry(label, values)?;
        }
        map.end()
    }
}

/// A value row with its location stripped off.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterRow {
    pub timestamp: i64,
    #[serde(rename = "par")]
    pub parameter: String,
    #[serde(rename = "val")]
    pub value: Scalar,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationRows {
    pub location: String,
    pub rows: Vec<ParameterRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocationTable {
    pub location: String,
    pub table: WideTable,
}

pub fn to_wide_table(rows: &[ValueRow], separator: &str) -> WideTable {
    pivot(
        rows.iter().map(|row| {
            (
                row.timestamp,
                row.location.as_str(),
                row.parameter.as_str(),
                &row.value,
            )
        }),
        separator,
        None,
    )
}

pub fn to_columns(rows: &[ValueRow], separator: &str) -> ColumnSeries {
    to_wide_table(rows, separator).to_columns()
}

/// Groups rows by location in first-seen order; row order within a group is kept.
pub fn partition_by_location(rows: &[ValueRow]) -> Vec<LocationRows> {
    let mut groups: Vec<LocationRows> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let slot = *index.entry(row.location.as_str()).or_insert_with(|| {
            groups.push(LocationRows {
                location: row.location.clone(),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].rows.push(ParameterRow {
            timestamp: row.timestamp,
            parameter: row.parameter.clone(),
            value: row.value.clone(),
        });
    }
    groups
}

/// One wide table per location, columns keyed by parameter name only.
pub fn tables_per_location(rows: &[ValueRow]) -> Vec<LocationTable> {
    partition_by_location(rows)
        .into_iter()
        .map(|group| {
            let table = pivot(
                group.rows.iter().map(|row| {
                    (
                        row.timestamp,
                        group.location.as_str(),
                        row.parameter.as_str(),
                        &row.value,
                    )
                }),
                DEFAULT_SEPARATOR,
                Some(group.location.clone()),
            );
            LocationTable {
                location: group.location,
                table,
            }
        })
        .collect()
}

fn pivot<'a>(
    items: impl Iterator<Item = (i64, &'a str, &'a str, &'a Scalar)>,
    separator: &str,
    fixed_location: Option<String>,
) -> WideTable {
    let mut cells: BTreeMap<i64, HashMap<(&'a str, &'a str), &'a Scalar>> = BTreeMap::new();
    let mut pairs: BTreeSet<(&'a str, &'a str)> = BTreeSet::new();
    for (timestamp, location, parameter, value) in items {
        pairs.insert((location, parameter));
        // A repeated triple keeps its last value.
        cells
            .entry(timestamp)
            .or_default()
            .insert((location, parameter), value);
    }
    let rows = cells
        .into_iter()
        .map(|(timestamp, values)| WideRow {
            timestamp,
            cells: pairs
                .iter()
                .map(|pair| values.get(pair).map(|value| (*value).clone()))
                .collect(),
        })
        .collect();
    let columns = pairs
        .into_iter()
        .map(|(location, parameter)| ColumnKey {
            location: location.to_string(),
            parameter: parameter.to_string(),
        })
        .collect();
    WideTable {
        separator: separator.to_string(),
        fixed_location,
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::{
        partition_by_location, tables_per_location, to_columns, to_wide_table, DEFAULT_SEPARATOR,
    };
    use crate::{Scalar, ValueRow};

    fn sample() -> Vec<ValueRow> {
        vec![
            ValueRow::new(120, "there", "bbb", 3.14),
            ValueRow::new(60, "here", "bbb", 1.23),
            ValueRow::new(60, "there", "ccc", -1.0),
            ValueRow::new(120, "here", "aaa", 42),
        ]
    }

    #[test]
    fn wide_table_sorts_rows_and_columns() {
        let table = to_wide_table(&sample(), DEFAULT_SEPARATOR);
        assert_eq!(
            table.labels(),
            vec!["here|aaa", "here|bbb", "there|bbb", "there|ccc"]
        );
        let timestamps: Vec<_> = table.rows().iter().map(|row| row.timestamp).collect();
        assert_eq!(timestamps, vec![60, 120]);
        assert_eq!(table.cell(60, "here|bbb"), Some(&Scalar::Float(1.23)));
        assert_eq!(table.cell(60, "here|aaa"), None);
        assert_eq!(table.rows()[0].cells[0], None);
    }

    #[test]
    fn wide_table_ignores_input_order() {
        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(
            to_wide_table(&sample(), "/"),
            to_wide_table(&reversed, "/")
        );
    }

    #[test]
    fn wide_table_only_has_observed_pairs() {
        let rows = vec![
            ValueRow::new(1, "a", "x", 1),
            ValueRow::new(1, "b", "y", 2),
        ];
        let table = to_wide_table(&rows, DEFAULT_SEPARATOR);
        assert_eq!(table.labels(), vec!["a|x", "b|y"]);
    }

    #[test]
    fn flattening_reproduces_the_original_facts() {
        let rows = sample();
        let table = to_wide_table(&rows, DEFAULT_SEPARATOR);
        let original: BTreeSet<String> = rows.iter().map(|row| format!("{row:?}")).collect();
        let flattened: BTreeSet<String> = table
            .to_long_rows()
            .iter()
            .map(|row| format!("{row:?}"))
            .collect();
        assert_eq!(original, flattened);
        assert_eq!(table.to_long_rows().len(), rows.len());
    }

    #[test]
    fn wide_table_serializes_as_records() {
        let rows = vec![
            ValueRow::new(2, "here", "aaa", 1.5),
            ValueRow::new(1, "there", "aaa", 2),
        ];
        let table = to_wide_table(&rows, DEFAULT_SEPARATOR);
        let encoded = serde_json::to_value(&table).unwrap();
        assert_eq!(
            encoded,
            json!([
                {"timestamp": 1, "here|aaa": null, "there|aaa": 2},
                {"timestamp": 2, "here|aaa": 1.5, "there|aaa": null},
            ])
        );
    }

    #[test]
    fn columns_keep_row_order() {
        let series = to_columns(&sample(), DEFAULT_SEPARATOR);
        assert_eq!(series.timestamp, vec![60, 120]);
        assert_eq!(
            series.column("there|bbb"),
            Some(&[None, Some(Scalar::Float(3.14))][..])
        );
        assert_eq!(series.columns.len(), 4);
        let encoded = serde_json::to_string(&series).unwrap();
        assert!(encoded.starts_with("{\"timestamp\":[60,120]"));
    }

    #[test]
    fn empty_input_yields_empty_shapes() {
        let table = to_wide_table(&[], DEFAULT_SEPARATOR);
        assert!(table.is_empty());
        let series = table.to_columns();
        assert!(series.timestamp.is_empty());
        assert!(series.columns.is_empty());
        assert!(partition_by_location(&[]).is_empty());
    }

    #[test]
    fn partition_keeps_first_seen_location_order() {
        let groups = partition_by_location(&sample());
        let names: Vec<_> = groups.iter().map(|group| group.location.as_str()).collect();
        assert_eq!(names, vec!["there", "here"]);
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[0].rows[0].parameter, "bbb");
        let encoded = serde_json::to_value(&groups[1].rows[0]).unwrap();
        assert_eq!(encoded, json!({"timestamp": 60, "par": "bbb", "val": 1.23}));
    }

    #[test]
    fn per_location_tables_key_columns_by_parameter() {
        let tables = tables_per_location(&sample());
        assert_eq!(tables.len(), 2);
        let here = &tables[1];
        assert_eq!(here.location, "here");
        assert_eq!(here.table.fixed_location(), Some("here"));
        assert_eq!(here.table.labels(), vec!["aaa", "bbb"]);
        assert_eq!(here.table.cell(120, "aaa"), Some(&Scalar::Integer(42)));
        let flattened = here.table.to_long_rows();
        assert!(flattened.iter().all(|row| row.location == "here"));
    }

    #[test]
    fn repeated_triples_keep_the_last_value() {
        let rows = vec![
            ValueRow::new(1, "a", "x", 1),
            ValueRow::new(1, "a", "x", 2),
        ];
        let table = to_wide_table(&rows, DEFAULT_SEPARATOR);
        assert_eq!(table.cell(1, "a|x"), Some(&Scalar::Integer(2)));
    }
}
