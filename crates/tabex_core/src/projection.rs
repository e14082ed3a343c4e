//! Format-agnostic table built from a record set.
//!
//! Both renderers start from a [`TabularProjection`]: the column list is
//! derived once per record type and every row carries exactly one value per
//! column, in column order.

use crate::error::{ExportError, Result};
use crate::record::{ColumnDescriptor, Record, Value};

/// Columns plus rows derived from one record set.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularProjection {
    pub type_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Value>>,
}

impl TabularProjection {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows with every value stringified; nulls become empty strings.
    pub fn string_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }
}

/// Builds a projection from an explicit column list and an extraction
/// function applied to each record.
pub fn project<T, F>(
    type_name: &str,
    columns: Vec<ColumnDescriptor>,
    records: &[T],
    extract: F,
) -> Result<TabularProjection>
where
    F: Fn(&T) -> Vec<Value>,
{
    if columns.is_empty() {
        return Err(ExportError::TypeIntrospection {
            type_name: type_name.to_string(),
        });
    }

    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let values = extract(record);
        check_row(type_name, idx, &columns, &values)?;
        rows.push(values);
    }

    Ok(TabularProjection {
        type_name: type_name.to_string(),
        columns,
        rows,
    })
}

/// Projects records through their [`Record`] implementation.
pub fn project_records<R: Record>(records: &[R]) -> Result<TabularProjection> {
    project(R::TYPE_NAME, R::columns(), records, R::values)
}

fn check_row(
    type_name: &str,
    row: usize,
    columns: &[ColumnDescriptor],
    values: &[Value],
) -> Result<()> {
    if values.len() != columns.len() {
        return Err(ExportError::ShapeMismatch {
            type_name: type_name.to_string(),
            row,
            detail: format!("expected {} values, got {}", columns.len(), values.len()),
        });
    }

    for (column, value) in columns.iter().zip(values) {
        match value.scalar_type() {
            Some(kind) if kind != column.kind => {
                return Err(ExportError::ShapeMismatch {
                    type_name: type_name.to_string(),
                    row,
                    detail: format!(
                        "column {} is {:?} but the value is {:?}",
                        column.name, column.kind, kind
                    ),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ScalarType;

    struct Item {
        id: i64,
        label: Option<String>,
        weight: f64,
    }

    impl Record for Item {
        const TYPE_NAME: &'static str = "Item";

        fn columns() -> Vec<ColumnDescriptor> {
            vec![
                ColumnDescriptor::integer("Id"),
                ColumnDescriptor::text("Label"),
                ColumnDescriptor::decimal("Weight"),
            ]
        }

        fn values(&self) -> Vec<Value> {
            vec![
                self.id.into(),
                self.label.clone().into(),
                self.weight.into(),
            ]
        }
    }

    struct Nothing;

    impl Record for Nothing {
        const TYPE_NAME: &'static str = "Nothing";

        fn columns() -> Vec<ColumnDescriptor> {
            Vec::new()
        }

        fn values(&self) -> Vec<Value> {
            Vec::new()
        }
    }

    fn items(n: i64) -> Vec<Item> {
        (1..=n)
            .map(|i| Item {
                id: i,
                label: Some(format!("Item {i}")),
                weight: i as f64 * 0.5,
            })
            .collect()
    }

    #[test]
    fn test_row_and_column_counts() {
        let records = items(12);
        let projection = project_records(&records).unwrap();
        assert_eq!(projection.row_count(), 12);
        assert_eq!(projection.column_count(), 3);
        assert!(projection.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_columns_in_declaration_order() {
        let first = project_records(&items(1)).unwrap();
        let second = project_records(&items(3)).unwrap();
        assert_eq!(first.column_names(), vec!["Id", "Label", "Weight"]);
        assert_eq!(first.columns, second.columns);
    }

    #[test]
    fn test_empty_record_set_keeps_columns() {
        let projection = project_records::<Item>(&[]).unwrap();
        assert_eq!(projection.row_count(), 0);
        assert_eq!(projection.column_count(), 3);
        assert_eq!(projection.type_name, "Item");
    }

    #[test]
    fn test_null_values_project_to_empty_string() {
        let records = vec![Item {
            id: 7,
            label: None,
            weight: 1.25,
        }];
        let projection = project_records(&records).unwrap();
        assert_eq!(projection.rows[0][1], Value::Null);
        assert_eq!(projection.string_rows()[0], vec!["7", "", "1.25"]);
    }

    #[test]
    fn test_zero_columns_is_introspection_error() {
        let err = project_records(&[Nothing, Nothing]).unwrap_err();
        assert!(matches!(err, ExportError::TypeIntrospection { ref type_name } if type_name == "Nothing"));
    }

    #[test]
    fn test_explicit_columns_with_closure() {
        let pairs = vec![("a", 1_i64), ("b", 2)];
        let projection = project(
            "Pair",
            vec![
                ColumnDescriptor::text("Key"),
                ColumnDescriptor::new("Count", ScalarType::Integer),
            ],
            &pairs,
            |(k, v)| vec![(*k).into(), (*v).into()],
        )
        .unwrap();
        assert_eq!(projection.rows[1], vec![Value::from("b"), Value::Integer(2)]);
    }

    #[test]
    fn test_short_row_is_shape_mismatch() {
        let err = project(
            "Broken",
            vec![ColumnDescriptor::integer("A"), ColumnDescriptor::integer("B")],
            &[1_i64],
            |v| vec![(*v).into()],
        )
        .unwrap_err();
        match err {
            ExportError::ShapeMismatch { row, detail, .. } => {
                assert_eq!(row, 0);
                assert!(detail.contains("expected 2 values, got 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_value_type_is_shape_mismatch() {
        let err = project(
            "Typed",
            vec![ColumnDescriptor::integer("A")],
            &["x"],
            |v| vec![(*v).into()],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::ShapeMismatch { .. }));
    }
}
