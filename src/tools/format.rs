//! CSV rendering for tool output.
//!
//! The first record is the column header; each further record holds one row's
//! values in header order. Records end with `\n`.

use crate::db::types::{ResultSet, SqlRow};
use crate::error::{DbError, DbResult};

/// Render rows as CSV following `columns` order.
///
/// Fails with [`DbError::MissingField`] when a row lacks one of the columns.
/// A result without columns renders as an empty string.
pub fn render_csv(rows: &[SqlRow], columns: &[String]) -> DbResult<String> {
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns).map_err(csv_error)?;

    for row in rows {
        let fields = columns
            .iter()
            .map(|col| {
                row.get(col)
                    .map(|v| v.to_string())
                    .ok_or_else(|| DbError::missing_field(col))
            })
            .collect::<DbResult<Vec<_>>>()?;
        writer.write_record(&fields).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DbError::internal(format!("Failed to flush CSV output: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| DbError::internal(format!("CSV output is not valid UTF-8: {}", e)))
}

/// Render a complete result set.
pub fn render_result(result: &ResultSet) -> DbResult<String> {
    render_csv(&result.rows, &result.columns)
}

fn csv_error(err: csv::Error) -> DbError {
    DbError::internal(format!("Failed to write CSV record: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::SqlValue;

    fn row(pairs: &[(&str, SqlValue)]) -> SqlRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_quotes_special_fields() {
        let rows = vec![row(&[
            ("a", SqlValue::text("say \"hi\"")),
            ("b", SqlValue::text("a\nb")),
        ])];
        assert_eq!(
            render_csv(&rows, &cols(&["a", "b"])).unwrap(),
            "a,b\n\"say \"\"hi\"\"\",\"a\nb\"\n"
        );
    }

    #[test]
    fn test_render_lone_empty_field_is_quoted() {
        let rows = vec![row(&[("note", SqlValue::text(""))])];
        assert_eq!(render_csv(&rows, &cols(&["note"])).unwrap(), "note\n\"\"\n");
    }

    #[test]
    fn test_render_without_columns() {
        assert_eq!(render_csv(&[], &[]).unwrap(), "");
    }

    #[test]
    fn test_render_header_and_rows() {
        let rows = vec![
            row(&[("a", SqlValue::text("1")), ("b", SqlValue::text("x,y"))]),
            row(&[("a", SqlValue::Int(2)), ("b", SqlValue::Null)]),
        ];
        let csv = render_csv(&rows, &cols(&["a", "b"])).unwrap();
        assert_eq!(csv, "a,b\n1,\"x,y\"\n2,NULL\n");
    }

    #[test]
    fn test_render_follows_column_order() {
        let rows = vec![row(&[("a", SqlValue::Int(1)), ("b", SqlValue::Int(2))])];
        assert_eq!(render_csv(&rows, &cols(&["b", "a"])).unwrap(), "b,a\n2,1\n");
    }

    #[test]
    fn test_render_empty_rows_keeps_header() {
        assert_eq!(render_csv(&[], &cols(&["id", "name"])).unwrap(), "id,name\n");
    }

    #[test]
    fn test_render_missing_field() {
        let rows = vec![row(&[("a", SqlValue::Int(1))])];
        let err = render_csv(&rows, &cols(&["a", "c"])).unwrap_err();
        assert!(matches!(err, DbError::MissingField { ref column } if column == "c"));
    }

    #[test]
    fn test_render_result() {
        let rs = ResultSet::new(
            cols(&["Database"]),
            vec![row(&[("Database", SqlValue::text("shop"))])],
        );
        assert_eq!(render_result(&rs).unwrap(), "Database\nshop\n");
    }
}
