//! Output schema, record shaping and local CSV output.

use std::collections::BTreeMap;
use std::io::Write;

use serde_json::Value;

use super::zonal::ZonalRow;
use super::PipelineError;

/// Field names of a pipeline's tabular output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Facility identifier, carried through unchanged.
    pub id_field: String,
    /// Dataset-specific name of the mean value.
    pub value_field: String,
    /// Image index column, for per-image reductions.
    pub date_field: Option<String>,
    /// Explicit export column list. `None` exports every property.
    pub selectors: Option<Vec<String>>,
}

impl OutputSchema {
    pub fn new(id_field: &str, value_field: &str) -> Self {
        Self {
            id_field: id_field.to_string(),
            value_field: value_field.to_string(),
            date_field: None,
            selectors: None,
        }
    }

    pub fn with_date_field(mut self, field: &str) -> Self {
        self.date_field = Some(field.to_string());
        self
    }

    pub fn with_selectors(mut self, selectors: &[&str]) -> Self {
        self.selectors = Some(selectors.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Every column a shaped record carries, in output order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![self.id_field.as_str(), self.value_field.as_str()];
        if let Some(date) = &self.date_field {
            columns.push(date);
        }
        columns
    }

    /// Columns written on export: the selectors when given, else all columns.
    pub fn export_columns(&self) -> Vec<&str> {
        match &self.selectors {
            Some(selectors) => selectors.iter().map(String::as_str).collect(),
            None => self.columns(),
        }
    }

    /// Turns zonal rows into records named after this schema.
    ///
    /// Non-finite means are treated as undefined and dropped.
    pub fn shape(&self, rows: impl IntoIterator<Item = ZonalRow>) -> Vec<Record> {
        rows.into_iter()
            .filter(|row| row.mean.is_finite())
            .map(|row| {
                let mut fields = BTreeMap::new();
                fields.insert(self.id_field.clone(), Value::from(row.facility_id));
                fields.insert(self.value_field.clone(), Value::from(row.mean));
                if let (Some(date_field), Some(index)) = (&self.date_field, row.image_index) {
                    fields.insert(date_field.clone(), Value::from(index));
                }
                Record { fields }
            })
            .collect()
    }
}

/// One shaped output row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Writes records as CSV with the schema's export columns as header.
///
/// Missing fields are written as empty cells.
pub fn write_csv<W: Write>(
    writer: W,
    schema: &OutputSchema,
    records: &[Record],
) -> Result<(), PipelineError> {
    let columns = schema.export_columns();
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&columns)?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| match record.get(c) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        csv.write_record(&row)?;
    }

    csv.flush().map_err(|e| PipelineError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, mean: f64) -> ZonalRow {
        ZonalRow {
            facility_id: id.to_string(),
            image_index: Some("2016_06_01".to_string()),
            mean,
        }
    }

    #[test]
    fn test_canopy_schema_field_names() {
        let schema = OutputSchema::new("FACILITYID", "percent_tree_cover")
            .with_selectors(&["FACILITYID", "percent_tree_cover"]);
        let records = schema.shape(vec![row("F1", 42.0)]);
        let names: Vec<&str> = records[0].field_names().collect();
        assert_eq!(names, vec!["FACILITYID", "percent_tree_cover"]);
    }

    #[test]
    fn test_date_field_attached() {
        let schema = OutputSchema::new("FACILITYID", "LST_mean").with_date_field("date");
        let records = schema.shape(vec![row("F1", 30.5)]);
        assert_eq!(records[0].get("date"), Some(&Value::from("2016_06_01")));
        assert_eq!(records[0].get("LST_mean"), Some(&Value::from(30.5)));
        assert_eq!(schema.columns(), vec!["FACILITYID", "LST_mean", "date"]);
    }

    #[test]
    fn test_undefined_means_dropped() {
        let schema = OutputSchema::new("FACILITYID", "LST_mean");
        let rows = vec![row("F1", 1.0), row("F2", f64::NAN), row("F3", 2.0)];
        let before = rows.len();
        let records = schema.shape(rows);
        assert_eq!(records.len(), 2);
        assert!(records.len() <= before);
    }

    #[test]
    fn test_write_csv_uses_selectors() {
        let schema = OutputSchema::new("FACILITYID", "percent_tree_cover")
            .with_date_field("date")
            .with_selectors(&["FACILITYID", "percent_tree_cover"]);
        let records = schema.shape(vec![row("F1", 12.5), row("F2", 0.0)]);

        let mut out = Vec::new();
        write_csv(&mut out, &schema, &records).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "FACILITYID,percent_tree_cover\nF1,12.5\nF2,0.0\n"
        );
    }
}
