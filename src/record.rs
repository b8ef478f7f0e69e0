use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::util::value_text;

/// Field names used by the recall accessors.
pub mod fields {
    pub const MAKE: &str = "Make";
    pub const MODEL: &str = "Model";
    pub const MODEL_YEAR: &str = "ModelYear";
    pub const MANUFACTURER: &str = "Manufacturer";
    pub const UNITS_AFFECTED: &str = "PotentialNumberofUnitsAffected";
    pub const REPORT_RECEIVED_DATE: &str = "ReportReceivedDate";
}

/// Day-first format used by `ReportReceivedDate`.
pub(crate) const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// One recall entry as returned by the registry.
///
/// No schema is enforced; fields are looked up by name when needed.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct RecallRecord(Map<String, Value>);

impl RecallRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw JSON value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Text of a field; absent, `null` and empty values all read as `None`.
    pub fn field(&self, field: &str) -> Option<String> {
        self.0.get(field).and_then(value_text)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RecallRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// `{"Count": n, "Message": "...", "results": [...]}`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ResultsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub(crate) results: Vec<T>,
}

pub(crate) fn unique_field_values(records: &[RecallRecord], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.field(field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub(crate) fn unique_report_dates(records: &[RecallRecord]) -> Vec<NaiveDate> {
    let mut dates = BTreeSet::new();
    for record in records {
        let Some(raw) = record.field(fields::REPORT_RECEIVED_DATE) else {
            continue;
        };
        match parse_report_date(&raw) {
            Ok(date) => {
                dates.insert(date);
            }
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "skipping unparseable report date");
            }
        }
    }
    dates.into_iter().collect()
}

pub(crate) fn parse_report_date(raw: &str) -> chrono::ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), REPORT_DATE_FORMAT)
}

/// Pulls `key` out of each taxonomy entry, skipping entries without it.
pub(crate) fn taxonomy_values(entries: &[Value], key: &str) -> Vec<String> {
    entries
        .iter()
        .filter_map(|e| e.get(key).and_then(value_text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> RecallRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn projections_deduplicate_regardless_of_order() {
        let records = vec![
            record(json!({"Make": "TOYOTA", "Model": "CAMRY"})),
            record(json!({"Make": "HONDA", "Model": "CIVIC"})),
            record(json!({"Make": "TOYOTA", "Model": "CAMRY"})),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        assert_eq!(unique_field_values(&records, fields::MAKE), ["HONDA", "TOYOTA"]);
        assert_eq!(
            unique_field_values(&reversed, fields::MAKE),
            unique_field_values(&records, fields::MAKE)
        );
        assert_eq!(unique_field_values(&records, fields::MODEL), ["CAMRY", "CIVIC"]);
    }

    #[test]
    fn projections_skip_missing_and_empty_fields() {
        let records = vec![
            record(json!({"Make": "FORD", "Manufacturer": ""})),
            record(json!({"Manufacturer": "Ford Motor Company"})),
            record(json!({"Make": null, "Manufacturer": "Ford Motor Company"})),
        ];
        assert_eq!(unique_field_values(&records, fields::MAKE), ["FORD"]);
        assert_eq!(
            unique_field_values(&records, fields::MANUFACTURER),
            ["Ford Motor Company"]
        );
        assert!(unique_field_values(&records, fields::MODEL_YEAR).is_empty());
    }

    #[test]
    fn numeric_unit_counts_are_rendered_as_text() {
        let records = vec![
            record(json!({"PotentialNumberofUnitsAffected": 1200})),
            record(json!({"PotentialNumberofUnitsAffected": "1200"})),
            record(json!({"PotentialNumberofUnitsAffected": 35})),
        ];
        assert_eq!(
            unique_field_values(&records, fields::UNITS_AFFECTED),
            ["1200", "35"]
        );
    }

    #[test]
    fn report_date_is_day_first() {
        assert_eq!(
            parse_report_date("05/03/2021").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 5).unwrap()
        );
        assert!(parse_report_date("2021-03-05").is_err());
        assert!(parse_report_date("31/02/2021").is_err());
    }

    #[test]
    fn malformed_dates_are_skipped() {
        let records = vec![
            record(json!({"ReportReceivedDate": "05/03/2021"})),
            record(json!({"ReportReceivedDate": "not a date"})),
            record(json!({"ReportReceivedDate": "05/03/2021"})),
            record(json!({"ReportReceivedDate": "17/11/2019"})),
            record(json!({})),
        ];
        assert_eq!(
            unique_report_dates(&records),
            [
                NaiveDate::from_ymd_opt(2019, 11, 17).unwrap(),
                NaiveDate::from_ymd_opt(2021, 3, 5).unwrap(),
            ]
        );
    }

    #[test]
    fn envelope_without_results_is_empty() {
        let env: ResultsEnvelope<RecallRecord> =
            serde_json::from_str(r#"{"Count":0,"Message":"No results found"}"#).unwrap();
        assert!(env.results.is_empty());
    }

    #[test]
    fn taxonomy_values_skip_entries_without_key() {
        let entries = vec![
            json!({"modelYear": "2024"}),
            json!({"other": "x"}),
            json!({"modelYear": "2023"}),
        ];
        assert_eq!(taxonomy_values(&entries, "modelYear"), ["2024", "2023"]);
    }
}
