//! Record reduction
//!
//! Pulls the record array out of a gateway document and folds
//! `total_amount` into an exact currency total.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::MetricsError;

/// Records under `key` in a gateway document. A missing key is an empty page.
pub fn extract_records(document: Value, key: &str) -> Result<Vec<Value>, MetricsError> {
    let Value::Object(mut map) = document else {
        return Err(MetricsError::UnexpectedShape {
            resource: key.to_string(),
            detail: "document is not a JSON object".to_string(),
        });
    };

    match map.remove(key) {
        Some(Value::Array(records)) => Ok(records),
        None | Some(Value::Null) => {
            tracing::debug!("Response has no '{}' array, treating as empty", key);
            Ok(Vec::new())
        }
        Some(other) => Err(MetricsError::UnexpectedShape {
            resource: key.to_string(),
            detail: format!("'{}' is not an array: {}", key, type_name(&other)),
        }),
    }
}

/// `total_amount` of one record; null, missing and unreadable values count as zero
pub fn amount_of(record: &Value) -> Decimal {
    match record.get("total_amount") {
        None | Some(Value::Null) => Decimal::ZERO,
        Some(Value::Number(n)) => parse_decimal(&n.to_string()).unwrap_or_else(|| {
            tracing::warn!("Ignoring unreadable total_amount {}", n);
            Decimal::ZERO
        }),
        Some(Value::String(s)) => parse_decimal(s.trim()).unwrap_or_else(|| {
            tracing::warn!("Ignoring non-numeric total_amount {:?}", s);
            Decimal::ZERO
        }),
        Some(other) => {
            tracing::warn!("Ignoring total_amount of type {}", type_name(other));
            Decimal::ZERO
        }
    }
}

/// Sum of `total_amount` across records
pub fn sum_amounts(records: &[Value]) -> Decimal {
    records.iter().map(amount_of).sum()
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_missing_amounts_count_as_zero() {
        let records = vec![
            json!({"id": "a", "total_amount": 100}),
            json!({"id": "b", "total_amount": null}),
            json!({"id": "c"}),
        ];

        assert_eq!(amount_of(&records[1]), Decimal::ZERO);
        assert_eq!(amount_of(&records[2]), amount_of(&records[1]));
        assert_eq!(sum_amounts(&records), Decimal::from(100));
    }

    #[test]
    fn test_fractional_amounts_sum_exactly() {
        let records = vec![
            json!({"total_amount": 0.1}),
            json!({"total_amount": 0.2}),
            json!({"total_amount": "19.99"}),
        ];

        assert_eq!(sum_amounts(&records), Decimal::from_str("20.29").unwrap());
    }

    #[test]
    fn test_unreadable_amounts_are_ignored() {
        let records = vec![
            json!({"total_amount": "n/a"}),
            json!({"total_amount": true}),
            json!({"total_amount": ""}),
            json!({"total_amount": 5}),
        ];

        assert_eq!(sum_amounts(&records), Decimal::from(5));
    }

    #[test]
    fn test_empty_page_sums_to_zero() {
        assert_eq!(sum_amounts(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_extract_records() {
        let records = extract_records(json!({"jobs": [{"id": 1}, {"id": 2}], "page": 1}), "jobs").unwrap();
        assert_eq!(records.len(), 2);

        let records = extract_records(json!({"page": 1}), "jobs").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_extract_records_rejects_bad_shapes() {
        assert!(matches!(
            extract_records(json!([1, 2]), "jobs"),
            Err(MetricsError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            extract_records(json!({"jobs": {"id": 1}}), "jobs"),
            Err(MetricsError::UnexpectedShape { .. })
        ));
    }
}
