//! Reduction of a render API response to a single number.
//!
//! Graphite answers `format=json` queries with an array of series:
//!
//! ```json
//! [{"target": "servers.web1.load", "datapoints": [[0.5, 1700000000], [null, 1700000060]]}]
//! ```
//!
//! Every series is averaged on its own and the averages are added up. Series with more
//! datapoints do not weigh more than short ones.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::CheckError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Series {
    #[serde(default, deserialize_with = "lenient_target")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "nullable_datapoints")]
    pub datapoints: Vec<Datapoint>,
}

impl Series {
    pub fn name(&self) -> &str {
        self.target.as_deref().unwrap_or_default()
    }

    /// Arithmetic mean of the datapoint values, `None` for a series without datapoints.
    pub fn mean(&self) -> Option<f64> {
        if self.datapoints.is_empty() {
            return None;
        }

        let sum: f64 = self.datapoints.iter().map(|d| d.value).sum();
        Some(sum / self.datapoints.len() as f64)
    }
}

fn lenient_target<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_str().map(str::to_owned))
}

fn nullable_datapoints<'de, D>(deserializer: D) -> Result<Vec<Datapoint>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Datapoint>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A `[value, timestamp]` pair.
///
/// Only the first element matters and it is read through [coerce_value]. A point which is not an
/// array, or has no first element, has the value 0. Extra elements are ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct Datapoint {
    pub value: f64,
    pub timestamp: Option<i64>,
}

impl<'de> Deserialize<'de> for Datapoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let point = Value::deserialize(deserializer)?;
        let value = point.get(0).map(coerce_value).unwrap_or(0.0);
        let timestamp = point
            .get(1)
            .and_then(|t| t.as_i64().or_else(|| t.as_f64().map(|f| f as i64)));

        Ok(Datapoint { value, timestamp })
    }
}

/// Reads a datapoint value as a number, falling back to 0 instead of failing: `null` (a gap in
/// the series) and unparsable strings are 0, booleans are 1 or 0.
pub fn coerce_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// Parses a render API response body.
pub fn parse(body: &[u8]) -> Result<Vec<Series>, CheckError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "response is not a series array");
        CheckError::Parse
    })
}

/// Sum of the per-series means. Series without datapoints add nothing.
pub fn total(series: &[Series]) -> f64 {
    series
        .iter()
        .map(|s| match s.mean() {
            Some(mean) => {
                tracing::debug!(series = s.name(), mean, points = s.datapoints.len(), "series");
                mean
            }
            None => {
                tracing::warn!(series = s.name(), "series has no datapoints, counting it as 0");
                0.0
            }
        })
        .sum()
}

/// Parses `body` and returns the sum of its per-series means.
pub fn aggregate(body: &[u8]) -> Result<f64, CheckError> {
    let series = parse(body)?;
    Ok(total(&series))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_series_mean() {
        let total = aggregate(br#"[{"datapoints":[[1,0],[3,0]]}]"#).unwrap();
        assert_eq!(total, 2.0);
    }

    #[test]
    fn test_sum_of_series_means() {
        let body = br#"[{"datapoints":[[1,0],[3,0]]},{"datapoints":[[10,0]]}]"#;
        assert_eq!(aggregate(body).unwrap(), 12.0);
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(aggregate(b"[]").unwrap(), 0.0);
    }

    #[test]
    fn test_empty_series_counts_as_zero() {
        let body = br#"[{"target":"gone","datapoints":[]},{"target":"here","datapoints":[[4,0]]}]"#;
        assert_eq!(aggregate(body).unwrap(), 4.0);

        // no datapoints key at all
        assert_eq!(aggregate(br#"[{"target":"x"}]"#).unwrap(), 0.0);
    }

    #[test]
    fn test_null_values_count_as_zero() {
        let body = br#"[{"target":"a","datapoints":[[null,60],[6,120],[null,180]]}]"#;
        assert_eq!(aggregate(body).unwrap(), 2.0);
    }

    #[test]
    fn test_odd_datapoints_are_read_leniently() {
        let test_data: [(&[u8], f64); 6] = [
            (br#"[{"datapoints":[[4,0],[]]}]"#, 2.0),
            (br#"[{"datapoints":[[4,0],[2]]}]"#, 3.0),
            (br#"[{"datapoints":[[4,0],[2,1700000000.5]]}]"#, 3.0),
            (br#"[{"datapoints":[[4,0],[2,"1700000000"]]}]"#, 3.0),
            (br#"[{"datapoints":[[4,0],[2,60,"extra"]]}]"#, 3.0),
            (br#"[{"datapoints":[[4,0],null]}]"#, 2.0),
        ];
        for (body, expected) in &test_data {
            assert_eq!(
                aggregate(body).unwrap(),
                *expected,
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_odd_series_fields_are_read_leniently() {
        let body = br#"[{"target":null,"datapoints":[[4,0]]},{"target":7,"datapoints":[[1,0]]}]"#;
        assert_eq!(aggregate(body).unwrap(), 5.0);

        let body = br#"[{"target":"gone","datapoints":null},{"datapoints":[[4,0]]}]"#;
        assert_eq!(aggregate(body).unwrap(), 4.0);
    }

    #[test]
    fn test_datapoint_timestamp() {
        let series = parse(br#"[{"datapoints":[[1,60.9],[2,null],[3]]}]"#).unwrap();
        let timestamps: Vec<_> = series[0].datapoints.iter().map(|d| d.timestamp).collect();
        assert_eq!(timestamps, vec![Some(60), None, None]);
        assert_eq!(series[0].name(), "");
    }

    #[test]
    fn test_parse_keeps_order_and_targets() {
        let body = br#"[{"target":"b","datapoints":[[1.5,60]]},{"target":"a","datapoints":[]}]"#;
        let series = parse(body).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name(), "b");
        assert_eq!(
            series[0].datapoints,
            vec![Datapoint {
                value: 1.5,
                timestamp: Some(60)
            }]
        );
        assert_eq!(series[1].name(), "a");
        assert_eq!(series[1].mean(), None);
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value(&json!(2.5)), 2.5);
        assert_eq!(coerce_value(&json!(-3)), -3.0);
        assert_eq!(coerce_value(&json!(null)), 0.0);
        assert_eq!(coerce_value(&json!("7.25")), 7.25);
        assert_eq!(coerce_value(&json!("n/a")), 0.0);
        assert_eq!(coerce_value(&json!(true)), 1.0);
        assert_eq!(coerce_value(&json!(false)), 0.0);
        assert_eq!(coerce_value(&json!([1])), 0.0);
    }

    #[test]
    fn test_malformed_json() {
        let test_data: [&[u8]; 5] = [
            b"",
            b"not json",
            b"[{\"datapoints\":[[1,0]]",
            br#"{"datapoints":[[1,0]]}"#,
            br#"[{"datapoints":"none"}]"#,
        ];
        for body in &test_data {
            assert!(matches!(aggregate(body), Err(CheckError::Parse)));
        }
    }
}
