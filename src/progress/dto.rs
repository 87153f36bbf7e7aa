use serde::Deserialize;

/// Body for logging a weight measurement, in kilograms.
#[derive(Debug, Deserialize)]
pub struct RecordWeightRequest {
    pub weight: f64,
}
