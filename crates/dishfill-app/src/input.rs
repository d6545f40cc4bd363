//! Detection input loading
//!
//! Accepts either the object detector's raw response
//! (`{"predictions": [{"class": ..., "confidence": ..., "x": ...}, ...]}`)
//! or a bare array of detections. Extra fields such as bounding boxes are
//! ignored.

use dishfill_types::{Detection, Error, Result};
use serde_json::Value;
use std::path::Path;

/// Read and parse a detections file
pub fn load_detections(path: &Path) -> Result<Vec<Detection>> {
    if !path.exists() {
        return Err(Error::InvalidInput(format!("File not found: {}", path.display())));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidInput(format!("Cannot read {}: {}", path.display(), e)))?;
    parse_detections(&content)
}

/// Parse detections from JSON text.
///
/// Each record is checked individually so the error names the first bad index.
pub fn parse_detections(json: &str) -> Result<Vec<Detection>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::InvalidInput(format!("Detections are not valid JSON: {}", e)))?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut obj) => match obj.remove("predictions") {
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(Error::InvalidInput(
                    "\"predictions\" must be an array".to_string(),
                ))
            }
            None => {
                return Err(Error::InvalidInput(
                    "Expected an array of detections or an object with \"predictions\"".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::InvalidInput(
                "Expected an array of detections or an object with \"predictions\"".to_string(),
            ))
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let detection: Detection = serde_json::from_value(record)
                .map_err(|e| Error::InvalidDetection {
                    index,
                    reason: e.to_string(),
                })?;
            detection
                .check()
                .map_err(|reason| Error::InvalidDetection { index, reason })?;
            Ok(detection)
        })
        .collect()
}
