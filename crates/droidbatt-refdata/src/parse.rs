//! CSV projection of the supported-devices feed

use crate::{RefdataError, ReferenceEntry};
use std::collections::HashMap;

const MODEL_COLUMN: &str = "Model";
const BRAND_COLUMN: &str = "Retail Branding";
const NAME_COLUMN: &str = "Marketing Name";
const DEVICE_COLUMN: &str = "Device";

/// Parse the feed CSV into a model-keyed entry map.
///
/// The feed starts with a UTF-8 BOM glued to the first header name; header
/// matching strips it. Rows without a model are skipped; a model appearing
/// twice keeps the last row. Missing expected columns fail the whole parse,
/// and so does a payload that yields no entries at all (a truncated feed
/// must never replace a populated table with nothing).
pub fn parse_reference_csv(text: &str) -> Result<HashMap<String, ReferenceEntry>, RefdataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| RefdataError::Parse(e.to_string()))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| RefdataError::Parse(format!("missing column \"{name}\"")))
    };
    let model_idx = column(MODEL_COLUMN)?;
    let brand_idx = column(BRAND_COLUMN)?;
    let name_idx = column(NAME_COLUMN)?;
    let device_idx = column(DEVICE_COLUMN)?;

    let mut entries = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| RefdataError::Parse(e.to_string()))?;
        let Some(model) = record.get(model_idx) else {
            continue;
        };
        if model.is_empty() {
            continue;
        }
        entries.insert(
            model.to_string(),
            ReferenceEntry {
                brand: record.get(brand_idx).unwrap_or_default().to_string(),
                name: record.get(name_idx).unwrap_or_default().to_string(),
                device: record.get(device_idx).unwrap_or_default().to_string(),
            },
        );
    }

    if entries.is_empty() {
        return Err(RefdataError::Parse("feed contains no device rows".to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_SAMPLE: &str = "\u{feff}Retail Branding,Marketing Name,Device,Model\nGoogle,Pixel 7,panther,Pixel 7\nSamsung,Galaxy S21,o1s,SM-G991B\n";

    #[test]
    fn test_parse_projects_by_model() {
        let entries = parse_reference_csv(FEED_SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);

        let pixel = &entries["Pixel 7"];
        assert_eq!(pixel.brand, "Google");
        assert_eq!(pixel.name, "Pixel 7");
        assert_eq!(pixel.device, "panther");
    }

    #[test]
    fn test_parse_quoted_fields() {
        let text = "Retail Branding,Marketing Name,Device,Model\n\"Acme, Inc.\",\"Model \"\"X\"\"\",acme,AX-1\n";
        let entries = parse_reference_csv(text).unwrap();
        assert_eq!(entries["AX-1"].brand, "Acme, Inc.");
        assert_eq!(entries["AX-1"].name, "Model \"X\"");
    }

    #[test]
    fn test_parse_skips_rows_without_model() {
        let text =
            "Retail Branding,Marketing Name,Device,Model\nGoogle,Pixel 7,panther,\nAcme,X,ax,AX-1\n";
        let entries = parse_reference_csv(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("AX-1"));
    }

    #[test]
    fn test_parse_headers_only_payload_fails() {
        let text = "Retail Branding,Marketing Name,Device,Model\n";
        let err = parse_reference_csv(text).unwrap_err();
        assert!(matches!(err, RefdataError::Parse(_)));
    }

    #[test]
    fn test_parse_tolerates_missing_trailing_newline() {
        let text = "Retail Branding,Marketing Name,Device,Model\nGoogle,Pixel 7,panther,Pixel 7";
        let entries = parse_reference_csv(text).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_parse_missing_column_fails() {
        let text = "Brand,Name,Model\nGoogle,Pixel 7,Pixel 7\n";
        let err = parse_reference_csv(text).unwrap_err();
        assert!(matches!(err, RefdataError::Parse(_)));
    }
}
