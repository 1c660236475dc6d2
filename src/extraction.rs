use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::data::{self, DataAttachment};
use crate::preprocess;
use crate::prompts;
use crate::providers::Provider;
use crate::settings::Settings;

const FALLBACK_NOTE: &str = "could not parse model output as JSON, returning raw text";

/// The structured record requested from the model for every prescription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrescriptionRecord {
    pub doctor: DoctorInfo,
    pub patient: PatientInfo,
    pub medications: Vec<Medication>,
    pub additional_notes: AdditionalNotes,
    pub extraction_notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoctorInfo {
    pub name: Option<String>,
    pub qualifications: Option<String>,
    pub registration_number: Option<String>,
    pub clinic_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub prescription_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Medication {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub quantity: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
    pub uncertain: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdditionalNotes {
    pub special_instructions: Option<String>,
    pub follow_up: Option<String>,
    pub warnings: Option<String>,
}

/// What came back from the model: the requested record, or the raw response
/// when it was not parseable. The fallback is a degraded success, not an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionData {
    Structured(PrescriptionRecord),
    RawFallback { raw_response: String, note: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    Completed {
        success: bool,
        data: ExtractionData,
        extraction_date: String,
        source_filename: String,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl ExtractionResult {
    fn completed(data: ExtractionData, source_filename: String) -> Self {
        ExtractionResult::Completed {
            success: true,
            data,
            extraction_date: crate::now_timestamp(),
            source_filename,
        }
    }

    fn failed(error: String) -> Self {
        ExtractionResult::Failed {
            success: false,
            error,
        }
    }
}

/// Extract prescription details from an image on disk. Provider and parse
/// failures never escape: the provider error becomes a `success: false`
/// envelope, an unparseable response becomes the raw-text fallback.
pub async fn extract_prescription<P: Provider>(
    provider: &P,
    image_path: &Path,
    source_filename: &str,
    settings: &Settings,
) -> ExtractionResult {
    match run_extraction(provider, image_path, settings).await {
        Ok(data) => ExtractionResult::completed(data, source_filename.to_string()),
        Err(err) => {
            warn!("prescription extraction failed: {:#}", err);
            ExtractionResult::failed(format!("error processing prescription: {:#}", err))
        }
    }
}

async fn run_extraction<P: Provider>(
    provider: &P,
    image_path: &Path,
    settings: &Settings,
) -> Result<ExtractionData> {
    let attachment = prepare_image(image_path, settings.enhance)?;
    debug!(
        "sending prescription image to model ({} bytes, {})",
        attachment.bytes.len(),
        attachment.mime
    );

    let response = provider
        .clone()
        .append_user_input(prompts::extraction_prompt().to_string())
        .append_user_data(attachment)
        .generate()
        .await?;

    Ok(parse_extraction_response(response.text))
}

fn prepare_image(path: &Path, enhance: bool) -> Result<DataAttachment> {
    if !enhance {
        return data::load_image(path);
    }
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image file: {}", path.display()))?;
    let processed = preprocess::enhance_for_legibility(&bytes)?;
    Ok(DataAttachment {
        bytes: processed,
        mime: data::PNG_MIME.to_string(),
        name: None,
    })
}

/// Parse the model's text as a [`PrescriptionRecord`]; degrade to the raw
/// text when it is not the requested JSON.
pub fn parse_extraction_response(text: String) -> ExtractionData {
    match serde_json::from_str::<PrescriptionRecord>(text.trim()) {
        Ok(record) => ExtractionData::Structured(record),
        Err(err) => {
            debug!("model output was not the requested JSON: {}", err);
            ExtractionData::RawFallback {
                raw_response: text,
                note: FALLBACK_NOTE.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderFuture, ProviderResponse};
    use serde_json::json;

    const SCHEMA_RESPONSE: &str = r#"{
        "doctor": {"name": "Dr. A. Rao", "qualifications": "MBBS", "registration_number": null,
                   "clinic_name": "City Clinic", "address": null, "phone": null},
        "patient": {"name": "S. Kumar", "age": "42", "gender": "male", "address": null,
                    "prescription_date": "2024-03-11"},
        "medications": [
            {"name": "Paracetamol", "dosage": "500mg", "quantity": "10", "frequency": "morning and night",
             "duration": "5 days", "instructions": "after food", "uncertain": false}
        ],
        "additional_notes": {"special_instructions": null, "follow_up": "review in one week", "warnings": null},
        "extraction_notes": "signature unreadable"
    }"#;

    #[derive(Clone)]
    struct TestProvider {
        response: Result<String, String>,
    }

    impl Provider for TestProvider {
        fn append_user_input(self, _input: String) -> Self {
            self
        }

        fn append_user_data(self, _data: DataAttachment) -> Self {
            self
        }

        fn generate(self) -> ProviderFuture {
            let response = self.response;
            Box::pin(async move {
                match response {
                    Ok(text) => Ok(ProviderResponse {
                        text,
                        model: Some("test".to_string()),
                        usage: None,
                    }),
                    Err(message) => Err(anyhow::anyhow!(message)),
                }
            })
        }
    }

    fn scratch_image() -> tempfile::NamedTempFile {
        let mut buffer = std::io::Cursor::new(Vec::new());
        let img = image::GrayImage::from_pixel(4, 4, image::Luma([200u8]));
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        let file = tempfile::Builder::new()
            .prefix("prescription-test-")
            .suffix(".png")
            .tempfile()
            .unwrap();
        std::fs::write(file.path(), buffer.into_inner()).unwrap();
        file
    }

    #[test]
    fn schema_json_parses_to_structured_record() {
        let data = parse_extraction_response(SCHEMA_RESPONSE.to_string());
        let ExtractionData::Structured(record) = data else {
            panic!("expected structured data");
        };
        assert_eq!(record.doctor.name.as_deref(), Some("Dr. A. Rao"));
        assert_eq!(record.medications.len(), 1);
        assert_eq!(record.medications[0].name.as_deref(), Some("Paracetamol"));
        assert!(!record.medications[0].uncertain);
        assert_eq!(
            record.extraction_notes.as_deref(),
            Some("signature unreadable")
        );
    }

    #[test]
    fn non_json_degrades_to_raw_fallback() {
        let text = "The prescription says: Paracetamol 500mg".to_string();
        let data = parse_extraction_response(text.clone());
        assert_eq!(
            data,
            ExtractionData::RawFallback {
                raw_response: text,
                note: FALLBACK_NOTE.to_string(),
            }
        );
    }

    #[test]
    fn off_schema_json_also_degrades() {
        let text = r#"{"recipe": "not a prescription"}"#.to_string();
        let data = parse_extraction_response(text.clone());
        assert!(matches!(data, ExtractionData::RawFallback { .. }));
    }

    #[test]
    fn fallback_keeps_the_response_byte_for_byte() {
        let text = "  ```json\n{\"doctor\": {}}\n```  ".to_string();
        let ExtractionData::RawFallback { raw_response, .. } =
            parse_extraction_response(text.clone())
        else {
            panic!("expected fallback");
        };
        assert_eq!(raw_response, text);
    }

    #[tokio::test]
    async fn successful_extraction_wraps_structured_data() {
        let provider = TestProvider {
            response: Ok(SCHEMA_RESPONSE.to_string()),
        };
        let file = scratch_image();
        let settings = Settings::default();
        let result =
            extract_prescription(&provider, file.path(), "scan.png", &settings).await;
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["source_filename"], json!("scan.png"));
        assert_eq!(value["data"]["doctor"]["name"], json!("Dr. A. Rao"));
        assert!(value["extraction_date"].as_str().is_some());
    }

    #[tokio::test]
    async fn provider_error_becomes_failure_envelope() {
        let provider = TestProvider {
            response: Err("connection reset".to_string()),
        };
        let file = scratch_image();
        let settings = Settings::default();
        let result =
            extract_prescription(&provider, file.path(), "scan.png", &settings).await;
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        let error = value["error"].as_str().unwrap();
        assert!(!error.is_empty());
        assert!(error.contains("connection reset"));
        assert!(value.get("data").is_none());
    }

    #[tokio::test]
    async fn unreadable_image_fails_without_calling_the_provider() {
        let provider = TestProvider {
            response: Ok(SCHEMA_RESPONSE.to_string()),
        };
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::fs::write(file.path(), b"not an image").unwrap();
        let settings = Settings::default();
        let result =
            extract_prescription(&provider, file.path(), "scan.png", &settings).await;
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
    }
}
