use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::prompts;
use crate::providers::Provider;

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
    pub context_info: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TranslationResult {
    Completed {
        success: bool,
        original_text: String,
        translated_text: String,
        target_language: String,
        context_info: Option<String>,
        translation_date: String,
    },
    Failed {
        success: bool,
        error: String,
    },
}

/// Translate free text into the target language, optionally biased by a
/// context label ("medical document" and the like). The model output is
/// passed through verbatim; there is nothing to parse.
pub async fn translate_text<P: Provider>(
    provider: &P,
    request: TranslationRequest,
) -> TranslationResult {
    match run_translation(provider, &request).await {
        Ok(translated_text) => TranslationResult::Completed {
            success: true,
            original_text: request.text,
            translated_text,
            target_language: request.target_language,
            context_info: request.context_info,
            translation_date: crate::now_timestamp(),
        },
        Err(err) => {
            warn!("translation failed: {:#}", err);
            TranslationResult::Failed {
                success: false,
                error: format!("error in contextual translation: {:#}", err),
            }
        }
    }
}

async fn run_translation<P: Provider>(
    provider: &P,
    request: &TranslationRequest,
) -> Result<String> {
    let prompt = prompts::render_translation_prompt(
        &request.text,
        &request.target_language,
        request.context_info.as_deref(),
    )?;
    debug!(
        "translating {} characters to {}",
        request.text.len(),
        request.target_language
    );
    let response = provider.clone().append_user_input(prompt).generate().await?;
    Ok(response.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataAttachment;
    use crate::providers::{ProviderFuture, ProviderResponse};
    use serde_json::json;

    #[derive(Clone)]
    struct TestProvider {
        response: Result<String, String>,
        prompts: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl TestProvider {
        fn returning(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                prompts: Default::default(),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                prompts: Default::default(),
            }
        }
    }

    impl Provider for TestProvider {
        fn append_user_input(self, input: String) -> Self {
            self.prompts.lock().unwrap().push(input);
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

    #[tokio::test]
    async fn translation_passes_model_output_through() {
        let provider = TestProvider::returning("दिन में दो बार लें");
        let result = translate_text(
            &provider,
            TranslationRequest {
                text: "Take twice daily".to_string(),
                target_language: "Hindi".to_string(),
                context_info: Some("medical document".to_string()),
            },
        )
        .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["target_language"], json!("Hindi"));
        assert_eq!(value["original_text"], json!("Take twice daily"));
        assert_eq!(value["translated_text"], json!("दिन में दो बार लें"));
        assert_eq!(value["context_info"], json!("medical document"));
        assert!(value["translation_date"].as_str().is_some());

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Hindi"));
        assert!(prompts[0].contains("medical document"));
        assert!(prompts[0].contains("Take twice daily"));
    }

    #[tokio::test]
    async fn provider_error_becomes_failure_envelope() {
        let provider = TestProvider::failing("quota exceeded");
        let result = translate_text(
            &provider,
            TranslationRequest {
                text: "Hello".to_string(),
                target_language: "Tamil".to_string(),
                context_info: None,
            },
        )
        .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert!(value["error"].as_str().unwrap().contains("quota exceeded"));
    }
}
