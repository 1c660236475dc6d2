use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

const EXTRACTION_PROMPT: &str = include_str!("prompts/extraction.txt");
const TRANSLATION_TEMPLATE: &str = include_str!("prompts/translation.tera");

/// Fixed instruction sent with every prescription image. The JSON contract
/// and the timing-code reading rules live here, not in code.
pub fn extraction_prompt() -> &'static str {
    EXTRACTION_PROMPT
}

pub fn render_translation_prompt(
    text: &str,
    target_language: &str,
    context_info: Option<&str>,
) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("text", text);
    context.insert("target_language", target_language);
    context.insert("context_info", &context_info);
    Tera::one_off(TRANSLATION_TEMPLATE, &context, false)
        .with_context(|| "failed to render translation prompt")
}
