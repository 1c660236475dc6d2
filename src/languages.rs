use anyhow::{Result, anyhow};

/// A speech-capable language: display name, ISO 639-1 code for the TTS
/// endpoint, and the Google TLD used as a regional accent hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
    pub tld: &'static str,
}

/// The fixed set of languages the service speaks and translates into.
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { name: "English", code: "en", tld: "com" },
    Language { name: "Hindi", code: "hi", tld: "co.in" },
    Language { name: "Bengali", code: "bn", tld: "co.in" },
    Language { name: "Tamil", code: "ta", tld: "co.in" },
    Language { name: "Telugu", code: "te", tld: "co.in" },
    Language { name: "Marathi", code: "mr", tld: "co.in" },
    Language { name: "Gujarati", code: "gu", tld: "co.in" },
    Language { name: "Punjabi", code: "pa", tld: "co.in" },
    Language { name: "Kannada", code: "kn", tld: "co.in" },
    Language { name: "Malayalam", code: "ml", tld: "co.in" },
];

pub fn names() -> Vec<&'static str> {
    SUPPORTED_LANGUAGES.iter().map(|lang| lang.name).collect()
}

pub fn find(name: &str) -> Option<&'static Language> {
    let name = name.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.name.eq_ignore_ascii_case(name))
}

/// Like [`find`], but fails with the enumerated list of valid choices.
pub fn resolve(name: &str) -> Result<&'static Language> {
    find(name).ok_or_else(|| {
        anyhow!(
            "unsupported language: {} (supported: {})",
            name,
            names().join(", ")
        )
    })
}
