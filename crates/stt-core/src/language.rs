//! Supported languages and their pretrained model identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A language the tool can transcribe.
///
/// Each variant maps to exactly one NeMo FastConformer hybrid model. The set
/// is closed; the first variant is the default.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Georgian.
    Ka,
}

/// Returned when a string is not a supported language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language '{0}' (expected one of: en, ka)")]
pub struct LanguageError(pub String);

impl Language {
    /// All supported languages, default first.
    pub const ALL: [Self; 2] = [Self::En, Self::Ka];

    /// Short language code (`"en"`, `"ka"`).
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ka => "ka",
        }
    }

    /// Pretrained model identifier for this language.
    pub fn model_id(self) -> &'static str {
        match self {
            Self::En => "nvidia/stt_en_fastconformer_hybrid_large_pc",
            Self::Ka => "nvidia/stt_ka_fastconformer_hybrid_large_pc",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| LanguageError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn english_model_id() {
        assert_eq!(
            Language::En.model_id(),
            "nvidia/stt_en_fastconformer_hybrid_large_pc"
        );
    }

    #[test]
    fn georgian_model_id() {
        assert_eq!(
            Language::Ka.model_id(),
            "nvidia/stt_ka_fastconformer_hybrid_large_pc"
        );
    }

    #[test]
    fn default_is_first_supported() {
        assert_eq!(Language::default(), Language::ALL[0]);
        assert_eq!(Language::default().code(), "en");
    }

    #[test]
    fn parse_known_codes() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!("ka".parse::<Language>().unwrap(), Language::Ka);
        assert_eq!(" KA ".parse::<Language>().unwrap(), Language::Ka);
    }

    #[test]
    fn parse_unknown_code_fails() {
        assert_matches!("fr".parse::<Language>(), Err(LanguageError(s)) if s == "fr");
        assert!("".parse::<Language>().is_err());
    }

    #[test]
    fn display_matches_code() {
        for lang in Language::ALL {
            assert_eq!(lang.to_string(), lang.code());
        }
    }

    #[test]
    fn serde_uses_lowercase_code() {
        let json = serde_json::to_string(&Language::Ka).unwrap();
        assert_eq!(json, "\"ka\"");
        let back: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(back, Language::En);
    }

    #[test]
    fn value_enum_rejects_unsupported() {
        use clap::ValueEnum;
        assert_eq!(
            <Language as ValueEnum>::from_str("en", false).unwrap(),
            Language::En
        );
        assert!(<Language as ValueEnum>::from_str("de", false).is_err());
    }
}
