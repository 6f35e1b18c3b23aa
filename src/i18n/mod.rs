//! Internationalization (i18n) support
//!
//! UI strings ship inside the binary, one YAML file per language.

use anyhow::{Context, Result};
use std::collections::HashMap;

const BUILTIN_LANGUAGES: &[(&str, &str)] = &[
    ("pt-BR", include_str!("languages/pt-BR.yml")),
    ("en", include_str!("languages/en.yml")),
];

/// Fallback when a key is missing in the current language
const FALLBACK_LANGUAGE: &str = "pt-BR";

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create a handler with the built-in languages loaded
    pub fn new(language: &str) -> Result<Self> {
        let mut translations = HashMap::new();
        for (lang, source) in BUILTIN_LANGUAGES {
            let data: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(source)
                .with_context(|| format!("Invalid built-in language file {}", lang))?;
            translations.insert(lang.to_string(), data);
        }

        Ok(Self {
            language: resolve_language(language),
            translations,
        })
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key; nested keys use dots, e.g. `not_found.title`
    pub fn get(&self, key: &str) -> String {
        for lang in [self.language.as_str(), FALLBACK_LANGUAGE] {
            if let Some(value) = self
                .translations
                .get(lang)
                .and_then(|data| get_nested_value(data, key))
            {
                return yaml_value_to_string(value);
            }
        }

        // Return key as fallback
        key.to_string()
    }

    /// Get a translation and substitute `%d`
    pub fn get_count(&self, key: &str, count: usize) -> String {
        self.get(key).replace("%d", &count.to_string())
    }
}

/// Map tags like `en-US` or `pt_br` onto a built-in language
fn resolve_language(language: &str) -> String {
    let normalized = language.replace('_', "-").to_ascii_lowercase();
    BUILTIN_LANGUAGES
        .iter()
        .map(|(lang, _)| *lang)
        .find(|lang| {
            let lang = lang.to_ascii_lowercase();
            normalized == lang || normalized.starts_with(&format!("{}-", lang))
        })
        .unwrap_or(FALLBACK_LANGUAGE)
        .to_string()
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(
    data: &'a HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?);

    for part in parts {
        match current {
            Some(serde_yaml::Value::Mapping(map)) => {
                current = map.get(serde_yaml::Value::String(part.to_string()));
            }
            _ => return None,
        }
    }

    current
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_translation() {
        let i18n = I18n::new("pt-BR").unwrap();
        assert_eq!(i18n.get("load_more"), "Carregar mais posts");
        assert_eq!(i18n.get("loading"), "Carregando...");
        assert_eq!(i18n.get("not_found.title"), "Post não encontrado");
        assert_eq!(i18n.get("unknown"), "unknown");
    }

    #[test]
    fn test_get_count() {
        let i18n = I18n::new("en").unwrap();
        assert_eq!(i18n.get_count("reading_time", 4), "4 min");
    }

    #[test]
    fn test_language_resolution() {
        assert_eq!(I18n::new("en-US").unwrap().language(), "en");
        assert_eq!(I18n::new("pt_br").unwrap().language(), "pt-BR");
        assert_eq!(I18n::new("de").unwrap().language(), "pt-BR");
    }
}
