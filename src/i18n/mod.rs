//! Internationalization (i18n) module for feedwatch.
//!
//! Messages are TOML tables flattened into dot-separated keys. The `ru` and
//! `en` resources are compiled in; a locale directory can override or add
//! messages at startup.
//!
//! # Usage
//!
//! ```
//! use feedwatch::i18n::{I18n, Translator};
//!
//! let i18n = I18n::builtin("ru").unwrap();
//! assert_eq!(i18n.translate("formFeedback.errors.network"), "Ошибка сети");
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::LocaleConfig;

/// Default locale.
pub const DEFAULT_LOCALE: &str = "ru";

const BUILTIN_RU: &str = include_str!("../../locales/ru.toml");
const BUILTIN_EN: &str = include_str!("../../locales/en.toml");

/// I18n-related errors.
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to read locale file.
    #[error("Failed to read locale file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse locale file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Locale not found.
    #[error("Locale not found: {0}")]
    LocaleNotFound(String),

    /// Required messages are missing.
    #[error("Missing translations: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// Result type for i18n operations.
pub type Result<T> = std::result::Result<T, I18nError>;

/// Turns message keys into user-facing text.
pub trait Translator {
    /// Translate `key`. Unknown keys translate to themselves.
    fn translate(&self, key: &str) -> String;

    /// Whether `key` has a translation.
    fn has_key(&self, key: &str) -> bool;

    /// Keys from `required` that have no translation.
    fn missing_keys(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|key| !self.has_key(key))
            .map(|key| key.to_string())
            .collect()
    }
}

/// TOML-backed message catalog for one locale.
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current locale (e.g., "ru", "en").
    locale: String,
    /// Flattened message map (key -> value).
    messages: HashMap<String, String>,
}

impl I18n {
    /// Load `{locale}.toml` from `locales_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the locale file is missing or cannot be parsed.
    pub fn load<P: AsRef<Path>>(locale: &str, locales_dir: P) -> Result<Self> {
        let path = locales_dir.as_ref().join(format!("{locale}.toml"));

        if !path.exists() {
            return Err(I18nError::LocaleNotFound(locale.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        Self::from_str(locale, &content)
    }

    /// Create an I18n instance from a TOML string.
    pub fn from_str(locale: &str, content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        let mut messages = HashMap::new();
        flatten_toml("", &toml::Value::Table(table), &mut messages);

        Ok(Self {
            locale: locale.to_string(),
            messages,
        })
    }

    /// Compiled-in resources for `locale`.
    pub fn builtin(locale: &str) -> Result<Self> {
        let content = match locale {
            "ru" => BUILTIN_RU,
            "en" => BUILTIN_EN,
            _ => return Err(I18nError::LocaleNotFound(locale.to_string())),
        };
        Self::from_str(locale, content)
    }

    /// Resources for the configured locale.
    ///
    /// Starts from the compiled-in resources, if any, and merges
    /// `{path}/{language}.toml` over them when that file exists.
    pub fn from_config(config: &LocaleConfig) -> Result<Self> {
        let language = config.language.as_str();
        let builtin = Self::builtin(language);

        let Some(dir) = config.path.as_deref() else {
            return builtin;
        };

        match (builtin, Self::load(language, dir)) {
            (Ok(mut base), Ok(overrides)) => {
                base.merge(&overrides);
                Ok(base)
            }
            (Ok(base), Err(I18nError::LocaleNotFound(_))) => Ok(base),
            (_, Ok(loaded)) => Ok(loaded),
            (_, Err(e)) => Err(e),
        }
    }

    /// Create an empty I18n instance.
    ///
    /// All translations will return the key itself.
    pub fn empty(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            messages: HashMap::new(),
        }
    }

    /// Get the current locale.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Get the number of loaded messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if no messages are loaded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Translate a key to the current locale.
    ///
    /// If the key is not found, returns the key itself.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map(|s| s.as_str()).unwrap_or(key)
    }

    /// Check if a translation key exists.
    pub fn has_key(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// Merge another I18n instance into this one.
    ///
    /// Messages from the other instance will override existing ones.
    pub fn merge(&mut self, other: &I18n) {
        for (key, value) in &other.messages {
            self.messages.insert(key.clone(), value.clone());
        }
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::empty(DEFAULT_LOCALE)
    }
}

impl Translator for I18n {
    fn translate(&self, key: &str) -> String {
        self.t(key).to_string()
    }

    fn has_key(&self, key: &str) -> bool {
        I18n::has_key(self, key)
    }
}

/// Flatten a TOML value into a HashMap with dot-separated keys.
fn flatten_toml(prefix: &str, value: &toml::Value, map: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_toml(&new_prefix, val, map);
            }
        }
        toml::Value::String(s) => {
            map.insert(prefix.to_string(), s.clone());
        }
        toml::Value::Integer(i) => {
            map.insert(prefix.to_string(), i.to_string());
        }
        toml::Value::Float(f) => {
            map.insert(prefix.to_string(), f.to_string());
        }
        toml::Value::Boolean(b) => {
            map.insert(prefix.to_string(), b.to_string());
        }
        // Arrays are not supported for translations
        toml::Value::Array(_) => {}
        toml::Value::Datetime(dt) => {
            map.insert(prefix.to_string(), dt.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackKey;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_locale(dir: &TempDir, locale: &str, content: &str) {
        let path = dir.path().join(format!("{locale}.toml"));
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_i18n_from_str_nested_keys() {
        let i18n = I18n::from_str(
            "en",
            r#"
[formFeedback.errors]
network = "Network error"
"#,
        )
        .unwrap();

        assert_eq!(i18n.t("formFeedback.errors.network"), "Network error");
        assert_eq!(i18n.len(), 1);
    }

    #[test]
    fn test_i18n_missing_key() {
        let i18n = I18n::empty("en");
        assert!(i18n.is_empty());
        assert_eq!(i18n.t("nope"), "nope");
        assert_eq!(i18n.translate("nope"), "nope");
    }

    #[test]
    fn test_builtin_locales_cover_feedback_taxonomy() {
        for locale in ["ru", "en"] {
            let i18n = I18n::builtin(locale).unwrap();
            let keys: Vec<String> = FeedbackKey::ALL
                .iter()
                .map(|key| key.translation_key())
                .collect();
            let required: Vec<&str> = keys.iter().map(String::as_str).collect();
            assert!(i18n.missing_keys(&required).is_empty(), "{locale}");
            for key in ["posts", "feeds", "view", "loading"] {
                assert!(i18n.has_key(key), "{locale}: {key}");
            }
        }
    }

    #[test]
    fn test_missing_keys_lists_untranslated_in_order() {
        let i18n = I18n::from_str("en", "posts = \"Posts\"\nview = \"View\"").unwrap();
        let translator: &dyn Translator = &i18n;
        assert_eq!(
            translator.missing_keys(&["feeds", "posts", "read_full", "view"]),
            vec!["feeds".to_string(), "read_full".to_string()]
        );
        assert!(translator.missing_keys(&[]).is_empty());
    }

    #[test]
    fn test_builtin_ru_messages() {
        let i18n = I18n::builtin("ru").unwrap();
        assert_eq!(i18n.locale(), "ru");
        assert_eq!(i18n.t("posts"), "Посты");
        assert_eq!(i18n.t("formFeedback.success"), "RSS успешно загружен");
        assert_eq!(
            i18n.t("formFeedback.errors.duplicateUrl"),
            "RSS уже существует"
        );
    }

    #[test]
    fn test_builtin_unknown_locale() {
        assert!(matches!(
            I18n::builtin("fr"),
            Err(I18nError::LocaleNotFound(l)) if l == "fr"
        ));
    }

    #[test]
    fn test_i18n_merge() {
        let mut base = I18n::from_str("en", "a = \"1\"\nb = \"2\"").unwrap();
        let other = I18n::from_str("en", "b = \"3\"\nc = \"4\"").unwrap();
        base.merge(&other);

        assert_eq!(base.t("a"), "1");
        assert_eq!(base.t("b"), "3");
        assert_eq!(base.t("c"), "4");
    }

    #[test]
    fn test_i18n_load_from_file() {
        let dir = TempDir::new().unwrap();
        write_locale(&dir, "en", "posts = \"Articles\"");

        let i18n = I18n::load("en", dir.path()).unwrap();
        assert_eq!(i18n.t("posts"), "Articles");
    }

    #[test]
    fn test_i18n_load_missing_locale() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            I18n::load("de", dir.path()),
            Err(I18nError::LocaleNotFound(_))
        ));
    }

    #[test]
    fn test_i18n_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        write_locale(&dir, "en", "this is [[[ not toml");
        assert!(matches!(
            I18n::load("en", dir.path()),
            Err(I18nError::Parse(_))
        ));
    }

    #[test]
    fn test_from_config_builtin_only() {
        let config = LocaleConfig::default();
        let i18n = I18n::from_config(&config).unwrap();
        assert_eq!(i18n.t("feeds"), "Фиды");
    }

    #[test]
    fn test_from_config_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        write_locale(&dir, "en", "posts = \"Articles\"");
        let config = LocaleConfig {
            language: "en".to_string(),
            path: Some(dir.path().to_string_lossy().to_string()),
        };

        let i18n = I18n::from_config(&config).unwrap();
        assert_eq!(i18n.t("posts"), "Articles");
        assert_eq!(i18n.t("feeds"), "Feeds");
    }

    #[test]
    fn test_from_config_file_only_locale() {
        let dir = TempDir::new().unwrap();
        write_locale(&dir, "de", "posts = \"Beiträge\"");
        let config = LocaleConfig {
            language: "de".to_string(),
            path: Some(dir.path().to_string_lossy().to_string()),
        };

        let i18n = I18n::from_config(&config).unwrap();
        assert_eq!(i18n.t("posts"), "Beiträge");
    }

    #[test]
    fn test_from_config_unknown_locale() {
        let dir = TempDir::new().unwrap();
        let config = LocaleConfig {
            language: "de".to_string(),
            path: Some(dir.path().to_string_lossy().to_string()),
        };
        assert!(matches!(
            I18n::from_config(&config),
            Err(I18nError::LocaleNotFound(_))
        ));
    }

    #[test]
    fn test_missing_keys_error_display() {
        let err = I18nError::MissingKeys(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Missing translations: a, b");
    }

    #[test]
    fn test_i18n_non_string_values() {
        let i18n = I18n::from_str("en", "count = 3\nflag = true\nlist = [1, 2]").unwrap();
        assert_eq!(i18n.t("count"), "3");
        assert_eq!(i18n.t("flag"), "true");
        assert!(!i18n.has_key("list"));
    }
}
