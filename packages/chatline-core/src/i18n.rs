//! Localized user-facing strings.
//!
//! Catalogs are flat JSON objects embedded at compile time. Unknown locales
//! fall back to English, unknown keys fall back to the key itself.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

/// Embedded message catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Catalog {
    English,
    Vietnamese,
}

impl Catalog {
    fn for_locale(locale: &str) -> Self {
        match locale.split('_').next() {
            Some("vi") => Catalog::Vietnamese,
            _ => Catalog::English,
        }
    }

    fn source(self) -> &'static str {
        match self {
            Catalog::English => include_str!("../i18n/en.json"),
            Catalog::Vietnamese => include_str!("../i18n/vi.json"),
        }
    }

    fn parse(self) -> HashMap<String, String> {
        serde_json::from_str(self.source()).unwrap_or_else(|e| {
            tracing::warn!("Message catalog {:?} is invalid: {}", self, e);
            HashMap::new()
        })
    }
}

#[derive(Clone, Debug)]
pub struct I18n {
    locale: String,
    messages: Arc<HashMap<String, String>>,
}

impl I18n {
    /// Load the catalog for `locale` (`vi`, `vi_VN`, `en-US`, ...).
    pub fn new(locale: &str) -> Self {
        let locale = normalize_locale(locale).unwrap_or_else(|| "en".to_string());
        let messages = Arc::new(Catalog::for_locale(&locale).parse());
        Self { locale, messages }
    }

    /// Load the catalog for the locale found in the environment.
    pub fn from_env() -> Self {
        Self::new(&detect_locale())
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn lookup<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map_or(key, String::as_str)
    }

    pub fn t(&self, key: &str) -> String {
        self.lookup(key).to_string()
    }

    /// Message for `key` with each `{name}` replaced by its value in
    /// `params`. Unknown placeholders are left as written and substituted
    /// values are never rescanned.
    pub fn format(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.lookup(key);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                params
                    .iter()
                    .find(|(param, _)| *param == name)
                    .map(|(_, value)| (*value, close))
            });
            match value {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}

fn normalize_locale(value: &str) -> Option<String> {
    let tag = value.trim().split('.').next()?;
    let normalized = tag.replace('-', "_").to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

/// Locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, defaulting to `en`.
pub fn detect_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|key| env::var(key).ok())
        .find_map(|value| normalize_locale(&value))
        .unwrap_or_else(|| "en".to_string())
}
