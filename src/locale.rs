use crate::error::AppError;
use serde::Deserialize;
use std::collections::HashMap;

const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.json")),
    ("de", include_str!("../locales/de.json")),
];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry {
    Text(String),
    Plural { one: String, other: String },
}

/// Message catalog for one language.
#[derive(Debug)]
pub struct Locale {
    lang: String,
    entries: HashMap<String, Entry>,
}

impl Locale {
    pub fn new(lang: &str) -> Result<Self, AppError> {
        let raw = CATALOGS
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(lang))
            .map(|(_, raw)| *raw)
            .ok_or_else(|| AppError::Locale(format!("no catalog for locale `{lang}`")))?;

        let entries: HashMap<String, Entry> =
            serde_json::from_str(raw).map_err(|e| AppError::Locale(format!("{lang}: {e}")))?;

        Ok(Self {
            lang: lang.to_ascii_lowercase(),
            entries,
        })
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Missing keys come back verbatim so a gap in a catalog stays visible.
    pub fn get(&self, key: &str) -> String {
        match self.entries.get(key) {
            Some(Entry::Text(text)) => text.clone(),
            Some(Entry::Plural { other, .. }) => other.clone(),
            None => key.to_string(),
        }
    }

    /// Picks the `one` form when `count` is "1", then fills `{name}` placeholders.
    pub fn plural(&self, key: &str, params: &HashMap<&str, String>) -> String {
        let template = match self.entries.get(key) {
            Some(Entry::Plural { one, other }) => {
                if params.get("count").map(String::as_str) == Some("1") {
                    one
                } else {
                    other
                }
            }
            Some(Entry::Text(text)) => text,
            None => return key.to_string(),
        };

        params
            .iter()
            .fold(template.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusKind;

    #[test]
    fn every_status_kind_has_a_message() {
        for lang in ["en", "de"] {
            let l = Locale::new(lang).unwrap();
            for kind in [
                StatusKind::Success,
                StatusKind::Created,
                StatusKind::Updated,
                StatusKind::Validate,
                StatusKind::NotFound,
                StatusKind::Failed,
                StatusKind::Unauthorized,
                StatusKind::Conflict,
                StatusKind::ItemExist,
            ] {
                assert_ne!(l.get(kind.message_key()), kind.message_key(), "{lang}");
            }
        }
    }

    #[test]
    fn unknown_key_is_echoed() {
        let l = Locale::new("en").unwrap();
        assert_eq!(l.get("nope"), "nope");
    }

    #[test]
    fn plural_forms() {
        let l = Locale::new("en").unwrap();
        let one = HashMap::from([("count", "1".to_string())]);
        let many = HashMap::from([("count", "7".to_string())]);
        assert_eq!(l.plural("todo_count", &one), "1 todo");
        assert_eq!(l.plural("todo_count", &many), "7 todos");
    }

    #[test]
    fn unknown_locale_is_rejected() {
        assert!(matches!(Locale::new("xx"), Err(AppError::Locale(_))));
    }
}
