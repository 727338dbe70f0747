use serde::{Deserialize, Serialize};

/// A synthetic voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    /// BCP 47-ish locale tag, e.g. `zh-CN`. Some platforms use `_`.
    pub lang: String,
    /// Display name, e.g. `Microsoft Huihui - Chinese (Simplified, PRC)`.
    pub name: String,
    /// True when the voice runs locally rather than over the network.
    #[serde(default)]
    pub local_service: bool,
    /// Platform identifier for the voice, if it exposes one.
    #[serde(default, rename = "voiceURI", skip_serializing_if = "Option::is_none")]
    pub voice_uri: Option<String>,
}

impl Voice {
    /// A voice without a platform identifier.
    pub fn new(lang: impl Into<String>, name: impl Into<String>, local_service: bool) -> Self {
        Self {
            lang: lang.into(),
            name: name.into(),
            local_service,
            voice_uri: None,
        }
    }
}

/// Cached snapshot of the platform voice list.
///
/// The snapshot is replaced wholesale on every refresh; it is "loaded" iff
/// the last successful refresh returned at least one voice.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    loaded: bool,
}

impl VoiceCatalog {
    /// Swap in a fresh voice list; an empty list marks the catalog unloaded.
    pub fn replace(&mut self, voices: Vec<Voice>) {
        self.loaded = !voices.is_empty();
        self.voices = voices;
    }

    /// Voices in platform order.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// True when the last successful refresh returned voices.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of cached voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// True when no voices are cached.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Pick a voice for `locale` using the tie-break policy, first match wins:
    ///
    /// 1. a local voice tagged with the locale or a regional variant of its language
    /// 2. any voice whose tag contains the language code, or whose name
    ///    contains one of `name_markers`
    /// 3. the first voice in the catalog
    ///
    /// Returns `None` only for an empty catalog.
    pub fn select(&self, locale: &str, name_markers: &[String]) -> Option<&Voice> {
        let language = language_code(locale);

        self.voices
            .iter()
            .find(|v| v.local_service && is_locale_match(&v.lang, locale))
            .or_else(|| {
                self.voices.iter().find(|v| {
                    v.lang.to_ascii_lowercase().contains(&language)
                        || name_markers.iter().any(|m| v.name.contains(m.as_str()))
                })
            })
            .or_else(|| self.voices.first())
    }
}

/// Primary language subtag of a locale tag, lowercased (`zh-CN` -> `zh`).
pub fn language_code(locale: &str) -> String {
    normalize_tag(locale)
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// True when `tag` names `locale` itself, its bare language, or a regional
/// variant of the same language (`zh`, `zh-CN`, `zh_TW`, `zh-Hans-CN` all
/// match `zh-CN`).
fn is_locale_match(tag: &str, locale: &str) -> bool {
    let tag = normalize_tag(tag);
    let locale = normalize_tag(locale);
    if tag == locale {
        return true;
    }
    let language = locale.split('-').next().unwrap_or_default();
    !language.is_empty() && (tag == language || tag.starts_with(&format!("{language}-")))
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{language_code, Voice, VoiceCatalog};

    fn markers() -> Vec<String> {
        vec!["Chinese".to_string(), "中文".to_string()]
    }

    fn catalog(voices: Vec<Voice>) -> VoiceCatalog {
        let mut catalog = VoiceCatalog::default();
        catalog.replace(voices);
        catalog
    }

    #[test]
    fn language_code_strips_region() {
        assert_eq!(language_code("zh-CN"), "zh");
        assert_eq!(language_code("EN_us"), "en");
        assert_eq!(language_code(""), "");
    }

    #[test]
    fn prefers_local_voice_in_target_locale() {
        let catalog = catalog(vec![
            Voice::new("zh-CN", "Network Chinese", false),
            Voice::new("en-US", "Local English", true),
            Voice::new("zh_TW", "Local Taiwanese", true),
        ]);
        let voice = catalog.select("zh-CN", &markers()).unwrap();
        assert_eq!(voice.name, "Local Taiwanese");
    }

    #[test]
    fn bare_language_tag_counts_as_locale_match() {
        let catalog = catalog(vec![
            Voice::new("zh-CN", "Network Chinese", false),
            Voice::new("zh", "Local Mandarin", true),
        ]);
        let voice = catalog.select("zh-CN", &markers()).unwrap();
        assert_eq!(voice.name, "Local Mandarin");
    }

    #[test]
    fn local_voice_in_other_language_loses_to_language_match() {
        let catalog = catalog(vec![
            Voice::new("en-US", "Local English", true),
            Voice::new("cmn-Hans", "Google 普通话（中国大陆）中文", false),
        ]);
        let voice = catalog.select("zh-CN", &markers()).unwrap();
        assert_eq!(voice.lang, "cmn-Hans");
    }

    #[test]
    fn language_code_substring_matches_network_voice() {
        let catalog = catalog(vec![
            Voice::new("en-GB", "Daniel", false),
            Voice::new("ZH-hk", "Sin-ji", false),
        ]);
        assert_eq!(catalog.select("zh-CN", &markers()).unwrap().name, "Sin-ji");
    }

    #[test]
    fn falls_back_to_first_voice() {
        let catalog = catalog(vec![
            Voice::new("fr-FR", "Amelie", false),
            Voice::new("de-DE", "Anna", true),
        ]);
        assert_eq!(catalog.select("zh-CN", &markers()).unwrap().name, "Amelie");
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        let catalog = VoiceCatalog::default();
        assert!(catalog.select("zh-CN", &markers()).is_none());
        assert!(!catalog.is_loaded());
    }

    #[test]
    fn replace_tracks_loaded_flag() {
        let mut catalog = VoiceCatalog::default();
        catalog.replace(vec![Voice::new("zh-CN", "Ting-Ting", true)]);
        assert!(catalog.is_loaded());
        catalog.replace(vec![Voice::new("zh-CN", "Ting-Ting", true)]);
        assert!(catalog.is_loaded());
        catalog.replace(Vec::new());
        assert!(!catalog.is_loaded());
        catalog.replace(Vec::new());
        assert!(!catalog.is_loaded());
    }

    #[test]
    fn voice_round_trips_browser_json_shape() {
        let json = r#"{"lang":"zh-CN","name":"Ting-Ting","localService":true,"voiceURI":"com.apple.ting"}"#;
        let voice: Voice = serde_json::from_str(json).unwrap();
        assert!(voice.local_service);
        assert_eq!(voice.voice_uri.as_deref(), Some("com.apple.ting"));
    }
}
