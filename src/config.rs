use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "deepl")]
    DeepL,
    Google,
    #[serde(rename = "libretranslate")]
    LibreTranslate,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepl" => Some(Provider::DeepL),
            "google" => Some(Provider::Google),
            "libretranslate" | "libre" => Some(Provider::LibreTranslate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Provider,
    pub deepl_api_key: String,
    pub deepl_endpoint: String,
    pub libretranslate_url: String,
    /// Target used when the locale's language is not offered.
    pub default_target: String,
    /// Overrides the locale read from the environment.
    pub ui_locale: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Google,
            deepl_api_key: String::new(),
            deepl_endpoint: "https://api-free.deepl.com".to_string(),
            libretranslate_url: "https://libretranslate.com".to_string(),
            default_target: "fr".to_string(),
            ui_locale: None,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join("config.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Missing or malformed files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str::<Config>(&s).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let s = serde_json::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Non-empty environment values win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(p) = get("NOCTIS_PROVIDER").and_then(|v| Provider::parse(&v)) {
            self.provider = p;
        }
        if let Some(v) = get("DEEPL_API_KEY") {
            self.deepl_api_key = v;
        }
        if let Some(v) = get("DEEPL_ENDPOINT") {
            self.deepl_endpoint = v;
        }
        if let Some(v) = get("LIBRETRANSLATE_URL") {
            self.libretranslate_url = v;
        }
        if let Some(v) = get("NOCTIS_TARGET_LANG") {
            self.default_target = v;
        }
        if let Some(v) = get("NOCTIS_LOCALE") {
            self.ui_locale = Some(v);
        }
    }

    /// The locale sessions derive their default target from.
    pub fn locale(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.ui_locale.clone().or_else(|| crate::languages::env_locale(lookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |k: &str| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "provider": "deepl", "deepl_api_key": "k" }"#).unwrap();
        assert_eq!(cfg.provider, Provider::DeepL);
        assert_eq!(cfg.deepl_api_key, "k");
        assert_eq!(cfg.default_target, "fr");
        assert_eq!(cfg.request_timeout_secs, 30);
    }

    #[test]
    fn malformed_or_missing_file_is_default() {
        let dir = std::env::temp_dir().join(format!("noctis-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path).provider, Provider::Google);
        assert_eq!(Config::load_from(&dir.join("absent.json")).default_target, "fr");

        let mut cfg = Config::default();
        cfg.provider = Provider::LibreTranslate;
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).provider, Provider::LibreTranslate);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_overrides_non_empty_values_only() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[
            ("NOCTIS_PROVIDER", "LibreTranslate"),
            ("DEEPL_API_KEY", "  "),
            ("NOCTIS_TARGET_LANG", "de"),
        ]));
        assert_eq!(cfg.provider, Provider::LibreTranslate);
        assert_eq!(cfg.deepl_api_key, "");
        assert_eq!(cfg.default_target, "de");
    }

    #[test]
    fn unknown_provider_name_is_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[("NOCTIS_PROVIDER", "babelfish")]));
        assert_eq!(cfg.provider, Provider::Google);
    }

    #[test]
    fn locale_prefers_the_configured_one() {
        let mut cfg = Config::default();
        assert_eq!(cfg.locale(env(&[("LANG", "es_ES.UTF-8")])).as_deref(), Some("es_ES.UTF-8"));
        cfg.ui_locale = Some("ja".into());
        assert_eq!(cfg.locale(env(&[("LANG", "es_ES.UTF-8")])).as_deref(), Some("ja"));
    }
}
