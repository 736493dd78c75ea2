//! Languages offered in the session pickers, labelled in their own script.

/// Source sentinel asking the gateway to detect the language.
pub const AUTO: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub label: &'static str,
}

const fn lang(code: &'static str, label: &'static str) -> Language {
    Language { code, label }
}

pub const LANGUAGES: &[Language] = &[
    lang("ar", "العربية"),
    lang("bg", "Български"),
    lang("cs", "Čeština"),
    lang("da", "Dansk"),
    lang("de", "Deutsch"),
    lang("el", "Ελληνικά"),
    lang("en", "English"),
    lang("en-GB", "English (UK)"),
    lang("en-US", "English (US)"),
    lang("es", "Español"),
    lang("es-419", "Español (LatAm)"),
    lang("et", "Eesti"),
    lang("fi", "Suomi"),
    lang("fr", "Français"),
    lang("he", "עברית"),
    lang("hu", "Magyar"),
    lang("id", "Bahasa Indonesia"),
    lang("it", "Italiano"),
    lang("ja", "日本語"),
    lang("ko", "한국어"),
    lang("lt", "Lietuvių"),
    lang("lv", "Latviešu"),
    lang("nb", "Norsk bokmål"),
    lang("nl", "Nederlands"),
    lang("pl", "Polski"),
    lang("pt-BR", "Português (Brasil)"),
    lang("pt-PT", "Português (Portugal)"),
    lang("ro", "Română"),
    lang("ru", "Русский"),
    lang("sk", "Slovenčina"),
    lang("sl", "Slovenščina"),
    lang("sv", "Svenska"),
    lang("th", "ไทย"),
    lang("tr", "Türkçe"),
    lang("uk", "Українська"),
    lang("vi", "Tiếng Việt"),
    lang("zh", "中文"),
    lang("zh-Hans", "简体中文"),
    lang("zh-Hant", "繁體中文"),
];

/// Case-insensitive lookup; gateways report codes like `FR` or `pt-br`.
pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

pub fn label(code: &str) -> &str {
    if code == AUTO {
        return AUTO;
    }
    find(code).map(|l| l.label).unwrap_or(code)
}

/// Label of the "auto" source option once the gateway has detected `detected`.
pub fn auto_label(detected: Option<&str>) -> String {
    match detected.map(str::trim).filter(|d| !d.is_empty()) {
        Some(code) => {
            let name = find(code).map(|l| l.label.to_string()).unwrap_or_else(|| code.to_uppercase());
            format!("{name} ({AUTO})")
        }
        None => AUTO.to_string(),
    }
}

/// Primary language subtag of a locale string: `fr_FR.UTF-8` → `fr`,
/// `pt-BR` → `pt`. `C` and `POSIX` carry no language.
pub fn primary_subtag(locale: &str) -> Option<String> {
    let tag = locale.split(['.', '@']).next().unwrap_or_default();
    let primary = tag.split(['_', '-']).next().unwrap_or_default().trim();
    if primary.is_empty() || primary.eq_ignore_ascii_case("c") || primary.eq_ignore_ascii_case("posix") {
        return None;
    }
    Some(primary.to_lowercase())
}

/// Default target: the locale's primary language when the pickers offer it,
/// otherwise `fallback`.
pub fn default_target(locale: Option<&str>, fallback: &str) -> String {
    locale
        .and_then(primary_subtag)
        .and_then(|code| find(&code).map(|l| l.code.to_string()))
        .unwrap_or_else(|| fallback.to_string())
}

/// The active locale from the environment, POSIX precedence.
pub fn env_locale(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|k| lookup(k))
        .find(|v| !v.trim().is_empty())
}
