//! The static locale table.
//!
//! Maps a locale code (`fr_FR`) to its display name, W3C tag, Facebook
//! locale, default flag code, and text direction.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Static facts about one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleInfo {
    /// Locale code as stored (`pt_BR`).
    pub code: &'static str,
    /// Display name in the language itself.
    pub name: &'static str,
    /// W3C language tag (`pt-BR`).
    pub w3c: &'static str,
    /// Facebook locale, empty when Facebook has none.
    pub facebook: &'static str,
    /// Default flag code.
    pub flag: &'static str,
    /// Right-to-left script.
    pub rtl: bool,
}

const fn l(
    code: &'static str,
    name: &'static str,
    w3c: &'static str,
    facebook: &'static str,
    flag: &'static str,
    rtl: bool,
) -> LocaleInfo {
    LocaleInfo {
        code,
        name,
        w3c,
        facebook,
        flag,
        rtl,
    }
}

const LOCALES: &[LocaleInfo] = &[
    l("af", "Afrikaans", "af", "af_ZA", "za", false),
    l("ar", "العربية", "ar", "ar_AR", "arab", true),
    l("az", "Azərbaycan", "az", "az_AZ", "az", false),
    l("bg_BG", "български", "bg-BG", "bg_BG", "bg", false),
    l("bn_BD", "বাংলা", "bn-BD", "bn_IN", "bd", false),
    l("ca", "Català", "ca", "ca_ES", "catalonia", false),
    l("cs_CZ", "Čeština", "cs-CZ", "cs_CZ", "cz", false),
    l("cy", "Cymraeg", "cy", "cy_GB", "wales", false),
    l("da_DK", "Dansk", "da-DK", "da_DK", "dk", false),
    l("de_CH", "Deutsch", "de-CH", "de_DE", "ch", false),
    l("de_DE", "Deutsch", "de-DE", "de_DE", "de", false),
    l("el", "Ελληνικά", "el", "el_GR", "gr", false),
    l("en_AU", "English", "en-AU", "en_US", "au", false),
    l("en_CA", "English", "en-CA", "en_US", "ca", false),
    l("en_GB", "English", "en-GB", "en_GB", "gb", false),
    l("en_US", "English", "en-US", "en_US", "us", false),
    l("eo", "Esperanto", "eo", "eo_EO", "esperanto", false),
    l("es_ES", "Español", "es-ES", "es_ES", "es", false),
    l("es_MX", "Español de México", "es-MX", "es_MX", "mx", false),
    l("et", "Eesti", "et", "et_EE", "ee", false),
    l("eu", "Euskara", "eu", "eu_ES", "basque", false),
    l("fa_IR", "فارسی", "fa-IR", "fa_IR", "ir", true),
    l("fi", "Suomi", "fi", "fi_FI", "fi", false),
    l("fr_BE", "Français", "fr-BE", "fr_FR", "be", false),
    l("fr_CA", "Français", "fr-CA", "fr_CA", "quebec", false),
    l("fr_FR", "Français", "fr-FR", "fr_FR", "fr", false),
    l("ga", "Gaelige", "ga", "ga_IE", "ie", false),
    l("he_IL", "עברית", "he-IL", "he_IL", "il", true),
    l("hi_IN", "हिन्दी", "hi-IN", "hi_IN", "in", false),
    l("hr", "Hrvatski", "hr", "hr_HR", "hr", false),
    l("hu_HU", "Magyar", "hu-HU", "hu_HU", "hu", false),
    l("id_ID", "Bahasa Indonesia", "id-ID", "id_ID", "id", false),
    l("is_IS", "Íslenska", "is-IS", "is_IS", "is", false),
    l("it_IT", "Italiano", "it-IT", "it_IT", "it", false),
    l("ja", "日本語", "ja", "ja_JP", "jp", false),
    l("ko_KR", "한국어", "ko-KR", "ko_KR", "kr", false),
    l("lt_LT", "Lietuviškai", "lt-LT", "lt_LT", "lt", false),
    l("lv", "Latviešu valoda", "lv", "lv_LV", "lv", false),
    l("nb_NO", "Norsk Bokmål", "nb-NO", "nb_NO", "no", false),
    l("nl_BE", "Nederlands", "nl-BE", "nl_BE", "be", false),
    l("nl_NL", "Nederlands", "nl-NL", "nl_NL", "nl", false),
    l("pl_PL", "Polski", "pl-PL", "pl_PL", "pl", false),
    l("pt_BR", "Português", "pt-BR", "pt_BR", "br", false),
    l("pt_PT", "Português", "pt-PT", "pt_PT", "pt", false),
    l("ro_RO", "Română", "ro-RO", "ro_RO", "ro", false),
    l("ru_RU", "Русский", "ru-RU", "ru_RU", "ru", false),
    l("sk_SK", "Slovenčina", "sk-SK", "sk_SK", "sk", false),
    l("sl_SI", "Slovenščina", "sl-SI", "sl_SI", "si", false),
    l("sr_RS", "Српски језик", "sr-RS", "sr_RS", "rs", false),
    l("sv_SE", "Svenska", "sv-SE", "sv_SE", "se", false),
    l("th", "ไทย", "th", "th_TH", "th", false),
    l("tr_TR", "Türkçe", "tr-TR", "tr_TR", "tr", false),
    l("uk", "Українська", "uk", "uk_UA", "ua", false),
    l("ur", "اردو", "ur", "ur_PK", "pk", true),
    l("vi", "Tiếng Việt", "vi", "vi_VN", "vn", false),
    l("zh_CN", "中文 (中国)", "zh-CN", "zh_CN", "cn", false),
    l("zh_TW", "中文 (台灣)", "zh-TW", "zh_TW", "tw", false),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static LocaleInfo>> =
    Lazy::new(|| LOCALES.iter().map(|info| (info.code, info)).collect());

/// Looks a locale up by its exact code.
///
/// # Examples
///
/// ```
/// use polyglot_rs_languages::locales::lookup;
///
/// let fr = lookup("fr_FR").unwrap();
/// assert_eq!(fr.w3c, "fr-FR");
/// assert!(lookup("xx_XX").is_none());
/// ```
pub fn lookup(code: &str) -> Option<&'static LocaleInfo> {
    BY_CODE.get(code).copied()
}

/// Returns every known locale, ordered by code.
pub fn all() -> &'static [LocaleInfo] {
    LOCALES
}

/// Returns the W3C tag of a locale.
///
/// Unknown locales are converted mechanically: the first two segments are
/// kept and joined with a hyphen (`ca_valencia` → `ca-valencia`).
pub fn w3c_for(code: &str) -> String {
    lookup(code).map_or_else(
        || code.splitn(3, '_').take(2).collect::<Vec<_>>().join("-"),
        |info| info.w3c.to_string(),
    )
}

/// Returns the Facebook locale of a locale, if any.
///
/// Unknown locales that already look like `xx_YY` are used as-is.
pub fn facebook_for(code: &str) -> Option<String> {
    if let Some(info) = lookup(code) {
        return (!info.facebook.is_empty()).then(|| info.facebook.to_string());
    }
    let mut parts = code.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(lang), Some(region), None)
            if lang.len() == 2
                && region.len() == 2
                && region.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            Some(code.to_string())
        }
        _ => None,
    }
}

/// Returns `true` if some known locale uses `flag` as its flag code.
pub fn is_known_flag(flag: &str) -> bool {
    LOCALES.iter().any(|info| info.flag == flag)
}
