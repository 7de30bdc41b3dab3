use crate::models::settings::Language;

/// A concrete display language, after `auto` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiLanguage {
    En,
    Ar,
}

/// Resolve the configured language against the host locale (e.g. `ar_EG.UTF-8`).
pub fn resolve_language(choice: Language, host_locale: Option<&str>) -> UiLanguage {
    match choice {
        Language::En => UiLanguage::En,
        Language::Ar => UiLanguage::Ar,
        Language::Auto => match host_locale {
            Some(l) if l.to_lowercase().starts_with("ar") => UiLanguage::Ar,
            _ => UiLanguage::En,
        },
    }
}

/// First non-empty of `LC_ALL`, `LC_MESSAGES`, `LANG`.
pub fn host_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Friday,
    Jumuah,
    Next,
    NoNextPrayer,
    Sunrise,
}

impl Label {
    pub fn text(self, lang: UiLanguage) -> &'static str {
        match (self, lang) {
            (Label::Friday, UiLanguage::En) => "Friday",
            (Label::Friday, UiLanguage::Ar) => "الجمعة",
            (Label::Jumuah, UiLanguage::En) => "Jumu'ah",
            (Label::Jumuah, UiLanguage::Ar) => "صلاة الجمعة",
            (Label::Next, UiLanguage::En) => "Next",
            (Label::Next, UiLanguage::Ar) => "التالية",
            (Label::NoNextPrayer, UiLanguage::En) => "No next prayer found",
            (Label::NoNextPrayer, UiLanguage::Ar) => "لا توجد صلاة قادمة",
            (Label::Sunrise, UiLanguage::En) => "Sunrise",
            (Label::Sunrise, UiLanguage::Ar) => "الشروق",
        }
    }
}
