//! Global text direction, as seeded into the call scope.

/// Global directionality of the output: left-to-right or right-to-left.
///
/// The integer form used in options is `1` for ltr, `-1` for rtl and `0` for
/// "not set, derive from the locale".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidiGlobalDir {
    Ltr,
    Rtl,
}

const RTL_LANGUAGES: &[&str] = &[
    "ar", "ckb", "dv", "fa", "he", "iw", "nqo", "ps", "sd", "ug", "ur", "yi",
];

const RTL_SCRIPTS: &[&str] = &["arab", "hebr", "nkoo", "thaa", "tfng"];

const LTR_SCRIPTS: &[&str] = &["latn", "cyrl"];

impl BidiGlobalDir {
    /// Interpret an options value; zero means unset.
    pub fn from_int(value: i32) -> Option<Self> {
        match value.signum() {
            1 => Some(BidiGlobalDir::Ltr),
            -1 => Some(BidiGlobalDir::Rtl),
            _ => None,
        }
    }

    pub fn to_int(self) -> i32 {
        match self {
            BidiGlobalDir::Ltr => 1,
            BidiGlobalDir::Rtl => -1,
        }
    }

    /// Direction implied by a locale string such as `ar`, `he-IL` or
    /// `az-Arab`. A missing locale is treated as ltr.
    pub fn for_locale(locale: Option<&str>) -> Self {
        match locale {
            Some(locale) if is_rtl_locale(locale) => BidiGlobalDir::Rtl,
            _ => BidiGlobalDir::Ltr,
        }
    }

    /// An explicit non-zero value takes precedence over the locale.
    pub fn resolve(explicit: i32, locale: Option<&str>) -> Self {
        Self::from_int(explicit).unwrap_or_else(|| Self::for_locale(locale))
    }

    pub fn start_edge(self) -> &'static str {
        match self {
            BidiGlobalDir::Ltr => "left",
            BidiGlobalDir::Rtl => "right",
        }
    }

    pub fn end_edge(self) -> &'static str {
        match self {
            BidiGlobalDir::Ltr => "right",
            BidiGlobalDir::Rtl => "left",
        }
    }
}

fn is_rtl_locale(locale: &str) -> bool {
    let normalized = locale.replace('_', "-").to_ascii_lowercase();
    let mut subtags = normalized.split('-');
    let language = subtags.next().unwrap_or_default();

    // An explicit script subtag decides on its own.
    for subtag in subtags {
        if LTR_SCRIPTS.contains(&subtag) {
            return false;
        }
        if RTL_SCRIPTS.contains(&subtag) {
            return true;
        }
    }
    RTL_LANGUAGES.contains(&language)
}
