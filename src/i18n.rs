//! Internationalization (i18n) Support
//!
//! Data-driven locale resources: speech language tags, digit glyphs,
//! number-words and prompt templates. A [`Catalog`] is resolved once per
//! session and pairs the active locale with the default one for fallback.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Te,
}

impl Locale {
    pub const DEFAULT: Locale = Locale::En;

    /// Short language code ("en", "te")
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Te => "te",
        }
    }

    /// Language tag handed to recognition and synthesis backends
    pub fn speech_tag(&self) -> &'static str {
        match self {
            Locale::En => "en-US",
            Locale::Te => "te-IN",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Locale::En),
            "te" | "te-in" | "telugu" => Ok(Locale::Te),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// Spoken prompt templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKey {
    Start,
    Next,
    Done,
    Retry,
    NoSpeech,
    Skip,
    SkipDone,
}

impl PromptKey {
    pub const ALL: [PromptKey; 7] = [
        PromptKey::Start,
        PromptKey::Next,
        PromptKey::Done,
        PromptKey::Retry,
        PromptKey::NoSpeech,
        PromptKey::Skip,
        PromptKey::SkipDone,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PromptKey::Start => "start",
            PromptKey::Next => "next",
            PromptKey::Done => "done",
            PromptKey::Retry => "retry",
            PromptKey::NoSpeech => "noSpeech",
            PromptKey::Skip => "skip",
            PromptKey::SkipDone => "skipDone",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

/// On-screen status lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    Ready,
    Speaking,
    Listening,
    NoSpeechRetry,
    NotUnderstoodRetry,
    RecognitionError,
    Complete,
    Stopped,
}

impl StatusKey {
    pub const ALL: [StatusKey; 8] = [
        StatusKey::Ready,
        StatusKey::Speaking,
        StatusKey::Listening,
        StatusKey::NoSpeechRetry,
        StatusKey::NotUnderstoodRetry,
        StatusKey::RecognitionError,
        StatusKey::Complete,
        StatusKey::Stopped,
    ];

    /// Override file key, e.g. `status.listening`
    pub fn key(&self) -> &'static str {
        match self {
            StatusKey::Ready => "status.ready",
            StatusKey::Speaking => "status.speaking",
            StatusKey::Listening => "status.listening",
            StatusKey::NoSpeechRetry => "status.noSpeechRetry",
            StatusKey::NotUnderstoodRetry => "status.notUnderstoodRetry",
            StatusKey::RecognitionError => "status.recognitionError",
            StatusKey::Complete => "status.complete",
            StatusKey::Stopped => "status.stopped",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

const EN_STATUS: &[(StatusKey, &str)] = &[
    (StatusKey::Ready, "Ready"),
    (StatusKey::Speaking, "🔊 Speaking..."),
    (StatusKey::Listening, "🎤 Listening... Speak now!"),
    (StatusKey::NoSpeechRetry, "⚠️ No speech detected. Retry {attempt}/{max}"),
    (StatusKey::NotUnderstoodRetry, "⚠️ Didn't understand. Retry {attempt}/{max}"),
    (StatusKey::RecognitionError, "⚠️ Error: {code}"),
    (StatusKey::Complete, "✅ Complete! All fields processed."),
    (StatusKey::Stopped, "⏹️ Voice session stopped"),
];

const TE_STATUS: &[(StatusKey, &str)] = &[
    (StatusKey::Ready, "సిద్ధంగా ఉంది"),
    (StatusKey::Speaking, "🔊 మాట్లాడుతోంది..."),
    (StatusKey::Listening, "🎤 వింటోంది... ఇప్పుడు మాట్లాడండి!"),
    (StatusKey::NoSpeechRetry, "⚠️ మాట వినబడలేదు. మళ్లీ ప్రయత్నం {attempt}/{max}"),
    (StatusKey::NotUnderstoodRetry, "⚠️ అర్థం కాలేదు. మళ్లీ ప్రయత్నం {attempt}/{max}"),
    (StatusKey::RecognitionError, "⚠️ లోపం: {code}"),
    (StatusKey::Complete, "✅ పూర్తయింది! అన్ని ఫీల్డ్‌లు పూర్తయ్యాయి."),
    (StatusKey::Stopped, "⏹️ వాయిస్ సెషన్ ఆపివేయబడింది"),
];

const EN_TEMPLATES: &[(PromptKey, &str)] = &[
    (
        PromptKey::Start,
        "Hello! I am your voice assistant. Let's fill out this form together. What is your {label}? {guidance} (Field 1 of {total})",
    ),
    (
        PromptKey::Next,
        "Got it, your {label} is {value}. Now, what is your {nextLabel}? {guidance} (Field {n} of {total})",
    ),
    (
        PromptKey::Done,
        "Got it, your {label} is {value}. All information collected.",
    ),
    (
        PromptKey::Retry,
        "Sorry, I could not understand that. Please repeat your {label}. {guidance}",
    ),
    (
        PromptKey::NoSpeech,
        "I didn't hear you clearly. Please repeat your {label}. {guidance}",
    ),
    (
        PromptKey::Skip,
        "Skipping that field. Now, what is your {nextLabel}? {guidance} (Field {n} of {total})",
    ),
    (
        PromptKey::SkipDone,
        "I have collected all available information.",
    ),
];

const TE_TEMPLATES: &[(PromptKey, &str)] = &[
    (
        PromptKey::Start,
        "నమస్కారం! నేను మీ వాయిస్ సహాయకుడిని. ఈ ఫారమ్‌ను కలిసి పూరిద్దాం. మీ {label} ఏమిటి? {guidance} (ఫీల్డ్ 1/{total})",
    ),
    (
        PromptKey::Next,
        "సరే, మీ {label} {value}. ఇప్పుడు మీ {nextLabel} ఏమిటి? {guidance} (ఫీల్డ్ {n}/{total})",
    ),
    (
        PromptKey::Done,
        "సరే, మీ {label} {value}. అన్ని సమాచారం సేకరించబడింది.",
    ),
    (
        PromptKey::Retry,
        "క్షమించండి, నేను అర్థం చేసుకోలేకపోయాను. దయచేసి మీ {label} మళ్లీ చెప్పండి. {guidance}",
    ),
    (
        PromptKey::NoSpeech,
        "మీరు చెప్పినది వినలేదు. దయచేసి మీ {label} పునరావృతం చేయండి. {guidance}",
    ),
    (
        PromptKey::Skip,
        "ఆ ఫీల్డ్ దాటవేస్తున్నాను. ఇప్పుడు మీ {nextLabel} ఏమిటి? {guidance} (ఫీల్డ్ {n}/{total})",
    ),
    (
        PromptKey::SkipDone,
        "అందుబాటులో ఉన్న సమాచారాన్ని సేకరించాను.",
    ),
];

const EN_NUMBER_WORDS: &[(&str, u32)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
    ("hundred", 100),
    ("thousand", 1000),
];

const TE_NUMBER_WORDS: &[(&str, u32)] = &[
    ("సున్నా", 0),
    ("ఒకటి", 1),
    ("రెండు", 2),
    ("మూడు", 3),
    ("నాలుగు", 4),
    ("ఐదు", 5),
    ("ఆరు", 6),
    ("ఏడు", 7),
    ("ఎనిమిది", 8),
    ("తొమ్మిది", 9),
    ("పది", 10),
    ("పదకొండు", 11),
    ("పన్నెండు", 12),
    ("పదమూడు", 13),
    ("పద్నాలుగు", 14),
    ("పదిహేను", 15),
    ("పదహారు", 16),
    ("పదిహేడు", 17),
    ("పద్దెనిమిది", 18),
    ("పందొమ్మిది", 19),
    ("ఇరవై", 20),
    ("ముప్పై", 30),
    ("నలభై", 40),
    ("యాభై", 50),
    ("ఐంబై", 50),
    ("అరవై", 60),
    ("డెబ్బై", 70),
    ("ఎనభై", 80),
    ("తొంభై", 90),
    ("నూరు", 100),
    ("వంద", 100),
    ("వెయ్యి", 1000),
];

const NO_DIGITS: &[(char, char)] = &[];

const TE_DIGITS: &[(char, char)] = &[
    ('౦', '0'),
    ('౧', '1'),
    ('౨', '2'),
    ('౩', '3'),
    ('౪', '4'),
    ('౫', '5'),
    ('౬', '6'),
    ('౭', '7'),
    ('౮', '8'),
    ('౯', '9'),
];

/// Parsing tables, prompt templates and status lines for one locale
#[derive(Debug, Clone)]
pub struct LocaleResources {
    pub locale: Locale,
    /// Locale digit glyph -> ASCII digit
    digit_glyphs: HashMap<char, char>,
    /// Closed number-word vocabulary
    number_words: HashMap<&'static str, u32>,
    templates: HashMap<PromptKey, String>,
    status: HashMap<StatusKey, String>,
}

impl LocaleResources {
    /// Built-in resources for a locale
    pub fn builtin(locale: Locale) -> Self {
        let (templates, status, words, digits) = match locale {
            Locale::En => (EN_TEMPLATES, EN_STATUS, EN_NUMBER_WORDS, NO_DIGITS),
            Locale::Te => (TE_TEMPLATES, TE_STATUS, TE_NUMBER_WORDS, TE_DIGITS),
        };

        Self {
            locale,
            digit_glyphs: digits.iter().copied().collect(),
            number_words: words.iter().copied().collect(),
            templates: templates
                .iter()
                .map(|(k, t)| (*k, t.to_string()))
                .collect(),
            status: status.iter().map(|(k, t)| (*k, t.to_string())).collect(),
        }
    }

    pub fn template(&self, key: PromptKey) -> Option<&str> {
        self.templates.get(&key).map(String::as_str)
    }

    pub fn set_template(&mut self, key: PromptKey, text: &str) {
        self.templates.insert(key, text.to_string());
    }

    #[cfg(test)]
    pub(crate) fn remove_template(&mut self, key: PromptKey) {
        self.templates.remove(&key);
    }

    pub fn status(&self, key: StatusKey) -> Option<&str> {
        self.status.get(&key).map(String::as_str)
    }

    pub fn set_status(&mut self, key: StatusKey, text: &str) {
        self.status.insert(key, text.to_string());
    }

    #[cfg(test)]
    pub(crate) fn remove_status(&mut self, key: StatusKey) {
        self.status.remove(&key);
    }

    /// Whether this locale writes numbers with its own digit glyphs
    pub fn has_digit_glyphs(&self) -> bool {
        !self.digit_glyphs.is_empty()
    }

    /// Replace locale digit glyphs with ASCII digits
    pub fn normalize_digits(&self, text: &str) -> String {
        text.chars()
            .map(|c| *self.digit_glyphs.get(&c).unwrap_or(&c))
            .collect()
    }

    /// Value of a single number-word token
    pub fn number_word(&self, token: &str) -> Option<u32> {
        self.number_words.get(token).copied()
    }

    /// Merge template and status overrides from `<dir>/<lang>.json`
    ///
    /// Returns the number of entries replaced. Unknown keys are ignored.
    pub fn load_overrides(&mut self, dir: &Path) -> usize {
        let path = dir.join(format!("{}.json", self.locale.code()));
        if !path.exists() {
            debug!("No prompt overrides at {}", path.display());
            return 0;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("⚠️ Could not read prompt overrides {}: {}", path.display(), e);
                return 0;
            }
        };

        let entries: HashMap<String, String> = match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!("⚠️ Invalid prompt overrides {}: {}", path.display(), e);
                return 0;
            }
        };

        let mut applied = 0;
        for (key, text) in entries {
            if let Some(k) = PromptKey::from_key(&key) {
                self.set_template(k, &text);
            } else if let Some(k) = StatusKey::from_key(&key) {
                self.set_status(k, &text);
            } else {
                debug!("Ignoring unknown prompt key '{}'", key);
                continue;
            }
            applied += 1;
        }
        info!("🌐 Loaded {} prompt overrides for '{}'", applied, self.locale);
        applied
    }
}

/// Active locale resources plus the default locale for fallback
#[derive(Debug, Clone)]
pub struct Catalog {
    active: LocaleResources,
    fallback: Option<LocaleResources>,
}

impl Catalog {
    pub fn for_locale(locale: Locale) -> Self {
        Self::from_resources(LocaleResources::builtin(locale))
    }

    pub fn from_resources(active: LocaleResources) -> Self {
        let fallback = if active.locale.is_default() {
            None
        } else {
            Some(LocaleResources::builtin(Locale::DEFAULT))
        };
        Self { active, fallback }
    }

    pub fn locale(&self) -> Locale {
        self.active.locale
    }

    pub fn active(&self) -> &LocaleResources {
        &self.active
    }

    /// Default-locale resources, `None` when the active locale is the default
    pub fn fallback(&self) -> Option<&LocaleResources> {
        self.fallback.as_ref()
    }

    /// Template text for the active locale, falling back to the default locale
    pub fn template(&self, key: PromptKey) -> &str {
        self.active
            .template(key)
            .or_else(|| self.fallback.as_ref().and_then(|f| f.template(key)))
            .unwrap_or("")
    }

    /// Status line for the active locale, falling back to the default locale
    pub fn status(&self, key: StatusKey) -> &str {
        self.active
            .status(key)
            .or_else(|| self.fallback.as_ref().and_then(|f| f.status(key)))
            .unwrap_or("")
    }
}

/// Substitute `{name}` placeholders
pub fn fill(template: &str, params: &[(&str, String)]) -> String {
    let mut result = template.to_string();
    for (name, value) in params {
        result = result.replace(&format!("{{{}}}", name), value);
    }
    result
}
