//! Prompt Generation
//!
//! Builds the spoken prompts for each dialogue step from the locale catalog.

use crate::fields::FieldSpec;
use crate::i18n::{fill, Catalog, PromptKey};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PromptGenerator {
    catalog: Arc<Catalog>,
}

impl PromptGenerator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    fn render(&self, key: PromptKey, params: &[(&str, String)]) -> String {
        fill(self.catalog.template(key), params)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Greeting plus the first question
    pub fn start(&self, first: &FieldSpec, total: usize) -> String {
        self.render(
            PromptKey::Start,
            &[
                ("label", first.label.clone()),
                ("guidance", first.guidance()),
                ("total", total.to_string()),
            ],
        )
    }

    /// Confirm `filled` and ask for the field at `next_index` (0-based)
    pub fn next(
        &self,
        filled: &FieldSpec,
        value: &str,
        next: &FieldSpec,
        next_index: usize,
        total: usize,
    ) -> String {
        self.render(
            PromptKey::Next,
            &[
                ("label", filled.label.clone()),
                ("value", filled.display_value(value).to_string()),
                ("nextLabel", next.label.clone()),
                ("guidance", next.guidance()),
                ("n", (next_index + 1).to_string()),
                ("total", total.to_string()),
            ],
        )
    }

    /// Confirm the last field and announce completion
    pub fn done(&self, filled: &FieldSpec, value: &str) -> String {
        self.render(
            PromptKey::Done,
            &[
                ("label", filled.label.clone()),
                ("value", filled.display_value(value).to_string()),
            ],
        )
    }

    pub fn retry(&self, field: &FieldSpec) -> String {
        self.render(
            PromptKey::Retry,
            &[("label", field.label.clone()), ("guidance", field.guidance())],
        )
    }

    pub fn no_speech(&self, field: &FieldSpec) -> String {
        self.render(
            PromptKey::NoSpeech,
            &[("label", field.label.clone()), ("guidance", field.guidance())],
        )
    }

    /// Announce a skip and ask for the field at `next_index` (0-based)
    pub fn skip(&self, next: &FieldSpec, next_index: usize, total: usize) -> String {
        self.render(
            PromptKey::Skip,
            &[
                ("nextLabel", next.label.clone()),
                ("guidance", next.guidance()),
                ("n", (next_index + 1).to_string()),
                ("total", total.to_string()),
            ],
        )
    }

    /// Completion after the last field was skipped
    pub fn skip_done(&self) -> String {
        self.render(PromptKey::SkipDone, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::SelectOption;
    use crate::i18n::{Locale, LocaleResources};

    fn generator(locale: Locale) -> PromptGenerator {
        PromptGenerator::new(Arc::new(Catalog::for_locale(locale)))
    }

    fn sex() -> FieldSpec {
        FieldSpec::select(
            "sex",
            "Sex",
            vec![SelectOption::new("0", "Female"), SelectOption::new("1", "Male")],
        )
    }

    #[test]
    fn test_start_prompt() {
        let age = FieldSpec::number("age", "Age", 29.0, 77.0);
        assert_eq!(
            generator(Locale::En).start(&age, 13),
            "Hello! I am your voice assistant. Let's fill out this form together. \
             What is your Age? (29 to 77) (Field 1 of 13)"
        );
    }

    #[test]
    fn test_next_prompt_names_value_and_next_field() {
        let age = FieldSpec::number("age", "Age", 29.0, 77.0);
        let text = generator(Locale::En).next(&age, "54", &sex(), 1, 13);
        assert_eq!(
            text,
            "Got it, your Age is 54. Now, what is your Sex? (Female, Male) (Field 2 of 13)"
        );
    }

    #[test]
    fn test_done_speaks_option_label() {
        let text = generator(Locale::En).done(&sex(), "1");
        assert_eq!(text, "Got it, your Sex is Male. All information collected.");
    }

    #[test]
    fn test_text_field_has_no_dangling_space() {
        let notes = FieldSpec::text("notes", "Notes");
        assert_eq!(
            generator(Locale::En).retry(&notes),
            "Sorry, I could not understand that. Please repeat your Notes."
        );
    }

    #[test]
    fn test_telugu_prompts_and_fallback() {
        let te = generator(Locale::Te);
        assert!(te.skip(&sex(), 2, 5).contains("(ఫీల్డ్ 3/5)"));

        let mut resources = LocaleResources::builtin(Locale::Te);
        resources.remove_template(PromptKey::NoSpeech);
        let partial = PromptGenerator::new(Arc::new(Catalog::from_resources(resources)));
        assert_eq!(
            partial.no_speech(&sex()),
            "I didn't hear you clearly. Please repeat your Sex. (Female, Male)"
        );
    }
}
