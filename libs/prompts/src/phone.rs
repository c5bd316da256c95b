use bb_core::Activity;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{PromptRecognizerResult, Recognizer};

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\(?\d[\d\s().-]{5,}\d").expect("phone pattern compiles")
});

const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// Phone number in international (`+44 20 7946 0958`) or national (`(555) 123-4567`) form.
///
/// The value keeps a leading `+` and the digits only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNumberRecognizer;

impl Recognizer<String> for PhoneNumberRecognizer {
    fn recognize(&self, activity: &Activity) -> PromptRecognizerResult<String> {
        let number = PHONE
            .find_iter(activity.text_or_empty())
            .map(|found| normalize(found.as_str()))
            .find(|number| {
                let digits = number.trim_start_matches('+').len();
                (MIN_DIGITS..=MAX_DIGITS).contains(&digits)
            });
        match number {
            Some(number) => PromptRecognizerResult::success(number),
            None => PromptRecognizerResult::failure(),
        }
    }
}

fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    if raw.starts_with('+') {
        out.push('+');
    }
    out.extend(raw.chars().filter(char::is_ascii_digit));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognize(text: &str) -> Option<String> {
        PhoneNumberRecognizer
            .recognize(&Activity::message(text))
            .into_value()
    }

    #[test]
    fn normalizes_international_and_national_numbers() {
        assert_eq!(recognize("call +44 20 7946 0958").as_deref(), Some("+442079460958"));
        assert_eq!(recognize("(555) 123-4567 after 5").as_deref(), Some("5551234567"));
    }

    #[test]
    fn rejects_short_or_overlong_digit_runs() {
        assert_eq!(recognize("room 12-34"), None);
        assert_eq!(recognize("1234567890123456789"), None);
    }
}
