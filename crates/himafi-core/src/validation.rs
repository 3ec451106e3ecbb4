//! Form field validation mirrored from the site's client-side rules

use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub mod patterns {
    pub const EMAIL: &str = r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$";
    pub const PHONE: &str = r"^\+?[\d\s-]{10,}$";
    pub const URL: &str = r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$";
    pub const DATE: &str = r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$";
}

pub mod messages {
    pub const REQUIRED: &str = "This field is required";
    pub const EMAIL: &str = "Please enter a valid email address";
    pub const PASSWORD: &str = "Password must be at least 8 characters long and include at least one letter, one number, and one special character";
    pub const PASSWORD_MATCH: &str = "Passwords do not match";
    pub const PHONE: &str = "Please enter a valid phone number";
    pub const URL: &str = "Please enter a valid URL";
    pub const DATE: &str = "Please enter a valid date (YYYY-MM-DD)";

    pub fn min_length(min: usize) -> String {
        format!("Must be at least {min} characters long")
    }

    pub fn max_length(max: usize) -> String {
        format!("Must be no more than {max} characters long")
    }

    pub fn min_value(min: f64) -> String {
        format!("Must be at least {min}")
    }

    pub fn max_value(max: f64) -> String {
        format!("Must be no more than {max}")
    }

    pub fn file_size(max_mb: u64) -> String {
        format!("File size must be less than {max_mb}MB")
    }

    pub fn file_type(types: &[&str]) -> String {
        format!("File must be of type: {}", types.join(", "))
    }
}

pub mod validators {
    use super::patterns;
    use regex::Regex;
    use serde_json::Value;

    /// Present and non-empty: strings must have non-whitespace content,
    /// arrays at least one element, anything else just has to be non-null.
    pub fn required(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }

    pub fn email(value: &str) -> bool {
        Regex::new(patterns::EMAIL).unwrap().is_match(value)
    }

    /// At least 8 characters with one letter, one digit, and one special
    /// character from the site's allowed set.
    pub fn password(value: &str) -> bool {
        const SPECIALS: &str = "@$!%*#?&";
        value.len() >= 8
            && value.chars().all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
            && value.chars().any(|c| c.is_ascii_alphabetic())
            && value.chars().any(|c| c.is_ascii_digit())
            && value.chars().any(|c| SPECIALS.contains(c))
    }

    pub fn passwords_match(password: &str, confirm: &str) -> bool {
        password == confirm
    }

    pub fn phone(value: &str) -> bool {
        Regex::new(patterns::PHONE).unwrap().is_match(value)
    }

    pub fn url(value: &str) -> bool {
        Regex::new(patterns::URL).unwrap().is_match(value)
    }

    pub fn date(value: &str) -> bool {
        Regex::new(patterns::DATE).unwrap().is_match(value)
    }

    pub fn min_length(value: &str, min: usize) -> bool {
        value.chars().count() >= min
    }

    pub fn max_length(value: &str, max: usize) -> bool {
        value.chars().count() <= max
    }

    pub fn min_value(value: f64, min: f64) -> bool {
        value >= min
    }

    pub fn max_value(value: f64, max: f64) -> bool {
        value <= max
    }

    pub fn file_size(size_bytes: u64, max_mb: u64) -> bool {
        size_bytes <= max_mb * 1024 * 1024
    }

    pub fn file_type(mime: &str, allowed: &[&str]) -> bool {
        allowed.contains(&mime)
    }
}

/// One declarative check against a field value.
#[derive(Debug, Clone)]
pub enum Validator {
    Required,
    Email,
    Password,
    Phone,
    Url,
    Date,
    MinLength(usize),
    MaxLength(usize),
    MinValue(f64),
    MaxValue(f64),
}

impl Validator {
    pub fn check(&self, value: &Value) -> bool {
        match self {
            Validator::Required => validators::required(value),
            Validator::Email => as_str(value).map(validators::email).unwrap_or(false),
            Validator::Password => as_str(value).map(validators::password).unwrap_or(false),
            Validator::Phone => as_str(value).map(validators::phone).unwrap_or(false),
            Validator::Url => as_str(value).map(validators::url).unwrap_or(false),
            Validator::Date => as_str(value).map(validators::date).unwrap_or(false),
            Validator::MinLength(min) => as_str(value)
                .map(|s| validators::min_length(s, *min))
                .unwrap_or(false),
            Validator::MaxLength(max) => as_str(value)
                .map(|s| validators::max_length(s, *max))
                .unwrap_or(false),
            Validator::MinValue(min) => value
                .as_f64()
                .map(|n| validators::min_value(n, *min))
                .unwrap_or(false),
            Validator::MaxValue(max) => value
                .as_f64()
                .map(|n| validators::max_value(n, *max))
                .unwrap_or(false),
        }
    }
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

/// A validator paired with the message shown when it fails.
#[derive(Debug, Clone)]
pub struct Rule {
    pub validator: Validator,
    pub message: String,
}

impl Rule {
    pub fn new(validator: Validator, message: impl Into<String>) -> Self {
        Self {
            validator,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: BTreeMap<String, String>,
}

/// Check every field against its rules; the first failing rule per field
/// wins. Missing fields are validated as null.
pub fn validate_form(
    data: &Map<String, Value>,
    rules: &[(&str, Vec<Rule>)],
) -> ValidationResult {
    let mut errors = BTreeMap::new();

    for (field, field_rules) in rules {
        let value = data.get(*field).cloned().unwrap_or(Value::Null);
        for rule in field_rules {
            if !rule.validator.check(&value) {
                errors.insert((*field).to_string(), rule.message.clone());
                break;
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

pub fn email_rules() -> Vec<Rule> {
    vec![
        Rule::new(Validator::Required, messages::REQUIRED),
        Rule::new(Validator::Email, messages::EMAIL),
    ]
}

pub fn password_rules() -> Vec<Rule> {
    vec![
        Rule::new(Validator::Required, messages::REQUIRED),
        Rule::new(Validator::Password, messages::PASSWORD),
    ]
}

pub fn required_rules() -> Vec<Rule> {
    vec![Rule::new(Validator::Required, messages::REQUIRED)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_pattern_accepts_and_rejects() {
        assert!(validators::email("mahasiswa@itb.ac.id"));
        assert!(validators::email("First.Last+tag@Example.COM"));
        assert!(!validators::email("not-an-email"));
        assert!(!validators::email("missing@tld"));
    }

    #[test]
    fn password_needs_letter_digit_and_special() {
        assert!(validators::password("abc123!@x"));
        assert!(!validators::password("short1!"));
        assert!(!validators::password("lettersonly!"));
        assert!(!validators::password("12345678!"));
        assert!(!validators::password("abcd1234"));
        // Characters outside the allowed set are rejected outright.
        assert!(!validators::password("abc123!\u{00e9}x"));
    }

    #[test]
    fn phone_and_date_patterns() {
        assert!(validators::phone("+62 812-3456-7890"));
        assert!(!validators::phone("12345"));
        assert!(validators::date("2026-02-28"));
        assert!(!validators::date("2026-13-01"));
        assert!(!validators::date("28-02-2026"));
    }

    #[test]
    fn url_pattern() {
        assert!(validators::url("https://himafi.example.org/events"));
        assert!(validators::url("example.com"));
        assert!(!validators::url("not a url"));
    }

    #[test]
    fn required_handles_strings_arrays_and_null() {
        assert!(validators::required(&json!("x")));
        assert!(!validators::required(&json!("   ")));
        assert!(validators::required(&json!([1])));
        assert!(!validators::required(&json!([])));
        assert!(!validators::required(&Value::Null));
        assert!(validators::required(&json!(0)));
    }

    #[test]
    fn validate_form_reports_first_failure_per_field() {
        let mut data = Map::new();
        data.insert("email".to_string(), json!(""));
        data.insert("name".to_string(), json!("Siti"));

        let rules = vec![
            ("email", email_rules()),
            ("name", required_rules()),
            ("phone", required_rules()),
        ];
        let result = validate_form(&data, &rules);

        assert!(!result.is_valid);
        // Empty email fails the required rule before the format rule runs.
        assert_eq!(result.errors["email"], messages::REQUIRED);
        // Absent fields validate as null.
        assert_eq!(result.errors["phone"], messages::REQUIRED);
        assert!(!result.errors.contains_key("name"));
    }

    #[test]
    fn validate_form_passes_clean_input() {
        let mut data = Map::new();
        data.insert("email".to_string(), json!("a@b.co"));
        data.insert("password".to_string(), json!("abc123!@x"));

        let rules = vec![("email", email_rules()), ("password", password_rules())];
        let result = validate_form(&data, &rules);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn numeric_bounds() {
        assert!(Validator::MinValue(3.0).check(&json!(3)));
        assert!(!Validator::MinValue(3.0).check(&json!(2)));
        assert!(Validator::MaxValue(10.0).check(&json!(10)));
        assert!(!Validator::MaxValue(10.0).check(&json!("10")));
    }
}
