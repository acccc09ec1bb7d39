//! Input format rules for phone numbers, names, and passwords.
//!
//! Every rule runs independently and failures accumulate; nothing
//! short-circuits. Callers concatenate the reports of the validators that
//! apply to a request and reject it when the combined report is non-empty.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use super::Error;

/// Required country prefix for phone numbers.
pub const PHONE_PREFIX: &str = "+62";
/// Minimum phone length, prefix included.
pub const PHONE_MIN_LEN: usize = 10;
/// Maximum phone length, prefix included.
pub const PHONE_MAX_LEN: usize = 13;
/// Minimum display name length.
pub const NAME_MIN_LEN: usize = 3;
/// Maximum display name length.
pub const NAME_MAX_LEN: usize = 60;
/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 6;
/// Maximum password length.
pub const PASSWORD_MAX_LEN: usize = 64;

const VIOLATION_SEPARATOR: &str = ", ";

static PHONE_DIGITS_RE: OnceLock<Regex> = OnceLock::new();
static SYMBOL_RE: OnceLock<Regex> = OnceLock::new();

fn phone_digits_regex() -> &'static Regex {
    PHONE_DIGITS_RE.get_or_init(|| {
        Regex::new(r"^[0-9]*$")
            .unwrap_or_else(|error| panic!("phone digits regex failed to compile: {error}"))
    })
}

/// One character from the Unicode punctuation (P*) or symbol (S*) categories.
fn symbol_regex() -> &'static Regex {
    SYMBOL_RE.get_or_init(|| {
        Regex::new(r"^[\p{P}\p{S}]$")
            .unwrap_or_else(|error| panic!("symbol regex failed to compile: {error}"))
    })
}

/// Ordered list of human-readable rule violations. Empty means valid.
///
/// # Examples
/// ```
/// use user_service::domain::validation::{validate_name, validate_phone};
///
/// let mut report = validate_phone("0812");
/// report.extend(validate_name("Al"));
/// assert_eq!(report.len(), 3);
/// assert!(report.joined().starts_with("phone must start with +62"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<&'static str>,
}

impl ValidationReport {
    fn push(&mut self, violation: &'static str) {
        self.violations.push(violation);
    }

    /// Append the violations of another report, preserving order.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
    }

    /// True when no rule was violated.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Violations in evaluation order.
    pub fn violations(&self) -> &[&'static str] {
        &self.violations
    }

    /// All violations joined into one message.
    pub fn joined(&self) -> String {
        self.violations.join(VIOLATION_SEPARATOR)
    }

    /// Convert into a domain error when any rule was violated.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        Err(Error::invalid_request(self.joined())
            .with_details(json!({ "violations": self.violations })))
    }
}

/// Check the phone number format.
pub fn validate_phone(phone: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    if !phone.starts_with(PHONE_PREFIX) {
        report.push("phone must start with +62");
    }

    // Digits are checked after the first three characters whether or not the
    // prefix matched.
    let rest: String = phone.chars().skip(PHONE_PREFIX.len()).collect();
    if !phone_digits_regex().is_match(&rest) {
        report.push("phone must contain only digits after +62");
    }

    let length = phone.chars().count();
    if length < PHONE_MIN_LEN {
        report.push("phone must be at least 10 characters");
    }
    if length > PHONE_MAX_LEN {
        report.push("phone must be at most 13 characters");
    }
    report
}

/// Check the display name length.
pub fn validate_name(name: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    let length = name.chars().count();
    if length < NAME_MIN_LEN {
        report.push("name must be at least 3 characters");
    }
    if length > NAME_MAX_LEN {
        report.push("name must be at most 60 characters");
    }
    report
}

/// Check the password length and character classes.
pub fn validate_password(password: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    let length = password.chars().count();
    if length < PASSWORD_MIN_LEN {
        report.push("password must be at least 6 characters");
    }
    if length > PASSWORD_MAX_LEN {
        report.push("password must be at most 64 characters");
    }

    let classes = CharacterClasses::scan(password);
    if !classes.is_complete() {
        report.push(
            "password must contain at least 1 capital letter, 1 number, and 1 special character",
        );
    }
    report
}

#[derive(Debug, Default)]
struct CharacterClasses {
    digits: usize,
    uppercase: usize,
    symbols: usize,
}

impl CharacterClasses {
    fn scan(value: &str) -> Self {
        let mut classes = Self::default();
        for c in value.chars() {
            if c.is_numeric() {
                classes.digits += 1;
            } else if c.is_uppercase() {
                classes.uppercase += 1;
            } else if is_symbol(c) {
                classes.symbols += 1;
            }
        }
        classes
    }

    fn is_complete(&self) -> bool {
        self.digits > 0 && self.uppercase > 0 && self.symbols > 0
    }
}

/// Marks, format and private-use characters are not symbols.
fn is_symbol(c: char) -> bool {
    let mut buf = [0_u8; 4];
    symbol_regex().is_match(c.encode_utf8(&mut buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    const PASSWORD_CLASSES: &str =
        "password must contain at least 1 capital letter, 1 number, and 1 special character";

    #[rstest]
    #[case("+6280989444")]
    #[case("+628098944")]
    #[case("+628098944412")]
    fn accepts_valid_phones(#[case] phone: &str) {
        assert!(validate_phone(phone).is_empty(), "{phone} should be valid");
    }

    #[rstest]
    #[case("0628098944", &["phone must start with +62"])]
    #[case("+62809a9444", &["phone must contain only digits after +62"])]
    #[case("+62809", &["phone must be at least 10 characters"])]
    #[case("+6280989444123", &["phone must be at most 13 characters"])]
    #[case(
        "+1abc",
        &[
            "phone must start with +62",
            "phone must contain only digits after +62",
            "phone must be at least 10 characters",
        ]
    )]
    #[case(
        "",
        &["phone must start with +62", "phone must be at least 10 characters"]
    )]
    fn reports_every_phone_violation(#[case] phone: &str, #[case] expected: &[&str]) {
        assert_eq!(validate_phone(phone).violations(), expected);
    }

    #[rstest]
    #[case("abc", true)]
    #[case("albert einstein", true)]
    #[case(&"n".repeat(60), true)]
    #[case("ab", false)]
    #[case(&"n".repeat(61), false)]
    fn name_boundaries_are_inclusive(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_name(name).is_empty(), valid);
    }

    #[rstest]
    #[case("Password1!")]
    #[case("Aa1!aa")]
    #[case("Zz9~zz")]
    #[case("Kata Sandi 1€")]
    #[case("Sandi1«»")]
    #[case("Sandi1^")]
    fn accepts_strong_passwords(#[case] password: &str) {
        assert!(validate_password(password).is_empty(), "{password}");
    }

    #[rstest]
    #[case("password1!")]
    #[case("Password!!")]
    #[case("Password11")]
    #[case("Password1\u{200D}")]
    #[case("Password1\u{0301}")]
    #[case("Password1\u{E000}")]
    #[case("Password1\u{00A0}")]
    fn missing_class_yields_one_combined_violation(#[case] password: &str) {
        assert_eq!(validate_password(password).violations(), &[PASSWORD_CLASSES]);
    }

    #[rstest]
    fn short_weak_password_reports_length_and_classes() {
        assert_eq!(
            validate_password("abc").violations(),
            &["password must be at least 6 characters", PASSWORD_CLASSES]
        );
    }

    #[rstest]
    fn long_password_reports_length() {
        let password = format!("A1!{}", "a".repeat(62));
        assert_eq!(
            validate_password(&password).violations(),
            &["password must be at most 64 characters"]
        );
    }

    #[rstest]
    fn reports_concatenate_in_order_and_join_with_commas() {
        let mut report = validate_phone("+62abc");
        report.extend(validate_name("Al"));

        let error = report.into_result().expect_err("violations present");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            error.message(),
            "phone must contain only digits after +62, \
             phone must be at least 10 characters, \
             name must be at least 3 characters"
        );
        let violations = error
            .details()
            .and_then(|details| details.get("violations"))
            .and_then(serde_json::Value::as_array)
            .expect("violations detail");
        assert_eq!(violations.len(), 3);
    }

    #[rstest]
    fn empty_report_passes() {
        assert!(ValidationReport::default().into_result().is_ok());
    }
}
