use chrono::NaiveDate;
use thiserror::Error;

use crate::models::RecordType;
use crate::wizard::schema::{schema, FieldKind};

const MIN_YEAR: i32 = 1950;
const MAX_YEAR: i32 = 2050;

/// Recoverable input errors. `Display` is the text shown before the re-prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid format. Please use YYYY-MM (e.g., 2024-01)")]
    MonthFormat,

    #[error("Year must be between 1950 and 2050. You entered: {0}")]
    YearRange(i32),

    #[error("Month must be between 01 and 12. You entered: {0:02}")]
    MonthRange(u32),

    #[error("Invalid format. Please use YYYY-MM-DD (e.g., 2024-12-31)")]
    DayFormat,

    #[error("Invalid date: {0}")]
    NoSuchDate(String),

    #[error("Invalid number. Please send a valid number of days.")]
    Days,

    #[error("Nothing entered. Send one or more values separated by commas.")]
    EmptyList,

    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("'{0}' is not one of the listed options.")]
    NotAnOption(String),
}

/// `skip` / `empty`, in any case, mean "leave this blank".
pub fn is_blank_marker(input: &str) -> bool {
    input.eq_ignore_ascii_case("skip") || input.eq_ignore_ascii_case("empty")
}

/// Validates a `YYYY-MM` month. `Ok(None)` means valid and blank.
pub fn validate_month_date(input: &str) -> Result<Option<NaiveDate>, ValidationError> {
    if input.is_empty() || is_blank_marker(input) {
        return Ok(None);
    }
    if !has_shape(input, &[4, 2]) {
        return Err(ValidationError::MonthFormat);
    }
    let (year, month) = (number(&input[0..4]), number(&input[5..7]));
    let year = year as i32;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearRange(year));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(Some)
        .ok_or(ValidationError::MonthRange(month))
}

/// Validates a `YYYY-MM-DD` calendar date that actually exists.
pub fn validate_subscription_date(input: &str) -> Result<NaiveDate, ValidationError> {
    if !has_shape(input, &[4, 2, 2]) {
        return Err(ValidationError::DayFormat);
    }
    let (year, month, day) = (
        number(&input[0..4]) as i32,
        number(&input[5..7]),
        number(&input[8..10]),
    );
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ValidationError::NoSuchDate(input.to_string()))
}

/// Signed whole number of days.
pub fn validate_days(input: &str) -> Result<i64, ValidationError> {
    input.trim().parse::<i64>().map_err(|_| ValidationError::Days)
}

pub fn is_optional(record_type: RecordType, field: &str) -> bool {
    schema(record_type).is_optional(field)
}

/// Prompt for one subfield: current value when editing, label, date format
/// hint, skip hint for optional text fields.
pub fn prompt_for(
    record_type: RecordType,
    field: &str,
    is_editing: bool,
    current_value: &str,
) -> String {
    let schema = schema(record_type);
    let label = schema.label(field);
    let kind = schema.kind(field);

    let mut prompt = String::new();
    let editing = is_editing && !current_value.is_empty();
    match kind {
        FieldKind::Boolean | FieldKind::Select => {
            if editing {
                prompt.push_str(&format!("Current: *{current_value}*\n\n"));
            }
            prompt.push_str(&format!("Select *{label}*:"));
        }
        FieldKind::Text | FieldKind::Date => {
            if editing {
                prompt.push_str(&format!("Current: *{current_value}*\n"));
            }
            prompt.push_str(&format!("📝 Enter *{label}*:"));
        }
    }
    if kind == FieldKind::Date {
        prompt.push_str("\n_Format: YYYY-MM (e.g., 2024-01)_");
    }
    if schema.is_optional(field) && matches!(kind, FieldKind::Text | FieldKind::Date) {
        prompt.push_str("\n\n💡 _Send 'skip' or 'empty' to leave blank_");
    }
    prompt
}

// Digit groups joined by '-', e.g. [4, 2] is `DDDD-DD`.
fn has_shape(input: &str, groups: &[usize]) -> bool {
    let mut parts = input.split('-');
    let shaped = groups.iter().all(|&len| {
        parts
            .next()
            .is_some_and(|p| p.len() == len && p.bytes().all(|b| b.is_ascii_digit()))
    });
    shaped && parts.next().is_none()
}

// Caller guarantees ASCII digits only.
fn number(digits: &str) -> u32 {
    digits
        .bytes()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_date_accepts_valid() {
        assert_eq!(
            validate_month_date("2024-01"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 1))
        );
    }

    #[test]
    fn test_month_date_blank_markers() {
        assert_eq!(validate_month_date(""), Ok(None));
        assert_eq!(validate_month_date("skip"), Ok(None));
        assert_eq!(validate_month_date("EMPTY"), Ok(None));
    }

    #[test]
    fn test_month_date_rejects_month_13() {
        assert_eq!(
            validate_month_date("2024-13"),
            Err(ValidationError::MonthRange(13))
        );
        assert_eq!(
            validate_month_date("2024-00"),
            Err(ValidationError::MonthRange(0))
        );
    }

    #[test]
    fn test_month_date_year_bounds() {
        assert!(validate_month_date("1950-01").is_ok());
        assert!(validate_month_date("2050-12").is_ok());
        assert_eq!(
            validate_month_date("1949-12"),
            Err(ValidationError::YearRange(1949))
        );
        assert_eq!(
            validate_month_date("2051-01"),
            Err(ValidationError::YearRange(2051))
        );
    }

    #[test]
    fn test_month_date_rejects_other_shapes() {
        for bad in ["2024-1", "24-01", "2024/01", "2024-01-01", "Jan 2024", "２０２４-01"] {
            assert_eq!(
                validate_month_date(bad),
                Err(ValidationError::MonthFormat),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_month_error_message_names_format() {
        assert!(ValidationError::MonthFormat.to_string().contains("YYYY-MM"));
        assert_eq!(
            ValidationError::MonthRange(13).to_string(),
            "Month must be between 01 and 12. You entered: 13"
        );
    }

    #[test]
    fn test_subscription_date_leap_year() {
        assert!(validate_subscription_date("2024-02-29").is_ok());
        assert_eq!(
            validate_subscription_date("2023-02-29"),
            Err(ValidationError::NoSuchDate("2023-02-29".into()))
        );
    }

    #[test]
    fn test_subscription_date_rejects_missing_day() {
        assert_eq!(
            validate_subscription_date("2024-02-30"),
            Err(ValidationError::NoSuchDate("2024-02-30".into()))
        );
    }

    #[test]
    fn test_subscription_date_requires_exact_shape() {
        assert_eq!(
            validate_subscription_date("2024-2-3"),
            Err(ValidationError::DayFormat)
        );
        assert_eq!(
            validate_subscription_date("2024-12"),
            Err(ValidationError::DayFormat)
        );
    }

    #[test]
    fn test_validate_days() {
        assert_eq!(validate_days(" 30 "), Ok(30));
        assert_eq!(validate_days("-5"), Ok(-5));
        assert_eq!(validate_days("thirty"), Err(ValidationError::Days));
    }

    #[test]
    fn test_is_optional() {
        assert!(is_optional(RecordType::Roles, "end"));
        assert!(is_optional(RecordType::Certificates, "number"));
        assert!(!is_optional(RecordType::Roles, "title"));
        assert!(!is_optional(RecordType::Languages, "language"));
    }

    #[test]
    fn test_prompt_for_optional_date() {
        let prompt = prompt_for(RecordType::Roles, "start", false, "");
        assert_eq!(
            prompt,
            "📝 Enter *Start Date (YYYY-MM)*:\n_Format: YYYY-MM (e.g., 2024-01)_\n\n💡 _Send 'skip' or 'empty' to leave blank_"
        );
    }

    #[test]
    fn test_prompt_for_editing_shows_current() {
        let prompt = prompt_for(RecordType::Education, "school", true, "MIT");
        assert_eq!(prompt, "Current: *MIT*\n📝 Enter *School/University*:");
    }

    #[test]
    fn test_prompt_for_boolean_has_no_skip_hint() {
        let prompt = prompt_for(RecordType::Roles, "current", false, "");
        assert_eq!(prompt, "Select *Currently Working*:");
    }

    #[test]
    fn test_prompt_for_editing_select_keeps_blank_line() {
        let prompt = prompt_for(RecordType::Languages, "proficiency", true, "C1 Advanced");
        assert_eq!(prompt, "Current: *C1 Advanced*\n\nSelect *Proficiency Level*:");
    }

    #[test]
    fn test_prompt_for_editing_date_single_line_break() {
        let prompt = prompt_for(RecordType::Roles, "start", true, "2020-01");
        assert!(prompt.starts_with("Current: *2020-01*\n📝 Enter *"));
    }
}
