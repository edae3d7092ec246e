use super::tracker_service::TrackerError;
use crate::models::format_timestamp;
use chrono::{DateTime, NaiveDate, Utc};

const MAX_NAME_LEN: usize = 100;
const MAX_REG_NUMBER_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 254;
const MAX_TITLE_LEN: usize = 200;
/// Largest value the `credits` column can hold.
const MAX_CREDITS: u32 = i32::MAX.unsigned_abs();

pub fn validate_name(name: &str) -> Result<String, TrackerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation("Name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(TrackerError::validation(format!(
            "Name must be {MAX_NAME_LEN} characters or less"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_reg_number(reg_number: &str) -> Result<String, TrackerError> {
    let trimmed = reg_number.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation(
            "Registration number cannot be empty",
        ));
    }
    if trimmed.len() > MAX_REG_NUMBER_LEN {
        return Err(TrackerError::validation(format!(
            "Registration number must be {MAX_REG_NUMBER_LEN} characters or less"
        )));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(TrackerError::validation(
            "Registration number cannot contain whitespace or '/'",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_email(email: &str) -> Result<String, TrackerError> {
    let trimmed = email.trim();
    if trimmed.len() > MAX_EMAIL_LEN {
        return Err(TrackerError::validation("Email address is too long"));
    }

    let mut parts = trimmed.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None)
            if !local.is_empty() && !domain.is_empty() && !domain.starts_with('.')
    );
    if !valid {
        return Err(TrackerError::validation(format!(
            "Invalid email address: {trimmed}"
        )));
    }

    Ok(trimmed.to_string())
}

pub fn validate_title(title: &str) -> Result<String, TrackerError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation("Task title cannot be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(TrackerError::validation(format!(
            "Task title must be {MAX_TITLE_LEN} characters or less"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_credits(credits: u32) -> Result<u32, TrackerError> {
    if credits > MAX_CREDITS {
        return Err(TrackerError::validation(format!(
            "Credits must be {MAX_CREDITS} or less"
        )));
    }
    Ok(credits)
}

/// Blank descriptions are stored as absent.
#[must_use]
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn normalize_due_date(raw: &str) -> Result<String, TrackerError> {
    let trimmed = raw.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(format_timestamp(at.with_timezone(&Utc)));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(format_timestamp(midnight.and_utc()));
    }

    Err(TrackerError::validation(format!(
        "Invalid due date '{trimmed}'. Use YYYY-MM-DD or RFC 3339"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_requires_single_at_with_both_parts() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
        assert!(validate_email("plain").is_err());
    }

    #[test]
    fn reg_number_rejects_path_characters() {
        assert_eq!(validate_reg_number(" REG001 ").unwrap(), "REG001");
        assert!(validate_reg_number("REG 001").is_err());
        assert!(validate_reg_number("REG/001").is_err());
        assert!(validate_reg_number("").is_err());
    }

    #[test]
    fn due_date_accepts_plain_dates() {
        assert_eq!(
            normalize_due_date("2025-03-14").unwrap(),
            "2025-03-14T00:00:00.000000Z"
        );
        assert_eq!(
            normalize_due_date("2025-03-14T10:00:00+02:00").unwrap(),
            "2025-03-14T08:00:00.000000Z"
        );
        assert!(normalize_due_date("next week").is_err());
    }

    #[test]
    fn credits_must_fit_the_column() {
        assert_eq!(validate_credits(0).unwrap(), 0);
        assert_eq!(validate_credits(2_147_483_647).unwrap(), 2_147_483_647);
        assert!(matches!(
            validate_credits(u32::MAX),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn blank_description_becomes_none() {
        assert_eq!(normalize_description(Some("   ".to_string())), None);
        assert_eq!(
            normalize_description(Some(" notes ".to_string())),
            Some("notes".to_string())
        );
    }
}
