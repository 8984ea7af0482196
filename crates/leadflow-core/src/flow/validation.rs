//! Validators for free-text identity fields.

use once_cell::sync::Lazy;
use regex::Regex;

pub const NAME_ERROR: &str =
    "Please enter a valid name using letters and spaces only (at least 2 characters).";
pub const AGE_ERROR: &str = "Please enter a valid age between 16 and 65.";
pub const EMAIL_ERROR: &str = "Please enter a valid email address (for example name@example.com).";

pub const MIN_AGE: u32 = 16;
pub const MAX_AGE: u32 = 65;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\p{L}[\p{L} ]*$").expect("name pattern is a valid regex")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Letters and spaces only, at least two characters after trimming.
pub fn validate_name(input: &str) -> Result<String, &'static str> {
    let name = input.trim();
    if name.chars().count() >= 2 && NAME_PATTERN.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(NAME_ERROR)
    }
}

/// A whole number within `MIN_AGE..=MAX_AGE`, digits only.
pub fn validate_age(input: &str) -> Result<String, &'static str> {
    let digits = input.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AGE_ERROR);
    }
    match digits.parse::<u32>() {
        Ok(age) if (MIN_AGE..=MAX_AGE).contains(&age) => Ok(age.to_string()),
        _ => Err(AGE_ERROR),
    }
}

/// Simple `local@domain.tld` shape.
pub fn validate_email(input: &str) -> Result<String, &'static str> {
    let email = input.trim();
    if EMAIL_PATTERN.is_match(email) {
        Ok(email.to_string())
    } else {
        Err(EMAIL_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert_eq!(validate_name("  John Smith "), Ok("John Smith".to_string()));
        assert_eq!(validate_name("Zoë"), Ok("Zoë".to_string()));
        assert_eq!(validate_name("John 123"), Err(NAME_ERROR));
        assert_eq!(validate_name("J"), Err(NAME_ERROR));
        assert_eq!(validate_name("   "), Err(NAME_ERROR));
        assert_eq!(validate_name("Jean-Luc"), Err(NAME_ERROR));
    }

    #[test]
    fn test_age_bounds() {
        assert_eq!(validate_age("16"), Ok("16".to_string()));
        assert_eq!(validate_age(" 65 "), Ok("65".to_string()));
        assert_eq!(validate_age("15"), Err(AGE_ERROR));
        assert_eq!(validate_age("66"), Err(AGE_ERROR));
        assert_eq!(validate_age("25.5"), Err(AGE_ERROR));
        assert_eq!(validate_age("twenty"), Err(AGE_ERROR));
        assert_eq!(validate_age("-20"), Err(AGE_ERROR));
        assert_eq!(validate_age("+20"), Err(AGE_ERROR));
        assert_eq!(validate_age(""), Err(AGE_ERROR));
        assert_eq!(validate_age("020"), Ok("20".to_string()));
    }

    #[test]
    fn test_email() {
        assert!(validate_email("asha@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.co").is_ok());
        assert_eq!(validate_email("asha@example"), Err(EMAIL_ERROR));
        assert_eq!(validate_email("asha example.com"), Err(EMAIL_ERROR));
        assert_eq!(validate_email("@example.com"), Err(EMAIL_ERROR));
    }
}
