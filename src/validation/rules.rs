//! Per-field rules. Each is pure: same input, same verdict.
//!
//! A rule returns `Err(message)` for the first check that fails, in the order
//! the checks are listed on the rule.

use std::sync::LazyLock;

use regex::Regex;

use super::catalog::{ServiceArea, ServiceKind, Urgency};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const ADDRESS_MIN: usize = 10;
pub const ADDRESS_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 500;

static NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").expect("name pattern is valid"));

// Indian mobile numbers: ten digits, leading 6-9.
static INDIAN_MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("phone pattern is valid"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

pub type RuleResult = Result<(), String>;

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Trimmed length 2–50, then letters and spaces only.
pub fn name(value: &str) -> RuleResult {
    let value = value.trim();
    let len = char_len(value);
    if len < NAME_MIN {
        return Err(format!("Name must be at least {NAME_MIN} characters"));
    }
    if len > NAME_MAX {
        return Err(format!("Name must be at most {NAME_MAX} characters"));
    }
    if !NAME_CHARS.is_match(value) {
        return Err("Name can only contain letters and spaces".to_owned());
    }
    Ok(())
}

/// Exactly ten digits, the first in 6–9.
pub fn phone(value: &str) -> RuleResult {
    if INDIAN_MOBILE.is_match(value) {
        Ok(())
    } else {
        Err("Please enter a valid 10-digit mobile number".to_owned())
    }
}

/// Optional. Empty means absent and passes.
pub fn email(value: &str) -> RuleResult {
    if value.is_empty() || EMAIL.is_match(value) {
        Ok(())
    } else {
        Err("Please enter a valid email address".to_owned())
    }
}

/// Length 10–200.
pub fn address(value: &str) -> RuleResult {
    let len = char_len(value);
    if len < ADDRESS_MIN {
        return Err(format!("Address must be at least {ADDRESS_MIN} characters"));
    }
    if len > ADDRESS_MAX {
        return Err(format!("Address must be at most {ADDRESS_MAX} characters"));
    }
    Ok(())
}

/// Non-empty, then one of the offered services.
pub fn service(value: &str) -> RuleResult {
    if value.is_empty() {
        return Err("Please select a service".to_owned());
    }
    value
        .parse::<ServiceKind>()
        .map(drop)
        .map_err(|_| "Please select a valid service".to_owned())
}

/// Non-empty, then one of the covered areas.
pub fn area(value: &str) -> RuleResult {
    if value.is_empty() {
        return Err("Please select your area".to_owned());
    }
    value
        .parse::<ServiceArea>()
        .map(drop)
        .map_err(|_| "Please select a valid area".to_owned())
}

/// One of `today`, `tomorrow`, `this-week`, `flexible`.
pub fn urgency(value: &str) -> RuleResult {
    value
        .parse::<Urgency>()
        .map(drop)
        .map_err(|_| "Please select when you need the service".to_owned())
}

/// Optional, at most 500 characters.
pub fn description(value: &str) -> RuleResult {
    if char_len(value) > DESCRIPTION_MAX {
        return Err(format!(
            "Description must be at most {DESCRIPTION_MAX} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(name("Ravi Kumar").is_ok());
        assert!(name("Al").is_ok());
        assert_eq!(name("R").unwrap_err(), "Name must be at least 2 characters");
        assert!(name(&"a".repeat(50)).is_ok());
        assert!(name(&"a".repeat(51)).is_err());
        assert_eq!(
            name("R2-D2").unwrap_err(),
            "Name can only contain letters and spaces"
        );
    }

    #[test]
    fn name_length_ignores_surrounding_whitespace() {
        assert_eq!(name("  ").unwrap_err(), "Name must be at least 2 characters");
        assert!(name(" R ").is_err());
        assert!(name("  Ravi Kumar  ").is_ok());
        assert!(name(&format!(" {} ", "a".repeat(50))).is_ok());
    }

    #[test]
    fn phone_accepts_every_valid_leading_digit() {
        for lead in '6'..='9' {
            let number = format!("{lead}876543210");
            assert!(phone(&number).is_ok(), "{number} should be valid");
        }
    }

    #[test]
    fn phone_rejects_low_leading_digits_and_wrong_lengths() {
        for lead in '0'..='5' {
            let number = format!("{lead}876543210");
            assert!(phone(&number).is_err(), "{number} should be invalid");
        }
        assert!(phone("987654321").is_err());
        assert!(phone("98765432101").is_err());
        assert!(phone("987 654 3210").is_err());
        assert!(phone("").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(email("").is_ok());
        assert!(email("priya@example.in").is_ok());
        assert!(email("first.last+ac@mail.example.com").is_ok());
        assert!(email("priya.example.in").is_err());
        assert!(email("priya@example").is_err());
        assert!(email("priya@").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("pri ya@example.com").is_err());
    }

    #[test]
    fn address_bounds() {
        assert!(address("Flat 4, MG Road").is_ok());
        assert!(address("Short").is_err());
        assert!(address(&"x".repeat(200)).is_ok());
        assert!(address(&"x".repeat(201)).is_err());
    }

    #[test]
    fn selections() {
        assert_eq!(service("").unwrap_err(), "Please select a service");
        assert_eq!(service("duct-cleaning").unwrap_err(), "Please select a valid service");
        assert!(service("ac-repair").is_ok());
        assert_eq!(area("").unwrap_err(), "Please select your area");
        assert!(area("boring-road").is_ok());
        assert!(urgency("this-week").is_ok());
        assert!(urgency("").is_err());
        assert!(urgency("asap").is_err());
    }

    #[test]
    fn description_is_optional_and_bounded() {
        assert!(description("").is_ok());
        assert!(description(&"d".repeat(500)).is_ok());
        assert!(description(&"d".repeat(501)).is_err());
    }

    #[test]
    fn rules_are_deterministic() {
        for input in ["", "9876543210", "Ravi", "not-an-email"] {
            assert_eq!(phone(input), phone(input));
            assert_eq!(name(input), name(input));
            assert_eq!(email(input), email(input));
        }
    }
}
