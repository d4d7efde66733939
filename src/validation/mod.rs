//! Booking-intent validation.
//!
//! Two entry points serve the booking forms:
//!
//! - [`validate_field`] for live, as-you-type feedback on a single field.
//! - [`Schema::validate`] as the pre-submit gate, reporting every failing
//!   field at once.
//!
//! Neither panics nor uses `Err` to signal a bad value in the live path; the
//! verdict is always data the form can render inline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub mod catalog;
pub mod phone;
pub mod rules;

pub use catalog::{ServiceArea, ServiceKind, UnknownOption, Urgency};
pub use phone::{format_phone, raw_digits};

/// A booking form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Phone,
    Email,
    Address,
    Service,
    Area,
    Urgency,
    Description,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Self::Name,
        Self::Phone,
        Self::Email,
        Self::Address,
        Self::Service,
        Self::Area,
        Self::Urgency,
        Self::Description,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Address => "address",
            Self::Service => "service",
            Self::Area => "area",
            Self::Urgency => "urgency",
            Self::Description => "description",
        }
    }

    /// Optional fields accept an empty value.
    pub fn is_optional(self) -> bool {
        matches!(self, Self::Email | Self::Description)
    }

    fn check(self, value: &str) -> rules::RuleResult {
        match self {
            Self::Name => rules::name(value),
            Self::Phone => rules::phone(value),
            Self::Email => rules::email(value),
            Self::Address => rules::address(value),
            Self::Service => rules::service(value),
            Self::Area => rules::area(value),
            Self::Urgency => rules::urgency(value),
            Self::Description => rules::description(value),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOption {
                kind: "field",
                value: s.to_owned(),
            })
    }
}

/// Verdict for one field, shaped for inline rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl FieldValidation {
    fn from_rule(result: rules::RuleResult) -> Self {
        match result {
            Ok(()) => Self {
                is_valid: true,
                error: None,
            },
            Err(message) => Self {
                is_valid: false,
                error: Some(message),
            },
        }
    }
}

/// One failing field from a whole-schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validates a single candidate value.
///
/// # Examples
///
/// ```
/// use aircare::validation::{validate_field, Field};
///
/// let verdict = validate_field(Field::Phone, "5876543210");
/// assert!(!verdict.is_valid);
/// assert!(verdict.error.is_some());
/// ```
pub fn validate_field(field: Field, value: &str) -> FieldValidation {
    FieldValidation::from_rule(field.check(value))
}

/// Like [`validate_field`], for callers holding the field name as a string.
///
/// An unknown name yields an invalid verdict rather than an error.
pub fn validate_field_by_name(name: &str, value: &str) -> FieldValidation {
    match name.parse::<Field>() {
        Ok(field) => validate_field(field, value),
        Err(e) => FieldValidation::from_rule(Err(e.to_string())),
    }
}

/// Raw form input keyed by field. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<Field, String>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// A named set of fields validated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

/// Name, phone and service: the three-field call-back request.
pub const QUICK_BOOKING: Schema = Schema {
    name: "quickBooking",
    fields: &[Field::Name, Field::Phone, Field::Service],
};

/// Every field: the full quote request.
pub const DETAILED_QUOTE: Schema = Schema {
    name: "detailedQuote",
    fields: &Field::ALL,
};

impl Schema {
    /// Checks every field and collects all failures, in schema order.
    pub fn validate(&self, values: &FormValues) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .fields
            .iter()
            .filter_map(|&field| {
                field.check(values.get(field)).err().map(|message| FieldError {
                    field,
                    message,
                })
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_fields(result: Result<(), Vec<FieldError>>) -> Vec<Field> {
        result
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn detailed_quote_with_name_and_phone_only() {
        let values = FormValues::new()
            .with(Field::Name, "Ravi Kumar")
            .with(Field::Phone, "9876543210");
        assert_eq!(
            failing_fields(DETAILED_QUOTE.validate(&values)),
            vec![Field::Address, Field::Service, Field::Area, Field::Urgency]
        );
    }

    #[test]
    fn quick_booking_passes_with_three_fields() {
        let values = FormValues::new()
            .with(Field::Name, "Ravi Kumar")
            .with(Field::Phone, "9876543210")
            .with(Field::Service, "gas-refilling");
        assert_eq!(QUICK_BOOKING.validate(&values), Ok(()));
        assert!(DETAILED_QUOTE.validate(&values).is_err());
    }

    #[test]
    fn quick_booking_reports_every_failure() {
        let errors = QUICK_BOOKING.validate(&FormValues::new()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].to_string(), "name: Name must be at least 2 characters");
    }

    #[test]
    fn complete_detailed_quote_passes() {
        let values = FormValues::new()
            .with(Field::Name, "Ravi Kumar")
            .with(Field::Phone, "9876543210")
            .with(Field::Email, "ravi@example.in")
            .with(Field::Address, "12 Boring Road, Patna")
            .with(Field::Service, "ac-cleaning")
            .with(Field::Area, "boring-road")
            .with(Field::Urgency, "tomorrow")
            .with(Field::Description, "Split AC dripping water");
        assert_eq!(DETAILED_QUOTE.validate(&values), Ok(()));
    }

    #[test]
    fn single_field_entry_point() {
        assert_eq!(
            validate_field(Field::Email, ""),
            FieldValidation {
                is_valid: true,
                error: None
            }
        );
        let verdict = validate_field(Field::Email, "ravi");
        assert!(!verdict.is_valid);
        assert_eq!(verdict.error.as_deref(), Some("Please enter a valid email address"));
    }

    #[test]
    fn lookup_by_name() {
        assert!(validate_field_by_name("phone", "9876543210").is_valid);
        assert!(validate_field_by_name("Phone", "9876543210").is_valid);
        let verdict = validate_field_by_name("pincode", "411038");
        assert!(!verdict.is_valid);
        assert!(verdict.error.unwrap().contains("pincode"));
    }

    #[test]
    fn verdict_serializes_camel_case() {
        let json = serde_json::to_value(validate_field(Field::Name, "R")).unwrap();
        assert_eq!(json["isValid"], false);
        assert!(json["error"].is_string());
    }
}
