//! Client-side booking form state.
//!
//! A [`BookingForm`] lives from the moment a visitor opens a booking form
//! until they navigate away or the submission succeeds. It holds the raw
//! field values, the latest per-field error messages and a
//! [`SubmissionState`]. Nothing here is persisted; submission goes through
//! [`QueryClient::mutate`] so a successful booking invalidates the cached
//! booking and technician data.

use std::collections::BTreeMap;
use std::future::Future;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{MutationKind, QueryClient};
use crate::error::FetchError;
use crate::validation::{
    DETAILED_QUOTE, Field, FieldError, FormValues, QUICK_BOOKING, Schema, ServiceArea,
    ServiceKind, UnknownOption, Urgency, format_phone, raw_digits, validate_field,
};

/// Where a form is in its submit cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Success,
    Error(String),
}

/// The three-field call-back request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickBooking {
    pub name: String,
    pub phone: String,
    pub service: ServiceKind,
}

/// The full quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedQuote {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    pub service: ServiceKind,
    pub area: ServiceArea,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A validated request, ready to send to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BookingIntent {
    QuickBooking(QuickBooking),
    DetailedQuote(DetailedQuote),
}

/// Why a submission did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("a submission is already in progress")]
    InProgress,

    #[error(transparent)]
    Failed(#[from] FetchError),
}

/// State for one open booking form.
#[derive(Debug, Clone)]
pub struct BookingForm {
    schema: Schema,
    values: FormValues,
    errors: BTreeMap<Field, String>,
    state: SubmissionState,
}

impl BookingForm {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            values: FormValues::new(),
            errors: BTreeMap::new(),
            state: SubmissionState::Idle,
        }
    }

    pub fn quick() -> Self {
        Self::new(QUICK_BOOKING)
    }

    pub fn detailed() -> Self {
        Self::new(DETAILED_QUOTE)
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Stores `value` and refreshes that field's error message.
    ///
    /// Phone input is reduced to its digits before storing, so pasting a
    /// formatted number still validates. Fields outside the form's schema
    /// are ignored.
    pub fn set_field(&mut self, field: Field, value: &str) {
        if !self.schema.contains(field) {
            debug!(field = %field, schema = self.schema.name, "ignoring field outside schema");
            return;
        }
        let value = match field {
            Field::Phone => raw_digits(value),
            _ => value.to_owned(),
        };

        let verdict = validate_field(field, &value);
        match verdict.error {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
        self.values.set(field, value);
    }

    /// The raw value used for validation and submission.
    pub fn value(&self, field: Field) -> &str {
        self.values.get(field)
    }

    /// The value as shown in the input; phone numbers are grouped.
    pub fn display_value(&self, field: Field) -> String {
        match field {
            Field::Phone => format_phone(self.values.get(field)),
            _ => self.values.get(field).to_owned(),
        }
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Empties the form and returns it to [`SubmissionState::Idle`].
    ///
    /// Needed when a submit future was dropped mid-flight and left the form
    /// in `Submitting`.
    pub fn reset(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.state = SubmissionState::Idle;
    }

    /// Runs the whole-schema check, records every error, and builds the
    /// intent if nothing failed.
    pub fn prepare(&mut self) -> Result<BookingIntent, Vec<FieldError>> {
        let result = self
            .schema
            .validate(&self.values)
            .and_then(|()| self.build_intent().map_err(|e| vec![e]));

        self.errors.clear();
        if let Err(errors) = &result {
            for error in errors {
                self.errors.insert(error.field, error.message.clone());
            }
        }
        result
    }

    fn build_intent(&self) -> Result<BookingIntent, FieldError> {
        let text = |field: Field| self.values.get(field).trim().to_owned();
        let optional = |field: Field| Some(text(field)).filter(|v| !v.is_empty());

        if self.schema == QUICK_BOOKING {
            return Ok(BookingIntent::QuickBooking(QuickBooking {
                name: text(Field::Name),
                phone: text(Field::Phone),
                service: parse_field(&self.values, Field::Service)?,
            }));
        }

        Ok(BookingIntent::DetailedQuote(DetailedQuote {
            name: text(Field::Name),
            phone: text(Field::Phone),
            email: optional(Field::Email),
            address: text(Field::Address),
            service: parse_field(&self.values, Field::Service)?,
            area: parse_field(&self.values, Field::Area)?,
            urgency: parse_field(&self.values, Field::Urgency)?,
            description: optional(Field::Description),
        }))
    }

    /// Validates, then sends the intent through `client` as a booking
    /// mutation. On success the form is emptied.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Invalid`] if any field fails; nothing is sent.
    /// - [`SubmitError::InProgress`] if a previous submit has not finished.
    /// - [`SubmitError::Failed`] once the mutation's retry is spent.
    pub async fn submit<R, F, Fut>(
        &mut self,
        client: &QueryClient,
        mut send: F,
    ) -> Result<R, SubmitError>
    where
        F: FnMut(BookingIntent) -> Fut,
        Fut: Future<Output = Result<R, FetchError>>,
    {
        if self.state == SubmissionState::Submitting {
            return Err(SubmitError::InProgress);
        }
        let intent = self.prepare().map_err(SubmitError::Invalid)?;

        self.state = SubmissionState::Submitting;
        let result = client
            .mutate(MutationKind::Booking, || send(intent.clone()))
            .await;

        match result {
            Ok(response) => {
                info!(schema = self.schema.name, "booking submitted");
                self.state = SubmissionState::Success;
                self.values.clear();
                self.errors.clear();
                Ok(response)
            }
            Err(e) => {
                self.state = SubmissionState::Error(e.to_string());
                Err(SubmitError::Failed(e))
            }
        }
    }
}

fn parse_field<T>(values: &FormValues, field: Field) -> Result<T, FieldError>
where
    T: FromStr<Err = UnknownOption>,
{
    values.get(field).parse().map_err(|e: UnknownOption| FieldError {
        field,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryClientConfig;
    use crate::keys::{bookings, technicians};

    fn filled_quick_form() -> BookingForm {
        let mut form = BookingForm::quick();
        form.set_field(Field::Name, "Ravi Kumar");
        form.set_field(Field::Phone, "987 654 3210");
        form.set_field(Field::Service, "ac-repair");
        form
    }

    #[test]
    fn live_errors_follow_the_latest_value() {
        let mut form = BookingForm::quick();
        form.set_field(Field::Phone, "12345");
        assert!(form.error(Field::Phone).is_some());
        form.set_field(Field::Phone, "9876543210");
        assert_eq!(form.error(Field::Phone), None);
    }

    #[test]
    fn phone_is_stored_raw_and_displayed_grouped() {
        let form = filled_quick_form();
        assert_eq!(form.value(Field::Phone), "9876543210");
        assert_eq!(form.display_value(Field::Phone), "987 654 3210");
    }

    #[test]
    fn fields_outside_schema_are_ignored() {
        let mut form = BookingForm::quick();
        form.set_field(Field::Address, "12 Boring Road, Patna");
        assert_eq!(form.value(Field::Address), "");
    }

    #[test]
    fn prepare_builds_quick_intent() {
        let mut form = filled_quick_form();
        let intent = form.prepare().unwrap();
        assert_eq!(
            intent,
            BookingIntent::QuickBooking(QuickBooking {
                name: "Ravi Kumar".into(),
                phone: "9876543210".into(),
                service: ServiceKind::Repair,
            })
        );
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "quickBooking");
        assert_eq!(json["service"], "ac-repair");
    }

    #[test]
    fn prepare_records_every_error() {
        let mut form = BookingForm::detailed();
        form.set_field(Field::Name, "Ravi Kumar");
        form.set_field(Field::Phone, "9876543210");
        let errors = form.prepare().unwrap_err();
        assert_eq!(errors.len(), 4);
        let fields: Vec<Field> = form.errors().keys().copied().collect();
        assert_eq!(
            fields,
            vec![Field::Address, Field::Service, Field::Area, Field::Urgency]
        );
    }

    #[test]
    fn detailed_intent_drops_empty_optionals() {
        let mut form = BookingForm::detailed();
        form.set_field(Field::Name, "Asha Patil");
        form.set_field(Field::Phone, "7012345678");
        form.set_field(Field::Email, "");
        form.set_field(Field::Address, "Flat 9, Kankarbagh Colony");
        form.set_field(Field::Service, "emergency-service");
        form.set_field(Field::Area, "kankarbagh");
        form.set_field(Field::Urgency, "today");

        let BookingIntent::DetailedQuote(quote) = form.prepare().unwrap() else {
            panic!("expected a detailed quote");
        };
        assert_eq!(quote.email, None);
        assert_eq!(quote.description, None);
        assert_eq!(quote.urgency, Urgency::Today);
        assert_eq!(quote.area, ServiceArea::Kankarbagh);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_submit_resets_form_and_invalidates_bookings() {
        let client = QueryClient::new(QueryClientConfig::default());
        client.set_query_data(bookings::stats(), 10u32);
        client.set_query_data(technicians::by_area("kankarbagh"), 3u32);

        let mut form = filled_quick_form();
        let reference = form
            .submit(&client, |intent| async move {
                assert!(matches!(intent, BookingIntent::QuickBooking(_)));
                Ok::<_, FetchError>("BK-1001".to_string())
            })
            .await
            .unwrap();

        assert_eq!(reference, "BK-1001");
        assert_eq!(form.state(), &SubmissionState::Success);
        assert_eq!(form.value(Field::Name), "");
        assert!(client.query_state(&bookings::stats()).unwrap().is_invalidated);
        assert!(client.query_state(&technicians::by_area("kankarbagh")).unwrap().is_invalidated);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_form_is_never_sent() {
        let client = QueryClient::new(QueryClientConfig::default());
        let mut form = BookingForm::quick();
        let mut sent = false;

        let err = form
            .submit(&client, |_| {
                sent = true;
                async { Ok::<_, FetchError>(()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(ref errors) if errors.len() == 3));
        assert!(!sent);
        assert_eq!(form.state(), &SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submit_keeps_values_and_reports_error() {
        let client = QueryClient::new(QueryClientConfig::default());
        let mut form = filled_quick_form();
        let mut attempts = 0;

        let err = form
            .submit(&client, |_| {
                attempts += 1;
                async { Err::<(), _>(FetchError::status(503, "maintenance")) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Failed(_)));
        assert_eq!(attempts, 2);
        assert!(matches!(form.state(), SubmissionState::Error(m) if m.contains("503")));
        assert_eq!(form.value(Field::Name), "Ravi Kumar");
    }
}
