//! End-to-end checks through the public API only.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use aircare::form::{BookingForm, SubmissionState};
use aircare::http::ApiResponse;
use aircare::keys::{ListParams, bookings, customers, services, technicians, testimonials};
use aircare::validation::{DETAILED_QUOTE, Field, FormValues, format_phone};
use aircare::{EntryStatus, FetchError, MutationKind, QueryClient, QueryClientConfig, QueryKey};

fn catalog_page() -> Result<Vec<String>, FetchError> {
    let body = br#"{"data":["ac-repair","ac-cleaning"],"message":"","success":true}"#;
    ApiResponse::<Vec<String>>::from_slice(body)?.into_result()
}

#[tokio::test(start_paused = true)]
async fn catalog_is_fetched_once_then_served_until_stale() {
    let client = QueryClient::new(QueryClientConfig::default());
    let calls = Arc::new(AtomicU32::new(0));
    let params = ListParams {
        page: Some(1),
        limit: Some(20),
        ..Default::default()
    };

    for _ in 0..3 {
        let counter = Arc::clone(&calls);
        let page = client
            .fetch_query(services::list(&params), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { catalog_page() }
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(301)).await;
    assert_eq!(
        client.query_state(&services::list(&params)).unwrap().status,
        EntryStatus::Stale
    );
}

#[tokio::test(start_paused = true)]
async fn customer_mutation_invalidates_customers_and_bookings_only() {
    let client = QueryClient::new(QueryClientConfig::default());
    client.set_query_data(customers::detail("c-1"), 1u32);
    client.set_query_data(bookings::by_customer("c-1"), 2u32);
    client.set_query_data(technicians::detail("t-1"), 3u32);
    client.set_query_data(testimonials::featured(), 4u32);

    client
        .mutate(MutationKind::Customer, || async { Ok::<_, FetchError>(()) })
        .await
        .unwrap();

    let invalidated = |key: QueryKey| client.query_state(&key).unwrap().is_invalidated;
    assert!(invalidated(customers::detail("c-1")));
    assert!(invalidated(bookings::by_customer("c-1")));
    assert!(!invalidated(technicians::detail("t-1")));
    assert!(!invalidated(testimonials::featured()));
}

#[tokio::test(start_paused = true)]
async fn testimonial_mutation_touches_only_testimonials() {
    let client = QueryClient::new(QueryClientConfig::default());
    client.set_query_data(testimonials::by_service("ac-repair"), 1u32);
    client.set_query_data(bookings::stats(), 2u32);

    client
        .mutate(MutationKind::Testimonial, || async { Ok::<_, FetchError>(()) })
        .await
        .unwrap();

    assert!(client.query_state(&testimonials::by_service("ac-repair")).unwrap().is_invalidated);
    assert!(!client.query_state(&bookings::stats()).unwrap().is_invalidated);
}

#[tokio::test(start_paused = true)]
async fn detailed_quote_submission_round_trip() {
    let client = QueryClient::new(QueryClientConfig::default());
    let mut form = BookingForm::detailed();
    form.set_field(Field::Name, "Asha Patil");
    form.set_field(Field::Phone, "70123 45678");
    form.set_field(Field::Address, "Flat 9, Kankarbagh Colony");
    form.set_field(Field::Service, "ac-maintenance");
    form.set_field(Field::Area, "kankarbagh");
    form.set_field(Field::Urgency, "flexible");
    form.set_field(Field::Description, "Annual service for two split units");

    assert_eq!(form.display_value(Field::Phone), "701 234 5678");

    let body = form
        .submit(&client, |intent| async move {
            serde_json::to_value(&intent).map_err(FetchError::from)
        })
        .await
        .unwrap();

    assert_eq!(body["type"], "detailedQuote");
    assert_eq!(body["area"], "kankarbagh");
    assert_eq!(body["urgency"], "flexible");
    assert!(body.get("email").is_none());
    assert_eq!(form.state(), &SubmissionState::Success);
}

#[test]
fn detailed_quote_with_only_contact_details_lists_missing_fields() {
    let values = FormValues::new()
        .with(Field::Name, "Ravi Kumar")
        .with(Field::Phone, "9876543210");
    let failing: Vec<Field> = DETAILED_QUOTE
        .validate(&values)
        .unwrap_err()
        .into_iter()
        .map(|e| e.field)
        .collect();
    assert_eq!(
        failing,
        [Field::Address, Field::Service, Field::Area, Field::Urgency]
    );
}

#[test]
fn phone_formatting_examples() {
    assert_eq!(format_phone("9876543210"), "987 654 3210");
    assert_eq!(format_phone("987"), "987");
    assert_eq!(format_phone("987654"), "987 654");
}
