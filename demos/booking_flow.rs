//! Walks through a catalog fetch, a quick booking, and the resulting
//! invalidation against a simulated backend.
//!
//! Run with `RUST_LOG=aircare=debug cargo run --example booking_flow`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use aircare::form::BookingForm;
use aircare::http::ApiResponse;
use aircare::keys::{ListParams, bookings, services};
use aircare::validation::{Field, ServiceKind};
use aircare::{FetchError, QueryClient, QueryClientConfig};
use tracing_subscriber::EnvFilter;

fn catalog_body() -> &'static [u8] {
    br#"{"data":["ac-repair","ac-cleaning","gas-refilling"],"message":"","success":true,
        "meta":{"page":1,"limit":20,"total":3,"totalPages":1}}"#
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = QueryClient::new(QueryClientConfig::from_env()?);

    let params = ListParams {
        page: Some(1),
        limit: Some(20),
        ..Default::default()
    };
    let requests = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&requests);
    let catalog = client
        .fetch_query(services::list(&params), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { ApiResponse::<Vec<String>>::from_slice(catalog_body())?.into_result() }
        })
        .await?;
    println!("catalog: {catalog:?} ({} request)", requests.load(Ordering::SeqCst));

    client.set_query_data(bookings::stats(), 128u32);

    let mut form = BookingForm::quick();
    form.set_field(Field::Name, "Ravi Kumar");
    form.set_field(Field::Phone, "98765 43210");
    form.set_field(Field::Service, ServiceKind::GasRefilling.as_str());
    println!("phone shown as {}", form.display_value(Field::Phone));

    let reference = form
        .submit(&client, |intent| async move {
            let body = serde_json::to_string(&intent).map_err(FetchError::from)?;
            println!("POST /api/bookings {body}");
            Ok::<_, FetchError>("BK-1001".to_string())
        })
        .await?;
    println!("booking reference: {reference}");

    let stats = client.query_state(&bookings::stats());
    println!(
        "bookings/stats invalidated: {}",
        stats.is_some_and(|s| s.is_invalidated)
    );
    Ok(())
}
