//! Walks the event wizard end to end against the in-memory backend.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin event-wizard-demo
//! RUST_LOG=event_wizard=debug cargo run --bin event-wizard-demo
//! ```
//!
//! Configuration is read from the environment (and `.env`), see
//! [`WizardConfig::from_env`].

use anyhow::Context;
use event_wizard::mocks::{InMemoryObjectStorage, InMemoryRecordStore, StaticSession};
use event_wizard::prelude::*;
use event_wizard::types::UserId;
use event_wizard_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type DemoStore = WizardStore<StaticSession, InMemoryObjectStorage, InMemoryRecordStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("event_wizard=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Event Wizard Demo ===");

    let config = WizardConfig::from_env();
    info!(?config, "Loaded configuration");
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let records = InMemoryRecordStore::new(Arc::clone(&clock));
    let music = records.add_category("Music", Some("Concerts and live sets"));
    records.add_category("Food & Drink", None);
    records.add_category("Workshops", Some("Hands-on classes"));

    let environment = WizardEnvironment::new(
        StaticSession::signed_in(UserId::new()),
        InMemoryObjectStorage::new(config.image_bucket.clone()),
        records,
        clock,
        config,
    );

    let mut notifications = environment.feedback.subscribe();
    tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            println!("[{:?}] {}", notification.level, notification.message);
        }
    });

    let store = new_store(environment);

    store.send(WizardAction::LoadCategories).await?.wait().await;
    let categories = store.state(|s| s.categories.len()).await;
    info!(categories, "Categories loaded");

    // Step 1: submit once with a missing field, then fix it.
    send_all(
        &store,
        [
            WizardAction::EditEvent(EventEdit::Name("Rooftop Jazz Night".into())),
            WizardAction::EditEvent(EventEdit::Category(music.id.to_string())),
            WizardAction::EditEvent(EventEdit::Date("2025-06-21".into())),
            WizardAction::EditEvent(EventEdit::Time("19:30".into())),
            WizardAction::EditEvent(EventEdit::Duration("3h".into())),
            WizardAction::EditEvent(EventEdit::Description("A quartet under the stars".into())),
        ],
    )
    .await?;

    store.send(WizardAction::SubmitEventStep).await?.wait().await;
    let errors = store
        .state(|s| {
            s.event_form
                .visible_errors()
                .iter()
                .map(|(field, message)| format!("{field:?}: {message}"))
                .collect::<Vec<_>>()
        })
        .await;
    info!(?errors, "Event form rejected");

    store
        .send(WizardAction::EditEvent(EventEdit::AddImages(vec![ImageUpload::new(
            "rooftop banner.png",
            "image/png",
            vec![0x89, 0x50, 0x4e, 0x47],
        )])))
        .await?;
    store.send(WizardAction::SubmitEventStep).await?.wait().await;
    expect_step(&store, WizardStep::Location).await?;

    // Step 2: prefill from a picked address, then fill what it left out.
    let address = StructuredAddress {
        street_number: Some("500".into()),
        route: Some("Congress Ave".into()),
        locality: Some("Austin".into()),
        administrative_area: Some("TX".into()),
        country: Some("US".into()),
        postal_code: Some("78701".into()),
        formatted: "500 Congress Ave, Austin, TX 78701, USA".into(),
        latitude: 30.268_4,
        longitude: -97.743_1,
    };
    send_all(
        &store,
        [
            WizardAction::EditLocation(LocationEdit::Prefill(address)),
            WizardAction::EditLocation(LocationEdit::Venue("The Rooftop".into())),
            WizardAction::EditLocation(LocationEdit::Capacity("250".into())),
        ],
    )
    .await?;
    store.send(WizardAction::SubmitLocationStep).await?.wait().await;
    expect_step(&store, WizardStep::Tickets).await?;

    // Step 3: two ticket types.
    send_all(
        &store,
        [
            WizardAction::EditTicket(TicketEdit::Name("General Admission".into())),
            WizardAction::EditTicket(TicketEdit::PerCustomerLimit("4".into())),
            WizardAction::EditTicket(TicketEdit::Description("Standing room".into())),
            WizardAction::EditTicket(TicketEdit::Price("25.00".into())),
        ],
    )
    .await?;
    store.send(WizardAction::SubmitTicket).await?.wait().await;

    send_all(
        &store,
        [
            WizardAction::EditTicket(TicketEdit::Name("VIP".into())),
            WizardAction::EditTicket(TicketEdit::UnlimitedTotal(false)),
            WizardAction::EditTicket(TicketEdit::Quantity("20".into())),
            WizardAction::EditTicket(TicketEdit::PerCustomerLimit("2".into())),
            WizardAction::EditTicket(TicketEdit::Description("Reserved table".into())),
            WizardAction::EditTicket(TicketEdit::Price("80".into())),
            WizardAction::EditTicket(TicketEdit::EarlyBird(true)),
            WizardAction::EditTicket(TicketEdit::Discount("15".into())),
        ],
    )
    .await?;
    store.send(WizardAction::SubmitTicket).await?.wait().await;

    store.send(WizardAction::Finish).await?.wait().await;
    expect_step(&store, WizardStep::Done).await?;

    let summary = store
        .state(WizardState::summary)
        .await
        .context("finished wizard has no summary")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    // Let the printer drain before shutting down.
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.shutdown(Duration::from_secs(5)).await?;

    info!("=== Demo complete ===");
    Ok(())
}

async fn send_all(store: &DemoStore, actions: impl IntoIterator<Item = WizardAction>) -> anyhow::Result<()> {
    for action in actions {
        store.send(action).await?.wait().await;
    }
    Ok(())
}

async fn expect_step(store: &DemoStore, expected: WizardStep) -> anyhow::Result<()> {
    let step = store.state(|s| s.step).await;
    anyhow::ensure!(step == expected, "expected step {expected:?}, wizard is on {step:?}");
    info!(step = step.label(), "Advanced");
    Ok(())
}
