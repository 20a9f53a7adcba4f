use std::sync::Arc;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_cell::{DayOfWeek, ScheduleClient, SystemClock, WeekSlotOverview};
use shared_backend::BackendClient;
use shared_config::AppConfig;

/// Prints a doctor's materialized slots for the current week. Doubles as a
/// smoke check that the configured backend is reachable.
#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting medbook schedule console");

    let config = AppConfig::from_env();
    if !config.is_configured() {
        error!("Set MEDBOOK_API_BASE_URL and MEDBOOK_API_TOKEN before running");
        std::process::exit(1);
    }

    let doctor_id = match std::env::var("DOCTOR_ID") {
        Ok(id) if !id.trim().is_empty() => id,
        _ => {
            error!("Set DOCTOR_ID to the doctor whose week should be shown");
            std::process::exit(1);
        }
    };

    let backend = Arc::new(BackendClient::new(&config));
    let schedule = ScheduleClient::new(backend);
    let clock = SystemClock;

    let overview = WeekSlotOverview::load(&schedule, &doctor_id, &clock).await;

    if let Some(banner) = overview.error() {
        error!("{}", banner);
        std::process::exit(1);
    }

    println!(
        "Week {} - {} for doctor {}",
        overview.week_start(),
        overview.week_end(),
        doctor_id
    );

    for day in DayOfWeek::ALL {
        let slots = overview.slots_for(day);
        println!("{:<10} {} slot(s)", day.label(), slots.len());
        for slot in slots {
            println!(
                "    {} - {}  {}",
                slot.start_time.format("%H:%M"),
                slot.end_time.format("%H:%M"),
                slot.status_text()
            );
        }
    }

    let counts = overview.status_counts();
    if !counts.is_empty() {
        let summary: Vec<String> = counts
            .iter()
            .map(|(status, count)| format!("{} {}", count, status.label()))
            .collect();
        println!("Total: {} ({})", overview.total_slots(), summary.join(", "));
    }
}
