use hms_api_client::{
    base_url_from_env_value, refresh_patients, timeout_from_env_value, ApiClient, ApiConfig,
};
use hms_core::config::{
    current_user_from_env_value, role_from_env_value, seed_file_from_env_value,
};
use hms_core::{CoreConfig, DashboardStats, HospitalStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the hospital dashboard runtime
///
/// Resolves configuration, seeds the store, pulls the current patient list from the REST
/// backend and logs a summary of the dashboard the configured role would see. A backend that
/// cannot be reached is not fatal; the store keeps its seeded patients.
///
/// # Environment Variables
/// - `HMS_DEFAULT_ROLE`: role to start in (default: "doctor")
/// - `HMS_CURRENT_USER`: user to sign in as (default: first seeded user with that role)
/// - `HMS_SEED_FILE`: seed YAML to load instead of the embedded data set
/// - `HMS_API_BASE_URL`: REST API root (default: "http://localhost:5000/api")
/// - `HMS_API_TIMEOUT_MS`: per-request timeout (default: 10000)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hms=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let core_config = CoreConfig::new(
        role_from_env_value(std::env::var("HMS_DEFAULT_ROLE").ok())?,
        seed_file_from_env_value(std::env::var("HMS_SEED_FILE").ok()),
        current_user_from_env_value(std::env::var("HMS_CURRENT_USER").ok())?,
    )?;
    let api_config = ApiConfig::new(
        &base_url_from_env_value(std::env::var("HMS_API_BASE_URL").ok()),
        timeout_from_env_value(std::env::var("HMS_API_TIMEOUT_MS").ok())?,
    )?;

    let mut store = HospitalStore::from_config(&core_config)?;
    store.subscribe(|event| tracing::debug!(?event, "store event"));
    tracing::info!(
        role = %store.current_role(),
        user = store.current_user().map(|u| u.name.as_str()).unwrap_or("-"),
        "++ Store ready"
    );

    let client = ApiClient::new(api_config)?;
    tracing::info!("++ Syncing patients from {}", client.config().base_url());
    if let Err(err) = refresh_patients(&client, &mut store).await {
        tracing::warn!(error = %err, "patient sync failed, continuing with seeded data");
    }

    let config = store.role_config();
    tracing::info!(label = config.label, theme = config.color.primary, "role dashboard");
    for item in store.navigation() {
        match item.badge {
            Some(count) => tracing::info!("  {} ({})", item.label, count),
            None => tracing::info!("  {}", item.label),
        }
    }

    let view = store.view();
    let stats = DashboardStats::compute(&store, chrono::Local::now().date_naive());
    tracing::info!(
        visible_patients = view.patients().len(),
        active = stats.active_patients,
        critical = stats.critical_patients,
        available_beds = stats.available_beds,
        occupancy = stats.occupancy_rate,
        unread = store.unread_notifications(),
        "dashboard summary"
    );

    Ok(())
}
