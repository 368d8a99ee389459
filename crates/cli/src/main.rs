use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hms_api_client::{base_url_from_env_value, timeout_from_env_value, ApiClient, ApiConfig};
use hms_core::config::{
    current_user_from_env_value, role_from_env_value, seed_file_from_env_value,
};
use hms_core::models::{Patient, PatientFilters, PatientStats, PatientStatus};
use hms_core::relations::audit_references;
use hms_core::{role_config, CoreConfig, DashboardStats, HospitalStore, Role, SeedData};
use hms_ids::PatientId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hms")]
#[command(about = "Hospital dashboard operator console")]
struct Cli {
    /// Role to act as (defaults to HMS_DEFAULT_ROLE, then doctor)
    #[arg(long, global = true)]
    role: Option<String>,
    /// Seed YAML to load instead of the embedded data set
    #[arg(long, global = true)]
    seed_file: Option<PathBuf>,
    /// REST API base URL (defaults to HMS_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show role configuration
    Roles {
        /// Only this role
        role: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate seed data and report every broken reference
    SeedCheck,
    /// Dashboard stats computed from the seeded store
    Stats {
        /// Day to compute for (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List rooms from the seeded store
    Rooms {
        /// Only rooms that can take an admission
        #[arg(long)]
        available: bool,
    },
    /// Patient operations against the REST API
    Patients {
        #[command(subcommand)]
        command: PatientCommands,
    },
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List patients
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        /// Read from the seeded store, scoped to the current role
        #[arg(long)]
        offline: bool,
    },
    /// Show one patient
    Get {
        /// Patient identifier
        id: String,
    },
    /// Search patients by name or id
    Search {
        /// Search text
        query: String,
    },
    /// Per-status patient counts
    Stats,
}

fn core_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let role = role_from_env_value(
        cli.role
            .clone()
            .or_else(|| std::env::var("HMS_DEFAULT_ROLE").ok()),
    )?;
    let seed_file = cli
        .seed_file
        .clone()
        .or_else(|| seed_file_from_env_value(std::env::var("HMS_SEED_FILE").ok()));
    let user = current_user_from_env_value(std::env::var("HMS_CURRENT_USER").ok())?;
    Ok(CoreConfig::new(role, seed_file, user)?)
}

fn api_client(cli: &Cli) -> anyhow::Result<ApiClient> {
    let url = cli
        .api_url
        .clone()
        .unwrap_or_else(|| base_url_from_env_value(std::env::var("HMS_API_BASE_URL").ok()));
    let timeout = timeout_from_env_value(std::env::var("HMS_API_TIMEOUT_MS").ok())?;
    Ok(ApiClient::new(ApiConfig::new(&url, timeout)?)?)
}

fn print_patients(patients: &[&Patient]) {
    if patients.is_empty() {
        println!("No patients found.");
        return;
    }
    for patient in patients {
        println!(
            "ID: {}, Name: {}, Status: {}, Room: {}",
            patient.id,
            patient.name,
            patient.status,
            patient.room_number.as_ref().map_or("-", |r| r.as_str())
        );
    }
}

fn print_stats(stats: &PatientStats) {
    println!(
        "Total: {}, Admitted: {}, Critical: {}, Stable: {}, Outpatient: {}, Discharged: {}",
        stats.total, stats.admitted, stats.critical, stats.stable, stats.outpatient, stats.discharged
    );
}

fn show_roles(only: Option<String>, json: bool) -> anyhow::Result<()> {
    let roles = match only {
        Some(name) => vec![name.parse::<Role>()?],
        None => Role::ALL.to_vec(),
    };
    for role in roles {
        let config = role_config(role);
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
            continue;
        }
        println!("{} ({}) {}", config.label, role, config.color.primary);
        for item in config.navigation {
            println!("  {:<16} {}", item.label, item.path);
        }
        let granted: Vec<String> = config
            .permissions
            .flags()
            .into_iter()
            .filter(|(_, allowed)| *allowed)
            .map(|(permission, _)| permission.to_string())
            .collect();
        println!("  permissions: {}", granted.join(", "));
    }
    Ok(())
}

fn seed_check(config: &CoreConfig) -> anyhow::Result<()> {
    let seed = SeedData::load(config.seed_file())?;
    // Structural failures (duplicate ids, overfull rooms) stop construction before the
    // reference audit can run, so they are reported alone.
    let problems = match HospitalStore::with_seed(seed.clone(), config.default_role()) {
        Ok(store) => audit_references(&store),
        Err(err) => vec![err],
    };
    if problems.is_empty() {
        println!(
            "Seed OK: {} users, {} patients, {} rooms.",
            seed.users.len(),
            seed.patients.len(),
            seed.rooms.len()
        );
        return Ok(());
    }
    for problem in &problems {
        eprintln!("Error: {problem}");
    }
    anyhow::bail!("seed check found {} problem(s)", problems.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        None => {
            println!("hms: use --help to list commands");
        }
        Some(Commands::Roles { role, json }) => show_roles(role.clone(), *json)?,
        Some(Commands::SeedCheck) => seed_check(&core_config(&cli)?)?,
        Some(Commands::Stats { date }) => {
            let store = HospitalStore::from_config(&core_config(&cli)?)?;
            let today = match date {
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .with_context(|| format!("invalid date '{raw}'"))?,
                None => chrono::Local::now().date_naive(),
            };
            let stats = DashboardStats::compute(&store, today);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Some(Commands::Rooms { available }) => {
            let store = HospitalStore::from_config(&core_config(&cli)?)?;
            for room in store.rooms().iter().filter(|r| !available || r.accepts_admission()) {
                println!(
                    "{:<8} {:<10} {}/{} beds, {}",
                    room.room_number, room.kind, room.occupied, room.capacity, room.status
                );
            }
        }
        Some(Commands::Patients { command }) => match command {
            PatientCommands::List {
                status,
                search,
                offline,
            } => {
                let filters = PatientFilters {
                    status: status.as_deref().map(str::parse::<PatientStatus>).transpose()?,
                    search: search.clone(),
                    ..PatientFilters::default()
                };
                if *offline {
                    let store = HospitalStore::from_config(&core_config(&cli)?)?;
                    print_patients(&store.view().filter_patients(&filters));
                } else {
                    let patients = api_client(&cli)?.list_patients(Some(&filters)).await?;
                    print_patients(&patients.iter().collect::<Vec<_>>());
                }
            }
            PatientCommands::Get { id } => {
                let id = PatientId::parse(id)?;
                let patient = api_client(&cli)?.get_patient(&id).await?;
                println!("{}", serde_json::to_string_pretty(&patient)?);
            }
            PatientCommands::Search { query } => {
                let patients = api_client(&cli)?.search_patients(query).await?;
                print_patients(&patients.iter().collect::<Vec<_>>());
            }
            PatientCommands::Stats => {
                let stats = api_client(&cli)?.get_patient_stats().await?;
                print_stats(&stats);
            }
        },
    }

    Ok(())
}
