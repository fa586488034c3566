//! officehub - attendance check-in client
//!
//! Command-line host for the OfficeHub check-in core. Owns the single
//! process-wide session store and drives the core on a current-thread runtime.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use officehub_common::auth::{FileSessionStorage, SessionStore};
use officehub_common::config::ObservabilityConfig;
use chrono::NaiveDate;
use officehub_common::models::{Role, SkillStatus};
use officehub_common::{metrics, AppConfig, HttpRemoteService, RemoteService};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

/// officehub - attendance check-in client
#[derive(Parser, Debug)]
#[command(name = "officehub")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/default, config/$APP_ENV, config/local)
    #[arg(short, long)]
    config: Option<String>,

    /// Record service base URL, overriding configuration
    #[arg(long, env = "OFFICEHUB_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // === Session ===
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (prefer the environment variable)
        #[arg(short, long, env = "OFFICEHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// List the routes visible to the current role
    Routes,

    // === Attendance ===
    /// Show attendance summary and history
    Attendance,

    /// Capture a photo and record a check-in at the current position
    CheckIn {
        /// Image to use as the camera frame
        #[arg(long)]
        image: Option<PathBuf>,

        /// Latitude override
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude override
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
    },

    /// Show profile and goal counters
    Profile,

    /// Upload reference face images used to verify check-ins
    Enroll {
        /// Face image file; repeat at least three times
        #[arg(long = "image", required = true, num_args = 1..)]
        images: Vec<PathBuf>,
    },

    // === Goals and growth ===
    /// Manage personal goals
    #[command(subcommand)]
    Goals(GoalCommands),

    /// Manage skills
    #[command(subcommand)]
    Skills(SkillCommands),

    /// Show the growth score and skill progress
    Growth,

    // === Administration ===
    /// Admin record management
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand, Debug)]
enum GoalCommands {
    /// List goals that have not ended
    List,

    /// Add a goal
    Add {
        #[arg(long)]
        name: String,

        /// Planned length in days
        #[arg(long, default_value_t = 7)]
        duration: u32,

        /// Last day of the goal, YYYY-MM-DD
        #[arg(long)]
        end_date: NaiveDate,
    },

    /// Mark a goal complete
    Complete { name: String },
}

#[derive(Subcommand, Debug)]
enum SkillCommands {
    /// List skills not yet completed
    List,

    /// Add a skill
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Set a skill's status
    SetStatus {
        name: String,

        /// pending or completed
        #[arg(long)]
        status: SkillStatus,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    /// Create a user in your organization
    AddUser {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "OFFICEHUB_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// admin or employee
        #[arg(long, default_value = "employee")]
        role: Role,

        #[arg(long)]
        position: String,

        #[arg(long)]
        age: u32,
    },

    /// Look up a user by name
    SearchUser { name: String },

    /// Show a user's goal counters
    UserGoals { name: String },

    /// Show a user's attendance counters
    UserAttendance { name: String },

    /// Remove a user by name
    RemoveUser { name: String },

    /// Remove every goal of a user
    RemoveGoals { name: String },

    /// Remove every attendance mark of a user
    RemoveAttendance { name: String },

    /// Remove a user's enrolled face images
    RemoveImages { name: String },

    /// Set the office location used to verify check-ins
    SetLocation {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Accepted distance from the office, in meters
        #[arg(long)]
        radius: f64,
    },

    /// Register a new organization and its first admin (no sign-in needed)
    RegisterCompany {
        #[arg(long)]
        company_name: String,

        /// Bare email domain, e.g. techcorp.com
        #[arg(long)]
        email_domain: String,

        #[arg(long)]
        admin_name: String,

        #[arg(long)]
        admin_email: String,

        #[arg(long, env = "OFFICEHUB_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,

        #[arg(long)]
        position: String,

        #[arg(long)]
        age: u32,
    },
}

/// Process-wide handles shared by every command
pub struct Host {
    pub config: AppConfig,
    pub session: Arc<SessionStore>,
    pub service: Arc<dyn RemoteService>,
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries command output.
    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(base_url) = cli.base_url.clone() {
        config.service.base_url = base_url;
    }

    init_tracing(&config.observability);
    metrics::register_metrics();
    debug!(version = officehub_common::VERSION, base_url = %config.service.base_url, "Starting officehub");

    let storage = FileSessionStorage::new(&config.storage.session_file);
    let session = Arc::new(SessionStore::open(Arc::new(storage)));
    let service: Arc<dyn RemoteService> = Arc::new(
        HttpRemoteService::new(&config.service, session.clone())
            .context("Failed to create record service client")?,
    );

    let host = Host {
        config,
        session,
        service,
    };

    let result = match cli.command {
        Commands::Login { email, password } => commands::login(&host, email, password).await,
        Commands::Logout => commands::logout(&host),
        Commands::Whoami => commands::whoami(&host),
        Commands::Routes => commands::routes(&host),
        Commands::Attendance => commands::attendance(&host).await,
        Commands::CheckIn { image, lat, lng } => {
            commands::check_in(&host, image, lat.zip(lng)).await
        }
        Commands::Profile => commands::profile(&host).await,
        Commands::Enroll { images } => commands::enroll(&host, &images).await,
        Commands::Goals(goals) => run_goals(&host, goals).await,
        Commands::Skills(skills) => run_skills(&host, skills).await,
        Commands::Growth => commands::growth(&host).await,
        Commands::Admin(admin) => run_admin(&host, admin).await,
    };

    info!(ok = result.is_ok(), "Command finished");
    result
}

async fn run_goals(host: &Host, command: GoalCommands) -> Result<()> {
    match command {
        GoalCommands::List => commands::goals(host).await,
        GoalCommands::Add {
            name,
            duration,
            end_date,
        } => {
            let goal = officehub_common::models::NewGoal {
                name,
                duration,
                end_date,
            };
            commands::add_goal(host, goal).await
        }
        GoalCommands::Complete { name } => commands::complete_goal(host, &name).await,
    }
}

async fn run_skills(host: &Host, command: SkillCommands) -> Result<()> {
    match command {
        SkillCommands::List => commands::skills(host).await,
        SkillCommands::Add { name, description } => {
            let skill = officehub_common::models::NewSkill { name, description };
            commands::add_skill(host, skill).await
        }
        SkillCommands::SetStatus { name, status } => {
            commands::set_skill_status(host, &name, status).await
        }
    }
}

async fn run_admin(host: &Host, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::AddUser {
            name,
            email,
            password,
            role,
            position,
            age,
        } => {
            let user = officehub_common::models::NewUser {
                name,
                email,
                password,
                role,
                position,
                age,
            };
            commands::admin_add_user(host, user).await
        }
        AdminCommands::SearchUser { name } => commands::admin_search_user(host, &name).await,
        AdminCommands::UserGoals { name } => commands::admin_user_goals(host, &name).await,
        AdminCommands::UserAttendance { name } => {
            commands::admin_user_attendance(host, &name).await
        }
        AdminCommands::RemoveUser { name } => commands::admin_remove_user(host, &name).await,
        AdminCommands::RemoveGoals { name } => commands::admin_remove_goals(host, &name).await,
        AdminCommands::RemoveAttendance { name } => {
            commands::admin_remove_attendance(host, &name).await
        }
        AdminCommands::RemoveImages { name } => commands::admin_remove_images(host, &name).await,
        AdminCommands::SetLocation { lat, lng, radius } => {
            commands::admin_set_location(host, lat, lng, radius).await
        }
        AdminCommands::RegisterCompany {
            company_name,
            email_domain,
            admin_name,
            admin_email,
            admin_password,
            position,
            age,
        } => {
            let request = officehub_common::models::RegisterCompanyRequest {
                company_name,
                email_domain,
                admin_name,
                admin_email,
                admin_password,
                position,
                age,
            };
            commands::admin_register_company(host, request).await
        }
    }
}
