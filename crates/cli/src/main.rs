mod config;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use schemars::schema_for;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use helpdesk_core::analytics;
use helpdesk_core::clock::{self, Clock, SystemClock};
use helpdesk_core::knowledge::{self, KnowledgeRepository};
use helpdesk_core::schema::{Category, Priority, Status, Ticket, TicketFilters};
use helpdesk_core::session::{FixedCredentials, SessionManager};
use helpdesk_core::store::{KeyValueStore, SqliteStore};
use helpdesk_core::tickets::{TicketRepository, apply_filters};
use report::export::{self, ExportPaths};

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(about = "Support ticket tracker CLI", long_about = None)]
struct Cli {
    /// Path to a helpdesk.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new support ticket
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long, default_value = "general-support")]
        category: Category,
        /// Contact address for follow-up
        #[arg(long)]
        email: String,
    },
    /// Browse and inspect tickets
    Tickets {
        #[command(subcommand)]
        command: TicketCommands,
    },
    /// Knowledge base articles
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommands,
    },
    /// Admin session and dashboard operations
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Export canonical JSON Schemas
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum TicketCommands {
    /// List tickets, newest first
    List {
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<Category>,
        /// Case-insensitive search over title and description
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a single ticket in full
    Show { id: String },
}

#[derive(Subcommand)]
enum KnowledgeCommands {
    /// List knowledge base articles
    List,
    /// Seed default articles when none are stored yet
    Seed {
        /// YAML file with a top-level `articles` list to seed from
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Open an admin session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Close the admin session
    Logout,
    /// Show the current session
    Status,
    /// Push the session expiry another 24 hours out
    Extend,
    /// Print the computed dashboard analytics as JSON
    Analytics,
    /// Set the status of one or more tickets
    SetStatus {
        #[arg(long)]
        status: Status,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete one or more tickets
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Export the full ticket collection to a file
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Output directory (default: the configured export dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Write a markdown summary report
    Report {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Submit {
            title,
            description,
            priority,
            category,
            email,
        } => submit(&config, title, description, priority, category, email),
        Commands::Tickets { command } => match command {
            TicketCommands::List {
                status,
                priority,
                category,
                search,
            } => list_tickets(&config, status, priority, category, search),
            TicketCommands::Show { id } => show_ticket(&config, &id),
        },
        Commands::Knowledge { command } => match command {
            KnowledgeCommands::List => list_articles(&config),
            KnowledgeCommands::Seed { file } => seed_articles(&config, file),
        },
        Commands::Admin { command } => match command {
            AdminCommands::Login { email, password } => admin_login(&config, &email, &password),
            AdminCommands::Logout => admin_logout(&config),
            AdminCommands::Status => admin_status(&config),
            AdminCommands::Extend => admin_extend(&config),
            AdminCommands::Analytics => admin_analytics(&config),
            AdminCommands::SetStatus { status, ids } => admin_set_status(&config, status, &ids),
            AdminCommands::Delete { ids } => admin_delete(&config, &ids),
            AdminCommands::Export { format, out_dir } => admin_export(&config, format, out_dir),
            AdminCommands::Report { out_dir } => admin_report(&config, out_dir),
        },
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
    }
}

/// One store, one clock, constructed at startup and handed to whatever
/// needs them.
struct App {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl App {
    fn open(config: &config::CliConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&config.db_path)?);
        Ok(Self {
            store,
            clock: Arc::new(SystemClock),
        })
    }

    fn tickets(&self) -> TicketRepository {
        TicketRepository::new(self.store.clone(), self.clock.clone())
    }

    fn knowledge(&self) -> KnowledgeRepository {
        KnowledgeRepository::new(self.store.clone())
    }

    fn sessions(&self) -> SessionManager {
        SessionManager::new(
            self.store.clone(),
            self.clock.clone(),
            Box::new(FixedCredentials::default()),
        )
    }
}

fn require_admin(sessions: &SessionManager) -> Result<()> {
    if sessions.is_authenticated() {
        Ok(())
    } else {
        bail!("Not authenticated. Run `helpdesk admin login` first.");
    }
}

fn submit(
    config: &config::CliConfig,
    title: String,
    description: String,
    priority: Priority,
    category: Category,
    email: String,
) -> Result<()> {
    validate_title(&title)?;
    validate_description(&description)?;
    validate_email(&email)?;

    let app = App::open(config)?;
    let repository = app.tickets();
    let ticket = Ticket {
        id: repository.generate_id(),
        title,
        description,
        priority,
        category,
        status: Status::Open,
        email: Some(email),
        created_date: clock::to_rfc3339(app.clock.now()),
        updated_date: None,
    };

    if !repository.save(ticket.clone()) {
        bail!("Ticket could not be persisted");
    }
    println!("Created ticket {}", ticket.id);
    Ok(())
}

fn list_tickets(
    config: &config::CliConfig,
    status: Option<Status>,
    priority: Option<Priority>,
    category: Option<Category>,
    search: Option<String>,
) -> Result<()> {
    let app = App::open(config)?;
    let filters = TicketFilters {
        status,
        priority,
        category,
        search_term: search,
    };

    let mut tickets = apply_filters(&app.tickets().list(), &filters);
    // Display order only; the stored collection stays in insertion order.
    tickets.sort_by(|a, b| b.created_date.cmp(&a.created_date));

    if tickets.is_empty() {
        println!("No tickets found.");
        return Ok(());
    }
    for ticket in &tickets {
        println!(
            "{}  [{}] [{}] [{}]  {}",
            ticket.id, ticket.status, ticket.priority, ticket.category, ticket.title
        );
    }
    println!("{} ticket(s)", tickets.len());
    Ok(())
}

fn show_ticket(config: &config::CliConfig, id: &str) -> Result<()> {
    let app = App::open(config)?;
    let Some(ticket) = app.tickets().get_by_id(id) else {
        bail!("No ticket with id {id}");
    };

    println!("{}  {}", ticket.id, ticket.title);
    println!("Status:   {}", ticket.status);
    println!("Priority: {}", ticket.priority);
    println!("Category: {}", ticket.category);
    println!("Created:  {}", ticket.created_date);
    if let Some(updated) = &ticket.updated_date {
        println!("Updated:  {updated}");
    }
    // Contact addresses are shown to the admin only.
    if app.sessions().is_authenticated() {
        if let Some(email) = &ticket.email {
            println!("Email:    {email}");
        }
    }
    println!();
    println!("{}", ticket.description);
    Ok(())
}

fn list_articles(config: &config::CliConfig) -> Result<()> {
    let app = App::open(config)?;
    for article in app.knowledge().list() {
        println!("{}  [{}] {}", article.id, article.category, article.title);
        println!("    tags: {}", article.tags.join(", "));
    }
    Ok(())
}

fn seed_articles(config: &config::CliConfig, file: Option<PathBuf>) -> Result<()> {
    let app = App::open(config)?;
    let repository = app.knowledge();

    let seeded = match file {
        Some(path) => {
            let articles = knowledge::articles_from_yaml(&path)?;
            repository.ensure_seeded_with(&articles)
        }
        None => repository.ensure_seeded(),
    };
    if !seeded {
        bail!("Knowledge base could not be seeded");
    }
    println!("Knowledge base ready ({} articles)", repository.list().len());
    Ok(())
}

fn admin_login(config: &config::CliConfig, email: &str, password: &str) -> Result<()> {
    let app = App::open(config)?;
    if !app.sessions().authenticate(email, password) {
        bail!("Invalid credentials");
    }
    println!("Logged in as {email}");
    Ok(())
}

fn admin_logout(config: &config::CliConfig) -> Result<()> {
    let app = App::open(config)?;
    app.sessions().logout();
    println!("Logged out");
    Ok(())
}

fn admin_status(config: &config::CliConfig) -> Result<()> {
    let app = App::open(config)?;
    match app.sessions().session() {
        Some(session) => {
            let email = session
                .user
                .map(|user| user.email)
                .unwrap_or_else(|| "unknown".to_string());
            println!("Authenticated as {email} until {}", session.expires_at);
        }
        None => println!("Not authenticated"),
    }
    Ok(())
}

fn admin_extend(config: &config::CliConfig) -> Result<()> {
    let app = App::open(config)?;
    if !app.sessions().extend() {
        bail!("No valid session to extend");
    }
    println!("Session extended");
    Ok(())
}

fn admin_analytics(config: &config::CliConfig) -> Result<()> {
    let app = App::open(config)?;
    require_admin(&app.sessions())?;

    let summary = analytics::compute_analytics(&app.tickets().list(), app.clock.now());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn admin_set_status(config: &config::CliConfig, status: Status, ids: &[String]) -> Result<()> {
    let app = App::open(config)?;
    require_admin(&app.sessions())?;
    let repository = app.tickets();

    // Repeated single-item saves; a failure partway leaves earlier
    // updates in place.
    let mut updated = 0usize;
    let mut failed: Vec<&str> = Vec::new();
    for id in ids {
        match repository.get_by_id(id) {
            Some(mut ticket) => {
                ticket.status = status;
                if repository.save(ticket) {
                    updated += 1;
                } else {
                    failed.push(id);
                }
            }
            None => failed.push(id),
        }
    }

    println!("Updated {updated} of {} ticket(s)", ids.len());
    if !failed.is_empty() {
        bail!("Failed for: {}", failed.join(", "));
    }
    Ok(())
}

fn admin_delete(config: &config::CliConfig, ids: &[String]) -> Result<()> {
    let app = App::open(config)?;
    require_admin(&app.sessions())?;
    let repository = app.tickets();

    let mut deleted = 0usize;
    let mut failed: Vec<&str> = Vec::new();
    for id in ids {
        if repository.delete(id) {
            deleted += 1;
        } else {
            failed.push(id);
        }
    }

    println!("Deleted {deleted} of {} ticket(s)", ids.len());
    if !failed.is_empty() {
        bail!("Failed for: {}", failed.join(", "));
    }
    Ok(())
}

fn admin_export(
    config: &config::CliConfig,
    format: ExportFormat,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let app = App::open(config)?;
    require_admin(&app.sessions())?;

    let tickets = app.tickets().list();
    let day = clock::utc_day_prefix(app.clock.now());
    let paths = ExportPaths::new(out_dir.unwrap_or_else(|| config.export_dir.clone()));
    let path = match format {
        ExportFormat::Json => export::write_json(&paths, &tickets, &day)?,
        ExportFormat::Csv => export::write_csv(&paths, &tickets, &day)?,
    };
    println!("Exported {} ticket(s) to {}", tickets.len(), path.display());
    Ok(())
}

fn admin_report(config: &config::CliConfig, out_dir: Option<PathBuf>) -> Result<()> {
    let app = App::open(config)?;
    require_admin(&app.sessions())?;

    let summary = analytics::compute_analytics(&app.tickets().list(), app.clock.now());
    let day = clock::utc_day_prefix(app.clock.now());
    let paths = ExportPaths::new(out_dir.unwrap_or_else(|| config.export_dir.clone()));
    let path = export::write_summary(&paths, &summary, &day)?;
    println!("Wrote summary to {}", path.display());
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let ticket_schema = schema_for!(helpdesk_core::schema::Ticket);
    fs::write(
        out_dir.join("Ticket.schema.json"),
        serde_json::to_string_pretty(&ticket_schema)?,
    )?;

    let article_schema = schema_for!(helpdesk_core::schema::KnowledgeArticle);
    fs::write(
        out_dir.join("KnowledgeArticle.schema.json"),
        serde_json::to_string_pretty(&article_schema)?,
    )?;

    let session_schema = schema_for!(helpdesk_core::schema::AdminSession);
    fs::write(
        out_dir.join("AdminSession.schema.json"),
        serde_json::to_string_pretty(&session_schema)?,
    )?;

    let analytics_schema = schema_for!(helpdesk_core::schema::AdminAnalytics);
    fs::write(
        out_dir.join("AdminAnalytics.schema.json"),
        serde_json::to_string_pretty(&analytics_schema)?,
    )?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

// Field constraints are a presentation concern; the repository stores
// whatever it is given.
fn validate_title(title: &str) -> Result<()> {
    let length = title.trim().chars().count();
    if !(5..=100).contains(&length) {
        bail!("Title must be between 5 and 100 characters");
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    let length = description.trim().chars().count();
    if !(10..=1000).contains(&length) {
        bail!("Description must be between 10 and 1000 characters");
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !local.contains(char::is_whitespace)
                && !domain.contains('@')
                && !domain.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty())
        }
        None => false,
    };
    if !valid {
        bail!("Please enter a valid email address");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds_are_inclusive() {
        assert!(validate_title("12345").is_ok());
        assert!(validate_title("1234").is_err());
        assert!(validate_title(&"x".repeat(100)).is_ok());
        assert!(validate_title(&"x".repeat(101)).is_err());
    }

    #[test]
    fn description_bounds_are_inclusive() {
        assert!(validate_description("1234567890").is_ok());
        assert!(validate_description("123456789").is_err());
        assert!(validate_description(&"x".repeat(1000)).is_ok());
        assert!(validate_description(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn email_shape_is_checked_loosely() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user@sub.example.co").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user with space@example.com").is_err());
    }
}
