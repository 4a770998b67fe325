use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use reportcard::config::PortalConfig;
use reportcard::ledger::Identity;
use reportcard::logging;
use reportcard::portal::{Portal, ValidateRequest};
use reportcard::server;
use reportcard::table::Row;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "reportcard",
    version,
    about = "School report-card portal: PIN-gated result lookup and report intake"
)]
pub struct Cli {
    /// Path to a JSON config file. Defaults to the per-user portal.json if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding pins.csv, records.csv and public/
    #[arg(long, global = true, env = "REPORTCARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    pub fn load_config(&self) -> Result<PortalConfig> {
        let mut config =
            PortalConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        if let Some(dir) = &self.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(Commands::Serve { bind: Some(bind) }) = &self.command {
            config.bind.clone_from(bind);
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// The four fields a directory row is keyed by
#[derive(Args, Debug, Clone)]
pub struct StudentArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub class: String,
    #[arg(long)]
    pub session: String,
    #[arg(long)]
    pub term: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP portal until Ctrl-C
    Serve {
        /// Listen address, e.g. 0.0.0.0:3000
        #[arg(long, env = "REPORTCARD_BIND")]
        bind: Option<String>,
    },
    /// Validate a PIN for a student, count the use, and print the student's row
    Validate {
        #[arg(long)]
        pin: String,
        #[command(flatten)]
        student: StudentArgs,
    },
    /// Search the directory without using a PIN
    Lookup {
        #[command(flatten)]
        student: StudentArgs,
        /// Print every matching row instead of one
        #[arg(long)]
        all: bool,
    },
    /// Print the directory as a table
    Show,
    /// List ledger entries with their usage counts
    Ledger,
    /// Print the log directory and today's log files
    Logs,
    /// Write the effective configuration as JSON
    InitConfig {
        /// Output path. Defaults to the per-user config location.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub async fn run_command(command: Commands, config: PortalConfig) -> Result<()> {
    match command {
        Commands::Serve { .. } => server::serve(&config)
            .await
            .context("Portal server failed"),
        Commands::Validate { pin, student } => handle_validate(&config, pin, student),
        Commands::Lookup { student, all } => handle_lookup(&config, &student, all),
        Commands::Show => handle_show(&config),
        Commands::Ledger => handle_ledger(&config),
        Commands::Logs => handle_logs(&config),
        Commands::InitConfig { path } => handle_init_config(&config, path),
    }
}

fn handle_validate(config: &PortalConfig, pin: String, student: StudentArgs) -> Result<()> {
    let portal = Portal::new(config);
    let request = ValidateRequest {
        pin,
        name: student.name,
        class: student.class,
        session: student.session,
        term: student.term,
    };

    match portal.validate(&request) {
        Ok(row) => {
            print_row(&row);
            Ok(())
        }
        Err(err) if err.is_rejection() => {
            anyhow::bail!("{err} ({})", err.code())
        }
        Err(err) => Err(anyhow::Error::new(err).context("Validation failed")),
    }
}

fn handle_lookup(config: &PortalConfig, student: &StudentArgs, all: bool) -> Result<()> {
    let identity = Identity::new(&student.name, &student.class, &student.session, &student.term);
    let directory = Portal::new(config)
        .directory()
        .context("Failed to load directory")?;
    let key = identity.lookup_key();

    let rows: &[Row] = if all {
        directory.find_all(&key)
    } else {
        directory.find(&key).map(std::slice::from_ref).unwrap_or_default()
    };

    if rows.is_empty() {
        anyhow::bail!("No matching record found.");
    }
    for row in rows {
        print_row(row);
    }
    Ok(())
}

fn handle_show(config: &PortalConfig) -> Result<()> {
    let directory = Portal::new(config)
        .directory()
        .context("Failed to load directory")?;

    if directory.is_empty() {
        println!("Directory {} is empty.", config.directory_path().display());
        return Ok(());
    }
    print!("{}", directory.render_table());
    println!("{} rows", directory.len().saturating_sub(1));
    Ok(())
}

fn handle_ledger(config: &PortalConfig) -> Result<()> {
    let portal = Portal::new(config);
    let entries = portal
        .ledger()
        .entries()
        .context("Failed to read ledger")?;

    if entries.is_empty() {
        println!("Ledger {} has no entries.", config.ledger_path().display());
        return Ok(());
    }

    println!(
        "{:<10} {:<24} {:<8} {:<10} {:<6} USES",
        "PIN", "NAME", "CLASS", "SESSION", "TERM"
    );
    for entry in &entries {
        let id = &entry.identity;
        println!(
            "{:<10} {:<24} {:<8} {:<10} {:<6} {}/{}",
            entry.pin,
            id.name(),
            id.class(),
            id.session(),
            id.term(),
            entry.count,
            portal.ledger().cap()
        );
    }
    Ok(())
}

fn handle_logs(config: &PortalConfig) -> Result<()> {
    let dir = config.log_dir.as_deref();
    println!("Log directory: {}", logging::get_log_dir(dir)?.display());
    println!("Today's log:   {}", logging::get_current_log_path(dir)?.display());
    println!(
        "Today's errors: {}",
        logging::get_current_error_log_path(dir)?.display()
    );
    Ok(())
}

fn handle_init_config(config: &PortalConfig, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => PortalConfig::default_path()?,
    };
    config.save(&path)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn print_row(row: &Row) {
    println!("{}", row.join(","));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_validate() -> Result<()> {
        let cli = Cli::try_parse_from([
            "reportcard",
            "--data-dir",
            "/srv/school",
            "validate",
            "--pin",
            "1234",
            "--name",
            "john",
            "--class",
            "5a",
            "--session",
            "2023",
            "--term",
            "1",
        ])?;
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/school")));
        let Some(Commands::Validate { pin, student }) = cli.command else {
            anyhow::bail!("expected validate command");
        };
        assert_eq!(pin, "1234");
        assert_eq!(student.name, "john");
        Ok(())
    }

    #[test]
    fn test_parse_logs() -> Result<()> {
        let cli = Cli::try_parse_from(["reportcard", "logs"])?;
        assert!(matches!(cli.command, Some(Commands::Logs)));
        Ok(())
    }

    #[test]
    fn test_no_command_parses() -> Result<()> {
        let cli = Cli::try_parse_from(["reportcard"])?;
        assert!(cli.command.is_none());
        Ok(())
    }
}
