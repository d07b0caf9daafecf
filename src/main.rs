use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostrota::config::Config;
use hostrota::error::{Error, HostrotaErrorTrait};
use hostrota::i18n::t;
use hostrota::scheduler::ShiftDirection;

mod commands;

// CLI messages use the same locale files as the library
rust_i18n::i18n!("locales", fallback = "en");

#[derive(Parser)]
#[command(
    name = "hostrota",
    version,
    about = "Host rotation scheduler for recurring course sessions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database path (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file (defaults to HOSTROTA_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output language (en, ko)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the meeting dates of a window
    Dates {
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Weekday filter, e.g. "Mon, Wed"
        #[arg(long)]
        days: Option<String>,
    },

    /// Create or update a session
    SessionAdd {
        #[arg(long)]
        id: String,

        #[arg(long)]
        course: String,

        #[arg(long)]
        teacher_id: String,

        #[arg(long)]
        teacher_name: String,

        #[arg(long)]
        teacher_address: Option<String>,

        #[arg(long)]
        teacher_phone: Option<String>,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        /// Weekday filter, e.g. "Mon, Wed"
        #[arg(long)]
        days: Option<String>,
    },

    /// Import enrollments from a CSV file
    Import {
        #[arg(short, long)]
        session: String,

        /// CSV file with a header row
        file: PathBuf,
    },

    /// Show the rotation of a session
    Show {
        #[arg(short, long)]
        session: String,

        /// Include candidates who did not volunteer to host
        #[arg(long)]
        all: bool,

        /// Show one row per meeting date instead of per candidate
        #[arg(long)]
        grid: bool,
    },

    /// Check the rotation for duplicates, gaps and missing data
    Validate {
        #[arg(short, long)]
        session: String,

        #[arg(long)]
        all: bool,
    },

    /// Assign a candidate to a date, or clear it
    Assign {
        #[arg(short, long)]
        session: String,

        /// Enrollment id or teacher-<id>
        candidate: String,

        /// Date (YYYY-MM-DD); omit together with --clear to unassign
        date: Option<String>,

        #[arg(long, conflicts_with = "date")]
        clear: bool,

        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },

    /// Move every displayed candidate one meeting forward or backward
    Shift {
        #[arg(short, long)]
        session: String,

        /// forward or backward
        #[arg(default_value = "forward")]
        direction: ShiftDirection,

        #[arg(long)]
        all: bool,
    },

    /// Clear every displayed candidate's date
    Clear {
        #[arg(short, long)]
        session: String,

        #[arg(long)]
        all: bool,

        #[arg(short, long)]
        yes: bool,
    },

    /// Resolve duplicate dates by keeping the first host of each date
    QuickFix {
        #[arg(short, long)]
        session: String,

        #[arg(long)]
        all: bool,
    },

    /// Mark a date as not held
    Cancel {
        #[arg(short, long)]
        session: String,

        date: String,

        #[arg(short, long)]
        yes: bool,
    },

    /// Remove the not-held markers of a date
    Uncancel {
        #[arg(short, long)]
        session: String,

        date: String,

        #[arg(short, long)]
        yes: bool,
    },

    /// Set whether a student is willing to host
    CanHost {
        #[arg(short, long)]
        session: String,

        candidate: String,

        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Export the rotation
    Export {
        #[arg(short, long)]
        session: String,

        /// csv, json, markdown or xlsx (defaults to the output extension or config)
        #[arg(short, long)]
        format: Option<String>,

        /// Output file (defaults to the configured export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        all: bool,
    },

    /// Show the most recent audit entries
    Audit {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %format!("{err:#}"), "Command failed");
            let err = Error::from(err);
            eprintln!("{}: {}", err.category().localized_desc(), err.localized_desc());
            if err.is_recoverable() {
                eprintln!("{}", t!("cli.retry_hint"));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).map_err(|e| Error::config(format!("{e:#}")))?,
        None => Config::from_env().map_err(|e| Error::config(format!("{e:#}")))?,
    };
    if let Some(db) = &cli.db {
        config.database.sqlite_path = db.clone();
    }
    if let Some(lang) = &cli.lang {
        config.export.locale = lang.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    config
        .validate()
        .map_err(|e| Error::config(format!("{e:#}")))?;

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;
    hostrota::i18n::set_locale(&config.export.locale);

    tracing::debug!(db = %config.database.sqlite_path.display(), "hostrota starting");

    // Window expansion needs no record store
    if let Commands::Dates { start, end, days } = &cli.command {
        return commands::dates(start, end, days.as_deref());
    }

    let app = commands::App::open(config)?;

    match cli.command {
        Commands::Dates { .. } => Ok(()),
        Commands::SessionAdd {
            id,
            course,
            teacher_id,
            teacher_name,
            teacher_address,
            teacher_phone,
            start,
            end,
            days,
        } => commands::session_add(
            &app,
            commands::SessionParams {
                id,
                course,
                teacher_id,
                teacher_name,
                teacher_address,
                teacher_phone,
                start,
                end,
                days,
            },
        ),
        Commands::Import { session, file } => commands::import(&app, &session, &file),
        Commands::Show {
            session,
            all,
            grid,
        } => commands::show(&app, &session, all, grid),
        Commands::Validate { session, all } => commands::validate(&app, &session, all),
        Commands::Assign {
            session,
            candidate,
            date,
            clear,
            yes,
        } => {
            if date.is_none() && !clear {
                anyhow::bail!("Give a date or --clear");
            }
            commands::assign(&app, &session, &candidate, date.as_deref(), yes)
        }
        Commands::Shift {
            session,
            direction,
            all,
        } => commands::shift(&app, &session, direction, all),
        Commands::Clear { session, all, yes } => commands::clear(&app, &session, all, yes),
        Commands::QuickFix { session, all } => commands::quick_fix(&app, &session, all),
        Commands::Cancel { session, date, yes } => commands::cancel(&app, &session, &date, yes),
        Commands::Uncancel { session, date, yes } => {
            commands::uncancel(&app, &session, &date, yes)
        }
        Commands::CanHost {
            session,
            candidate,
            value,
        } => commands::can_host(&app, &session, &candidate, value),
        Commands::Export {
            session,
            format,
            output,
            all,
        } => commands::export(&app, &session, format.as_deref(), output, all),
        Commands::Audit { limit } => commands::audit(&app, limit),
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("hostrota=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("hostrota={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
