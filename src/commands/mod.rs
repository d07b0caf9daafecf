use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::sync::Arc;

use hostrota::config::Config;
use hostrota::i18n::t;
use hostrota::notifications::{
    MemoryNotifier, NotificationLevel, NotificationManager, SharedNotifier, TracingNotifier,
};
use hostrota::scheduler::{DisplayFilter, HostRotation, OperationReport, PendingAction};
use hostrota::storage::{create_sqlite_repository, SharedHostRepository};

pub mod export;
pub mod schedule;
pub mod session;

// Re-export command functions for convenience
pub use export::{audit, export};
pub use schedule::{
    assign, can_host, cancel, clear, quick_fix, shift, show, uncancel, validate,
};
pub use session::{dates, import, session_add, SessionParams};

/// Everything a command needs: config, store and notification sinks
pub struct App {
    pub config: Config,
    pub store: SharedHostRepository,
    notifier: SharedNotifier,
    inbox: Arc<MemoryNotifier>,
}

impl App {
    pub fn open(config: Config) -> Result<Self> {
        let store = create_sqlite_repository(&config.database.sqlite_path)
            .with_context(|| format!("Failed to open {}", config.database.sqlite_path.display()))?;

        let inbox = Arc::new(MemoryNotifier::new());
        let notifier: SharedNotifier = Arc::new(
            NotificationManager::new()
                .with_channel(Arc::new(TracingNotifier::new()))
                .with_channel(inbox.clone()),
        );

        Ok(Self {
            config,
            store,
            notifier,
            inbox,
        })
    }

    /// Export language as a supported locale code
    pub fn locale(&self) -> String {
        hostrota::i18n::normalize_locale(&self.config.export.locale)
    }

    /// Load a session view, honoring `--all` over the configured filter
    pub fn rotation(&self, session_id: &str, show_all: bool) -> Result<HostRotation> {
        let mut rotation =
            HostRotation::load(self.store.clone(), self.notifier.clone(), session_id)?;
        let filter = if show_all {
            DisplayFilter::All
        } else {
            self.config.display_filter()
        };
        rotation.set_display_filter(filter);
        Ok(rotation)
    }

    /// Print notifications collected since the last call
    pub fn flush_notifications(&self) {
        for notification in self.inbox.take() {
            let marker = match notification.level {
                NotificationLevel::Error => "✗",
                NotificationLevel::Warning => "!",
                NotificationLevel::Success => "✓",
                NotificationLevel::Info => "·",
            };
            println!("{marker} {}", notification.message);
        }
    }
}

/// Ask the user to confirm a pending action; `--yes` skips the prompt
pub fn confirm(action: &PendingAction, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    print!("{}", t!("cli.confirm_prompt", question = action.describe()));
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Summary line plus one line per failed write
pub fn print_report(app: &App, report: &OperationReport) {
    app.flush_notifications();
    for change in &report.applied {
        println!("  {change}");
    }
    println!(
        "{}",
        t!(
            "cli.applied",
            applied = report.records_affected,
            failed = report.failures.len()
        )
    );
    for failure in &report.failures {
        println!("  ✗ {}: {}", failure.target, failure.reason);
    }
}
