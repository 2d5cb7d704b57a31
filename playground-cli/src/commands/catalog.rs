//! `playground catalog list|install`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use playground_core::{AppId, CatalogApp, RepoPlayground};
use playground_daemon::DaemonRequest;

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List installable apps.
    List {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Install an app as a new playground (once per app).
    Install { app_id: String },
}

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "port")]
    port: String,
    #[tabled(rename = "description")]
    description: String,
}

pub fn run(command: CatalogCommand) -> Result<()> {
    let home = super::home()?;
    match command {
        CatalogCommand::List { json } => {
            let apps: Vec<CatalogApp> = super::call_as(&home, DaemonRequest::Catalog)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&apps)
                        .context("failed to serialize catalog JSON")?
                );
                return Ok(());
            }
            if apps.is_empty() {
                println!("The catalog is empty.");
                return Ok(());
            }
            let rows: Vec<AppRow> = apps
                .into_iter()
                .map(|app| AppRow {
                    id: app.id.to_string(),
                    name: app.name,
                    port: app
                        .default_port
                        .map_or_else(|| "-".to_string(), |p| p.to_string()),
                    description: app.description,
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
        CatalogCommand::Install { app_id } => {
            let record: RepoPlayground = super::call_as(
                &home,
                DaemonRequest::Install {
                    app_id: AppId::from(app_id),
                },
            )?;
            println!("installed {}", record.id.to_string().bold());
            println!("  path: {}", record.path.display());
        }
    }
    Ok(())
}
