#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the incident dashboard.
//!
//! Every dashboard query is available as a subcommand printing a table (or
//! JSON with `--json`). Run without a subcommand to pick between the
//! interactive explorer and the API server.
//!
//! Uses `indicatif-log-bridge` (via [`gtd_cli_utils::init_logger`]) so that
//! log lines and the loading spinner never fight for the terminal.

mod explore;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dialoguer::Select;
use gtd_analytics_models::Selection;
use gtd_cli_utils::{IndicatifProgress, MultiProgress};
use gtd_dataset::DatasetDefinition;
use gtd_incident_models::{AttackType, YearRange};
use gtd_server::{AppState, ServerConfig};
use gtd_server_models::ApiAttackType;

#[derive(Parser)]
#[command(name = "gtd", about = "Global Terrorism Database dashboard tools")]
struct Cli {
    /// Dataset definition TOML replacing the built-in one (or `GTD_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Incident file to load instead of the definition's path (or `GTD_DATA_PATH`)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List regions in order of first appearance
    Regions,
    /// List the countries of a region
    Countries {
        #[arg(long)]
        region: String,
    },
    /// Killed, wounded, and attack sums per year
    Series(SelectionArgs),
    /// Killed, wounded, and attack sums over the whole year range
    Totals(SelectionArgs),
    /// Per-location, per-year sums for the map
    Locations(SelectionArgs),
    /// Reference coordinate used to centre the map on a country
    Locate {
        #[arg(long)]
        country: String,
    },
    /// List the attack-type taxonomy
    AttackTypes,
    /// Interactively pick a selection and print every view
    Explore,
    /// Serve the JSON API
    Serve {
        /// Bind address (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct SelectionArgs {
    #[arg(long)]
    region: String,
    #[arg(long)]
    country: String,
    /// First year, inclusive (defaults to the dataset's first year)
    #[arg(long)]
    from: Option<i32>,
    /// Last year, inclusive (defaults to the dataset's last year)
    #[arg(long)]
    to: Option<i32>,
}

impl SelectionArgs {
    fn to_selection(&self, bounds: YearRange) -> Selection {
        Selection::new(
            self.region.clone(),
            self.country.clone(),
            YearRange::new(
                self.from.unwrap_or(bounds.from),
                self.to.unwrap_or(bounds.to),
            ),
        )
    }
}

/// Top-level choices offered when no subcommand is given.
enum Tool {
    Explore,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Explore, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Explore => "Explore the dashboard views",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = gtd_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    if cli.config.is_some() {
        config.config_path = cli.config;
    }
    if cli.data.is_some() {
        config.data_path = cli.data;
    }

    let command = match cli.command {
        Some(command) => command,
        None => pick_tool()?,
    };

    if matches!(command, Commands::AttackTypes) {
        let types: Vec<ApiAttackType> = AttackType::all()
            .iter()
            .copied()
            .map(ApiAttackType::from)
            .collect();
        if cli.json {
            render::print_json(&types)?;
        } else {
            render::print_attack_types(&types);
        }
        return Ok(());
    }

    let state = load(&multi, config.dataset_definition()?).await?;
    let bounds = state.year_bounds();

    match command {
        Commands::Regions => {
            let regions = state.engine.regions();
            if cli.json {
                render::print_json(&regions)?;
            } else {
                render::print_list("REGION", regions);
            }
        }
        Commands::Countries { region } => {
            let options = state.engine.country_options(&region)?;
            if cli.json {
                render::print_json(&options)?;
            } else {
                render::print_list("COUNTRY", &options.countries);
            }
        }
        Commands::Series(args) => {
            let series = state.engine.series_by_year(&args.to_selection(bounds));
            if cli.json {
                render::print_json(&series)?;
            } else {
                render::print_series(&series);
            }
        }
        Commands::Totals(args) => {
            let totals = state.engine.totals(&args.to_selection(bounds));
            if cli.json {
                render::print_json(&totals)?;
            } else {
                render::print_totals(&totals);
            }
        }
        Commands::Locations(args) => {
            let locations = state.engine.series_by_location(&args.to_selection(bounds));
            if cli.json {
                render::print_json(&locations)?;
            } else {
                render::print_locations(&locations);
            }
        }
        Commands::Locate { country } => {
            let coordinates = state.engine.location_of(&country)?;
            if cli.json {
                render::print_json(&coordinates)?;
            } else {
                println!(
                    "{country}: {:.6}, {:.6}",
                    coordinates.latitude, coordinates.longitude
                );
            }
        }
        Commands::Explore => explore::run(&state, cli.json)?,
        Commands::Serve { bind, port } => {
            let bind = bind.unwrap_or(config.bind_addr);
            let port = port.unwrap_or(config.port);

            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(gtd_server::serve(state, &bind, port))
            })
            .await??;
        }
        // Printed before loading.
        Commands::AttackTypes => {}
    }

    Ok(())
}

fn pick_tool() -> Result<Commands, Box<dyn std::error::Error>> {
    println!("Global Terrorism Database Dashboard");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match Tool::ALL[idx] {
        Tool::Explore => Commands::Explore,
        Tool::Server => Commands::Serve {
            bind: None,
            port: None,
        },
    })
}

/// Loads and indexes the dataset off the async runtime, with a row
/// counter on the terminal.
async fn load(
    multi: &MultiProgress,
    definition: DatasetDefinition,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::records_bar(multi, &format!("Loading {}", definition.name));

    let state =
        tokio::task::spawn_blocking(move || AppState::load(&definition, &progress)).await??;

    log::info!(
        "{} incidents across {} regions",
        state.engine.table().len(),
        state.engine.regions().len()
    );

    Ok(state)
}
