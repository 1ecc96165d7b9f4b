use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

use heatsheet::config::{load_config, validate_config, Config};
use heatsheet::dashboard::{DashboardState, FetchKey};
use heatsheet::fetch::{load_dashboard, LoadOutcome};
use heatsheet::filter::FilterTuple;
use heatsheet::output;
use heatsheet::records::Division;
use heatsheet::source::StatsClient;

const EXIT_SUCCESS: i32 = 0;
const EXIT_TERMINAL: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_USAGE: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Elimination type (e.g. Single, Double)
    #[arg(long)]
    elimination: Option<String>,

    /// Round name (e.g. "Round 2", "Final")
    #[arg(long)]
    round: Option<String>,

    /// Heat number (e.g. 7, 19a)
    #[arg(long)]
    heat: Option<String>,
}

impl FilterArgs {
    fn tuple(&self) -> FilterTuple {
        FilterTuple::from_input(
            self.elimination.as_deref().unwrap_or(""),
            self.round.as_deref().unwrap_or(""),
            self.heat.as_deref().unwrap_or(""),
        )
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Best and average scores across every athlete of an event
    Event {
        event_id: u64,
        #[command(flatten)]
        filters: FilterArgs,
        /// List every holder of a tied best score
        #[arg(long)]
        ties: bool,
    },
    /// One athlete's scores at an event, against the fleet
    Athlete {
        event_id: u64,
        athlete_id: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// List every heat of a tied best score
        #[arg(long)]
        ties: bool,
        /// Also print heat scores in round order
        #[arg(long)]
        scores: bool,
    },
    /// Show the elimination / round / heat options available
    Options {
        event_id: u64,
        #[arg(long)]
        athlete: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the athletes of an event
    Athletes { event_id: u64 },
    /// List events, most recent first
    Events {
        /// Events per page
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Include events without a wave discipline
        #[arg(long)]
        all_disciplines: bool,
    },
    /// Compare two athletes at one event
    H2h {
        event_id: u64,
        athlete1_id: String,
        athlete2_id: String,
    },
    /// Interactive dashboard
    Dashboard {
        event_id: u64,
        #[arg(long)]
        athlete: Option<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "heatsheet")]
#[command(about = "Windsurf world tour heat statistics by elimination, round and heat", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/heatsheet/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Division: men or women (defaults to the config value)
    #[arg(short, long, global = true)]
    division: Option<Division>,

    /// Tab-separated output for scripting
    #[arg(long, global = true)]
    tsv: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+); a second install is harmless
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    heatsheet::logging::init_logging(cli.verbose);
    let start_time = Instant::now();

    let config = match load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let client = match StatsClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let division = cli.division.unwrap_or(config.division);
    debug!(api_url = %config.api_url, %division, "configured");

    let code = match cli.command {
        Commands::Event { event_id, filters, ties } => {
            let key = FetchKey::event(event_id, division);
            report(&client, &config, key, &filters.tuple(), ties, false, cli.tsv).await
        }
        Commands::Athlete {
            event_id,
            athlete_id,
            filters,
            ties,
            scores,
        } => {
            let key = FetchKey::athlete(event_id, athlete_id, division);
            report(&client, &config, key, &filters.tuple(), ties, scores, cli.tsv).await
        }
        Commands::Options {
            event_id,
            athlete,
            filters,
        } => {
            let key = subject_key(event_id, athlete, division);
            match load_dashboard(&client, key, &filters.tuple(), false).await {
                Ok(LoadOutcome { state, cleared }) => {
                    report_cleared(&filters.tuple(), &cleared);
                    report_unknown_elimination(&state);
                    println!("{}", output::format_options_tree(state.index(), state.tuple()));
                    EXIT_SUCCESS
                }
                Err(e) => network_error(&e),
            }
        }
        Commands::Athletes { event_id } => match client.fetch_event_athletes(event_id, division).await {
            Ok(athletes) if athletes.is_empty() => {
                println!("No athletes found.");
                EXIT_SUCCESS
            }
            Ok(athletes) => {
                for athlete in athletes {
                    if cli.tsv {
                        println!(
                            "{}\t{}\t{}\t{}",
                            athlete.athlete_id,
                            athlete.name,
                            athlete.country_code.as_deref().unwrap_or(""),
                            athlete.overall_position.map(|p| p.to_string()).unwrap_or_default()
                        );
                    } else {
                        println!("{:>8}  {}", athlete.athlete_id, athlete.label());
                    }
                }
                EXIT_SUCCESS
            }
            Err(e) => network_error(&e),
        },
        Commands::Events {
            limit,
            page,
            all_disciplines,
        } => match client.fetch_events(page.max(1), limit.max(1), !all_disciplines).await {
            Ok(events) if cli.tsv => {
                println!("{}", output::format_events_tsv(&events));
                EXIT_SUCCESS
            }
            Ok(events) => {
                println!("{}", output::format_events(&events, output::should_use_colors()));
                EXIT_SUCCESS
            }
            Err(e) => network_error(&e),
        },
        Commands::H2h {
            event_id,
            athlete1_id,
            athlete2_id,
        } => {
            if athlete1_id == athlete2_id {
                eprintln!("Error: pick two different athletes");
                std::process::exit(EXIT_USAGE);
            }
            match client
                .fetch_head_to_head(event_id, &athlete1_id, &athlete2_id, division)
                .await
            {
                Ok(h2h) if cli.tsv => {
                    println!("{}", output::format_head_to_head_tsv(&h2h));
                    EXIT_SUCCESS
                }
                Ok(h2h) => {
                    println!("{}", output::format_head_to_head(&h2h, output::should_use_colors()));
                    EXIT_SUCCESS
                }
                Err(e) => network_error(&e),
            }
        }
        Commands::Dashboard { event_id, athlete } => {
            let key = subject_key(event_id, athlete, division);
            let app = heatsheet::tui::App::new(key, config.clone());
            match heatsheet::tui::run_tui(app, client).await {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    eprintln!("Terminal error: {:#}", e);
                    EXIT_TERMINAL
                }
            }
        }
    };

    debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(code);
}

fn subject_key(event_id: u64, athlete: Option<String>, division: Division) -> FetchKey {
    match athlete {
        Some(athlete_id) => FetchKey::athlete(event_id, athlete_id, division),
        None => FetchKey::event(event_id, division),
    }
}

fn network_error(e: &heatsheet::source::TransportError) -> i32 {
    eprintln!("Error: {} ({})", e, e.endpoint);
    EXIT_NETWORK
}

fn report_cleared(requested: &FilterTuple, cleared: &[heatsheet::filter::FilterLevel]) {
    for level in cleared {
        eprintln!(
            "Note: {} '{}' has no results in this selection and was cleared",
            level.label().to_lowercase(),
            requested.get(*level)
        );
    }
}

fn report_unknown_elimination(state: &DashboardState) {
    let elimination = &state.tuple().elimination;
    if !elimination.is_empty() && !state.index().elimination_types().contains(elimination) {
        eprintln!(
            "Note: elimination '{}' has no results (available: {})",
            elimination,
            state.index().elimination_types().join(", ")
        );
    }
}

async fn report(
    client: &StatsClient,
    config: &Config,
    key: FetchKey,
    requested: &FilterTuple,
    ties: bool,
    scores: bool,
    tsv: bool,
) -> i32 {
    let LoadOutcome { state, cleared } =
        match load_dashboard(client, key.clone(), requested, config.forward_filters).await {
            Ok(outcome) => outcome,
            Err(e) => return network_error(&e),
        };
    report_cleared(requested, &cleared);
    report_unknown_elimination(&state);

    if tsv {
        println!("{}", output::format_tsv(state.summary()));
        return EXIT_SUCCESS;
    }

    let use_colors = output::should_use_colors();
    let mut title = key.describe();
    if let Some(athlete) = state.athlete().filter(|a| !a.name.is_empty()) {
        title = format!("{}: {}", title, athlete.name);
    }
    println!("{}", title);
    println!(
        "{} ({} of {} records)",
        state.tuple().describe(),
        state.filtered().len(),
        state.records().len()
    );
    println!();
    println!("{}", output::format_summary(state.summary(), ties, use_colors));
    println!();
    println!("{}", output::format_move_types(&state.summary().series, use_colors));

    if scores {
        println!();
        println!("{}", output::format_heat_scores(state.filtered(), use_colors));
    }

    EXIT_SUCCESS
}
