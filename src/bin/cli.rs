//! findaca CLI
//!
//! Searches the CA ANZ "Find a CA" directory postcode by postcode.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use findaca::{
    catalog::{PostcodeCatalog, Region},
    driver::ChromiumDriver,
    error::Result,
    models::{Config, RunOptions, ScrapeMode},
    pipeline::{self, RunContext, RunState, StopSignal},
    storage::LocalStorage,
    utils::log,
};

/// findaca - Chartered Accountant directory scraper
#[derive(Parser, Debug)]
#[command(
    name = "findaca",
    version,
    about = "Scrape Chartered Accountant listings by Australian postcode"
)]
struct Cli {
    /// Directory holding config.toml and run output
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Postcodes between progress checkpoints
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Pause between postcodes in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Output file name inside the data directory
    #[arg(long, global = true)]
    output: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape every postcode in Australia
    Full,

    /// Scrape one state or territory (NSW, VIC, QLD, SA, WA, TAS, NT, ACT)
    State {
        #[arg(value_parser = parse_region)]
        region: Region,
    },

    /// Scrape a few postcodes from each state
    Sample,

    /// Scrape capital-city CBD postcodes
    Cities,

    /// Continue a full run from a postcode
    Resume { postcode: String },

    /// Search a single postcode
    Search { postcode: String },

    /// Show postcode counts and run estimates
    Stats,

    /// Validate the configuration file
    Validate,
}

fn parse_region(s: &str) -> std::result::Result<Region, String> {
    s.parse::<Region>().map_err(|e| e.to_string())
}

/// Initialize logging. `--verbose` wins over the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.data_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    init_logging(cli.verbose, &config.logging.level);

    let catalog = PostcodeCatalog::new();

    let mode = match cli.command {
        Command::Stats => {
            print_stats(&catalog);
            return Ok(());
        }
        Command::Validate => {
            ::log::info!("Validating {}...", config_path.display());
            if let Err(e) = config.validate() {
                ::log::error!("Config validation failed: {e}");
                return Err(e);
            }
            ::log::info!("Config OK");
            return Ok(());
        }
        Command::Full => ScrapeMode::Full,
        Command::State { region } => ScrapeMode::Region(region),
        Command::Sample => ScrapeMode::Sample,
        Command::Cities => ScrapeMode::Cities,
        Command::Resume { postcode } => ScrapeMode::Resume(postcode),
        Command::Search { postcode } => ScrapeMode::Single(postcode),
    };

    config.validate()?;
    if cli.headless {
        config.browser.headless = true;
    }

    let mut options = RunOptions::for_mode(&mode);
    if let Some(batch_size) = cli.batch_size {
        options.batch_size = batch_size;
    }
    if let Some(delay_ms) = cli.delay_ms {
        options.delay_ms = delay_ms;
    }
    if let Some(output) = cli.output {
        options.output_file = output;
    }

    log::header("Find a CA scraper");
    ::log::info!("Data directory: {}", cli.data_dir.display());

    log::step(1, 2, "Launching browser");
    let driver = ChromiumDriver::launch(&config.browser).await?;
    let stop = StopSignal::new();
    stop.listen_for_ctrl_c();

    let storage = LocalStorage::new(&cli.data_dir);
    let ctx = RunContext {
        driver: &driver,
        config: &config,
        storage: &storage,
        catalog: &catalog,
        screenshot_dir: screenshot_dir(&cli.data_dir, &config),
        stop,
    };

    log::step(2, 2, &format!("Running {} ({})", mode_label(&mode), options.output_file));
    let outcome = run(&ctx, &catalog, &mode, &options).await;
    drop(ctx);

    if let Err(e) = driver.close().await {
        ::log::warn!("Browser did not close cleanly: {e}");
    }

    outcome?;
    ::log::info!("Done!");
    Ok(())
}

async fn run(
    ctx: &RunContext<'_>,
    catalog: &PostcodeCatalog,
    mode: &ScrapeMode,
    options: &RunOptions,
) -> Result<()> {
    let units = match mode {
        ScrapeMode::Single(postcode) => {
            let result = pipeline::run_single(ctx, postcode, options).await?;
            ::log::info!(
                "Postcode {}: {} members ({})",
                result.postcode,
                result.total_count,
                result.status
            );
            return Ok(());
        }
        ScrapeMode::Full | ScrapeMode::Resume(_) => catalog.all_units(),
        ScrapeMode::Region(region) => catalog.units_for_region(*region),
        ScrapeMode::Sample => catalog.sample_units(5),
        ScrapeMode::Cities => catalog.major_city_units(),
    };

    let outcome = pipeline::run_scrape(ctx, &units, options).await?;
    if outcome.state == RunState::Interrupted {
        ::log::warn!(
            "Stopped at {}/{} postcodes; continue with `findaca resume <POSTCODE>`",
            outcome.carried_forward + outcome.processed,
            outcome.total
        );
    }
    Ok(())
}

fn mode_label(mode: &ScrapeMode) -> String {
    match mode {
        ScrapeMode::Full => "full scrape".to_string(),
        ScrapeMode::Region(region) => format!("{region} scrape"),
        ScrapeMode::Sample => "sample scrape".to_string(),
        ScrapeMode::Cities => "major cities scrape".to_string(),
        ScrapeMode::Resume(postcode) => format!("full scrape from {postcode}"),
        ScrapeMode::Single(postcode) => format!("search for {postcode}"),
    }
}

fn screenshot_dir(data_dir: &Path, config: &Config) -> PathBuf {
    data_dir.join(&config.browser.screenshot_dir)
}

fn print_stats(catalog: &PostcodeCatalog) {
    let stats = catalog.statistics();
    let (min_minutes, max_minutes) = stats.estimated_minutes();
    let (min_mb, max_mb) = stats.estimated_storage_mb();

    log::header("Australian postcode statistics");
    for (region, count) in &stats.by_region {
        log::sub_item(&format!("{:<4} {count}", region.code()));
    }
    log::separator();
    log::summary(
        "Full run",
        &[
            ("Total postcodes", stats.total.to_string()),
            (
                "Estimated time",
                format!("{min_minutes}-{max_minutes} minutes"),
            ),
            ("Estimated storage", format!("{min_mb}-{max_mb} MB")),
        ],
    );
}
