use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use wilayah::builder::SanityThresholds;
use wilayah::config::{MIN_DISTRICTS, MIN_PROVINCES, MIN_REGENCIES, MIN_VILLAGES};
use wilayah::parsers::RegencyStrategy;
use wilayah::pipeline::{self, RunConfig};

#[derive(Parser)]
#[command(name = "wilayah")]
#[command(about = "Extract Indonesian administrative region datasets from decree page tables")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, validate and write the province/regency/district/village CSVs
    Extract(ExtractArgs),
    /// Print the raw classification of every page in range
    Classify(ClassifyArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Auto,
    Table,
    Text,
}

impl From<StrategyArg> for RegencyStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => RegencyStrategy::Auto,
            StrategyArg::Table => RegencyStrategy::Table,
            StrategyArg::Text => RegencyStrategy::Text,
        }
    }
}

#[derive(Args)]
struct InputArgs {
    /// Page dump path or http(s) URL
    #[arg(short, long)]
    input: String,

    /// Expected SHA-256 of the input (hex)
    #[arg(long)]
    sha256: Option<String>,

    /// First page to process (1-based)
    #[arg(long, default_value_t = 1)]
    start_page: usize,

    /// Last page to process (defaults to the last page)
    #[arg(long)]
    end_page: Option<usize>,
}

#[derive(Args)]
struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output directory for generated files
    #[arg(short, long)]
    output: String,

    /// Build from the raw cache of a previous run instead of reading pages
    #[arg(long)]
    reuse_raw: bool,

    /// Regency listing parser
    #[arg(long, value_enum, default_value_t = StrategyArg::Auto)]
    regency_strategy: StrategyArg,

    /// Minimum plausible number of raw province rows
    #[arg(long, default_value_t = MIN_PROVINCES)]
    min_provinces: usize,

    /// Minimum plausible number of raw regency rows
    #[arg(long, default_value_t = MIN_REGENCIES)]
    min_regencies: usize,

    /// Minimum plausible number of raw district rows
    #[arg(long, default_value_t = MIN_DISTRICTS)]
    min_districts: usize,

    /// Minimum plausible number of raw village rows
    #[arg(long, default_value_t = MIN_VILLAGES)]
    min_villages: usize,
}

#[derive(Args)]
struct ClassifyArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory for downloaded inputs
    #[arg(short, long, default_value = ".")]
    output: String,
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let config = RunConfig {
        input: args.input.input,
        output_dir: args.output,
        expected_sha256: args.input.sha256,
        start_page: args.input.start_page,
        end_page: args.input.end_page,
        reuse_raw: args.reuse_raw,
        regency_strategy: args.regency_strategy.into(),
        thresholds: SanityThresholds {
            min_provinces: args.min_provinces,
            min_regencies: args.min_regencies,
            min_districts: args.min_districts,
            min_villages: args.min_villages,
        },
    };

    info!(input = %config.input, output = %config.output_dir, "Starting extraction");

    let pb = ProgressBar::new(0);
    let mut on_page = |done: usize, total: usize| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    };
    let result = pipeline::run(&config, Some(&mut on_page));
    pb.finish_and_clear();
    let summary = result?;

    let stats = &summary.stats;
    println!();
    println!("=== Summary ===");
    println!(
        "Extraction time:    {:.2}s",
        summary.extraction_time.as_secs_f64()
    );
    println!("Build time:         {:.2}s", summary.build_time.as_secs_f64());
    println!();
    println!("Pages visited:      {}", stats.pages_visited);
    println!("Fallback pages:     {}", stats.fallback_pages);
    println!("Text fallbacks:     {}", stats.text_fallback_pages);
    if let Some(page) = stats.stopped_at {
        println!("Stopped at page:    {}", page);
    }
    println!("Provinces:          {}", summary.provinces);
    println!("Regencies/cities:   {}", summary.regencies);
    println!("Districts:          {}", summary.districts);
    println!("Villages:           {}", summary.villages);
    println!("Joined villages:    {}", summary.joined);
    for file in &summary.files {
        println!("Wrote {}", file.display());
    }

    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let mut config = RunConfig::new(args.input.input, args.output);
    config.expected_sha256 = args.input.sha256;
    config.start_page = args.input.start_page;
    config.end_page = args.input.end_page;

    for (page, page_type) in pipeline::classify(&config)? {
        println!("{:>5}  {}", page, page_type.as_str());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Classify(args) => run_classify(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
