use clap::Parser;
use emerging_sequences::{Backend, DatasetLoader, Filtering, Miner, MiningConfig};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

/// Minimal emerging sequential patterns with bounded gaps
#[derive(Parser, Debug)]
#[command(name = "emerging-sequences", version)]
struct Args {
    /// Positive transactions, one per line
    positive: PathBuf,

    /// Negative transactions, one per line
    negative: PathBuf,

    /// Minimum support in the positive collection
    #[arg(long)]
    pos_bound: usize,

    /// Maximum support in the negative collection
    #[arg(long, default_value_t = 0)]
    neg_bound: usize,

    /// Maximum number of items between two pattern items
    #[arg(long, default_value_t = 0)]
    gap: usize,

    /// Worker threads, all cores by default
    #[arg(long)]
    threads: Option<usize>,

    /// Explore level by level
    #[arg(long)]
    breadth_first: bool,

    /// Filter results every N collected sequences
    #[arg(long, value_name = "N", conflicts_with = "breadth_first")]
    batch: Option<usize>,

    /// Track occurrences as bitsets
    #[arg(long)]
    bitset: bool,

    /// Prune sequences always followed by the same item, disables sibling pruning
    #[arg(long, conflicts_with_all = ["breadth_first", "batch", "bitset"])]
    backscan: bool,

    /// Keep exploring siblings of emerging sequences
    #[arg(long)]
    no_sibling_pruning: bool,

    /// Item separator, whitespace by default
    #[arg(long)]
    separator: Option<String>,

    /// Log search statistics every N seconds
    #[arg(long, value_name = "N")]
    stats_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a tracing subscriber is already installed");
    }

    let mut config = MiningConfig::new(args.pos_bound, args.neg_bound, args.gap);
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if args.breadth_first {
        config = config.breadth_first();
    }
    if let Some(inter_batch_delay) = args.batch {
        config.filtering = Filtering::Batch { inter_batch_delay };
    }
    if args.bitset {
        config.backend = Backend::BitSet;
    }
    config.prune_siblings = !args.no_sibling_pruning;
    if args.backscan {
        config = config.backscan();
    }
    config.stats_interval = args.stats_secs.map(Duration::from_secs);

    let mut loader = DatasetLoader::new(config.pos_freq_lower_bound, config.neg_freq_upper_bound);
    if let Some(separator) = args.separator {
        loader = loader.with_separator(separator);
    }

    let output = match loader
        .load_files(&args.positive, &args.negative)
        .and_then(|dataset| Miner::new(config).mine(&dataset))
    {
        Ok(output) => output,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    for item in &output.emerging_items {
        println!("{}", item);
    }
    for pattern in &output.patterns {
        println!("{}", pattern.join(" "));
    }
    println!("total collected: {}", output.total_collected);
    println!("total minimal: {}", output.total_minimal);
}
