use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cursorfeed::{FeedCategory, FeedConfig, FeedFilter, MemoryFeed, PaginatedFeed};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cursorfeed", about = "Index into cursor-paginated feeds")]
struct Cli {
    /// Log page fetches and cache activity.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct FeedArgs {
    /// Fixture file: a JSON array of feed items.
    fixture: PathBuf,
    /// Only items whose "type" matches (Email, Note, Call, Task).
    #[arg(long)]
    category: Option<FeedCategory>,
    /// Only items whose "contact_id" matches.
    #[arg(long)]
    contact: Option<u64>,
    /// Pages kept in the LRU cache besides page 0.
    #[arg(long, default_value_t = 1)]
    cache_pages: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the item at a zero-based index.
    Get {
        #[command(flatten)]
        feed: FeedArgs,
        /// Item index.
        index: usize,
    },
    /// Print items in feed order.
    Scan {
        #[command(flatten)]
        feed: FeedArgs,
        /// First index to print.
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Maximum number of items to print.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Count the items of the feed.
    Size {
        #[command(flatten)]
        feed: FeedArgs,
    },
    /// Resolve through an index, then print the cursor table and fetch statistics.
    Pages {
        #[command(flatten)]
        feed: FeedArgs,
        /// Item index to resolve through.
        index: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Get { feed, index } => run_get(&feed, index)?,
        Commands::Scan { feed, start, limit } => run_scan(&feed, start, limit)?,
        Commands::Size { feed } => run_size(&feed)?,
        Commands::Pages { feed, index } => run_pages(&feed, index)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "cursorfeed=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_feed(args: &FeedArgs) -> Result<PaginatedFeed<MemoryFeed<Value>>> {
    let items = read_fixture(&args.fixture)
        .with_context(|| format!("failed to read fixture {}", args.fixture.display()))?;
    let capability = MemoryFeed::new(items).with_matcher(fixture_matches);
    let filter = FeedFilter {
        category: args.category,
        owner_id: args.contact,
    };
    let config = FeedConfig::default().with_cache_pages(args.cache_pages);

    PaginatedFeed::open(capability, filter, config).context("failed to open feed")
}

fn run_get(args: &FeedArgs, index: usize) -> Result<()> {
    let feed = open_feed(args)?;
    match feed
        .get(index)
        .with_context(|| format!("failed to resolve item {}", index))?
    {
        Some(item) => println!("{}", item),
        None => anyhow::bail!("index {} is past the end of the feed", index),
    }
    Ok(())
}

fn run_scan(args: &FeedArgs, start: usize, limit: Option<usize>) -> Result<()> {
    let feed = open_feed(args)?;
    let limit = limit.unwrap_or(usize::MAX);

    for (offset, item) in feed.iter_from(start).take(limit).enumerate() {
        let item = item.with_context(|| format!("scan failed at item {}", start + offset))?;
        println!("{}\t{}", start + offset, item);
    }
    Ok(())
}

fn run_size(args: &FeedArgs) -> Result<()> {
    let feed = open_feed(args)?;
    let size = feed.size().context("failed to scan feed")?;
    println!("{}", size);
    Ok(())
}

fn run_pages(args: &FeedArgs, index: usize) -> Result<()> {
    let feed = open_feed(args)?;
    if feed
        .get(index)
        .with_context(|| format!("failed to resolve item {}", index))?
        .is_none()
    {
        println!("index {} is past the end of the feed", index);
    }

    for (page, slot) in feed.cursor_slots().iter().enumerate() {
        println!("page {}\t{}", page, slot);
    }
    let stats = feed.stats();
    println!(
        "fetches={}\tpage0_hits={}\tcache_hits={}\tcache_misses={}",
        stats.fetches, stats.page0_hits, stats.cache_hits, stats.cache_misses
    );
    Ok(())
}

fn read_fixture(path: &Path) -> Result<Vec<Value>> {
    let contents = std::fs::read_to_string(path)?;
    let items: Vec<Value> =
        serde_json::from_str(&contents).context("fixture must be a JSON array")?;
    Ok(items)
}

fn fixture_matches(filter: &FeedFilter, item: &Value) -> bool {
    let category_ok = filter.category.map_or(true, |category| {
        item.get("type").and_then(Value::as_str) == Some(category.as_str())
    });
    let owner_ok = filter
        .owner_id
        .map_or(true, |owner| item.get("contact_id").and_then(Value::as_u64) == Some(owner));
    category_ok && owner_ok
}
