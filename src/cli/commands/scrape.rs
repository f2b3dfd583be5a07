//! Category scrape command.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use clap::Args;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::export::{csv_filename, write_csv_file};
use crate::models::ProductRecord;
use crate::scrapers::DarazScraper;

const PREVIEW_ROWS: usize = 3;
const PREVIEW_TITLE_WIDTH: usize = 50;

#[derive(Debug, Default, Args)]
pub struct ScrapeArgs {
    /// Category slug, e.g. mobile-cases-covers
    pub category: Option<String>,
    /// First listing page
    #[arg(short, long)]
    pub start_page: Option<u32>,
    /// Last listing page (inclusive)
    #[arg(short, long)]
    pub end_page: Option<u32>,
    /// Fetch pages over plain HTTP instead of rendering them in Chrome
    #[arg(long)]
    pub no_browser: bool,
    /// CSV output path (default: daraz_<category>_p<start>-<end>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Scrape a category to CSV. Errors are printed, never returned.
pub async fn cmd_scrape(config_path: Option<&Path>, args: ScrapeArgs) -> anyhow::Result<()> {
    println!("{}", style("Daraz Nepal Product Scraper (CLI Mode)").bold());
    println!("{}", "=".repeat(40));

    if let Err(e) = scrape(config_path, args).await {
        eprintln!("\n{} Error: {:#}", style("✗").red(), e);
    }
    Ok(())
}

/// What to scrape, once every prompt has been answered.
struct ScrapeJob {
    category: String,
    start_page: u32,
    end_page: u32,
    use_browser: bool,
    output: Option<PathBuf>,
}

async fn scrape(config_path: Option<&Path>, args: ScrapeArgs) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;

    let setup = async {
        let job = read_job(args).await?;
        println!(
            "\n{} Scraping {} from page {} to {}...",
            style("→").cyan(),
            job.category,
            job.start_page,
            job.end_page
        );
        let scraper = DarazScraper::new(&config, job.use_browser).await?;
        anyhow::Ok((job, scraper))
    };
    let (job, mut scraper) = match interruptible(setup, interrupt_signal()).await {
        Some(setup) => setup?,
        None => {
            print_interrupted();
            // A prompt may still be blocked on stdin; don't wait for it.
            std::process::exit(0);
        }
    };

    if !scraper.browser_active() && job.use_browser && config.browser.enabled {
        println!(
            "  {} Browser unavailable, fetching pages over plain HTTP",
            style("!").yellow()
        );
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Scraping {}...", job.category));
    pb.enable_steady_tick(Duration::from_millis(120));

    let products = interruptible(
        scraper.scrape_category(&job.category, job.start_page, job.end_page),
        interrupt_signal(),
    )
    .await;
    pb.finish_and_clear();
    scraper.close().await;

    let Some(products) = products else {
        print_interrupted();
        return Ok(());
    };

    if products.is_empty() {
        println!("{} No products were scraped.", style("✗").red());
        return Ok(());
    }

    let path = job.output.unwrap_or_else(|| {
        PathBuf::from(csv_filename(&job.category, job.start_page, job.end_page))
    });
    write_csv_file(&path, &products)?;

    println!(
        "\n{} Successfully scraped {} products!",
        style("✓").green(),
        products.len()
    );
    println!("  Saved to: {}", style(path.display()).cyan());
    println!("\n{}", style("Sample products:").bold());
    print!("{}", format_preview(&products));

    Ok(())
}

/// Fill in whatever the command line left out by prompting.
async fn read_job(args: ScrapeArgs) -> anyhow::Result<ScrapeJob> {
    let category = match args.category {
        Some(category) => category.trim().to_string(),
        None => prompt("Enter category (e.g., mobile-cases-covers): ").await?,
    };
    if category.is_empty() {
        bail!("A category is required");
    }
    let start_page = match args.start_page {
        Some(page) => page,
        None => parse_page_input(&prompt("Enter start page (default 1): ").await?)?,
    };
    let end_page = match args.end_page {
        Some(page) => page,
        None => parse_page_input(&prompt("Enter end page (default 1): ").await?)?,
    };

    Ok(ScrapeJob {
        category,
        start_page,
        end_page,
        use_browser: !args.no_browser,
        output: args.output,
    })
}

/// Run `task` unless `signal` fires first.
async fn interruptible<T>(
    task: impl Future<Output = T>,
    signal: impl Future<Output = ()>,
) -> Option<T> {
    tokio::select! {
        output = task => Some(output),
        _ = signal => None,
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_interrupted() {
    println!("\n\n{} Scraping interrupted by user", style("■").yellow());
}

async fn prompt(message: &'static str) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
        let term = Term::stdout();
        term.write_str(message)?;
        term.flush()?;
        Ok(term.read_line()?.trim().to_string())
    })
    .await?
}

/// Parse a page number typed at a prompt. Blank input means page 1.
fn parse_page_input(input: &str) -> anyhow::Result<u32> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(1);
    }
    match input.parse::<u32>() {
        Ok(0) | Err(_) => bail!("Invalid page number: {:?}", input),
        Ok(page) => Ok(page),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Title, price and rating of the first few products as a text table.
fn format_preview(products: &[ProductRecord]) -> String {
    let rows: Vec<(String, &str, &str)> = products
        .iter()
        .take(PREVIEW_ROWS)
        .map(|p| {
            (
                truncate(&p.title, PREVIEW_TITLE_WIDTH),
                p.price.as_str(),
                p.rating.as_str(),
            )
        })
        .collect();

    let title_width = rows
        .iter()
        .map(|(title, _, _)| title.chars().count())
        .max()
        .unwrap_or(0)
        .max("title".len());
    let price_width = rows
        .iter()
        .map(|(_, price, _)| price.chars().count())
        .max()
        .unwrap_or(0)
        .max("price".len());

    let mut out = format!(
        "{:<tw$}  {:<pw$}  rating\n",
        "title",
        "price",
        tw = title_width,
        pw = price_width
    );
    for (title, price, rating) in rows {
        out.push_str(&format!(
            "{:<tw$}  {:<pw$}  {}\n",
            title,
            price,
            rating,
            tw = title_width,
            pw = price_width
        ));
    }
    out
}
