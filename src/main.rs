// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, to stderr)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the subcommand handler (site crawl or search)
// 4. Save results, optionally send them to Telegram
// 5. Exit with a code: 0 = done, 1 = results saved but delivery failed,
//    2 = error
// =============================================================================

mod cli;
mod config;
mod crawl;
mod error;
mod matcher;
mod output;
mod search;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TelegramArgs};
use config::{CrawlConfig, SearchConfig, TelegramConfig};
use crawl::{CrawlReport, Crawler};
use output::{write_csv, write_summary, Notifier, SeenStore, TelegramNotifier};
use search::{GoogleSearch, SearchHit};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_OK: i32 = 0;
const EXIT_DELIVERY_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

// Keywords longer than this are cut when used in file names
const MAX_FILE_KEYWORD_CHARS: usize = 40;

// First line of the Telegram message listing new search results
const NEW_RESULTS_HEADER: &str = "New results found!\n\n";

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,html5ever=error,selectors=error,hyper=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Site {
            start_url,
            keyword,
            output,
            max_pages,
            delay,
            timeout,
            retries,
            json,
            telegram,
        } => {
            let config = CrawlConfig {
                request_timeout: Duration::from_secs(timeout),
                max_retries: retries,
                default_delay: seconds(delay, "--delay")?,
                max_pages: max_pages.map(|n| n as usize),
                ..CrawlConfig::default()
            };
            handle_site_crawl(config, &start_url, &keyword, &output, json, &telegram).await
        }
        Commands::Search {
            keywords,
            results,
            output_prefix,
            page_delay,
            community_only,
            seen_file,
            api_key,
            cx,
            telegram,
        } => {
            let config = SearchConfig {
                page_delay: seconds(page_delay, "--page-delay")?,
                community_only,
                ..SearchConfig::new(api_key, cx)
            };
            handle_search(
                config,
                &keywords,
                results,
                &output_prefix,
                seen_file.as_deref(),
                &telegram,
            )
            .await
        }
    }
}

// Handles the 'site' subcommand
async fn handle_site_crawl(
    config: CrawlConfig,
    start_url: &str,
    keyword: &str,
    output: &Path,
    json: bool,
    telegram: &TelegramArgs,
) -> Result<i32> {
    // Fail on missing credentials before spending time crawling
    let notifier = build_notifier(telegram)?;

    let crawler = Crawler::new(config)?;
    let report = crawler.run(start_url, keyword).await?;

    print_report(&report, json)?;

    // The matches are already on stdout, so a write failure loses nothing
    if let Err(e) = write_csv(output, &report.matches) {
        error!("Could not save results to {}: {}", output.display(), e);
        return Ok(EXIT_ERROR);
    }

    let Some(notifier) = notifier else {
        return Ok(EXIT_OK);
    };

    let delivery = if report.matches.is_empty() {
        let message = format!("No pages containing '{}' found on {}", keyword, report.start_url);
        notifier.send_message(&message).await
    } else {
        let caption = format!("Crawl results for: {}", keyword);
        notifier.send_file(output, Some(&caption)).await
    };

    match delivery {
        Ok(()) => Ok(EXIT_OK),
        Err(e) => {
            error!("Telegram delivery failed: {}", e);
            Ok(EXIT_DELIVERY_FAILED)
        }
    }
}

// Handles the 'search' subcommand
//
// Each keyword is handled on its own: a failed search or delivery for one
// keyword is logged and the next keyword still runs.
//
// With a seen file, only results that are not in it are saved and reported,
// and Telegram gets a single message list of them at the end instead of one
// CSV per keyword.
async fn handle_search(
    config: SearchConfig,
    keywords: &[String],
    results_per_keyword: usize,
    output_prefix: &str,
    seen_file: Option<&Path>,
    telegram: &TelegramArgs,
) -> Result<i32> {
    let notifier = build_notifier(telegram)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()?;
    let search = GoogleSearch::new(client, config);

    // An unreadable seen file would make us report everything again
    let mut seen = match seen_file {
        Some(path) => Some(
            SeenStore::load(path)
                .with_context(|| format!("could not read {}", path.display()))?,
        ),
        None => None,
    };
    let mut new_hits: Vec<SearchHit> = Vec::new();

    let mut exit_code = EXIT_OK;

    for keyword in keywords {
        info!("Searching: {}", keyword);

        let hits = match search.search(keyword, results_per_keyword).await {
            Ok(hits) => hits,
            Err(e) => {
                error!("Search for '{}' failed: {}", keyword, e);
                exit_code = EXIT_ERROR;
                continue;
            }
        };

        let hits = match seen.as_mut() {
            Some(store) => {
                let total = hits.len();
                let fresh = store.retain_new(hits);
                info!("'{}': {} of {} result(s) are new", keyword, fresh.len(), total);
                fresh
            }
            None => hits,
        };

        let base = output_base_name(output_prefix, keyword);
        let csv_path = PathBuf::from(format!("{}.csv", base));
        let txt_path = PathBuf::from(format!("{}.txt", base));

        if let Err(e) = write_csv(&csv_path, &hits).and_then(|_| write_summary(&txt_path, &hits)) {
            error!("Could not save results for '{}': {}", keyword, e);
            exit_code = EXIT_ERROR;
            continue;
        }
        println!(
            "📄 {}: {} result(s) -> {}, {}",
            keyword,
            hits.len(),
            csv_path.display(),
            txt_path.display()
        );

        if let Some(store) = &seen {
            // Only remembered once they are safely on disk
            if let Err(e) = store.append(&hits) {
                error!("Could not update the seen file: {}", e);
                exit_code = EXIT_ERROR;
            }
            new_hits.extend(hits);
            continue;
        }

        if let Some(notifier) = &notifier {
            let caption = format!("Search results for: {}", keyword);
            if let Err(e) = notifier.send_file(&csv_path, Some(&caption)).await {
                warn!("Telegram delivery for '{}' failed: {}", keyword, e);
                if exit_code == EXIT_OK {
                    exit_code = EXIT_DELIVERY_FAILED;
                }
            }
        }
    }

    if seen.is_some() {
        println!("🆕 New results: {}", new_hits.len());

        // Nothing new means nothing to send
        if let Some(notifier) = notifier.as_ref().filter(|_| !new_hits.is_empty()) {
            let entries = message_entries(&new_hits);
            if let Err(e) = notifier.send_chunked(NEW_RESULTS_HEADER, &entries).await {
                warn!("Telegram delivery of new results failed: {}", e);
                if exit_code == EXIT_OK {
                    exit_code = EXIT_DELIVERY_FAILED;
                }
            }
        }
    }

    Ok(exit_code)
}

// One "title\nlink\n\n" block per hit, the unit the message is split on
fn message_entries(hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .map(|hit| format!("{}\n{}\n\n", hit.title, hit.link))
        .collect()
}

// Builds the Telegram notifier if --notify was given
fn build_notifier(args: &TelegramArgs) -> Result<Option<TelegramNotifier>> {
    if !args.notify {
        return Ok(None);
    }

    let (Some(token), Some(chat)) = (&args.telegram_token, &args.telegram_chat) else {
        return Err(anyhow!(
            "--notify needs --telegram-token and --telegram-chat (or TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID)"
        ));
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    Ok(Some(TelegramNotifier::new(
        client,
        TelegramConfig::new(token.clone(), chat.clone()),
    )))
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {} value: {}", flag, value))
}

// "tm 구인" -> "<prefix>_tm_구인", keyword cut to 40 characters
fn output_base_name(prefix: &str, keyword: &str) -> String {
    let safe: String = keyword
        .replace(' ', "_")
        .chars()
        .take(MAX_FILE_KEYWORD_CHARS)
        .collect();
    format!("{}_{}", prefix, safe)
}

// Prints the matches either as a table or JSON
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

// Prints results as a human-readable table in the terminal
fn print_table(report: &CrawlReport) {
    println!("{:<60} {:<30} {}", "URL", "TITLE", "SNIPPET");
    println!("{}", "=".repeat(120));

    for found in &report.matches {
        println!(
            "{:<60} {:<30} {}",
            truncate(&found.url, 57),
            truncate(&found.title, 27),
            found.snippet
        );
    }

    println!();

    let stats = &report.stats;
    println!("📊 Summary:");
    println!("   🔎 Matches: {}", report.matches.len());
    println!("   📄 Pages fetched: {}", stats.pages_fetched);
    println!("   ❌ Failed: {}", stats.fetch_failures);
    println!("   🤖 Blocked by robots.txt: {}", stats.robots_skipped);
    println!("   📦 Not HTML: {}", stats.non_html);
    println!("   ↪️  Redirects: {}", stats.redirects);
    if stats.stopped_by_ceiling {
        println!("   ⏹️  Stopped at the page limit");
    }
}

// Cuts on a character boundary so multi-byte text never panics
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why do logs go to stderr?
//    - stdout carries the results (table or --json)
//    - Piping `keyword-crawler site ... --json | jq` keeps working
//
// 2. Why does a failed Telegram delivery return 1 instead of an error?
//    - The crawl itself worked and the CSV is on disk
//    - Scripts can still tell "nothing was sent" apart from "nothing was found"
//
// 3. Set RUST_LOG=debug to see every URL decision the crawler makes.
// -----------------------------------------------------------------------------
