// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - site: crawl one website for a keyword
// - search: ask a search API for each keyword and save the results
//
// Credentials can be passed as flags or through environment variables, so
// they never have to live in the source code or in shell history.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "keyword-crawler",
    version,
    about = "Find pages that mention a keyword",
    long_about = "keyword-crawler crawls a single website politely (robots.txt, crawl delay, \
                  retries) looking for a keyword, or collects search API results for a list \
                  of keywords. Results are saved as CSV and can be sent to a Telegram chat."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and record every page containing a keyword
    ///
    /// Example: keyword-crawler site https://www.clien.net/service/ --keyword rust
    Site {
        /// Start URL; only pages on the same host are crawled
        start_url: String,

        /// Keyword to look for (case-insensitive)
        #[arg(short, long)]
        keyword: String,

        /// CSV file to write matches to
        #[arg(short, long, default_value = "crawl_results.csv")]
        output: PathBuf,

        /// Stop after fetching this many pages
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_pages: Option<u64>,

        /// Seconds to wait between requests when robots.txt has no Crawl-delay
        #[arg(long, default_value_t = 1.0)]
        delay: f64,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Extra attempts for a failing page
        #[arg(long, default_value_t = 2)]
        retries: usize,

        /// Print matches as JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        telegram: TelegramArgs,
    },

    /// Search the web for each keyword and save the results
    ///
    /// Example: keyword-crawler search "rust jobs" "tm 구인" --results 20
    Search {
        /// Keywords to search for, one search per keyword
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Results to collect per keyword
        #[arg(long, default_value_t = 20)]
        results: usize,

        /// Files are written as <PREFIX>_<keyword>.csv and .txt
        #[arg(long, default_value = "google_search")]
        output_prefix: String,

        /// Seconds to wait between result pages
        #[arg(long, default_value_t = 1.0)]
        page_delay: f64,

        /// Exclude news and keep only bulletin-board links
        #[arg(long)]
        community_only: bool,

        /// Only report results not listed in this file, then add them to it.
        /// With --notify, the new results are sent as one message list.
        #[arg(long)]
        seen_file: Option<PathBuf>,

        /// Google Custom Search API key
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Google Custom Search engine id
        #[arg(long, env = "GOOGLE_CX")]
        cx: String,

        #[command(flatten)]
        telegram: TelegramArgs,
    },
}

/// Telegram delivery options shared by both subcommands
#[derive(Args, Debug)]
pub struct TelegramArgs {
    /// Send the result file to Telegram when done
    #[arg(long)]
    pub notify: bool,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat: Option<String>,
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. What does #[command(flatten)] do?
//    - It pulls the fields of TelegramArgs into the subcommand
//    - Both subcommands get --notify, --telegram-token and --telegram-chat
//      without repeating them
//
// 2. What does env = "..." do?
//    - If the flag is missing, clap reads the environment variable instead
//    - hide_env_values keeps secrets out of --help output
//
// 3. Why value_parser!(u64).range(1..)?
//    - A page ceiling of 0 makes no sense, so clap rejects it up front
//
// 4. Option<PathBuf> for --seen-file
//    - No flag means None: every result is reported, nothing is remembered
// -----------------------------------------------------------------------------
