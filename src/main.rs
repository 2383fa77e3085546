use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use database::{organized_export_path, write_posts, Database, ExportFormat, ResultFilter};
use reddit_client::RedditSearcher;
use std::path::{Path, PathBuf};
use text_analytics::{
    format_results_for_display, generate_text_report, Analyzer, ReportLimits, NO_RESULTS_MESSAGE,
};
use threadscope_core::{AppConfig, ErrorReporter, Post, Timeframe};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "threadscope=info,reddit_client=info,text_analytics=info,database=info";

#[derive(Parser)]
#[command(name = "threadscope")]
#[command(about = "Search Reddit discussions and summarise what people are saying")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not log recoverable fetch failures
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search Reddit, store the results and print an analysis
    Search {
        /// Keyword to search for
        #[arg(short, long)]
        keyword: String,
        /// week, month, year or all
        #[arg(short, long, default_value = "week")]
        timeframe: Timeframe,
        /// Maximum number of posts to keep
        #[arg(short, long)]
        limit: Option<usize>,
        /// Export format (json or csv)
        #[arg(short, long)]
        output: Option<ExportFormat>,
        /// Export file name, placed in the results directory
        #[arg(short, long)]
        filename: Option<String>,
        /// Print the quick word-count report instead of the full analysis
        #[arg(long)]
        quick: bool,
    },
    /// Print a report over previously stored results
    Report {
        /// Stored search term
        #[arg(short, long)]
        keyword: String,
        /// Only results from this window
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },
    /// Export stored results to a file
    Export {
        /// Only results stored for this search term
        #[arg(short, long)]
        keyword: Option<String>,
        /// Export format (json or csv)
        #[arg(short, long, default_value = "json")]
        output: ExportFormat,
        /// Export file name, placed in the results directory
        #[arg(short, long)]
        filename: Option<String>,
    },
    /// Show recent searches
    History {
        /// Number of searches to show
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
    /// Delete stored results
    Clear {
        /// Only results stored for this search term
        #[arg(short, long)]
        keyword: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let mut db = Database::new(config.storage.database_url.clone());
    db.connect()
        .await
        .with_context(|| format!("Failed to open {}", config.storage.database_url))?;
    db.run_migrations()
        .await
        .context("Failed to prepare database")?;

    let outcome = match cli.command {
        Commands::Search {
            keyword,
            timeframe,
            limit,
            output,
            filename,
            quick,
        } => {
            let options = SearchOptions {
                keyword,
                timeframe,
                limit,
                output,
                filename,
                quick,
            };
            run_search(&config, &db, options, cli.quiet).await
        }
        Commands::Report { keyword, timeframe } => {
            run_report(&config, &db, &keyword, timeframe).await
        }
        Commands::Export {
            keyword,
            output,
            filename,
        } => {
            let path = export_path(
                &config.storage.results_dir,
                keyword.as_deref(),
                filename.as_deref(),
                output,
            );
            match db.export_results(keyword.as_deref(), output, &path).await {
                Ok(count) => {
                    println!("Exported {} results to {}", count, path.display());
                    Ok(())
                }
                Err(e) => Err(e).with_context(|| format!("Failed to export to {}", path.display())),
            }
        }
        Commands::History { limit } => {
            run_history(&db, limit.unwrap_or(config.storage.history_limit)).await
        }
        Commands::Clear { keyword } => {
            let removed = db.clear_results(keyword.as_deref()).await?;
            println!("Removed {} stored results.", removed);
            Ok(())
        }
    };

    db.close().await;
    outcome
}

struct SearchOptions {
    keyword: String,
    timeframe: Timeframe,
    limit: Option<usize>,
    output: Option<ExportFormat>,
    filename: Option<String>,
    quick: bool,
}

async fn run_search(
    config: &AppConfig,
    db: &Database,
    options: SearchOptions,
    quiet: bool,
) -> Result<()> {
    let reporter = ErrorReporter::new().with_warning_reporting(!quiet);
    let searcher = RedditSearcher::from_config(&config.reddit)
        .context("Failed to build Reddit client")?
        .with_reporter(reporter);

    tracing::info!(
        "Searching for '{}' ({})",
        options.keyword,
        options.timeframe
    );
    let mut posts = searcher.search(&options.keyword, options.timeframe).await;
    if let Some(limit) = options.limit {
        posts.truncate(limit);
    }

    let metrics = searcher.metrics().await;
    tracing::debug!(
        "{} requests, {} failed, average {:?}",
        metrics.total_requests,
        metrics.failed_requests,
        metrics.average_response_time
    );

    db.save_search(&options.keyword, options.timeframe).await?;
    if posts.is_empty() {
        println!("{}", NO_RESULTS_MESSAGE);
        return Ok(());
    }
    db.save_results(&posts, &options.keyword).await?;

    print_listing(config, &posts);

    let analyzer = Analyzer::from_config(&config.analysis);
    if options.quick {
        let analysis = analyzer.analyze_results(&posts);
        println!(
            "{}",
            generate_text_report(&analysis, &options.keyword, report_limits(config))
        );
    } else {
        let processed = analyzer.process_results(&posts, &options.keyword);
        println!("{}", processed.narrative());
    }

    if let Some(format) = options.output {
        let path = export_path(
            &config.storage.results_dir,
            Some(options.keyword.as_str()),
            options.filename.as_deref(),
            format,
        );
        write_posts(&posts, format, &path)
            .with_context(|| format!("Failed to export to {}", path.display()))?;
        println!("Results exported to {}", path.display());
    }
    Ok(())
}

async fn run_report(
    config: &AppConfig,
    db: &Database,
    keyword: &str,
    timeframe: Option<Timeframe>,
) -> Result<()> {
    let mut filter = ResultFilter::for_term(keyword).with_limit(config.storage.results_limit);
    if let Some(timeframe) = timeframe {
        filter = filter.with_timeframe(timeframe);
    }

    let posts = db.get_results(&filter).await?;
    if posts.is_empty() {
        println!("No stored results for '{}'.", keyword);
        return Ok(());
    }

    let analysis = Analyzer::from_config(&config.analysis).analyze_results(&posts);
    println!(
        "{}",
        generate_text_report(&analysis, keyword, report_limits(config))
    );
    Ok(())
}

async fn run_history(db: &Database, limit: u32) -> Result<()> {
    let history = db.get_search_history(limit).await?;
    if history.is_empty() {
        println!("No searches yet.");
        return Ok(());
    }
    for record in history {
        println!(
            "{}  {:<6} {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.timeframe,
            record.search_term
        );
    }
    Ok(())
}

fn print_listing(config: &AppConfig, posts: &[Post]) {
    let rows = format_results_for_display(posts, config.analysis.display_content_chars);
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{}. {} [{} | {} | {}]",
            i + 1,
            row.title,
            row.source,
            row.community,
            row.date.format("%Y-%m-%d")
        );
        println!("   {}", row.url);
        if !row.content.is_empty() {
            println!("   {}", row.content);
        }
        let comments = row.full_result.total_comments();
        if comments > 0 {
            println!("   {} comments", comments);
        }
    }
    println!();
}

fn report_limits(config: &AppConfig) -> ReportLimits {
    ReportLimits {
        words: config.analysis.report_words,
        phrases: config.analysis.report_phrases,
    }
}

/// An explicit file name lands directly in the results directory; otherwise
/// the dated layout is used.
fn export_path(
    results_dir: &Path,
    keyword: Option<&str>,
    filename: Option<&str>,
    format: ExportFormat,
) -> PathBuf {
    match filename.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            let path = results_dir.join(name);
            if path.extension().is_some() {
                path
            } else {
                path.with_extension(format.extension())
            }
        }
        None => organized_export_path(results_dir, keyword, Utc::now(), format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_path_with_filename() {
        let dir = Path::new("results");
        assert_eq!(
            export_path(dir, Some("rust"), Some("mine"), ExportFormat::Csv),
            Path::new("results/mine.csv")
        );
        assert_eq!(
            export_path(dir, Some("rust"), Some("mine.txt"), ExportFormat::Json),
            Path::new("results/mine.txt")
        );
    }

    #[test]
    fn test_export_path_defaults_to_dated_layout() {
        let path = export_path(Path::new("results"), Some("rust"), None, ExportFormat::Json);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("rust_"));
        assert!(name.ends_with(".json"));

        let path = export_path(Path::new("results"), None, None, ExportFormat::Csv);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("all_results_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_cli_parses_export() {
        let cli = Cli::try_parse_from(["threadscope", "export", "-o", "csv", "--quiet"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Export {
                keyword,
                output,
                filename,
            } => {
                assert_eq!(keyword, None);
                assert_eq!(output, ExportFormat::Csv);
                assert_eq!(filename, None);
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from([
            "threadscope",
            "search",
            "-k",
            "rust",
            "-t",
            "month",
            "-o",
            "csv",
            "--quick",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                keyword,
                timeframe,
                output,
                quick,
                ..
            } => {
                assert_eq!(keyword, "rust");
                assert_eq!(timeframe, Timeframe::Month);
                assert_eq!(output, Some(ExportFormat::Csv));
                assert!(quick);
            }
            _ => panic!("expected search"),
        }
        assert!(Cli::try_parse_from(["threadscope", "search", "-k", "x", "-o", "xml"]).is_err());
    }
}
