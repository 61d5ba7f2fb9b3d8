mod ai;
mod batch;
mod models;
mod scrape;

use ai::{EXTRACTION_MODEL, GroqProvider, JobExtractor};
use anyhow::{Context, Result};
use batch::{parse_url_list, run_batch};
use clap::{Parser, Subcommand};
use models::JobAnalysis;
use scrape::{DEFAULT_MAX_CHARS, Fetch, PageFetcher, clean_page_text};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "headhunter")]
#[command(about = "Turn job postings into structured AI analyses")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single job posting URL
    Analyze {
        /// URL of the job posting
        url: String,

        /// Maximum characters of page text sent to the model
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,
    },

    /// Analyze a batch of URLs and compare them (market scan)
    Scan {
        /// File with one URL per line; reads stdin when omitted
        file: Option<PathBuf>,

        /// Maximum characters of page text sent to the model
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing credential halts here, before any network activity.
    let provider = GroqProvider::new(EXTRACTION_MODEL.to_string())?;
    let extractor = JobExtractor::new(Box::new(provider))?;
    let fetcher = PageFetcher::new()?;

    match cli.command {
        Commands::Analyze { url, max_chars } => {
            println!("Fetching {}...", url);
            let markup = match fetcher.fetch(&url) {
                Ok(markup) => markup,
                Err(e) => {
                    println!("Could not fetch {}: {}", url, e);
                    return Ok(());
                }
            };

            let text = clean_page_text(&markup, max_chars);
            println!("Analyzing with {}...", extractor.model_name());
            match extractor.extract(&text) {
                Ok(analysis) => print_analysis(&analysis),
                Err(e) => println!("Extraction failed: {}", e),
            }
        }

        Commands::Scan { file, max_chars } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read URL list: {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read URLs from stdin")?;
                    buffer
                }
            };

            let urls = parse_url_list(&input);
            if urls.is_empty() {
                println!("No URLs provided.");
                return Ok(());
            }

            println!("Scanning {} job posting(s)...", urls.len());
            let report = run_batch(&fetcher, &extractor, &urls, max_chars, |done, total| {
                println!("  [{}/{}] processed", done, total);
            });

            if report.rows.is_empty() {
                println!("\nNo postings could be analyzed.");
            } else {
                println!();
                println!(
                    "{:<28} {:<18} {:<14} {:<30} {:>5}",
                    "ROLE", "COMPANY", "SENIORITY", "TECH", "SCORE"
                );
                println!("{}", "-".repeat(98));
                for row in &report.rows {
                    println!(
                        "{:<28} {:<18} {:<14} {:<30} {:>5}",
                        truncate(&row.role, 26),
                        truncate(&row.company, 16),
                        row.seniority.to_string(),
                        truncate(&row.tech_stack.join(", "), 28),
                        row.score
                    );
                }

                println!("\nSeniority breakdown:");
                for (level, count) in report.seniority_breakdown() {
                    println!("  {:<14} {}", level.to_string(), count);
                }
            }

            if !report.failures.is_empty() {
                println!("\nSkipped {} URL(s):", report.failures.len());
                for failure in &report.failures {
                    println!("  {} ({})", failure.url, failure.reason);
                }
            }
        }
    }

    Ok(())
}

fn print_analysis(analysis: &JobAnalysis) {
    println!();
    println!("{}", analysis.role_title);
    println!(
        "Company: {} | Level: {}",
        analysis.company_name, analysis.seniority
    );

    match &analysis.salary_range {
        Some(salary) => println!(
            "Salary: {} - {} {} ({})",
            salary.min, salary.max, salary.currency, salary.frequency
        ),
        None => println!("Salary: not specified"),
    }

    let location = &analysis.job_location;
    println!("Location: {}, {}", location.city, location.country);
    println!(
        "Remote: {} ({})",
        if location.is_remote { "yes" } else { "no" },
        location.office_details
    );
    println!("Quality score: {}/100", analysis.match_score);

    println!("\nSummary: {}", analysis.summary);

    if analysis.tech_stack.is_empty() {
        println!("\nTech stack: none identified");
    } else {
        println!("\nTech stack: {}", analysis.tech_stack.join(", "));
    }

    if !analysis.red_flags.is_empty() {
        println!("\nRed flags:");
        for flag in &analysis.red_flags {
            println!("  [{}] {}", flag.severity, flag.category);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
