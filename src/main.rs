mod completion;
mod fetcher;
mod parser;
mod prompt;
mod review;
mod settings;

use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::completion::GeminiEngine;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::parser::{Headings, ReviewSections};
use crate::prompt::Language;
use crate::review::{ReviewRequest, ReviewResponse};
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "portfolio_review", about = "Two-part teacher reviews of student portfolios")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a portfolio, ask the model for a review, print both sections
    Review {
        #[command(flatten)]
        target: Target,
        /// Strength the teacher ticked (repeatable)
        #[arg(long = "strength")]
        strengths: Vec<String>,
        /// Weakness the teacher ticked (repeatable)
        #[arg(long = "weakness")]
        weaknesses: Vec<String>,
        /// Print the JSON envelope instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Split and clean saved model output (stdin when no files are given)
    Split {
        files: Vec<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Language::Vi)]
        language: Language,
        /// Skip normalization, print sections with their headings
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print the text extracted from a page
    Fetch {
        #[arg(long)]
        url: String,
    },
    /// Print the prompt a review would send
    Prompt {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Portfolio URL
    #[arg(long)]
    url: String,
    /// Student name (optional)
    #[arg(long)]
    student_name: Option<String>,
    #[arg(short, long, value_enum, default_value_t = Language::Vi)]
    language: Language,
}

impl Target {
    fn into_request(self, strengths: Vec<String>, weaknesses: Vec<String>) -> ReviewRequest {
        ReviewRequest {
            url: self.url,
            student_name: self.student_name,
            language: self.language,
            strengths,
            weaknesses,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Review {
            target,
            strengths,
            weaknesses,
            json,
        } => {
            let request = target.into_request(strengths, weaknesses);
            match run_review(&request, &settings).await {
                Ok(sections) if json => {
                    print_json(&ReviewResponse::success(sections))?;
                    Ok(())
                }
                Ok(sections) => {
                    print_sections(&sections);
                    Ok(())
                }
                Err(e) if json => {
                    print_json(&ReviewResponse::failure(&e))?;
                    std::process::exit(2);
                }
                Err(e) => Err(e),
            }
        }
        Commands::Split {
            files,
            language,
            raw,
            json,
        } => split_inputs(&files, language, raw, json),
        Commands::Fetch { url } => {
            let fetcher = HttpFetcher::new(&settings)?;
            let text = fetcher.fetch(&url).await?;
            println!("{}", text);
            Ok(())
        }
        Commands::Prompt { target } => {
            let request = target.into_request(Vec::new(), Vec::new());
            let fetcher = HttpFetcher::new(&settings)?;
            let prompt =
                review::prepare_prompt(&request, &fetcher, settings.page_char_limit).await?;
            println!("{}", prompt);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }

    result
}

async fn run_review(request: &ReviewRequest, settings: &Settings) -> Result<ReviewSections> {
    use indicatif::{ProgressBar, ProgressStyle};

    let fetcher = HttpFetcher::new(settings)?;
    let engine = GeminiEngine::new(settings)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?,
    );
    spinner.set_message(format!("Reviewing {} with {}", request.url, engine.model()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = review::run(request, &fetcher, &engine, settings.page_char_limit).await;
    spinner.finish_and_clear();
    result
}

struct SplitOutput {
    source: String,
    section1: String,
    section2: String,
}

fn split_inputs(files: &[PathBuf], language: Language, raw: bool, json: bool) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let headings = Headings::for_language(language);

    if files.is_empty() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        let out = structure_one("-".to_string(), &text, &headings, raw);
        return print_outputs(&[out], json);
    }

    let inputs = files
        .iter()
        .map(|p| {
            std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))
                .map(|text| (p.display().to_string(), text))
        })
        .collect::<Result<Vec<_>>>()?;

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    // Each input is independent; the parser holds no shared state.
    let outputs: Vec<SplitOutput> = inputs
        .into_par_iter()
        .map(|(source, text)| {
            let out = structure_one(source, &text, &headings, raw);
            pb.inc(1);
            out
        })
        .collect();
    pb.finish_and_clear();

    info!("Split {} files", outputs.len());
    print_outputs(&outputs, json)
}

fn structure_one(source: String, text: &str, headings: &Headings, raw: bool) -> SplitOutput {
    let (section1, section2) = if raw {
        let split = parser::sections::split(text, headings);
        (split.section1, split.section2)
    } else {
        let sections = parser::structure(text, headings);
        (sections.section1, sections.section2)
    };
    SplitOutput {
        source,
        section1,
        section2,
    }
}

fn print_outputs(outputs: &[SplitOutput], json: bool) -> Result<()> {
    if json {
        let values: Vec<_> = outputs
            .iter()
            .map(|o| {
                serde_json::json!({
                    "source": o.source,
                    "ok": true,
                    "section1": o.section1,
                    "section2": o.section2,
                })
            })
            .collect();
        let value = match values.as_slice() {
            [single] => single.clone(),
            _ => serde_json::Value::Array(values),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for (i, o) in outputs.iter().enumerate() {
        if outputs.len() > 1 {
            if i > 0 {
                println!();
            }
            println!("==> {} <==", o.source);
        }
        print_sections(&ReviewSections {
            section1: o.section1.clone(),
            section2: o.section2.clone(),
        });
    }
    Ok(())
}

fn print_sections(sections: &ReviewSections) {
    println!("--- Section 1 ---");
    println!("{}", sections.section1);
    println!("\n--- Section 2 ---");
    println!("{}", sections.section2);
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
