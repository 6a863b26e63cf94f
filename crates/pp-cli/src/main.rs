use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use pp_core::normalizer::{check_input, parse_potentials_9};
use pp_core::plan::{apply_plan, parse_plan, WeeklyPlan};
use pp_core::prompt::{focus_messages, report_messages, Messages};
use pp_core::today::{daily_tasks, week_progress};
use pp_core::{Canon, Error, Profile, Result};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// pp: Personal Potentials CLI
///
/// Normalize potentials text, upgrade stored profiles, build prompts and
/// apply generated weekly plans.
#[derive(Parser)]
#[command(name = "pp", version, about, long_about = None)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse potentials text into nine labels
    Parse {
        /// Text file, or - for stdin
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the three-row summary
    Summary {
        /// Text file, or - for stdin
        file: PathBuf,
    },

    /// Print the markdown matrix table
    Table {
        /// Text file, or - for stdin
        file: PathBuf,
    },

    /// Print the pos1..pos9 mapping as JSON
    Positions {
        /// Text file, or - for stdin
        file: PathBuf,
    },

    /// Compute the matrix fingerprint (SHA-256)
    Hash {
        /// Text file, or - for stdin
        file: PathBuf,
    },

    /// Upgrade a stored profile to the current schema
    Migrate {
        /// Profile JSON file
        profile: PathBuf,
        /// Write here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Apply a generated weekly plan to a profile
    Plan {
        /// Profile JSON file
        profile: PathBuf,
        /// File with the generator's reply
        #[arg(long)]
        response: PathBuf,
        /// Write here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build the request body for the text-generation service
    Prompt {
        /// Profile JSON file
        profile: PathBuf,
        /// Which prompt to build
        #[arg(long, value_enum, default_value_t = PromptKind::Focus)]
        kind: PromptKind,
        /// Canon JSON (overrides config)
        #[arg(long)]
        canon: Option<PathBuf>,
        /// Model name (overrides config)
        #[arg(long)]
        model: Option<String>,
    },

    /// Show today's checklist and progress
    Today {
        /// Profile JSON file
        profile: PathBuf,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show progress for the week containing a date
    Week {
        /// Profile JSON file
        profile: PathBuf,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a generated report, or show the stored report's status
    Report {
        /// Profile JSON file
        profile: PathBuf,
        /// Markdown report to store
        #[arg(long)]
        store: Option<PathBuf>,
        /// Write here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum PromptKind {
    Focus,
    Report,
}

impl PromptKind {
    fn temperature(self) -> f64 {
        match self {
            PromptKind::Focus => 0.5,
            PromptKind::Report => 0.45,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            exit_code_for(&e)
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// 1 = the input was understood but rejected, 2 = I/O or setup failure
fn exit_code_for(e: &Error) -> i32 {
    match e {
        Error::Io(_) | Error::Config(_) => 2,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Parse { file, json } => {
            let config = Config::load(config_path)?;
            let nine = parse_potentials_9(&read_potentials(&file, &config)?);
            if json {
                println!("{}", to_json(&nine)?);
            } else {
                for (pos, label) in nine.as_slice().iter().enumerate() {
                    println!("{}. {}", pos + 1, label);
                }
            }
        }
        Commands::Summary { file } => {
            let config = Config::load(config_path)?;
            println!("{}", parse_potentials_9(&read_potentials(&file, &config)?).three_row_summary());
        }
        Commands::Table { file } => {
            let config = Config::load(config_path)?;
            println!("{}", parse_potentials_9(&read_potentials(&file, &config)?).markdown_table());
        }
        Commands::Positions { file } => {
            let config = Config::load(config_path)?;
            let nine = parse_potentials_9(&read_potentials(&file, &config)?);
            println!("{}", to_json(&nine.positions())?);
        }
        Commands::Hash { file } => {
            let config = Config::load(config_path)?;
            println!("{}", parse_potentials_9(&read_potentials(&file, &config)?).fingerprint());
        }
        Commands::Migrate { profile, out } => {
            let config = Config::load(config_path)?;
            let p = load_profile(&profile, &config)?;
            write_output(out.as_deref(), &p.to_json_pretty()?)?;
        }
        Commands::Plan {
            profile,
            response,
            out,
        } => {
            let config = Config::load(config_path)?;
            let mut p = load_profile(&profile, &config)?;
            let reply = fs::read_to_string(&response)?;
            let plan = match parse_plan(&reply) {
                Ok(plan) => plan,
                Err(Error::PlanParse(reason)) => {
                    tracing::warn!(%reason, "unusable plan reply");
                    eprintln!(
                        "{} could not read a plan from the reply ({}); using the default plan",
                        "warning:".yellow().bold(),
                        reason
                    );
                    WeeklyPlan::fallback()
                }
                Err(e) => return Err(e),
            };
            apply_plan(&mut p.realization, &plan);
            p.ensure_week_initialized(Local::now().date_naive());
            p.touch(Utc::now());
            write_output(out.as_deref(), &p.to_json_pretty()?)?;
            if out.is_some() {
                eprintln!(
                    "{} applied {} actions, focus: {}",
                    "✓".green().bold(),
                    plan.item_count(),
                    p.realization.weekly_focus
                );
            }
        }
        Commands::Prompt {
            profile,
            kind,
            canon,
            model,
        } => {
            let config = Config::load(config_path)?;
            let p = load_profile(&profile, &config)?;
            let messages = match kind {
                PromptKind::Focus => focus_messages(&p)?,
                PromptKind::Report => {
                    let canon = load_canon(canon.as_deref().or(config.canon_path.as_deref()))?;
                    report_messages(&p, &canon)?
                }
            };
            let model = model.unwrap_or(config.default_model);
            println!("{}", to_json(&request_body(&model, kind, &messages))?);
        }
        Commands::Today {
            profile,
            date,
            json,
        } => {
            let config = Config::load(config_path)?;
            let p = load_profile(&profile, &config)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            print_today(&p, date, json)?;
        }
        Commands::Week {
            profile,
            date,
            json,
        } => {
            let config = Config::load(config_path)?;
            let p = load_profile(&profile, &config)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let week = week_progress(&p, date);
            if json {
                println!("{}", to_json(&week)?);
            } else {
                println!("Неделя с {}", week.week_start);
                for (day, progress) in &week.days {
                    let mark = if progress.total > 0 && progress.done >= week.daily_target as usize {
                        "●".green().to_string()
                    } else {
                        "○".dimmed().to_string()
                    };
                    println!("  {} {}  {}/{}", mark, day, progress.done, progress.total);
                }
                let verdict = if week.goal_met() {
                    "цель недели выполнена".green().to_string()
                } else {
                    "цель недели пока не выполнена".yellow().to_string()
                };
                println!(
                    "Дней в цели: {} из {} ({})",
                    week.days_on_target, week.weekly_target_days, verdict
                );
            }
        }
        Commands::Report {
            profile,
            store,
            out,
        } => {
            let config = Config::load(config_path)?;
            let mut p = load_profile(&profile, &config)?;
            let nine = p.foundation.potentials();
            match store {
                Some(path) => {
                    let text = fs::read_to_string(&path)?;
                    if text.trim().is_empty() {
                        return Err(Error::MissingInput("report"));
                    }
                    p.library.store_report(&text, &nine, Utc::now());
                    p.touch(Utc::now());
                    write_output(out.as_deref(), &p.to_json_pretty()?)?;
                }
                None => {
                    let status = if !p.library.has_report() {
                        "missing".yellow()
                    } else if p.library.is_report_stale(&nine) {
                        "stale".yellow()
                    } else {
                        "current".green()
                    };
                    println!("Report: {}", status);
                    if p.library.has_report() {
                        println!("Updated: {}", p.library.extended_report_updated_at);
                    }
                }
            }
        }
        Commands::Version => {
            println!("pp {} (pp-core {})", env!("CARGO_PKG_VERSION"), pp_core::VERSION);
            println!("Profile schema: {}", pp_core::SCHEMA_ID);
        }
    }

    Ok(())
}

// ── Helpers ───────────────────────────────────────────────

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(fs::read_to_string(path)?)
}

fn read_potentials(path: &Path, config: &Config) -> Result<String> {
    let text = read_input(path)?;
    check_input(&text, config.max_input_chars)?;
    Ok(text)
}

fn load_profile(path: &Path, config: &Config) -> Result<Profile> {
    let p = Profile::from_json(&read_input(path)?, Utc::now())?;
    check_input(&p.foundation.potentials_table, config.max_input_chars)?;
    Ok(p)
}

fn load_canon(path: Option<&Path>) -> Result<Canon> {
    match path {
        Some(path) => Canon::from_json(&fs::read_to_string(path)?),
        None => {
            tracing::warn!("no canon configured, report excerpts will be empty");
            Ok(Canon::default())
        }
    }
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, format!("{}\n", text))?;
            tracing::info!("wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Schema(e.to_string()))
}

/// Chat-completion style request body
fn request_body(model: &str, kind: PromptKind, messages: &Messages) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "temperature": kind.temperature(),
        "messages": [
            {"role": "system", "content": messages.system},
            {"role": "user", "content": messages.user},
        ],
    })
}

fn print_today(p: &Profile, date: NaiveDate, json: bool) -> Result<()> {
    let tasks = daily_tasks(&p.realization);
    let record = p.day(date);
    let progress = record.progress(&tasks);

    if json {
        let items: Vec<serde_json::Value> = tasks
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.item.id,
                    "block": t.block_title,
                    "title": t.item.title,
                    "minutes": t.item.minutes,
                    "done": record.is_done(&t.item.id),
                })
            })
            .collect();
        let out = serde_json::json!({
            "date": date.to_string(),
            "tasks": items,
            "done": progress.done,
            "total": progress.total,
            "notes": record.notes,
        });
        println!("{}", to_json(&out)?);
        return Ok(());
    }

    println!("{}", date.to_string().bold());
    if tasks.is_empty() {
        println!("Пока нет daily-действий.");
        return Ok(());
    }
    for task in &tasks {
        let mark = if record.is_done(&task.item.id) {
            "[x]".green().to_string()
        } else {
            "[ ]".to_string()
        };
        println!(
            "  {} {} · {} мин  ({})",
            mark,
            task.item.title,
            task.item.minutes,
            task.block_title.dimmed()
        );
    }
    println!("Сделано: {} из {}", progress.done, progress.total);
    if !record.notes.trim().is_empty() {
        println!("Заметки: {}", record.notes.trim());
    }
    Ok(())
}
