use std::{
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use scrubline_core::{
    AnswerFragment, AskConfig, CredentialStore, HttpBackend, MediaBundle, Provider, StatusKind,
    Viewer, extract_transcription, format_position, format_seconds, parse_timestamp, read_bundle,
    resolve_credential,
    session::{CREDENTIAL_SAVED, PROCESSING},
};
use tracing_subscriber::EnvFilter;

mod render;

use render::{mask, render_answer, render_row};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "scrubline")]
#[command(
    about = "Browse a video's transcript, search it, and ask questions answered with clickable timestamps"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the transcript found next to a video
    View {
        /// Folder holding an .mp4/.webm video and a .json transcript
        dir: PathBuf,
    },

    /// Print only the transcript rows containing a term (case-insensitive)
    Search { dir: PathBuf, term: String },

    /// Jump to a time and print the row playing there
    Seek {
        dir: PathBuf,
        /// Seconds, MM:SS or HH:MM:SS[,mmm]
        timestamp: String,
    },

    /// Ask a question about the video, answered from its transcript
    Ask {
        dir: PathBuf,
        question: String,

        #[command(flatten)]
        config: AskArgs,
    },

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Copy the `transcription` array out of a transcript document
    Extract { input: PathBuf, output: PathBuf },
}

#[derive(Args)]
struct AskArgs {
    /// AI provider answering the question
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,

    /// Model name, defaults to the provider's
    #[arg(short, long, env = "SCRUBLINE_MODEL")]
    model: Option<String>,

    /// Chat-completions endpoint, defaults to the provider's
    #[arg(long, env = "SCRUBLINE_API_URL")]
    api_url: Option<String>,

    #[arg(long, default_value_t = 0.3)]
    temperature: f32,

    #[arg(long, default_value_t = 500)]
    max_tokens: u32,
}

impl From<AskArgs> for AskConfig {
    fn from(args: AskArgs) -> Self {
        AskConfig {
            provider: args.provider.into(),
            model: args.model,
            api_url: args.api_url,
            temperature: args.temperature,
            max_tokens: args.max_tokens,
        }
    }
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save an API key for later sessions
    Set { key: String },
    /// Show the stored key (masked) and where it lives
    Show,
    /// Forget the stored key
    Clear,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    process::exit(1);
}

fn print_status(viewer: &Viewer) {
    let status = viewer.status();
    match status.kind {
        StatusKind::Success => println!("{} {}", style("✓").green().bold(), status),
        StatusKind::Error => fail(status),
        StatusKind::Loading | StatusKind::None => {}
    }
}

async fn open(dir: &Path, credential: Option<String>) -> Viewer {
    let mut viewer = Viewer::new(credential);
    let bundle = MediaBundle::from_dir(dir).unwrap_or_else(|err| fail(err));

    let video = bundle.video.clone();
    viewer.finish_load(read_bundle(bundle).await);
    print_status(&viewer);
    println!(
        "{} {}",
        style("Video:").dim(),
        style(video.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());
    viewer
}

fn print_rows(viewer: &Viewer) {
    let active = viewer.view().active();
    for row in viewer.view().visible_rows() {
        println!("{}", render_row(row, active == Some(row.index)));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::View { dir } => {
            let viewer = open(&dir, None).await;
            print_rows(&viewer);
        }

        Command::Search { dir, term } => {
            let mut viewer = open(&dir, None).await;
            viewer.search(&term);
            print_rows(&viewer);
            println!(
                "\n{} {} of {} segments match {}",
                style("Search:").dim(),
                style(viewer.view().visible_rows().count()).cyan().bold(),
                viewer.view().len(),
                style(format!("\"{}\"", term)).yellow()
            );
        }

        Command::Seek { dir, timestamp } => {
            let mut viewer = open(&dir, None).await;
            let seconds = parse_timestamp(&timestamp);
            let nav = viewer.seek_to(seconds);
            println!(
                "{} {}",
                style("Playback:").dim(),
                format_position(viewer.playback().position(), viewer.playback().is_playing())
            );
            match nav.highlighted.and_then(|i| viewer.view().rows().get(i)) {
                Some(row) => println!("{}", render_row(row, true)),
                None => println!("{}", style("No segment covers that time.").dim()),
            }
        }

        Command::Ask {
            dir,
            question,
            config,
        } => {
            let config: AskConfig = config.into();
            let stored = CredentialStore::open_default()
                .and_then(|store| store.load())
                .unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "could not read stored credential");
                    None
                });
            let credential = resolve_credential(stored, &config.provider);

            let mut viewer = open(&dir, credential).await;
            let pending = match viewer.begin_ask(&question) {
                Ok(pending) => pending,
                Err(err) => fail(err),
            };

            let spinner = create_spinner(&format!("{} ({})", PROCESSING, config.provider.name()));
            let outcome = pending.send(&HttpBackend::default(), &config).await;
            viewer.finish_ask(outcome);
            spinner.finish_and_clear();
            print_status(&viewer);

            let fragments = viewer.answer().map(<[_]>::to_vec).unwrap_or_default();
            println!("\n{}\n", render_answer(&fragments));

            let cited: Vec<usize> = fragments
                .iter()
                .enumerate()
                .filter(|(_, f)| matches!(f, AnswerFragment::Citation { .. }))
                .map(|(i, _)| i)
                .collect();
            if !cited.is_empty() {
                println!("{}", style("─".repeat(60)).dim());
                println!("{}", style("Citations").bold());
            }
            for (n, index) in cited.into_iter().enumerate() {
                let AnswerFragment::Citation { label, .. } = &fragments[index] else {
                    continue;
                };
                let nav = viewer.click_citation(index);
                let target = nav
                    .seek
                    .map(format_seconds)
                    .unwrap_or_else(|| "--".to_string());
                let row = nav
                    .highlighted
                    .and_then(|i| viewer.view().rows().get(i))
                    .map(|row| row.plain.clone())
                    .unwrap_or_else(|| style("no matching segment").dim().to_string());
                println!(
                    "{:>3}. {} → {}  {}",
                    n + 1,
                    style(label).yellow(),
                    style(target).cyan(),
                    row
                );
            }
        }

        Command::Key { action } => {
            let store = CredentialStore::open_default()?;
            match action {
                KeyAction::Set { key } => match store.save(&key) {
                    Ok(_) => println!("{} {}", style("✓").green().bold(), CREDENTIAL_SAVED),
                    Err(err) => fail(err),
                },
                KeyAction::Show => {
                    match store.load()? {
                        Some(key) => println!("{} {}", style("Stored key:").dim(), mask(&key)),
                        None => println!("{}", style("No key stored.").dim()),
                    }
                    println!(
                        "{} {}",
                        style("Settings:").dim(),
                        style(store.path().display()).cyan()
                    );
                }
                KeyAction::Clear => {
                    store.clear()?;
                    println!("{} Stored key removed", style("✓").green().bold());
                }
            }
        }

        Command::Extract { input, output } => {
            let count = extract_transcription(&input, &output)
                .await
                .unwrap_or_else(|err| fail(err));
            println!(
                "{} Extracted {} segments → {}",
                style("✓").green().bold(),
                count,
                style(output.display()).cyan()
            );
        }
    }

    Ok(())
}
