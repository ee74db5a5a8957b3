use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::sync::{mpsc, Mutex};

use lawlist::config::{Config, UserType};
use lawlist::extract::CitationExtractor;
use lawlist::ingest::load_reading_list;
use lawlist::models::CitationSet;
use lawlist::orchestrator::{DownloadOrchestrator, EventKind, RunEvent};
use lawlist::portal::{CaseResolver, Credentials, SessionAuthenticator};
use lawlist::writer::ArtifactWriter;

/// Download legal case documents for every citation in a reading list
#[derive(Parser, Debug)]
#[command(name = "lawlist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download LawNet case documents for the citations in a reading list", long_about = None)]
struct Cli {
    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the citations found in a reading list without downloading
    Extract {
        /// Reading list file (.docx or .pdf)
        reading_list: PathBuf,

        /// Only citations flagged with a `*` marker
        #[arg(long)]
        starred: bool,

        /// Emit the citation set as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download every citation in a reading list
    Download {
        /// Reading list file (.docx or .pdf)
        reading_list: PathBuf,

        /// Only citations flagged with a `*` marker
        #[arg(long)]
        starred: bool,

        /// Portal username (without the domain prefix)
        #[arg(long, short)]
        username: String,

        /// Portal password; falls back to the LAWLIST_PASSWORD environment variable
        #[arg(long)]
        password: Option<String>,

        /// Which login prefix to authenticate with
        #[arg(long, value_enum, default_value_t = UserTypeArg::Student)]
        user_type: UserTypeArg,

        /// Download directory (overrides config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum UserTypeArg {
    Student,
    Faculty,
}

impl From<UserTypeArg> for UserType {
    fn from(arg: UserTypeArg) -> Self {
        match arg {
            UserTypeArg::Student => UserType::Student,
            UserTypeArg::Faculty => UserType::Faculty,
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "lawlist=info",
            2 => "lawlist=debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Extract {
            reading_list,
            starred,
            json,
        } => extract_command(&config, &reading_list, starred, json),
        Commands::Download {
            reading_list,
            starred,
            username,
            password,
            user_type,
            dir,
        } => {
            download_command(
                config,
                &reading_list,
                starred,
                username,
                password,
                user_type.into(),
                dir,
            )
            .await
        }
    }
}

fn extract_citations(
    config: &Config,
    reading_list: &PathBuf,
    starred: bool,
) -> Result<CitationSet> {
    let text = load_reading_list(reading_list)
        .with_context(|| format!("loading reading list {}", reading_list.display()))?;
    let extractor = CitationExtractor::new(&config.extractor);
    Ok(extractor.extract(&text, starred))
}

fn extract_command(
    config: &Config,
    reading_list: &PathBuf,
    starred: bool,
    json: bool,
) -> Result<()> {
    let citations = extract_citations(config, reading_list, starred)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&citations)?);
        return Ok(());
    }

    if citations.is_empty() {
        println!("No citations found in the reading list.");
        return Ok(());
    }
    println!("{} case(s) found:", citations.len());
    for citation in citations.iter() {
        println!("  {}", citation);
    }
    Ok(())
}

async fn download_command(
    config: Config,
    reading_list: &PathBuf,
    starred: bool,
    username: String,
    password: Option<String>,
    user_type: UserType,
    dir: Option<PathBuf>,
) -> Result<()> {
    let citations = extract_citations(&config, reading_list, starred)?;
    if citations.is_empty() {
        println!("No citations found in the reading list; nothing to download.");
        return Ok(());
    }

    let password = match password.or_else(|| std::env::var("LAWLIST_PASSWORD").ok()) {
        Some(p) => p,
        None => bail!("no password given: pass --password or set LAWLIST_PASSWORD"),
    };
    let credentials = Credentials {
        username,
        password,
        user_type,
    };

    println!("Logging in as {} ...", credentials.username);
    let authenticator = SessionAuthenticator::new(config.institution.clone())
        .context("building HTTP client")?;
    let session = match authenticator.authenticate(&credentials).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", format!("Login failed: {}", e).red());
            std::process::exit(1);
        }
    };
    println!("{}", "Login success!".green());

    let download_dir = dir.unwrap_or_else(|| config.download.directory.clone());
    let writer = Arc::new(ArtifactWriter::new(&download_dir).context("creating download directory")?);
    let resolver = Arc::new(CaseResolver::new(
        session,
        Arc::new(citations.clone()),
        Arc::clone(&writer),
        Arc::new(Mutex::new(())),
    ));

    let bar = ProgressBar::new(citations.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("progress bar template")?,
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<RunEvent>();
    let printer = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let line = match event.kind {
                    EventKind::PdfSaved => event.line.green().to_string(),
                    EventKind::HtmlSaved => event.line.yellow().to_string(),
                    EventKind::Duplicate => event.line.cyan().to_string(),
                    EventKind::NotFound | EventKind::Failed => event.line.red().to_string(),
                };
                bar.println(line);
                bar.inc(1);
            }
        })
    };

    let orchestrator = DownloadOrchestrator::new(config.download.workers);
    let reports = orchestrator.run(resolver, citations, Some(tx)).await;
    let _ = printer.await;
    bar.finish_and_clear();

    let saved = reports
        .iter()
        .filter(|r| {
            matches!(
                r.outcome,
                Ok(lawlist::DownloadOutcome::PdfSaved(_) | lawlist::DownloadOutcome::HtmlSaved(_))
            )
        })
        .count();
    println!(
        "Done: {}/{} cases saved to {}",
        saved,
        reports.len(),
        download_dir.display()
    );
    Ok(())
}
