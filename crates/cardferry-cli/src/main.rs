//! cardferry - move Trello cards into Clubhouse
//!
//! ## Commands
//!
//! - `export`: normalize a board into the intermediate JSON file
//! - `import`: create Clubhouse stories from an intermediate JSON file
//! - `migrate`: export then import in one run
//!
//! Credentials come from the environment (`TRELLO_KEY`, `TRELLO_TOKEN`,
//! `DROPBOX_TOKEN`, `CLUBHOUSE_TOKEN`). Logs go to stderr; the per-card
//! status table goes to stdout.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use cardferry_core::{
    export_board, format_status_line, new_run_id, parse_utc_offset, read_cards, write_cards,
    AttachmentRelocator, Card, CardNormalizer, ExportOptions, ImportConfig, ImportOrchestrator,
    ImportReport, MigrationSpan, RelocatorConfig, UserMap, DEFAULT_CONCURRENCY,
    DEFAULT_EXPORT_PATH, STATUS_HEADER,
};
use cardferry_http::{
    ClubhouseClient, ClubhouseConfig, DropboxClient, DropboxConfig, TrelloClient, TrelloConfig,
};
use cardferry_remote::{SourceClient, StoryType};

#[derive(Parser)]
#[command(name = "cardferry")]
#[command(version = cardferry_core::VERSION)]
#[command(about = "Migrate Trello cards to Clubhouse stories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize every card on a board and write the intermediate file
    Export(ExportArgs),

    /// Create stories from a previously exported file
    Import {
        /// Intermediate file to read
        #[arg(short, long, default_value = DEFAULT_EXPORT_PATH)]
        input: PathBuf,

        #[command(flatten)]
        target: ImportArgs,
    },

    /// Export a board and import it in one run
    Migrate {
        #[command(flatten)]
        export: ExportArgs,

        #[command(flatten)]
        target: ImportArgs,
    },
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Trello board id
    #[arg(long, env = "CARDFERRY_BOARD")]
    board: String,

    /// Intermediate file to write
    #[arg(short, long, default_value = DEFAULT_EXPORT_PATH)]
    output: PathBuf,

    /// Relocate attachments to Dropbox
    #[arg(long)]
    attachments: bool,

    /// Cards normalized concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Dropbox folder attachments are written under
    #[arg(long, default_value = "trello")]
    storage_root: String,

    /// Display shift for Dropbox client-modified times (e.g. -07:00); the
    /// shifted wall-clock time is still sent with a `Z` suffix
    #[arg(long, env = "CARDFERRY_UTC_OFFSET", default_value = "Z")]
    utc_offset: String,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// JSON object mapping Trello member ids to Clubhouse user ids
    #[arg(long, env = "CARDFERRY_USER_MAP")]
    user_map: PathBuf,

    /// Clubhouse project id
    #[arg(long, env = "CLUBHOUSE_PROJECT_ID")]
    project_id: i64,

    /// Clubhouse workflow state id for new stories
    #[arg(long, env = "CLUBHOUSE_WORKFLOW_STATE_ID")]
    workflow_state_id: i64,

    /// Story type: feature, bug or chore
    #[arg(long, default_value = "feature")]
    story_type: StoryType,

    /// Clubhouse user id performing the import
    #[arg(long, env = "CLUBHOUSE_IMPORT_MEMBER")]
    import_member: String,

    /// Append a comment linking each story back to its Trello card
    #[arg(long)]
    source_link: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    cardferry_core::init_tracing(cli.json, level);

    let run_id = new_run_id();
    match cli.command {
        Commands::Export(args) => {
            let _span = MigrationSpan::enter("export", &run_id);
            cmd_export(&args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Import { input, target } => {
            let _span = MigrationSpan::enter("import", &run_id);
            let cards = read_cards(&input)
                .with_context(|| format!("Failed to read export file {}", input.display()))?;
            let report = cmd_import(&cards, &target).await?;
            Ok(exit_code(&report))
        }
        Commands::Migrate { export, target } => {
            let cards = {
                let _span = MigrationSpan::enter("export", &run_id);
                cmd_export(&export).await?
            };
            let _span = MigrationSpan::enter("import", &run_id);
            let report = cmd_import(&cards, &target).await?;
            Ok(exit_code(&report))
        }
    }
}

fn exit_code(report: &ImportReport) -> ExitCode {
    if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn relocator_config(args: &ExportArgs) -> Result<RelocatorConfig> {
    let offset = parse_utc_offset(&args.utc_offset).context("Invalid --utc-offset")?;
    Ok(RelocatorConfig::default()
        .with_root(args.storage_root.as_str())
        .with_utc_offset(offset))
}

async fn cmd_export(args: &ExportArgs) -> Result<Vec<Card>> {
    let options = ExportOptions::new(args.board.as_str())
        .with_attachments(args.attachments)
        .with_concurrency(args.concurrency);
    options.validate().context("Invalid export options")?;

    let trello = TrelloConfig::from_env().context("Trello is not configured")?;
    let source: Arc<dyn SourceClient> =
        Arc::new(TrelloClient::new(trello).context("Failed to build Trello client")?);

    let mut normalizer = CardNormalizer::new(source.clone());
    if args.attachments {
        let dropbox = DropboxConfig::from_env().context("Dropbox is not configured")?;
        let storage = DropboxClient::new(dropbox).context("Failed to build Dropbox client")?;
        normalizer = normalizer.with_relocator(AttachmentRelocator::new(
            source.clone(),
            Arc::new(storage),
            relocator_config(args)?,
        ));
    }

    let report = export_board(source.as_ref(), &normalizer, &options)
        .await
        .with_context(|| format!("Failed to export board {}", args.board))?;

    write_cards(&args.output, &report.cards)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Exported {} cards to {} ({} with recovered issues)",
        report.cards.len(),
        args.output.display(),
        report.cards_with_issues()
    );
    Ok(report.cards)
}

fn load_user_map(path: &Path) -> Result<UserMap> {
    let users = UserMap::load(path)
        .with_context(|| format!("Failed to load user map {}", path.display()))?;
    info!(path = %path.display(), users = users.len(), "user map loaded");
    Ok(users)
}

async fn cmd_import(cards: &[Card], args: &ImportArgs) -> Result<ImportReport> {
    let users = load_user_map(&args.user_map)?;
    let config = ImportConfig::new(
        args.project_id,
        args.workflow_state_id,
        args.import_member.as_str(),
    )
    .with_story_type(args.story_type)
    .with_source_link_comment(args.source_link);
    config.validate().context("Invalid import options")?;

    let clubhouse = ClubhouseConfig::from_env().context("Clubhouse is not configured")?;
    let destination =
        ClubhouseClient::new(clubhouse).context("Failed to build Clubhouse client")?;

    let orchestrator = ImportOrchestrator::new(Arc::new(destination), Arc::new(users), config);

    let (link, status, detail) = STATUS_HEADER;
    println!("{}", format_status_line(link, status, detail));
    let report = orchestrator
        .import_with(cards, |outcome| println!("{}", outcome.status_line()))
        .await;

    println!();
    println!(
        "Imported {} of {} cards ({} failed)",
        report.succeeded(),
        report.outcomes.len(),
        report.failed()
    );
    Ok(report)
}
