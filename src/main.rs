use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use docuvision::console::domain::models::AttachmentTarget;
use docuvision::console::state::facets::FacetKind;
use docuvision::format::format_facet_group;
use docuvision::{
    AppState, ConsoleConfig, DocumentActions, FilterState, MatchMode, Message, PreviewOutcome,
    SearchConsole, UrlParams, ViewMode, ViewState, extract_phrases, format_document, logging,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "docuvision",
    version,
    about = "Faceted document search against a document search backend",
    long_about = None
)]
struct Cli {
    /// Search query; "quoted phrases" become separate terms
    query: Option<String>,

    /// Config file (default: <config dir>/docuvision/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search backend base URL
    #[arg(long, env = "DOCUVISION_API_URL")]
    api_url: Option<String>,

    /// How multiple terms combine
    #[arg(short = 't', long = "type", value_enum, default_value = "any")]
    match_mode: MatchArg,

    /// Document type code (repeatable)
    #[arg(long = "doc-type")]
    doc_types: Vec<String>,

    /// Branch code (repeatable)
    #[arg(long = "branch")]
    branches: Vec<String>,

    /// File extension (repeatable)
    #[arg(long = "extension")]
    extensions: Vec<String>,

    /// Restrict to one calendar year
    #[arg(long, conflicts_with_all = ["from", "to"])]
    year: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Exclude attachments
    #[arg(long)]
    parents_only: bool,

    /// Spelling-tolerant matching
    #[arg(long)]
    fuzzy: bool,

    /// Advanced field filter, FIELD=VALUE (repeatable)
    #[arg(long = "filter", value_parser = parse_field_filter)]
    field_filters: Vec<(String, String)>,

    /// Paged grid instead of the reader list
    #[arg(long)]
    grid: bool,

    /// Grid page (1-based)
    #[arg(long, default_value = "1")]
    page: usize,

    /// Grid page size
    #[arg(long)]
    page_size: Option<usize>,

    /// Extra reader batches to fetch
    #[arg(long, default_value = "0")]
    load_more: usize,

    /// Resolve the attachments (or parent) of this document id
    #[arg(long = "attachment-of")]
    attachment_of: Option<String>,

    /// Parent id for --attachment-of
    #[arg(long, requires = "attachment_of")]
    parent: Option<String>,

    /// The --attachment-of document is itself an attachment
    #[arg(long, requires = "attachment_of")]
    is_attachment: bool,

    /// Print facet counts
    #[arg(long)]
    facets: bool,

    /// Print view, download and link URLs per document
    #[arg(long)]
    links: bool,

    /// Fetch the preview of the Nth result (1-based)
    #[arg(long)]
    preview: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Show full text without truncation
    #[arg(long)]
    full_text: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MatchArg {
    Any,
    All,
}

impl From<MatchArg> for MatchMode {
    fn from(arg: MatchArg) -> Self {
        match arg {
            MatchArg::Any => MatchMode::Any,
            MatchArg::All => MatchMode::All,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    JsonL,
}

fn parse_field_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.json_logs, cli.verbose);

    let config =
        ConsoleConfig::load(cli.config.as_deref())?.with_api_base_url(cli.api_url.clone());
    let settings = config.search_settings();
    let use_color = !cli.no_color;

    let filters = build_filters(&cli)?;
    let view = ViewState {
        mode: if cli.grid {
            ViewMode::Grid
        } else {
            ViewMode::Reader
        },
        page: cli.page,
        page_size: cli.page_size.unwrap_or(settings.grid_page_size),
    };
    let state = AppState::new(settings).with_filters(filters).with_view(view);
    let mut console = SearchConsole::new(&config, state)?;

    let params = match &cli.attachment_of {
        Some(document_id) => UrlParams::attachment(AttachmentTarget {
            document_id: document_id.clone(),
            parent_id: cli.parent.clone().unwrap_or_default(),
            is_attachment: cli.is_attachment,
        }),
        None => {
            let terms = extract_phrases(cli.query.as_deref().unwrap_or_default());
            UrlParams::search(&terms, cli.match_mode.into())
        }
    };

    let spinner = matches!(cli.format, OutputFormat::Text).then(new_spinner).transpose()?;
    console.dispatch(Message::UrlChanged(params));
    console.settle().await;
    for _ in 0..cli.load_more {
        if !console.state().can_load_more() {
            break;
        }
        console.dispatch(Message::LoadMoreRequested);
        console.settle().await;
    }
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if let Some(error) = &console.state().results.error {
        if use_color {
            eprintln!("{}", error.red());
        } else {
            eprintln!("{error}");
        }
        std::process::exit(1);
    }

    let actions = DocumentActions::new(&config)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match cli.format {
        OutputFormat::Text => {
            print_text(&mut console, &actions, &cli, &config, &mut handle)?;
        }
        OutputFormat::Json => {
            let output = summary_json(console.state(), &config);
            serde_json::to_writer_pretty(&mut handle, &output)?;
            writeln!(&mut handle)?;
        }
        OutputFormat::JsonL => {
            for document in &console.state().results.documents {
                serde_json::to_writer(&mut handle, document)?;
                writeln!(&mut handle)?;
            }
            let metadata = serde_json::json!({
                "_metadata": {
                    "returned_count": console.state().results.documents.len(),
                    "total": console.state().results.total_documents,
                    "has_more": console.state().results.cursor.is_some(),
                }
            });
            serde_json::to_writer(&mut handle, &metadata)?;
            writeln!(&mut handle)?;
        }
    }

    if let Some(index) = cli.preview {
        show_preview(console.state(), &actions, index, &mut handle).await?;
    }

    Ok(())
}

fn build_filters(cli: &Cli) -> Result<FilterState> {
    let mut filters = FilterState::new(cli.match_mode.into());
    filters.doc_types.extend(cli.doc_types.iter().cloned());
    filters.branches.extend(cli.branches.iter().cloned());
    filters.extensions.extend(cli.extensions.iter().cloned());
    filters.set_year(cli.year.clone());
    match (cli.from.as_deref(), cli.to.as_deref()) {
        (Some(from), Some(to)) => filters
            .apply_date_range(from, to)
            .context("Invalid date range")?,
        // One-sided ranges are reported by the search itself.
        (from, to) => {
            filters.set_from_date(from.map(str::to_string));
            filters.set_to_date(to.map(str::to_string));
        }
    }
    filters.parents_only = cli.parents_only;
    filters.fuzzy = cli.fuzzy;
    filters.set_simple_filters(cli.field_filters.iter().cloned());
    Ok(filters)
}

fn new_spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message("Searching...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn print_text(
    console: &mut SearchConsole,
    actions: &DocumentActions,
    cli: &Cli,
    config: &ConsoleConfig,
    out: &mut impl Write,
) -> Result<()> {
    let use_color = !cli.no_color;
    let state = console.state();
    let documents = state.results.documents.clone();

    if documents.is_empty() {
        writeln!(out, "No documents found.")?;
    } else if state.view.mode == ViewMode::Grid {
        writeln!(
            out,
            "Page {} of {} ({} documents):\n",
            state.view.page,
            state.page_count(),
            state.results.total_documents.unwrap_or(0)
        )?;
    } else {
        writeln!(out, "Found {} documents:\n", documents.len())?;
    }

    for document in &documents {
        writeln!(out, "{}", format_document(document, use_color, cli.full_text))?;
        if cli.links {
            print_links(console, actions, document, out)?;
        }
    }

    if console.state().can_load_more() {
        eprintln!("\n(More results available; use --load-more)");
    }

    if cli.facets {
        writeln!(out)?;
        for kind in FacetKind::ALL {
            let group = console.state().facet_group(kind, &config.catalog);
            writeln!(out, "{}", format_facet_group(kind.title(), group.as_ref(), use_color))?;
        }
    }
    Ok(())
}

fn print_links(
    console: &mut SearchConsole,
    actions: &DocumentActions,
    document: &docuvision::Document,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(path) = document.system_path.as_deref() {
        writeln!(out, "    view:     {}", actions.view_url(path))?;
        writeln!(out, "    download: {}", actions.download_url(path))?;
    }
    if document.attachment_link_label().is_some() {
        if !document.is_attachment {
            if let Some(id) = document.id.as_deref() {
                writeln!(out, "    download all: {}", actions.download_all_url(id))?;
            }
        }
        console.dispatch(Message::AttachmentLinkFollowed(document.clone()));
        for url in console.take_opened() {
            writeln!(out, "    link:     {url}")?;
        }
    }
    Ok(())
}

fn summary_json(state: &AppState, config: &ConsoleConfig) -> serde_json::Value {
    let facets: serde_json::Map<String, serde_json::Value> = FacetKind::ALL
        .iter()
        .map(|kind| {
            let entries = state.facet_group(*kind, &config.catalog).map(|group| {
                group
                    .entries
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "code": entry.code,
                            "label": entry.label,
                            "count": entry.count,
                            "selected": entry.selected,
                        })
                    })
                    .collect::<Vec<_>>()
            });
            (kind.title().to_string(), serde_json::json!(entries))
        })
        .collect();

    serde_json::json!({
        "query": state.terms,
        "documents": state.results.documents,
        "returned_count": state.results.documents.len(),
        "total": state.results.total_documents,
        "page": state.view.page,
        "page_count": state.page_count(),
        "has_more": state.results.cursor.is_some(),
        "facets": facets,
    })
}

async fn show_preview(
    state: &AppState,
    actions: &DocumentActions,
    index: usize,
    out: &mut impl Write,
) -> Result<()> {
    let document = index
        .checked_sub(1)
        .and_then(|i| state.results.documents.get(i))
        .with_context(|| format!("No result #{index} to preview"))?;
    let file_name = document
        .file_name
        .as_deref()
        .or_else(|| document.display_file_name())
        .unwrap_or_default();

    match actions
        .open(document.system_path.as_deref().unwrap_or_default(), file_name)
        .await?
    {
        PreviewOutcome::Inline(html) => writeln!(out, "\n{html}")?,
        PreviewOutcome::NewTab(url) => writeln!(out, "\nOpen in browser: {url}")?,
    }
    Ok(())
}
