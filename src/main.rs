use clap::{Parser, Subcommand, ValueEnum};
use pagekit::config::{self, EngineConfig};
use pagekit::document::{PageConfig, SectionKind};
use pagekit::editor::{Direction, Editor};
use pagekit::render::{self, RenderContext, RenderMode};
use pagekit::store::{ConfigStore, FileBackend, StoreError};
use pagekit::templates::SeedTemplate;
use pagekit::upload::{AssetFile, LocalUploader};
use pagekit::output;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "pagekit")]
#[command(about = "Draft, publish, and render personal pages")]
#[command(long_about = "\
Draft, publish, and render personal pages

Each page has a draft (edited by its owner) and a published copy (served
to visitors by slug). Pages are built from five section types:

  hero      carousel of slides, with logo, title, and social links
  links     list of labelled links
  gallery   image grid
  news      strip or grid of image tiles that link somewhere
  video     YouTube/Vimeo embeds or thumbnails

Typical session:

  pagekit init --owner u1 --slug alice        # seed draft + published
  pagekit edit --owner u1 add-slide /hero.jpg # edits save the draft
  pagekit preview --owner u1 --out draft.html
  pagekit publish --owner u1
  pagekit render alice --out index.html

Run 'pagekit gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Page store directory (overrides store_dir from the config file)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Identifies the page being edited.
#[derive(clap::Args, Clone)]
struct OwnerArgs {
    /// Owner id
    #[arg(long)]
    owner: String,
}

#[derive(clap::Args, Clone)]
struct OutArgs {
    /// Write HTML to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a page for an owner, seeding draft and published
    Init {
        #[command(flatten)]
        owner: OwnerArgs,
        /// Public slug
        #[arg(long)]
        slug: String,
        /// Seed template (defaults to the configured one)
        #[arg(long)]
        template: Option<SeedTemplate>,
    },
    /// Show a page's record and draft status
    Show(OwnerArgs),
    /// Replace the draft with a JSON document
    SetDraft {
        #[command(flatten)]
        owner: OwnerArgs,
        /// Path to a page document in JSON
        file: PathBuf,
    },
    /// Copy the draft to the published slot
    Publish(OwnerArgs),
    /// Render a published page by slug
    Render {
        slug: String,
        #[command(flatten)]
        out: OutArgs,
    },
    /// Render an owner's draft with editing placeholders
    Preview {
        #[command(flatten)]
        owner: OwnerArgs,
        #[command(flatten)]
        out: OutArgs,
    },
    /// Show the render order of an owner's draft
    Layout {
        #[command(flatten)]
        owner: OwnerArgs,
        /// Show the published document instead of the draft
        #[arg(long)]
        published: bool,
    },
    /// Apply one edit to an owner's draft and save it
    Edit {
        #[command(flatten)]
        owner: OwnerArgs,
        /// Publish after saving
        #[arg(long)]
        publish: bool,
        #[command(subcommand)]
        op: EditOp,
    },
    /// Render every published page into a directory
    Export {
        /// Output directory
        #[arg(long, default_value = "dist")]
        out: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum EditOp {
    /// Create the section of a type if the page has none
    Ensure { kind: SectionKind },
    /// Flip a section's visibility
    Toggle { section_id: String },
    /// Set a section's sort key
    Order { section_id: String, order: i64 },
    /// Move a section one place up or down in render order
    Move { section_id: String, direction: MoveDirection },
    /// Set a section's grid width (1-4); omit to reset to full width
    Span { section_id: String, span: Option<u8> },
    /// Shallow-merge a JSON object into a section's props
    Patch { section_id: String, json: String },
    /// Remove a section
    DeleteSection { section_id: String },
    /// Remove one item from a section
    DeleteItem { section_id: String, item_id: String },
    /// Append a hero slide by URL
    AddSlide {
        src: String,
        #[arg(long)]
        alt: Option<String>,
    },
    /// Upload an image file and append it as a hero slide
    UploadSlide { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(d: MoveDirection) -> Self {
        match d {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let engine = config::load_config(&cli.config)?;
    let store_dir = cli
        .store_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&engine.store_dir));
    let store = ConfigStore::new(FileBackend::new(store_dir), engine.seed.template);

    match cli.command {
        Command::Init {
            owner,
            slug,
            template,
        } => {
            let store = match template {
                Some(t) => ConfigStore::new(FileBackend::new(store.backend().root()), t),
                None => store,
            };
            store.ensure(&owner.owner, &slug)?;
            output::print_record(&require_record(&store, &owner.owner)?);
        }
        Command::Show(owner) => {
            let record = require_record(&store, &owner.owner)?;
            output::print_record(&record);
        }
        Command::SetDraft { owner, file } => {
            let content = std::fs::read_to_string(&file)?;
            let draft: PageConfig = serde_json::from_str(&content)?;
            store.set_draft(&owner.owner, draft)?;
            println!("Draft saved for {}", owner.owner);
        }
        Command::Publish(owner) => {
            store.publish(&owner.owner)?;
            let record = require_record(&store, &owner.owner)?;
            println!("Published {}", record.slug);
        }
        Command::Render { slug, out } => {
            let ctx = RenderContext::from_config(&engine, RenderMode::Published);
            let html = render::render_published(&store, &slug, &ctx)?;
            write_html(out.out.as_deref(), &html.into_string())?;
        }
        Command::Preview { owner, out } => {
            let ctx = RenderContext::from_config(&engine, RenderMode::Preview);
            let html = render::render_draft_preview(&store, &owner.owner, &ctx)?;
            write_html(out.out.as_deref(), &html.into_string())?;
        }
        Command::Layout { owner, published } => {
            let record = require_record(&store, &owner.owner)?;
            let document = if published {
                &record.published
            } else {
                &record.draft
            };
            output::print_layout(document);
        }
        Command::Edit { owner, publish, op } => {
            run_edit(&store, &engine, &owner.owner, op, publish)?;
        }
        Command::Export { out } => {
            let ctx = RenderContext::from_config(&engine, RenderMode::Published);
            let pages = render::export_published(&store, &out, &ctx)?;
            output::print_export(&pages);
        }
        Command::GenConfig => unreachable!("handled before the store is opened"),
    }

    Ok(())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pagekit=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn require_record(
    store: &ConfigStore<FileBackend>,
    owner_id: &str,
) -> Result<pagekit::store::PageRecord, StoreError> {
    store
        .record(owner_id)?
        .ok_or_else(|| StoreError::NotFound(owner_id.to_string()))
}

fn run_edit(
    store: &ConfigStore<FileBackend>,
    engine: &EngineConfig,
    owner_id: &str,
    op: EditOp,
    publish: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let draft = store
        .get_draft(owner_id)?
        .ok_or_else(|| StoreError::NotFound(owner_id.to_string()))?;
    let mut editor = Editor::with_document(store, owner_id, draft);

    let message = match op {
        EditOp::Ensure { kind } => {
            let section = editor.ensure_section(kind);
            format!("Section {} ({})", section.id, kind)
        }
        EditOp::Toggle { section_id } => {
            let enabled = editor.toggle_enabled(&section_id)?;
            let state = if enabled { "enabled" } else { "disabled" };
            format!("Section {section_id} {state}")
        }
        EditOp::Order { section_id, order } => {
            editor.set_order(&section_id, order)?;
            format!("Section {section_id} order {order}")
        }
        EditOp::Move {
            section_id,
            direction,
        } => {
            editor.move_section(&section_id, direction.into())?;
            format!("Section {section_id} moved")
        }
        EditOp::Span { section_id, span } => {
            editor.set_col_span(&section_id, span)?;
            match span {
                Some(n) => format!("Section {section_id} spans {n} columns"),
                None => format!("Section {section_id} spans full width"),
            }
        }
        EditOp::Patch { section_id, json } => {
            let patch: serde_json::Value = serde_json::from_str(&json)?;
            editor.update_section_props(&section_id, patch)?;
            format!("Section {section_id} updated")
        }
        EditOp::DeleteSection { section_id } => {
            editor.delete_section(&section_id)?;
            format!("Section {section_id} deleted")
        }
        EditOp::DeleteItem {
            section_id,
            item_id,
        } => {
            editor.delete_item(&section_id, &item_id)?;
            format!("Item {item_id} removed from {section_id}")
        }
        EditOp::AddSlide { src, alt } => {
            let id = editor.add_hero_slide(src, alt)?;
            format!("Slide {id} added")
        }
        EditOp::UploadSlide { file } => {
            let uploader = LocalUploader::from_config(&engine.uploads);
            let asset = AssetFile::from_path(&file)?;
            let id = editor.upload_and_add_slide(&uploader, &asset)?;
            format!("Slide {id} added from {}", file.display())
        }
    };

    if publish {
        editor.publish()?;
    } else {
        editor.save_draft()?;
    }
    println!("{message}");
    if publish {
        println!("Published");
    }
    Ok(())
}

fn write_html(out: Option<&Path>, html: &str) -> std::io::Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, html)
        }
        None => {
            println!("{html}");
            Ok(())
        }
    }
}
