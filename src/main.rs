use album_studio::confirm::{AutoConfirm, ConfirmRequest, Confirmation, Confirmer, PromptConfirmer};
use album_studio::document::{AlbumDocument, CoverField};
use album_studio::export::SavedAlbum;
use album_studio::layout::Layout;
use album_studio::session::{DropOutcome, EditingSession, SaveSink, StudioEvent};
use album_studio::upload::{self, UploadFile, Uploader};
use album_studio::{config, output};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

type Session = EditingSession<Box<dyn Uploader>>;

#[derive(Parser)]
#[command(name = "album-studio")]
#[command(about = "Design a printed photo album from the terminal")]
#[command(long_about = "\
Design a printed photo album from the terminal

An album is a cover plus a fixed number of pages. Each page has a layout that
decides how many of its images are shown:

  single   1 image
  double   2 images
  grid     4 images
  collage  6 images

Uploaded photos fill the album from the front: each page takes as many as
its layout has free slots, in upload order. Photos that do not fit anywhere
are discarded. Images beyond a page's capacity (after a move or a drop) are
kept but hidden until the layout grows.

The working album is kept in --album between commands. 'export' uploads the
finished design and writes <album>.saved.json for the cart.

Run 'album-studio gen-config' to generate a documented studio.toml.")]
#[command(version)]
struct Cli {
    /// Studio configuration file
    #[arg(long, default_value = "studio.toml", global = true)]
    config: PathBuf,

    /// Working album document
    #[arg(long, default_value = "album.json", global = true)]
    album: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new album
    New {
        /// Number of pages (defaults to album.page_count)
        #[arg(long)]
        pages: Option<usize>,
        /// Replace an existing album
        #[arg(long)]
        force: bool,
    },
    /// Print the cover and every page
    Show,
    /// Edit the cover
    Cover {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        font: Option<String>,
        /// Cover date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Change the layout of one page or of every page
    Layout {
        /// Page number, starting at 1
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        page: Option<usize>,
        /// Apply to every page
        #[arg(long)]
        all: bool,
        /// Skip the confirmation prompt
        #[arg(long, requires = "all")]
        yes: bool,
        /// single, double, grid or collage
        layout: Layout,
    },
    /// Upload photos and spread them over the album
    Upload {
        /// Image files, or directories whose images are taken in name order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Upload photos onto one page
    Drop {
        /// Page number, starting at 1
        #[arg(long)]
        page: usize,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Move an image to another page
    Move {
        /// Source page number
        #[arg(long)]
        from: usize,
        /// Image number on the source page, starting at 1
        #[arg(long)]
        index: usize,
        /// Target page number
        #[arg(long)]
        to: usize,
    },
    /// Remove an image from a page
    Remove {
        #[arg(long)]
        page: usize,
        /// Image number on the page, starting at 1
        #[arg(long)]
        index: usize,
    },
    /// Upload the finished design and hand it to the cart
    Export {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print a stock studio.toml with all options documented
    GenConfig,
}

/// Keeps the exported album until the CLI writes it next to the working file.
#[derive(Default)]
struct CartSink {
    saved: Option<SavedAlbum>,
}

impl SaveSink for CartSink {
    fn on_save(&mut self, album: SavedAlbum) {
        self.saved = Some(album);
    }

    fn on_close(&mut self) {
        tracing::debug!("editor closed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "album_studio=info".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let studio_config = config::load_config(&cli.config)?;

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = run(&cli, &studio_config, tx);
    printer
        .join()
        .map_err(|_| "progress printer panicked")?;
    result
}

/// Execute one command. Progress events go to `events` and are printed by
/// the caller's printer thread.
fn run(
    cli: &Cli,
    studio_config: &config::StudioConfig,
    events: Sender<StudioEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let uploader = upload::from_config(&studio_config.upload)?;

    match &cli.command {
        Command::New { pages, force } => {
            if cli.album.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to replace it)",
                    cli.album.display()
                )
                .into());
            }
            let session = EditingSession::open(studio_config, *pages, uploader);
            write_album(&cli.album, session.document())?;
            println!(
                "Created {} with {} pages",
                cli.album.display(),
                session.document().page_count()
            );
        }
        Command::Show => {
            output::print_document(&read_album(&cli.album)?);
        }
        Command::Cover {
            title,
            template,
            font,
            date,
            color,
        } => {
            let mut session = resume(cli, studio_config, uploader, events)?;
            if let Some(title) = title {
                let max = studio_config.cover.title_max_chars;
                if title.chars().count() > max {
                    return Err(format!("cover title is limited to {max} characters").into());
                }
                session.set_cover_field(CoverField::Title(title.clone()))?;
            }
            if let Some(template) = template {
                session.set_cover_field(CoverField::Template(template.clone()))?;
            }
            if let Some(font) = font {
                session.set_cover_field(CoverField::Font(font.clone()))?;
            }
            if let Some(date) = date {
                session.set_cover_field(CoverField::Date(*date))?;
            }
            if let Some(color) = color {
                session.set_cover_field(CoverField::Color(color.clone()))?;
            }
            write_album(&cli.album, session.document())?;
        }
        Command::Layout {
            page,
            all,
            yes,
            layout,
        } => {
            let mut session = resume(cli, studio_config, uploader, events)?;
            if *all {
                let confirmer = confirmer(*yes);
                if session.set_all_pages_layout(*layout, confirmer.as_ref())?
                    == Confirmation::Declined
                {
                    println!("Layouts unchanged");
                    return Ok(());
                }
            } else if let Some(page) = page {
                session.set_page_layout(*page, *layout)?;
            }
            write_album(&cli.album, session.document())?;
        }
        Command::Upload { paths } => {
            let files = read_files(&expand_paths(paths))?;
            let mut session = resume(cli, studio_config, uploader, events)?;
            session.bulk_upload(&files)?;
            write_album(&cli.album, session.document())?;
        }
        Command::Drop { page, files } => {
            let files = read_files(files)?;
            let mut session = resume(cli, studio_config, uploader, events)?;
            session.drop_on(page_index(*page)?, &files)?;
            write_album(&cli.album, session.document())?;
        }
        Command::Move { from, index, to } => {
            let mut session = resume(cli, studio_config, uploader, events)?;
            session.drag_start(page_index(*from)?, image_index(*index)?)?;
            if let DropOutcome::Moved { .. } = session.drop_on(page_index(*to)?, &[])? {
                write_album(&cli.album, session.document())?;
            }
        }
        Command::Remove { page, index } => {
            let mut session = resume(cli, studio_config, uploader, events)?;
            let removed = session.remove_image(*page, image_index(*index)?)?;
            write_album(&cli.album, session.document())?;
            println!("Removed {} from page {:0>3}", removed, page);
        }
        Command::Export { yes } => {
            let mut session = resume(cli, studio_config, uploader, events)?;
            if !confirmer(*yes).confirm(&ConfirmRequest::SaveAlbum) {
                println!("Not saved");
                return Ok(());
            }
            let mut sink = CartSink::default();
            session.save(&mut sink)?;
            if let Some(saved) = sink.saved {
                let path = cli.album.with_extension("saved.json");
                std::fs::write(&path, serde_json::to_string_pretty(&saved)?)?;
                println!("Saved album written to {}", path.display());
            }
        }
        // Printed before the config is loaded
        Command::GenConfig => {}
    }

    Ok(())
}

fn resume(
    cli: &Cli,
    studio_config: &config::StudioConfig,
    uploader: Box<dyn Uploader>,
    events: Sender<StudioEvent>,
) -> Result<Session, Box<dyn std::error::Error>> {
    let document = read_album(&cli.album)?;
    Ok(EditingSession::resume(document, studio_config, uploader).with_events(events))
}

fn confirmer(yes: bool) -> Box<dyn Confirmer> {
    if yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(PromptConfirmer::stdio())
    }
}

fn read_album(path: &Path) -> Result<AlbumDocument, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        format!(
            "cannot read {}: {e} (run 'album-studio new' first)",
            path.display()
        )
    })?;
    Ok(AlbumDocument::from_json(&json)?)
}

fn write_album(path: &Path, document: &AlbumDocument) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, serde_json::to_string_pretty(document)?)?;
    Ok(())
}

/// Files as given; directories contribute their images, one level deep, by name.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .min_depth(1)
                    .max_depth(1)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.into_path())
                    .filter(|p| upload::content_type_for(p).starts_with("image/")),
            );
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>, Box<dyn std::error::Error>> {
    paths
        .iter()
        .map(|p| {
            UploadFile::from_path(p)
                .map_err(|e| format!("cannot read {}: {e}", p.display()).into())
        })
        .collect()
}

/// 1-based page number from the command line to the 0-based drag index.
fn page_index(page: usize) -> Result<usize, String> {
    page.checked_sub(1)
        .ok_or_else(|| "page numbers start at 1".to_string())
}

fn image_index(index: usize) -> Result<usize, String> {
    index
        .checked_sub(1)
        .ok_or_else(|| "image numbers start at 1".to_string())
}
