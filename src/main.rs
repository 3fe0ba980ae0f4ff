//! # Video Uploader - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Caricamento della configurazione e override da CLI
//! - Guida del wizard: selezione video, dettagli, crop del thumbnail, review, upload
//!
//! ## Flusso di esecuzione (`upload`):
//! 1. Parsa gli argomenti CLI e configura il logging
//! 2. Carica e valida la configurazione
//! 3. Valida il video (tipo e dimensione) e avanza a Details
//! 4. Applica titolo, descrizione, tag e transcript
//! 5. Croppa il thumbnail e avanza a Review
//! 6. Esegue l'upload in quattro fasi e stampa la route di destinazione
//!
//! ## Esempio di utilizzo:
//! ```bash
//! video-upload upload clip.mp4 --thumbnail cover.png --title "Demo" --tags "rust, video"
//! video-upload crop cover.png --output thumb.jpg --zoom 1.5 --rotations 1
//! video-upload config init
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use video_uploader::json_output::JsonMessage;
use video_uploader::progress::format_size;
use video_uploader::upload::{ProgressReportThrottle, TranscriptPayload};
use video_uploader::{
    CloudStorage, Config, CropModal, HttpBackend, MediaSelector, Notifier, ProgressEstimate,
    ProgressManager, ThumbnailBlob, UploadObserver, UploadPhase, UploadSession, WizardController,
};

#[derive(Parser)]
#[command(name = "video-upload")]
#[command(about = "Publish a video with a cropped thumbnail via direct-to-cloud upload")]
struct Cli {
    /// Config file (default: ~/.video-uploader/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API base URL, overrides the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Output progress and status as JSON lines on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full wizard and upload a video
    Upload(UploadArgs),
    /// Crop an image into a thumbnail JPEG without uploading
    Crop {
        /// Source image
        image: PathBuf,

        /// Where to write the JPEG
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        crop: CropArgs,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Args)]
struct UploadArgs {
    /// Video file to publish
    video: PathBuf,

    /// Image used for the thumbnail
    #[arg(short, long)]
    thumbnail: PathBuf,

    /// Title (defaults to the file name without extension)
    #[arg(long)]
    title: Option<String>,

    #[arg(long, default_value = "")]
    description: String,

    /// Comma-separated tags
    #[arg(long, default_value = "")]
    tags: String,

    /// Publish as a short
    #[arg(long)]
    short: bool,

    /// Plain-text transcript file
    #[arg(long)]
    transcript_file: Option<PathBuf>,

    #[arg(long, requires = "transcript_file")]
    transcript_language: Option<String>,

    #[arg(long, requires = "transcript_file")]
    transcript_source: Option<String>,

    #[command(flatten)]
    crop: CropArgs,

    /// Stop at the review step and print the draft
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct CropArgs {
    /// Horizontal pan from the centred crop, in pixels
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    crop_x: f64,

    /// Vertical pan from the centred crop, in pixels
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    crop_y: f64,

    /// Zoom (1.0-3.0)
    #[arg(long, default_value = "1.0")]
    zoom: f64,

    /// Number of 90° clockwise rotations
    #[arg(long, default_value = "0")]
    rotations: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    match &cli.command {
        Command::Config { action } => run_config(action, &config_path, &cli).await,
        Command::Crop { image, output, crop } => {
            let config = load_config(&config_path, &cli).await?;
            let blob = crop_thumbnail(image, crop, &config)?;
            tokio::fs::write(output, &blob.bytes).await?;
            Notifier::new(!config.json_output).success(format!(
                "Thumbnail {}x{} written to {}",
                blob.width,
                blob.height,
                output.display()
            ));
            Ok(())
        }
        Command::Upload(args) => {
            let config = load_config(&config_path, &cli).await?;
            run_upload(args, &config).await
        }
    }
}

async fn load_config(path: &Path, cli: &Cli) -> Result<Config> {
    let mut config = Config::from_file(path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?
        .with_env_token();

    if let Some(api_url) = &cli.api_url {
        config.api_base_url = api_url.clone();
    }
    if cli.json {
        config.json_output = true;
    }

    config.validate()?;
    debug!("Effective config: api={} storage={}", config.api_base_url, config.storage_base_url);
    Ok(config)
}

async fn run_config(action: &ConfigAction, path: &Path, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(anyhow::anyhow!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                ));
            }
            Config::default().save_to_file(path).await?;
            info!("Wrote default config to {}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let mut config = load_config(path, cli).await?;
            if config.api_token.is_some() {
                config.api_token = Some("********".to_string());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn crop_thumbnail(image: &Path, args: &CropArgs, config: &Config) -> Result<ThumbnailBlob> {
    let mut modal =
        CropModal::open_path(image, config.thumbnail_aspect(), config.thumbnail_quality)?;

    for _ in 0..(args.rotations % 4) {
        modal.rotate()?;
    }
    modal.set_zoom(args.zoom)?;
    modal.set_offset(args.crop_x, args.crop_y)?;

    Ok(modal.confirm()?)
}

async fn run_upload(args: &UploadArgs, config: &Config) -> Result<()> {
    let notifier = Notifier::new(!config.json_output);
    let mut wizard = WizardController::new();

    // Step 1: video
    let selector = MediaSelector::new(config.max_video_bytes);
    let media = match selector.select(&args.video).await {
        Ok(media) => media,
        Err(rejection) => {
            notifier.error(rejection.to_string());
            if config.json_output {
                JsonMessage::error(&rejection.clone().into()).emit();
            }
            return Err(rejection.into());
        }
    };
    let total_bytes = media.size;
    wizard.select_video(media)?;

    // Step 2: details
    if let Some(title) = &args.title {
        wizard.set_title(title)?;
    }
    wizard.set_description(&args.description)?;
    wizard.set_tags_input(&args.tags)?;
    wizard.set_short(args.short)?;
    if let Some(path) = &args.transcript_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;
        if text.trim().is_empty() {
            notifier.warning(format!(
                "Transcript {} is empty and will not be sent",
                path.display()
            ));
        }
        wizard.set_transcript(Some(TranscriptPayload {
            text,
            language: args.transcript_language.clone(),
            source: args.transcript_source.clone(),
        }))?;
    }

    let blob = crop_thumbnail(&args.thumbnail, &args.crop, config)?;
    wizard.set_thumbnail(blob)?;

    // Step 3: review
    if let Err(e) = wizard.proceed_to_review() {
        notifier.error(e.user_message());
        return Err(e.into());
    }

    if args.dry_run {
        notifier.info("Dry run: stopping at review, nothing was uploaded");
        print_review(&wizard, config.json_output)?;
        return Ok(());
    }

    let backend = HttpBackend::new(&config.api_base_url, config.api_token.clone())?;
    let storage = CloudStorage::new(&config.storage_base_url)?;
    let observer = Arc::new(CliObserver::new(config.json_output, total_bytes));
    let session = UploadSession::new(backend, storage)
        .with_observer(observer.clone())
        .with_report_step(config.progress_report_step);

    let draft = wizard.begin_submit()?;
    if config.json_output {
        if let Some(video) = draft.video() {
            JsonMessage::start(video.path.clone(), video.size, &draft.title).emit();
        }
    }
    let result = session.run(wizard.draft()).await;
    wizard.finish_submit(&result);

    match result {
        Ok(outcome) => {
            observer.finish("Upload complete");
            notifier.success("Video published");
            if config.json_output {
                JsonMessage::complete(&outcome).emit();
            } else {
                println!("{}", outcome.route());
            }
            Ok(())
        }
        Err(e) => {
            observer.abandon("Upload failed");
            notifier.error(e.user_message());
            if config.json_output {
                JsonMessage::error(&e).emit();
            }
            Err(e.into())
        }
    }
}

fn print_review(wizard: &WizardController, json: bool) -> Result<()> {
    let draft = wizard.draft();
    let (file, size) = draft
        .video()
        .map(|v| (v.file_name.clone(), v.size))
        .unwrap_or_default();
    let (thumb_w, thumb_h) = draft
        .thumbnail()
        .map(|t| (t.width, t.height))
        .unwrap_or_default();

    if json {
        let summary = serde_json::json!({
            "type": "review",
            "step": wizard.step(),
            "file": file,
            "size": size,
            "title": draft.title.trim(),
            "description": draft.description,
            "tags": draft.tags(),
            "isShort": draft.is_short,
            "thumbnail": { "width": thumb_w, "height": thumb_h },
            "transcript": draft.transcript.is_some(),
        });
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("📹 {} ({})", file, format_size(size));
        println!("   Title:       {}", draft.title.trim());
        println!("   Description: {}", draft.description);
        println!("   Tags:        {}", draft.tags().join(", "));
        println!("   Short:       {}", draft.is_short);
        println!("   Thumbnail:   {}x{}", thumb_w, thumb_h);
        if let Some(preview) = draft.thumbnail_preview() {
            println!("   Preview:     {}", preview.display());
        }
    }
    Ok(())
}

/// Terminal and JSON rendering of upload events
struct CliObserver {
    json: bool,
    total_bytes: u64,
    bar: Mutex<Option<ProgressManager>>,
    spinner: Mutex<Option<ProgressBar>>,
    // one JSON progress line per whole percent
    json_progress: Mutex<ProgressReportThrottle>,
}

impl CliObserver {
    fn new(json: bool, total_bytes: u64) -> Self {
        Self {
            json,
            total_bytes,
            bar: Mutex::new(None),
            spinner: Mutex::new(None),
            json_progress: Mutex::new(ProgressReportThrottle::new(1)),
        }
    }

    fn clear_spinner(&self) {
        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(spinner) = spinner.take() {
                spinner.finish_and_clear();
            }
        }
    }

    fn finish(&self, message: &str) {
        self.clear_spinner();
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.finish(message);
            }
        }
    }

    fn abandon(&self, message: &str) {
        self.clear_spinner();
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.abandon(message);
            }
        }
    }
}

impl UploadObserver for CliObserver {
    fn on_phase(&self, phase: UploadPhase) {
        if self.json {
            JsonMessage::phase(phase).emit();
            return;
        }

        self.clear_spinner();
        match phase {
            UploadPhase::UploadingVideo => {
                let bar = ProgressManager::new(self.total_bytes);
                bar.set_message(phase.label());
                if let Ok(mut slot) = self.bar.lock() {
                    *slot = Some(bar);
                }
            }
            _ => {
                if let Ok(mut slot) = self.bar.lock() {
                    if let Some(bar) = slot.take() {
                        bar.finish("Video uploaded");
                    }
                }
                if let Ok(mut slot) = self.spinner.lock() {
                    *slot = Some(ProgressManager::spinner(phase.label()));
                }
            }
        }
    }

    fn on_progress(&self, estimate: &ProgressEstimate) {
        if self.json {
            let changed = match self.json_progress.lock() {
                Ok(mut throttle) => throttle
                    .observe(estimate.bytes_loaded, estimate.bytes_total)
                    .is_some(),
                Err(_) => false,
            };
            if changed {
                JsonMessage::progress(estimate).emit();
            }
            return;
        }
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.update(estimate);
            }
        }
    }
}
