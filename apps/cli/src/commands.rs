//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use tracing::info;

use presspipe_client::PayloadClient;
use presspipe_core::{
    ArticlePayloadBuilder, ArticleUploadOptions, BatchOptions, BodyFormat, CategoryOptions,
    FailurePolicy, MediaOptions, clean_collections, upload_article_from_file,
    upload_articles_from_directory,
};
use presspipe_shared::{AppConfig, init_config, load_config, load_credentials};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PressPipe — push local articles into a headless CMS.
#[derive(Parser)]
#[command(
    name = "presspipe",
    version,
    about = "Upsert HTML+front-matter articles, categories, and media into a headless CMS.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Upload an article file, or every matching file in a directory.
    Upload {
        /// Article file or directory of articles.
        path: PathBuf,

        /// Target collection (defaults to the configured articles collection).
        #[arg(short, long)]
        collection: Option<String>,

        /// Slug prefix for a single-file upload, e.g. "italy/bologna".
        #[arg(long)]
        prefix: Option<String>,

        /// Glob pattern for directory uploads.
        #[arg(long)]
        pattern: Option<String>,

        /// Do not descend into subdirectories.
        #[arg(long)]
        no_recursive: bool,

        /// Keep going when one file fails; report failures at the end.
        #[arg(long)]
        continue_on_error: bool,

        /// Body storage format: lexical or html.
        #[arg(long)]
        body_format: Option<String>,

        /// Directory searched for relative featured-image paths.
        #[arg(long)]
        media_root: Option<PathBuf>,

        /// Local image path overriding the front matter's featured image.
        #[arg(long)]
        featured_image: Option<String>,

        /// Login email (overrides the credentials file).
        #[arg(long, env = "PRESSPIPE_EMAIL", hide_env_values = true)]
        email: Option<String>,

        /// Login password (overrides the credentials file).
        #[arg(long, env = "PRESSPIPE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Pre-obtained bearer token; skips the login request entirely.
        #[arg(long, env = "PRESSPIPE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Credentials file path (defaults to the configured env file).
        #[arg(long)]
        env_file: Option<PathBuf>,
    },

    /// Delete every document from the store's content collections.
    Cleanup {
        /// Skip the articles collection.
        #[arg(long)]
        skip_articles: bool,

        /// Skip the media collection.
        #[arg(long)]
        skip_media: bool,

        /// Skip the categories collection.
        #[arg(long)]
        skip_categories: bool,

        /// Sweep only the named collection (repeatable); overrides the
        /// skip flags.
        #[arg(long)]
        only: Vec<String>,

        /// Documents fetched per batch.
        #[arg(long, default_value = "25")]
        batch_size: u32,

        /// Delete without asking for confirmation.
        #[arg(short = 'y', long)]
        yes: bool,

        /// Login email (overrides the credentials file).
        #[arg(long, env = "PRESSPIPE_EMAIL", hide_env_values = true)]
        email: Option<String>,

        /// Login password (overrides the credentials file).
        #[arg(long, env = "PRESSPIPE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Pre-obtained bearer token; skips the login request entirely.
        #[arg(long, env = "PRESSPIPE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Credentials file path (defaults to the configured env file).
        #[arg(long)]
        env_file: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "presspipe=info",
        1 => "presspipe=debug",
        _ => "presspipe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Upload {
            path,
            collection,
            prefix,
            pattern,
            no_recursive,
            continue_on_error,
            body_format,
            media_root,
            featured_image,
            email,
            password,
            token,
            env_file,
        } => {
            cmd_upload(UploadArgs {
                path,
                collection,
                prefix,
                pattern,
                no_recursive,
                continue_on_error,
                body_format,
                media_root,
                featured_image,
                email,
                password,
                token,
                env_file,
            })
            .await
        }
        Command::Cleanup {
            skip_articles,
            skip_media,
            skip_categories,
            only,
            batch_size,
            yes,
            email,
            password,
            token,
            env_file,
        } => {
            cmd_cleanup(
                skip_articles,
                skip_media,
                skip_categories,
                &only,
                batch_size,
                yes,
                email.as_deref(),
                password.as_deref(),
                token.as_deref(),
                env_file.as_deref(),
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

struct UploadArgs {
    path: PathBuf,
    collection: Option<String>,
    prefix: Option<String>,
    pattern: Option<String>,
    no_recursive: bool,
    continue_on_error: bool,
    body_format: Option<String>,
    media_root: Option<PathBuf>,
    featured_image: Option<String>,
    email: Option<String>,
    password: Option<String>,
    token: Option<String>,
    env_file: Option<PathBuf>,
}

/// Build an authenticated client from config and credential overrides.
/// A pre-obtained bearer token short-circuits the login request.
async fn connect(
    config: &AppConfig,
    email: Option<&str>,
    password: Option<&str>,
    token: Option<&str>,
    env_file: Option<&Path>,
) -> Result<PayloadClient> {
    if let Some(token) = token {
        let client = PayloadClient::new(
            &config.store.base_url,
            &config.store.api_prefix,
            Duration::from_secs(config.store.timeout_secs),
        )?
        .with_token(token);
        info!("using pre-obtained bearer token");
        return Ok(client);
    }

    let env_path = env_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.store.env_file));
    let credentials = load_credentials(
        email,
        password,
        &env_path,
        &config.store.email_var,
        &config.store.password_var,
    )?;

    let mut client = PayloadClient::new(
        &config.store.base_url,
        &config.store.api_prefix,
        Duration::from_secs(config.store.timeout_secs),
    )?;
    let user = client
        .login(&config.store.user_collection, &credentials)
        .await?;
    info!(
        email = user
            .get("user")
            .and_then(|u| u.get("email"))
            .and_then(|v| v.as_str())
            .unwrap_or(&credentials.email),
        "authenticated"
    );
    Ok(client)
}

/// Assemble upload options from config plus CLI overrides.
fn upload_options(config: &AppConfig, args: &UploadArgs) -> Result<ArticleUploadOptions> {
    let body_format: BodyFormat = args
        .body_format
        .as_deref()
        .unwrap_or(&config.upload.body_format)
        .parse()?;

    let mut defaults = Map::new();
    for (key, value) in &config.upload.defaults {
        defaults.insert(key.clone(), Value::String(value.clone()));
    }

    let media_root = args
        .media_root
        .clone()
        .or_else(|| config.upload.media_root.as_ref().map(PathBuf::from));

    Ok(ArticleUploadOptions {
        collection: args
            .collection
            .clone()
            .unwrap_or_else(|| config.collections.articles.clone()),
        builder: ArticlePayloadBuilder {
            slug_field: config.fields.slug.clone(),
            body_field: config.fields.body.clone(),
            defaults,
            body_format,
        },
        depth: Some(0),
        featured_image_field: Some(config.fields.featured_image.clone()),
        featured_image_output_field: config.fields.featured_image_output.clone(),
        featured_image_override: args.featured_image.clone(),
        media: MediaOptions {
            collection: config.collections.media.clone(),
            filename_field: config.fields.media_filename.clone(),
            media_root,
            defaults: Map::new(),
            depth: Some(0),
        },
        category_field: Some(config.fields.category.clone()),
        category_output_field: config.fields.category_output.clone(),
        categories: CategoryOptions {
            collection: config.collections.categories.clone(),
            parent_field: config.fields.category_parent.clone(),
            skip_first: config.upload.category_skip_first,
            ..CategoryOptions::default()
        },
        slug_prefix: args.prefix.clone(),
    })
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    bar.enable_steady_tick(Duration::from_millis(80));
    bar.set_message(message.to_string());
    bar
}

async fn cmd_upload(args: UploadArgs) -> Result<()> {
    let config = load_config()?;
    let options = upload_options(&config, &args)?;
    let client = connect(
        &config,
        args.email.as_deref(),
        args.password.as_deref(),
        args.token.as_deref(),
        args.env_file.as_deref(),
    )
    .await?;

    if args.path.is_dir() {
        let batch = BatchOptions {
            pattern: args
                .pattern
                .clone()
                .unwrap_or_else(|| config.upload.pattern.clone()),
            recursive: !args.no_recursive && config.upload.recursive,
            policy: if args.continue_on_error {
                FailurePolicy::ContinueOnError
            } else {
                FailurePolicy::FailFast
            },
        };

        let bar = spinner("Uploading articles...");
        let outcome =
            upload_articles_from_directory(&client, &options, &args.path, &batch).await?;
        bar.finish_and_clear();

        println!();
        println!("  Uploaded: {}", outcome.documents.len());
        for doc in &outcome.documents {
            println!("    • {}", doc.display_label());
        }
        if !outcome.failures.is_empty() {
            println!("  Failed:   {}", outcome.failures.len());
            for (file, err) in &outcome.failures {
                println!("    ✗ {}: {err}", file.display());
            }
            println!();
            return Err(eyre!("{} article(s) failed to upload", outcome.failures.len()));
        }
        println!();
    } else {
        let bar = spinner("Uploading article...");
        let doc = upload_article_from_file(&client, &options, &args.path).await?;
        bar.finish_and_clear();

        println!();
        println!("  Article upserted!");
        println!("  ID:    {}", doc.id_string().unwrap_or_default());
        println!("  Title: {}", doc.display_label());
        if let Some(slug) = doc.get_str(&config.fields.slug) {
            println!("  Slug:  {slug}");
        }
        println!();
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_cleanup(
    skip_articles: bool,
    skip_media: bool,
    skip_categories: bool,
    only: &[String],
    batch_size: u32,
    yes: bool,
    email: Option<&str>,
    password: Option<&str>,
    token: Option<&str>,
    env_file: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;

    // Articles first: they reference the media and categories swept after.
    let mut collections = Vec::new();
    if only.is_empty() {
        if !skip_articles {
            collections.push(config.collections.articles.clone());
        }
        if !skip_media {
            collections.push(config.collections.media.clone());
        }
        if !skip_categories {
            collections.push(config.collections.categories.clone());
        }
    } else {
        collections.extend(only.iter().cloned());
    }
    if collections.is_empty() {
        println!("Nothing to clean: every collection is skipped.");
        return Ok(());
    }

    println!(
        "This deletes ALL documents from: {} (at {})",
        collections.join(", "),
        config.store.base_url
    );
    if !yes && !confirm("Continue?")? {
        println!("Aborted.");
        return Ok(());
    }

    let client = connect(&config, email, password, token, env_file).await?;
    let bar = spinner("Sweeping collections...");
    let reports = clean_collections(&client, &collections, batch_size).await?;
    bar.finish_and_clear();

    println!();
    for (collection, report) in &reports {
        println!(
            "  {collection}: {} deleted, {} skipped, {} failed",
            report.deleted, report.skipped, report.failed
        );
    }
    println!();

    let failed: u64 = reports.iter().map(|(_, r)| r.failed).sum();
    if failed > 0 {
        return Err(eyre!("{failed} document(s) could not be deleted"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
