use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use forged::{
    config::DaemonConfig,
    directive::{GenerationMode, GenerationRequest},
    github, pipeline,
    provider::OpenAiSynthesizer,
    rest, AppContext,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "forged",
    about = "Forge Host — AI project generation daemon",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST server port
    #[arg(long, env = "FORGED_PORT")]
    port: Option<u16>,

    /// Data directory for config and generated projects
    #[arg(long, env = "FORGED_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Directory generated projects are written under (default: {data_dir}/projects)
    #[arg(long, env = "FORGED_PROJECTS_DIR")]
    projects_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FORGED_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "FORGED_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "FORGED_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon server (default when no subcommand given).
    ///
    /// Runs forged in the foreground.
    ///
    /// Examples:
    ///   forged serve
    ///   forged
    Serve,
    /// Generate one project from the command line and exit.
    ///
    /// Runs the same pipeline as POST /generate, printing the project path
    /// and file list. When GITHUB_TOKEN is set, a matching public GitHub
    /// repository is created afterwards (best effort).
    ///
    /// Examples:
    ///   forged generate --prompt "FastAPI microservice for user auth with JWT"
    ///   forged generate --prompt "CSV pipeline" --tech-stack "FastAPI, Pandas"
    ///   forged generate --advanced
    Generate {
        /// Project description
        #[arg(long)]
        prompt: Option<String>,
        /// Special features (comma-separated)
        #[arg(long)]
        features: Option<String>,
        /// Preferred technologies
        #[arg(long)]
        tech_stack: Option<String>,
        /// Run the built-in minimal project request instead of a custom prompt
        #[arg(long, conflicts_with_all = ["prompt", "features", "tech_stack"])]
        simple: bool,
        /// Run the built-in full-featured project request instead of a custom prompt
        #[arg(long, conflicts_with_all = ["prompt", "features", "tech_stack", "simple"])]
        advanced: bool,
        /// Skip the GitHub upload even when GITHUB_TOKEN is set
        #[arg(long)]
        no_upload: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Arc::new(DaemonConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
        args.projects_dir,
    ));

    // Init once — must happen before any tracing calls.
    let _file_guard = setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);

    match args.command {
        Some(Command::Generate {
            prompt,
            features,
            tech_stack,
            simple,
            advanced,
            no_upload,
        }) => {
            run_generate(config, prompt, features, tech_stack, simple, advanced, no_upload).await?;
        }
        None | Some(Command::Serve) => {
            run_server(config).await?;
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("forged.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            // Fall back to stdout-only — don't panic on a bad log path.
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            init_stdout_logging(log_level, use_json);
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else {
        init_stdout_logging(log_level, use_json);
        None
    }
}

fn init_stdout_logging(log_level: &str, use_json: bool) {
    if use_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
}

/// Build the provider client, or fail with the one startup error every
/// operator hits first.
fn make_synthesizer(config: &DaemonConfig) -> Result<Arc<OpenAiSynthesizer>> {
    let api_key = config
        .api_key
        .clone()
        .context("OPENAI_API_KEY is not set — the synthesis provider cannot be reached")?;
    Ok(Arc::new(OpenAiSynthesizer::new(&config.provider, api_key)?))
}

async fn run_server(config: Arc<DaemonConfig>) -> Result<()> {
    tokio::fs::create_dir_all(&config.projects_dir)
        .await
        .with_context(|| {
            format!(
                "could not create projects directory {}",
                config.projects_dir.display()
            )
        })?;

    let synthesizer = make_synthesizer(&config)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        projects_dir = %config.projects_dir.display(),
        model = %config.provider.model,
        "forged starting"
    );

    let ctx = Arc::new(AppContext::new(config, synthesizer));
    rest::start_rest_server(ctx).await
}

#[allow(clippy::too_many_arguments)]
async fn run_generate(
    config: Arc<DaemonConfig>,
    prompt: Option<String>,
    features: Option<String>,
    tech_stack: Option<String>,
    simple: bool,
    advanced: bool,
    no_upload: bool,
) -> Result<()> {
    let (mode, body) = if simple {
        (GenerationMode::Simple, None)
    } else if advanced {
        (GenerationMode::Advanced, None)
    } else {
        let prompt = match prompt {
            Some(p) => p,
            None => bail!("either --prompt, --simple, or --advanced is required"),
        };
        (
            GenerationMode::Custom,
            Some(GenerationRequest {
                prompt,
                features,
                tech_stack,
            }),
        )
    };

    let synthesizer = make_synthesizer(&config)?;
    let ctx = AppContext::new(config.clone(), synthesizer);

    let result = pipeline::generate(&ctx, mode, body).await?;

    println!("Project generated at {}", result.project_path);
    for file in &result.files {
        println!("  {file}");
    }

    if !no_upload {
        if let Some(token) = &config.github_token {
            let repo_name = std::path::Path::new(&result.project_path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("forged-project")
                .to_string();
            match github::create_repository(token, &repo_name).await {
                Ok(url) => println!("Repository URL: {url}"),
                Err(e) => warn!(err = %e, "GitHub upload skipped"),
            }
        }
    }

    Ok(())
}
