mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use socialcontext_domain::{ApiVersion, ContentType};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::{ClientsAction, JobsAction, Reply, TokenAction};
use crate::output::Output;

#[derive(Debug, Parser)]
#[command(name = "socialcontext", version, about = "socialcontext.ai API client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Write the JSON result to this file instead of stdout.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file to use instead of the probed locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the API version this client targets.
    Version,
    /// List the currently supported classification models.
    Models,
    /// Classify text, or text extracted from a URL.
    ///
    /// Exactly one of --url or --text must be provided.
    Classify {
        /// Content type. Currently only news is supported.
        #[arg(long, default_value_t = ContentType::News)]
        content_type: ContentType,
        /// Web URL to classify.
        #[arg(long, conflicts_with = "text")]
        url: Option<String>,
        /// Text to classify.
        #[arg(long)]
        text: Option<String>,
        /// Classification models.
        #[arg(required = true)]
        models: Vec<String>,
    },
    /// Show account information.
    Account,
    /// API client management.
    Clients {
        #[command(subcommand)]
        action: ClientsAction,
    },
    /// Batch job management.
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
    /// Cached token management.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Fetch the service's OpenAPI document.
    Openapi,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "socialcontext starting");

    if let Commands::Version = cli.command {
        println!("{}", ApiVersion::default().prefix());
        return Ok(());
    }

    let config = socialcontext_infra::config::load_from(cli.config.clone())
        .context("failed to load configuration")?;
    let client = socialcontext_infra::build_client(&config)?;

    let reply: Reply = commands::execute(cli.command, &client).await?;

    Output::new(cli.output).emit(&reply.body())?;
    reply.ensure_success()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("socialcontext").chain(args.iter().copied()))
    }

    #[test]
    fn parses_classify_with_models() {
        let cli = parse(&["classify", "--url", "https://example.com/a", "political", "wire"])
            .unwrap();

        match cli.command {
            Commands::Classify { content_type, url, text, models } => {
                assert_eq!(content_type, ContentType::News);
                assert_eq!(url.as_deref(), Some("https://example.com/a"));
                assert!(text.is_none());
                assert_eq!(models, vec!["political", "wire"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn classify_requires_models_and_one_source() {
        assert!(parse(&["classify", "--text", "hello"]).is_err());
        assert!(parse(&["classify", "--url", "u", "--text", "t", "political"]).is_err());
        assert!(parse(&["classify", "--content-type", "video", "--text", "t", "wire"]).is_err());
    }

    #[test]
    fn parses_jobs_create_with_repeated_options() {
        let cli = parse(&[
            "jobs",
            "create",
            "s3://bucket/in.csv",
            "--content-model",
            "political",
            "--content-model",
            "wire",
            "--domain-model",
            "low_cred",
            "--batch-size",
            "50",
            "--profile",
            "weekly",
        ])
        .unwrap();

        match cli.command {
            Commands::Jobs { action: JobsAction::Create(args) } => {
                assert_eq!(args.input_file, "s3://bucket/in.csv");
                assert_eq!(args.content_models, vec!["political", "wire"]);
                assert_eq!(args.domain_models, vec!["low_cred"]);
                assert_eq!(args.batch_size, 50);
                assert_eq!(args.profile.as_deref(), Some("weekly"));
                assert!(args.output_path.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = parse(&["jobs", "info", "42", "--output", "out.json", "--log-level", "debug"])
            .unwrap();

        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Jobs { action: JobsAction::Info { .. } }));
    }

    #[test]
    fn parses_management_commands() {
        assert!(matches!(
            parse(&["clients", "create", "reporting"]).unwrap().command,
            Commands::Clients { action: ClientsAction::Create { .. } }
        ));
        assert!(matches!(
            parse(&["token", "clear"]).unwrap().command,
            Commands::Token { action: TokenAction::Clear }
        ));
        assert!(matches!(parse(&["version"]).unwrap().command, Commands::Version));
    }
}
