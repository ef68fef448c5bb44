//! `chat2blog` - browse media from Beeper chats and turn it into blog posts.
//!
//! Every command prints a JSON envelope on stdout; logs go to stderr.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chat2blog_beeper::{BeeperClient, ChatFilter};
use chat2blog_core::credentials;
use chat2blog_core::{
    AdminService, Envelope, ImportRepository, MediaAggregator, MediaImporter, MediaLibrary,
    PostFormat, PostMedia, PostRequest,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::Settings;

const DEFAULT_LOG_FILTER: &str = "chat2blog=info,chat2blog_core=info,chat2blog_beeper=info";

#[derive(Parser, Debug)]
#[command(name = "chat2blog", version)]
#[command(about = "Browse media from Beeper chats and turn it into blog posts")]
struct Cli {
    /// Beeper access token (overrides the environment and keyring).
    #[arg(long, global = true)]
    token: Option<String>,

    /// Beeper Desktop API base URL.
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Log filter, e.g. `debug` or `chat2blog_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the stored access token.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Check the connection to Beeper Desktop.
    Test,
    /// List chats, most recently active first.
    Chats {
        /// Only group chats.
        #[arg(long)]
        groups: bool,
    },
    /// Show the next page of media in a chat.
    Media {
        /// Chat identifier.
        chat_id: String,
        /// Continue from this cursor.
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Import the next page of media in a chat.
    Import {
        /// Chat identifier.
        chat_id: String,
        /// Continue from this cursor.
        #[arg(long)]
        cursor: Option<String>,
    },
    /// List imported media handles.
    Imported,
    /// Import media and compose a post.
    Post {
        /// Post title.
        #[arg(long)]
        title: String,
        /// Intro paragraph.
        #[arg(long)]
        text: Option<String>,
        /// Layout: `gallery` or `images`.
        #[arg(long, default_value = "gallery")]
        format: PostFormat,
        /// Chat the media came from.
        #[arg(long)]
        chat: Option<String>,
        /// Media handles, in post order.
        #[arg(required = true)]
        handles: Vec<String>,
    },
    /// Print the effective settings.
    Settings {
        /// Also write them to the settings file.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TokenAction {
    /// Store a token in the system keyring and test it.
    Set {
        /// Access token from Beeper Desktop.
        token: String,
    },
    /// Remove the stored token.
    Clear,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&settings_path).await?;
    if let Some(api_base) = &cli.api_base {
        settings.api_base.clone_from(api_base);
    }

    match cli.command {
        Command::Settings { save } => {
            if save {
                settings.save(&settings_path).await?;
            }
            emit(&Envelope::ok(settings))
        }
        command => {
            let mut service = build_service(&settings, cli.token).await?;
            debug!(api_base = %settings.api_base, "Service ready");
            run(&mut service, &settings, command).await
        }
    }
}

async fn run(service: &mut AdminService, settings: &Settings, command: Command) -> Result<ExitCode> {
    match command {
        Command::Token { action } => match action {
            TokenAction::Set { token } => {
                let token = token.trim().to_string();
                credentials::store_token(&settings.profile, &token)?;
                info!("Token stored for profile {}", settings.profile);
                emit(&service.apply_token(Some(token)).await)
            }
            TokenAction::Clear => {
                credentials::delete_token(&settings.profile)?;
                emit(&service.apply_token(None).await)
            }
        },
        Command::Test => emit(&service.test_connection().await),
        Command::Chats { groups } => {
            let filter = if groups { ChatFilter::Group } else { ChatFilter::All };
            emit(&service.get_all_chats(filter).await)
        }
        Command::Media { chat_id, cursor } => {
            emit(&service.get_media_messages(&chat_id, cursor.as_deref()).await)
        }
        Command::Import { chat_id, cursor } => {
            emit(&service.import_page(&chat_id, cursor.as_deref()).await)
        }
        Command::Imported => emit(&service.imported_handles().await),
        Command::Post {
            title,
            text,
            format,
            chat,
            handles,
        } => {
            let request = PostRequest {
                title,
                text,
                format,
                media: handles.into_iter().map(PostMedia::remote).collect(),
                chat_id: chat,
            };
            emit(&service.create_post(&request).await)
        }
        Command::Settings { .. } => emit(&Envelope::ok(settings)),
    }
}

fn init_logging(level: Option<&str>) {
    let filter = level.map_or_else(
        || {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
        },
        tracing_subscriber::EnvFilter::new,
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn build_service(settings: &Settings, token_flag: Option<String>) -> Result<AdminService> {
    let env_token = std::env::var(settings::TOKEN_ENV).ok();
    let token = settings::resolve_token(token_flag, env_token, &settings.profile);

    let mut client = BeeperClient::new(settings.client_config()?)?;
    client.set_token(token);

    let data_dir = settings::data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let db_path = settings::database_path();
    let repository = ImportRepository::new(db_path.to_str().unwrap_or("chat2blog.db")).await?;
    let library = MediaLibrary::open(settings.library_dir(), settings.library_base_url.clone()).await?;

    Ok(AdminService::new(
        client,
        MediaAggregator::new(settings.aggregator_config()),
        MediaImporter::new(repository, library),
    )
    .with_chat_limit(settings.chat_limit))
}

/// Prints an envelope and maps its outcome to the exit code.
fn emit<T: Serialize>(envelope: &Envelope<T>) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(if envelope.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_arguments() {
        let cli = Cli::try_parse_from([
            "chat2blog",
            "post",
            "--title",
            "Road trip",
            "--format",
            "images",
            "mxc://a/1",
            "mxc://a/2",
        ])
        .unwrap();

        match cli.command {
            Command::Post {
                title,
                format,
                handles,
                text,
                ..
            } => {
                assert_eq!(title, "Road trip");
                assert_eq!(format, PostFormat::Images);
                assert_eq!(handles, ["mxc://a/1", "mxc://a/2"]);
                assert!(text.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chat2blog",
            "media",
            "!chat:beeper.com",
            "--cursor",
            "12345",
            "--token",
            "t",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("t"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(
            cli.command,
            Command::Media { ref chat_id, ref cursor }
                if chat_id == "!chat:beeper.com" && cursor.as_deref() == Some("12345")
        ));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Cli::try_parse_from(["chat2blog", "post", "--title", "x"]).is_err());
        assert!(
            Cli::try_parse_from(["chat2blog", "post", "--title", "x", "--format", "carousel", "h"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["chat2blog", "token", "set"]).is_err());
    }
}
