use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::domain::types::PostStatus;

/// Command-line arguments for the postdesk binary.
#[derive(Debug, Parser)]
#[command(
    name = "postdesk",
    version,
    about = "Create and edit blog posts against a remote content service"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "POSTDESK_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Create a new post; a featured image is required.
    Create(Box<CreateArgs>),
    /// Edit an existing post, optionally replacing its featured image.
    Edit(Box<EditArgs>),
    /// Print the slug derived from a title.
    Slug(SlugArgs),
    /// Print the preview URL of a stored file.
    Preview(PreviewArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PostStatusArg {
    Active,
    Inactive,
}

impl From<PostStatusArg> for PostStatus {
    fn from(value: PostStatusArg) -> Self {
        match value {
            PostStatusArg::Active => PostStatus::Active,
            PostStatusArg::Inactive => PostStatus::Inactive,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub overrides: RemoteOverrides,

    /// Post title; the slug is derived from it.
    #[arg(long)]
    pub title: String,

    /// Slug to use instead of the derived one (normalized the same way).
    #[arg(long)]
    pub slug: Option<String>,

    /// Post content inline.
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read post content from a file.
    #[arg(long = "content-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = PostStatusArg::Active)]
    pub status: PostStatusArg,

    /// Featured image (png, jpeg or gif).
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub image: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct EditArgs {
    #[command(flatten)]
    pub overrides: RemoteOverrides,

    /// Identifier of the post to edit.
    #[arg(long = "post-id", value_name = "ID")]
    pub post_id: String,

    /// New title; re-derives the slug.
    #[arg(long)]
    pub title: Option<String>,

    /// New slug (applied after any title change).
    #[arg(long)]
    pub slug: Option<String>,

    /// New content inline.
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read new content from a file.
    #[arg(long = "content-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub status: Option<PostStatusArg>,

    /// Replacement featured image; the previous one is deleted after upload.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SlugArgs {
    /// Title to derive the slug from.
    pub title: String,
}

#[derive(Debug, Args, Clone)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub overrides: RemoteOverrides,

    /// Identifier of the stored file.
    pub file_id: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RemoteOverrides {
    /// Override the content service base URL.
    #[arg(long = "remote-base-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub base_url: Option<String>,

    /// Override the site URL that detail paths are resolved against.
    #[arg(long = "remote-site-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub site_url: Option<String>,

    /// Path to a file containing the API key (takes precedence over config and env).
    #[arg(long = "api-key-file", env = "POSTDESK_API_KEY_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub api_key_file: Option<PathBuf>,

    /// Override the request timeout.
    #[arg(long = "remote-timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Override the authenticated user id.
    #[arg(long = "user-id", value_name = "ID")]
    pub user_id: Option<String>,

    /// Override the submission policy (corrected|legacy).
    #[arg(long = "workflow-policy", value_name = "POLICY")]
    pub policy: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

impl Command {
    /// Overrides carried by the subcommand, if it talks to the service.
    pub fn overrides(&self) -> Option<&RemoteOverrides> {
        match self {
            Command::Create(args) => Some(&args.overrides),
            Command::Edit(args) => Some(&args.overrides),
            Command::Preview(args) => Some(&args.overrides),
            Command::Slug(_) => None,
        }
    }
}
