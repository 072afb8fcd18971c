use std::{path::Path, process, sync::Arc};

use postdesk::{
    application::{
        error::SubmissionError,
        form::{FormEvent, PostForm},
        ports::{ContentService, ServiceError},
        submission::{PostSubmissionService, SubmissionOutcome},
    },
    config::{self, Command, CreateArgs, EditArgs, PreviewArgs, Settings},
    domain::{
        slug::slug_transform,
        types::{AuthenticatedUser, FileId, PostId},
    },
    infra::{
        console::{ConsoleNavigator, ConsoleReporter},
        error::InfraError,
        http::RemoteContentService,
        telemetry,
        uploads::load_image,
    },
};
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::LoadError),
    #[error("remote.base_url is not configured")]
    MissingBaseUrl,
    #[error("remote.api_key is not configured")]
    MissingKey,
    #[error("user.id is not configured")]
    MissingUser,
    #[error("failed to read {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("post `{0}` was not found")]
    PostNotFound(PostId),
    #[error("{}", .0.user_message())]
    Submission(SubmissionError),
    #[error("submission stopped without a report; the form is still loading")]
    Stalled,
    #[error("a submission for this form is already in flight")]
    Ignored,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_cli_error(&error);
        process::exit(1);
    }
}

fn report_cli_error(error: &CliError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "postdesk failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "postdesk failed");
    });
}

async fn run() -> Result<(), CliError> {
    let (cli_args, settings) = config::load_with_cli()?;

    match cli_args.command {
        Command::Slug(args) => {
            println!("{}", slug_transform(&args.title));
            Ok(())
        }
        Command::Preview(args) => run_preview(settings, args),
        Command::Create(args) => {
            telemetry::init(&settings.logging)?;
            run_create(settings, *args).await
        }
        Command::Edit(args) => {
            telemetry::init(&settings.logging)?;
            run_edit(settings, *args).await
        }
    }
}

fn run_preview(settings: Settings, args: PreviewArgs) -> Result<(), CliError> {
    let base = settings
        .remote
        .base_url
        .ok_or(CliError::MissingBaseUrl)?;
    let service = RemoteContentService::new(
        base,
        settings.remote.api_key.unwrap_or_default(),
        settings.remote.timeout,
    )?;
    let url = service.file_preview(&FileId::new(args.file_id))?;
    println!("{url}");
    Ok(())
}

async fn run_create(settings: Settings, args: CreateArgs) -> Result<(), CliError> {
    let (submission, user) = build_submission(&settings)?;

    let mut form = PostForm::create();
    form.apply(FormEvent::TitleChanged(args.title));
    if let Some(slug) = args.slug {
        form.apply(FormEvent::SlugChanged(slug));
    }
    let content = read_content(args.content, args.content_file.as_deref())
        .await?
        .unwrap_or_default();
    form.apply(FormEvent::ContentChanged(content));
    form.apply(FormEvent::StatusChanged(args.status.into()));
    form.apply(FormEvent::ImageSelected(Some(load_image(&args.image).await?)));

    let outcome = submission.submit(&mut form, &user).await;
    finish(outcome)
}

async fn run_edit(settings: Settings, args: EditArgs) -> Result<(), CliError> {
    let (submission, user) = build_submission(&settings)?;

    let post_id = PostId::new(args.post_id);
    let post = submission
        .content()
        .get_post(&post_id)
        .await?
        .ok_or(CliError::PostNotFound(post_id))?;

    match submission.content().file_preview(&post.featured_image) {
        Ok(preview) => info!(post_id = %post.id, %preview, "current featured image"),
        Err(err) => info!(post_id = %post.id, error = %err, "featured image preview unavailable"),
    }

    let mut form = PostForm::edit(post);
    if let Some(title) = args.title {
        form.apply(FormEvent::TitleChanged(title));
    }
    if let Some(slug) = args.slug {
        form.apply(FormEvent::SlugChanged(slug));
    }
    if let Some(content) = read_content(args.content, args.content_file.as_deref()).await? {
        form.apply(FormEvent::ContentChanged(content));
    }
    if let Some(status) = args.status {
        form.apply(FormEvent::StatusChanged(status.into()));
    }
    if let Some(path) = args.image.as_deref() {
        form.apply(FormEvent::ImageSelected(Some(load_image(path).await?)));
    }

    let outcome = submission.submit(&mut form, &user).await;
    finish(outcome)
}

fn build_submission(
    settings: &Settings,
) -> Result<(PostSubmissionService, AuthenticatedUser), CliError> {
    let remote = &settings.remote;
    let base = remote.base_url.clone().ok_or(CliError::MissingBaseUrl)?;
    let api_key = remote.api_key.clone().ok_or(CliError::MissingKey)?;
    let user_id = settings.user.id.clone().ok_or(CliError::MissingUser)?;
    let site = remote.site_url.clone().unwrap_or_else(|| base.clone());

    let content = RemoteContentService::new(base, api_key, remote.timeout)?;
    let submission = PostSubmissionService::new(
        Arc::new(content),
        Arc::new(ConsoleNavigator::new(site)),
        Arc::new(ConsoleReporter),
        settings.workflow.policy,
    );
    Ok((submission, AuthenticatedUser::new(user_id)))
}

async fn read_content(
    inline: Option<String>,
    file: Option<&Path>,
) -> Result<Option<String>, CliError> {
    match (inline, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .map(Some)
            .map_err(|source| CliError::InputFile {
                path: path.display().to_string(),
                source,
            }),
        (None, None) => Ok(None),
    }
}

fn finish(outcome: SubmissionOutcome) -> Result<(), CliError> {
    match outcome {
        SubmissionOutcome::Navigated { post_id, path } => {
            info!(post_id = %post_id, path = %path, "post saved");
            Ok(())
        }
        SubmissionOutcome::Failed(error) => Err(CliError::Submission(error)),
        SubmissionOutcome::Stalled => Err(CliError::Stalled),
        SubmissionOutcome::Ignored => Err(CliError::Ignored),
    }
}
