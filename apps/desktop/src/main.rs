use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    test_listing::load_subjects, upload_session::SUBMIT_ERROR, DashboardClient, LeaveFlag,
    LeaveHook, LeaveKind, PendingFile, ResultView, SessionContext, SessionDeps, SessionTimings,
    StatusFilter, SubjectFilter, SubmitOutcome, TestDataFetcher, TestListing, UploadSession,
};
use shared::domain::{StudentId, SubmissionId, TestId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod render;
mod upload_view;

use config::{load_settings, Settings};
use console::{DeclinePrompt, TerminalNavigator};

#[derive(Parser, Debug)]
#[command(name = "testdesk", about = "Student physical-test dashboard")]
struct Args {
    /// Backend base url.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    student_id: Option<String>,
    #[arg(long, global = true)]
    standard: Option<u32>,
    /// Config file; `dashboard.toml` is read when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tests for the student's standard.
    Tests {
        #[arg(long, default_value = "all")]
        subject: String,
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// List subjects for the student's standard.
    Subjects,
    /// Show a test's questions.
    Show { test_id: String },
    /// Submit answer sheets and wait for the redirect.
    Submit {
        test_id: String,
        files: Vec<PathBuf>,
    },
    /// Open the interactive upload view.
    Upload {
        test_id: String,
        files: Vec<PathBuf>,
    },
    /// Show the graded result of a submission.
    Result { submission_id: String },
}

pub(crate) struct AppContext {
    settings: Settings,
    client: Arc<DashboardClient>,
}

impl AppContext {
    fn new(settings: Settings) -> Result<Self> {
        let client = DashboardClient::new(&settings.api_url)?;
        Ok(Self {
            settings,
            client: Arc::new(client),
        })
    }

    fn session_context(&self) -> Result<SessionContext> {
        let student_id = self
            .settings
            .student_id
            .clone()
            .ok_or_else(|| anyhow!("student id missing; pass --student-id or set STUDENT_ID"))?;
        let context = SessionContext::new(StudentId::new(student_id));
        Ok(match self.settings.standard {
            Some(standard) => context.with_standard(standard),
            None => context,
        })
    }

    fn standard(&self) -> Result<u32> {
        self.settings
            .standard
            .ok_or_else(|| anyhow!("standard missing; pass --standard or set APP__STANDARD"))
    }
}

fn apply_flags(settings: &mut Settings, args: &Args) {
    if let Some(url) = &args.api_url {
        settings.api_url = url.clone();
    }
    if let Some(id) = &args.student_id {
        settings.student_id = Some(id.clone());
    }
    if let Some(standard) = args.standard {
        settings.standard = Some(standard);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    apply_flags(&mut settings, &args);
    info!(api_url = %settings.api_url, "starting testdesk");
    let app = AppContext::new(settings)?;

    match args.command {
        Command::Tests { subject, status } => {
            let mut listing = TestListing::new(app.standard()?);
            listing.set_status_filter(StatusFilter::parse(&status));
            listing
                .set_subject_filter(app.client.as_ref(), SubjectFilter::parse(&subject))
                .await;
            print!("{}", render::listing(&listing));
        }
        Command::Subjects => {
            let subjects = load_subjects(app.client.as_ref(), app.standard()?).await;
            print!("{}", render::subjects(&subjects));
        }
        Command::Show { test_id } => {
            let test = app
                .client
                .fetch_test(&TestId::new(test_id.clone()))
                .await
                .with_context(|| format!("failed to load test {test_id}"))?;
            print!("{}", render::test_details(&test));
        }
        Command::Submit { test_id, files } => submit_once(&app, TestId::new(test_id), files).await?,
        Command::Upload { test_id, files } => {
            upload_view::run(&app, TestId::new(test_id), files).await?
        }
        Command::Result { submission_id } => {
            let submission_id = SubmissionId::new(submission_id);
            let view = ResultView::load(app.client.as_ref(), &submission_id).await;
            print!("{}", render::result(&view));
        }
    }
    Ok(())
}

async fn submit_once(app: &AppContext, test_id: TestId, files: Vec<PathBuf>) -> Result<()> {
    let (navigator, mut routes) = TerminalNavigator::new();
    let deps = SessionDeps {
        fetcher: app.client.clone(),
        endpoint: app.client.clone(),
        navigator: Arc::new(navigator),
        prompt: Arc::new(DeclinePrompt),
        leave_hooks: vec![
            LeaveFlag::new(LeaveKind::Unload) as Arc<dyn LeaveHook>,
            LeaveFlag::new(LeaveKind::Back) as Arc<dyn LeaveHook>,
        ],
        timings: SessionTimings {
            notice_dismiss: app.settings.notice_delay(),
            redirect_delay: app.settings.notice_delay(),
        },
    };
    let session = UploadSession::mount(app.session_context()?, test_id, deps).await;
    session.add_files(files.into_iter().map(PendingFile::from_path));

    let outcome = session.submit().await;
    print!("{}", render::session(&session.snapshot()));
    match outcome {
        SubmitOutcome::Submitted => {
            if let Some(route) = routes.recv().await {
                println!("-> {}", route.path());
            }
        }
        SubmitOutcome::Failed(reason) => {
            session.teardown();
            bail!("{SUBMIT_ERROR} ({reason})");
        }
        SubmitOutcome::NothingToSubmit
        | SubmitOutcome::AlreadyUploading
        | SubmitOutcome::Detached => {}
    }
    session.teardown();
    Ok(())
}
