use anyhow::Result;
use clap::{Parser, Subcommand};
use domforge_lib::api::{ApiError, ConversationSession, Notice};
use domforge_lib::auth::AuthCallback;
use domforge_lib::config::ClientConfig;
use domforge_lib::generation::WatchOutcome;
use domforge_lib::inputs::UserInputForm;
use domforge_lib::panels::{
    render_domain_analysis, render_generation_status, render_round_analysis, render_transcript,
};
use domforge_lib::questionnaire::{QuestionnaireRunner, ResumeState};
use domforge_lib::AppContext;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "domforge")]
#[command(about = "DomForge - turn requirements into microservice architecture packages", long_about = None)]
struct Cli {
    /// API base URL (overrides DOMFORGE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Data directory (overrides DOMFORGE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FormArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
}

impl From<FormArgs> for UserInputForm {
    fn from(args: FormArgs) -> Self {
        UserInputForm {
            name: args.name,
            email: args.email,
            phone_number: args.phone,
            title: args.title,
            content: args.content,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL that starts the Google sign-in flow
    LoginUrl,
    /// Complete sign-in with the parameters the login redirect carried
    AuthCallback {
        /// Raw callback query or URL, e.g. "userId=7&name=Ada"
        #[arg(long, conflicts_with = "user_id")]
        query: Option<String>,
        #[arg(long)]
        user_id: Option<i64>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Logout,
    Whoami,
    /// List completed and in-progress projects
    Sessions {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Start a new project and show its foundation questions
    New {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Resume a project: print its history and where it stands
    Resume {
        session_id: i64,
        /// Expand analysis panels inside the transcript
        #[arg(long)]
        expand: bool,
    },
    /// Answer the open questions of a project's active round, in order
    Answer {
        session_id: i64,
        answers: Vec<String>,
    },
    /// Approve the domain analysis and start package generation
    Approve { session_id: i64 },
    /// Show generation progress
    Status {
        session_id: i64,
        /// Keep polling until generation finishes (Ctrl-C stops)
        #[arg(long)]
        watch: bool,
    },
    /// Download the generated package archive
    Download {
        session_id: i64,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Show the latest analysis of a project
    Analysis { session_id: i64 },
    Delete { session_id: i64 },
    Credits,
    /// Show plans, credit packs and the current subscription
    Plans,
    Subscribe { plan_id: i64 },
    BuyCredits { pack_id: i64 },
    CancelSubscription,
    ContactSales(FormArgs),
    Feedback(FormArgs),
}

fn print_notice(notice: &Notice) {
    println!("{}: {}", notice.title, notice.description);
}

fn print_state(runner: &QuestionnaireRunner) {
    println!("State: {}", runner.state().label());
    match runner.state() {
        ResumeState::Foundation(progress) | ResumeState::Followup(progress) => {
            println!(
                "Answered {} of {} questions",
                progress.answered_count(),
                progress.prompts.len()
            );
            for (index, prompt) in progress.prompts.iter().enumerate() {
                let marker = if prompt.is_answered() { "x" } else { " " };
                println!("[{}] {}. {}", marker, index + 1, prompt.text);
                if let Some(hint) = prompt.hint.as_deref() {
                    println!("      {}", hint);
                }
            }
        }
        ResumeState::DomainApproval { analysis } | ResumeState::Failed { analysis } => {
            if let Some(analysis) = analysis {
                println!("{}", render_round_analysis(analysis));
            }
            println!("Run `domforge approve {}` to generate packages.", runner.session_id());
        }
        ResumeState::Generating => {
            println!("Run `domforge status {} --watch` to follow generation.", runner.session_id());
        }
    }
}

fn print_sessions(title: &str, sessions: &[ConversationSession]) {
    println!("{} ({})", title, sessions.len());
    for session in sessions {
        println!(
            "  {:>6}  {:<32} {:>4.0}%  {}",
            session.session_id,
            session.display_name(),
            session.confidence() * 100.0,
            session.current_phase.as_deref().unwrap_or("-")
        );
    }
}

async fn resume_runner(app: &AppContext, session_id: i64) -> Result<QuestionnaireRunner, ApiError> {
    let user = app.auth.require_user()?;
    let plan = app.dashboard.continue_project(session_id, user.id).await?;
    if let Some(notice) = &plan.notice {
        print_notice(notice);
    }
    Ok(app.runner(plan))
}

async fn watch_status(app: &AppContext, session_id: i64) -> Result<(), ApiError> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = app
        .monitor
        .watch(session_id, &cancel, |status| {
            println!("{}", render_generation_status(status));
        })
        .await?;
    match outcome {
        WatchOutcome::Completed(_) => {
            println!("Generation complete. Run `domforge download {}`.", session_id)
        }
        WatchOutcome::Failed(status) => println!(
            "Generation failed: {}",
            status.error_message.as_deref().unwrap_or("unknown error")
        ),
        WatchOutcome::Cancelled => println!("Stopped watching."),
    }
    Ok(())
}

async fn run(app: &AppContext, command: Commands) -> Result<(), ApiError> {
    match command {
        Commands::LoginUrl => println!("{}", app.auth.login_url()),
        Commands::AuthCallback {
            query,
            user_id,
            name,
            email,
        } => {
            let callback = match query {
                Some(query) => AuthCallback::from_query(&query),
                None => AuthCallback {
                    user_id,
                    name,
                    email,
                    error: None,
                },
            };
            let user = app.auth.handle_auth_callback(&callback).await?;
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        Commands::Logout => {
            app.auth.logout()?;
            println!("Signed out.");
        }
        Commands::Whoami => match app.auth.current_user() {
            Some(user) => println!("{} <{}> (id {})", user.name, user.email, user.id),
            None => println!("Not signed in."),
        },
        Commands::Sessions { filter } => {
            app.auth.require_user()?;
            let lists = app.dashboard.load_sessions().await?;
            let lists = lists.filter(filter.as_deref().unwrap_or_default());
            if lists.is_empty() {
                println!("No projects found.");
            } else {
                print_sessions("In progress", &lists.in_analysis);
                print_sessions("Completed", &lists.completed);
            }
        }
        Commands::New { name, description } => {
            let user = app.auth.require_user()?;
            let plan = app
                .dashboard
                .create_project(user.id, &name, description.as_deref())
                .await?;
            println!("Created project {}", plan.session.session_id);
            print_state(&app.runner(plan));
        }
        Commands::Resume { session_id, expand } => {
            let runner = resume_runner(app, session_id).await?;
            if !runner.transcript().is_empty() {
                println!("{}\n", render_transcript(runner.transcript(), expand));
            }
            print_state(&runner);
        }
        Commands::Answer { session_id, answers } => {
            let mut runner = resume_runner(app, session_id).await?;
            for answer in &answers {
                if !runner.answer(answer) || !runner.next() {
                    break;
                }
            }
            let complete = runner
                .state()
                .progress()
                .is_some_and(|p| p.first_unanswered().is_none());
            if complete {
                runner.submit().await?;
                if let Some(analysis) = runner.last_analysis() {
                    println!("{}\n", render_round_analysis(analysis));
                }
            }
            print_state(&runner);
            if !complete {
                if let Some(notice) = runner.unsubmitted_notice() {
                    print_notice(&notice);
                }
            }
        }
        Commands::Approve { session_id } => {
            let mut runner = resume_runner(app, session_id).await?;
            runner.approve().await?;
            print_state(&runner);
        }
        Commands::Status { session_id, watch } => {
            app.auth.require_user()?;
            if watch {
                watch_status(app, session_id).await?;
            } else {
                let status = app.monitor.fetch_status(session_id).await?;
                println!("{}", render_generation_status(&status));
            }
        }
        Commands::Download { session_id, dir } => {
            app.auth.require_user()?;
            let path = app.dashboard.download_project(session_id, &dir).await?;
            println!("Saved {}", path.display());
        }
        Commands::Analysis { session_id } => {
            app.auth.require_user()?;
            let lists = app.dashboard.load_sessions().await?;
            let session = lists
                .find(session_id)
                .cloned()
                .unwrap_or_else(|| ConversationSession {
                    session_id,
                    ..Default::default()
                });
            let view = app.dashboard.view_analysis(&session).await?;
            println!("{}\n", view.project_name);
            match (&view.domain_analysis, &view.analysis) {
                (Some(domains), _) => println!("{}", render_domain_analysis(domains)),
                (None, Some(analysis)) => println!("{}", render_round_analysis(analysis)),
                (None, None) => println!("No analysis available yet."),
            }
        }
        Commands::Delete { session_id } => {
            app.auth.require_user()?;
            app.dashboard.delete_project(session_id).await?;
            println!("Deleted project {}", session_id);
        }
        Commands::Credits => {
            app.auth.require_user()?;
            let credits = app.api.get_credit_balance().await?;
            println!("Credits: {}", credits.credits_balance);
        }
        Commands::Plans => {
            let user = app.auth.require_user()?;
            let overview = app.billing.load_overview(user.id).await?;
            println!("Credits: {}", overview.credits.credits_balance);
            for plan in &overview.plans {
                let current = overview.current_plan.as_ref().is_some_and(|p| p.id == plan.id);
                println!(
                    "{} {:>4}  {:<20} ${:.2}/month  {}",
                    if current { "*" } else { " " },
                    plan.id,
                    plan.name.as_deref().unwrap_or("-"),
                    plan.price_monthly,
                    plan.credits_summary.as_deref().unwrap_or("")
                );
            }
            for pack in &overview.credit_packs {
                println!(
                    "  pack {:>4}  {:<20} {} credits  ${:.2}",
                    pack.credit_pack_id,
                    pack.name.as_deref().unwrap_or("-"),
                    pack.credits,
                    pack.price
                );
            }
            if overview.has_active_subscription() {
                println!("Subscription active.");
            }
        }
        Commands::Subscribe { plan_id } => {
            let user = app.auth.require_user()?;
            println!("{}", app.billing.subscribe(user.id, plan_id).await?);
        }
        Commands::BuyCredits { pack_id } => {
            let user = app.auth.require_user()?;
            println!("{}", app.billing.buy_credit_pack(user.id, pack_id).await?);
        }
        Commands::CancelSubscription => {
            let user = app.auth.require_user()?;
            app.billing.cancel_subscription(user.id).await?;
            println!("Subscription cancelled.");
        }
        Commands::ContactSales(form) => {
            let user = app.auth.current_user();
            print_notice(&app.inputs.contact_sales(form.into(), user.as_ref()).await?);
        }
        Commands::Feedback(form) => {
            let user = app.auth.current_user();
            print_notice(&app.inputs.feedback(form.into(), user.as_ref()).await?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_base_url(url);
    }
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    info!("Using API {}", config.api_base_url);

    let app = AppContext::open(config)?;
    if let Err(e) = run(&app, cli.command).await {
        let notice = e.notice("Request failed");
        eprintln!("{}: {}", notice.title, notice.description);
        return Err(e.into());
    }
    Ok(())
}
