use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use hireflow::api::{
    AnalyzeDocumentRequest, CreateAvatarSessionRequest, StartInterviewRequest, Suggestions,
};
use hireflow::avatar::{AvatarClient, TungsteniteConnector};
use hireflow::documents::DocumentUpload;
use hireflow::session::{PracticeStep, TextView};
use hireflow::{
    ApiClient, ComprehensiveProfile, Config, Notice, NoticeLevel, Notifier, PracticeFlow,
    TextInterview,
};

/// Hireflow - job-seeker interview practice and career insights
#[derive(Parser)]
#[command(name = "hireflow", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a resume or cover letter
    Upload {
        /// PDF, Word, or plain-text document (max 10 MiB)
        file: PathBuf,
    },
    /// Upload and analyze a document
    Analyze {
        file: PathBuf,
        /// Don't save the analysis to history
        #[arg(long)]
        no_history: bool,
    },
    /// Career suggestions generated from your profile
    Suggestions,
    /// Saved analyses
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Answer interview questions in text, one per line on stdin
    Interview {
        /// Job title to tailor questions to
        #[arg(long)]
        job_title: Option<String>,
    },
    /// Run a practice interview
    Practice {
        /// Role to practice for
        #[arg(long)]
        role: String,
        /// Number of questions
        #[arg(long)]
        questions: Option<u32>,
        /// Difficulty (e.g. "junior", "senior")
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Profile document commands
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Check whether the avatar service is available
    AvatarStatus {
        /// Also open and close a session to verify the vendor WebSocket
        #[arg(long)]
        connect: bool,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved analyses
    List,
    /// Show one saved analysis
    Show { id: String },
    /// Delete one saved analysis
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Save a profile document from a JSON file
    Save { file: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,hireflow=info",
        1 => "info,hireflow=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(base_url = %config.api.base_url, language = %config.language, "loaded configuration");

    let api = ApiClient::from_config(&config.api)?;
    let (notifier, mut notices) = Notifier::channel();
    let printer = tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            print_notice(&notice);
        }
    });

    let result = match cli.command {
        Command::Upload { file } => upload(&api, &file).await,
        Command::Analyze { file, no_history } => analyze(&api, &config, &file, !no_history).await,
        Command::Suggestions => {
            let suggestions = api.career_suggestions().await?;
            print_suggestions(&suggestions.suggestions);
            Ok(())
        }
        Command::History { action } => history(&api, action).await,
        Command::Interview { job_title } => {
            interview(api, notifier.clone(), &config, job_title).await
        }
        Command::Practice {
            role,
            questions,
            difficulty,
        } => practice(api, notifier.clone(), &config, &role, difficulty, questions).await,
        Command::Profile {
            action: ProfileAction::Save { file },
        } => save_profile(&api, &file).await,
        Command::AvatarStatus { connect } => avatar_status(api, &config, connect).await,
    };

    // the printer exits once every sender is gone
    drop(notifier);
    let _ = printer.await;
    result
}

async fn avatar_status(api: ApiClient, config: &Config, connect: bool) -> anyhow::Result<()> {
    let status = api.avatar_status().await?;
    println!(
        "avatar service: {}{}",
        if status.available { "available" } else { "unavailable" },
        status.message.map(|m| format!(" ({m})")).unwrap_or_default()
    );
    if !connect || !status.available {
        return Ok(());
    }

    let mut avatar = AvatarClient::from_config(api, Arc::new(TungsteniteConnector), &config.avatar);
    let request = CreateAvatarSessionRequest {
        language: config.language.clone(),
        ..CreateAvatarSessionRequest::default()
    };
    let connected = match avatar.start(&request).await {
        Ok(()) => avatar.connect_websocket().await,
        Err(e) => Err(e),
    };
    avatar.disconnect().await;
    connected.context("avatar session check failed")?;

    println!("avatar websocket: ok");
    Ok(())
}

async fn upload(api: &ApiClient, file: &Path) -> anyhow::Result<()> {
    let doc = DocumentUpload::from_path(file)?;
    let uploaded = api.upload_document(&doc).await?;
    println!(
        "uploaded {} ({} bytes, {}) as {}",
        uploaded.file_name, uploaded.file_size, uploaded.mime_type, uploaded.file_path
    );
    Ok(())
}

async fn analyze(api: &ApiClient, config: &Config, file: &Path, save: bool) -> anyhow::Result<()> {
    let doc = DocumentUpload::from_path(file)?;
    let uploaded = api.upload_document(&doc).await?;
    let analysis = api
        .analyze_document(&AnalyzeDocumentRequest::for_upload(&uploaded, &config.language, save))
        .await?;

    print_suggestions(&analysis.suggestions);
    if let Some(id) = analysis.analysis_id {
        println!("\nsaved as {id}");
    }
    Ok(())
}

async fn history(api: &ApiClient, action: HistoryAction) -> anyhow::Result<()> {
    match action {
        HistoryAction::List => {
            let entries = api.insight_history().await?;
            if entries.is_empty() {
                println!("no saved analyses");
            }
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.id,
                    entry.source.as_deref().unwrap_or("-"),
                    entry.file_name.as_deref().unwrap_or("-"),
                    entry.created_at.as_deref().unwrap_or("-"),
                );
            }
        }
        HistoryAction::Show { id } => {
            let entry = api.insight_history_entry(&id).await?;
            print_suggestions(&entry.suggestions);
        }
        HistoryAction::Delete { id } => {
            api.delete_insight_history_entry(&id).await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

async fn interview(
    api: ApiClient,
    notifier: Notifier,
    config: &Config,
    job_title: Option<String>,
) -> anyhow::Result<()> {
    let request = StartInterviewRequest {
        language: config.language.clone(),
        job_title,
        job_description: None,
    };
    let mut text = TextInterview::start(api, notifier, &request).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while text.view() == TextView::Question {
        let Some(question) = text.current_question() else {
            break;
        };
        println!("\n{}", question.text);

        let Some(answer) = next_answer(&mut lines).await? else {
            println!("\ninterview paused; run again to resume");
            return Ok(());
        };
        if let Err(e) = text.submit_answer(&answer).await {
            tracing::warn!(error = %e, "answer not submitted");
        }
    }

    println!("\n--- transcription ---");
    for response in text.responses() {
        println!("Q: {}\nA: {}\n", response.question, response.answer);
    }
    Ok(())
}

async fn practice(
    api: ApiClient,
    notifier: Notifier,
    config: &Config,
    role: &str,
    difficulty: Option<String>,
    questions: Option<u32>,
) -> anyhow::Result<()> {
    let mut flow = PracticeFlow::new(api, notifier, config.language.clone());
    flow.start(role, difficulty, questions).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(question) = flow.current_question() {
        println!("\n{}", question.text);
        let Some(answer) = next_answer(&mut lines).await? else {
            break;
        };
        if let Err(e) = flow.answer(&answer) {
            tracing::warn!(error = %e, "answer not recorded");
        }
    }

    if !matches!(flow.step(), PracticeStep::Interview { answers, .. } if !answers.is_empty()) {
        anyhow::bail!("no answers to submit");
    }

    let feedback = flow.submit().await?;
    println!("\n--- feedback ---");
    if let Some(score) = feedback.score {
        println!("score: {score:.0}");
    }
    println!("{}", feedback.summary);
    for s in &feedback.strengths {
        println!("+ {s}");
    }
    for s in &feedback.improvements {
        println!("- {s}");
    }
    Ok(())
}

async fn save_profile(api: &ApiClient, file: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let profile = ComprehensiveProfile::from_value(value);

    let response = api.save_profile(&profile).await?;
    println!(
        "profile saved ({}% complete)",
        response
            .completion_percentage
            .unwrap_or_else(|| profile.completion_percentage())
    );
    Ok(())
}

/// Next non-blank line from stdin; `None` at end of input
async fn next_answer(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<String>> {
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

fn print_suggestions(suggestions: &Suggestions) {
    for paragraph in &suggestions.paragraphs {
        println!("{paragraph}\n");
    }
}

fn print_notice(notice: &Notice) {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    eprintln!("[{tag}] {}: {}", notice.title, notice.message);
}
