//! A signed-in user's working session: one retriever, one conversation.
//!
//! The session owns exactly one [`Retriever`]. Uploading a document builds a
//! fresh one and swaps it in only after ingestion succeeds, so a failed
//! upload leaves the previous document searchable.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use docent_core::extract::DocumentFormat;
use docent_core::ingest::IngestPipeline;
use docent_core::retriever::{RankedResult, Retriever};

use crate::accounts::{self, AccountStore};
use crate::chat::{ChatCompletion, ChatMessage, HttpChatClient};
use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::db;
use crate::extract::PdfExtractor;
use crate::models::{ConversationTurn, Role, UserRecord};

/// Turns loaded into memory when a session is resumed.
const RESUME_HISTORY: u32 = 50;

/// Per-question knobs taken from config.
#[derive(Debug, Clone)]
pub struct AskSettings {
    pub top_k: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
}

impl AskSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_tokens: config.chat.max_tokens,
            temperature: config.chat.temperature,
            system_prompt: config.assistant.system_prompt(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadSummary {
    pub upload_id: i64,
    pub filename: String,
    pub chars: usize,
    pub chunk_count: usize,
}

pub struct Session {
    user: UserRecord,
    retriever: Retriever,
    history: Vec<ConversationTurn>,
    pipeline: IngestPipeline,
    conversations: ConversationStore,
    settings: AskSettings,
}

impl Session {
    /// A fresh session with no document loaded.
    pub fn start(
        user: UserRecord,
        pipeline: IngestPipeline,
        conversations: ConversationStore,
        settings: AskSettings,
    ) -> Self {
        Self {
            user,
            retriever: Retriever::empty(),
            history: Vec::new(),
            pipeline,
            conversations,
            settings,
        }
    }

    /// Start a session and restore the user's latest upload and recent turns.
    ///
    /// A stored upload that no longer indexes is logged and skipped.
    pub async fn resume(
        user: UserRecord,
        pipeline: IngestPipeline,
        conversations: ConversationStore,
        settings: AskSettings,
    ) -> Result<Self> {
        let mut session = Self::start(user, pipeline, conversations, settings);

        if let Some(upload) = session.conversations.latest_upload(session.user.id).await? {
            match session
                .pipeline
                .ingest(upload.content.as_bytes(), DocumentFormat::PlainText)
            {
                Ok(doc) => {
                    tracing::debug!(
                        upload_id = upload.id,
                        chunks = doc.chunk_count,
                        "restored document"
                    );
                    session.retriever = doc.retriever;
                }
                Err(e) => {
                    tracing::warn!(
                        upload_id = upload.id,
                        error = %e,
                        "could not rebuild retriever from stored upload"
                    );
                }
            }
        }

        session.history = session
            .conversations
            .history(session.user.id, RESUME_HISTORY)
            .await?;
        Ok(session)
    }

    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub async fn upload(&mut self, filename: &str, bytes: &[u8]) -> Result<UploadSummary> {
        let format = DocumentFormat::from_filename(filename)?;
        let doc = self
            .pipeline
            .ingest(bytes, format)
            .with_context(|| format!("Failed to ingest {}", filename))?;

        let upload_id = self
            .conversations
            .save_upload(self.user.id, filename, &doc.text)
            .await?;

        let chars = doc.text.chars().count();
        self.retriever = doc.retriever;

        tracing::info!(
            user_id = self.user.id,
            upload_id,
            chunks = doc.chunk_count,
            "upload stored"
        );

        Ok(UploadSummary {
            upload_id,
            filename: filename.to_string(),
            chars,
            chunk_count: doc.chunk_count,
        })
    }

    pub fn search(&self, question: &str) -> Vec<RankedResult> {
        self.retriever.query(question, self.settings.top_k)
    }

    /// Answer `question` with retrieved context. Chat failures become the
    /// assistant's reply; only storage errors are returned.
    pub async fn ask(&mut self, chat: &dyn ChatCompletion, question: &str) -> Result<String> {
        self.record(Role::User, question).await?;

        let results = self.search(question);
        let prompt = build_user_prompt(question, &results);
        let messages = [ChatMessage::new(Role::User, prompt)];

        let reply = match chat
            .complete(
                &self.settings.system_prompt,
                &messages,
                self.settings.max_tokens,
                self.settings.temperature,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "chat completion failed");
                format!("Sorry — model call failed: {}", e)
            }
        };

        self.record(Role::Assistant, &reply).await?;
        Ok(reply)
    }

    async fn record(&mut self, role: Role, text: &str) -> Result<()> {
        self.conversations.append(self.user.id, role, text).await?;
        self.history.push(ConversationTurn {
            role,
            text: text.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(())
    }
}

/// Render retrieved chunks as a context block, blank-line separated.
pub fn format_context(results: &[RankedResult]) -> String {
    results
        .iter()
        .map(|r| format!("[Doc chunk score={:.3}]\n{}", r.score, r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_user_prompt(question: &str, results: &[RankedResult]) -> String {
    if results.is_empty() {
        return question.to_string();
    }
    format!(
        "Context:\n{}\n\nUser question: {}",
        format_context(results),
        question
    )
}

// ============ Commands ============

pub fn pipeline_for(config: &Config) -> IngestPipeline {
    IngestPipeline::new(config.pipeline()).with_pdf_extractor(PdfExtractor)
}

/// Authenticate and resume a session for a CLI command.
async fn login(config: &Config, email: &str, password: &str) -> Result<(sqlx::SqlitePool, Session)> {
    let pool = db::connect(config).await?;
    let store = AccountStore::new(pool.clone());
    let user = accounts::authenticate(&store, &accounts::hasher_for(config), email, password)
        .await
        .context("Login failed")?;

    let session = Session::resume(
        user,
        pipeline_for(config),
        ConversationStore::new(pool.clone()),
        AskSettings::from_config(config),
    )
    .await?;
    Ok((pool, session))
}

fn filename_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Not a file path: {}", path.display()))
}

async fn upload_path(session: &mut Session, path: &Path) -> Result<UploadSummary> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    session.upload(&filename_of(path)?, &bytes).await
}

fn print_upload(summary: &UploadSummary) {
    println!(
        "Indexed {}: {} chunks ({} chars)",
        summary.filename, summary.chunk_count, summary.chars
    );
}

fn print_results(results: &[RankedResult]) {
    if results.is_empty() {
        println!("No document uploaded yet.");
        return;
    }
    for (rank, r) in results.iter().enumerate() {
        let preview: String = r.text.chars().take(200).collect();
        println!("{}. [chunk {}] score={:.3}", rank + 1, r.ordinal, r.score);
        println!("   {}", preview);
    }
}

fn print_history(turns: &[ConversationTurn]) {
    if turns.is_empty() {
        println!("No messages yet.");
        return;
    }
    for turn in turns {
        println!("[{}] {}: {}", turn.created_at, turn.role, turn.text);
    }
}

pub async fn run_upload(config: &Config, path: &Path, email: &str, password: &str) -> Result<()> {
    let (pool, mut session) = login(config, email, password).await?;
    let summary = upload_path(&mut session, path).await?;
    print_upload(&summary);
    pool.close().await;
    Ok(())
}

pub async fn run_search(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    email: &str,
    password: &str,
) -> Result<()> {
    let (pool, session) = login(config, email, password).await?;
    let results = match top_k {
        Some(k) => session.retriever().query(query, k),
        None => session.search(query),
    };
    print_results(&results);
    pool.close().await;
    Ok(())
}

pub async fn run_ask(config: &Config, question: &str, email: &str, password: &str) -> Result<()> {
    let chat = HttpChatClient::new(&config.chat)?;
    let (pool, mut session) = login(config, email, password).await?;
    let reply = session.ask(&chat, question).await?;
    println!("{}", reply);
    pool.close().await;
    Ok(())
}

pub async fn run_history(config: &Config, limit: u32, email: &str, password: &str) -> Result<()> {
    let (pool, session) = login(config, email, password).await?;
    let turns = ConversationStore::new(pool.clone())
        .history(session.user().id, limit)
        .await?;
    print_history(&turns);
    pool.close().await;
    Ok(())
}

/// Interactive loop over stdin. Lines starting with `:` are commands.
pub async fn run_chat(config: &Config, email: &str, password: &str) -> Result<()> {
    let chat = HttpChatClient::new(&config.chat)?;
    let (pool, mut session) = login(config, email, password).await?;

    println!(
        "Hello {}! Ask a question, or use :upload <path>, :history, :quit.",
        session.user().name
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) | (":exit", _) => break,
            (":history", _) => print_history(session.history()),
            (":upload", path) if !path.trim().is_empty() => {
                match upload_path(&mut session, Path::new(path.trim())).await {
                    Ok(summary) => print_upload(&summary),
                    Err(e) => println!("Upload failed: {:#}", e),
                }
            }
            (":upload", _) => println!("Usage: :upload <path>"),
            _ => {
                let reply = session.ask(&chat, line).await?;
                println!("{}", reply);
            }
        }
    }

    pool.close().await;
    Ok(())
}
