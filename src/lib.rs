//! # Docent
//!
//! A document-grounded assistant: users register, upload a PDF or text
//! file, and ask questions answered by a chat model with the most relevant
//! passages of their document as context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────────┐   ┌──────────┐
//! │  Upload  │──▶│ docent-core         │──▶│ Retriever│
//! │ PDF/TXT  │   │ extract→chunk→TF-IDF│   │ (session)│
//! └──────────┘   └─────────────────────┘   └────┬─────┘
//!                                               │ top-k context
//!                      ┌──────────┐        ┌────▼─────┐
//!                      │  SQLite  │◀──────▶│ Session  │──▶ chat API
//!                      │ accounts │        │ ask/search│
//!                      └──────────┘        └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Persisted record types |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`accounts`] | Credential hashing, registration, login |
//! | [`conversation`] | Message log and stored uploads |
//! | [`chat`] | Chat-completion client |
//! | [`extract`] | PDF text extraction |
//! | [`session`] | Upload, search and ask for one user |

pub mod accounts;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod db;
pub mod extract;
pub mod migrate;
pub mod models;
pub mod session;
