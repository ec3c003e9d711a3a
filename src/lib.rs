//! # docs-assist
//!
//! A retrieval-augmented question-answering assistant over a fixed corpus
//! of generated documentation files describing a multi-repository codebase
//! (backend, frontend, CMS). Given a natural-language question and optional
//! prior turns, it returns a synthesized answer plus the source documents
//! that justify it.
//!
//! ## Pipeline
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  User Query   │
//!                    └──────┬───────┘
//!                           │
//!                  casual? ─┤── yes ──► canned response (no retrieval)
//!                           │ no
//!                           ▼
//!                ┌─────────────────────┐
//!                │  Synonym Expansion  │
//!                └─────────┬───────────┘
//!                          ▼
//!                ┌─────────────────────┐
//!                │  Embed + Top-k      │   overfetch: top_k × factor
//!                │  Cosine Search      │
//!                └─────────┬───────────┘
//!                          ▼
//!                ┌─────────────────────┐
//!                │  Threshold Filter   │   score >= threshold (inclusive)
//!                └─────────┬───────────┘
//!                          ▼
//!                ┌─────────────────────┐
//!                │  Category Diversity │   round-robin: backend,
//!                │  Re-ranking         │   frontend, other
//!                └─────────┬───────────┘
//!                          ▼
//!                ┌─────────────────────┐
//!                │  Context Assembly   │   char budget + attribution
//!                └─────────┬───────────┘
//!                          ▼
//!                ┌─────────────────────┐
//!                │  Generation         │   answer + sources
//!                └─────────────────────┘
//! ```
//!
//! ## Module overview
//!
//! - [`config`] - Environment-based configuration for server, corpus, and LLM settings
//! - [`models`] - Shared data types: `Chunk`, `RetrievalResult`, request/response types
//! - [`corpus`] - Documentation loading and overlapping chunk splitting
//! - [`query`] - Synonym-table expansion and casual-query detection
//! - [`index`] - Swappable snapshot vector index with cosine search and persistence
//! - [`llm`] - Embedding and generation clients for Ollama / OpenAI-compatible APIs
//! - [`engine`] - Orchestration: retrieve, diversify, assemble, answer
//! - [`api`] - Axum HTTP handlers for chat, search, and administration
//! - [`state`] - Shared application state wiring config, engine, and limits

pub mod api;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod llm;
pub mod models;
pub mod query;
pub mod state;
