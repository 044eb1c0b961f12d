//! # Team Search
//!
//! An access-control-aware search indexing and federated query service.
//!
//! Team Search keeps denormalized search collections in sync with a
//! relational source of truth and answers a single federated query across
//! them, filtering every result by what the requesting principal is
//! allowed to see. Three content types are indexed: projects, discussions,
//! and bundled learning content.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌──────────┐   ┌─────────────┐
//! │ SQL source │──▶│  Mapper  │──▶│  Writer  │──▶│ Search      │
//! │ of truth   │   │ sanitize │   │  upsert  │   │ engine      │
//! └────────────┘   │ +flatten │   └──────────┘   │ (Typesense) │
//!                  └──────────┘                  └──────┬──────┘
//!                                                       │
//!                     ┌─────────────────────────────────┤
//!                     ▼                                 ▼
//!                ┌──────────┐                     ┌──────────┐
//!                │   CLI    │                     │   HTTP   │
//!                │(tsearch) │                     │/api/search│
//!                └──────────┘                     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tsearch rebuild               # drop, recreate, and reindex everything
//! tsearch reindex project 42    # refresh one project after a change
//! tsearch serve                 # start the search HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Error taxonomy for the indexing/query pipeline |
//! | [`sanitize`] | Markup stripping for rich-text fields |
//! | [`schema`] | Content types and collection schema descriptors |
//! | [`engine`] | Search engine client (trait + HTTP implementation) |
//! | [`store`] | Relational source-of-truth accessor |
//! | [`content`] | Bundled learning-content document loader |
//! | [`mapper`] | Relational record → index document mapping |
//! | [`writer`] | Bulk and single-document index writes |
//! | [`query`] | Federated and per-collection queries with visibility filtering |
//! | [`rebuild`] | Full rebuild orchestration |
//! | [`server`] | HTTP API (axum) |

pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod query;
pub mod rebuild;
pub mod sanitize;
pub mod schema;
pub mod server;
pub mod store;
pub mod writer;
