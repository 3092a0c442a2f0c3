//! # Schemalens
//!
//! Reconstructs the schema of a relational source from a directory of flat
//! exports: per-table profiles, a columnar cache, semantic column types and a
//! scored graph of candidate foreign keys.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Directory of delimited text files             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [scan]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ProfileSet (TableProfile per table)               │
//! │        + semantic annotations per column                 │
//! └─────────────────────────────────────────────────────────┘
//!            │                              │
//!            ▼ [cache]                      ▼ [inference]
//! ┌──────────────────────────┐  ┌───────────────────────────┐
//! │ Parquet artifacts +      │  │ Relationship candidates   │
//! │ in-memory load results   │  │ (naming, ERP, data)       │
//! └──────────────────────────┘  └───────────────────────────┘
//!                                           │
//!                                           ▼ [graph]
//!                               ┌───────────────────────────┐
//!                               │ RelationshipGraph queries │
//!                               └───────────────────────────┘
//! ```
//!
//! [`workspace::Workspace`] ties the stages together for one session.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use schemalens::config::Settings;
//! use schemalens::scan::NoProgress;
//! use schemalens::workspace::Workspace;
//!
//! let mut ws = Workspace::new(Settings::discover()?)?;
//! ws.scan(Path::new("data/raw"), &NoProgress)?;
//! for rel in ws.mine() {
//!     println!("{} -> {} ({:.2})", rel.source_table, rel.target_table, rel.confidence);
//! }
//! for join in ws.build_graph(0.5).suggest_join("Cliente", "ItemPedido")? {
//!     println!("{}", join.describe());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod graph;
pub mod inference;
pub mod scan;
pub mod semantic;
pub mod workspace;

pub use cache::{CacheError, CacheManager, LoadMode, LoadRequest};
pub use graph::RelationshipGraph;
pub use inference::{mine, Relationship, RelationshipType};
pub use scan::{scan_directory, ProfileSet, TableProfile};
pub use workspace::Workspace;
