//! impress-tei: carry bibliography metadata from a CSL-JSON export into TEI.
//!
//! A Zotero export lists items with an `id` URI, an `issued` date and an
//! optional `note`. A TEI bibliography lists `biblStruct` entries whose
//! `corresp` attribute ends with the Zotero item key. [`run`] matches the two
//! and brings each entry's `imprint/date` and `note[@type="bibliographic"]`
//! up to date, rewriting the TEI file only when something changed.
//!
//! # Example
//!
//! ```ignore
//! use impress_tei::{run, SyncConfig};
//!
//! let config = SyncConfig::new("bibliography.json", "bibliography.xml");
//! let summary = run(&config)?;
//! println!("written: {}", summary.written);
//! ```

pub mod config;
pub mod csl;
pub mod date;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod sync;
pub mod tei;

pub use config::{ConfigError, SyncConfig};
pub use csl::{load_records, parse_records, CslRecord};
pub use date::{normalize_csl_date, DateParts};
pub use error::{Result, SourceError, SyncError, TeiError};
pub use reconcile::{
    reconcile, FieldChange, MatchPolicy, ReconcileOptions, ReconcileReport, ReconcileStats,
    Reconciler, RecordOutcome, RecordStatus,
};
pub use sync::{run, RunSummary};
pub use tei::{Element, Node, TeiDocument, TEI_NS};
