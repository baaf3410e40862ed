//! Converting Common Cartridges into an output tree that mirrors the
//! course organization.
//!
//! A run opens the archive, parses its assessments, pairs them with their
//! source files, walks the organization writing folders, copied files and
//! rendered documents, sweeps unreferenced resources into `loose_files`,
//! and finally writes `hierarchy.json`. Problems along the way are
//! recorded in a [`ConversionSummary`](cc_model::ConversionSummary)
//! rather than aborting the run.

pub mod convert;
pub mod correlate;
pub mod error;
pub mod hierarchy_json;
pub mod loose;
pub mod materialize;
pub mod options;
pub mod progress;
pub mod session;

pub use convert::{
    CartridgeOutcome, QtiOutcome, convert_cartridge, convert_opened, convert_qti_file,
    final_message,
};
pub use correlate::{Correlation, XmlCandidate, correlate, read_candidates};
pub use error::{ConvertError, Result};
pub use hierarchy_json::{
    CartridgeHierarchy, CombinedHierarchy, HIERARCHY_FILE, write_hierarchy,
};
pub use loose::{LooseFiles, copy_loose_files};
pub use materialize::{FILES_DIR, MaterializeInput, Materialized, ProcessedSet, materialize};
pub use options::{ConvertOptions, LOOSE_FILES_DIR, LoosePlacement};
pub use progress::{
    NoProgress, PROGRESS_COMPLETE, PROGRESS_FAILED, ProgressSink, Reporter, ScaledSink,
};
pub use session::{
    HierarchyFailure, SessionOutcome, convert_session, find_cartridges, session_message,
};
