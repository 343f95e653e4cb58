//! Keyword rule file sorting.
//!
//! Files in a source folder are matched by name against an ordered list of
//! keyword [`Pattern`]s and copied or moved into the folder of the first rule
//! that matches. Typical use from a front-end:
//!
//! 1. [`validate_config`] the raw input into a [`BatchConfig`].
//! 2. Optionally [`preview`] what would happen.
//! 3. [`start_batch`], drain [`BatchHandle::progress`], then
//!    [`BatchHandle::finish`] for the [`Report`].

pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod pattern;
pub mod report;
pub mod scan;
pub mod transfer;

pub use crate::batch::{BatchHandle, run_batch, start_batch, start_dry_run};
pub use crate::classify::{Candidate, Preview, PreviewGroup, classify, preview};
pub use crate::config::{BatchConfig, Mode, Rule, validate_config};
pub use crate::pattern::{Expression, Pattern};
pub use crate::report::{Outcome, Report, ResultLog, TransferError};
pub use crate::scan::{discover, scan};
pub use crate::transfer::{MAX_COLLISION_SUFFIX, Progress, candidate_name, execute};
