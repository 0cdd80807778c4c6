//! Domain types shared across the poller
//!
//! Repository, branch and commit descriptors keep the hosting platform's field
//! names so they can be written back out unchanged in the cycle output file.

mod cycle;
mod repository;
pub mod timestamp;

pub use cycle::{BranchCommits, CycleReport, RepoCommits};
pub use repository::{AccountRef, Branch, BranchHead, Commit, CommitDetail, GitSignature, Repository};
