//! medarc — single-pass batch migration of heterogeneous per-patient clinical
//! document folders into normalized per-patient PDF archives.
//!
//! The engine walks an arbitrary, inconsistently-named directory tree, decides
//! which subtrees represent one patient's record (folder-name heuristics plus a
//! numeric case-number signal), extracts structured identity fields from
//! free-text folder names, converts every in-scope file to PDF and merges the
//! results per patient in acquisition-time order. A resume ledger makes
//! repeated runs over a partially-migrated tree skip already-converted files.

pub mod config;
pub mod convert;
pub mod identity;
pub mod pipeline;
