//! Collects postings from applicant-tracking-system job boards, keeps them in
//! a local SQLite tracker with first/last-seen bookkeeping, scores them, and
//! exports new or top-scoring postings to CSV.

pub mod collectors;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod scoring;
