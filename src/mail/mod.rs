//! Email ingestion: MIME body recovery and Gmail message fetch.

pub mod body;
pub mod gmail;
