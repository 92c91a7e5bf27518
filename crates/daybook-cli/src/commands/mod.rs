// ABOUTME: Command implementations for Daybook CLI
// ABOUTME: Submodules for standup, changelog, ingest and lint commands

pub mod changelog;
pub mod ingest;
pub mod lint;
pub mod standup;
