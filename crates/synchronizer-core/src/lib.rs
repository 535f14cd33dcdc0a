//! Mirrors git repositories from a source location to one or more replicas.
//!
//! A run parses the tab-separated mirror list ([`config`]), turns every line
//! into a [`mirror_job::MirrorJob`], queues them on a [`job_queue::JobQueue`]
//! and drains the queue with a pool of worker threads
//! ([`sync_engine::Dispatcher`]). Each job clones a bare mirror once, then
//! fetches and pushes all branches and tags through a [`git_tool::GitTool`].

pub mod config;
pub mod git_tool;
pub mod job_queue;
pub mod mirror_job;
pub mod paths;
pub mod sync_engine;
pub mod sync_engine_types;
mod sync_engine_workers;

#[cfg(test)]
mod test_support;
