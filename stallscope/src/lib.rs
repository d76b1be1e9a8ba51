//! # stallscope - Fake Async Detector
//!
//! stallscope finds I/O libraries that present an async API but do their work
//! synchronously on the scheduler thread. It runs many concurrent operations
//! against a library through an adapter, keeps a heartbeat task ticking on the
//! same single-threaded Tokio runtime, and judges the run by how late the
//! heartbeat was woken and how well the cheap operations kept flowing.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        CLI (list / detect)                      │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ RunConfig + EvaluationPolicy
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Engine (current-thread runtime)                 │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Workload   │──▶│   Harness    │──▶│   Adapter    │         │
//! │  │  Generator   │   │  (JoinSet)   │   │ (lib under   │         │
//! │  └──────────────┘   └──────┬───────┘   │    test)     │         │
//! │                            │           └──────────────┘         │
//! │                     ┌──────┴───────┐                            │
//! │                     │  Heartbeat   │  gaps > threshold = stalls │
//! │                     └──────────────┘                            │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ RunOutcome (records + samples)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Analysis: metrics (throughput, p50/p95) ──▶ evaluator (verdict) │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         ▼
//!           report (terminal)      export (JSON file)
//! ```
//!
//! ## Module Structure
//!
//! - [`adapters`]: the `Adapter` contract, the registry, and the built-in
//!   adapters (`tokio-fs`, `std-fs`, `csv-async`, `deflate-*`, `bcrypt-inline`,
//!   `sleep`, `thread-sleep`)
//! - [`engine`]: workload generation, the scheduler harness, the heartbeat,
//!   and the [`engine::detect`] entry point
//! - [`analysis`]: latency/throughput aggregation and pass/fail evaluation
//! - [`export`]: JSON report for `detect --output`
//! - [`report`]: human-readable terminal output
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: run configuration, core types, and error enums
//!
//! ## Why one thread
//!
//! A library that blocks inside `poll` only hurts everyone else when everyone
//! else is waiting for the same thread. On a multi-threaded runtime the
//! heartbeat would just move to another worker and the stall would go
//! unseen, so the engine refuses to run anywhere but a current-thread runtime.
//!
//! ## Typical Usage
//!
//! ```bash
//! stallscope list
//! stallscope detect tokio-fs --tasks 500 --timeout 10s
//! stallscope detect bcrypt-inline --verbose --output verdict.json
//! ```

pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod export;
pub mod report;
