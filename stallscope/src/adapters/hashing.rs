//! Password hashing on the scheduler thread
//!
//! bcrypt is deliberately slow CPU work. Calling it from an async fn without
//! offloading is a common way to starve a runtime, which makes it a reliable
//! known-fake comparator.

use super::{timed, Adapter, AdapterFuture};
use crate::domain::{AdapterError, TaskKind};

/// Minimum cost bcrypt accepts, a few hundred microseconds per hash
const PROBE_COST: u32 = 4;

/// Roughly a quarter second per hash on current hardware
const BULK_COST: u32 = 12;

const PASSWORD: &str = "hunter2-stallscope";

fn hash_and_verify(cost: u32) -> Result<(), AdapterError> {
    let hashed = bcrypt::hash(PASSWORD, cost)?;
    if bcrypt::verify(PASSWORD, &hashed)? {
        Ok(())
    } else {
        Err(AdapterError::Corrupt("hash did not verify".to_string()))
    }
}

pub struct BcryptInline;

impl Adapter for BcryptInline {
    fn name(&self) -> &'static str {
        "bcrypt-inline"
    }

    fn description(&self) -> &'static str {
        "bcrypt hash+verify on the scheduler thread (fake async)"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        let cost = match kind {
            TaskKind::Probe => PROBE_COST,
            TaskKind::Blocking => BULK_COST,
        };
        Box::pin(timed(async move { hash_and_verify(cost) }))
    }
}
