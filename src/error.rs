//! Error taxonomy for the sweep benchmark.
//!
//! There is no recoverable error class here: every variant below is raised
//! once, logged on rank 0, and followed by an abort of the whole MPI world.
//! See `topology::ThreadSupport` for the capability levels referenced below.

use crate::topology::ThreadSupport;

#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("unknown sweep type: {0}")]
    UnknownSweepType(String),

    #[error("--strong requires --meshny and --meshnz")]
    MissingMeshExtents,

    #[error("MPI library must support MPI_THREAD_SERIALIZED or better (have {0:?})")]
    InsufficientThreadSupport(ThreadSupport),

    #[error("MPI transport error: {0}")]
    Transport(String),
}
