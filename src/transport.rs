//! Thin wrapper around `rsmpi` (the `mpi` crate). Every call into the
//! underlying bindings lives here, so the sweepers in [`crate::sweep`]
//! never touch `mpi::traits` directly — only this module's types.
//!
//! All sends use tag 0 and all receives accept any tag: ordering between
//! a pair of ranks is guaranteed by MPI's own FIFO-per-pair delivery, so
//! no derived per-chunk or per-octant tag is needed, and none is used.

pub use mpi::request::scope;
use mpi::request::{CancelGuard, Request, Scope};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::topology::ThreadSupport;

/// A non-blocking send, still in flight. Owns its buffer so it can
/// outlive the call that created it.
pub type SendHandle<'a> = Request<'a, Vec<f64>, Scope<'a>>;

/// The pair of outstanding sends (y-face, z-face) for one chunk step.
/// `None` in a slot means that neighbour was the null boundary and no
/// send was issued.
pub type SendPair<'a> = [Option<SendHandle<'a>>; 2];

/// Initializes MPI requesting `MPI_THREAD_MULTIPLE`, the highest
/// threading level, and returns the world communicator together with
/// whatever level the library actually granted.
pub fn init() -> (mpi::environment::Universe, SimpleCommunicator, ThreadSupport) {
    let threading = mpi::Threading::Multiple;
    let (universe, granted) =
        mpi::initialize_with_threading(threading).expect("MPI_Init_thread failed");
    let world = universe.world();
    let support = match granted {
        mpi::Threading::Single => ThreadSupport::Single,
        mpi::Threading::Funneled => ThreadSupport::Funneled,
        mpi::Threading::Serialized => ThreadSupport::Serialized,
        mpi::Threading::Multiple => ThreadSupport::Multiple,
    };
    (universe, world, support)
}

/// Blocking receive of `buf.len()` `f64`s from `source`, any tag. A
/// no-op if `source` is `None` (the null-neighbour case).
pub fn recv_into(world: &SimpleCommunicator, source: Option<i32>, buf: &mut [f64]) {
    let Some(source) = source else { return };
    world.process_at_rank(source).receive_into(buf);
}

/// Non-blocking send of `buf` to `dest`, tag 0, returning a handle that
/// must eventually reach [`wait_pair`]. A no-op (returning `None`) if
/// `dest` is the null-neighbour case. Takes `buf` by value: the
/// returned request owns it, so it stays alive across chunk iterations
/// without the caller having to pin it down separately.
pub fn isend<'a>(
    world: &'a SimpleCommunicator,
    scope: &Scope<'a>,
    dest: Option<i32>,
    buf: Vec<f64>,
) -> Option<SendHandle<'a>> {
    let dest = dest?;
    Some(world.process_at_rank(dest).immediate_send(scope, buf))
}

/// Waits on both slots of a [`SendPair`], if present. Called at the top
/// of a chunk step with the *previous* step's sends, so a chunk's own
/// sends are left outstanding and overlap with the next chunk's receive
/// and compute.
pub fn wait_pair(pair: SendPair<'_>) {
    for request in pair.into_iter().flatten() {
        request.wait();
    }
}

/// Enforces the `MPI_THREAD_SERIALIZED` floor required by the two-sided
/// thread-team sweepers (`parmpi`, `multilock`).
pub fn require_serialized(support: ThreadSupport) -> Result<(), crate::error::SweepError> {
    if support < ThreadSupport::Serialized {
        Err(crate::error::SweepError::InsufficientThreadSupport(support))
    } else {
        Ok(())
    }
}

/// Cancels and drops any outstanding request; used on the error path
/// when a sweep aborts mid-flight and must not leak unmatched sends.
pub fn cancel(request: SendHandle<'_>) {
    drop(CancelGuard::from(request));
}

pub mod rma {
    //! One-sided passive-target RMA primitives for the `onesided`
    //! sweeper (component C7). Isolated in its own submodule because
    //! the `Window` API is the least-exercised corner of `rsmpi` used in
    //! this crate; see DESIGN.md for the exact API assumptions made
    //! here.

    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;
    use mpi::window::{Window, WindowOperations};

    /// Allocates a window large enough to hold `len` `f64`s and opens a
    /// shared lock against the target rank for each put, rather than
    /// holding exclusive locks for the whole sweep.
    pub struct SweepWindow<'a> {
        window: Window<'a, f64>,
    }

    impl<'a> SweepWindow<'a> {
        pub fn allocate(world: &'a SimpleCommunicator, len: usize) -> Self {
            let window = SimpleCommunicator::allocate_window::<f64>(world, len);
            SweepWindow { window }
        }

        pub fn lock_shared(&self, target_rank: i32) {
            self.window.lock_shared(target_rank);
        }

        pub fn unlock(&self, target_rank: i32) {
            self.window.unlock(target_rank);
        }

        pub fn put(&self, data: &[f64], target_rank: i32, target_offset: usize) {
            self.window.put(data, target_rank, target_offset as i32);
        }

        pub fn flush(&self, target_rank: i32) {
            self.window.flush(target_rank);
        }

        pub fn local_data(&self) -> &[f64] {
            self.window.local_data()
        }

        pub fn local_data_mut(&mut self) -> &mut [f64] {
            self.window.local_data_mut()
        }
    }
}
