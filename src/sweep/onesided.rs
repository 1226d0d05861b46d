//! C7 — the one-sided RMA sweeper. Passive-target `MPI_Put` replaces the
//! two-sided `MPI_Send`/`MPI_Recv` pair; a SAFE/SENT handshake takes the
//! place of message matching. A `rayon::broadcast` thread team runs the
//! synthetic compute in parallel, same as `parmpi`/`multilock`, but every
//! RMA call stays on the thread that called [`run`] — no lock is needed
//! because nothing else ever touches the window.
//!
//! The reset of a consumed signal is an assignment, not a comparison (a
//! stray `==` would silently never clear the flag and the sweep would
//! hang on the second chunk), and the handshake is applied symmetrically
//! to both the Y and Z axes.

use std::time::{Duration, Instant};

use mpi::topology::SimpleCommunicator;

use crate::buffers::Signal;
use crate::options::Options;
use crate::sweep::octants;
use crate::timing::Timings;
use crate::topology::{Neighbour, RankState};
use crate::transport::rma::SweepWindow;
use crate::{compute, transport};

/// Layout of one axis's RMA window, in units of `f64`.
struct Layout {
    data_len: usize,
    safe_offset: usize,
    sent_offset: usize,
    total: usize,
}

impl Layout {
    fn new(face_len: usize, k: usize) -> Self {
        let data_len = face_len * k;
        Layout {
            data_len,
            safe_offset: data_len,
            sent_offset: data_len + 1,
            total: data_len + 2,
        }
    }
}

fn read_signal(window: &SweepWindow<'_>, offset: usize) -> Signal {
    Signal::from_raw(window.local_data()[offset] as i64)
}

fn write_signal(window: &mut SweepWindow<'_>, offset: usize, signal: Signal) {
    window.local_data_mut()[offset] = signal.raw() as f64;
}

/// Blocks until `window`'s local `offset` reads `expected`, then resets
/// it to `Signal::Unset` by assignment (the fixed defect: this must be
/// `=`, never `==`).
fn wait_and_consume(window: &mut SweepWindow<'_>, offset: usize, expected: Signal) {
    loop {
        if read_signal(window, offset) == expected {
            break;
        }
        std::hint::spin_loop();
    }
    write_signal(window, offset, Signal::Unset);
}

fn signal_remote(world: &SimpleCommunicator, window: &SweepWindow<'_>, target: Neighbour, offset: usize, signal: Signal) {
    let Some(rank) = target.rank() else { return };
    let payload = [signal.raw() as f64];
    window.lock_shared(rank);
    window.put(&payload, rank, offset);
    window.flush(rank);
    window.unlock(rank);
}

pub fn run(world: &SimpleCommunicator, state: &RankState, opt: &Options, load: Duration) -> Timings {
    let setup_start = Instant::now();
    let y_layout = Layout::new(opt.y_face_len(), opt.ng);
    let z_layout = Layout::new(opt.z_face_len(), opt.ng);
    let mut y_window = SweepWindow::allocate(world, y_layout.total);
    let mut z_window = SweepWindow::allocate(world, z_layout.total);
    // Every rank starts able to send once: the upwind boundary of the
    // whole mesh has no receiver to grant permission.
    write_signal(&mut y_window, y_layout.safe_offset, Signal::Safe);
    write_signal(&mut z_window, z_layout.safe_offset, Signal::Safe);
    let setup = setup_start.elapsed().as_secs_f64();

    let mut comms = 0.0;
    let sweep_start = Instant::now();

    for octant in octants() {
        for chunk in octant.chunk_indices(opt.nchunks) {
            // Receiver role: wait for upwind neighbours to have flagged
            // SENT into our own window, then consume the data.
            let comms_start = Instant::now();
            if octant.y_upwind(state).rank().is_some() {
                wait_and_consume(&mut y_window, y_layout.sent_offset, Signal::Sent);
            }
            if octant.z_upwind(state).rank().is_some() {
                wait_and_consume(&mut z_window, z_layout.sent_offset, Signal::Sent);
            }
            comms += comms_start.elapsed().as_secs_f64();

            // Only the compute is spread across the thread team; every RMA
            // call above and below stays on the thread that called `run`.
            let nthreads = rayon::current_num_threads().max(1);
            rayon::broadcast(|ctx| {
                let mut group = ctx.index();
                while group < opt.ng {
                    for _ in 0..opt.compute_calls() {
                        compute::compute(load);
                    }
                    group += nthreads;
                }
            });

            // Sender role: wait until our downwind neighbour has granted
            // SAFE in our own window, put the data into its window, then
            // flag its SENT slot.
            let wait_start = Instant::now();
            let y_down = octant.y_downwind(state);
            let z_down = octant.z_downwind(state);

            if y_down.rank().is_some() {
                wait_and_consume(&mut y_window, y_layout.safe_offset, Signal::Safe);
                let payload: Vec<f64> = y_window.local_data()[..y_layout.data_len].to_vec();
                if let Some(rank) = y_down.rank() {
                    y_window.lock_shared(rank);
                    y_window.put(&payload, rank, 0);
                    y_window.flush(rank);
                    y_window.unlock(rank);
                }
                signal_remote(world, &y_window, y_down, y_layout.sent_offset, Signal::Sent);
            }
            if z_down.rank().is_some() {
                wait_and_consume(&mut z_window, z_layout.safe_offset, Signal::Safe);
                let payload: Vec<f64> = z_window.local_data()[..z_layout.data_len].to_vec();
                if let Some(rank) = z_down.rank() {
                    z_window.lock_shared(rank);
                    z_window.put(&payload, rank, 0);
                    z_window.flush(rank);
                    z_window.unlock(rank);
                }
                signal_remote(world, &z_window, z_down, z_layout.sent_offset, Signal::Sent);
            }

            // Grant our own upwind neighbours permission to send again.
            signal_remote(world, &y_window, octant.y_upwind(state), y_layout.safe_offset, Signal::Safe);
            signal_remote(world, &z_window, octant.z_upwind(state), z_layout.safe_offset, Signal::Safe);

            comms += wait_start.elapsed().as_secs_f64();
            let _ = chunk;
        }
    }

    let sweeping = sweep_start.elapsed().as_secs_f64();
    Timings { setup, sweeping, comms }
}
