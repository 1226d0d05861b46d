//! C5 — the group-parallel two-sided sweeper with a single global lock.
//! One `rayon::broadcast` thread team is raised per sweep; every thread
//! owns a disjoint slice of the group-indexed face buffers, but all of
//! them serialize through one `Mutex` before touching MPI, since this
//! variant only requires `MPI_THREAD_SERIALIZED`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use mpi::topology::SimpleCommunicator;

use crate::buffers::FaceBuffer;
use crate::options::Options;
use crate::sweep::octants;
use crate::timing::Timings;
use crate::topology::RankState;
use crate::transport::{self, SendPair};
use crate::compute;

pub fn run(world: &SimpleCommunicator, state: &RankState, opt: &Options, load: Duration) -> Timings {
    let setup_start = Instant::now();
    let ybuf = Mutex::new(FaceBuffer::new(opt.y_face_len(), opt.ng));
    let zbuf = Mutex::new(FaceBuffer::new(opt.z_face_len(), opt.ng));
    let comms_lock = Mutex::new(());
    let setup = setup_start.elapsed().as_secs_f64();

    let comms_nanos = AtomicU64::new(0);
    let sweep_start = Instant::now();
    let nthreads = rayon::current_num_threads().max(1);

    rayon::broadcast(|ctx| {
        let local_groups: Vec<usize> = (ctx.index()..opt.ng).step_by(nthreads).collect();

        transport::scope(|scope| {
            let mut pending: Vec<SendPair> = local_groups.iter().map(|_| [None, None]).collect();

            for octant in octants() {
                for chunk in octant.chunk_indices(opt.nchunks) {
                    let _ = chunk;
                    for (slot, &group) in local_groups.iter().enumerate() {
                        let y_up = octant.y_upwind(state).rank();
                        let z_up = octant.z_upwind(state).rank();

                        let comms_start = Instant::now();
                        {
                            let _guard = comms_lock.lock().unwrap();
                            transport::recv_into(world, y_up, ybuf.lock().unwrap().slot_mut(group));
                            transport::recv_into(world, z_up, zbuf.lock().unwrap().slot_mut(group));
                            let prior = std::mem::replace(&mut pending[slot], [None, None]);
                            transport::wait_pair(prior);
                        }
                        if ctx.index() == nthreads - 1 {
                            comms_nanos.fetch_add(comms_start.elapsed().as_nanos() as u64, Ordering::Relaxed);
                        }

                        for _ in 0..opt.compute_calls() {
                            compute::compute(load);
                        }

                        let y_down = octant.y_downwind(state).rank();
                        let z_down = octant.z_downwind(state).rank();
                        let y_data = ybuf.lock().unwrap().slot(group).to_vec();
                        let z_data = zbuf.lock().unwrap().slot(group).to_vec();

                        let wait_start = Instant::now();
                        {
                            let _guard = comms_lock.lock().unwrap();
                            pending[slot] = [
                                transport::isend(world, scope, y_down, y_data),
                                transport::isend(world, scope, z_down, z_data),
                            ];
                        }
                        if ctx.index() == nthreads - 1 {
                            comms_nanos.fetch_add(wait_start.elapsed().as_nanos() as u64, Ordering::Relaxed);
                        }
                    }
                }
            }

            for prior in pending {
                transport::wait_pair(prior);
            }
        });
    });

    let sweeping = sweep_start.elapsed().as_secs_f64();
    let comms = comms_nanos.load(Ordering::Relaxed) as f64 / 1e9;
    Timings { setup, sweeping, comms }
}
