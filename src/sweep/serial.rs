//! C4 — the serial two-sided sweeper. One thread, one message pair per
//! chunk, blocking receive followed by non-blocking send.

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
    let mut ybuf = FaceBuffer::new(opt.y_face_len(), 1);
    let mut zbuf = FaceBuffer::new(opt.z_face_len(), 1);
    let setup = setup_start.elapsed().as_secs_f64();

    let mut comms = 0.0;
    let sweep_start = Instant::now();

    transport::scope(|scope| {
        let mut pending: SendPair = [None, None];

        for octant in octants() {
            for _group in 0..opt.ng {
                for chunk in octant.chunk_indices(opt.nchunks) {
                    let _ = chunk;

                    let comms_start = Instant::now();
                    transport::recv_into(world, octant.y_upwind(state).rank(), ybuf.slot_mut(0));
                    transport::recv_into(world, octant.z_upwind(state).rank(), zbuf.slot_mut(0));
                    transport::wait_pair(pending);
                    comms += comms_start.elapsed().as_secs_f64();

                    for _ in 0..opt.compute_calls() {
                        compute::compute(load);
                    }

                    let wait_start = Instant::now();
                    let y_down = octant.y_downwind(state).rank();
                    let z_down = octant.z_downwind(state).rank();
                    pending = [
                        transport::isend(world, scope, y_down, ybuf.slot(0).to_vec()),
                        transport::isend(world, scope, z_down, zbuf.slot(0).to_vec()),
                    ];
                    comms += wait_start.elapsed().as_secs_f64();
                }
            }
        }

        transport::wait_pair(pending);
    });

    let sweeping = sweep_start.elapsed().as_secs_f64();
    Timings { setup, sweeping, comms }
}
