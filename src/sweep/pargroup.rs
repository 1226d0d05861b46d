//! C5-group — the group-batched two-sided sweeper. Still a single
//! thread, but every energy group's face data travels in one message
//! per axis per chunk instead of `ng` separate ones.

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
    let mut ybuf = FaceBuffer::new(opt.y_face_len(), opt.ng);
    let mut zbuf = FaceBuffer::new(opt.z_face_len(), opt.ng);
    let setup = setup_start.elapsed().as_secs_f64();

    let mut comms = 0.0;
    let sweep_start = Instant::now();

    transport::scope(|scope| {
        let mut pending: SendPair = [None, None];

        for octant in octants() {
            for chunk in octant.chunk_indices(opt.nchunks) {
                let _ = chunk;

                let comms_start = Instant::now();
                transport::recv_into(world, octant.y_upwind(state).rank(), ybuf.as_mut_slice());
                transport::recv_into(world, octant.z_upwind(state).rank(), zbuf.as_mut_slice());
                transport::wait_pair(pending);
                comms += comms_start.elapsed().as_secs_f64();

                for _group in 0..opt.ng {
                    for _ in 0..opt.compute_calls() {
                        compute::compute(load);
                    }
                }

                let wait_start = Instant::now();
                let y_downwind = octant.y_downwind(state).rank();
                let z_downwind = octant.z_downwind(state).rank();
                pending = [
                    transport::isend(world, scope, y_downwind, ybuf.as_slice().to_vec()),
                    transport::isend(world, scope, z_downwind, zbuf.as_slice().to_vec()),
                ];
                comms += wait_start.elapsed().as_secs_f64();
            }
        }

        transport::wait_pair(pending);
    });

    let sweeping = sweep_start.elapsed().as_secs_f64();
    Timings { setup, sweeping, comms }
}
