use clap::Parser;
use mpi::traits::*;

use road_sweeper::{cli, compute, error::SweepError, report, sweep, timing::{Summary, Timings}};

fn main() {
    env_logger::init();

    let (_universe, world, thread_support) = road_sweeper::transport::init();
    let rank = world.rank();
    let nprocs = world.size();

    let opts = cli::Opts::parse();

    let resolved = match cli::resolve(&opts, rank, nprocs, thread_support) {
        Ok(r) => r,
        Err(err) => fail(rank, &world, err),
    };
    let options = resolved.options;
    let state = resolved.state;
    let load = compute::load_from_env();

    report::print_header(&state, &options, options.gny, options.gnz);
    log::info!("rank {} ready: y={} z={} ylo={:?} yhi={:?}", rank, state.y, state.z, state.ylo, state.yhi);

    let mut runs = Vec::with_capacity(options.nsweeps);
    for i in 0..options.nsweeps {
        let timings: Timings = match options.version {
            road_sweeper::options::Sweeper::Serial => {
                sweep::serial::run(&world, &state, &options, load)
            }
            road_sweeper::options::Sweeper::ParGroup => {
                sweep::pargroup::run(&world, &state, &options, load)
            }
            road_sweeper::options::Sweeper::ParMpi => {
                sweep::parmpi::run(&world, &state, &options, load)
            }
            road_sweeper::options::Sweeper::MultiLock => {
                sweep::multilock::run(&world, &state, &options, load)
            }
            road_sweeper::options::Sweeper::OneSided => {
                sweep::onesided::run(&world, &state, &options, load)
            }
        };
        log::debug!("sweep {} finished in {:.6}s", i, timings.sweeping);
        runs.push(timings);
    }

    let summary = Summary::new(&runs);
    report::print_timings(&state, &summary);
}

fn fail(rank: i32, world: &mpi::topology::SimpleCommunicator, err: SweepError) -> ! {
    if rank == 0 {
        log::error!("{err}");
        eprintln!("road-sweeper: {err}");
    }
    world.abort(1);
    std::process::exit(1);
}
