//! Command-line configuration. Parsing and validation are kept
//! thin: [`Opts`] only decides *what was asked
//! for*, and [`resolve`] turns that into the [`Options`]/[`RankState`]
//! pair every sweeper runs against.

use clap::Parser;

use crate::error::SweepError;
use crate::options::{Options, Sweeper};
use crate::topology::{RankState, ThreadSupport};

#[derive(Debug, Clone, Parser)]
#[command(name = "road-sweeper", version, about = "A KBA wavefront sweep mini-app")]
pub struct Opts {
    /// Number of times to repeat the sweep.
    #[arg(long, default_value_t = 1)]
    pub nsweeps: usize,

    /// Chunks per octant along X.
    #[arg(long, default_value_t = 1)]
    pub nchunks: usize,

    /// Cells per chunk along X.
    #[arg(long, default_value_t = 1)]
    pub chunklen: usize,

    /// Local subdomain extent in Y (weak scaling).
    #[arg(long, default_value_t = 1)]
    pub ny: usize,

    /// Local subdomain extent in Z (weak scaling).
    #[arg(long, default_value_t = 1)]
    pub nz: usize,

    /// Global mesh extent in Y (required with --strong).
    #[arg(long)]
    pub gny: Option<usize>,

    /// Global mesh extent in Z (required with --strong).
    #[arg(long)]
    pub gnz: Option<usize>,

    /// Angles per cell.
    #[arg(long, default_value_t = 10)]
    pub nang: usize,

    /// Energy groups.
    #[arg(long, default_value_t = 16)]
    pub ng: usize,

    /// Use strong-scaling decomposition against --gny/--gnz.
    #[arg(long, default_value_t = false)]
    pub strong: bool,

    /// Which sweeper to run: serial, pargroup, parmpi, multilock, onesided.
    #[arg(long, default_value = "serial")]
    pub sweep: String,
}

/// Everything [`Opts`] plus MPI bootstrap produces: the resolved options
/// and this rank's place in the process grid.
pub struct Resolved {
    pub options: Options,
    pub state: RankState,
}

/// Turns parsed CLI flags plus this rank's identity/thread support into a
/// validated [`Resolved`] configuration, or the [`SweepError`] that
/// explains why the run can't proceed.
pub fn resolve(
    opts: &Opts,
    rank: i32,
    nprocs: i32,
    thread_support: ThreadSupport,
) -> Result<Resolved, SweepError> {
    let version = opts
        .sweep
        .parse::<Sweeper>()
        .map_err(SweepError::UnknownSweepType)?;

    let min_support = match version {
        Sweeper::Serial | Sweeper::ParGroup | Sweeper::OneSided => ThreadSupport::Single,
        Sweeper::ParMpi | Sweeper::MultiLock => ThreadSupport::Serialized,
    };
    if thread_support < min_support {
        return Err(SweepError::InsufficientThreadSupport(thread_support));
    }

    let (state, ny, nz, gny, gnz) = if opts.strong {
        let gny = opts.gny.ok_or(SweepError::MissingMeshExtents)?;
        let gnz = opts.gnz.ok_or(SweepError::MissingMeshExtents)?;
        let (state, ny, nz) =
            RankState::decompose_strong(rank, nprocs, thread_support, gny as i32, gnz as i32);
        (state, ny, nz, gny, gnz)
    } else {
        let state = RankState::decompose_weak(rank, nprocs, thread_support);
        (state, opts.ny, opts.nz, opts.ny * state.py as usize, opts.nz * state.pz as usize)
    };

    let options = Options {
        nchunks: opts.nchunks,
        chunklen: opts.chunklen,
        ny,
        nz,
        gny,
        gnz,
        nang: opts.nang,
        ng: opts.ng,
        nsweeps: opts.nsweeps.max(1),
        strong: opts.strong,
        version,
    };

    Ok(Resolved { options, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_opts() -> Opts {
        Opts {
            nsweeps: 1,
            nchunks: 1,
            chunklen: 1,
            ny: 2,
            nz: 2,
            gny: None,
            gnz: None,
            nang: 10,
            ng: 16,
            strong: false,
            sweep: "serial".to_string(),
        }
    }

    #[test]
    fn unknown_sweep_name_is_a_configuration_error() {
        let opts = Opts { sweep: "bogus".to_string(), ..base_opts() };
        let err = resolve(&opts, 0, 4, ThreadSupport::Multiple).unwrap_err();
        assert!(matches!(err, SweepError::UnknownSweepType(_)));
    }

    #[test]
    fn strong_without_mesh_extents_is_a_configuration_error() {
        let opts = Opts { strong: true, ..base_opts() };
        let err = resolve(&opts, 0, 4, ThreadSupport::Multiple).unwrap_err();
        assert!(matches!(err, SweepError::MissingMeshExtents));
    }

    #[test]
    fn onesided_runs_under_the_single_thread_floor() {
        let opts = Opts { sweep: "onesided".to_string(), ..base_opts() };
        let resolved = resolve(&opts, 0, 4, ThreadSupport::Single).unwrap();
        assert_eq!(resolved.options.version, Sweeper::OneSided);
    }

    #[test]
    fn multilock_requires_at_least_serialized() {
        let opts = Opts { sweep: "multilock".to_string(), ..base_opts() };
        let err = resolve(&opts, 0, 4, ThreadSupport::Single).unwrap_err();
        assert!(matches!(err, SweepError::InsufficientThreadSupport(_)));
    }

    #[test]
    fn weak_scaling_resolves_cleanly() {
        let opts = base_opts();
        let resolved = resolve(&opts, 0, 4, ThreadSupport::Multiple).unwrap();
        assert_eq!(resolved.options.ny, 2);
        assert_eq!(resolved.options.nz, 2);
    }

    #[test]
    fn strong_scaling_resolves_with_mesh_extents() {
        let opts = Opts { strong: true, gny: Some(8), gnz: Some(8), ..base_opts() };
        let resolved = resolve(&opts, 0, 4, ThreadSupport::Multiple).unwrap();
        assert_eq!(resolved.options.gny, 8);
        assert_eq!(resolved.options.gnz, 8);
    }
}
