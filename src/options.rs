//! Run options: the tunables that describe one
//! benchmark invocation. `ny`/`nz`/`gny`/`gnz` start out as whatever the
//! CLI gave, and `cli::resolve` overwrites `ny`/`nz` with the local
//! subdomain extents from `topology::RankState::decompose_strong` before
//! any sweeper sees them. Nothing else is mutated after construction.

use std::fmt;
use std::str::FromStr;

/// Which sweep engine variant to run. Maps 1:1 onto the `--sweep` CLI values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweeper {
    /// C4 — single-threaded two-sided sweep.
    Serial,
    /// C5-group — two-sided sweep batching all energy groups into one
    /// message per axis per chunk; no thread team.
    ParGroup,
    /// C5 — two-sided sweep, one thread per energy group, single global lock.
    ParMpi,
    /// C6 — two-sided sweep, one thread per energy group, per-thread ring lock.
    MultiLock,
    /// C7 — one-sided RMA sweep with a SAFE/SENT handshake.
    OneSided,
}

impl Sweeper {
    pub fn name(&self) -> &'static str {
        match self {
            Sweeper::Serial => "serial",
            Sweeper::ParGroup => "pargroup",
            Sweeper::ParMpi => "parmpi",
            Sweeper::MultiLock => "multilock",
            Sweeper::OneSided => "onesided",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Sweeper::Serial => "serial sweeper",
            Sweeper::ParGroup => "group-parallel sweeper (batched groups, no threads)",
            Sweeper::ParMpi => "parallel MPI sweeper (single lock)",
            Sweeper::MultiLock => "parallel MPI sweeper (multiple locks)",
            Sweeper::OneSided => "one-sided RMA sweeper",
        }
    }
}

impl FromStr for Sweeper {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serial" => Ok(Sweeper::Serial),
            "pargroup" => Ok(Sweeper::ParGroup),
            "parmpi" => Ok(Sweeper::ParMpi),
            "multilock" => Ok(Sweeper::MultiLock),
            "onesided" => Ok(Sweeper::OneSided),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Sweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime options for one benchmark run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Chunks per octant along the non-decomposed (X) axis.
    pub nchunks: usize,
    /// Cells per chunk along X.
    pub chunklen: usize,
    /// Local subdomain extent in Y. Derived from `gny`/`Py` in strong mode.
    pub ny: usize,
    /// Local subdomain extent in Z. Derived from `gnz`/`Pz` in strong mode.
    pub nz: usize,
    /// Global mesh extent in Y, used (and required) in strong-scaling mode.
    pub gny: usize,
    /// Global mesh extent in Z, used (and required) in strong-scaling mode.
    pub gnz: usize,
    /// Angles per cell.
    pub nang: usize,
    /// Energy groups.
    pub ng: usize,
    /// Number of times to repeat the chosen sweep.
    pub nsweeps: usize,
    /// Strong- vs weak-scaling decomposition mode.
    pub strong: bool,
    /// Which sweep engine to run.
    pub version: Sweeper,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            nchunks: 1,
            chunklen: 1,
            ny: 1,
            nz: 1,
            gny: 0,
            gnz: 0,
            nang: 10,
            ng: 16,
            nsweeps: 1,
            strong: false,
            version: Sweeper::Serial,
        }
    }
}

impl Options {
    /// Cells moved per y-face message, per group slot: `nang * nz * chunklen`.
    pub fn y_face_len(&self) -> usize {
        self.nang * self.nz * self.chunklen
    }

    /// Cells moved per z-face message, per group slot: `nang * ny * chunklen`.
    pub fn z_face_len(&self) -> usize {
        self.nang * self.ny * self.chunklen
    }

    /// Number of synthetic `compute()` calls to issue per chunk step,
    /// Proportional to `nang * chunklen * ny * nz`.
    pub fn compute_calls(&self) -> usize {
        self.nang * self.chunklen * self.ny * self.nz
    }

    /// Total cell count of the effective mesh (for the console report).
    pub fn effective_cells(&self, gny: usize, gnz: usize) -> u64 {
        (self.nchunks * self.chunklen) as u64 * gny as u64 * gnz as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweeper_round_trips_through_str() {
        for s in ["serial", "pargroup", "parmpi", "multilock", "onesided"] {
            assert_eq!(s.parse::<Sweeper>().unwrap().name(), s);
        }
    }

    #[test]
    fn unknown_sweeper_name_is_rejected() {
        assert!("bogus".parse::<Sweeper>().is_err());
    }

    #[test]
    fn face_lengths_match_spec_formula() {
        let opt = Options {
            nang: 10,
            nz: 3,
            ny: 4,
            chunklen: 2,
            ..Options::default()
        };
        assert_eq!(opt.y_face_len(), 10 * 3 * 2);
        assert_eq!(opt.z_face_len(), 10 * 4 * 2);
        assert_eq!(opt.compute_calls(), 10 * 2 * 4 * 3);
    }
}
