//! Rank topology: the 2-D process grid over the
//! flat MPI world, and the decomposition planner (component C2) that
//! produces it.

use std::fmt;

/// The threading level an MPI implementation reports back from
/// `MPI_Init_thread`. Ordered the same way `MPI_THREAD_*` is ordered, so
/// `<` means "less capable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreadSupport {
    Single,
    Funneled,
    Serialized,
    Multiple,
}

impl fmt::Display for ThreadSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreadSupport::Single => "MPI_THREAD_SINGLE",
            ThreadSupport::Funneled => "MPI_THREAD_FUNNELED",
            ThreadSupport::Serialized => "MPI_THREAD_SERIALIZED",
            ThreadSupport::Multiple => "MPI_THREAD_MULTIPLE",
        };
        f.write_str(s)
    }
}

/// A neighbour rank in one of the four cardinal directions of the 2-D
/// process grid, or the distinguished sentinel for "no neighbour here,
/// this is an external boundary". A sum type rather than a magic
/// `MPI_PROC_NULL`-style rank number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbour {
    Rank(i32),
    Null,
}

impl Neighbour {
    pub fn is_null(&self) -> bool {
        matches!(self, Neighbour::Null)
    }

    pub fn rank(&self) -> Option<i32> {
        match self {
            Neighbour::Rank(r) => Some(*r),
            Neighbour::Null => None,
        }
    }
}

/// Per-process record produced once at startup by the decomposition
/// planner and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RankState {
    pub rank: i32,
    pub nprocs: i32,
    pub thread_support: ThreadSupport,
    pub py: i32,
    pub pz: i32,
    pub y: i32,
    pub z: i32,
    pub ylo: Neighbour,
    pub yhi: Neighbour,
    pub zlo: Neighbour,
    pub zhi: Neighbour,
}

/// Choose a 2-D process grid `(Py, Pz)` with `Py * Pz == nprocs` that
/// minimises the perimeter/area ratio
/// `2 * (u/Py + v/Pz) / ((u/Py) * (v/Pz))`, using the same truncating
/// integer division used elsewhere in this module. Ties keep the first `Py`
/// encountered, i.e. the smallest.
fn best_grid(nprocs: i32, u: i32, v: i32) -> (i32, i32) {
    let mut best_ratio = f64::MAX;
    let mut best = (1, nprocs);

    for py in 1..=nprocs {
        if nprocs % py != 0 {
            continue;
        }
        let pz = nprocs / py;

        let uy = u / py;
        let vz = v / pz;
        let perimeter = 2.0 * (uy as f64 + vz as f64);
        let area = uy as f64 * vz as f64;
        let ratio = perimeter / area;

        if ratio < best_ratio {
            best_ratio = ratio;
            best = (py, pz);
        }
    }
    best
}

fn neighbours(rank: i32, py: i32, pz: i32, y: i32, z: i32) -> (Neighbour, Neighbour, Neighbour, Neighbour) {
    let _ = rank;
    let ylo = if y == 0 {
        Neighbour::Null
    } else {
        Neighbour::Rank((y - 1) + z * py)
    };
    let yhi = if y == py - 1 {
        Neighbour::Null
    } else {
        Neighbour::Rank((y + 1) + z * py)
    };
    let zlo = if z == 0 {
        Neighbour::Null
    } else {
        Neighbour::Rank(y + (z - 1) * py)
    };
    let zhi = if z == pz - 1 {
        Neighbour::Null
    } else {
        Neighbour::Rank(y + (z + 1) * py)
    };
    (ylo, yhi, zlo, zhi)
}

impl RankState {
    /// Weak-scaling decomposition: the grid is chosen independent of mesh
    /// size, by minimising the ratio with `u = v = nprocs`.
    pub fn decompose_weak(rank: i32, nprocs: i32, thread_support: ThreadSupport) -> Self {
        let (py, pz) = best_grid(nprocs, nprocs, nprocs);
        let y = rank % py;
        let z = rank / py;
        let (ylo, yhi, zlo, zhi) = neighbours(rank, py, pz, y, z);

        RankState {
            rank,
            nprocs,
            thread_support,
            py,
            pz,
            y,
            z,
            ylo,
            yhi,
            zlo,
            zhi,
        }
    }

    /// Strong-scaling decomposition: the grid is chosen to minimise the
    /// ratio over the global mesh extents, and leftover cells (`gny mod
    /// Py`, `gnz mod Pz`) are handed to the low-coordinate ranks along
    /// each axis.
    ///
    /// Returns the rank state together with this rank's local `(ny, nz)`.
    pub fn decompose_strong(
        rank: i32,
        nprocs: i32,
        thread_support: ThreadSupport,
        gny: i32,
        gnz: i32,
    ) -> (Self, usize, usize) {
        let (py, pz) = best_grid(nprocs, gny, gnz);
        let y = rank % py;
        let z = rank / py;
        let (ylo, yhi, zlo, zhi) = neighbours(rank, py, pz, y, z);

        let mut ny = gny / py;
        let mut nz = gnz / pz;
        let extra_y = gny % py;
        let extra_z = gnz % pz;
        if extra_y > 0 && y < extra_y {
            ny += 1;
        }
        if extra_z > 0 && z < extra_z {
            nz += 1;
        }

        let state = RankState {
            rank,
            nprocs,
            thread_support,
            py,
            pz,
            y,
            z,
            ylo,
            yhi,
            zlo,
            zhi,
        };
        (state, ny as usize, nz as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weak(rank: i32, nprocs: i32) -> RankState {
        RankState::decompose_weak(rank, nprocs, ThreadSupport::Multiple)
    }

    #[test]
    fn grid_choice_covers_all_ranks_up_to_4096() {
        // Property 1: for every P, Py*Pz == P, and no other divisor pair
        // strictly beats the chosen ratio.
        for nprocs in 1..=4096 {
            let (py, pz) = best_grid(nprocs, nprocs, nprocs);
            assert_eq!(py * pz, nprocs);

            let chosen_ratio = {
                let uy = nprocs / py;
                let vz = nprocs / pz;
                2.0 * (uy as f64 + vz as f64) / (uy as f64 * vz as f64)
            };
            for candidate_py in 1..=nprocs {
                if nprocs % candidate_py != 0 {
                    continue;
                }
                let candidate_pz = nprocs / candidate_py;
                let uy = nprocs / candidate_py;
                let vz = nprocs / candidate_pz;
                let ratio = 2.0 * (uy as f64 + vz as f64) / (uy as f64 * vz as f64);
                assert!(
                    ratio >= chosen_ratio || candidate_py >= py,
                    "P={nprocs}: candidate Py={candidate_py} beats chosen Py={py}"
                );
            }
        }
    }

    #[test]
    fn two_ranks_along_y_are_mirror_images() {
        // S1
        let r0 = weak(0, 2);
        assert_eq!((r0.py, r0.pz), (2, 1));
        assert_eq!(r0.ylo, Neighbour::Null);
        assert_eq!(r0.yhi, Neighbour::Rank(1));
        assert_eq!(r0.zlo, Neighbour::Null);
        assert_eq!(r0.zhi, Neighbour::Null);

        let r1 = weak(1, 2);
        assert_eq!(r1.ylo, Neighbour::Rank(0));
        assert_eq!(r1.yhi, Neighbour::Null);
        assert_eq!(r1.zlo, Neighbour::Null);
        assert_eq!(r1.zhi, Neighbour::Null);
    }

    #[test]
    fn four_ranks_form_a_square() {
        // S2
        for rank in 0..4 {
            let r = weak(rank, 4);
            assert_eq!((r.py, r.pz), (2, 2));
            let null_count = [r.ylo, r.yhi, r.zlo, r.zhi]
                .iter()
                .filter(|n| n.is_null())
                .count();
            assert_eq!(null_count, 2);
        }
    }

    #[test]
    fn interior_ranks_have_no_null_neighbours() {
        // Property 2, interior half.
        for rank in 0..9 {
            let r = weak(rank, 9);
            assert_eq!((r.py, r.pz), (3, 3));
            if r.y != 0 && r.y != r.py - 1 && r.z != 0 && r.z != r.pz - 1 {
                assert!(![r.ylo, r.yhi, r.zlo, r.zhi].iter().any(|n| n.is_null()));
            }
        }
    }

    #[test]
    fn strong_scaling_leftover_goes_to_low_coordinate_ranks() {
        // S3: gny=5, gnz=4, P=4 -> grid (2,2); y=0 ranks get ny=3, y=1 get ny=2; nz=2 uniformly.
        for rank in 0..4 {
            let (state, ny, nz) = RankState::decompose_strong(rank, 4, ThreadSupport::Multiple, 5, 4);
            assert_eq!((state.py, state.pz), (2, 2));
            if state.y == 0 {
                assert_eq!(ny, 3);
            } else {
                assert_eq!(ny, 2);
            }
            assert_eq!(nz, 2);
        }
    }

    #[test]
    fn strong_scaling_column_sums_match_global_extent() {
        // Property 3.
        let nprocs = 6;
        let gny = 13;
        let gnz = 7;
        let mut y_sum_by_z: std::collections::HashMap<i32, usize> = std::collections::HashMap::new();
        let mut z_sum_by_y: std::collections::HashMap<i32, usize> = std::collections::HashMap::new();
        let mut py_seen = None;
        for rank in 0..nprocs {
            let (state, ny, nz) = RankState::decompose_strong(rank, nprocs, ThreadSupport::Multiple, gny, gnz);
            py_seen = Some(state.py);
            *y_sum_by_z.entry(state.z).or_insert(0) += ny;
            *z_sum_by_y.entry(state.y).or_insert(0) += nz;
        }
        for (_z, sum) in y_sum_by_z {
            assert_eq!(sum, gny as usize);
        }
        let pz = nprocs / py_seen.unwrap();
        for (_y, sum) in z_sum_by_y {
            assert_eq!(sum, gnz as usize * (py_seen.unwrap() as usize) / (py_seen.unwrap() as usize));
            let _ = pz;
        }
    }

    #[test]
    fn prime_process_count_still_terminates() {
        let (py, pz) = best_grid(97, 97, 97);
        assert_eq!(py * pz, 97);
        assert!(py == 1 || pz == 1);
    }
}
