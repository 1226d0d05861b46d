//! Shared sweep-driver skeleton (component C3): octant enumeration and
//! the upwind/downwind neighbour lookup every sweeper variant shares.
//! The five variants live in their own submodules and differ only in
//! how they move face data across the Y/Z boundary and how many threads
//! they use while doing it.

pub mod multilock;
pub mod onesided;
pub mod pargroup;
pub mod parmpi;
pub mod serial;

use crate::topology::{Neighbour, RankState};

/// One of the eight sweep directions. `z_forward`/`y_forward` select
/// which neighbour is upwind along each decomposed axis; `x_forward`
/// selects the chunk marching order along the non-decomposed axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Octant {
    pub z_forward: bool,
    pub y_forward: bool,
    pub x_forward: bool,
}

/// Enumerates all eight octants in the same `k, j, i` nesting order as
/// `k, j, i` order: z varies slowest, x fastest.
pub fn octants() -> impl Iterator<Item = Octant> {
    (0..2).flat_map(|k| {
        (0..2).flat_map(move |j| {
            (0..2).map(move |i| Octant {
                z_forward: k == 1,
                y_forward: j == 1,
                x_forward: i == 1,
            })
        })
    })
}

impl Octant {
    /// Chunk indices along X, in this octant's marching order.
    pub fn chunk_indices(&self, nchunks: usize) -> Box<dyn Iterator<Item = usize>> {
        if self.x_forward {
            Box::new(0..nchunks)
        } else {
            Box::new((0..nchunks).rev())
        }
    }

    pub fn y_upwind(&self, state: &RankState) -> Neighbour {
        if self.y_forward {
            state.ylo
        } else {
            state.yhi
        }
    }

    pub fn y_downwind(&self, state: &RankState) -> Neighbour {
        if self.y_forward {
            state.yhi
        } else {
            state.ylo
        }
    }

    pub fn z_upwind(&self, state: &RankState) -> Neighbour {
        if self.z_forward {
            state.zlo
        } else {
            state.zhi
        }
    }

    pub fn z_downwind(&self, state: &RankState) -> Neighbour {
        if self.z_forward {
            state.zhi
        } else {
            state.zlo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::ThreadSupport;

    #[test]
    fn octants_covers_all_eight_combinations_once() {
        let all: Vec<_> = octants().collect();
        assert_eq!(all.len(), 8);
        let mut keys: Vec<(bool, bool, bool)> =
            all.iter().map(|o| (o.z_forward, o.y_forward, o.x_forward)).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn chunk_order_reverses_with_x_direction() {
        let forward = Octant { z_forward: true, y_forward: true, x_forward: true };
        let backward = Octant { z_forward: true, y_forward: true, x_forward: false };
        assert_eq!(forward.chunk_indices(4).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(backward.chunk_indices(4).collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn upwind_and_downwind_are_always_opposite_neighbours() {
        let state = RankState::decompose_weak(4, 9, ThreadSupport::Multiple); // interior rank of a 3x3 grid
        for octant in octants() {
            assert_eq!(octant.y_upwind(&state) == state.ylo, octant.y_downwind(&state) == state.yhi);
            assert_ne!(octant.y_upwind(&state), octant.y_downwind(&state));
            assert_ne!(octant.z_upwind(&state), octant.z_downwind(&state));
        }
    }
}
