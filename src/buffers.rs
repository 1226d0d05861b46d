//! Face buffers: the flat `f64` arrays exchanged across the Y/Z process
//! boundaries, and the SAFE/SENT signal used by the one-sided sweeper.

/// A flat buffer for one axis's worth of face data, covering `k` group
/// slots of `face_len` values each (`K = 1` for `serial`, `multilock`,
/// and `parmpi`'s per-thread view; `K = ng` for `pargroup`'s single
/// batched message and for `onesided`'s whole-window layout).
#[derive(Debug, Clone)]
pub struct FaceBuffer {
    data: Vec<f64>,
    face_len: usize,
}

impl FaceBuffer {
    pub fn new(face_len: usize, k: usize) -> Self {
        FaceBuffer {
            data: vec![0.0; face_len * k],
            face_len,
        }
    }

    pub fn slot(&self, group: usize) -> &[f64] {
        &self.data[group * self.face_len..(group + 1) * self.face_len]
    }

    pub fn slot_mut(&mut self, group: usize) -> &mut [f64] {
        &mut self.data[group * self.face_len..(group + 1) * self.face_len]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The two-value signal exchanged alongside each face's data in the
/// one-sided sweeper. Stored as a plain integer in the RMA
/// window since `MPI_Put` targets need a `Copy`, `repr`-stable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum Signal {
    Unset = 0,
    Safe = 1,
    Sent = 2,
}

impl Signal {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Signal::Safe,
            2 => Signal::Sent,
            _ => Signal::Unset,
        }
    }

    pub fn raw(self) -> i64 {
        self as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_disjoint_and_correctly_sized() {
        let mut buf = FaceBuffer::new(4, 3);
        buf.slot_mut(0).fill(1.0);
        buf.slot_mut(1).fill(2.0);
        buf.slot_mut(2).fill(3.0);
        assert_eq!(buf.slot(0), &[1.0; 4][..]);
        assert_eq!(buf.slot(1), &[2.0; 4][..]);
        assert_eq!(buf.slot(2), &[3.0; 4][..]);
        assert_eq!(buf.len(), 12);
    }

    #[test]
    fn signal_round_trips_through_raw() {
        for sig in [Signal::Unset, Signal::Safe, Signal::Sent] {
            assert_eq!(Signal::from_raw(sig.raw()), sig);
        }
    }

    #[test]
    fn unrecognised_raw_value_decodes_as_unset() {
        assert_eq!(Signal::from_raw(99), Signal::Unset);
    }
}
