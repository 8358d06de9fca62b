use generic_array::{
    typenum::{Unsigned, U168, U32},
    ArrayLength, GenericArray,
};

use super::PRP;

/// Number of `u64` lanes in the rate. The capacity takes the 4 remaining lanes.
const RATE_LANES: usize = 21;

/// Keccak-F[1600] over 25 lanes, seen as 168 bytes of rate followed by 32 bytes of capacity.
/// Bytes are read from the lanes in native byte order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeccakF1600 {
    lanes: [u64; 25],
}

fn bytes<N: ArrayLength<u8>>(lanes: &[u64]) -> &GenericArray<u8, N> {
    debug_assert_eq!(lanes.len() * 8, N::USIZE);
    // SAFETY: `lanes` spans N initialized bytes and u8 has no alignment requirement
    unsafe { &*(lanes.as_ptr() as *const GenericArray<u8, N>) }
}

fn bytes_mut<N: ArrayLength<u8>>(lanes: &mut [u64]) -> &mut GenericArray<u8, N> {
    debug_assert_eq!(lanes.len() * 8, N::USIZE);
    // SAFETY: as in `bytes`, with the exclusive borrow of `lanes`
    unsafe { &mut *(lanes.as_mut_ptr() as *mut GenericArray<u8, N>) }
}

impl PRP for KeccakF1600 {
    type RateSize = U168;
    type CapacitySize = U32;

    fn transform(&mut self) {
        keccak::f1600(&mut self.lanes);
    }

    fn outer(&self) -> &GenericArray<u8, U168> {
        bytes(&self.lanes[..RATE_LANES])
    }

    fn outer_mut(&mut self) -> &mut GenericArray<u8, U168> {
        bytes_mut(&mut self.lanes[..RATE_LANES])
    }

    fn inner(&self) -> &GenericArray<u8, U32> {
        bytes(&self.lanes[RATE_LANES..])
    }

    fn inner_mut(&mut self) -> &mut GenericArray<u8, U32> {
        bytes_mut(&mut self.lanes[RATE_LANES..])
    }
}
