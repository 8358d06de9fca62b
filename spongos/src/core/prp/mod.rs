use generic_array::{ArrayLength, GenericArray};

pub(crate) mod keccak;

/// Permutation a [`Spongos`](crate::Spongos) runs on its state, split into an outer part that
/// data goes through and an inner part that never leaves the sponge.
///
/// Only the forward direction is ever applied.
#[allow(clippy::upper_case_acronyms)]
pub trait PRP {
    /// Bytes absorbed or squeezed between two transforms
    type RateSize: ArrayLength<u8>;
    /// Sets the size of keys, nonces and MACs
    type CapacitySize: ArrayLength<u8>;

    fn transform(&mut self);
    fn outer(&self) -> &GenericArray<u8, Self::RateSize>;
    fn outer_mut(&mut self) -> &mut GenericArray<u8, Self::RateSize>;
    fn inner(&self) -> &GenericArray<u8, Self::CapacitySize>;
    fn inner_mut(&mut self) -> &mut GenericArray<u8, Self::CapacitySize>;
}
