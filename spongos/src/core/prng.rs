use generic_array::GenericArray;

use super::{prp::PRP, spongos::Spongos};

type Key<F> = GenericArray<u8, <F as PRP>::CapacitySize>;

/// Label separating the keys of this generator from other uses of the same seed
const DOMAIN: &str = "spongos rng";

/// [`rand::RngCore`] whose output only depends on its seed. Long term key pairs are generated
/// with it so that a seed always gives back the same keys.
///
/// Each draw squeezes `sponge(key || nonce)` and then increments the nonce.
pub struct SpongosRng<F: PRP> {
    key: Key<F>,
    nonce: Key<F>,
}

impl<F> SpongosRng<F>
where
    F: PRP + Default,
{
    pub fn new<T>(seed: T) -> Self
    where
        T: AsRef<[u8]>,
    {
        let mut spongos = Spongos::<F>::init();
        spongos.absorb(seed);
        spongos.commit();
        spongos.absorb(DOMAIN);
        spongos.commit();
        Self {
            key: spongos.squeeze(),
            nonce: Key::<F>::default(),
        }
    }

    /// Little-endian increment, wrapping to zero
    fn next_nonce(&mut self) {
        for byte in self.nonce.iter_mut() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
    }
}

impl<F> rand::RngCore for SpongosRng<F>
where
    F: PRP + Default,
{
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut spongos = Spongos::<F>::init();
        spongos.absorb(&self.key);
        spongos.absorb(&self.nonce);
        spongos.commit();
        spongos.squeeze_mut(dest);
        self.next_nonce();
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl<F> rand::CryptoRng for SpongosRng<F> where F: PRP + Default {}
