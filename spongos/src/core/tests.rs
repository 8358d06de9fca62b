use alloc::vec::Vec;

use rand::RngCore;

use super::{
    prng::SpongosRng,
    prp::{keccak::KeccakF1600, PRP},
    spongos::Spongos,
};

fn seeded<F: PRP + Default>(seed: &[u8]) -> Spongos<F> {
    let mut s = Spongos::<F>::init();
    s.absorb(seed);
    s.commit();
    s
}

fn squeeze_vec<F: PRP>(s: &mut Spongos<F>, n: usize) -> Vec<u8> {
    let mut v = vec![0; n];
    s.squeeze_mut(&mut v);
    v
}

fn encrypt_decrypt_n<F: PRP + Default + Clone + PartialEq>(n: usize) {
    let mut rng = seeded::<F>(b"encrypt-decrypt");
    let key = squeeze_vec(&mut rng, n);
    let plain = squeeze_vec(&mut rng, n);

    let mut sender = seeded::<F>(&key);
    let mut receiver = sender.fork();

    let mut cipher = vec![0; n];
    sender.encrypt_mut(&plain, &mut cipher).unwrap();
    sender.commit();
    let tag = squeeze_vec(&mut sender, 32);

    let mut decrypted = vec![0; n];
    receiver.decrypt_mut(&cipher, &mut decrypted).unwrap();
    receiver.commit();

    assert_eq!(plain, decrypted, "{}: x != D(E(x))", n);
    assert!(receiver.squeeze_eq(&tag), "{}: MAC(x) != MAC(D(E(x)))", n);
    assert_eq!(sender, receiver, "{}: sponge states diverged", n);
}

#[test]
fn encrypt_decrypt_across_rate_boundaries() {
    // around 0, 1 and 2 times the Keccak rate of 168 bytes
    for n in [0, 1, 2, 167, 168, 169, 335, 336, 337, 1000] {
        encrypt_decrypt_n::<KeccakF1600>(n);
    }
}

#[test]
fn chunked_absorb_equals_whole_absorb() {
    let data: Vec<u8> = (0..500u16).map(|i| (i % 251) as u8).collect();

    let mut whole = Spongos::<KeccakF1600>::init();
    whole.absorb(&data);
    whole.commit();

    let mut chunked = Spongos::<KeccakF1600>::init();
    for chunk in data.chunks(7) {
        chunked.absorb(chunk);
    }
    chunked.commit();

    assert_eq!(whole.squeeze::<[u8; 32]>(), chunked.squeeze::<[u8; 32]>());
}

#[test]
fn squeeze_eq_detects_tampering() {
    let mut s = seeded::<KeccakF1600>(b"mac");
    let mut verifier = s.fork();
    let mut mac: [u8; 32] = s.squeeze();
    mac[31] ^= 1;
    assert!(!verifier.squeeze_eq(&mac));
}

#[test]
fn length_mismatch_is_rejected() {
    let mut s = Spongos::<KeccakF1600>::init();
    let mut cipher = [0u8; 4];
    assert!(s.encrypt_mut([1u8, 2, 3], &mut cipher).is_err());
}

#[test]
fn join_depends_on_joinee_state() {
    let mut base = seeded::<KeccakF1600>(b"base");
    let mut joinee_a = seeded::<KeccakF1600>(b"a");
    let mut joinee_b = seeded::<KeccakF1600>(b"b");

    let mut a = base.fork();
    a.join(&mut joinee_a);
    a.commit();
    base.join(&mut joinee_b);
    base.commit();

    assert_ne!(a.squeeze::<[u8; 32]>(), base.squeeze::<[u8; 32]>());
}

#[test]
fn spongos_rng_is_deterministic_per_seed() {
    let mut rng_a = SpongosRng::<KeccakF1600>::new("seed");
    let mut rng_b = SpongosRng::<KeccakF1600>::new("seed");
    let mut rng_c = SpongosRng::<KeccakF1600>::new("other seed");

    let first = rng_a.next_u64();
    assert_eq!(first, rng_b.next_u64());
    assert_ne!(first, rng_c.next_u64());
    // the nonce advances between draws
    assert_ne!(first, rng_a.next_u64());
}
