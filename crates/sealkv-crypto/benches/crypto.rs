use sealkv_core::config::EnvelopeConfig;
use sealkv_core::StreamSuite;
use sealkv_crypto::suite::{self, Algorithm};
use sealkv_crypto::{derive_key, generate_nonce, open, seal, MasterSecret};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_seal_envelope(bencher: divan::Bencher, size: usize) {
    let master = MasterSecret::from_bytes([0xABu8; 32]);
    let config = EnvelopeConfig::default();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| seal(divan::black_box(&master), &config, divan::black_box(&data)).unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_open_envelope(bencher: divan::Bencher, size: usize) {
    let master = MasterSecret::from_bytes([0xABu8; 32]);
    let data = make_data(size);
    let envelope = seal(&master, &EnvelopeConfig::default(), &data).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| open(divan::black_box(&master), divan::black_box(&envelope)).unwrap());
}

#[divan::bench(args = [1024, 65536])]
fn bench_seal_chacha_stream(bencher: divan::Bencher, size: usize) {
    let master = MasterSecret::from_bytes([0xABu8; 32]);
    let config = EnvelopeConfig {
        suite: StreamSuite::ChaCha20Poly1305,
        ..EnvelopeConfig::default()
    };
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| seal(divan::black_box(&master), &config, divan::black_box(&data)).unwrap());
}

#[divan::bench]
fn bench_derive_key(bencher: divan::Bencher) {
    let master = MasterSecret::from_bytes([0xABu8; 32]);
    let nonce = generate_nonce().unwrap();
    bencher.bench(|| derive_key(divan::black_box(&master), divan::black_box(&nonce)).unwrap());
}

#[divan::bench(args = [
    Algorithm::Aes256Gcm,
    Algorithm::XChaCha20Poly1305,
    Algorithm::SecretBox,
    Algorithm::ChaCha20Poly1305,
])]
fn bench_suite_encrypt(bencher: divan::Bencher, algorithm: Algorithm) {
    let cipher = suite::generate(algorithm).unwrap();
    let data = make_data(4096);
    bencher
        .counter(divan::counter::BytesCount::new(data.len()))
        .bench(|| cipher.encrypt(divan::black_box(&data)).unwrap());
}

fn main() {
    divan::main();
}
