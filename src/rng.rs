use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const IDENTITY_STREAM: &str = "identity";
pub const DEPLOYMENT_STREAM: &str = "deployment";

/// Named ChaCha streams derived from one master seed, so adding draws to one
/// stream never shifts another.
pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let master = &mut self.master;
        let entry = self.streams.entry(name.to_string()).or_insert_with(|| {
            let mut seed_bytes = [0u8; 32];
            master.fill_bytes(&mut seed_bytes);
            ChaCha8Rng::from_seed(seed_bytes)
        });
        SystemRng { inner: entry }
    }

    pub fn identity_bytes(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.stream(IDENTITY_STREAM).fill_bytes(&mut bytes);
        bytes
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for SystemRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
