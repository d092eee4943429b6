//! Block payload keystream.
//!
//! Every block except the file header and footer is XOR-ed with a stream of
//! 32-bit values from a pseudo-random generator seeded from the plaintext
//! header. The stream position carries over from block to block, so blocks
//! must be transformed exactly once each and in file order.

use log::{debug, warn};

use crate::header::FileHeader;

/// Fields of the file header the keystream is seeded from, in seeding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSeed {
    /// 11-bit salt from the player word
    pub salt: u16,
    pub game_id: u32,
    pub turn: u16,
    pub player_index: u8,
    pub shareware: bool,
}

impl CipherSeed {
    pub fn from_header(header: &FileHeader) -> Self {
        CipherSeed {
            salt: header.salt,
            game_id: header.game_id,
            turn: header.turn,
            player_index: header.player_index,
            shareware: header.is_shareware(),
        }
    }
}

/// A stateful symmetric transform applied to block payloads.
///
/// `decrypt` and `encrypt` are inverses for the same state; each call
/// advances the state.
pub trait Keystream {
    fn init(&mut self, seed: &CipherSeed);
    fn decrypt(&mut self, ciphertext: &[u8]) -> Vec<u8>;
    fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8>;
}

/// Pass-through transform for payloads that are already plaintext.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainKeystream;

impl Keystream for PlainKeystream {
    fn init(&mut self, _seed: &CipherSeed) {}

    fn decrypt(&mut self, ciphertext: &[u8]) -> Vec<u8> {
        ciphertext.to_vec()
    }

    fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8> {
        plaintext.to_vec()
    }
}

/// Seed table for the generator. Entry 55 is 279 rather than the prime
/// 269; the game ships that value and files depend on it.
const SEED_TABLE: [u32; 64] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 279, 271, 277, 281, 283, 293, 307,
    311, 313,
];

/// Combined two-seed linear congruential generator used by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarsRandom {
    seed_a: i64,
    seed_b: i64,
}

impl StarsRandom {
    pub fn new(seed_a: u32, seed_b: u32, rounds: u32) -> Self {
        let mut rng = StarsRandom {
            seed_a: seed_a as i64,
            seed_b: seed_b as i64,
        };
        for _ in 0..rounds {
            rng.next_u32();
        }
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut a = (self.seed_a % 53668) * 40014 - (self.seed_a / 53668) * 12211;
        if a < 0 {
            a += 0x7fff_ffab;
        }
        let mut b = (self.seed_b % 52774) * 40692 - (self.seed_b / 52774) * 3791;
        if b < 0 {
            b += 0x7fff_ff07;
        }
        self.seed_a = a;
        self.seed_b = b;

        let mut value = a - b;
        if a < b {
            value += 0x1_0000_0000;
        }
        value as u32
    }
}

/// The game's own block keystream.
#[derive(Debug, Clone, Default)]
pub struct StarsKeystream {
    rng: Option<StarsRandom>,
}

impl StarsKeystream {
    pub fn new() -> Self {
        StarsKeystream { rng: None }
    }

    fn seed_indexes(salt: u16) -> (usize, usize) {
        let mut index1 = (salt & 0x1F) as usize;
        let mut index2 = ((salt >> 5) & 0x1F) as usize;
        if (salt >> 10) == 1 {
            index1 += 32;
        } else {
            index2 += 32;
        }
        (index1, index2)
    }

    fn warmup_rounds(seed: &CipherSeed) -> u32 {
        let shareware = seed.shareware as u32;
        let player = (seed.player_index as u32 & 0x3) + 1;
        let turn = (seed.turn as u32 & 0x3) + 1;
        let game = (seed.game_id & 0x3) + 1;
        game * turn * player + shareware
    }

    fn apply(&mut self, data: &[u8]) -> Vec<u8> {
        let rng = match self.rng.as_mut() {
            Some(rng) => rng,
            None => {
                warn!("keystream used before init, payload left unchanged");
                return data.to_vec();
            }
        };

        let padded_len = (data.len() + 3) & !3;
        let mut padded = data.to_vec();
        padded.resize(padded_len, 0);

        for chunk in padded.chunks_mut(4) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let out = word ^ rng.next_u32();
            chunk.copy_from_slice(&out.to_le_bytes());
        }
        padded.truncate(data.len());
        padded
    }
}

impl Keystream for StarsKeystream {
    fn init(&mut self, seed: &CipherSeed) {
        let (index1, index2) = Self::seed_indexes(seed.salt);
        let rounds = Self::warmup_rounds(seed);
        debug!(
            "keystream seeds {}/{} ({}, {}), {} warm-up rounds",
            index1, index2, SEED_TABLE[index1], SEED_TABLE[index2], rounds
        );
        self.rng = Some(StarsRandom::new(
            SEED_TABLE[index1],
            SEED_TABLE[index2],
            rounds,
        ));
    }

    fn decrypt(&mut self, ciphertext: &[u8]) -> Vec<u8> {
        self.apply(ciphertext)
    }

    fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8> {
        self.apply(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> CipherSeed {
        CipherSeed {
            salt: 0x2A5,
            game_id: 0x1234_5679,
            turn: 6,
            player_index: 2,
            shareware: false,
        }
    }

    #[test]
    fn test_seed_indexes() {
        // bit 10 clear: second index moves to the upper half
        assert_eq!(StarsKeystream::seed_indexes(0b0_10101_00101), (5, 21 + 32));
        // bit 10 set: first index moves instead
        assert_eq!(StarsKeystream::seed_indexes(0b1_10101_00101), (5 + 32, 21));
    }

    #[test]
    fn test_warmup_rounds() {
        // (1 + 1) * (2 + 1) * (2 + 1) + 0
        assert_eq!(StarsKeystream::warmup_rounds(&seed()), 18);
        let mut s = seed();
        s.shareware = true;
        assert_eq!(StarsKeystream::warmup_rounds(&s), 19);
    }

    #[test]
    fn test_generator_stays_in_range_and_is_deterministic() {
        let mut a = StarsRandom::new(3, 313, 5);
        let mut b = StarsRandom::new(3, 313, 5);
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        assert!(a.seed_a > 0 && a.seed_a < 0x7fff_ffab);
        assert!(a.seed_b > 0 && a.seed_b < 0x7fff_ff07);
    }

    #[test]
    fn test_encrypt_then_decrypt_restores_payloads() {
        let payloads: Vec<Vec<u8>> = vec![
            vec![],
            vec![1],
            vec![1, 2, 3, 4, 5, 6, 7],
            (0..=255).collect(),
        ];

        let mut enc = StarsKeystream::new();
        enc.init(&seed());
        let encrypted: Vec<Vec<u8>> = payloads.iter().map(|p| enc.encrypt(p)).collect();

        let mut dec = StarsKeystream::new();
        dec.init(&seed());
        for (plain, cipher) in payloads.iter().zip(&encrypted) {
            assert_eq!(cipher.len(), plain.len());
            assert_eq!(&dec.decrypt(cipher), plain);
        }
        assert_ne!(encrypted[3], payloads[3]);
    }

    #[test]
    fn test_stream_position_advances_per_block() {
        let mut ks = StarsKeystream::new();
        ks.init(&seed());
        let first = ks.encrypt(&[0; 4]);
        let second = ks.encrypt(&[0; 4]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_plain_keystream() {
        let mut ks = PlainKeystream;
        ks.init(&seed());
        assert_eq!(ks.decrypt(&[9, 8, 7]), vec![9, 8, 7]);
        assert_eq!(ks.encrypt(&[9, 8, 7]), vec![9, 8, 7]);
    }
}
