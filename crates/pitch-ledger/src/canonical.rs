//! Canonical byte encoding for hash inputs.
//!
//! The encoding is injective over the values it accepts:
//!
//! - every hash starts with a length-prefixed domain tag,
//! - integers are fixed-width little-endian,
//! - strings are a `u64` byte length followed by UTF-8 bytes,
//! - lists are a `u64` element count followed by the elements,
//! - actions are a one-byte tag followed by exactly that variant's fields,
//!   fixed-point values as their raw `i64`.
//!
//! There are no separators, no optional fields, and no floats, so any
//! implementation that follows these rules produces the same bytes.
//!
//! # Layout of an input
//!
//! ```text
//! tick:u64  timestamp:u64  tag:u8  fields...
//!   MOVE   = 1  x:i64 y:i64
//!   PASS   = 2  target:u32
//!   SHOOT  = 3  power:i64 angle:i64
//!   TACKLE = 4  target:u32
//!   SPRINT = 5
//!   SKILL  = 6
//! ```

use pitch_core::fixed::Fixed;
use pitch_core::input::{Action, PlayerInput};

/// Builds the canonical byte string for one hash.
#[derive(Debug, Clone)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Start an encoding under `domain`.
    pub fn new(domain: &str) -> Self {
        let mut encoder = Self {
            buf: Vec::with_capacity(256),
        };
        encoder.put_str(domain);
        encoder
    }

    pub fn put_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn put_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// A fixed-point value as its raw `i64`.
    pub fn put_fixed(&mut self, v: Fixed) -> &mut Self {
        self.put_i64(v.raw())
    }

    /// Length-prefixed UTF-8.
    pub fn put_str(&mut self, s: &str) -> &mut Self {
        self.put_u64(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// One validated input.
    pub fn put_input(&mut self, input: &PlayerInput) -> &mut Self {
        self.put_u64(input.tick).put_u64(input.timestamp);
        match input.action {
            Action::Move { x, y } => self.put_u8(1).put_fixed(x).put_fixed(y),
            Action::Pass { target_id } => self.put_u8(2).put_u32(target_id.0),
            Action::Shoot { power, angle } => self.put_u8(3).put_fixed(power).put_fixed(angle),
            Action::Tackle { target_id } => self.put_u8(4).put_u32(target_id.0),
            Action::Sprint => self.put_u8(5),
            Action::Skill => self.put_u8(6),
        }
    }

    /// Count-prefixed list of inputs, in the given order.
    pub fn put_inputs(&mut self, inputs: &[PlayerInput]) -> &mut Self {
        self.put_u64(inputs.len() as u64);
        for input in inputs {
            self.put_input(input);
        }
        self
    }

    /// The encoded bytes so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the encoder and return the bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// BLAKE3 of the encoded bytes as 64 lower-case hex characters.
    pub fn digest(&self) -> String {
        blake3::hash(&self.buf).to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
