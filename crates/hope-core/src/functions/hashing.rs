// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stable hash functions
//!
//! Both hashes are deterministic across processes and platforms, so rules can
//! use them for bucketing (`math.abs(utils.hash_m128('$.user')) ...`).
//!
//! - `utils.hash_j` follows the JVM `hashCode` contract for strings, doubles,
//!   booleans and lists.
//! - `utils.hash_m128` is the low 64 bits of MurmurHash3 x64 128 (seed 0) over
//!   the value's canonical bytes.

use crate::ast::{Datum, Value};
use crate::context::EvaluationContext;
use crate::converters::object_value;
use crate::error::Result;
use crate::registry::{FunctionDescriptor, HopeFunction, fixed_args};

pub(crate) fn declarations() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(Hash::JVM).overload(1, Hash::jvm),
        FunctionDescriptor::new(Hash::MURMUR).overload(1, Hash::murmur),
    ]
}

/// `utils.hash_j(v)` and `utils.hash_m128(v)`
pub struct Hash<'a> {
    value: &'a Value,
    hasher: fn(&Datum) -> f64,
}

impl Hash<'_> {
    /// JVM hash name
    pub const JVM: &'static str = "utils.hash_j";
    /// MurmurHash3 name
    pub const MURMUR: &'static str = "utils.hash_m128";

    /// Factory for `utils.hash_j`
    pub fn jvm(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value] = fixed_args::<1>(Self::JVM, arguments)?;
        Ok(Box::new(Hash {
            value,
            hasher: |datum| f64::from(jvm_hash(datum)),
        }))
    }

    /// Factory for `utils.hash_m128`
    pub fn murmur(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [value] = fixed_args::<1>(Self::MURMUR, arguments)?;
        Ok(Box::new(Hash {
            value,
            hasher: |datum| murmur3_x64_128(&canonical_bytes(datum), 0).0 as i64 as f64,
        }))
    }
}

impl HopeFunction for Hash<'_> {
    fn apply(&self, context: &mut EvaluationContext<'_>) -> Result<Value> {
        let datum = object_value(context, self.value, Datum::Null)?;
        Ok(Value::number((self.hasher)(&datum)))
    }
}

fn jvm_string_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

pub(crate) fn jvm_hash(datum: &Datum) -> i32 {
    match datum {
        Datum::Null => 0,
        Datum::Boolean(true) => 1231,
        Datum::Boolean(false) => 1237,
        Datum::Number(n) => {
            // Canonical NaN, and -0.0 keeps its own bit pattern
            let bits = if n.is_nan() { 0x7ff8_0000_0000_0000 } else { n.to_bits() };
            (bits ^ (bits >> 32)) as u32 as i32
        }
        Datum::String(s) => jvm_string_hash(s),
        Datum::List(items) => items
            .iter()
            .fold(1i32, |h, item| h.wrapping_mul(31).wrapping_add(jvm_hash(item))),
        Datum::Json(node) => jvm_string_hash(&node.to_string()),
    }
}

fn canonical_bytes(datum: &Datum) -> Vec<u8> {
    match datum {
        Datum::Null => Vec::new(),
        Datum::Boolean(b) => vec![u8::from(*b)],
        Datum::Number(n) => n.to_le_bytes().to_vec(),
        Datum::String(s) => s.as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    }
}

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^ (k >> 33)
}

fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

fn le_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// MurmurHash3 x64 128-bit, returned as `(h1, h2)`
pub(crate) fn murmur3_x64_128(data: &[u8], seed: u64) -> (u64, u64) {
    let mut h1 = seed;
    let mut h2 = seed;

    let mut blocks = data.chunks_exact(16);
    for block in &mut blocks {
        let (k1, k2) = block.split_at(8);
        h1 ^= mix_k1(le_u64(k1));
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dc_e729);
        h2 ^= mix_k2(le_u64(k2));
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x3849_5ab5);
    }

    let tail = blocks.remainder();
    if tail.len() > 8 {
        h2 ^= mix_k2(le_u64(&tail[8..]));
    }
    if !tail.is_empty() {
        h1 ^= mix_k1(le_u64(&tail[..tail.len().min(8)]));
    }

    let len = data.len() as u64;
    h1 ^= len;
    h2 ^= len;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    (h1, h2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::testing::{call, path};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Datum::Number(-23.0), -1070137344)]
    #[case(Datum::String("hello".into()), 99162322)]
    #[case(Datum::String(String::new()), 0)]
    #[case(Datum::Boolean(true), 1231)]
    #[case(Datum::Null, 0)]
    fn test_jvm_hash(#[case] datum: Datum, #[case] expected: i32) {
        assert_eq!(jvm_hash(&datum), expected);
    }

    #[test]
    fn test_murmur_vectors() {
        assert_eq!(murmur3_x64_128(b"", 0), (0, 0));
        assert_eq!(
            murmur3_x64_128(&(-23.0f64).to_le_bytes(), 0).0 as i64,
            2940310638642342768
        );
        assert_eq!(
            murmur3_x64_128(b"hello", 0).0 as i64,
            -3758069500696749310
        );
    }

    #[test]
    fn test_functions() {
        let doc = json!({"user": "hello", "n": -23});
        assert_eq!(
            call("utils.hash_j", vec![Value::number(-23.0)], &doc).unwrap(),
            Value::number(-1070137344.0)
        );
        assert_eq!(
            call("utils.hash_j", vec![path("$.n")], &doc).unwrap(),
            Value::number(-1070137344.0)
        );
        assert_eq!(
            call("utils.hash_m128", vec![path("$.user")], &doc).unwrap(),
            Value::number(-3758069500696749310i64 as f64)
        );
    }
}
