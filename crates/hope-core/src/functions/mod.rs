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

//! Standard function library
//!
//! Every function is a small struct borrowing its argument expressions, with
//! a `create` factory and a [`HopeFunction`](crate::registry::HopeFunction)
//! implementation that resolves the arguments it needs through the
//! converters.

pub mod array;
pub mod exists;
pub mod hashing;
pub mod math;
pub mod string;
pub mod system;

use crate::registry::{FunctionDescriptor, FunctionLibrary};

/// Name of the standard library collection
pub const STANDARD_LIBRARY: &str = "hope.stdlib";

/// The standard library as a discoverable collection
pub fn standard_library() -> FunctionLibrary {
    let library = FunctionLibrary::new(STANDARD_LIBRARY);
    [
        math::declarations(),
        string::declarations(),
        array::declarations(),
        exists::declarations(),
        system::declarations(),
        hashing::declarations(),
    ]
    .into_iter()
    .flatten()
    .fold(library, |library, declaration: FunctionDescriptor| {
        library.with(declaration)
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FunctionRegistry;

    #[test]
    fn test_library_registers_cleanly() {
        let library = standard_library();
        assert_eq!(library.name(), STANDARD_LIBRARY);
        let registry = FunctionRegistry::new();
        registry
            .register_all(library.functions().to_vec())
            .unwrap();
        for name in [
            "math.add",
            "math.prod",
            "math.sub",
            "math.div",
            "math.negate",
            "math.abs",
            "math.floor",
            "math.ceil",
            "str.len",
            "str.lower",
            "str.upper",
            "str.substr",
            "str.match",
            "arr.len",
            "arr.is_empty",
            "arr.in",
            "arr.not_in",
            "arr.contains_any",
            "arr.contains_all",
            "path.exists",
            "pointer.exists",
            "sys.epoch",
            "date.hour_of_day",
            "utils.hash_j",
            "utils.hash_m128",
        ] {
            assert!(registry.contains(name), "{name} missing");
        }
    }
}
