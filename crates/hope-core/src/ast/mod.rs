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

//! Abstract syntax tree for rules
//!
//! The tree is a closed set of node kinds. [`Evaluatable`] nodes reduce to a
//! boolean, [`Value`] nodes reduce to a typed scalar, array or opaque value.
//! Nodes carry no evaluation logic; the evaluator matches on them
//! exhaustively. Equality and hashing are structural, so compiled rules can be
//! used as map keys.

#![warn(missing_docs)]

mod datum;
mod evaluatable;
mod value;

pub use datum::*;
pub use evaluatable::*;
pub use value::*;
