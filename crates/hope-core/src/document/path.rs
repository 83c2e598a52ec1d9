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

//! `$`-rooted dot/bracket paths

use super::Address;
use crate::error::{HopeError, Result};
use serde_json::Value as JsonValue;
use std::fmt;

/// One step of a compiled path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element; negative indexes count from the end
    Index(i64),
}

/// Compiled definite path such as `$.a.b[0]` or `$['first name']`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Compile path text. Only definite paths are accepted.
    pub fn compile(raw: &str) -> Result<Self> {
        let rest = raw
            .strip_prefix('$')
            .ok_or_else(|| HopeError::invalid_address(raw, "path must start with '$'"))?;
        let segments = PathCompiler { raw, rest, pos: 0 }.segments()?;
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Compiled segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl Address for JsonPath {
    fn as_str(&self) -> &str {
        &self.raw
    }

    fn locate<'d>(&self, document: &'d JsonValue) -> Option<&'d JsonValue> {
        self.segments
            .iter()
            .try_fold(document, |node, segment| match (segment, node) {
                (PathSegment::Key(key), JsonValue::Object(map)) => map.get(key),
                (PathSegment::Index(index), JsonValue::Array(items)) => {
                    let len = items.len() as i64;
                    let index = if *index < 0 { len + index } else { *index };
                    usize::try_from(index).ok().and_then(|i| items.get(i))
                }
                _ => None,
            })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

struct PathCompiler<'a> {
    raw: &'a str,
    rest: &'a str,
    pos: usize,
}

impl PathCompiler<'_> {
    fn segments(mut self) -> Result<Vec<PathSegment>> {
        let mut segments = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    segments.push(self.dotted_key()?);
                }
                '[' => {
                    self.pos += 1;
                    segments.push(self.bracket()?);
                }
                other => return Err(self.error(format!("unexpected '{other}'"))),
            }
        }
        Ok(segments)
    }

    fn peek(&self) -> Option<char> {
        self.rest[self.pos..].chars().next()
    }

    fn error(&self, message: impl Into<String>) -> HopeError {
        HopeError::invalid_address(self.raw, message)
    }

    fn dotted_key(&mut self) -> Result<PathSegment> {
        let tail = &self.rest[self.pos..];
        let end = tail.find(['.', '[']).unwrap_or(tail.len());
        let key = &tail[..end];
        if key.is_empty() {
            return Err(self.error("deep scan and empty keys are not supported"));
        }
        if key == "*" {
            return Err(self.error("wildcards are not supported"));
        }
        self.pos += end;
        Ok(PathSegment::Key(key.to_string()))
    }

    fn bracket(&mut self) -> Result<PathSegment> {
        let segment = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                let tail = &self.rest[self.pos..];
                let end = tail
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated quoted key"))?;
                let key = tail[..end].to_string();
                self.pos += end + 1;
                PathSegment::Key(key)
            }
            _ => {
                let tail = &self.rest[self.pos..];
                let end = tail
                    .find(']')
                    .ok_or_else(|| self.error("unterminated bracket"))?;
                let index = tail[..end]
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("unsupported selector '[{}]'", &tail[..end])))?;
                self.pos += end;
                PathSegment::Index(index)
            }
        };
        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(segment)
            }
            _ => Err(self.error("expected ']'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_compile_segments() {
        let path = JsonPath::compile("$.a['b c'][2].d").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("a".to_string()),
                PathSegment::Key("b c".to_string()),
                PathSegment::Index(2),
                PathSegment::Key("d".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "$.a['b c'][2].d");
    }

    #[test]
    fn test_root_path() {
        let doc = json!({"a": 1});
        assert_eq!(JsonPath::compile("$").unwrap().locate(&doc), Some(&doc));
    }

    #[test]
    fn test_negative_index() {
        let doc = json!({"arr": [1, 2, 3]});
        let last = JsonPath::compile("$.arr[-1]").unwrap();
        assert_eq!(last.locate(&doc), Some(&json!(3)));
        let out = JsonPath::compile("$.arr[-4]").unwrap();
        assert_eq!(out.locate(&doc), None);
    }

    #[test]
    fn test_missing_and_kind_mismatch() {
        let doc = json!({"a": {"b": [1]}});
        assert_eq!(JsonPath::compile("$.a.c").unwrap().locate(&doc), None);
        assert_eq!(JsonPath::compile("$.a.b.c").unwrap().locate(&doc), None);
        assert_eq!(JsonPath::compile("$.a[0]").unwrap().locate(&doc), None);
    }

    #[test]
    fn test_rejected_paths() {
        for raw in ["a.b", "$..a", "$.*", "$[*]", "$['a'", "$[1", "$.a[?(@.x)]"] {
            assert!(
                matches!(JsonPath::compile(raw), Err(HopeError::InvalidAddress { .. })),
                "{raw} should be rejected"
            );
        }
    }
}
