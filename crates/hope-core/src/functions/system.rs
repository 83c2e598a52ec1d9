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

//! Clock functions

use crate::ast::Value;
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::registry::{FunctionDescriptor, HopeFunction, fixed_args};
use chrono::{Local, Timelike, Utc};

pub(crate) fn declarations() -> Vec<FunctionDescriptor> {
    vec![
        FunctionDescriptor::new(Clock::EPOCH).overload(0, Clock::epoch),
        FunctionDescriptor::new(Clock::HOUR_OF_DAY).overload(0, Clock::hour_of_day),
    ]
}

/// Zero-argument readings of the system clock
pub struct Clock {
    read: fn() -> f64,
}

impl Clock {
    /// Milliseconds since the Unix epoch, UTC
    pub const EPOCH: &'static str = "sys.epoch";
    /// Hour of the day (0-23) in the local timezone
    pub const HOUR_OF_DAY: &'static str = "date.hour_of_day";

    /// Factory for `sys.epoch`
    pub fn epoch(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [] = fixed_args::<0>(Self::EPOCH, arguments)?;
        Ok(Box::new(Clock {
            read: || Utc::now().timestamp_millis() as f64,
        }))
    }

    /// Factory for `date.hour_of_day`
    pub fn hour_of_day(arguments: &[Value]) -> Result<Box<dyn HopeFunction + '_>> {
        let [] = fixed_args::<0>(Self::HOUR_OF_DAY, arguments)?;
        Ok(Box::new(Clock {
            read: || f64::from(Local::now().hour()),
        }))
    }
}

impl HopeFunction for Clock {
    fn apply(&self, _context: &mut EvaluationContext<'_>) -> Result<Value> {
        Ok(Value::number((self.read)()))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Source, Value};
    use crate::functions::testing::call;
    use serde_json::json;

    fn number(value: Value) -> f64 {
        match value {
            Value::Numeric(Source::Literal(n)) => n.get(),
            other => panic!("expected a number, got {other}"),
        }
    }

    #[test]
    fn test_epoch_is_recent() {
        let before = chrono::Utc::now().timestamp_millis() as f64;
        let epoch = number(call("sys.epoch", vec![], &json!({})).unwrap());
        let after = chrono::Utc::now().timestamp_millis() as f64;
        assert!(before <= epoch && epoch <= after);
    }

    #[test]
    fn test_hour_of_day_range() {
        let hour = number(call("date.hour_of_day", vec![], &json!({})).unwrap());
        assert!((0.0..24.0).contains(&hour));
        assert_eq!(hour.fract(), 0.0);
    }
}
