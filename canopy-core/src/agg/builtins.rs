//! Built-in aggregation functions.
//!
//! Group rows read their children's aggregates, so `count` and `avg` return
//! objects that carry enough state to be combined again one level up.

use serde_json::{json, Map, Value};

/// Numeric accumulator that stays integral until it cannot.
#[derive(Debug, Default)]
struct Accumulator {
    int_sum: i64,
    float_sum: f64,
    is_float: bool,
    has_value: bool,
}

impl Accumulator {
    fn add(&mut self, value: &Value) {
        let Value::Number(number) = value else {
            return;
        };
        self.has_value = true;
        if !self.is_float {
            if let Some(i) = number.as_i64() {
                match self.int_sum.checked_add(i) {
                    Some(sum) => {
                        self.int_sum = sum;
                        return;
                    }
                    None => {
                        self.is_float = true;
                        self.float_sum = self.int_sum as f64;
                    }
                }
            } else {
                self.is_float = true;
                self.float_sum = self.int_sum as f64;
            }
        }
        self.float_sum += number.as_f64().unwrap_or(0.0);
    }

    fn finish(self) -> Value {
        if !self.has_value {
            Value::Null
        } else if self.is_float {
            Value::from(self.float_sum)
        } else {
            Value::from(self.int_sum)
        }
    }
}

pub fn sum(values: &[Value]) -> Value {
    let mut acc = Accumulator::default();
    for value in values {
        acc.add(value);
    }
    acc.finish()
}

fn pick_number<F>(values: &[Value], better: F) -> Value
where
    F: Fn(f64, f64) -> bool,
{
    let mut best: Option<(f64, &Value)> = None;
    for value in values {
        let Some(candidate) = value.as_f64() else {
            continue;
        };
        match best {
            Some((current, _)) if !better(candidate, current) => {}
            _ => best = Some((candidate, value)),
        }
    }
    best.map(|(_, value)| value.clone()).unwrap_or(Value::Null)
}

pub fn min(values: &[Value]) -> Value {
    pick_number(values, |candidate, current| candidate < current)
}

pub fn max(values: &[Value]) -> Value {
    pick_number(values, |candidate, current| candidate > current)
}

pub fn first(values: &[Value]) -> Value {
    values.first().cloned().unwrap_or(Value::Null)
}

pub fn last(values: &[Value]) -> Value {
    values.last().cloned().unwrap_or(Value::Null)
}

fn object_field<'v>(value: &'v Value, field: &str) -> Option<&'v Value> {
    value.as_object().and_then(|obj: &Map<String, Value>| obj.get(field))
}

/// Counts rows. Counts coming from sub-groups are added as-is.
pub fn count(values: &[Value]) -> Value {
    let total: i64 = values
        .iter()
        .map(|value| {
            object_field(value, "value")
                .and_then(Value::as_i64)
                .unwrap_or(1)
        })
        .fold(0i64, i64::saturating_add);
    json!({ "value": total })
}

/// Mean of numeric values. Averages coming from sub-groups are weighted by
/// their count.
pub fn avg(values: &[Value]) -> Value {
    let mut total = 0.0;
    let mut count: i64 = 0;
    for value in values {
        if let Some(number) = value.as_f64() {
            total += number;
            count = count.saturating_add(1);
        } else if let (Some(inner), Some(inner_count)) = (
            object_field(value, "value").and_then(Value::as_f64),
            object_field(value, "count").and_then(Value::as_i64),
        ) {
            total += inner * inner_count as f64;
            count = count.saturating_add(inner_count);
        }
    }
    let mean = if count > 0 {
        Value::from(total / count as f64)
    } else {
        Value::Null
    };
    json!({ "count": count, "value": mean })
}
