use std::cmp::Ordering;

use serde_json::Value;

/// Compare two serialized field values for sorting.
///
/// - Both Null → Equal
/// - a is Null → Greater (nulls sort to end)
/// - b is Null → Less
/// - Both numbers → exact numeric comparison, integers against floats included
/// - Both strings → lexicographic (codepoint order)
/// - Both booleans → false < true
/// - Cross-type → type rank: number(0), string(1), bool(2), other(3)
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(na), Value::Number(nb)) => compare_numbers(na, nb),
        (Value::String(sa), Value::String(sb)) => sa.cmp(sb),
        (Value::Bool(ba), Value::Bool(bb)) => ba.cmp(bb),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// A JSON number in a form that compares exactly.
enum Exact {
    Int(i128),
    Float(f64),
}

impl Exact {
    fn of(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Exact::Int(i as i128)
        } else if let Some(u) = n.as_u64() {
            Exact::Int(u as i128)
        } else {
            // serde_json never holds NaN or infinities.
            Exact::Float(n.as_f64().unwrap_or(0.0))
        }
    }
}

// Bounds of the i64/u64 range, both exactly representable as f64.
const INT_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const INT_END_F64: f64 = 18_446_744_073_709_551_616.0;

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Ordering {
    match (Exact::of(a), Exact::of(b)) {
        (Exact::Int(ia), Exact::Int(ib)) => ia.cmp(&ib),
        (Exact::Float(fa), Exact::Float(fb)) => fa.partial_cmp(&fb).unwrap_or(Ordering::Equal),
        (Exact::Int(i), Exact::Float(f)) => compare_int_float(i, f),
        (Exact::Float(f), Exact::Int(i)) => compare_int_float(i, f).reverse(),
    }
}

/// Compare an integer with a finite float without rounding either.
fn compare_int_float(i: i128, f: f64) -> Ordering {
    if f >= INT_END_F64 {
        return Ordering::Less;
    }
    if f < INT_MIN_F64 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        unequal => unequal,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Bool(_) => 2,
        _ => 3,
    }
}

/// Get a nested value from a serialized record using a dot-separated path.
/// Returns `None` if any segment is missing or the parent is not an object.
pub fn field_value<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}
