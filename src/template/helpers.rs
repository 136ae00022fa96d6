//! Helper functions available to every body template.
//!
//! All helpers are pure: no I/O, no shared state.

use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};

/// Register `urlencode`, `tolower` and `get` as global functions.
pub fn register(env: &mut Environment<'static>) {
    env.add_function("urlencode", urlencode);
    env.add_function("tolower", tolower);
    env.add_function("get", get);
}

/// Escape a string for use inside a URL query (space becomes `+`).
pub fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn tolower(value: &str) -> String {
    value.to_lowercase()
}

/// First value stored under `key` in a multi-valued mapping, or `""`.
///
/// Exact key matches win; otherwise keys are compared ASCII case-insensitively
/// so `get(headers, "Content-Type")` finds the lowercased inbound header.
pub fn get(map: Value, key: &str) -> Result<String, Error> {
    if map.kind() != ValueKind::Map {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("get expects a mapping, got {}", map.kind()),
        ));
    }

    let mut values = map.get_item(&Value::from(key))?;
    if values.is_undefined() {
        for candidate in map.try_iter()? {
            let matches = candidate
                .as_str()
                .is_some_and(|name| name.eq_ignore_ascii_case(key));
            if matches {
                values = map.get_item(&candidate)?;
                break;
            }
        }
    }

    first_value(values)
}

fn first_value(values: Value) -> Result<String, Error> {
    match values.kind() {
        ValueKind::Undefined | ValueKind::None => Ok(String::new()),
        ValueKind::Seq => {
            let first = values.get_item_by_index(0)?;
            if first.is_undefined() || first.is_none() {
                Ok(String::new())
            } else {
                Ok(first.to_string())
            }
        }
        _ => Ok(values.to_string()),
    }
}
