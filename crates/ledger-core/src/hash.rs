//! Order-independent SHA-256 digest over a list of JSON values.
//!
//! Every input is rendered to a canonical JSON string (compact, object keys
//! sorted at every depth), the strings are sorted, joined with
//! [`HASH_SEPARATOR`] and digested. The digest therefore depends only on the
//! set of values supplied, never on the order the caller listed them in.

use crate::constants::{HASH_SEPARATOR, HASH_SIZE};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub type Hash = [u8; HASH_SIZE];

/// Hex-encoded digest of `inputs`. See the module docs for the scheme.
pub fn crypto_hash<'a, I>(inputs: I) -> String
where
    I: IntoIterator<Item = &'a Value>,
{
    let parts = inputs.into_iter().map(canonical_string).collect();
    hex::encode(digest_parts(parts))
}

/// Raw digest of already-canonicalised parts. The parts are sorted here.
pub fn digest_parts(mut parts: Vec<String>) -> Hash {
    parts.sort_unstable();
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(HASH_SEPARATOR.as_bytes());
        }
        hasher.update(part.as_bytes());
    }
    hasher.finalize().into()
}

/// Stable JSON rendering of `value`, independent of map insertion order.
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Hash any number of serialisable expressions, e.g.
/// `crypto_hash!(timestamp, last_hash, difficulty, nonce, data)`.
#[macro_export]
macro_rules! crypto_hash {
    ($($input:expr),* $(,)?) => {
        $crate::hash::crypto_hash(&[$($crate::serde_json::json!($input)),*])
    };
}
