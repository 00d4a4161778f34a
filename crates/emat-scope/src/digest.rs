//! Scope digests (versioned).
//!
//! A stored experiment design needs a stable way to refer to the exact scope
//! it was generated from. The digest is computed over the *canonical dump*
//! rather than the source text, so reformatting a scope file or editing its
//! comments does not change its identity.
//!
//! - algorithm: **FNV-1a 64-bit**
//! - input: UTF-8 bytes of `dump_scope(scope, &DumpOptions::default())`
//! - output: `"fnv1a64:<16 lowercase hex digits>"`
//!
//! This is not a security primitive.

use crate::dump::{dump_scope, DumpOptions};
use crate::error::ScopeError;
use crate::scope::Scope;

/// Prefix used in serialized digests.
pub const SCOPE_DIGEST_V1_PREFIX: &str = "fnv1a64:";

/// FNV-1a 64-bit over arbitrary bytes, in the `"fnv1a64:<hex>"` encoding.
pub fn fnv1a64_digest_bytes(bytes: &[u8]) -> String {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for b in bytes {
        hash ^= (*b) as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    format!("{SCOPE_DIGEST_V1_PREFIX}{hash:016x}")
}

/// The v1 digest of a scope.
pub fn scope_digest_v1(scope: &Scope) -> Result<String, ScopeError> {
    let canonical = dump_scope(scope, &DumpOptions::default())?;
    Ok(fnv1a64_digest_bytes(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "scope:\n  name: A\n  desc: d\ninputs:\n  x:\n    ptype: constant\n    default: 1\noutputs:\n  y:\n    kind: info\n";

    #[test]
    fn digest_has_expected_prefix_and_width() {
        let d = fnv1a64_digest_bytes(b"scope");
        assert!(d.starts_with(SCOPE_DIGEST_V1_PREFIX));
        assert_eq!(d.len(), SCOPE_DIGEST_V1_PREFIX.len() + 16);
    }

    #[test]
    fn empty_input_hashes_to_offset_basis() {
        assert_eq!(fnv1a64_digest_bytes(b""), "fnv1a64:cbf29ce484222325");
    }

    #[test]
    fn digest_ignores_comments_and_layout() {
        let reformatted = "# a comment\nscope: {name: A, desc: d}\ninputs:\n  x: {ptype: constant, default: 1}\noutputs:\n  y: {kind: info}\n";
        let a = scope_digest_v1(&Scope::from_yaml_str(A).expect("parse")).expect("digest");
        let b = scope_digest_v1(&Scope::from_yaml_str(reformatted).expect("parse")).expect("digest");
        assert_eq!(a, b);
    }

    #[test]
    fn digest_changes_when_content_changes() {
        let changed = A.replace("default: 1", "default: 2");
        let a = scope_digest_v1(&Scope::from_yaml_str(A).expect("parse")).expect("digest");
        let b = scope_digest_v1(&Scope::from_yaml_str(&changed).expect("parse")).expect("digest");
        assert_ne!(a, b);
    }
}
