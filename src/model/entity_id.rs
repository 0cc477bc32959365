// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0

//! Process-unique identifiers for live image bindings.
//!
//! A binding id is handed out each time an image container is (re)bound to
//! its interaction behaviour. Rebinding after a restore always produces new
//! ids, so a gesture or hit result taken before the restore can be told
//! apart from one taken after it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one binding of an image object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(u64);

static BINDING_COUNTER: AtomicU64 = AtomicU64::new(1);

impl BindingId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(BINDING_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_never_reused() {
        let a = BindingId::next();
        let b = BindingId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
