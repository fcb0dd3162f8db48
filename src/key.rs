use std::fmt;

/// The store key naming one mutually excluded resource.
///
/// Built as `namespace.global_scope.local_scope`. The same triple always
/// yields the same key; nothing is validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    pub fn derive(namespace: &str, global_scope: &str, local_scope: &str) -> Self {
        LockKey(format!("{}.{}.{}", namespace, global_scope, local_scope))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<LockKey> for String {
    fn from(key: LockKey) -> Self {
        key.0
    }
}
