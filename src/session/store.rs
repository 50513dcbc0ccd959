//! Credential storage seam. Callers never touch a concrete storage API;
//! the backing (cookie jar, browser local storage, plain memory) is
//! injected per render context.

pub trait TokenStore {
    fn get(&self) -> Option<String>;
    fn set(&mut self, token: &str);
    fn clear(&mut self);
}

/// Simplest backing; also what the tests use.
#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.clone()
    }

    fn set(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn clear(&mut self) {
        self.token = None;
    }
}

/// Models the cookie + local-storage pair: both backings hold the same
/// token while a session is active, and are always cleared together.
/// Reads prefer the primary and fall back to the secondary.
#[derive(Debug, Default)]
pub struct DualTokenStore<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A, B> DualTokenStore<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: TokenStore, B: TokenStore> TokenStore for DualTokenStore<A, B> {
    fn get(&self) -> Option<String> {
        self.primary.get().or_else(|| self.secondary.get())
    }

    fn set(&mut self, token: &str) {
        self.primary.set(token);
        self.secondary.set(token);
    }

    fn clear(&mut self) {
        self.primary.clear();
        self.secondary.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryTokenStore::default();
        assert_eq!(store.get(), None);
        store.set("abc");
        assert_eq!(store.get(), Some("abc".into()));
        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn dual_store_writes_both_backings() {
        let mut store = DualTokenStore::new(MemoryTokenStore::default(), MemoryTokenStore::default());
        store.set("tok");
        assert_eq!(store.primary.get(), Some("tok".into()));
        assert_eq!(store.secondary.get(), Some("tok".into()));
    }

    #[test]
    fn dual_store_clears_both_backings() {
        let mut store = DualTokenStore::new(MemoryTokenStore::default(), MemoryTokenStore::default());
        store.set("tok");
        store.clear();
        assert_eq!(store.primary.get(), None);
        assert_eq!(store.secondary.get(), None);
        assert_eq!(store.get(), None);
    }

    #[test]
    fn dual_store_reads_fall_back_to_the_secondary() {
        let mut secondary = MemoryTokenStore::default();
        secondary.set("only-here");
        let store = DualTokenStore::new(MemoryTokenStore::default(), secondary);
        assert_eq!(store.get(), Some("only-here".into()));
    }
}
