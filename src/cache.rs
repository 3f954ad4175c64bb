use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Named statement cache: logical statement name to rendered SQL text.
///
/// Entries are write-once; the first text stored under a name is kept.
pub trait StatementCache: Send + Sync {
    fn get(&self, name: &str) -> Option<Arc<str>>;
    fn put(&self, name: &str, sql: &str);
}

/// Default cache: one map behind one mutex per [`crate::Db`].
#[derive(Debug, Default)]
pub struct SharedStatementCache {
    statements: Mutex<HashMap<String, Arc<str>>>,
}

impl SharedStatementCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<str>>> {
        // A panic while holding the lock cannot leave a half-written entry behind.
        match self.statements.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StatementCache for SharedStatementCache {
    fn get(&self, name: &str) -> Option<Arc<str>> {
        if name.is_empty() {
            return None;
        }
        self.lock().get(name).cloned()
    }

    fn put(&self, name: &str, sql: &str) {
        if name.is_empty() {
            return;
        }
        self.lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::from(sql));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_wins() {
        let cache = SharedStatementCache::new();
        cache.put("q", "select 1;");
        cache.put("q", "select 2;");
        assert_eq!(cache.get("q").as_deref(), Some("select 1;"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_name_is_never_cached() {
        let cache = SharedStatementCache::new();
        cache.put("", "select 1;");
        assert!(cache.get("").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_writers_agree_on_one_entry() {
        let cache = Arc::new(SharedStatementCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.put("shared", &format!("select {i};"));
                    cache.get("shared")
                })
            })
            .collect();
        let seen: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
    }
}
