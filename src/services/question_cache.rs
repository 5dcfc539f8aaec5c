// src/services/question_cache.rs

//! Bounded LRU cache of question content with hit/miss counters.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::models::question::Question;

pub const DEFAULT_CAPACITY: usize = 500;

/// Fixed-capacity question cache keyed by question id.
///
/// Every `get` hit and every `put` marks the entry as most recently used.
/// When a `put` of a new id would exceed the capacity, the least recently
/// used entry is evicted. The lock is held only for the O(1) list update,
/// never across I/O.
pub struct QuestionCache {
    entries: Mutex<LruCache<i64, Arc<Question>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QuestionCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a question, counting a hit or a miss.
    ///
    /// On a miss the caller fetches from the durable store and calls `put`.
    pub fn get(&self, id: i64) -> Option<Arc<Question>> {
        let found = self.entries.lock().get(&id).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Caches a question under its own id and returns the shared handle.
    pub fn put(&self, question: Question) -> Arc<Question> {
        let question = Arc::new(question);
        let evicted = self
            .entries
            .lock()
            .push(question.id, Arc::clone(&question));

        if let Some((evicted_id, _)) = evicted {
            if evicted_id != question.id {
                trace!(question_id = evicted_id, "Evicted least recently used question");
            }
        }
        question
    }

    pub fn put_many<I>(&self, questions: I)
    where
        I: IntoIterator<Item = Question>,
    {
        for question in questions {
            self.put(question);
        }
    }

    /// Presence check that neither counts nor refreshes recency.
    pub fn contains(&self, id: i64) -> bool {
        self.entries.lock().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for QuestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;
    use sqlx::types::Json;

    fn question(id: i64) -> Question {
        Question {
            id,
            question_type: QuestionType::Single,
            content: format!("Question {}", id),
            options: Json(vec!["A".to_string(), "B".to_string()]),
            answer: "A".to_string(),
            category: "general".to_string(),
            explanation: None,
            created_at: None,
        }
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let cache = QuestionCache::new(3);
        for id in 1..=10 {
            cache.put(question(id));
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(8) && cache.contains(9) && cache.contains(10));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let cache = QuestionCache::new(3);
        cache.put(question(1));
        cache.put(question(2));
        cache.put(question(3));

        // 1 becomes most recently used, so 2 is the eviction victim.
        assert!(cache.get(1).is_some());
        cache.put(question(4));

        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert!(cache.contains(3));
        assert!(cache.contains(4));
    }

    #[test]
    fn test_put_refreshes_recency() {
        let cache = QuestionCache::new(2);
        cache.put(question(1));
        cache.put(question(2));
        cache.put(question(1));
        cache.put(question(3));

        assert!(cache.contains(1));
        assert!(!cache.contains(2));
    }

    #[test]
    fn test_counts_hits_and_misses() {
        let cache = QuestionCache::new(10);
        cache.put(question(7));

        assert!(cache.get(7).is_some());
        assert!(cache.get(7).is_some());
        assert!(cache.get(8).is_none());

        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_returns_content_for_requested_id() {
        let cache = QuestionCache::new(4);
        cache.put_many((1..=4).map(question));
        for id in 1..=4 {
            assert_eq!(cache.get(id).unwrap().id, id);
        }
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = QuestionCache::new(0);
        cache.put(question(1));
        cache.put(question(2));
        assert_eq!(cache.capacity(), 1);
        assert!(cache.contains(2));
    }

    #[test]
    fn test_concurrent_access_stays_bounded() {
        let cache = Arc::new(QuestionCache::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let id = t * 1000 + i;
                        cache.put(question(id));
                        if let Some(q) = cache.get(id) {
                            assert_eq!(q.id, id);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 50);
    }
}
