use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Memoisation cache keyed by exact value.
///
/// - `Memo::unbounded()` keeps every entry for the life of the process
/// - `Memo::bounded(n)` evicts the least recently used entry past `n`
///
/// ## Invariants
/// - `order` holds each key of `entries` exactly once
/// - The most recently used key is at the back of `order`
#[derive(Debug)]
pub struct Memo<K, V> {
	entries: HashMap<K, V>,
	order: VecDeque<K>,
	capacity: Option<usize>,
	hits: u64,
	misses: u64,
}

impl<K: Eq + Hash + Clone, V> Memo<K, V> {
	pub fn unbounded() -> Self {
		Self::with_capacity(None)
	}

	/// A zero capacity is treated as one: the last value is always kept.
	pub fn bounded(capacity: usize) -> Self {
		Self::with_capacity(Some(capacity.max(1)))
	}

	fn with_capacity(capacity: Option<usize>) -> Self {
		Self {
			entries: HashMap::new(),
			order: VecDeque::new(),
			capacity,
			hits: 0,
			misses: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// `(hits, misses)` since creation.
	pub fn stats(&self) -> (u64, u64) {
		(self.hits, self.misses)
	}

	/// Looks `key` up, marking it as recently used.
	pub fn get(&mut self, key: &K) -> Option<&V> {
		if self.entries.contains_key(key) {
			self.hits += 1;
			self.touch(key);
			self.entries.get(key)
		} else {
			self.misses += 1;
			None
		}
	}

	/// Stores `value` under `key`, evicting the oldest entry if over capacity.
	pub fn insert(&mut self, key: K, value: V) {
		if self.entries.insert(key.clone(), value).is_some() {
			self.touch(&key);
			return;
		}
		self.order.push_back(key);

		if let Some(capacity) = self.capacity {
			while self.entries.len() > capacity {
				match self.order.pop_front() {
					Some(oldest) => {
						self.entries.remove(&oldest);
					}
					None => break,
				}
			}
		}
	}

	/// Returns the cached value for `key`, computing it with `compute` on a miss.
	///
	/// Errors are returned as-is and nothing is cached, so the next call
	/// computes again.
	pub fn get_or_try_insert_with<E, F>(&mut self, key: K, compute: F) -> Result<&V, E>
	where
		F: FnOnce() -> Result<V, E>,
	{
		if self.get(&key).is_none() {
			let value = compute()?;
			self.insert(key.clone(), value);
		}
		// Present: either just hit or just inserted (capacity is at least 1)
		match self.entries.get(&key) {
			Some(value) => Ok(value),
			None => unreachable!("memo entry vanished right after insertion"),
		}
	}

	fn touch(&mut self, key: &K) {
		if let Some(position) = self.order.iter().position(|k| k == key) {
			if let Some(k) = self.order.remove(position) {
				self.order.push_back(k);
			}
		}
	}
}
