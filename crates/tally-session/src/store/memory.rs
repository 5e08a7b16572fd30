//! In-process backing store.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use super::{BackingStore, StoreOp};
use crate::error::{Error, Result};
use crate::ttl::TtlTracker;

#[derive(Debug, Clone)]
enum Value {
    Bytes(Vec<u8>),
    Set(BTreeSet<String>),
}

#[derive(Debug, Default, Clone)]
struct State {
    values: HashMap<String, Value>,
    ttl: TtlTracker,
}

impl State {
    /// Live value of `key`, dropping it first if its deadline passed.
    fn live(&mut self, key: &str) -> Option<&mut Value> {
        if self.ttl.is_expired(key) {
            self.values.remove(key);
            self.ttl.remove(key);
        }
        self.values.get_mut(key)
    }

    fn remove(&mut self, key: &str) -> bool {
        let existed = self.live(key).is_some();
        self.values.remove(key);
        self.ttl.remove(key);
        existed
    }

    fn set(&mut self, key: &str, value: &[u8], ttl: Duration) {
        self.values
            .insert(key.to_string(), Value::Bytes(value.to_vec()));
        self.ttl.set(key, ttl);
    }

    fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        if self.live(key).is_none() {
            return false;
        }
        self.ttl.set(key, ttl);
        true
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<()> {
        match self.live(key) {
            Some(Value::Set(members)) => {
                members.insert(member.to_string());
            }
            Some(Value::Bytes(_)) => return Err(wrong_type(key)),
            None => {
                let members = BTreeSet::from([member.to_string()]);
                self.values.insert(key.to_string(), Value::Set(members));
            }
        }
        Ok(())
    }

    fn set_remove(&mut self, key: &str, member: &str) -> Result<()> {
        let emptied = match self.live(key) {
            Some(Value::Set(members)) => {
                members.remove(member);
                members.is_empty()
            }
            Some(Value::Bytes(_)) => return Err(wrong_type(key)),
            None => false,
        };
        // empty sets do not exist
        if emptied {
            self.remove(key);
        }
        Ok(())
    }

    fn apply(&mut self, op: &StoreOp) -> Result<()> {
        match op {
            StoreOp::Set { key, value, ttl } => self.set(key, value, *ttl),
            StoreOp::Delete { key } => {
                self.remove(key);
            }
            StoreOp::Expire { key, ttl } => {
                self.expire(key, *ttl);
            }
            StoreOp::SetAdd { key, member } => self.set_add(key, member)?,
            StoreOp::SetRemove { key, member } => self.set_remove(key, member)?,
        }
        Ok(())
    }
}

fn wrong_type(key: &str) -> Error {
    Error::Unavailable(format!(
        "WRONGTYPE operation against key holding the wrong kind of value: {key}"
    ))
}

/// In-process store with Redis-like semantics.
///
/// Values set with [`BackingStore::set`] carry a TTL; sets persist until
/// [`BackingStore::expire`] is called on them. Expiry is applied lazily on
/// access using the tokio clock. [`MemoryStore::set_available`] simulates an
/// outage: while unavailable every call fails with
/// [`Error::Unavailable`].
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let mut state = self.state.lock();
        for key in state.ttl.drain_expired() {
            state.values.remove(&key);
        }
        state.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> Result<R>) -> Result<R> {
        if !self.is_available() {
            return Err(Error::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        let mut state = self.state.lock();
        f(&mut *state)
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_state(|state| match state.live(key) {
            Some(Value::Bytes(bytes)) => Ok(Some(bytes.clone())),
            Some(Value::Set(_)) => Err(wrong_type(key)),
            None => Ok(None),
        })
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.with_state(|state| {
            state.set(key, value, ttl);
            Ok(())
        })
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        self.with_state(|state| Ok(keys.iter().filter(|key| state.remove(key)).count()))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.with_state(|state| Ok(state.expire(key, ttl)))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.with_state(|state| Ok(state.live(key).is_some()))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.with_state(|state| {
            if state.live(key).is_none() {
                return Ok(None);
            }
            Ok(state.ttl.remaining(key))
        })
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        self.with_state(|state| state.set_add(key, member))
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>> {
        self.with_state(|state| match state.live(key) {
            Some(Value::Set(members)) => Ok(members.clone()),
            Some(Value::Bytes(_)) => Err(wrong_type(key)),
            None => Ok(BTreeSet::new()),
        })
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        self.with_state(|state| state.set_remove(key, member))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.with_state(|state| {
            for key in state.ttl.drain_expired() {
                state.values.remove(&key);
            }
            let mut keys: Vec<String> = state
                .values
                .keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect();
            keys.sort();
            Ok(keys)
        })
    }

    async fn execute_atomically(&self, ops: &[StoreOp]) -> Result<()> {
        self.with_state(|state| {
            // ops run against a copy, so a failure midway leaves nothing behind
            let mut staged = state.clone();
            for op in ops {
                staged.apply(op)?;
            }
            *state = staged;
            trace!(ops = ops.len(), "Applied atomic batch");
            Ok(())
        })
    }

    async fn ping(&self) -> Result<()> {
        self.with_state(|_| Ok(()))
    }
}
