//! In-memory backends for development mode and tests

use super::traits::{KvStore, LogStore, MessageQueue};
use crate::core::loggable::{RequestRecord, ResponseRecord};
use crate::services::delivery::{FeedbackRecord, QueueMessage};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Expiring key/value map
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.1 > Instant::now() => return Ok(Some(entry.0.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }
}

#[derive(Debug, Default)]
struct Lane {
    ready: VecDeque<QueueMessage>,
    pending: Vec<QueueMessage>,
}

/// Single-consumer queue with pending-entry redelivery
#[derive(Debug, Default)]
pub struct MemoryQueue {
    lanes: Mutex<HashMap<String, Lane>>,
    next_id: AtomicU64,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages not yet read
    pub fn ready_len(&self, lane: &str) -> usize {
        self.lanes.lock().get(lane).map_or(0, |l| l.ready.len())
    }

    /// Messages read but not acknowledged
    pub fn pending_len(&self, lane: &str) -> usize {
        self.lanes.lock().get(lane).map_or(0, |l| l.pending.len())
    }

    /// Bodies of every unacknowledged message, pending first
    pub fn bodies(&self, lane: &str) -> Vec<String> {
        self.lanes
            .lock()
            .get(lane)
            .map(|l| {
                l.pending
                    .iter()
                    .chain(l.ready.iter())
                    .map(|m| m.body.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn publish(&self, lane: &str, body: &str) -> Result<String> {
        let id = format!("{}-0", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.lanes
            .lock()
            .entry(lane.to_string())
            .or_default()
            .ready
            .push_back(QueueMessage {
                id: id.clone(),
                body: body.to_string(),
            });
        Ok(id)
    }

    async fn read(&self, lane: &str, max: usize) -> Result<Vec<QueueMessage>> {
        let mut lanes = self.lanes.lock();
        let Some(lane) = lanes.get_mut(lane) else {
            return Ok(Vec::new());
        };

        if !lane.pending.is_empty() {
            return Ok(lane.pending.iter().take(max).cloned().collect());
        }

        let take = max.min(lane.ready.len());
        let batch: Vec<QueueMessage> = lane.ready.drain(..take).collect();
        lane.pending.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn ack(&self, lane: &str, ids: &[String]) -> Result<()> {
        if let Some(lane) = self.lanes.lock().get_mut(lane) {
            lane.pending.retain(|m| !ids.contains(&m.id));
        }
        Ok(())
    }
}

/// Warehouse stand-in with failure injection
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    requests: RwLock<HashMap<String, RequestRecord>>,
    responses: RwLock<HashMap<String, ResponseRecord>>,
    feedback: RwLock<HashMap<String, FeedbackRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn request(&self, id: &str) -> Option<RequestRecord> {
        self.requests.read().get(id).cloned()
    }

    pub fn response(&self, id: &str) -> Option<ResponseRecord> {
        self.responses.read().get(id).cloned()
    }

    pub fn feedback(&self, response_id: &str) -> Option<FeedbackRecord> {
        self.feedback.read().get(response_id).cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().len()
    }

    pub fn response_count(&self) -> usize {
        self.responses.read().len()
    }

    pub fn feedback_count(&self) -> usize {
        self.feedback.read().len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::batch_apply("writes disabled"));
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn upsert_request(&self, record: &RequestRecord) -> Result<()> {
        self.check_writable()?;
        self.requests
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn upsert_response(&self, record: &ResponseRecord) -> Result<()> {
        self.check_writable()?;
        self.responses
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn upsert_feedback_batch(&self, records: &[FeedbackRecord]) -> Result<()> {
        self.check_writable()?;

        let responses = self.responses.read();
        if let Some(missing) = records
            .iter()
            .find(|r| !responses.contains_key(&r.response_id))
        {
            return Err(GatewayError::batch_apply(format!(
                "Response {} not logged",
                missing.response_id
            )));
        }
        drop(responses);

        let mut feedback = self.feedback.write();
        for record in records {
            feedback.insert(record.response_id.clone(), record.clone());
        }
        Ok(())
    }
}
