//! Mock middleware backends shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};

use turtleweb_client::{NodeLauncher, ProcessEvent, ProcessHandle, Ros2Client};
use turtleweb_types::{PanelError, Parameter};

/// Recording [`Ros2Client`] with scriptable failures.
#[derive(Default)]
pub(crate) struct MockClient {
    pub published: Mutex<Vec<(String, Value)>>,
    pub advertised: Mutex<Vec<String>>,
    pub unadvertised: Mutex<Vec<String>>,
    pub unsubscribed: Mutex<Vec<String>>,
    pub service_calls: Mutex<Vec<String>>,
    pub unavailable: AtomicBool,
    pub param_values: Mutex<Vec<i64>>,
    pub set_calls: Mutex<Vec<(String, Vec<Parameter>)>>,
    pub fail_set: AtomicBool,
    pub fail_publish: AtomicBool,
    topics: Mutex<HashMap<String, broadcast::Sender<Value>>>,
}

impl MockClient {
    /// Inject an inbound topic message, as the rosbridge reader would.
    pub fn inject(&self, topic: &str, msg: Value) {
        if let Some(tx) = self.topics.lock().unwrap().get(topic) {
            let _ = tx.send(msg);
        }
    }

    pub fn published_on(&self, topic: &str) -> Vec<Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

#[async_trait]
impl Ros2Client for MockClient {
    async fn advertise(&self, topic: &str, _msg_type: &str) -> Result<(), PanelError> {
        self.advertised.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn unadvertise(&self, topic: &str) -> Result<(), PanelError> {
        self.unadvertised.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, msg: Value) -> Result<(), PanelError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(PanelError::Publish {
                topic: topic.to_string(),
                details: "mock publish failure".to_string(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), msg));
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        _msg_type: &str,
    ) -> Result<broadcast::Receiver<Value>, PanelError> {
        let mut topics = self.topics.lock().unwrap();
        let tx = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(64).0);
        Ok(tx.subscribe())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), PanelError> {
        self.unsubscribed.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn wait_for_service(&self, _service: &str, _timeout: Duration) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    async fn call_service(
        &self,
        service: &str,
        _srv_type: &str,
        _args: Value,
    ) -> Result<Value, PanelError> {
        self.service_calls.lock().unwrap().push(service.to_string());
        Ok(json!({}))
    }

    async fn get_parameters(
        &self,
        _node: &str,
        names: &[String],
    ) -> Result<Vec<i64>, PanelError> {
        let values = self.param_values.lock().unwrap().clone();
        assert_eq!(values.len(), names.len(), "mock must be seeded per name");
        Ok(values)
    }

    async fn set_parameters(
        &self,
        node: &str,
        params: &[Parameter],
    ) -> Result<(), PanelError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(PanelError::Parameter {
                node: node.to_string(),
                details: "mock set failure".to_string(),
            });
        }
        self.set_calls
            .lock()
            .unwrap()
            .push((node.to_string(), params.to_vec()));
        Ok(())
    }
}

/// Counting [`NodeLauncher`] whose handles never touch a real process.
#[derive(Default)]
pub(crate) struct MockLauncher {
    spawns: AtomicUsize,
    kills_seen: AtomicUsize,
    fail_next: AtomicBool,
    exit_on_spawn: AtomicBool,
    kill_rx: Mutex<Option<mpsc::Receiver<()>>>,
    events_tx: Mutex<Option<mpsc::Sender<ProcessEvent>>>,
}

impl MockLauncher {
    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    pub fn fail_next_spawn(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Make every spawn deliver its exit event before returning, as a
    /// child that dies the moment it starts would.
    pub fn exit_on_spawn(&self) {
        self.exit_on_spawn.store(true, Ordering::SeqCst);
    }

    /// Total termination requests observed so far. Drains the kill
    /// channel synchronously, so a preceding `shutdown()` is counted.
    pub fn kill_requests(&self) -> usize {
        if let Some(rx) = self.kill_rx.lock().unwrap().as_mut() {
            while rx.try_recv().is_ok() {
                self.kills_seen.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.kills_seen.load(Ordering::SeqCst)
    }

    /// Deliver a process event as the supervisor task would.
    pub async fn emit(&self, event: ProcessEvent) {
        let tx = self
            .events_tx
            .lock()
            .unwrap()
            .clone()
            .expect("emit before spawn");
        tx.send(event).await.expect("event channel closed");
    }
}

#[async_trait]
impl NodeLauncher for MockLauncher {
    async fn spawn(
        &self,
        _package: &str,
        _executable: &str,
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<ProcessHandle, PanelError> {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PanelError::Spawn("mock spawn failure".to_string()));
        }
        if self.exit_on_spawn.load(Ordering::SeqCst) {
            let _ = events.try_send(ProcessEvent::Exited { code: Some(1) });
        }
        *self.events_tx.lock().unwrap() = Some(events);
        let (kill_tx, kill_rx) = mpsc::channel(8);
        *self.kill_rx.lock().unwrap() = Some(kill_rx);
        Ok(ProcessHandle::new(kill_tx))
    }
}
