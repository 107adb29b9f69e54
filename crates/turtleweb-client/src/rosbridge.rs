//! [`RosbridgeClient`] – production [`Ros2Client`] over a rosbridge
//! WebSocket.
//!
//! One writer task owns the sink; one reader task owns the stream and
//! dispatches inbound frames:
//!
//! * `service_response` frames are matched by their `id` against a
//!   pending-call map and resolve the caller's oneshot.
//! * `publish` frames fan out to per-topic [`broadcast`] channels, one
//!   subscriber channel per topic, so a slow consumer never blocks the
//!   reader.
//!
//! Service availability is probed through the `/rosapi/services` listing
//! since the rosbridge protocol has no native wait operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::adapter::Ros2Client;
use crate::frames;
use turtleweb_types::PanelError;

/// Buffered messages per subscribed topic before slow receivers lag.
const TOPIC_CAPACITY: usize = 256;

/// Outbound frame queue depth between callers and the writer task.
const OUTBOX_CAPACITY: usize = 64;

/// How long a `call_service` waits for its `service_response` frame.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Service listing endpoint used to probe availability.
const ROSAPI_SERVICES: &str = "/rosapi/services";
const ROSAPI_SERVICES_TYPE: &str = "rosapi_msgs/srv/Services";

// Plain mutexes: neither map is ever held across an await point, and
// the pending-call guard must be able to clean up from a sync Drop.
type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Value, String>>>>>;
type TopicMap = Arc<Mutex<HashMap<String, broadcast::Sender<Value>>>>;

fn lock_map<T>(map: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registration of one in-flight `call_service` request. Dropping it
/// removes the pending entry, so a caller cancelled mid-await (e.g. by
/// an outer timeout) never leaves a stale waiter behind.
struct PendingCall {
    pending: PendingMap,
    id: String,
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        lock_map(&self.pending).remove(&self.id);
    }
}

/// Clients are cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct RosbridgeClient {
    outbox: mpsc::Sender<Message>,
    pending: PendingMap,
    topics: TopicMap,
}

impl RosbridgeClient {
    /// Connect to a rosbridge endpoint (e.g. `ws://localhost:9090`) and
    /// start the reader/writer tasks.
    pub async fn connect(url: &str) -> Result<Self, PanelError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| PanelError::Transport(format!("connect to {url}: {e}")))?;
        let (mut ws_tx, mut ws_rx) = ws.split();

        let (outbox, mut outbox_rx) = mpsc::channel::<Message>(OUTBOX_CAPACITY);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let topics: TopicMap = Arc::new(Mutex::new(HashMap::new()));

        // Writer: drains the outbox into the WebSocket sink.
        tokio::spawn(async move {
            while let Some(msg) = outbox_rx.recv().await {
                if let Err(e) = ws_tx.send(msg).await {
                    warn!(target: "turtleweb::rosbridge", error = %e, "ws send failed");
                    break;
                }
            }
        });

        // Reader: dispatches inbound frames. Dropping the pending map
        // entries on stream end resolves waiting callers with Closed.
        let pending_reader = Arc::clone(&pending);
        let topics_reader = Arc::clone(&topics);
        tokio::spawn(async move {
            while let Some(msg) = ws_rx.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        dispatch_frame(text.as_str(), &pending_reader, &topics_reader);
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
            lock_map(&pending_reader).clear();
            debug!(target: "turtleweb::rosbridge", "rosbridge stream ended");
        });

        Ok(Self {
            outbox,
            pending,
            topics,
        })
    }

    async fn send_frame(&self, frame: Value) -> Result<(), PanelError> {
        self.outbox
            .send(Message::Text(frame.to_string().into()))
            .await
            .map_err(|_| PanelError::Closed)
    }
}

/// Route one inbound rosbridge frame. Unknown ops are ignored with a
/// trace, matching the protocol's tolerance for unsolicited frames.
pub(crate) fn dispatch_frame(text: &str, pending: &PendingMap, topics: &TopicMap) {
    let Ok(frame) = serde_json::from_str::<Value>(text) else {
        trace!(target: "turtleweb::rosbridge", "dropping non-JSON frame");
        return;
    };

    match frame.get("op").and_then(|op| op.as_str()) {
        Some("service_response") => {
            let Some(id) = frame.get("id").and_then(|id| id.as_str()) else {
                return;
            };
            let Some(tx) = lock_map(pending).remove(id) else {
                trace!(target: "turtleweb::rosbridge", id, "unmatched service_response");
                return;
            };
            let ok = frame
                .get("result")
                .and_then(|r| r.as_bool())
                .unwrap_or(true);
            let values = frame.get("values").cloned().unwrap_or(Value::Null);
            let outcome = if ok {
                Ok(values)
            } else {
                Err(values.to_string())
            };
            let _ = tx.send(outcome);
        }
        Some("publish") => {
            let Some(topic) = frame.get("topic").and_then(|t| t.as_str()) else {
                return;
            };
            let msg = frame.get("msg").cloned().unwrap_or(Value::Null);
            if let Some(tx) = lock_map(topics).get(topic) {
                // Err here only means no live receivers; not a fault.
                let _ = tx.send(msg);
            }
        }
        _ => {
            trace!(target: "turtleweb::rosbridge", "ignoring frame");
        }
    }
}

#[async_trait]
impl Ros2Client for RosbridgeClient {
    async fn advertise(&self, topic: &str, msg_type: &str) -> Result<(), PanelError> {
        self.send_frame(frames::advertise(topic, msg_type)).await
    }

    async fn unadvertise(&self, topic: &str) -> Result<(), PanelError> {
        self.send_frame(frames::unadvertise(topic)).await
    }

    async fn publish(&self, topic: &str, msg: Value) -> Result<(), PanelError> {
        self.send_frame(frames::publish(topic, msg))
            .await
            .map_err(|e| PanelError::Publish {
                topic: topic.to_string(),
                details: e.to_string(),
            })
    }

    async fn subscribe(
        &self,
        topic: &str,
        msg_type: &str,
    ) -> Result<broadcast::Receiver<Value>, PanelError> {
        let rx = lock_map(&self.topics)
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe();
        self.send_frame(frames::subscribe(topic, msg_type)).await?;
        Ok(rx)
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), PanelError> {
        lock_map(&self.topics).remove(topic);
        self.send_frame(frames::unsubscribe(topic)).await
    }

    async fn wait_for_service(&self, service: &str, timeout: Duration) -> bool {
        let listing = tokio::time::timeout(
            timeout,
            self.call_service(
                ROSAPI_SERVICES,
                ROSAPI_SERVICES_TYPE,
                serde_json::json!({}),
            ),
        )
        .await;
        match listing {
            Ok(Ok(values)) => values
                .get("services")
                .and_then(|s| s.as_array())
                .is_some_and(|list| list.iter().any(|v| v.as_str() == Some(service))),
            _ => false,
        }
    }

    async fn call_service(
        &self,
        service: &str,
        srv_type: &str,
        args: Value,
    ) -> Result<Value, PanelError> {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        lock_map(&self.pending).insert(id.clone(), tx);
        // Cleans up the entry on every exit path, including this future
        // being cancelled mid-await by an outer timeout.
        let guard = PendingCall {
            pending: Arc::clone(&self.pending),
            id: id.clone(),
        };

        self.send_frame(frames::call_service(&id, service, srv_type, args))
            .await?;

        let outcome = match tokio::time::timeout(RESPONSE_TIMEOUT, rx).await {
            Ok(Ok(Ok(values))) => Ok(values),
            Ok(Ok(Err(details))) => Err(PanelError::Service {
                service: service.to_string(),
                details,
            }),
            Ok(Err(_)) => Err(PanelError::Closed),
            Err(_) => Err(PanelError::Service {
                service: service.to_string(),
                details: format!("no response within {RESPONSE_TIMEOUT:?}"),
            }),
        };
        drop(guard);
        outcome
    }
}
