//! JSON-over-HTTP controller client
//!
//! Resource layout on the controller:
//! - `GET /uids` → `[{"uid": "..."}]`
//! - `GET /device/<uid>` → device info
//! - `GET /control/<uid>` → control status
//! - `PUT /control/<uid>` → `{"onoff": "1"}` or `{"speed": "3"}`
//!
//! The uid is percent-encoded as a single path segment.

use crate::client::{ControllerClient, ControllerCommand, ListEvent, LIST_CHANNEL_CAPACITY};
use async_trait::async_trait;
use quietcool_core::{
    ControllerEndpoint, DeviceDescriptor, DeviceId, DeviceInfo, DeviceStatus, QuietCoolError,
    Result,
};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Entry of the controller's uid listing
#[derive(Debug, Deserialize)]
struct UidEntry {
    uid: String,
}

/// HTTP client for QuietCool controllers.
///
/// Cheap to clone; clones share the underlying connection pool. The only
/// timeout applied is the transport timeout given at construction.
#[derive(Debug, Clone)]
pub struct HttpControllerClient {
    client: Client,
}

impl HttpControllerClient {
    /// Create a client with a per-request transport timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quietcoold/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QuietCoolError::Protocol(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Build a resource URL, encoding each segment on its own
    fn url(endpoint: &ControllerEndpoint, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&endpoint.base_url()).map_err(|e| {
            QuietCoolError::InvalidInput(format!("Invalid controller address {}: {}", endpoint, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                QuietCoolError::InvalidInput(format!(
                    "Controller address {} cannot carry a path",
                    endpoint
                ))
            })?
            .clear()
            .extend(segments);
        Ok(url)
    }

    /// Check the status code and decode the JSON body.
    ///
    /// A body that does not decode is a `Serialization` error, so it is not
    /// retried as a transient failure.
    async fn handle_response<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T> {
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            QuietCoolError::Protocol(format!("Failed to read response from {}: {}", url, e))
        })?;

        if !status.is_success() {
            return Err(QuietCoolError::Protocol(format!(
                "HTTP {} from {}: {}",
                status, url, text
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            QuietCoolError::Serialization(format!("Invalid response from {}: {}", url, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| QuietCoolError::Protocol(format!("Request to {} failed: {}", url, e)))?;

        Self::handle_response(response, &url).await
    }

    async fn send_command(&self, id: &DeviceId, command: ControllerCommand) -> Result<()> {
        let url = Self::url(&id.endpoint, &["control", &id.uid])?;
        let body = command.body();
        debug!("PUT {} {}", url, body);

        let response = self
            .client
            .put(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| QuietCoolError::Protocol(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(QuietCoolError::Protocol(format!(
                "HTTP {} from {}: {}",
                status, url, text
            )));
        }

        Ok(())
    }

    async fn list_uids(&self, endpoint: &ControllerEndpoint) -> Result<Vec<String>> {
        let entries: Vec<UidEntry> = self.get_json(Self::url(endpoint, &["uids"])?).await?;
        Ok(entries.into_iter().map(|entry| entry.uid).collect())
    }

    async fn describe(&self, id: &DeviceId) -> Result<DeviceDescriptor> {
        let info = self.get_device_info(id).await?;
        let status = self.get_device_status(id).await?;

        Ok(DeviceDescriptor {
            id: id.clone(),
            info,
            status,
        })
    }

    async fn enumerate(&self, endpoint: ControllerEndpoint, tx: mpsc::Sender<ListEvent>) {
        let uids = match self.list_uids(&endpoint).await {
            Ok(uids) => uids,
            Err(error) => {
                warn!("Failed to list devices on {}: {}", endpoint, error);
                // No completion signal: the listing itself never finished
                let _ = tx.send(ListEvent::Failed { uid: None, error }).await;
                return;
            }
        };

        debug!("Controller {} reported {} device(s)", endpoint, uids.len());

        for uid in uids {
            let id = DeviceId::new(endpoint.clone(), uid.clone());
            let event = match self.describe(&id).await {
                Ok(descriptor) => ListEvent::Found(descriptor),
                Err(error) => ListEvent::Failed {
                    uid: Some(uid),
                    error,
                },
            };

            if tx.send(event).await.is_err() {
                debug!("Enumeration receiver dropped, stopping");
                return;
            }
        }

        let _ = tx.send(ListEvent::Complete).await;
    }
}

#[async_trait]
impl ControllerClient for HttpControllerClient {
    fn list_devices_with_info(&self, endpoint: &ControllerEndpoint) -> mpsc::Receiver<ListEvent> {
        let (tx, rx) = mpsc::channel(LIST_CHANNEL_CAPACITY);
        let client = self.clone();
        let endpoint = endpoint.clone();

        tokio::spawn(async move {
            client.enumerate(endpoint, tx).await;
        });

        rx
    }

    async fn get_device_info(&self, id: &DeviceId) -> Result<DeviceInfo> {
        self.get_json(Self::url(&id.endpoint, &["device", &id.uid])?)
            .await
    }

    async fn get_device_status(&self, id: &DeviceId) -> Result<DeviceStatus> {
        self.get_json(Self::url(&id.endpoint, &["control", &id.uid])?)
            .await
    }

    async fn set_power(&self, id: &DeviceId, on: bool) -> Result<()> {
        self.send_command(
            id,
            ControllerCommand::Power {
                uid: id.uid.clone(),
                on,
            },
        )
        .await
    }

    async fn set_speed(&self, id: &DeviceId, code: u32) -> Result<()> {
        self.send_command(
            id,
            ControllerCommand::Speed {
                uid: id.uid.clone(),
                code,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    /// Commands received by the mock controller
    type Received = Arc<Mutex<Vec<(String, Value)>>>;

    async fn uids() -> Json<Value> {
        Json(json!([{ "uid": "abc" }, { "uid": "broken" }, { "uid": "def" }]))
    }

    async fn device(Path(uid): Path<String>) -> impl IntoResponse {
        match uid.as_str() {
            "abc" => (
                StatusCode::OK,
                Json(json!({ "uid": "abc", "name": "Attic", "model": "QC-3", "status": "1" })),
            ),
            "def" => (
                StatusCode::OK,
                Json(json!({ "uid": "def", "name": "Garage", "model": "QC-1", "status": "0" })),
            ),
            "a/b?c#d" => (
                StatusCode::OK,
                Json(json!({ "uid": "a/b?c#d", "name": "Porch", "model": "QC-1", "status": "0" })),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "device offline" })),
            ),
        }
    }

    async fn control(Path(uid): Path<String>) -> impl IntoResponse {
        match uid.as_str() {
            "abc" => (
                StatusCode::OK,
                Json(json!({ "uid": "abc", "speed": "3", "sequence": "1", "mode": "1" })),
            ),
            "def" => (
                StatusCode::OK,
                Json(json!({ "uid": "def", "speed": 1, "sequence": "4" })),
            ),
            "garbled" => (
                StatusCode::OK,
                Json(json!({ "uid": "garbled", "speed": "fast", "sequence": "1" })),
            ),
            _ => (StatusCode::NOT_FOUND, Json(json!({}))),
        }
    }

    async fn put_control(
        State(received): State<Received>,
        Path(uid): Path<String>,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        if uid == "broken" {
            return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
        }
        received.lock().unwrap().push((uid, body.clone()));
        (StatusCode::OK, Json(body))
    }

    /// Start a mock controller on an ephemeral port
    async fn start_mock_controller() -> (ControllerEndpoint, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/uids", get(uids))
            .route("/device/:uid", get(device))
            .route("/control/:uid", get(control).put(put_control))
            .with_state(received.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let endpoint = format!("127.0.0.1:{}", addr.port()).parse().unwrap();
        (endpoint, received)
    }

    fn client() -> HttpControllerClient {
        HttpControllerClient::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_get_device_info() {
        let (endpoint, _) = start_mock_controller().await;
        let id = DeviceId::new(endpoint, "abc");

        let info = client().get_device_info(&id).await.unwrap();
        assert_eq!(info.name, "Attic");
        assert_eq!(info.model, "QC-3");
        assert!(info.is_on());
    }

    #[tokio::test]
    async fn test_get_device_status() {
        let (endpoint, _) = start_mock_controller().await;

        let status = client()
            .get_device_status(&DeviceId::new(endpoint.clone(), "abc"))
            .await
            .unwrap();
        assert_eq!(status.speed, 3);
        assert!(status.is_multi_speed());
        assert_eq!(status.details.get("mode").unwrap(), "1");

        let status = client()
            .get_device_status(&DeviceId::new(endpoint, "def"))
            .await
            .unwrap();
        assert_eq!(status.speed, 1);
        assert!(!status.is_multi_speed());
    }

    #[tokio::test]
    async fn test_http_error_is_protocol_error() {
        let (endpoint, _) = start_mock_controller().await;
        let id = DeviceId::new(endpoint, "broken");

        let err = client().get_device_info(&id).await.unwrap_err();
        assert!(matches!(err, QuietCoolError::Protocol(_)));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_url_encodes_uid_as_one_segment() {
        let endpoint: ControllerEndpoint = "10.0.0.2:8080".parse().unwrap();

        let url = HttpControllerClient::url(&endpoint, &["control", "a/b?c#d"]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:8080/control/a%2Fb%3Fc%23d");

        let url = HttpControllerClient::url(&endpoint, &["uids"]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:8080/uids");

        let endpoint: ControllerEndpoint = "[fe80::1]".parse().unwrap();
        let url = HttpControllerClient::url(&endpoint, &["device", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://[fe80::1]/device/abc");
    }

    #[tokio::test]
    async fn test_uid_with_reserved_characters_reaches_its_device() {
        let (endpoint, _) = start_mock_controller().await;
        let id = DeviceId::new(endpoint, "a/b?c#d");

        let info = client().get_device_info(&id).await.unwrap();
        assert_eq!(info.uid, "a/b?c#d");
        assert_eq!(info.name, "Porch");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_not_transient() {
        let (endpoint, _) = start_mock_controller().await;
        let id = DeviceId::new(endpoint, "garbled");

        let err = client().get_device_status(&id).await.unwrap_err();
        assert!(matches!(err, QuietCoolError::Serialization(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_set_power_and_speed_bodies() {
        let (endpoint, received) = start_mock_controller().await;
        let id = DeviceId::new(endpoint, "abc");
        let client = client();

        client.set_power(&id, true).await.unwrap();
        client.set_speed(&id, 1).await.unwrap();
        client.set_power(&id, false).await.unwrap();

        let received = received.lock().unwrap().clone();
        assert_eq!(
            received,
            vec![
                ("abc".to_string(), json!({ "onoff": "1" })),
                ("abc".to_string(), json!({ "speed": "1" })),
                ("abc".to_string(), json!({ "onoff": "0" })),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_command_is_protocol_error() {
        let (endpoint, _) = start_mock_controller().await;
        let id = DeviceId::new(endpoint, "broken");

        let err = client().set_power(&id, true).await.unwrap_err();
        assert!(matches!(err, QuietCoolError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_list_devices_reports_per_item_failures_and_completes() {
        let (endpoint, _) = start_mock_controller().await;
        let mut rx = client().list_devices_with_info(&endpoint);

        let mut found = Vec::new();
        let mut failed = Vec::new();
        let mut completed = false;

        while let Some(event) = rx.recv().await {
            match event {
                ListEvent::Found(descriptor) => found.push(descriptor),
                ListEvent::Failed { uid, .. } => failed.push(uid),
                ListEvent::Complete => completed = true,
            }
        }

        assert!(completed);
        assert_eq!(failed, vec![Some("broken".to_string())]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].uid(), "abc");
        assert_eq!(found[0].name(), "Attic");
        assert!(found[0].is_multi_speed());
        assert_eq!(found[1].uid(), "def");
        assert!(!found[1].is_multi_speed());
    }

    #[tokio::test]
    async fn test_unreachable_controller_ends_without_completion() {
        // Reserve a port, then free it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint: ControllerEndpoint = format!("127.0.0.1:{}", port).parse().unwrap();
        let mut rx = client().list_devices_with_info(&endpoint);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ListEvent::Failed {
                uid: None,
                error: QuietCoolError::Protocol(_)
            }
        ));
    }
}
