//! Device discovery
//!
//! Enumerates the fans behind one controller and builds an adapter for
//! each. A device that cannot be adapted is logged and skipped; the rest
//! of the cycle carries on. The result is only delivered once the
//! controller signals that enumeration is complete.

use crate::adapter::FanAdapter;
use quietcool_controller::{ControllerClient, ListEvent};
use quietcool_core::{ControllerConfig, ControllerEndpoint, QuietCoolError, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one discovery cycle
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Adapters in the order the controller reported their devices
    pub adapters: Vec<Arc<FanAdapter>>,
    /// One [`QuietCoolError::DiscoveryPartialFailure`] per skipped device
    pub failures: Vec<QuietCoolError>,
}

impl DiscoveryReport {
    fn skip(&mut self, uid: String, reason: QuietCoolError) {
        let failure = QuietCoolError::DiscoveryPartialFailure {
            uid,
            reason: reason.to_string(),
        };
        error!("{}", failure);
        self.failures.push(failure);
    }
}

/// Discover every fan behind `endpoint`.
///
/// Fails with [`QuietCoolError::DiscoveryIncomplete`] if the device stream
/// closes before the completion signal.
pub async fn discover_all(
    client: &Arc<dyn ControllerClient>,
    endpoint: &ControllerEndpoint,
    manufacturer: &str,
) -> Result<DiscoveryReport> {
    let mut events = client.list_devices_with_info(endpoint);
    let mut report = DiscoveryReport::default();

    while let Some(event) = events.recv().await {
        match event {
            ListEvent::Found(descriptor) => {
                let uid = descriptor.uid().to_string();
                match FanAdapter::new(descriptor, Arc::clone(client), manufacturer) {
                    Ok(adapter) => report.adapters.push(Arc::new(adapter)),
                    Err(e) => report.skip(uid, e),
                }
            }
            ListEvent::Failed { uid, error } => match uid {
                Some(uid) => report.skip(uid, error),
                None => warn!("Controller {} listing failed: {}", endpoint, error),
            },
            ListEvent::Complete => return Ok(report),
        }
    }

    Err(QuietCoolError::DiscoveryIncomplete {
        found: report.adapters.len(),
    })
}

/// The bridge platform: one controller, its client, and the fans found on it
pub struct Platform {
    endpoint: ControllerEndpoint,
    manufacturer: String,
    client: Arc<dyn ControllerClient>,
    all_fans: Vec<Arc<FanAdapter>>,
}

impl Platform {
    pub fn new(config: &ControllerConfig, client: Arc<dyn ControllerClient>) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint()?,
            manufacturer: config.manufacturer.clone(),
            client,
            all_fans: Vec::new(),
        })
    }

    pub fn endpoint(&self) -> &ControllerEndpoint {
        &self.endpoint
    }

    /// Fans found by the last discovery cycle
    pub fn all_fans(&self) -> &[Arc<FanAdapter>] {
        &self.all_fans
    }

    /// Run one discovery cycle and keep its adapters
    pub async fn accessories(&mut self) -> Result<Vec<Arc<FanAdapter>>> {
        info!("Querying controller {} for fans", self.endpoint);

        let report = discover_all(&self.client, &self.endpoint, &self.manufacturer).await?;

        info!(
            "Done finding all fans: {} found, {} skipped",
            report.adapters.len(),
            report.failures.len()
        );

        self.all_fans = report.adapters.clone();
        Ok(report.adapters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ErrorCounter;
    use quietcool_controller::{MockController, MockFan};

    fn endpoint() -> ControllerEndpoint {
        "192.168.1.100".parse().unwrap()
    }

    fn client(fans: Vec<MockFan>) -> (Arc<MockController>, Arc<dyn ControllerClient>) {
        let mock = Arc::new(MockController::new(fans));
        let client: Arc<dyn ControllerClient> = mock.clone();
        (mock, client)
    }

    fn uids(report: &DiscoveryReport) -> Vec<&str> {
        report.adapters.iter().map(|a| a.uid()).collect()
    }

    #[tokio::test]
    async fn test_bad_descriptor_is_skipped() {
        let (_mock, client) = client(vec![
            MockFan::multi_speed("one", "Living Room"),
            MockFan::multi_speed("two", ""),
            MockFan::single_speed("three", "Attic"),
        ]);

        let report = discover_all(&client, &endpoint(), "QuietCool").await.unwrap();

        assert_eq!(uids(&report), vec!["one", "three"]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            QuietCoolError::DiscoveryPartialFailure { uid, .. } if uid == "two"
        ));
    }

    #[tokio::test]
    async fn test_skipped_device_logs_one_error() {
        let (_mock, client) = client(vec![
            MockFan::multi_speed("one", "Living Room"),
            MockFan::multi_speed("two", ""),
            MockFan::single_speed("three", "Attic"),
        ]);

        let (errors, _guard) = ErrorCounter::install();
        let report = discover_all(&client, &endpoint(), "QuietCool").await.unwrap();

        assert_eq!(report.adapters.len(), 2);
        assert_eq!(errors.count(), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_for_one_device_is_skipped() {
        let (mock, client) = client(vec![
            MockFan::multi_speed("one", "Living Room"),
            MockFan::single_speed("two", "Attic"),
        ]);
        mock.fail_listing_of("one");

        let report = discover_all(&client, &endpoint(), "QuietCool").await.unwrap();

        assert_eq!(uids(&report), vec!["two"]);
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_devices_is_a_complete_result() {
        let (_mock, client) = client(vec![]);

        let report = discover_all(&client, &endpoint(), "QuietCool").await.unwrap();
        assert!(report.adapters.is_empty());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_stream_without_completion_is_incomplete() {
        let (mock, client) = client(vec![
            MockFan::multi_speed("one", "Living Room"),
            MockFan::single_speed("two", "Attic"),
        ]);
        mock.abort_listing();

        let result = discover_all(&client, &endpoint(), "QuietCool").await;
        assert!(matches!(
            result,
            Err(QuietCoolError::DiscoveryIncomplete { found: 2 })
        ));
    }

    #[tokio::test]
    async fn test_capability_taken_from_descriptor() {
        let (_mock, client) = client(vec![
            MockFan::multi_speed("one", "Living Room"),
            MockFan::single_speed("two", "Attic"),
        ]);

        let report = discover_all(&client, &endpoint(), "QuietCool").await.unwrap();
        assert!(report.adapters[0].is_multi_speed());
        assert!(!report.adapters[1].is_multi_speed());
    }

    #[tokio::test]
    async fn test_platform_keeps_discovered_fans() {
        let (_mock, client) = client(vec![MockFan::multi_speed("abc", "Living Room")]);
        let config = ControllerConfig {
            endpoint: "192.168.1.100".to_string(),
            ..ControllerConfig::default()
        };

        let mut platform = Platform::new(&config, client).unwrap();
        assert!(platform.all_fans().is_empty());

        let adapters = platform.accessories().await.unwrap();
        assert_eq!(adapters.len(), 1);
        assert_eq!(platform.all_fans().len(), 1);
        assert_eq!(platform.all_fans()[0].id().endpoint, *platform.endpoint());
    }

    #[test]
    fn test_platform_rejects_bad_endpoint() {
        let (_mock, client) = client(vec![]);
        let config = ControllerConfig {
            endpoint: String::new(),
            ..ControllerConfig::default()
        };

        assert!(Platform::new(&config, client).is_err());
    }
}
