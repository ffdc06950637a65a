//! Round-robin selection of backend hosts.
//!
//! Every outbound request takes exactly one step through the host list,
//! spreading load across the configured Cyanite instances. There is no
//! health checking or weighting.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ConfigError;

/// Endpoint suffix for path searches.
pub const PATHS_SUFFIX: &str = "/paths";

/// Endpoint suffix for series fetches.
pub const METRICS_SUFFIX: &str = "/metrics";

/// Cycles through a fixed, non-empty list of base URLs.
///
/// The host list is immutable after construction. The cursor is atomic so a
/// rotator can be shared between a finder and all readers it creates;
/// concurrent callers get an unspecified interleaving of hosts.
#[derive(Debug)]
pub struct HostRotator {
    hosts: Vec<String>,
    cursor: AtomicUsize,
}

impl HostRotator {
    /// Creates a rotator over `hosts`, stripping trailing slashes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHosts`] if `hosts` is empty and
    /// [`ConfigError::EmptyHost`] if any entry is blank.
    pub fn new<I, S>(hosts: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .enumerate()
            .map(|(index, host)| {
                let host = normalize_host(host.as_ref());
                if host.is_empty() {
                    Err(ConfigError::EmptyHost { index })
                } else {
                    Ok(host)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }

        Ok(Self {
            hosts,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the next host, wrapping to the first after the last.
    pub fn next_host(&self) -> &str {
        let step = self.cursor.fetch_add(1, Ordering::Relaxed);
        &self.hosts[step % self.hosts.len()]
    }

    /// Returns the path-search endpoint on the next host.
    pub fn paths_endpoint(&self) -> String {
        format!("{}{PATHS_SUFFIX}", self.next_host())
    }

    /// Returns the metrics endpoint on the next host.
    pub fn metrics_endpoint(&self) -> String {
        format!("{}{METRICS_SUFFIX}", self.next_host())
    }

    /// Returns the configured hosts in rotation order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Returns the number of hosts in the rotation.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Always `false`; a rotator cannot be built without hosts.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Trims whitespace and trailing slashes from a base URL.
fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FinderConfig;

    #[test]
    fn test_each_host_once_in_order() {
        for n in 1..=5 {
            let hosts: Vec<String> = (0..n).map(|i| format!("http://h{i}")).collect();
            let rotator = HostRotator::new(&hosts).unwrap();

            let seen: Vec<String> = (0..n).map(|_| rotator.next_host().to_string()).collect();
            assert_eq!(seen, hosts);
        }
    }

    #[test]
    fn test_wraps_around() {
        let rotator = HostRotator::new(["http://h1", "http://h2"]).unwrap();
        assert_eq!(rotator.next_host(), "http://h1");
        assert_eq!(rotator.next_host(), "http://h2");
        assert_eq!(rotator.next_host(), "http://h1");
        assert_eq!(rotator.next_host(), "http://h2");
    }

    #[test]
    fn test_endpoints_consume_one_step_each() {
        let rotator = HostRotator::new(["http://h1", "http://h2", "http://h3"]).unwrap();
        assert_eq!(rotator.paths_endpoint(), "http://h1/paths");
        assert_eq!(rotator.metrics_endpoint(), "http://h2/metrics");
        assert_eq!(rotator.paths_endpoint(), "http://h3/paths");
        assert_eq!(rotator.metrics_endpoint(), "http://h1/metrics");
    }

    #[test]
    fn test_single_host() {
        let rotator = HostRotator::new(["http://only/"]).unwrap();
        for _ in 0..3 {
            assert_eq!(rotator.metrics_endpoint(), "http://only/metrics");
        }
        assert_eq!(rotator.len(), 1);
        assert!(!rotator.is_empty());
    }

    #[test]
    fn test_empty_list_rejected() {
        let err = HostRotator::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoHosts));
    }

    #[test]
    fn test_blank_host_rejected() {
        let err = HostRotator::new(["http://h1", ""]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyHost { index: 1 }));

        let err = HostRotator::new(["http://h1", "http://h2", " / "]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyHost { index: 2 }));
    }

    #[test]
    fn test_normalizes_configured_hosts() {
        let config = FinderConfig::from_urls([" http://h1/ ", "http://h2//"]);
        let rotator = HostRotator::new(config.hosts()).unwrap();
        assert_eq!(rotator.hosts(), ["http://h1", "http://h2"]);

        let config = FinderConfig::default();
        assert!(matches!(
            HostRotator::new(config.hosts()),
            Err(ConfigError::NoHosts)
        ));
    }

    #[test]
    fn test_shared_across_threads() {
        let rotator = std::sync::Arc::new(HostRotator::new(["http://h1", "http://h2"]).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let rotator = std::sync::Arc::clone(&rotator);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let host = rotator.next_host();
                        assert!(host == "http://h1" || host == "http://h2");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 100 steps taken in total, so the cursor is back at the first host.
        assert_eq!(rotator.next_host(), "http://h1");
    }
}
