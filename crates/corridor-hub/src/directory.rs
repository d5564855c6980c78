use std::collections::HashMap;

use corridor_core::HostName;

/// Resolves logical host names to base URLs.
///
/// Only hosts present in the directory are reachable through the hub;
/// a lookup miss rejects the message rather than guessing a destination.
pub struct HostDirectory {
    hosts: HashMap<String, String>,
}

impl HostDirectory {
    pub fn new(hosts: HashMap<String, String>) -> Self {
        let hosts = hosts
            .into_iter()
            .map(|(name, url)| {
                (
                    name.to_lowercase(),
                    url.trim_end_matches('/').to_string(),
                )
            })
            .collect();
        Self { hosts }
    }

    pub fn lookup(&self, host: &HostName) -> Option<&str> {
        self.hosts.get(host.as_str()).map(String::as_str)
    }
}
