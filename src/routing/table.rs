//! Service routing table.
//!
//! # Responsibilities
//! - Parse the colon-delimited service list
//! - Resolve one `<NAME>_PORT` value per service
//! - Answer exact, case-sensitive name → port lookups
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (shared via `Arc`, no locks)
//! - Entries with a missing, non-numeric or zero port are skipped, never defaulted
//! - Duplicate names: the first entry wins, later ones are logged and dropped

/// One routable backend service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub service_name: String,
    pub upstream_port: u16,
}

/// Ordered, validated set of route entries.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    /// Build the table from a service list, reading ports from the process
    /// environment.
    pub fn from_env(services: &str) -> Self {
        Self::build(services, |key| std::env::var(key).ok())
    }

    /// Build the table from a service list and a port lookup.
    ///
    /// `lookup` receives `<NAME>_PORT` keys.
    pub fn build<F>(services: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut entries: Vec<RouteEntry> = Vec::new();

        for name in services.split(':') {
            let name = name.trim();
            if name.is_empty() {
                tracing::warn!(services = %services, "Skipping empty service name");
                continue;
            }

            if entries.iter().any(|e| e.service_name == name) {
                tracing::warn!(service = %name, "Duplicate service name, keeping first entry");
                continue;
            }

            let key = port_key(name);
            let raw = match lookup(&key) {
                Some(raw) => raw,
                None => {
                    tracing::warn!(service = %name, key = %key, "No port configured, service skipped");
                    continue;
                }
            };

            match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => {
                    tracing::info!(service = %name, port, "Route registered");
                    entries.push(RouteEntry {
                        service_name: name.to_string(),
                        upstream_port: port,
                    });
                }
                _ => {
                    tracing::warn!(
                        service = %name,
                        key = %key,
                        value = %raw,
                        "Port is not a valid non-zero number, service skipped"
                    );
                }
            }
        }

        if entries.is_empty() {
            tracing::warn!("Routing table is empty; every request will be answered with 404");
        }

        Self { entries }
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, service: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.service_name == service)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Environment key holding a service's port.
pub fn port_key(service: &str) -> String {
    format!("{service}_PORT")
}
