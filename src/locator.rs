//! Finding a domain controller when the caller did not name one.

/// Resolves the KDC to talk to for a realm. `None` aborts the exchange.
pub trait DcLocator {
	fn resolve_default_controller(&self, realm : &str) -> Option<String>;
}

/// Always answers with the same host, or with nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticDcLocator {
	host : Option<String>
}

impl StaticDcLocator {
	pub fn new(host : Option<String>) -> Self {
		Self { host }
	}
}

impl DcLocator for StaticDcLocator {
	fn resolve_default_controller(&self, _realm : &str) -> Option<String> {
		self.host.clone().filter(|h| !h.is_empty())
	}
}

/// Uses the realm itself as the KDC host name, AD domains resolve to their DCs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealmDcLocator;

impl DcLocator for RealmDcLocator {
	fn resolve_default_controller(&self, realm : &str) -> Option<String> {
		if realm.is_empty() {
			return None;
		}
		Some(realm.to_ascii_lowercase())
	}
}
