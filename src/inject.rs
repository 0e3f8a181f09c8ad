//! Handing freshly obtained tickets to the local credential cache.

use crate::kirbi::Kirbi;

use kerberos_asn1::KrbCred;

use kerberos_ccache::CCache;

use log::{debug, warn};

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
	#[error("unable to write the credential cache {0}: {1}")]
	Io(PathBuf, #[source] io::Error),

	#[error("unable to convert the credential: {0}")]
	Conversion(String),

	#[error("unsupported credential cache '{0}'")]
	UnsupportedCache(String)
}

/// Imports a serialized KRB-CRED into a ticket cache. Best effort: callers log failures.
pub trait TicketInjector {
	fn import_credential(&self, kirbi : &[u8], luid : Option<u64>) -> Result<(), InjectError>;
}

/// Writes the tickets as an MIT credential cache file, the cache klist and friends read.
#[derive(Debug, Clone)]
pub struct CcacheInjector {
	path : PathBuf
}

impl CcacheInjector {
	pub fn new<P : AsRef<Path>>(path : P) -> Self {
		Self { path: path.as_ref().to_path_buf() }
	}

	/// Uses KRB5CCNAME, which must point to a FILE: cache.
	pub fn from_env() -> Result<Self, InjectError> {
		let name = env::var("KRB5CCNAME")
			.map_err(|_| InjectError::UnsupportedCache("KRB5CCNAME is not set".to_string()))?;
		Self::from_cache_name(&name)
	}

	pub fn from_cache_name(name : &str) -> Result<Self, InjectError> {
		match name.split_once(':') {
			Some(("FILE", path)) => Ok(Self::new(path)),
			Some((kind, _)) if kind.len() > 1 => Err(InjectError::UnsupportedCache(name.to_string())),
			_ => Ok(Self::new(name))
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

// Helper functions for the cache file

impl CcacheInjector {
	/// Credentials already in the cache. A missing or unreadable cache counts as empty.
	pub fn load(&self) -> Result<Kirbi, InjectError> {
		let data = match fs::read(&self.path) {
			Ok(data) => data,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Kirbi::new()),
			Err(e) => return Err(InjectError::Io(self.path.clone(), e))
		};

		let loaded = CCache::parse(&data)
			.map_err(|e| format!("{:?}", e))
			.and_then(|(_, ccache)| {
				let krb_cred : KrbCred = ccache.try_into().map_err(|_| "not convertible to KRB-CRED".to_string())?;
				Kirbi::from_krb_cred(krb_cred).map_err(|e| e.to_string())
			});

		match loaded {
			Ok(kirbi) => Ok(kirbi),
			Err(e) => {
				warn!("Ignoring the unreadable credential cache {}: {}", self.path.display(), e);
				Ok(Kirbi::new())
			}
		}
	}

	fn save(&self, kirbi : &Kirbi) -> Result<(), InjectError> {
		let ccache : CCache = kirbi.to_krb_cred().try_into()
			.map_err(|_| InjectError::Conversion("unable to convert the KRB-CRED to a ccache".to_string()))?;
		fs::write(&self.path, ccache.build())
			.map_err(|e| InjectError::Io(self.path.clone(), e))
	}
}

impl TicketInjector for CcacheInjector {
	/// Adds the tickets to the ones already cached, the cache is never truncated.
	fn import_credential(&self, kirbi : &[u8], luid : Option<u64>) -> Result<(), InjectError> {
		if let Some(luid) = luid {
			warn!("Logon session 0x{:x} ignored, tickets go to {}", luid, self.path.display());
		}

		let incoming = Kirbi::from_bytes(kirbi)
			.map_err(|e| InjectError::Conversion(e.to_string()))?;

		let mut cached = self.load()?;
		cached.merge(incoming);
		self.save(&cached)?;

		debug!("Credential cache {} now holds {} tickets", self.path.display(), cached.len());
		Ok(())
	}
}
