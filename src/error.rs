use crate::kdc_err::ProtocolError;

use std::io;
use std::result;

pub type Result<T> = result::Result<T, ExchangeError>;

/// Every way a single AS or TGS exchange can fail. All of them are terminal for the
/// exchange that produced them; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
	#[error("unable to resolve a domain controller for realm '{0}'")]
	ResolutionFailure(String),

	#[error("error talking to the KDC at {host}:{port}: {source}")]
	TransportFailure {
		host: String,
		port: u16,
		#[source]
		source: io::Error
	},

	#[error("unknown application tag: {0}")]
	UnrecognizedResponse(u32),

	#[error("KRB-ERROR {0}")]
	ProtocolError(ProtocolError),

	#[error("encryption type {0} not currently supported")]
	UnsupportedEncryptionType(i32),

	#[error("unable to decrypt the reply enc-part: {0}")]
	DecryptionFailure(String),

	#[error("malformed reply: {0}")]
	MalformedReply(String),

	#[error("unexpected {received} in response to a {sent}")]
	UnexpectedReply {
		sent: &'static str,
		received: &'static str
	},

	#[error("invalid credential: {0}")]
	InvalidCredential(String),

	#[error("invalid key: {0}")]
	InvalidKey(String)
}

impl ExchangeError {
	/// Raw KRB-ERROR code, if the KDC answered with one.
	pub fn protocol_error_code(&self) -> Option<i32> {
		match self {
			ExchangeError::ProtocolError(err) => Some(err.code),
			_ => None
		}
	}

	pub fn is_transport_failure(&self) -> bool {
		matches!(self, ExchangeError::TransportFailure { .. })
	}
}

impl From<ProtocolError> for ExchangeError {
	fn from(error : ProtocolError) -> Self {
		ExchangeError::ProtocolError(error)
	}
}
