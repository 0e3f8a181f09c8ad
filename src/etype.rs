//! Key usage selection for the reply enc-part.
//!
//! The initial exchange changes the usage number with the cipher: Windows KDCs seal the
//! RC4 AS-REP with the TGS-REP session key usage (8) while AES uses the RFC 4120 AS-REP
//! usage (3). The service exchange always uses 8, which RFC 4120 ties to the TGS-REP role.

use crate::error::{ExchangeError, Result};

use kerberos_constants::etypes::{AES256_CTS_HMAC_SHA1_96,RC4_HMAC};
use kerberos_constants::key_usages::{KEY_USAGE_AS_REP_ENC_PART,KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
	/// AS-REQ / AS-REP
	Initial,
	/// TGS-REQ / TGS-REP
	Service
}

impl ExchangeKind {
	pub fn request_name(&self) -> &'static str {
		match self {
			ExchangeKind::Initial => "AS-REQ",
			ExchangeKind::Service => "TGS-REQ"
		}
	}

	pub fn reply_name(&self) -> &'static str {
		match self {
			ExchangeKind::Initial => "AS-REP",
			ExchangeKind::Service => "TGS-REP"
		}
	}
}

impl fmt::Display for ExchangeKind {
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.reply_name())
	}
}

pub fn is_supported(etype : i32) -> bool {
	etype == RC4_HMAC || etype == AES256_CTS_HMAC_SHA1_96
}

pub fn key_usage_for(kind : ExchangeKind, etype : i32) -> Result<i32> {
	if !is_supported(etype) {
		return Err(ExchangeError::UnsupportedEncryptionType(etype));
	}

	let usage = match kind {
		ExchangeKind::Initial if etype == RC4_HMAC => KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY,
		ExchangeKind::Initial => KEY_USAGE_AS_REP_ENC_PART,
		ExchangeKind::Service => KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY
	};
	Ok(usage)
}

/// Human readable name for the etypes this crate knows about.
pub fn etype_name(etype : i32) -> String {
	match etype {
		RC4_HMAC => "rc4_hmac".to_string(),
		AES256_CTS_HMAC_SHA1_96 => "aes256_cts_hmac_sha1".to_string(),
		other => format!("etype({})", other)
	}
}
