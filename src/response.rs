use crate::error::{ExchangeError, Result};

use kerberos_asn1::AsRep;
use kerberos_asn1::TgsRep;
use kerberos_asn1::KrbError;
use kerberos_asn1::Asn1Object;

use log::debug;

pub const AS_REP_TAG : u32 = 11;
pub const TGS_REP_TAG : u32 = 13;
pub const KRB_ERROR_TAG : u32 = 30;

const CLASS_MASK : u8 = 0xc0;
const APPLICATION_CLASS : u8 = 0x40;
const TAG_MASK : u8 = 0x1f;

/// What the KDC answered, decided from the outer application tag only.
#[derive(Debug)]
pub enum KdcResponse {
	AsRep(AsRep),
	TgsRep(TgsRep),
	KrbError(KrbError),
	Unrecognized(u32)
}

impl KdcResponse {
	pub fn name(&self) -> &'static str {
		match self {
			KdcResponse::AsRep(_) => "AS-REP",
			KdcResponse::TgsRep(_) => "TGS-REP",
			KdcResponse::KrbError(_) => "KRB-ERROR",
			KdcResponse::Unrecognized(_) => "unknown message"
		}
	}
}

/// Outer tag number plus whether it is in the APPLICATION class.
pub fn outer_tag(raw : &[u8]) -> Option<(bool, u32)> {
	let first = *raw.first()?;
	let is_application = first & CLASS_MASK == APPLICATION_CLASS;

	if first & TAG_MASK != TAG_MASK {
		return Some((is_application, (first & TAG_MASK) as u32));
	}

	// High tag number form, base 128 with the top bit as continuation.
	let mut tag : u32 = 0;
	for byte in raw.iter().skip(1).take(4) {
		tag = (tag << 7) | (byte & 0x7f) as u32;
		if byte & 0x80 == 0 {
			return Some((is_application, tag));
		}
	}
	None
}

fn malformed(what : &str, e : kerberos_asn1::Error) -> ExchangeError {
	ExchangeError::MalformedReply(format!("unable to decode {}: {:?}", what, e))
}

/// Bytes after the outer element are ignored, KDC replies may be padded.
pub fn classify(raw : &[u8]) -> Result<KdcResponse> {
	let (is_application, tag) = outer_tag(raw)
		.ok_or_else(|| ExchangeError::MalformedReply(format!("unable to read the outer tag of {} bytes", raw.len())))?;

	if !is_application {
		debug!("Response is not an application message (tag {})", tag);
		return Ok(KdcResponse::Unrecognized(tag));
	}

	let response = match tag {
		AS_REP_TAG => {
			let (_, asrep) = AsRep::parse(raw).map_err(|e| malformed("AS-REP", e))?;
			KdcResponse::AsRep(asrep)
		},
		TGS_REP_TAG => {
			let (_, tgsrep) = TgsRep::parse(raw).map_err(|e| malformed("TGS-REP", e))?;
			KdcResponse::TgsRep(tgsrep)
		},
		KRB_ERROR_TAG => {
			let (_, krb_err) = KrbError::parse(raw).map_err(|e| malformed("KRB-ERROR", e))?;
			KdcResponse::KrbError(krb_err)
		},
		other => KdcResponse::Unrecognized(other)
	};
	Ok(response)
}
