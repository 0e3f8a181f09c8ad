use crate::error::{ExchangeError, Result};
use crate::etype::{key_usage_for, ExchangeKind};

use kerberos_asn1::EncKdcRepPart;
use kerberos_asn1::EncAsRepPart;
use kerberos_asn1::EncTgsRepPart;
use kerberos_asn1::Asn1Object;

use log::debug;

/// Decrypts the enc-part of an AS-REP or TGS-REP and decodes the EncKDCRepPart inside.
///
/// The key usage comes from the exchange kind and the etype; an unsupported etype fails
/// before any decryption is attempted. The key is only borrowed for the call.
pub fn decrypt_enc_part(kind : ExchangeKind, etype : i32, key : &[u8], cipher_bytes : &[u8]) -> Result<EncKdcRepPart> {
	let usage = key_usage_for(kind, etype)?;
	let cipher = kerberos_crypto::new_kerberos_cipher(etype)
		.map_err(|_| ExchangeError::UnsupportedEncryptionType(etype))?;

	debug!("Decrypting {} enc-part with etype {} and key usage {}", kind, etype, usage);
	let plain = cipher.decrypt(key, usage, cipher_bytes)
		.map_err(|e| ExchangeError::DecryptionFailure(e.to_string()))?;

	decode_enc_part(&plain)
}

/// Some KDCs wrap the AS-REP part as EncTGSRepPart, so both application tags are accepted.
pub fn decode_enc_part(plain : &[u8]) -> Result<EncKdcRepPart> {
	if let Ok((_, enc_as_rep_part)) = EncAsRepPart::parse(plain) {
		return Ok(enc_as_rep_part.into());
	}

	match EncTgsRepPart::parse(plain) {
		Ok((_, enc_tgs_rep_part)) => Ok(enc_tgs_rep_part.into()),
		Err(e) => Err(ExchangeError::MalformedReply(format!("unable to decode the decrypted enc-part: {:?}", e)))
	}
}
