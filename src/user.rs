use crate::error::{ExchangeError, Result};
use crate::etype::etype_name;

use kerberos_crypto::Key;
use kerberos_crypto::KerberosCipher;

use kerberos_constants::etypes::{AES256_CTS_HMAC_SHA1_96,RC4_HMAC};

use std::fmt;

/// A client principal together with the long-term key used for the initial exchange.
pub struct KerberosUser {
	pub domain : String,
	pub username : String,
	credential : Key,
	custom_salt : Option<Vec<u8>>
}

impl KerberosUser {
	pub fn from_password(domain : &str, username : &str, password : &str, salt : Option<&str>) -> Result<KerberosUser> {
		let user = KerberosUser {
			domain: domain.to_ascii_uppercase(),
			username: username.to_string(),
			credential: Key::Secret(password.to_string()),
			custom_salt: salt.map(|s| s.as_bytes().to_vec())
		};
		Ok(user)
	}

	pub fn from_ntlm_hash(domain : &str, username : &str, hash : &[u8]) -> Result<KerberosUser> {
		let key : [u8;16] = hash.try_into()
			.map_err(|_| ExchangeError::InvalidKey(format!("NTLM hash must be 16 bytes, got {}", hash.len())))?;

		let user = KerberosUser {
			domain: domain.to_ascii_uppercase(),
			username: username.to_string(),
			credential: Key::RC4Key(key),
			custom_salt: None
		};
		Ok(user)
	}

	pub fn from_aes_key(domain : &str, username : &str, raw_key : &[u8]) -> Result<KerberosUser> {
		// Only AES256 is accepted, AES128 replies cannot be decrypted by this client.
		let key : [u8;32] = raw_key.try_into()
			.map_err(|_| ExchangeError::InvalidKey(format!("AES256 key must be 32 bytes, got {}", raw_key.len())))?;

		let user = KerberosUser {
			domain: domain.to_ascii_uppercase(),
			username: username.to_string(),
			credential: Key::AES256Key(key),
			custom_salt: None
		};
		Ok(user)
	}

	/// Builds a user from a hex key string, picking the etype from the key length.
	pub fn from_hex_key(domain : &str, username : &str, hex_key : &str) -> Result<KerberosUser> {
		let raw_key = hex::decode(hex_key)
			.map_err(|e| ExchangeError::InvalidKey(format!("failed to decode key: {}", e)))?;
		match raw_key.len() {
			16 => Self::from_ntlm_hash(domain, username, &raw_key),
			32 => Self::from_aes_key(domain, username, &raw_key),
			invalid_len => Err(ExchangeError::InvalidKey(format!("unsupported key length {}", invalid_len)))
		}
	}
}

// Methods

impl KerberosUser {
	pub fn get_etype(&self) -> i32 {
		match &self.credential {
			Key::RC4Key(_) => RC4_HMAC,
			_ => AES256_CTS_HMAC_SHA1_96
		}
	}

	pub fn get_cipher(&self) -> Result<Box<dyn KerberosCipher>> {
		let etype = self.get_etype();
		kerberos_crypto::new_kerberos_cipher(etype)
			.map_err(|_| ExchangeError::UnsupportedEncryptionType(etype))
	}

	pub fn get_salt(&self) -> Result<Vec<u8>> {
		match &self.custom_salt {
			Some(salt) => Ok(salt.to_vec()),
			None => Ok(self.get_cipher()?.generate_salt(&self.domain, &self.username))
		}
	}

	/// The raw key bytes used to encrypt the timestamp and decrypt the AS-REP.
	pub fn encryption_key(&self) -> Result<Vec<u8>> {
		match &self.credential {
			Key::Secret(password) => {
				let salt = self.get_salt()?;
				Ok(self.get_cipher()?.generate_key_from_string(password, &salt))
			},
			Key::RC4Key(key) => Ok(key.to_vec()),
			Key::AES128Key(key) => Ok(key.to_vec()),
			Key::AES256Key(key) => Ok(key.to_vec())
		}
	}

	/// Hex form of the client key, as shown in the "Using ... hash" line.
	pub fn key_string(&self) -> Result<String> {
		Ok(hex::encode_upper(self.encryption_key()?))
	}
}

impl fmt::Display for KerberosUser {
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}\\{}", self.domain, self.username)
	}
}

impl fmt::Debug for KerberosUser {
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("KerberosUser")
			.field("domain", &self.domain)
			.field("username", &self.username)
			.field("etype", &etype_name(self.get_etype()))
			.finish()
	}
}
