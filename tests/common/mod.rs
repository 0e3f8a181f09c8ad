#![allow(dead_code)]

use krbask::inject::{InjectError, TicketInjector};
use krbask::net::KdcTransport;
use krbask::principal::krbtgt_principal;

use kerberos_asn1::Asn1Object;
use kerberos_asn1::AsRep;
use kerberos_asn1::EncKdcRepPart;
use kerberos_asn1::EncryptedData;
use kerberos_asn1::EncryptionKey;
use kerberos_asn1::KrbError;
use kerberos_asn1::PrincipalName;
use kerberos_asn1::TgsRep;
use kerberos_asn1::Ticket;

use kerberos_constants::etypes::{AES256_CTS_HMAC_SHA1_96,RC4_HMAC};
use kerberos_constants::key_usages::{KEY_USAGE_AS_REP_ENC_PART,KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY};
use kerberos_constants::principal_names::{NT_PRINCIPAL,NT_SRV_INST};

use chrono::{TimeZone, Utc};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;

pub const REALM : &str = "CORP.LOCAL";
pub const ALICE_KEY : &str = "00112233445566778899aabbccddeeff";
pub const SESSION_KEY : [u8;16] = [0xa5; 16];
pub const ALICE_AES_KEY : &str = "4fa1d3c27b80e95d6a1e2f3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f";
pub const AES_SESSION_KEY : [u8;32] = [0x3c; 32];

/// Replays scripted replies in order and keeps every request it was given.
#[derive(Default)]
pub struct MockKdc {
	replies : RefCell<VecDeque<io::Result<Vec<u8>>>>,
	pub requests : RefCell<Vec<(String, u16, Vec<u8>)>>,
	pub calls : Cell<usize>
}

impl MockKdc {
	pub fn new(replies : Vec<io::Result<Vec<u8>>>) -> Self {
		Self {
			replies: RefCell::new(replies.into()),
			..Self::default()
		}
	}

	pub fn request(&self, index : usize) -> Vec<u8> {
		self.requests.borrow()[index].2.clone()
	}
}

impl KdcTransport for MockKdc {
	fn send_recv(&self, host : &str, port : u16, request : &[u8]) -> io::Result<Vec<u8>> {
		self.calls.set(self.calls.get() + 1);
		self.requests.borrow_mut().push((host.to_string(), port, request.to_vec()));
		self.replies.borrow_mut()
			.pop_front()
			.unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::ConnectionReset, "no scripted reply")))
	}
}

#[derive(Default)]
pub struct RecordingInjector {
	pub imports : RefCell<Vec<(Vec<u8>, Option<u64>)>>,
	pub fail : bool
}

impl TicketInjector for RecordingInjector {
	fn import_credential(&self, kirbi : &[u8], luid : Option<u64>) -> Result<(), InjectError> {
		self.imports.borrow_mut().push((kirbi.to_vec(), luid));
		if self.fail {
			return Err(InjectError::Conversion("refused".to_string()));
		}
		Ok(())
	}
}

fn der_length(len : usize) -> Vec<u8> {
	if len < 0x80 {
		return vec![len as u8];
	}
	let bytes : Vec<u8> = (len as u32).to_be_bytes()
		.iter()
		.skip_while(|b| **b == 0)
		.cloned()
		.collect();
	let mut out = vec![0x80 | bytes.len() as u8];
	out.extend(bytes);
	out
}

pub fn wrap_application(tag : u8, inner : &[u8]) -> Vec<u8> {
	let mut out = vec![0x60 | tag];
	out.extend(der_length(inner.len()));
	out.extend_from_slice(inner);
	out
}

fn seal(etype : i32, key : &[u8], usage : i32, plain : &[u8]) -> Vec<u8> {
	kerberos_crypto::new_kerberos_cipher(etype).unwrap().encrypt(key, usage, plain)
}

fn seal_rc4(key : &[u8], plain : &[u8]) -> Vec<u8> {
	seal(RC4_HMAC, key, KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY, plain)
}

pub fn rc4_session_key() -> EncryptionKey {
	EncryptionKey {
		keytype: RC4_HMAC,
		keyvalue: SESSION_KEY.to_vec()
	}
}

pub fn aes_session_key() -> EncryptionKey {
	EncryptionKey {
		keytype: AES256_CTS_HMAC_SHA1_96,
		keyvalue: AES_SESSION_KEY.to_vec()
	}
}

pub fn principal(name_type : i32, parts : &[&str]) -> PrincipalName {
	PrincipalName {
		name_type,
		name_string: parts.iter().map(|s| s.to_string()).collect()
	}
}

pub fn enc_part(srealm : &str, sname : PrincipalName) -> EncKdcRepPart {
	enc_part_with_key(srealm, sname, rc4_session_key())
}

pub fn enc_part_with_key(srealm : &str, sname : PrincipalName, session_key : EncryptionKey) -> EncKdcRepPart {
	let mut part = EncKdcRepPart::default();
	part.key = session_key;
	part.nonce = 0x0102_0304;
	part.flags.flags = 0x40e1_0000;
	part.authtime = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap().into();
	part.endtime = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap().into();
	part.renew_till = Some(Utc.with_ymd_and_hms(2024, 3, 8, 8, 0, 0).unwrap().into());
	part.srealm = srealm.to_string();
	part.sname = sname;
	part
}

pub fn ticket_for(sname : PrincipalName) -> Ticket {
	let mut ticket = Ticket::default();
	ticket.realm = REALM.to_string();
	ticket.sname = sname;
	ticket.enc_part = EncryptedData::new(AES256_CTS_HMAC_SHA1_96, Some(2), vec![0x5a; 48]);
	ticket
}

/// AS-REP for alice whose enc-part is sealed with `key` under usage 8 (RC4).
pub fn as_rep(key : &[u8]) -> Vec<u8> {
	let tgt_name = krbtgt_principal(REALM);
	let plain = wrap_application(25, &enc_part(REALM, tgt_name.clone()).build());

	let mut asrep = AsRep::default();
	asrep.crealm = REALM.to_string();
	asrep.cname = principal(NT_PRINCIPAL, &["alice"]);
	asrep.ticket = ticket_for(tgt_name);
	asrep.enc_part = EncryptedData::new(RC4_HMAC, None, seal_rc4(key, &plain));
	asrep.build()
}

/// AS-REP for alice sealed with an AES256 `key` under usage 3, handing out `session_key`.
pub fn as_rep_aes(key : &[u8], session_key : EncryptionKey) -> Vec<u8> {
	let tgt_name = krbtgt_principal(REALM);
	let plain = wrap_application(25, &enc_part_with_key(REALM, tgt_name.clone(), session_key).build());

	let mut asrep = AsRep::default();
	asrep.crealm = REALM.to_string();
	asrep.cname = principal(NT_PRINCIPAL, &["alice"]);
	asrep.ticket = ticket_for(tgt_name);
	asrep.enc_part = EncryptedData::new(AES256_CTS_HMAC_SHA1_96, Some(2), seal(AES256_CTS_HMAC_SHA1_96, key, KEY_USAGE_AS_REP_ENC_PART, &plain));
	asrep.build()
}

/// TGS-REP for `service` sealed with the RC4 TGT session key.
pub fn tgs_rep(service : &str) -> Vec<u8> {
	tgs_rep_sealed_with(service, &rc4_session_key())
}

/// TGS-REP for `service` sealed under usage 8 with `tgt_session_key`.
pub fn tgs_rep_sealed_with(service : &str, tgt_session_key : &EncryptionKey) -> Vec<u8> {
	let parts : Vec<&str> = service.split('/').collect();
	let sname = principal(NT_SRV_INST, &parts);
	let plain = wrap_application(26, &enc_part(REALM, sname.clone()).build());
	let etype = tgt_session_key.keytype;

	let mut tgsrep = TgsRep::default();
	tgsrep.crealm = REALM.to_string();
	tgsrep.cname = principal(NT_PRINCIPAL, &["alice"]);
	tgsrep.ticket = ticket_for(sname);
	tgsrep.enc_part = EncryptedData::new(etype, None, seal(etype, &tgt_session_key.keyvalue, KEY_USAGE_TGS_REP_ENC_PART_SESSION_KEY, &plain));
	tgsrep.build()
}

pub fn krb_error(code : i32, text : Option<&str>) -> Vec<u8> {
	let mut krb_err = KrbError::default();
	krb_err.error_code = code;
	krb_err.realm = REALM.to_string();
	krb_err.e_text = text.map(|t| t.to_string());
	krb_err.build()
}

pub fn alice_key() -> Vec<u8> {
	hex::decode(ALICE_KEY).unwrap()
}

pub fn alice_aes_key() -> Vec<u8> {
	hex::decode(ALICE_AES_KEY).unwrap()
}
