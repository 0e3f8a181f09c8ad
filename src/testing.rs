//! Fixtures shared by the unit tests.

use crate::principal::krbtgt_principal;

use kerberos_asn1::Asn1Object;
use kerberos_asn1::EncKdcRepPart;
use kerberos_asn1::EncryptedData;
use kerberos_asn1::EncryptionKey;
use kerberos_asn1::Ticket;

use kerberos_constants::etypes::{AES256_CTS_HMAC_SHA1_96,RC4_HMAC};

use chrono::{TimeZone, Utc};

pub const TICKET_FLAGS : u32 = 0x40e1_0000;

pub fn sample_enc_part() -> EncKdcRepPart {
	let mut part = EncKdcRepPart::default();
	part.key = EncryptionKey {
		keytype: RC4_HMAC,
		keyvalue: vec![0xa5; 16]
	};
	part.nonce = 0x1234_5678;
	part.flags.flags = TICKET_FLAGS;
	part.authtime = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap().into();
	part.starttime = Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap().into());
	part.endtime = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap().into();
	part.renew_till = Some(Utc.with_ymd_and_hms(2024, 3, 8, 8, 0, 0).unwrap().into());
	part.srealm = "CORP.LOCAL".to_string();
	part.sname = krbtgt_principal("CORP.LOCAL");
	part
}

pub fn sample_ticket() -> Ticket {
	let mut ticket = Ticket::default();
	ticket.realm = "CORP.LOCAL".to_string();
	ticket.sname = krbtgt_principal("CORP.LOCAL");
	ticket.enc_part = EncryptedData::new(AES256_CTS_HMAC_SHA1_96, Some(2), vec![0x5a; 64]);
	ticket
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

/// Wraps DER bytes in a constructed APPLICATION tag (tag numbers below 31).
pub fn wrap_application(tag : u8, inner : &[u8]) -> Vec<u8> {
	let mut out = vec![0x60 | tag];
	out.extend(der_length(inner.len()));
	out.extend_from_slice(inner);
	out
}

pub fn enc_as_rep_part_bytes(part : &EncKdcRepPart) -> Vec<u8> {
	wrap_application(25, &part.build())
}

pub fn enc_tgs_rep_part_bytes(part : &EncKdcRepPart) -> Vec<u8> {
	wrap_application(26, &part.build())
}
