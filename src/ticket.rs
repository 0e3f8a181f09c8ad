use crate::principal::principal_to_string;

use kerberos_asn1::Ticket;
use kerberos_asn1::EncKdcRepPart;
use kerberos_asn1::EncryptionKey;
use kerberos_asn1::KrbCredInfo;
use kerberos_asn1::PrincipalName;
use kerberos_asn1::AsRep;
use kerberos_asn1::TgsRep;

/// Represents a kerberos ticket together with the KrbCredInfo required to use it.
#[derive(Debug, Clone)]
pub struct KerberosTicket {
	pub ticket : Ticket,
	pub cred_info : KrbCredInfo
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
	/// The AS-REP / TGS-REP as received.
	OuterReply,
	/// The decrypted EncKDCRepPart.
	EncPart
}

/// The two structures a KrbCredInfo is filled from.
pub struct ReplySources<'a> {
	pub cname : &'a PrincipalName,
	pub enc_part : &'a EncKdcRepPart
}

pub struct FieldCopy {
	pub field : &'static str,
	pub source : FieldSource,
	pub copy : fn(&mut KrbCredInfo, &ReplySources<'_>)
}

/// Every KrbCredInfo field set after an exchange, and where it comes from.
/// authtime and caddr are left out on purpose. prealm and srealm both come from the
/// enc-part realm.
pub const CRED_INFO_MAPPING : &[FieldCopy] = &[
	FieldCopy { field: "key", source: FieldSource::EncPart, copy: |info, src| info.key = src.enc_part.key.clone() },
	FieldCopy { field: "prealm", source: FieldSource::EncPart, copy: |info, src| info.prealm = Some(src.enc_part.srealm.clone()) },
	FieldCopy { field: "pname", source: FieldSource::OuterReply, copy: |info, src| info.pname = Some(src.cname.clone()) },
	FieldCopy { field: "flags", source: FieldSource::EncPart, copy: |info, src| info.flags = Some(src.enc_part.flags.clone()) },
	FieldCopy { field: "starttime", source: FieldSource::EncPart, copy: |info, src| info.starttime = src.enc_part.starttime.clone() },
	FieldCopy { field: "endtime", source: FieldSource::EncPart, copy: |info, src| info.endtime = Some(src.enc_part.endtime.clone()) },
	FieldCopy { field: "renew-till", source: FieldSource::EncPart, copy: |info, src| info.renew_till = src.enc_part.renew_till.clone() },
	FieldCopy { field: "srealm", source: FieldSource::EncPart, copy: |info, src| info.srealm = Some(src.enc_part.srealm.clone()) },
	FieldCopy { field: "sname", source: FieldSource::EncPart, copy: |info, src| info.sname = Some(src.enc_part.sname.clone()) }
];

fn empty_cred_info() -> KrbCredInfo {
	KrbCredInfo {
		key: EncryptionKey {
			keytype: 0,
			keyvalue: Vec::new()
		},
		prealm: None,
		pname: None,
		flags: None,
		authtime: None,
		starttime: None,
		endtime: None,
		renew_till: None,
		srealm: None,
		sname: None,
		caddr: None
	}
}

pub fn assemble_cred_info(cname : &PrincipalName, enc_part : &EncKdcRepPart) -> KrbCredInfo {
	let sources = ReplySources { cname, enc_part };
	let mut info = empty_cred_info();
	for mapping in CRED_INFO_MAPPING {
		(mapping.copy)(&mut info, &sources);
	}
	info
}

// Constructors

impl KerberosTicket {
	pub fn new(ticket : Ticket, cred_info : KrbCredInfo) -> Self {
		Self { ticket, cred_info }
	}

	pub fn assemble(cname : &PrincipalName, ticket : Ticket, enc_part : &EncKdcRepPart) -> Self {
		Self::new(ticket, assemble_cred_info(cname, enc_part))
	}

	pub fn from_asrep(asrep : AsRep, enc_part : &EncKdcRepPart) -> Self {
		Self::assemble(&asrep.cname, asrep.ticket, enc_part)
	}

	pub fn from_tgsrep(tgsrep : TgsRep, enc_part : &EncKdcRepPart) -> Self {
		Self::assemble(&tgsrep.cname, tgsrep.ticket, enc_part)
	}
}

// Methods

impl KerberosTicket {
	pub fn get_session_key(&self) -> &EncryptionKey {
		&self.cred_info.key
	}

	/// First component of pname, the user the ticket was issued to.
	pub fn client_username(&self) -> Option<&str> {
		self.cred_info.pname.as_ref()
			.and_then(|pname| pname.name_string.first())
			.map(|s| s.as_str())
	}

	pub fn client_realm(&self) -> Option<&str> {
		self.cred_info.prealm.as_deref()
	}

	pub fn service_name(&self) -> String {
		match &self.cred_info.sname {
			Some(sname) => principal_to_string(sname),
			None => String::new()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{sample_enc_part, sample_ticket};
	use kerberos_constants::principal_names::NT_PRINCIPAL;

	fn alice() -> PrincipalName {
		PrincipalName {
			name_type: NT_PRINCIPAL,
			name_string: vec!["alice".to_string()]
		}
	}

	#[test]
	fn client_name_comes_from_the_outer_reply() {
		let only_outer : Vec<&str> = CRED_INFO_MAPPING.iter()
			.filter(|m| m.source == FieldSource::OuterReply)
			.map(|m| m.field)
			.collect();
		assert_eq!(only_outer, vec!["pname"]);
	}

	#[test]
	fn authtime_is_not_mapped() {
		assert!(CRED_INFO_MAPPING.iter().all(|m| m.field != "authtime" && m.field != "caddr"));
		assert_eq!(CRED_INFO_MAPPING.len(), 9);
	}

	#[test]
	fn fields_are_copied_from_both_sources() {
		let enc_part = sample_enc_part();
		let info = assemble_cred_info(&alice(), &enc_part);

		assert_eq!(info.key, enc_part.key);
		assert_eq!(info.pname, Some(alice()));
		assert_eq!(info.prealm, Some(enc_part.srealm.clone()));
		assert_eq!(info.srealm, Some(enc_part.srealm.clone()));
		assert_eq!(info.flags, Some(enc_part.flags.clone()));
		assert_eq!(info.starttime, enc_part.starttime);
		assert_eq!(info.endtime, Some(enc_part.endtime.clone()));
		assert_eq!(info.renew_till, enc_part.renew_till);
		assert_eq!(info.sname, Some(enc_part.sname.clone()));
		assert_eq!(info.authtime, None);
		assert_eq!(info.caddr, None);
	}

	#[test]
	fn ticket_exposes_client_identity() {
		let ticket = KerberosTicket::assemble(&alice(), sample_ticket(), &sample_enc_part());
		assert_eq!(ticket.client_username(), Some("alice"));
		assert_eq!(ticket.client_realm(), Some("CORP.LOCAL"));
		assert_eq!(ticket.service_name(), "krbtgt/CORP.LOCAL");
		assert_eq!(ticket.get_session_key(), &sample_enc_part().key);
	}
}
