//! The KRB-CRED container ("kirbi") tickets end up in.

use crate::error::{ExchangeError, Result};
use crate::ticket::KerberosTicket;

use kerberos_asn1::Asn1Object;
use kerberos_asn1::EncKrbCredPart;
use kerberos_asn1::EncryptedData;
use kerberos_asn1::KrbCred;
use kerberos_asn1::KrbCredInfo;
use kerberos_asn1::Ticket;

use kerberos_constants::etypes::NO_ENCRYPTION;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Tickets and their KrbCredInfo, kept index aligned: the i-th info describes the i-th ticket.
#[derive(Debug, Clone, Default)]
pub struct Kirbi {
	tickets : Vec<Ticket>,
	infos : Vec<KrbCredInfo>
}

impl Kirbi {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, ticket : KerberosTicket) {
		self.tickets.push(ticket.ticket);
		self.infos.push(ticket.cred_info);
	}

	/// Appends every entry of `other`, keeping its order.
	pub fn merge(&mut self, other : Kirbi) {
		self.tickets.extend(other.tickets);
		self.infos.extend(other.infos);
	}

	pub fn len(&self) -> usize {
		self.tickets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tickets.is_empty()
	}

	pub fn tickets(&self) -> &[Ticket] {
		&self.tickets
	}

	pub fn infos(&self) -> &[KrbCredInfo] {
		&self.infos
	}

	pub fn get(&self, index : usize) -> Option<KerberosTicket> {
		let ticket = self.tickets.get(index)?;
		let info = self.infos.get(index)?;
		Some(KerberosTicket::new(ticket.clone(), info.clone()))
	}

	pub fn first(&self) -> Option<KerberosTicket> {
		self.get(0)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Ticket, &KrbCredInfo)> {
		self.tickets.iter().zip(self.infos.iter())
	}
}

// Encoding

impl Kirbi {
	pub fn to_krb_cred(&self) -> KrbCred {
		let mut cred_part = EncKrbCredPart::default();
		cred_part.ticket_info = self.infos.clone();

		let mut krb_cred = KrbCred::default();
		krb_cred.tickets = self.tickets.clone();
		krb_cred.enc_part = EncryptedData::new(NO_ENCRYPTION, None, cred_part.build());
		krb_cred
	}

	/// DER bytes of the KRB-CRED, the same container always gives the same bytes.
	pub fn to_bytes(&self) -> Vec<u8> {
		self.to_krb_cred().build()
	}

	pub fn to_base64(&self) -> String {
		STANDARD.encode(self.to_bytes())
	}

	/// Only plain text credentials can be read, an encrypted EncKrbCredPart is rejected.
	pub fn from_krb_cred(krb_cred : KrbCred) -> Result<Self> {
		if krb_cred.enc_part.etype != NO_ENCRYPTION {
			return Err(ExchangeError::InvalidCredential(format!("credential part is encrypted with etype {}", krb_cred.enc_part.etype)));
		}

		let (_, cred_part) = EncKrbCredPart::parse(&krb_cred.enc_part.cipher)
			.map_err(|e| ExchangeError::InvalidCredential(format!("unable to decode EncKrbCredPart: {:?}", e)))?;

		if cred_part.ticket_info.len() != krb_cred.tickets.len() {
			return Err(ExchangeError::InvalidCredential(format!(
				"{} tickets but {} ticket infos",
				krb_cred.tickets.len(),
				cred_part.ticket_info.len()
			)));
		}

		Ok(Self {
			tickets: krb_cred.tickets,
			infos: cred_part.ticket_info
		})
	}

	pub fn from_bytes(raw : &[u8]) -> Result<Self> {
		let (_, krb_cred) = KrbCred::parse(raw)
			.map_err(|e| ExchangeError::InvalidCredential(format!("unable to decode KRB-CRED: {:?}", e)))?;
		Self::from_krb_cred(krb_cred)
	}

	pub fn from_base64(encoded : &str) -> Result<Self> {
		let compact : String = encoded.split_whitespace().collect();
		let raw = STANDARD.decode(compact)
			.map_err(|e| ExchangeError::InvalidCredential(format!("invalid base64: {}", e)))?;
		Self::from_bytes(&raw)
	}
}

impl From<KerberosTicket> for Kirbi {
	fn from(ticket : KerberosTicket) -> Self {
		let mut kirbi = Self::new();
		kirbi.push(ticket);
		kirbi
	}
}
