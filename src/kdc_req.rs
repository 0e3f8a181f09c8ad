use crate::error::{ExchangeError, Result};
use crate::principal::{krbtgt_principal, SPN};
use crate::user::KerberosUser;

use kerberos_asn1::KdcReqBody;
use kerberos_asn1::AsReq;
use kerberos_asn1::ApReq;
use kerberos_asn1::TgsReq;
use kerberos_asn1::PaData;
use kerberos_asn1::KerbPaPacRequest;
use kerberos_asn1::PaEncTsEnc;
use kerberos_asn1::EncryptedData;
use kerberos_asn1::EncryptionKey;
use kerberos_asn1::PrincipalName;
use kerberos_asn1::ApOptions;
use kerberos_asn1::Authenticator;
use kerberos_asn1::Ticket;
use kerberos_asn1::Asn1Object;

use kerberos_constants::kdc_options::{CANONICALIZE,FORWARDABLE,RENEWABLE,RENEWABLE_OK};
use kerberos_constants::message_types::{KRB_AS_REQ,KRB_AP_REQ,KRB_TGS_REQ};
use kerberos_constants::key_usages::{KEY_USAGE_AS_REQ_TIMESTAMP,KEY_USAGE_TGS_REQ_AUTHEN};
use kerberos_constants::etypes::RC4_HMAC;
use kerberos_constants::pa_data_types::{PA_PAC_REQUEST,PA_ENC_TIMESTAMP,PA_TGS_REQ};
use kerberos_constants::principal_names::NT_PRINCIPAL;
use kerberos_constants::protocol_version::PVNO;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use log::debug;

use rand;
use rand::Rng;

pub struct KdcRequestBuilder {
	body : KdcReqBody,
	padata : Vec<PaData>
}

impl KdcRequestBuilder {
	pub fn new() -> Self {
		Self {
			body: KdcReqBody::default(),
			padata: Vec::new()
		}
	}
}

impl Default for KdcRequestBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// Helper functions for KdcReqBody

impl KdcRequestBuilder {
	fn set_kdc_option(&mut self, option : u32) {
		self.body.kdc_options.flags |= option;
	}

	fn set_realm(&mut self, realm : &str) {
		self.body.realm = realm.to_string();
	}

	fn set_cname(&mut self, principal : PrincipalName) {
		self.body.cname = Some(principal);
	}

	fn set_sname(&mut self, principal : PrincipalName) {
		self.body.sname = Some(principal);
	}

	fn set_till(&mut self, time : DateTime<Utc>) {
		self.body.till = time.into();
	}

	fn set_rtime(&mut self, time : DateTime<Utc>) {
		self.body.rtime = Some(time.into());
	}

	fn set_nonce(&mut self) {
		self.body.nonce = rand::thread_rng().gen();
	}

	fn add_etype(&mut self, etype : i32) {
		if !self.body.etypes.contains(&etype) {
			self.body.etypes.push(etype);
		}
	}
}

// Helper functions for PaData

impl KdcRequestBuilder {
	fn request_pac(&mut self) {
		let pac_request = KerbPaPacRequest::new(true);
		let padata = PaData::new(PA_PAC_REQUEST, pac_request.build());
		self.padata.push(padata);
	}

	fn add_encrypted_timestamp(&mut self, user : &KerberosUser) -> Result<()> {
		let timestamp = PaEncTsEnc::from(Utc::now());
		let cipher = user.get_cipher()?;
		let key = user.encryption_key()?;
		let encrypted_timestamp = cipher.encrypt(&key, KEY_USAGE_AS_REQ_TIMESTAMP, &timestamp.build());
		let encrypted_data = EncryptedData::new(user.get_etype(), None, encrypted_timestamp);
		let padata = PaData::new(PA_ENC_TIMESTAMP, encrypted_data.build());
		self.padata.push(padata);
		Ok(())
	}

	fn add_apreq(&mut self, domain : &str, username : &str, ticket : &Ticket, session_key : &EncryptionKey) -> Result<()> {
		// Build an Authenticator for the ticket owner.
		let mut authenticator = Authenticator::default();
		authenticator.crealm = domain.to_string();
		authenticator.cname = PrincipalName {
			name_type: NT_PRINCIPAL,
			name_string: vec![username.to_string()]
		};

		// Encrypt the Authenticator with the session key of the ticket.
		let etype = session_key.keytype;
		let cipher = kerberos_crypto::new_kerberos_cipher(etype)
			.map_err(|_| ExchangeError::UnsupportedEncryptionType(etype))?;
		let encrypted_authenticator = cipher.encrypt(&session_key.keyvalue, KEY_USAGE_TGS_REQ_AUTHEN, &authenticator.build());
		let encrypted_data = EncryptedData {
			etype,
			kvno: None,
			cipher: encrypted_authenticator
		};

		let apreq = ApReq {
			pvno: PVNO,
			msg_type: KRB_AP_REQ,
			ap_options: ApOptions::default(),
			ticket: ticket.clone(),
			authenticator: encrypted_data
		};

		let padata = PaData::new(PA_TGS_REQ, apreq.build());
		self.padata.push(padata);
		Ok(())
	}
}

// ASREQ

impl KdcRequestBuilder {
	fn build_asreq_body(&mut self, user : &KerberosUser) {
		self.set_kdc_option(FORWARDABLE);
		self.set_kdc_option(RENEWABLE);
		self.set_kdc_option(RENEWABLE_OK);

		self.set_realm(&user.domain);
		self.set_cname(SPN::NtPrincipal(user.username.to_string()).to_principal_name());
		self.set_sname(krbtgt_principal(&user.domain));

		// Set expiry dates at some point in the future.
		let expiry = Utc::now() + Duration::days(90);
		self.set_till(expiry);
		self.set_rtime(expiry);

		self.set_nonce();

		// Only ask for the etype of our key, otherwise the reply could not be decrypted.
		self.add_etype(user.get_etype());
	}

	fn build_asreq_padata(&mut self, user : &KerberosUser) -> Result<()> {
		self.add_encrypted_timestamp(user)?;
		self.request_pac();
		Ok(())
	}

	pub fn build_asreq(mut self, user : &KerberosUser) -> Result<AsReq> {
		self.build_asreq_body(user);
		self.build_asreq_padata(user)?;

		Ok(AsReq {
			pvno: PVNO,
			msg_type: KRB_AS_REQ,
			padata: Some(self.padata),
			req_body: self.body
		})
	}
}

// TGSREQ

impl KdcRequestBuilder {
	fn build_tgsreq_body(&mut self, domain : &str, spn : &SPN, session_etype : i32, renewable : bool) {
		self.set_kdc_option(CANONICALIZE);
		self.set_kdc_option(FORWARDABLE);
		self.set_kdc_option(RENEWABLE_OK);
		if renewable {
			self.set_kdc_option(RENEWABLE);
		}

		self.set_realm(domain);
		self.set_sname(spn.to_principal_name());

		let expiry = Utc::now() + Duration::days(90);
		self.set_till(expiry);

		self.set_nonce();

		// Ask for the session key etype first, RC4 as a fallback.
		self.add_etype(session_etype);
		self.add_etype(RC4_HMAC);
	}

	pub fn build_tgsreq(mut self, domain : &str, username : &str, spn : &SPN, ticket : &Ticket, session_key : &EncryptionKey, renewable : bool) -> Result<TgsReq> {
		self.build_tgsreq_body(domain, spn, session_key.keytype, renewable);
		self.add_apreq(domain, username, ticket, session_key)?;

		Ok(TgsReq {
			pvno: PVNO,
			msg_type: KRB_TGS_REQ,
			padata: Some(self.padata),
			req_body: self.body
		})
	}
}

/// DER bytes of an AS-REQ with encrypted timestamp pre-authentication.
pub fn build_initial_request(user : &KerberosUser) -> Result<Vec<u8>> {
	let raw = KdcRequestBuilder::new().build_asreq(user)?.build();
	debug!("AS-REQ for '{}' is {} bytes", user, raw.len());
	Ok(raw)
}

/// DER bytes of a TGS-REQ for `service`, authenticated with an already held ticket.
pub fn build_service_request(domain : &str, username : &str, service : &str, ticket : &Ticket, session_key : &EncryptionKey, renewable : bool) -> Result<Vec<u8>> {
	let spn = SPN::NtSrvInst(service.to_string());
	let raw = KdcRequestBuilder::new().build_tgsreq(domain, username, &spn, ticket, session_key, renewable)?.build();
	debug!("TGS-REQ for '{}' is {} bytes", spn.to_string(), raw.len());
	Ok(raw)
}
