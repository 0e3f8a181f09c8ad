//! End to end AS and TGS exchanges.
//!
//! Each exchange runs resolve, build, transmit, classify, decrypt, assemble and deliver in
//! order and stops at the first failure. Nothing is retried.

use crate::decrypt::decrypt_enc_part;
use crate::display::render_kirbi;
use crate::error::{ExchangeError, Result};
use crate::etype::{etype_name, ExchangeKind};
use crate::inject::TicketInjector;
use crate::kdc_err::ProtocolError;
use crate::kdc_req::{build_initial_request, build_service_request};
use crate::kirbi::Kirbi;
use crate::locator::DcLocator;
use crate::net::{KdcTransport, KERBEROS_PORT};
use crate::principal::split_services;
use crate::response::{classify, KdcResponse};
use crate::ticket::KerberosTicket;
use crate::user::KerberosUser;

use kerberos_asn1::EncryptionKey;
use kerberos_asn1::Ticket;

use log::{debug, info, warn};

/// Per exchange settings. The KDC is passed here explicitly, there is no process wide default.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
	/// KDC host name or address. When missing the DcLocator is asked.
	pub kdc : Option<String>,
	pub port : u16,
	/// Import the obtained tickets with the TicketInjector.
	pub ptt : bool,
	/// Target logon session for the import. Setting it implies `ptt`.
	pub luid : Option<u64>,
	/// Log the base64 kirbi once a ticket is obtained.
	pub display : bool,
	pub renewable : bool
}

impl Default for ExchangeConfig {
	fn default() -> Self {
		Self {
			kdc: None,
			port: KERBEROS_PORT,
			ptt: false,
			luid: None,
			display: false,
			renewable: false
		}
	}
}

impl ExchangeConfig {
	/// Import is requested by `ptt` or by a non zero logon session.
	pub fn wants_import(&self) -> bool {
		self.ptt || self.luid.is_some_and(|luid| luid != 0)
	}
}

/// Identity, ticket and session key used to authenticate a TGS-REQ.
#[derive(Debug, Clone)]
pub struct ClientCredential {
	pub domain : String,
	pub username : String,
	pub ticket : Ticket,
	pub session_key : EncryptionKey
}

impl ClientCredential {
	pub fn from_ticket(ticket : &KerberosTicket) -> Result<Self> {
		let username = ticket.client_username()
			.ok_or_else(|| ExchangeError::InvalidCredential("ticket info has no client name".to_string()))?;
		let domain = ticket.client_realm()
			.ok_or_else(|| ExchangeError::InvalidCredential("ticket info has no client realm".to_string()))?;

		Ok(Self {
			domain: domain.to_string(),
			username: username.to_string(),
			ticket: ticket.ticket.clone(),
			session_key: ticket.get_session_key().clone()
		})
	}

	/// Takes everything from the first entry of the container.
	pub fn from_kirbi(kirbi : &Kirbi) -> Result<Self> {
		let first = kirbi.first()
			.ok_or_else(|| ExchangeError::InvalidCredential("the kirbi holds no tickets".to_string()))?;
		Self::from_ticket(&first)
	}
}

/// Result of one service inside a batch.
#[derive(Debug)]
pub struct ServiceOutcome {
	pub service : String,
	pub result : Result<Kirbi>
}

/// Outcomes of a multi service request, in the order the services were given.
#[derive(Debug, Default)]
pub struct ServiceTicketBatch {
	pub outcomes : Vec<ServiceOutcome>
}

impl ServiceTicketBatch {
	pub fn succeeded(&self) -> usize {
		self.outcomes.iter().filter(|o| o.result.is_ok()).count()
	}

	pub fn failures(&self) -> impl Iterator<Item = (&str, &ExchangeError)> {
		self.outcomes.iter().filter_map(|o| match &o.result {
			Ok(_) => None,
			Err(e) => Some((o.service.as_str(), e))
		})
	}

	/// Every ticket obtained, accumulated into one container.
	pub fn into_kirbi(self) -> Kirbi {
		let mut kirbi = Kirbi::new();
		for outcome in self.outcomes {
			if let Ok(tickets) = outcome.result {
				kirbi.merge(tickets);
			}
		}
		kirbi
	}
}

/// Runs exchanges against a KDC through the given collaborators. Holds no state between calls.
pub struct Exchanger<'a> {
	transport : &'a dyn KdcTransport,
	locator : &'a dyn DcLocator,
	injector : Option<&'a dyn TicketInjector>,
	config : ExchangeConfig
}

impl<'a> Exchanger<'a> {
	pub fn new(transport : &'a dyn KdcTransport, locator : &'a dyn DcLocator, config : ExchangeConfig) -> Self {
		Self {
			transport,
			locator,
			injector: None,
			config
		}
	}

	pub fn with_injector(mut self, injector : &'a dyn TicketInjector) -> Self {
		self.injector = Some(injector);
		self
	}

	pub fn config(&self) -> &ExchangeConfig {
		&self.config
	}
}

// Steps shared by both exchanges

impl<'a> Exchanger<'a> {
	fn resolve_kdc(&self, realm : &str) -> Result<String> {
		if let Some(kdc) = self.config.kdc.as_ref().filter(|k| !k.is_empty()) {
			return Ok(kdc.to_string());
		}
		self.locator.resolve_default_controller(realm)
			.ok_or_else(|| ExchangeError::ResolutionFailure(realm.to_string()))
	}

	fn transmit(&self, host : &str, request : &[u8]) -> Result<KdcResponse> {
		let port = self.config.port;
		let response = self.transport.send_recv(host, port, request)
			.map_err(|source| ExchangeError::TransportFailure {
				host: host.to_string(),
				port,
				source
			})?;

		if response.is_empty() {
			return Err(ExchangeError::TransportFailure {
				host: host.to_string(),
				port,
				source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "empty response")
			});
		}

		debug!("Received {} bytes from {}:{}", response.len(), host, port);
		classify(&response)
	}

	fn deliver(&self, kirbi : &Kirbi) {
		let kirbi_bytes = kirbi.to_bytes();

		if self.config.display {
			info!("base64(ticket.kirbi):\n\n{}\n", render_kirbi(&kirbi_bytes));
		}

		if !self.config.wants_import() {
			return;
		}

		match self.injector {
			Some(injector) => match injector.import_credential(&kirbi_bytes, self.config.luid) {
				Ok(()) => info!("Ticket successfully imported!"),
				Err(e) => warn!("Ticket import failed: {}", e)
			},
			None => warn!("Ticket import requested but no injector is configured")
		}
	}
}

fn reject(kind : ExchangeKind, response : KdcResponse) -> ExchangeError {
	match response {
		KdcResponse::KrbError(krb_err) => {
			let error = ProtocolError::from(&krb_err);
			if let Some(salt) = &error.salt {
				debug!("KDC expects the salt '{}'", salt);
			}
			ExchangeError::ProtocolError(error)
		},
		KdcResponse::Unrecognized(tag) => ExchangeError::UnrecognizedResponse(tag),
		other => ExchangeError::UnexpectedReply {
			sent: kind.request_name(),
			received: other.name()
		}
	}
}

// AS exchange

impl<'a> Exchanger<'a> {
	/// Asks a TGT for `user` with encrypted timestamp pre-authentication.
	pub fn request_initial_ticket(&self, user : &KerberosUser) -> Result<Kirbi> {
		info!("Action: Ask TGT");
		let host = self.resolve_kdc(&user.domain)?;

		let etype = user.get_etype();
		if self.config.display {
			info!("Using {} hash: {}", etype_name(etype), user.key_string()?);
		}
		if let Some(luid) = self.config.luid {
			info!("Target LUID : 0x{:x}", luid);
		}

		info!("Building AS-REQ (w/ preauth) for: '{}'", user);
		let request = build_initial_request(user)?;

		let asrep = match self.transmit(&host, &request)? {
			KdcResponse::AsRep(asrep) => asrep,
			other => {
				let error = reject(ExchangeKind::Initial, other);
				warn!("TGT request for '{}' failed: {}", user, error);
				return Err(error);
			}
		};
		info!("TGT request successful!");

		let enc_part = {
			let key = user.encryption_key()?;
			decrypt_enc_part(ExchangeKind::Initial, etype, &key, &asrep.enc_part.cipher)?
		};

		let kirbi = Kirbi::from(KerberosTicket::from_asrep(asrep, &enc_part));
		self.deliver(&kirbi);
		Ok(kirbi)
	}
}

// TGS exchange

impl<'a> Exchanger<'a> {
	/// Asks a service ticket for `service` using an already held ticket and its session key.
	pub fn request_service_ticket(&self, credential : &ClientCredential, service : &str) -> Result<Kirbi> {
		info!("Action: Ask TGS");
		let host = self.resolve_kdc(&credential.domain)?;

		info!("Building TGS-REQ request for: '{}'", service);
		let request = build_service_request(
			&credential.domain,
			&credential.username,
			service,
			&credential.ticket,
			&credential.session_key,
			self.config.renewable
		)?;

		let tgsrep = match self.transmit(&host, &request)? {
			KdcResponse::TgsRep(tgsrep) => tgsrep,
			other => {
				let error = reject(ExchangeKind::Service, other);
				warn!("TGS request for '{}' failed: {}", service, error);
				return Err(error);
			}
		};
		info!("TGS request successful!");

		let session_key = &credential.session_key;
		let enc_part = decrypt_enc_part(ExchangeKind::Service, session_key.keytype, &session_key.keyvalue, &tgsrep.enc_part.cipher)?;

		let kirbi = Kirbi::from(KerberosTicket::from_tgsrep(tgsrep, &enc_part));
		self.deliver(&kirbi);
		Ok(kirbi)
	}

	/// Requests every service of a comma separated list with the first ticket of `kirbi`.
	/// Services are independent: a failure is recorded and the next service is still asked.
	pub fn request_service_tickets(&self, kirbi : &Kirbi, services : &str) -> Result<ServiceTicketBatch> {
		let credential = ClientCredential::from_kirbi(kirbi)?;
		let mut batch = ServiceTicketBatch::default();

		for service in split_services(services) {
			let result = self.request_service_ticket(&credential, &service);
			batch.outcomes.push(ServiceOutcome { service, result });
		}

		Ok(batch)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::locator::StaticDcLocator;
	use std::cell::Cell;
	use std::io;

	struct CountingTransport {
		calls : Cell<usize>,
		response : Option<Vec<u8>>
	}

	impl KdcTransport for CountingTransport {
		fn send_recv(&self, _host : &str, port : u16, _request : &[u8]) -> io::Result<Vec<u8>> {
			assert_eq!(port, KERBEROS_PORT);
			self.calls.set(self.calls.get() + 1);
			self.response.clone().ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
		}
	}

	fn alice() -> KerberosUser {
		KerberosUser::from_hex_key("CORP.LOCAL", "alice", "00112233445566778899aabbccddeeff").unwrap()
	}

	#[test]
	fn no_kdc_and_no_locator_answer_fails_resolution() {
		let transport = CountingTransport { calls: Cell::new(0), response: None };
		let locator = StaticDcLocator::new(None);
		let exchanger = Exchanger::new(&transport, &locator, ExchangeConfig::default());

		let result = exchanger.request_initial_ticket(&alice());
		assert!(matches!(result, Err(ExchangeError::ResolutionFailure(_))));
		assert_eq!(transport.calls.get(), 0);
	}

	#[test]
	fn transport_error_is_reported() {
		let transport = CountingTransport { calls: Cell::new(0), response: None };
		let locator = StaticDcLocator::new(Some("dc01.corp.local".to_string()));
		let exchanger = Exchanger::new(&transport, &locator, ExchangeConfig::default());

		let result = exchanger.request_initial_ticket(&alice());
		assert!(result.as_ref().is_err_and(|e| e.is_transport_failure()));
		assert_eq!(transport.calls.get(), 1);
	}

	#[test]
	fn empty_response_is_a_transport_failure() {
		let transport = CountingTransport { calls: Cell::new(0), response: Some(Vec::new()) };
		let locator = StaticDcLocator::new(None);
		let config = ExchangeConfig {
			kdc: Some("10.0.0.1".to_string()),
			..ExchangeConfig::default()
		};
		let exchanger = Exchanger::new(&transport, &locator, config);

		let result = exchanger.request_initial_ticket(&alice());
		assert!(result.as_ref().is_err_and(|e| e.is_transport_failure()));
	}

	#[test]
	fn empty_kirbi_cannot_drive_a_tgs_request() {
		let transport = CountingTransport { calls: Cell::new(0), response: None };
		let locator = StaticDcLocator::new(Some("dc01".to_string()));
		let exchanger = Exchanger::new(&transport, &locator, ExchangeConfig::default());

		let result = exchanger.request_service_tickets(&Kirbi::new(), "cifs/host1");
		assert!(matches!(result, Err(ExchangeError::InvalidCredential(_))));
		assert_eq!(transport.calls.get(), 0);
	}

	#[test]
	fn luid_implies_import() {
		let mut config = ExchangeConfig::default();
		assert!(!config.wants_import());
		config.luid = Some(0);
		assert!(!config.wants_import());
		config.luid = Some(0x3e7);
		assert!(config.wants_import());
	}
}
