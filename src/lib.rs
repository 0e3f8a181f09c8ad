//! Kerberos AS and TGS exchanges against a KDC, with tickets returned as kirbi (KRB-CRED).

pub mod decrypt;
pub mod display;
pub mod error;
pub mod etype;
pub mod exchange;
pub mod inject;
pub mod kdc_err;
pub mod kdc_req;
pub mod kirbi;
pub mod locator;
pub mod logging;
pub mod net;
pub mod principal;
pub mod response;
pub mod ticket;
pub mod user;

#[cfg(test)]
mod testing;

pub use error::{ExchangeError, Result};
pub use exchange::{ClientCredential, ExchangeConfig, Exchanger, ServiceTicketBatch};
pub use kirbi::Kirbi;
pub use user::KerberosUser;
