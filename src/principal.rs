use kerberos_asn1::PrincipalName;
use kerberos_constants::principal_names::{NT_PRINCIPAL,NT_SRV_INST};

/// A principal name as typed on the command line, e.g. "alice" or "cifs/host1.corp.local".
pub enum SPN {
	NtPrincipal(String),
	NtSrvInst(String)
}

impl SPN {
	pub fn to_principal_name(&self) -> PrincipalName {
		match self {
			SPN::NtPrincipal(spn_string) => PrincipalName {
				name_type: NT_PRINCIPAL,
				name_string: split_spn(spn_string)
			},
			SPN::NtSrvInst(spn_string) => PrincipalName {
				name_type: NT_SRV_INST,
				name_string: split_spn(spn_string)
			}
		}
	}

	pub fn to_string(&self) -> String {
		match self {
			SPN::NtPrincipal(s) => s.to_string(),
			SPN::NtSrvInst(s) => s.to_string()
		}
	}
}

fn split_spn(spn : &str) -> Vec<String> {
	spn.split('/').map(|s| s.to_string()).collect()
}

/// "krbtgt/REALM", the service every AS-REQ asks for.
pub fn krbtgt_principal(realm : &str) -> PrincipalName {
	SPN::NtSrvInst(format!("krbtgt/{}", realm)).to_principal_name()
}

/// Joins the name components back into "part/part" form.
pub fn principal_to_string(principal : &PrincipalName) -> String {
	principal.name_string.join("/")
}

/// Splits a comma separated list of services, skipping empty entries.
pub fn split_services(services : &str) -> Vec<String> {
	services.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(|s| s.to_string())
		.collect()
}
