use kerberos_asn1::KrbError;
use kerberos_asn1::MethodData;
use kerberos_asn1::EtypeInfo;
use kerberos_asn1::EtypeInfo2;
use kerberos_asn1::Asn1Object;

use std::fmt;

/// A decoded KRB-ERROR. The raw code is always kept, even when there is no symbolic name for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolError {
	pub code : i32,
	pub name : Option<&'static str>,
	pub text : Option<String>,
	pub salt : Option<String>
}

impl ProtocolError {
	pub fn new(code : i32) -> Self {
		Self {
			code,
			name: error_name(code),
			text: None,
			salt: None
		}
	}

	pub fn symbolic_name(&self) -> &'static str {
		self.name.unwrap_or("UNKNOWN")
	}
}

impl From<&KrbError> for ProtocolError {
	fn from(krb_err : &KrbError) -> Self {
		Self {
			code: krb_err.error_code,
			name: error_name(krb_err.error_code),
			text: krb_err.e_text.clone(),
			salt: parse_salt(krb_err)
		}
	}
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}) : {}", self.code, self.symbolic_name())?;
		if let Some(text) = &self.text {
			write!(f, " ({})", text)?;
		}
		Ok(())
	}
}

const ERROR_NAMES : &[(i32, &str)] = &[
	(0, "KDC_ERR_NONE"),
	(1, "KDC_ERR_NAME_EXP"),
	(2, "KDC_ERR_SERVICE_EXP"),
	(3, "KDC_ERR_BAD_PVNO"),
	(4, "KDC_ERR_C_OLD_MAST_KVNO"),
	(5, "KDC_ERR_S_OLD_MAST_KVNO"),
	(6, "KDC_ERR_C_PRINCIPAL_UNKNOWN"),
	(7, "KDC_ERR_S_PRINCIPAL_UNKNOWN"),
	(8, "KDC_ERR_PRINCIPAL_NOT_UNIQUE"),
	(9, "KDC_ERR_NULL_KEY"),
	(10, "KDC_ERR_CANNOT_POSTDATE"),
	(11, "KDC_ERR_NEVER_VALID"),
	(12, "KDC_ERR_POLICY"),
	(13, "KDC_ERR_BADOPTION"),
	(14, "KDC_ERR_ETYPE_NOTSUPP"),
	(15, "KDC_ERR_SUMTYPE_NOSUPP"),
	(16, "KDC_ERR_PADATA_TYPE_NOSUPP"),
	(17, "KDC_ERR_TRTYPE_NO_SUPP"),
	(18, "KDC_ERR_CLIENT_REVOKED"),
	(19, "KDC_ERR_SERVICE_REVOKED"),
	(20, "KDC_ERR_TGT_REVOKED"),
	(21, "KDC_ERR_CLIENT_NOTYET"),
	(22, "KDC_ERR_SERVICE_NOTYET"),
	(23, "KDC_ERR_KEY_EXPIRED"),
	(24, "KDC_ERR_PREAUTH_FAILED"),
	(25, "KDC_ERR_PREAUTH_REQUIRED"),
	(26, "KDC_ERR_SERVER_NOMATCH"),
	(27, "KDC_ERR_MUST_USE_USER2USER"),
	(28, "KDC_ERR_PATH_NOT_ACCEPTED"),
	(29, "KDC_ERR_SVC_UNAVAILABLE"),
	(31, "KRB_AP_ERR_BAD_INTEGRITY"),
	(32, "KRB_AP_ERR_TKT_EXPIRED"),
	(33, "KRB_AP_ERR_TKT_NYV"),
	(34, "KRB_AP_ERR_REPEAT"),
	(35, "KRB_AP_ERR_NOT_US"),
	(36, "KRB_AP_ERR_BADMATCH"),
	(37, "KRB_AP_ERR_SKEW"),
	(38, "KRB_AP_ERR_BADADDR"),
	(39, "KRB_AP_ERR_BADVERSION"),
	(40, "KRB_AP_ERR_MSG_TYPE"),
	(41, "KRB_AP_ERR_MODIFIED"),
	(42, "KRB_AP_ERR_BADORDER"),
	(44, "KRB_AP_ERR_BADKEYVER"),
	(45, "KRB_AP_ERR_NOKEY"),
	(46, "KRB_AP_ERR_MUT_FAIL"),
	(47, "KRB_AP_ERR_BADDIRECTION"),
	(48, "KRB_AP_ERR_METHOD"),
	(49, "KRB_AP_ERR_BADSEQ"),
	(50, "KRB_AP_ERR_INAPP_CKSUM"),
	(51, "KRB_AP_PATH_NOT_ACCEPTED"),
	(52, "KRB_ERR_RESPONSE_TOO_BIG"),
	(60, "KRB_ERR_GENERIC"),
	(61, "KRB_ERR_FIELD_TOOLONG"),
	(62, "KDC_ERROR_CLIENT_NOT_TRUSTED"),
	(63, "KDC_ERROR_KDC_NOT_TRUSTED"),
	(64, "KDC_ERROR_INVALID_SIG"),
	(65, "KDC_ERR_KEY_TOO_WEAK"),
	(66, "KDC_ERR_CERTIFICATE_MISMATCH"),
	(67, "KRB_AP_ERR_NO_TGT"),
	(68, "KDC_ERR_WRONG_REALM"),
	(69, "KRB_AP_ERR_USER_TO_USER_REQUIRED"),
	(70, "KDC_ERR_CANT_VERIFY_CERTIFICATE"),
	(71, "KDC_ERR_INVALID_CERTIFICATE"),
	(72, "KDC_ERR_REVOKED_CERTIFICATE"),
	(73, "KDC_ERR_REVOCATION_STATUS_UNKNOWN"),
	(74, "KDC_ERR_REVOCATION_STATUS_UNAVAILABLE"),
	(75, "KDC_ERR_CLIENT_NAME_MISMATCH"),
	(76, "KDC_ERR_KDC_NAME_MISMATCH")
];

/// Symbolic RFC 4120 name of a KRB-ERROR code, if it has one.
pub fn error_name(code : i32) -> Option<&'static str> {
	ERROR_NAMES.iter()
		.find(|(c, _)| *c == code)
		.map(|(_, name)| *name)
}

pub fn parse_salt(krb_err : &KrbError) -> Option<String> {
	// Attempt to extract the salt that was expected by the KDC from the error data.
	// Some AD environments use 'samAccountName' for logins, but 'userPrincipalName' for the salt.
	let bytes = krb_err.e_data.as_ref()?;
	let (_, padatas) = MethodData::parse(bytes).ok()?;
	for padata in padatas {
		// Try to interpret each PaData in the e-data as both ETYPE-INFO and ETYPE-INFO2.
		if let Ok((_, etypeinfo)) = EtypeInfo::parse(&padata.padata_value) {
			// For ETypeInfoEntry, the salt is a Vec<u8>.
			if let Some(salt) = etypeinfo.first().and_then(|entry| entry.salt.as_ref()) {
				return Some(String::from_utf8_lossy(salt).to_string());
			}
		}
		if let Ok((_, etypeinfo)) = EtypeInfo2::parse(&padata.padata_value) {
			// For ETypeInfo2Entry, the salt is a String.
			if let Some(salt) = etypeinfo.first().and_then(|entry| entry.salt.as_ref()) {
				return Some(salt.to_string());
			}
		}
	}
	None
}
