use krbask::exchange::{ExchangeConfig, Exchanger};
use krbask::inject::CcacheInjector;
use krbask::kirbi::Kirbi;
use krbask::locator::RealmDcLocator;
use krbask::logging::setup_logging;
use krbask::net::{new_transport, TransportProtocol};
use krbask::user::KerberosUser;

use clap::{arg, value_parser, ArgAction, ArgMatches, Command};

use std::process::ExitCode;

/// A tool to request a TGT from the KDC and dump it to a KIRBI file.

fn user_from_args(matches : &ArgMatches) -> Result<KerberosUser, String> {
	let domain = matches.get_one::<String>("domain").ok_or("missing --domain")?;
	let username = matches.get_one::<String>("user").ok_or("missing --user")?;

	// If a password (with optional salt) was provided.
	if let Some(password) = matches.get_one::<String>("password") {
		let salt = matches.get_one::<String>("salt").map(String::as_str);
		return KerberosUser::from_password(domain, username, password, salt).map_err(|e| e.to_string());
	}

	// Otherwise an NTLM hash or AES256 key, the length decides.
	match matches.get_one::<String>("ntlm").or(matches.get_one::<String>("key")) {
		Some(hex_key) => KerberosUser::from_hex_key(domain, username, hex_key).map_err(|e| e.to_string()),
		None => Err("You must provide one of the following: --password, --ntlm, or --key.".to_string())
	}
}

fn parse_luid(raw : &str) -> Result<u64, String> {
	let digits = raw.trim_start_matches("0x").trim_start_matches("0X");
	u64::from_str_radix(digits, 16).map_err(|e| format!("invalid LUID '{}': {}", raw, e))
}

fn config_from_args(matches : &ArgMatches) -> Result<ExchangeConfig, String> {
	let mut config = ExchangeConfig {
		kdc: matches.get_one::<String>("kdc").cloned(),
		ptt: matches.get_flag("ptt"),
		display: matches.get_flag("display"),
		..ExchangeConfig::default()
	};
	if let Some(port) = matches.get_one::<u16>("port") {
		config.port = *port;
	}
	if let Some(luid) = matches.get_one::<String>("luid") {
		config.luid = Some(parse_luid(luid)?);
	}
	Ok(config)
}

fn ask_tgt(matches : &ArgMatches) -> Result<(), String> {
	let user = user_from_args(matches)?;
	let config = config_from_args(matches)?;

	let protocol = if matches.get_flag("udp") { TransportProtocol::Udp } else { TransportProtocol::Tcp };
	let transport = new_transport(protocol);
	let locator = RealmDcLocator;
	let injector = match config.wants_import() {
		true => Some(CcacheInjector::from_env().map_err(|e| e.to_string())?),
		false => None
	};

	let mut exchanger = Exchanger::new(transport.as_ref(), &locator, config);
	if let Some(injector) = &injector {
		exchanger = exchanger.with_injector(injector);
	}

	let kirbi : Kirbi = exchanger.request_initial_ticket(&user).map_err(|e| e.to_string())?;

	if let Some(path) = matches.get_one::<String>("outfile") {
		std::fs::write(path, kirbi.to_bytes()).map_err(|e| format!("Failed to write '{}': {}", path, e))?;
		println!("[!] Written to '{}'", path);
	}
	Ok(())
}

fn command() -> Command {
	Command::new("krbask")
		.about("A tool to request a TGT from the KDC and dump it to a KIRBI file.")
		.arg(arg!(--domain <DOMAIN>).short('d').required(true).help("Domain/realm to authenticate to."))
		.arg(arg!(--user <USER>).short('u').required(true).help("Username to authenticate with."))
		.arg(arg!(--password <PASSWORD>).short('p').required(false).help("Password to authenticate with."))
		.arg(arg!(--ntlm <HASH>).short('n').required(false).help("NTLM hash to authenticate with."))
		.arg(arg!(--key <KEY>).short('k').required(false).help("256-bit AES key to authenticate with."))
		.arg(arg!(--salt <SALT>).short('s').required(false).help("Custom salt to be used with the password (optional)."))
		.arg(arg!(--outfile <PATH>).short('O').required(false).help("Output path to write the ticket to (in KIRBI format)."))
		.arg(arg!(--kdc <HOST>).short('K').required(false).help("IP address or hostname for the KDC, if different from the domain."))
		.arg(arg!(--port <PORT>).short('P').required(false).value_parser(value_parser!(u16)).help("Port number to use for the KDC, if different from the default port."))
		.arg(arg!(--luid <LUID>).required(false).help("Logon session to import the ticket into (hex)."))
		.arg(arg!(--ptt).action(ArgAction::SetTrue).help("Import the ticket into the credential cache named by KRB5CCNAME."))
		.arg(arg!(--display).action(ArgAction::SetTrue).help("Print the base64 KIRBI and the key in use."))
		.arg(arg!(--udp).action(ArgAction::SetTrue).help("Talk to the KDC over UDP instead of TCP."))
		.arg(arg!(--verbose).short('v').action(ArgAction::SetTrue).help("Enable debug logging."))
}

fn main() -> ExitCode {
	let matches = command().get_matches();

	if let Err(e) = setup_logging(matches.get_flag("verbose")) {
		eprintln!("[-] {}", e);
	}

	match ask_tgt(&matches) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			println!("[-] {}", e);
			ExitCode::FAILURE
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config_for(extra : &[&str]) -> ExchangeConfig {
		let mut argv = vec!["krbask", "-d", "corp.local", "-u", "alice", "-n", "00112233445566778899aabbccddeeff"];
		argv.extend_from_slice(extra);
		config_from_args(&command().try_get_matches_from(argv).unwrap()).unwrap()
	}

	#[test]
	fn zero_luid_does_not_request_import() {
		assert!(!config_for(&["--luid", "0"]).wants_import());
		assert!(!config_for(&[]).wants_import());
	}

	#[test]
	fn luid_or_ptt_request_import() {
		let config = config_for(&["--luid", "0x3e7"]);
		assert_eq!(config.luid, Some(0x3e7));
		assert!(config.wants_import());
		assert!(config_for(&["--ptt"]).wants_import());
	}

	#[test]
	fn display_is_opt_in() {
		assert!(!config_for(&[]).display);
		assert!(config_for(&["--display"]).display);
	}
}
