use krbask::exchange::{ExchangeConfig, Exchanger};
use krbask::inject::CcacheInjector;
use krbask::kirbi::Kirbi;
use krbask::locator::RealmDcLocator;
use krbask::logging::setup_logging;
use krbask::net::{new_transport, TransportProtocol};

use clap::{arg, value_parser, ArgAction, ArgMatches, Command};

use std::path::Path;
use std::process::ExitCode;

/// A tool to request service tickets with an existing TGT and dump them to a KIRBI file.

fn load_ticket(raw : &str) -> Result<Kirbi, String> {
	// Either a path to a kirbi file or the base64 of one.
	if Path::new(raw).is_file() {
		let bytes = std::fs::read(raw).map_err(|e| format!("Failed to read '{}': {}", raw, e))?;
		return Kirbi::from_bytes(&bytes).map_err(|e| e.to_string());
	}
	Kirbi::from_base64(raw).map_err(|e| e.to_string())
}

fn config_from_args(matches : &ArgMatches) -> ExchangeConfig {
	let mut config = ExchangeConfig {
		kdc: matches.get_one::<String>("kdc").cloned(),
		ptt: matches.get_flag("ptt"),
		display: !matches.get_flag("nodisplay"),
		renewable: matches.get_flag("renewable"),
		..ExchangeConfig::default()
	};
	if let Some(port) = matches.get_one::<u16>("port") {
		config.port = *port;
	}
	config
}

fn ask_tgs(matches : &ArgMatches) -> Result<(), String> {
	let ticket = matches.get_one::<String>("ticket").ok_or("missing --ticket")?;
	let services = matches.get_one::<String>("service").ok_or("missing --service")?;
	let tgt = load_ticket(ticket)?;
	let config = config_from_args(matches);

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

	let batch = exchanger.request_service_tickets(&tgt, services).map_err(|e| e.to_string())?;
	for (service, error) in batch.failures() {
		println!("[-] {}: {}", service, error);
	}
	if batch.succeeded() == 0 {
		return Err("No service ticket was obtained.".to_string());
	}

	let kirbi = batch.into_kirbi();
	if let Some(path) = matches.get_one::<String>("outfile") {
		std::fs::write(path, kirbi.to_bytes()).map_err(|e| format!("Failed to write '{}': {}", path, e))?;
		println!("[!] {} ticket(s) written to '{}'", kirbi.len(), path);
	}
	Ok(())
}

fn command() -> Command {
	Command::new("AskTgs")
		.about("A tool to request service tickets with an existing TGT and dump them to a KIRBI file.")
		.arg(arg!(--ticket <TICKET>).short('t').required(true).help("TGT to use, as a KIRBI file path or base64 string."))
		.arg(arg!(--service <SPNS>).short('S').required(true).help("Comma separated service principal names to request tickets for."))
		.arg(arg!(--outfile <PATH>).short('O').required(false).help("Output path to write the requested tickets to (in KIRBI format)."))
		.arg(arg!(--kdc <HOST>).short('K').required(false).help("IP address or hostname for the KDC, if different from the domain."))
		.arg(arg!(--port <PORT>).short('P').required(false).value_parser(value_parser!(u16)).help("Port number to use for the KDC, if different from the default port."))
		.arg(arg!(--ptt).action(ArgAction::SetTrue).help("Import the tickets into the credential cache named by KRB5CCNAME."))
		.arg(arg!(--renewable).action(ArgAction::SetTrue).help("Ask for renewable service tickets."))
		.arg(arg!(--nodisplay).action(ArgAction::SetTrue).help("Do not print the base64 KIRBI of every ticket."))
		.arg(arg!(--udp).action(ArgAction::SetTrue).help("Talk to the KDC over UDP instead of TCP."))
		.arg(arg!(--verbose).short('v').action(ArgAction::SetTrue).help("Enable debug logging."))
}

fn main() -> ExitCode {
	let matches = command().get_matches();

	if let Err(e) = setup_logging(matches.get_flag("verbose")) {
		eprintln!("[-] {}", e);
	}

	match ask_tgs(&matches) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			println!("[-] {}", e);
			ExitCode::FAILURE
		}
	}
}
