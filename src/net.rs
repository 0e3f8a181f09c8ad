use std::io;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::net::UdpSocket;
use std::time::Duration;

use log::debug;

/// Standard Kerberos port, both TCP and UDP.
pub const KERBEROS_PORT : u16 = 88;

const TIMEOUT : Duration = Duration::from_secs(5);

/// Anything able to deliver a raw Kerberos request to a KDC and hand back the raw reply.
pub trait KdcTransport {
	fn send_recv(&self, host : &str, port : u16, request : &[u8]) -> io::Result<Vec<u8>>;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransportProtocol {
	Tcp,
	Udp
}

pub fn new_transport(protocol : TransportProtocol) -> Box<dyn KdcTransport> {
	match protocol {
		TransportProtocol::Tcp => Box::new(TcpTransport),
		TransportProtocol::Udp => Box::new(UdpTransport)
	}
}

fn resolve(host : &str, port : u16) -> io::Result<SocketAddr> {
	let addr = (host, port).to_socket_addrs()?
		.next()
		.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no address found for {}", host)))?;
	debug!("Using domain controller: {} ({})", host, addr.ip());
	Ok(addr)
}

#[derive(Debug, Default)]
pub struct TcpTransport;

impl KdcTransport for TcpTransport {
	fn send_recv(&self, host : &str, port : u16, request : &[u8]) -> io::Result<Vec<u8>> {
		let addr = resolve(host, port)?;
		send_request(&addr, request)
	}
}

#[derive(Debug, Default)]
pub struct UdpTransport;

impl KdcTransport for UdpTransport {
	fn send_recv(&self, host : &str, port : u16, request : &[u8]) -> io::Result<Vec<u8>> {
		let addr = resolve(host, port)?;
		send_request_udp(&addr, request)
	}
}

fn calculate_big_endian_size(buf : &[u8]) -> io::Result<[u8;4]> {
	// Calculate the 4-byte big-endian size of a byte buffer.
	let size = u32::try_from(buf.len())
		.map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "request too big"))?;
	Ok(size.to_be_bytes())
}

pub fn pack_request(raw : &[u8]) -> io::Result<Vec<u8>> {
	// Over TCP the request is prefixed with 4 bytes holding its big-endian size.
	let mut request : Vec<u8> = Vec::with_capacity(raw.len() + 4);
	request.extend_from_slice(&calculate_big_endian_size(raw)?);
	request.extend_from_slice(raw);
	Ok(request)
}

pub fn send_request(server : &SocketAddr, request : &[u8]) -> io::Result<Vec<u8>> {
	let mut conn = TcpStream::connect_timeout(server, TIMEOUT)?;
	conn.set_read_timeout(Some(TIMEOUT))?;

	let packed_request = pack_request(request)?;
	conn.write_all(&packed_request)?;

	// Read the first 4 bytes to determine the size of the response.
	let mut size_buf : [u8;4] = [0;4];
	conn.read_exact(&mut size_buf)?;
	let size = u32::from_be_bytes(size_buf);

	let mut resp : Vec<u8> = vec![0; size as usize];
	conn.read_exact(&mut resp)?;

	Ok(resp)
}

pub fn send_request_udp(server : &SocketAddr, request : &[u8]) -> io::Result<Vec<u8>> {
	let socket = UdpSocket::bind("0.0.0.0:0")?;
	socket.set_read_timeout(Some(TIMEOUT))?;
	socket.connect(server)?;
	socket.send(request)?;

	// Grow the buffer until a peek no longer fills it, so the datagram is never truncated.
	let mut resp : Vec<u8> = vec![0; 2048];
	let mut size = socket.peek(&mut resp)?;
	while size == resp.len() {
		resp.resize(resp.len() * 2, 0);
		size = socket.peek(&mut resp)?;
	}

	let size = socket.recv(&mut resp)?;
	resp.truncate(size);
	Ok(resp)
}
