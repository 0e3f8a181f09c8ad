use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const LINE_WIDTH : usize = 80;

const INDENT : &str = "      ";

/// Splits base64 text into lines of at most `width` characters.
pub fn wrap_base64(encoded : &str, width : usize) -> Vec<&str> {
	// base64 output is ASCII, so byte offsets are char boundaries.
	let width = width.max(1);
	(0..encoded.len())
		.step_by(width)
		.map(|start| &encoded[start..(start + width).min(encoded.len())])
		.collect()
}

/// The base64 of a serialized kirbi as a block of indented 80 column lines.
pub fn render_kirbi(kirbi_bytes : &[u8]) -> String {
	let encoded = STANDARD.encode(kirbi_bytes);
	wrap_base64(&encoded, LINE_WIDTH)
		.iter()
		.map(|line| format!("{}{}", INDENT, line))
		.collect::<Vec<String>>()
		.join("\n")
}
