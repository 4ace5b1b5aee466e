//! Binary codec for Open Sound Control (OSC 1.0) messages and bundles.
//!
//! Wire format of a message:
//! ```text
//! [address: OSC-string][type tags: OSC-string starting with ','][args...]
//! ```
//! An OSC-string is UTF-8 text followed by a NUL terminator and zero padding
//! up to the next multiple of 4 bytes.  Numeric arguments are 32-bit
//! big-endian.  `T` and `F` carry no payload bytes.
//!
//! Wire format of a bundle:
//! ```text
//! ["#bundle\0"][time tag: u64][size: u32][element]...[size: u32][element]
//! ```
//! Each element is itself a message or a nested bundle.

use std::fmt;

use thiserror::Error;

/// The OSC-string that opens every bundle.
pub const BUNDLE_TAG: &str = "#bundle";

/// The special time tag meaning "process immediately".
pub const TIME_TAG_IMMEDIATELY: u64 = 1;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum OscError {
    /// The byte slice is shorter than the element being read requires.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The address pattern does not start with `/`.
    #[error("invalid address pattern: {0:?}")]
    InvalidAddress(String),

    /// A string argument or address contains an interior NUL byte.
    #[error("OSC string contains an embedded NUL byte")]
    EmbeddedNul,

    /// No NUL terminator was found for the string starting at this offset.
    #[error("OSC string at offset {0} is not NUL terminated")]
    UnterminatedString(usize),

    /// The string starting at this offset is not valid UTF-8.
    #[error("invalid UTF-8 in OSC string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// The type tag string does not begin with `,`.
    #[error("type tag string must start with ','")]
    MissingTypeTags,

    /// A type tag this codec does not understand.
    #[error("unsupported type tag: '{0}'")]
    UnsupportedTypeTag(char),

    /// A bundle header or element size is inconsistent with the data.
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),
}

// ── Data types ────────────────────────────────────────────────────────────────

/// One typed OSC argument.
///
/// The variant *is* the type tag, so a message can never carry an argument
/// whose tag disagrees with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    /// Tag `s`: a UTF-8 string.
    String(String),
    /// Tag `f`: an IEEE 754 32-bit float.
    Float(f32),
    /// Tag `i`: a 32-bit two's-complement integer.
    Int(i32),
    /// Tag `T`: boolean true, no payload.
    True,
    /// Tag `F`: boolean false, no payload.
    False,
}

impl OscArg {
    /// Returns the single-character type tag for this argument.
    pub fn type_tag(&self) -> char {
        match self {
            OscArg::String(_) => 's',
            OscArg::Float(_) => 'f',
            OscArg::Int(_) => 'i',
            OscArg::True => 'T',
            OscArg::False => 'F',
        }
    }

    /// Returns the string payload, if this is a string argument.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscArg::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the float payload, if this is a float argument.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            OscArg::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for OscArg {
    fn from(s: &str) -> Self {
        OscArg::String(s.to_string())
    }
}

impl From<String> for OscArg {
    fn from(s: String) -> Self {
        OscArg::String(s)
    }
}

impl From<f32> for OscArg {
    fn from(v: f32) -> Self {
        OscArg::Float(v)
    }
}

impl From<i32> for OscArg {
    fn from(v: i32) -> Self {
        OscArg::Int(v)
    }
}

impl From<bool> for OscArg {
    fn from(v: bool) -> Self {
        if v {
            OscArg::True
        } else {
            OscArg::False
        }
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::String(s) => write!(f, "{s}"),
            OscArg::Float(v) => write!(f, "{v}"),
            OscArg::Int(v) => write!(f, "{v}"),
            OscArg::True => write!(f, "true"),
            OscArg::False => write!(f, "false"),
        }
    }
}

/// An address plus an ordered list of typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }
}

/// Either a single message or a time-tagged bundle of packets.
#[derive(Debug, Clone, PartialEq)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle {
        time_tag: u64,
        content: Vec<OscPacket>,
    },
}

impl OscPacket {
    /// Flattens the packet into its messages, depth first, in wire order.
    pub fn into_messages(self) -> Vec<OscMessage> {
        match self {
            OscPacket::Message(m) => vec![m],
            OscPacket::Bundle { content, .. } => content
                .into_iter()
                .flat_map(OscPacket::into_messages)
                .collect(),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`OscMessage`] into a datagram payload.
///
/// # Errors
///
/// Returns [`OscError::InvalidAddress`] if the address does not start with
/// `/`, or [`OscError::EmbeddedNul`] if any string contains a NUL byte.
///
/// # Examples
///
/// ```rust
/// use xyfi_core::protocol::osc::{decode_message, encode_message, OscArg, OscMessage};
///
/// let msg = OscMessage::new("/unity/touching", vec![OscArg::from("ABC"), OscArg::from("true")]);
/// let bytes = encode_message(&msg).unwrap();
/// assert_eq!(bytes.len() % 4, 0);
/// assert_eq!(decode_message(&bytes).unwrap(), msg);
/// ```
pub fn encode_message(msg: &OscMessage) -> Result<Vec<u8>, OscError> {
    if !msg.address.starts_with('/') {
        return Err(OscError::InvalidAddress(msg.address.clone()));
    }

    let mut buf = Vec::with_capacity(padded_len(msg.address.len() + 1) + 8 + msg.args.len() * 8);
    write_osc_string(&mut buf, &msg.address)?;

    let mut tags = String::with_capacity(msg.args.len() + 1);
    tags.push(',');
    tags.extend(msg.args.iter().map(OscArg::type_tag));
    write_osc_string(&mut buf, &tags)?;

    for arg in &msg.args {
        match arg {
            OscArg::String(s) => write_osc_string(&mut buf, s)?,
            OscArg::Float(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::True | OscArg::False => {} // tag only
        }
    }
    Ok(buf)
}

/// Encodes a message or bundle into a datagram payload.
///
/// # Errors
///
/// Propagates any [`OscError`] from the contained messages.
pub fn encode_packet(packet: &OscPacket) -> Result<Vec<u8>, OscError> {
    match packet {
        OscPacket::Message(m) => encode_message(m),
        OscPacket::Bundle { time_tag, content } => {
            let mut buf = Vec::new();
            write_osc_string(&mut buf, BUNDLE_TAG)?;
            buf.extend_from_slice(&time_tag.to_be_bytes());
            for element in content {
                let bytes = encode_packet(element)?;
                buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                buf.extend_from_slice(&bytes);
            }
            Ok(buf)
        }
    }
}

/// Decodes one [`OscMessage`] from `bytes`.
///
/// A message that ends right after its address (no type tag string) is
/// accepted as a message with no arguments, as OSC 1.0 asks of receivers.
/// Trailing bytes after the last argument are ignored.
///
/// # Errors
///
/// Returns [`OscError`] if the bytes are malformed.
pub fn decode_message(bytes: &[u8]) -> Result<OscMessage, OscError> {
    let (address, mut off) = read_osc_string(bytes, 0)?;
    if !address.starts_with('/') {
        return Err(OscError::InvalidAddress(address));
    }

    if off == bytes.len() {
        return Ok(OscMessage::new(address, Vec::new()));
    }

    let (tags, next) = read_osc_string(bytes, off)?;
    off = next;

    let mut chars = tags.chars();
    if chars.next() != Some(',') {
        return Err(OscError::MissingTypeTags);
    }

    let mut args = Vec::with_capacity(tags.len().saturating_sub(1));
    for tag in chars {
        let arg = match tag {
            's' => {
                let (s, next) = read_osc_string(bytes, off)?;
                off = next;
                OscArg::String(s)
            }
            'f' => {
                let bits = read_u32(bytes, off)?;
                off += 4;
                OscArg::Float(f32::from_bits(bits))
            }
            'i' => {
                let raw = read_u32(bytes, off)?;
                off += 4;
                OscArg::Int(raw as i32)
            }
            'T' => OscArg::True,
            'F' => OscArg::False,
            other => return Err(OscError::UnsupportedTypeTag(other)),
        };
        args.push(arg);
    }

    Ok(OscMessage::new(address, args))
}

/// Decodes a datagram that may hold either a message or a bundle.
///
/// # Errors
///
/// Returns [`OscError`] if the bytes are malformed.
pub fn decode_packet(bytes: &[u8]) -> Result<OscPacket, OscError> {
    match bytes.first() {
        Some(b'#') => decode_bundle(bytes),
        _ => decode_message(bytes).map(OscPacket::Message),
    }
}

// ── Bundle decoding ───────────────────────────────────────────────────────────

fn decode_bundle(bytes: &[u8]) -> Result<OscPacket, OscError> {
    let (tag, mut off) = read_osc_string(bytes, 0)?;
    if tag != BUNDLE_TAG {
        return Err(OscError::MalformedBundle(format!("unexpected header {tag:?}")));
    }

    let time_tag = read_u64(bytes, off)?;
    off += 8;

    let mut content = Vec::new();
    while off < bytes.len() {
        let size = read_u32(bytes, off)? as usize;
        off += 4;
        if size % 4 != 0 {
            return Err(OscError::MalformedBundle(format!(
                "element size {size} is not a multiple of 4"
            )));
        }
        if off + size > bytes.len() {
            return Err(OscError::MalformedBundle(format!(
                "element of {size} bytes at offset {off} exceeds datagram"
            )));
        }
        content.push(decode_packet(&bytes[off..off + size])?);
        off += size;
    }

    Ok(OscPacket::Bundle { time_tag, content })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

/// Rounds `len` up to the next multiple of 4.
fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Writes `s`, a NUL terminator, and zero padding to the next 4-byte boundary.
fn write_osc_string(buf: &mut Vec<u8>, s: &str) -> Result<(), OscError> {
    if s.as_bytes().contains(&0) {
        return Err(OscError::EmbeddedNul);
    }
    let start = buf.len();
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    buf.resize(start + padded_len(s.len() + 1), 0);
    Ok(())
}

/// Reads an OSC-string at `offset`.
/// Returns the string and the offset of the first byte after its padding.
fn read_osc_string(buf: &[u8], offset: usize) -> Result<(String, usize), OscError> {
    if offset >= buf.len() {
        return Err(OscError::InsufficientData {
            needed: offset + 4,
            available: buf.len(),
        });
    }
    let nul = buf[offset..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(OscError::UnterminatedString(offset))?;
    let s = std::str::from_utf8(&buf[offset..offset + nul])
        .map_err(|_| OscError::InvalidUtf8 { offset })?
        .to_string();
    let next = offset + padded_len(nul + 1);
    if next > buf.len() {
        return Err(OscError::InsufficientData {
            needed: next,
            available: buf.len(),
        });
    }
    Ok((s, next))
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32, OscError> {
    if buf.len() < offset + 4 {
        return Err(OscError::InsufficientData {
            needed: offset + 4,
            available: buf.len(),
        });
    }
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

fn read_u64(buf: &[u8], offset: usize) -> Result<u64, OscError> {
    let hi = read_u32(buf, offset)? as u64;
    let lo = read_u32(buf, offset + 4)? as u64;
    Ok((hi << 32) | lo)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Wire layout ───────────────────────────────────────────────────────────

    #[test]
    fn test_int_message_has_exact_wire_layout() {
        // Arrange
        let msg = OscMessage::new("/a", vec![OscArg::Int(1)]);

        // Act
        let bytes = encode_message(&msg).unwrap();

        // Assert: "/a\0\0" ",i\0\0" then 0x00000001
        assert_eq!(
            bytes,
            vec![b'/', b'a', 0, 0, b',', b'i', 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_float_is_big_endian_ieee754() {
        let msg = OscMessage::new("/f", vec![OscArg::Float(1.5)]);
        let bytes = encode_message(&msg).unwrap();
        // 1.5f32 == 0x3FC00000
        assert_eq!(&bytes[8..12], &[0x3F, 0xC0, 0x00, 0x00]);
    }

    #[test]
    fn test_string_of_three_chars_pads_to_four_bytes() {
        let msg = OscMessage::new("/s", vec![OscArg::from("ABC")]);
        let bytes = encode_message(&msg).unwrap();
        assert_eq!(&bytes[8..], b"ABC\0");
    }

    #[test]
    fn test_string_of_four_chars_pads_to_eight_bytes() {
        // A string that fills a whole word still needs its NUL terminator,
        // which spills into a fresh 4-byte word.
        let msg = OscMessage::new("/s", vec![OscArg::from("ABCD")]);
        let bytes = encode_message(&msg).unwrap();
        assert_eq!(&bytes[8..], b"ABCD\0\0\0\0");
    }

    #[test]
    fn test_type_tags_reflect_argument_order() {
        let msg = OscMessage::new(
            "/mixed",
            vec![
                OscArg::from("x"),
                OscArg::Float(0.0),
                OscArg::Int(7),
                OscArg::True,
                OscArg::False,
            ],
        );
        let bytes = encode_message(&msg).unwrap();
        // "/mixed\0\0" occupies 8 bytes; the tag string follows.
        assert_eq!(&bytes[8..16], b",sfiTF\0\0");
    }

    #[test]
    fn test_encoded_length_is_multiple_of_four() {
        for addr in ["/a", "/ab", "/abc", "/abcd", "/unity/pointing"] {
            let msg = OscMessage::new(addr, vec![OscArg::from("id")]);
            let bytes = encode_message(&msg).unwrap();
            assert_eq!(bytes.len() % 4, 0, "address {addr} produced unaligned payload");
        }
    }

    // ── Decoding ──────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_mixed_arguments() {
        let msg = OscMessage::new(
            "/pointingInUnity",
            vec![OscArg::from("R1"), OscArg::Int(-3), OscArg::Float(2.5), OscArg::True],
        );
        let bytes = encode_message(&msg).unwrap();
        assert_eq!(decode_message(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_decode_address_only_message_has_no_args() {
        // Arrange: legacy sender that omits the type tag string entirely.
        let bytes = b"/ping\0\0\0".to_vec();

        // Act
        let msg = decode_message(&bytes).unwrap();

        // Assert
        assert_eq!(msg.address, "/ping");
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_decode_empty_bytes_returns_insufficient_data() {
        let result = decode_message(&[]);
        assert!(matches!(result, Err(OscError::InsufficientData { .. })));
    }

    #[test]
    fn test_decode_unterminated_address_returns_error() {
        let result = decode_message(b"/abc");
        assert_eq!(result, Err(OscError::UnterminatedString(0)));
    }

    #[test]
    fn test_decode_address_without_slash_returns_error() {
        let result = decode_message(b"abc\0");
        assert!(matches!(result, Err(OscError::InvalidAddress(_))));
    }

    #[test]
    fn test_decode_missing_comma_returns_error() {
        let result = decode_message(b"/a\0\0si\0\0");
        assert_eq!(result, Err(OscError::MissingTypeTags));
    }

    #[test]
    fn test_decode_unknown_tag_returns_error() {
        let result = decode_message(b"/a\0\0,q\0\0");
        assert_eq!(result, Err(OscError::UnsupportedTypeTag('q')));
    }

    #[test]
    fn test_decode_truncated_float_returns_insufficient_data() {
        // Tag says one float follows, but only two bytes of it are present.
        let result = decode_message(b"/a\0\0,f\0\0\x3f\xc0");
        assert!(matches!(result, Err(OscError::InsufficientData { .. })));
    }

    #[test]
    fn test_decode_invalid_utf8_returns_error() {
        let result = decode_message(b"/a\0\0,s\0\0\xff\xfe\0\0");
        assert_eq!(result, Err(OscError::InvalidUtf8 { offset: 8 }));
    }

    // ── Encoding errors ───────────────────────────────────────────────────────

    #[test]
    fn test_encode_rejects_address_without_slash() {
        let msg = OscMessage::new("unity", vec![]);
        assert!(matches!(encode_message(&msg), Err(OscError::InvalidAddress(_))));
    }

    #[test]
    fn test_encode_rejects_embedded_nul() {
        let msg = OscMessage::new("/a", vec![OscArg::from("x\0y")]);
        assert_eq!(encode_message(&msg), Err(OscError::EmbeddedNul));
    }

    // ── Bundles ───────────────────────────────────────────────────────────────

    #[test]
    fn test_bundle_decodes_nested_messages_in_order() {
        // Arrange
        let first = OscMessage::new("/one", vec![OscArg::Int(1)]);
        let second = OscMessage::new("/two", vec![OscArg::from("b")]);
        let third = OscMessage::new("/three", vec![]);
        let packet = OscPacket::Bundle {
            time_tag: TIME_TAG_IMMEDIATELY,
            content: vec![
                OscPacket::Message(first.clone()),
                OscPacket::Bundle {
                    time_tag: 42,
                    content: vec![OscPacket::Message(second.clone())],
                },
                OscPacket::Message(third.clone()),
            ],
        };
        let bytes = encode_packet(&packet).unwrap();

        // Act
        let decoded = decode_packet(&bytes).unwrap();

        // Assert
        assert_eq!(decoded, packet);
        assert_eq!(decoded.into_messages(), vec![first, second, third]);
    }

    #[test]
    fn test_decode_packet_treats_plain_message_as_message() {
        let msg = OscMessage::new("/x", vec![OscArg::False]);
        let bytes = encode_message(&msg).unwrap();
        assert_eq!(decode_packet(&bytes).unwrap(), OscPacket::Message(msg));
    }

    #[test]
    fn test_bundle_with_oversized_element_returns_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"#bundle\0");
        bytes.extend_from_slice(&TIME_TAG_IMMEDIATELY.to_be_bytes());
        bytes.extend_from_slice(&64u32.to_be_bytes()); // claims 64 bytes, none follow
        assert!(matches!(decode_packet(&bytes), Err(OscError::MalformedBundle(_))));
    }

    #[test]
    fn test_bundle_with_wrong_header_returns_error() {
        let bytes = b"#bungle\0\0\0\0\0\0\0\0\x01".to_vec();
        assert!(matches!(decode_packet(&bytes), Err(OscError::MalformedBundle(_))));
    }

    // ── OscArg helpers ────────────────────────────────────────────────────────

    #[test]
    fn test_arg_from_bool_maps_to_tag_only_variants() {
        assert_eq!(OscArg::from(true), OscArg::True);
        assert_eq!(OscArg::from(false), OscArg::False);
    }

    #[test]
    fn test_arg_display_renders_payload() {
        assert_eq!(OscArg::from("R1").to_string(), "R1");
        assert_eq!(OscArg::Int(4).to_string(), "4");
        assert_eq!(OscArg::True.to_string(), "true");
    }
}
