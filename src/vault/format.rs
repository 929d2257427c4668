//! Binary payload that lives inside the encrypted envelope.
//!
//! ```text
//! [version: u16][group_header_len: u32][group header][entry packet]*
//!
//! group header entry : [path_len: u16][path][pointer: u16]
//! entry packet       : [packet_len: u24]
//!                      [name_len: u8][name][user_len: u8][user]
//!                      [pass_len: u16][pass][email_len: u8][email]
//!                      [url_len: u8][url][group_ptr: u16]
//!                      [created: u64][modified: u64][comment ...]
//! ```
//!
//! Protocol version 1 is still readable: it carries a 1-byte entry type
//! after the url, and 4-byte timestamps.  Only version 2 is written.
//!
//! Decoding is all-or-nothing.  Any malformed field, unknown group
//! pointer, bad group path or duplicate `group/name` discards the whole
//! payload and surfaces as `StrongboxError::CorruptedVault`.

use std::collections::HashMap;

use tracing::debug;

use super::bytes::{put_num, put_prefixed, ByteReader, CodecError};
use super::entry::{Entry, MAX_LONG_FIELD};
use super::groups::{self, GroupMap};
use crate::errors::{Result, StrongboxError};

/// Version written by `encode_payload`.
pub const PROTOCOL_VERSION: u16 = 2;

/// Oldest version `decode_payload` still understands.
pub const LEGACY_PROTOCOL_VERSION: u16 = 1;

/// Byte widths of the framed fields.
const VERSION_WIDTH: usize = 2;
const GROUP_HEADER_WIDTH: usize = 4;
const PACKET_WIDTH: usize = 3;
const GROUP_PATH_WIDTH: usize = 2;
const POINTER_WIDTH: usize = 2;

/// Why a payload was rejected.  Kept internal: callers only ever see
/// the generic `CorruptedVault` error.
#[derive(Debug, thiserror::Error)]
enum Corruption {
    #[error("truncated field: {0}")]
    Truncated(#[from] CodecError),
    #[error("unsupported protocol version {0}")]
    Version(u16),
    #[error("group header length mismatch")]
    GroupHeader,
    #[error("group pointer {0} is defined more than once")]
    DuplicatePointer(u16),
    #[error("group path is defined more than once")]
    DuplicatePath,
    #[error("group path attached to pointer 0")]
    ZeroPointer,
    #[error("entry references unknown group pointer {0}")]
    UnknownPointer(u16),
    #[error("invalid group path")]
    GroupPath,
    #[error("empty entry name")]
    EmptyName,
    #[error("entry name contains '/'")]
    SeparatorInName,
    #[error("field is not valid UTF-8")]
    Utf8,
    #[error("comment exceeds 65535 bytes")]
    CommentTooLong,
    #[error("duplicate group/name combination")]
    Duplicate,
}

/// Widths that differ between protocol versions.
struct PacketLayout {
    has_type_byte: bool,
    timestamp_width: usize,
}

impl PacketLayout {
    fn for_version(version: u16) -> Option<Self> {
        match version {
            LEGACY_PROTOCOL_VERSION => Some(Self {
                has_type_byte: true,
                timestamp_width: 4,
            }),
            PROTOCOL_VERSION => Some(Self {
                has_type_byte: false,
                timestamp_width: 8,
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Serialize `entries`, in storage order, into a version-2 payload.
///
/// The group dictionary is rebuilt from scratch for this call.
/// Field lengths are validated first, so an entry that would not fit
/// its frame is reported as a validation error.
pub fn encode_payload(entries: &[Entry]) -> Result<Vec<u8>> {
    for entry in entries {
        entry.validate()?;
    }

    let group_map = GroupMap::build(entries)?;
    let mut payload = Vec::new();
    put_num(&mut payload, u64::from(PROTOCOL_VERSION), VERSION_WIDTH).map_err(encode_error)?;
    payload.extend_from_slice(&group_map.header()?);

    for entry in entries {
        let packet = encode_packet(entry, &group_map).map_err(encode_error)?;
        put_prefixed(&mut payload, &packet, PACKET_WIDTH).map_err(encode_error)?;
    }

    Ok(payload)
}

fn encode_packet(entry: &Entry, group_map: &GroupMap) -> std::result::Result<Vec<u8>, CodecError> {
    let mut packet = Vec::with_capacity(
        entry.name.len() + entry.password.len() + entry.comment.len() + 64,
    );
    put_prefixed(&mut packet, entry.name.as_bytes(), 1)?;
    put_prefixed(&mut packet, entry.username.as_bytes(), 1)?;
    put_prefixed(&mut packet, entry.password.as_bytes(), 2)?;
    put_prefixed(&mut packet, entry.email.as_bytes(), 1)?;
    put_prefixed(&mut packet, entry.url.as_bytes(), 1)?;
    put_num(
        &mut packet,
        u64::from(group_map.pointer_of(&entry.group)),
        POINTER_WIDTH,
    )?;
    put_num(&mut packet, entry.created, 8)?;
    put_num(&mut packet, entry.modified, 8)?;
    packet.extend_from_slice(entry.comment.as_bytes());
    Ok(packet)
}

fn encode_error(e: CodecError) -> StrongboxError {
    StrongboxError::Validation(format!("entry does not fit the vault format: {e}"))
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// A decoded payload.
#[derive(Debug)]
pub struct DecodedPayload {
    /// Protocol version found in the payload.
    pub version: u16,
    /// Entries in storage order.
    pub entries: Vec<Entry>,
}

/// Parse and validate a payload produced by `encode_payload` (or by a
/// version-1 writer).
pub fn decode_payload(payload: &[u8]) -> Result<DecodedPayload> {
    decode_inner(payload).map_err(|reason| {
        debug!(%reason, "rejecting vault payload");
        StrongboxError::CorruptedVault
    })
}

fn decode_inner(payload: &[u8]) -> std::result::Result<DecodedPayload, Corruption> {
    let mut reader = ByteReader::new(payload);

    let version = reader.read_num(VERSION_WIDTH)? as u16;
    let layout = PacketLayout::for_version(version).ok_or(Corruption::Version(version))?;

    let header = reader.read_prefixed(GROUP_HEADER_WIDTH)?;
    let group_paths = parse_group_header(header)?;

    let mut entries = Vec::new();
    while !reader.is_empty() {
        let packet = reader.read_prefixed(PACKET_WIDTH)?;
        entries.push(parse_packet(packet, &layout, &group_paths)?);
    }

    let labels: Vec<String> = entries.iter().map(Entry::label).collect();
    if groups::has_duplicate_name_groups(&labels) {
        return Err(Corruption::Duplicate);
    }

    Ok(DecodedPayload { version, entries })
}

/// Parse the group header into a pointer -> path lookup.
///
/// An empty path is tolerated in the header (older writers emitted one)
/// but no entry may point at it.
fn parse_group_header(header: &[u8]) -> std::result::Result<HashMap<u16, String>, Corruption> {
    let mut reader = ByteReader::new(header);
    let mut by_pointer: HashMap<u16, String> = HashMap::new();

    while !reader.is_empty() {
        let path = reader
            .read_prefixed(GROUP_PATH_WIDTH)
            .map_err(|_| Corruption::GroupHeader)?;
        let pointer = reader
            .read_num(POINTER_WIDTH)
            .map_err(|_| Corruption::GroupHeader)? as u16;
        let path = std::str::from_utf8(path).map_err(|_| Corruption::Utf8)?;

        if pointer == 0 {
            if path.is_empty() {
                continue;
            }
            return Err(Corruption::ZeroPointer);
        }
        if by_pointer.values().any(|p| p == path) {
            return Err(Corruption::DuplicatePath);
        }
        if by_pointer.insert(pointer, path.to_string()).is_some() {
            return Err(Corruption::DuplicatePointer(pointer));
        }
    }

    Ok(by_pointer)
}

fn parse_packet(
    packet: &[u8],
    layout: &PacketLayout,
    group_paths: &HashMap<u16, String>,
) -> std::result::Result<Entry, Corruption> {
    let mut reader = ByteReader::new(packet);

    let name = text(reader.read_prefixed(1)?)?;
    if name.is_empty() {
        return Err(Corruption::EmptyName);
    }
    if name.contains('/') {
        return Err(Corruption::SeparatorInName);
    }
    let username = text(reader.read_prefixed(1)?)?;
    let password = text(reader.read_prefixed(2)?)?;
    let email = text(reader.read_prefixed(1)?)?;
    let url = text(reader.read_prefixed(1)?)?;
    if layout.has_type_byte {
        reader.read_exact(1)?;
    }

    let pointer = reader.read_num(POINTER_WIDTH)? as u16;
    let group = resolve_group(pointer, group_paths)?;

    let created = reader.read_num(layout.timestamp_width)?;
    let modified = reader.read_num(layout.timestamp_width)?;

    let comment = reader.rest();
    if comment.len() > MAX_LONG_FIELD {
        return Err(Corruption::CommentTooLong);
    }
    let comment = text(comment)?;

    Ok(Entry {
        name,
        username,
        password,
        email,
        url,
        group,
        comment,
        created,
        modified,
    })
}

fn resolve_group(
    pointer: u16,
    group_paths: &HashMap<u16, String>,
) -> std::result::Result<String, Corruption> {
    if pointer == 0 {
        return Ok(String::new());
    }
    let path = group_paths
        .get(&pointer)
        .ok_or(Corruption::UnknownPointer(pointer))?;
    if path.is_empty() || groups::validate_group_path(path).is_err() {
        return Err(Corruption::GroupPath);
    }
    Ok(path.clone())
}

fn text(bytes: &[u8]) -> std::result::Result<String, Corruption> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Corruption::Utf8)
}
