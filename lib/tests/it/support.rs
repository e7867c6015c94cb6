//! Stream-building helpers shared by the black-box scenario tests.
//!
//! Mirrors the attribute tag values from `lib/src/wire/tlv.rs::Tag`; duplicated here rather than
//! imported since the black-box suite only ever sees this crate's public surface.

use sendstream_delta::{CommandKind, MAGIC};

pub const TAG_INO: u16 = 3;
pub const TAG_SIZE: u16 = 4;
pub const TAG_PATH: u16 = 15;
pub const TAG_PATH_TO: u16 = 16;
pub const TAG_PATH_LINK: u16 = 17;

pub fn tlv(tag: u16, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(value);
    out
}

pub fn path_attr(tag: u16, s: &str) -> Vec<u8> {
    tlv(tag, s.as_bytes())
}

pub fn command(kind: CommandKind, attrs: Vec<u8>) -> Vec<u8> {
    let crc = {
        let mut h = [0u8; 10];
        h[0..4].copy_from_slice(&(attrs.len() as u32).to_le_bytes());
        h[4..6].copy_from_slice(&kind.code().to_le_bytes());
        crc32fast::hash(&[&h[..], &attrs[..]].concat())
    };
    let mut out = Vec::new();
    out.extend_from_slice(&(attrs.len() as u32).to_le_bytes());
    out.extend_from_slice(&kind.code().to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&attrs);
    out
}

pub fn stream(version: u32, commands: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&version.to_le_bytes());
    for c in commands {
        out.extend_from_slice(&c);
    }
    out
}
