//! TLV attribute decoding (§4.1, §6).
//!
//! Each command's attribute region is zero or more `(tag: u16, length: u16, payload)` triples.
//! Decoding is purely by tag: an [`AttributeMap`] keeps every tag it sees, known or not, as raw
//! bytes, and only interprets the bytes known tags need when a typed accessor is called. This is
//! what lets new attribute tags show up in a stream without the decoder itself changing (§4.1).

use std::collections::BTreeMap;

use bytes::Bytes;
use nom::number::complete::{le_u16, le_u32};
use nom::{IResult, Parser};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::path::RawPath;

/// Attribute tags the core interprets (§6). Numeric values follow the on-wire attribute
/// ordering; a tag this crate doesn't know about is kept in [`AttributeMap`] as a raw byte
/// string under its numeric code instead of being named here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Tag {
    Uuid = 1,
    Ctransid = 2,
    Ino = 3,
    Size = 4,
    Mode = 5,
    Uid = 6,
    Gid = 7,
    Rdev = 8,
    Ctime = 9,
    Mtime = 10,
    Atime = 11,
    Otime = 12,
    XattrName = 13,
    XattrData = 14,
    Path = 15,
    PathTo = 16,
    PathLink = 17,
    FileOffset = 18,
    Data = 19,
    CloneUuid = 20,
    CloneCtransid = 21,
    ClonePath = 22,
    CloneOffset = 23,
    CloneLen = 24,
}

/// A point in time as the wire format encodes it: seconds plus a nanosecond remainder.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timespec {
    pub sec: u64,
    pub nsec: u32,
}

/// One decoded command's full set of attributes.
///
/// Duplicate tags within a single command are rejected at construction time
/// (§4.1: "Duplicate tags within one command are treated as `MalformedCommand`").
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    raw: BTreeMap<u16, Bytes>,
}

impl AttributeMap {
    pub(crate) fn parse(mut input: &[u8]) -> Result<Self> {
        let mut raw = BTreeMap::new();
        while !input.is_empty() {
            let (rest, (tag, payload)) = parse_tlv(input).map_err(|_| Error::MalformedStream {
                reason: "truncated attribute".to_string(),
            })?;
            if raw.insert(tag, payload).is_some() {
                return Err(Error::MalformedStream {
                    reason: format!("duplicate attribute tag {tag}"),
                });
            }
            input = rest;
        }
        Ok(Self { raw })
    }

    /// Attribute tags this command carried that this crate doesn't have a name for.
    pub fn unknown_tags(&self) -> impl Iterator<Item = u16> + '_ {
        self.raw.keys().copied().filter(|tag| !is_known_tag(*tag))
    }

    fn bytes(&self, tag: Tag) -> Option<&Bytes> {
        self.raw.get(&(tag as u16))
    }

    fn path_attr(&self, tag: Tag) -> Option<RawPath> {
        self.bytes(tag).map(|b| RawPath::new(b.clone()))
    }

    fn u64_attr(&self, tag: Tag) -> Option<u64> {
        self.bytes(tag)
            .and_then(|b| b.as_ref().try_into().ok())
            .map(u64::from_le_bytes)
    }

    fn u32_attr(&self, tag: Tag) -> Option<u32> {
        self.bytes(tag)
            .and_then(|b| b.as_ref().try_into().ok())
            .map(u32::from_le_bytes)
    }

    fn timespec_attr(&self, tag: Tag) -> Option<Timespec> {
        let bytes = self.bytes(tag)?;
        let (sec, rest) = le_u64(bytes).ok()?;
        let (_, nsec) = le_u32::<_, nom::error::Error<_>>(rest).ok()?;
        Some(Timespec { sec, nsec })
    }

    fn uuid_attr(&self, tag: Tag) -> Option<Uuid> {
        self.bytes(tag)
            .and_then(|b| <[u8; 16]>::try_from(b.as_ref()).ok())
            .map(Uuid::from_bytes)
    }

    pub fn path(&self) -> Option<RawPath> {
        self.path_attr(Tag::Path)
    }

    pub fn path_to(&self) -> Option<RawPath> {
        self.path_attr(Tag::PathTo)
    }

    pub fn path_link(&self) -> Option<RawPath> {
        self.path_attr(Tag::PathLink)
    }

    pub fn clone_path(&self) -> Option<RawPath> {
        self.path_attr(Tag::ClonePath)
    }

    pub fn ino(&self) -> Option<u64> {
        self.u64_attr(Tag::Ino)
    }

    pub fn size(&self) -> Option<u64> {
        self.u64_attr(Tag::Size)
    }

    pub fn mode(&self) -> Option<u32> {
        self.u32_attr(Tag::Mode)
    }

    pub fn uid(&self) -> Option<u32> {
        self.u32_attr(Tag::Uid)
    }

    pub fn gid(&self) -> Option<u32> {
        self.u32_attr(Tag::Gid)
    }

    pub fn rdev(&self) -> Option<u64> {
        self.u64_attr(Tag::Rdev)
    }

    pub fn file_offset(&self) -> Option<u64> {
        self.u64_attr(Tag::FileOffset)
    }

    pub fn clone_offset(&self) -> Option<u64> {
        self.u64_attr(Tag::CloneOffset)
    }

    pub fn clone_len(&self) -> Option<u64> {
        self.u64_attr(Tag::CloneLen)
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid_attr(Tag::Uuid)
    }

    pub fn clone_uuid(&self) -> Option<Uuid> {
        self.uuid_attr(Tag::CloneUuid)
    }

    pub fn mtime(&self) -> Option<Timespec> {
        self.timespec_attr(Tag::Mtime)
    }

    pub fn atime(&self) -> Option<Timespec> {
        self.timespec_attr(Tag::Atime)
    }

    pub fn ctime(&self) -> Option<Timespec> {
        self.timespec_attr(Tag::Ctime)
    }

    pub fn xattr_name(&self) -> Option<&Bytes> {
        self.bytes(Tag::XattrName)
    }

    pub fn xattr_data(&self) -> Option<&Bytes> {
        self.bytes(Tag::XattrData)
    }

    pub fn data(&self) -> Option<&Bytes> {
        self.bytes(Tag::Data)
    }
}

fn is_known_tag(tag: u16) -> bool {
    (Tag::Uuid as u16..=Tag::CloneLen as u16).contains(&tag)
}

fn le_u64(input: &[u8]) -> IResult<&[u8], u64> {
    nom::number::complete::le_u64(input)
}

/// Parse a single `(tag, length, payload)` triple, per §4.1.
fn parse_tlv(input: &[u8]) -> IResult<&[u8], (u16, Bytes)> {
    let (input, tag) = le_u16(input)?;
    let (input, len) = le_u16(input)?;
    let (input, payload) = nom::bytes::complete::take(len).parse(input)?;
    Ok((input, (tag, Bytes::copy_from_slice(payload))))
}
