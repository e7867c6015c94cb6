//! The Wire Decoder (§4.1).
//!
//! A pure function over a byte buffer: no state beyond a cursor, no backtracking, and no
//! reference retained past the command currently being decoded. [`Decoder`] is the lazy
//! sequence of `(kind, attributes)` records the rest of the crate consumes.

pub mod kind;
pub mod tlv;

use nom::number::complete::{le_u16, le_u32};
use nom::{IResult, Parser};

pub use kind::{CommandKind, Kind};
pub use tlv::{AttributeMap, Tag, Timespec};

use crate::error::{Error, Result};

/// The 13-byte magic string every send-stream begins with.
pub const MAGIC: &[u8; 13] = b"btrfs-stream\0";

/// Size in bytes of the fixed command header (`length: u32`, `kind: u16`, `crc: u32`).
const HEADER_LEN: usize = 4 + 2 + 4;

/// One decoded command, still in its raw, pre-classification form.
#[derive(Debug, Clone)]
pub struct CommandRecord {
    /// Byte offset of this command's header within the stream; used in diagnostics.
    pub offset: usize,
    pub kind: Kind,
    pub attributes: AttributeMap,
}

struct Header {
    len: usize,
    kind: u16,
    crc: u32,
}

fn parse_header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, len) = le_u32(input)?;
    let (input, kind) = le_u16(input)?;
    let (input, crc) = le_u32(input)?;
    Ok((
        input,
        Header {
            len: len as usize,
            kind,
            crc,
        },
    ))
}

fn parse_envelope(input: &[u8]) -> IResult<&[u8], u32> {
    let (input, _magic) = nom::bytes::complete::tag(&MAGIC[..]).parse(input)?;
    le_u32(input)
}

/// Checksum a command the same way the producer did: header bytes with the `crc` field
/// zeroed, followed by the attribute region.
fn command_crc(header_bytes: &[u8], attrs: &[u8]) -> u32 {
    let mut zeroed = [0u8; HEADER_LEN];
    zeroed.copy_from_slice(header_bytes);
    zeroed[6..10].fill(0);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&zeroed);
    hasher.update(attrs);
    hasher.finalize()
}

/// Decodes a send-stream into a lazy sequence of [`CommandRecord`]s.
///
/// Stops after yielding the `end` command, or after the first error (decoding doesn't resume
/// past a hard error, per §7: "Hard errors abort the parse... the partially built change list
/// is discarded").
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    verify_crc: bool,
    version: u32,
    finished: bool,
}

impl<'a> Decoder<'a> {
    /// Parse the envelope and set up a decoder over the remaining command stream.
    pub fn new(buf: &'a [u8], verify_crc: bool, supported_versions: &[u32]) -> Result<Self> {
        let (rest, version) = parse_envelope(buf).map_err(|_| Error::MalformedStream {
            reason: "bad magic".to_string(),
        })?;
        if !supported_versions.contains(&version) {
            return Err(Error::UnsupportedVersion {
                got: version,
                supported: supported_versions.to_vec(),
            });
        }
        let pos = buf.len() - rest.len();
        Ok(Self {
            buf,
            pos,
            verify_crc,
            version,
            finished: false,
        })
    }

    /// The send-stream format version declared in the envelope (1 or 2).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Byte offset the cursor currently sits at; stable between calls to `next`.
    pub fn offset(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<CommandRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.pos >= self.buf.len() {
            self.finished = true;
            return Some(Err(Error::MalformedStream {
                reason: "truncated stream: missing end command".to_string(),
            }));
        }

        let offset = self.pos;
        let input = &self.buf[self.pos..];
        let Ok((after_header, header)) = parse_header(input) else {
            self.finished = true;
            return Some(Err(Error::MalformedStream {
                reason: "truncated command header".to_string(),
            }));
        };
        if after_header.len() < header.len {
            self.finished = true;
            return Some(Err(Error::MalformedStream {
                reason: "truncated stream: command body shorter than declared length".to_string(),
            }));
        }
        let (attr_bytes, after_command) = after_header.split_at(header.len);

        if self.verify_crc {
            let header_bytes = &input[..HEADER_LEN];
            let expected = command_crc(header_bytes, attr_bytes);
            if expected != header.crc {
                self.finished = true;
                return Some(Err(Error::CorruptCommand {
                    offset,
                    expected,
                    got: header.crc,
                }));
            }
        }

        let attributes = match AttributeMap::parse(attr_bytes) {
            Ok(attrs) => attrs,
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };

        self.pos = offset + HEADER_LEN + header.len;
        let kind = Kind::from_code(header.kind);
        if matches!(kind, Kind::Known(CommandKind::End)) {
            self.finished = true;
        }
        let _ = after_command;

        Some(Ok(CommandRecord {
            offset,
            kind,
            attributes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(kind: u16, attrs: &[u8], crc_ok: bool) -> Vec<u8> {
        let mut header = Vec::new();
        header.extend_from_slice(&(attrs.len() as u32).to_le_bytes());
        header.extend_from_slice(&kind.to_le_bytes());
        let crc = if crc_ok {
            command_crc(
                &{
                    let mut h = [0u8; HEADER_LEN];
                    h[0..4].copy_from_slice(&(attrs.len() as u32).to_le_bytes());
                    h[4..6].copy_from_slice(&kind.to_le_bytes());
                    h
                },
                attrs,
            )
        } else {
            0xdead_beef
        };
        header.extend_from_slice(&crc.to_le_bytes());
        header.extend_from_slice(attrs);
        header
    }

    fn stream(version: u32, commands: &[Vec<u8>]) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        out.extend_from_slice(&version.to_le_bytes());
        for c in commands {
            out.extend_from_slice(c);
        }
        out
    }

    #[test]
    fn rejects_bad_magic() {
        let buf = b"not-a-stream\0\x01\x00\x00\x00";
        let err = Decoder::new(buf, false, &[1, 2]).unwrap_err();
        assert!(matches!(err, Error::MalformedStream { .. }));
    }

    #[test]
    fn rejects_unsupported_version() {
        let buf = stream(99, &[command(21, &[], true)]);
        let err = Decoder::new(&buf, false, &[1, 2]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { got: 99, .. }));
    }

    #[test]
    fn decodes_end_and_then_stops() {
        let buf = stream(1, &[command(21, &[], true)]);
        let mut decoder = Decoder::new(&buf, false, &[1, 2]).expect("envelope");
        let first = decoder.next().expect("one record").expect("ok");
        assert!(matches!(first.kind, Kind::Known(CommandKind::End)));
        assert!(decoder.next().is_none());
    }

    #[test]
    fn truncated_stream_without_end_is_malformed() {
        let buf = MAGIC
            .iter()
            .copied()
            .chain(1u32.to_le_bytes())
            .collect::<Vec<_>>();
        let mut decoder = Decoder::new(&buf, false, &[1, 2]).expect("envelope");
        let err = decoder.next().expect("one result").unwrap_err();
        assert!(matches!(err, Error::MalformedStream { .. }));
    }

    #[test]
    fn crc_mismatch_is_corrupt_command() {
        let buf = stream(1, &[command(21, &[], false)]);
        let mut decoder = Decoder::new(&buf, true, &[1, 2]).expect("envelope");
        let err = decoder.next().expect("one result").unwrap_err();
        assert!(matches!(err, Error::CorruptCommand { .. }));
    }
}
