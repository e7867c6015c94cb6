use sendstream_delta::{CommandKind, Decoder, Kind};

use crate::support::{command, stream};

#[test]
fn decodes_a_minimal_stream_ending_in_end() {
    let bytes = stream(1, vec![command(CommandKind::End, Vec::new())]);
    let mut decoder = Decoder::new(&bytes, false, &[1, 2]).expect("envelope");
    assert_eq!(decoder.version(), 1);

    let record = decoder.next().expect("one record").expect("ok");
    assert!(matches!(record.kind, Kind::Known(CommandKind::End)));
    assert!(decoder.next().is_none());
}

#[test]
fn rejects_stream_with_unsupported_version() {
    let bytes = stream(7, vec![command(CommandKind::End, Vec::new())]);
    let err = Decoder::new(&bytes, false, &[1, 2]).unwrap_err();
    assert!(format!("{err}").contains("unsupported"));
}

#[test]
fn crc_verification_catches_a_corrupted_command() {
    let mut bytes = stream(1, vec![command(CommandKind::End, Vec::new())]);
    let crc_offset = bytes.len() - 10 + 6;
    bytes[crc_offset] ^= 0xff;

    let mut decoder = Decoder::new(&bytes, true, &[1, 2]).expect("envelope");
    let err = decoder.next().expect("one result").unwrap_err();
    assert!(format!("{err}").contains("corrupt"));
}
