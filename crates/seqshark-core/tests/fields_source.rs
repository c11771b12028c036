use std::fs;
use std::path::PathBuf;

use seqshark_core::{FieldsFileSource, RecordSource, SourceError, TsharkDecoder, open_capture};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

#[test]
fn fields_source_reads_records_from_fixture() {
    let path = repo_root()
        .join("tests")
        .join("golden")
        .join("reordered_gap")
        .join("input.csv");
    let mut source = FieldsFileSource::open(&path).unwrap();

    let mut records = 0;
    while let Some(_record) = source.next_record().unwrap() {
        records += 1;
    }

    assert_eq!(records, 15);
    assert_eq!(source.rows_skipped().unparsable, 1);
}

#[test]
fn fields_source_rejects_header_without_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    fs::write(&path, "frame.number,ip.src,frame.len\n1,10.0.0.1,60\n").unwrap();

    let err = match FieldsFileSource::open(&path) {
        Ok(_) => panic!("expected header to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Fields(msg) if msg.contains("ip.dst")));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = match open_capture(&dir.path().join("absent.csv"), &TsharkDecoder::default()) {
        Ok(_) => panic!("expected missing file to fail"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn binary_capture_without_decoder_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.pcapng");
    fs::write(&path, [0x0a, 0x0d, 0x0d, 0x0a]).unwrap();

    let decoder = TsharkDecoder::new(dir.path().join("no-such-tshark"));
    let err = match open_capture(&path, &decoder) {
        Ok(_) => panic!("expected decoder failure"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Decoder(_)));
}
