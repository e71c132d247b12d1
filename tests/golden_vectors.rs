//! Golden test vector validation
//!
//! Asserts byte-for-byte container layout compatibility: each vector fixes
//! the salt, so encoding must reproduce the stored container exactly, and
//! decoding the stored container must reproduce the plaintext and hidden
//! extension.

use std::io::Cursor;

use serde::Deserialize;

use nullbox::envelope::{self, Container};
use nullbox::keystream::Keystream;
use nullbox::transform::{self, SEGMENT_SIZE};

#[derive(Debug, Deserialize)]
struct GoldenVector {
    comment: String,
    passphrase: String,
    salt: String,
    extension: String,
    plaintext: String,
    container: String,
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data).expect("failed to load golden vectors")
}

fn encode_container(
    passphrase: &[u8],
    salt: &[u8; envelope::SALT_LEN],
    extension: &[u8],
    plaintext: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    let mut ks = envelope::write_header_with_salt(&mut out, passphrase, extension, salt)
        .expect("failed to write header");
    transform::encode_body(&mut Cursor::new(plaintext), &mut out, &mut ks, SEGMENT_SIZE)
        .expect("failed to encode body");
    out
}

fn decode_container(passphrase: &[u8], container: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut container = Container::open(Cursor::new(container.to_vec())).expect("failed to open");
    assert!(
        container.verify(passphrase).expect("verify failed"),
        "passphrase should verify"
    );
    let mut ks = Keystream::new(passphrase).unwrap();
    let extension = container.read_extension(&mut ks).expect("failed to read extension");
    let mut src = container.into_inner();
    let mut plaintext = Vec::new();
    transform::decode_body(&mut src, &mut plaintext, &mut ks, SEGMENT_SIZE)
        .expect("failed to decode body");
    (extension, plaintext)
}

#[test]
fn test_golden_vectors() {
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "no golden vectors loaded");

    let mut failed = 0;
    for (i, vector) in vectors.iter().enumerate() {
        let passphrase = hex::decode(&vector.passphrase).expect("bad passphrase hex");
        let salt: [u8; envelope::SALT_LEN] = hex::decode(&vector.salt)
            .expect("bad salt hex")
            .try_into()
            .expect("salt must be 8 bytes");
        let extension = hex::decode(&vector.extension).expect("bad extension hex");
        let plaintext = hex::decode(&vector.plaintext).expect("bad plaintext hex");
        let expected_container = hex::decode(&vector.container).expect("bad container hex");

        let encoded = encode_container(&passphrase, &salt, &extension, &plaintext);
        if encoded != expected_container {
            eprintln!("Vector {}: FAILED - container mismatch", i);
            eprintln!("  Comment:  {}", vector.comment);
            eprintln!("  Expected: {}", vector.container);
            eprintln!("  Actual:   {}", hex::encode(&encoded));
            failed += 1;
            continue;
        }

        let (restored_ext, restored_plain) = decode_container(&passphrase, &expected_container);
        if restored_ext != extension || restored_plain != plaintext {
            eprintln!("Vector {}: FAILED - round-trip mismatch", i);
            eprintln!("  Comment: {}", vector.comment);
            failed += 1;
        }
    }

    assert_eq!(failed, 0, "Some golden vectors failed validation");
}

/// Known-answer container: password "hunter2", body bytes 0x00..0x09, no
/// extension, salt "ABCDEFGH". The literal below is the full container.
#[test]
fn test_known_answer_container_exact_bytes() {
    let plaintext: Vec<u8> = (0u8..10).collect();
    let encoded = encode_container(b"hunter2", b"ABCDEFGH", b"", &plaintext);

    #[rustfmt::skip]
    let expected: Vec<u8> = vec![
        // signature tag "By_NullYex"
        0x42, 0x79, 0x5f, 0x4e, 0x75, 0x6c, 0x6c, 0x59, 0x65, 0x78,
        // salt "ABCDEFGH"
        0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
        // digest, little-endian
        0xf1, 0x9e, 0xb0, 0xec, 0x48, 0x05, 0xc4, 0x5e,
        // keyed extension length (0 ^ 'h')
        0x68,
        // body segment tag
        0x42, 0x79, 0x5f, 0x4e, 0x75, 0x6c, 0x6c, 0x59, 0x65, 0x78,
        // keyed body, key indices 1..=10
        0x76, 0x71, 0x75, 0x6a, 0x73, 0x3d, 0x69, 0x7a, 0x7f, 0x77,
    ];
    assert_eq!(encoded, expected);

    let (ext, plain) = decode_container(b"hunter2", &encoded);
    assert_eq!(ext, b"");
    assert_eq!(plain, plaintext);
}

/// Decoding the known-answer container with a wrong passphrase must be rejected
/// at the verification digest, before the body is touched.
#[test]
fn test_known_answer_container_wrong_passphrase() {
    let plaintext: Vec<u8> = (0u8..10).collect();
    let encoded = encode_container(b"hunter2", b"ABCDEFGH", b"", &plaintext);

    let mut container = Container::open(Cursor::new(encoded)).unwrap();
    assert!(!container.verify(b"wrong").unwrap());
}
