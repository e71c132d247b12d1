//! Nullbox - passphrase-keyed XOR file containers
//!
//! Bit-for-bit compatible with the `By_NullYex` container format. This is an
//! obfuscation scheme with a salted password check, not cryptography: the
//! keystream is derivable from the passphrase alone and the verification
//! digest is a simple mixing hash. Compatibility with existing containers is
//! the design goal.

#![forbid(unsafe_code)]

pub mod digest;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod keystream;
pub mod passphrase;
pub mod transform;
