// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Extraction with the wrong seed or credential.

mod common;

use adaptive_stego::{extract, CipherMode, Credential, EmbedOutcome, Protection, StegoError};
use common::{embed_seeded, keypair, noisy_image, FAST_KDF};

fn password_stego(seed: Option<&str>) -> EmbedOutcome {
    let cover = noisy_image(128, 128, 31);
    let prot = Protection::Password {
        password: "right",
        cipher: CipherMode::AesGcm,
        kdf: FAST_KDF,
        encrypt_payload: true,
    };
    embed_seeded(&cover, b"credential test", seed, &prot, 31).unwrap()
}

#[test]
fn wrong_password_fails_authentication() {
    let out = password_stego(Some("shared"));
    let err = extract(&out.stego, Some("shared"), &Credential::Password("wrong")).unwrap_err();
    assert!(matches!(err, StegoError::AuthenticationFailure), "got {err:?}");
}

#[test]
fn wrong_password_with_default_seed_fails() {
    let out = password_stego(None);
    assert!(extract(&out.stego, None, &Credential::Password("wrong")).is_err());
}

#[test]
fn password_package_without_password() {
    let out = password_stego(Some("shared"));
    let err = extract(&out.stego, Some("shared"), &Credential::None).unwrap_err();
    assert!(matches!(err, StegoError::HeaderMismatch(_)), "got {err:?}");
}

#[test]
fn wrong_private_key_fails_authentication() {
    let cover = noisy_image(128, 128, 32);
    let (_, pk) = keypair(0);
    let (other_sk, _) = keypair(1);
    let out = embed_seeded(&cover, b"rsa", Some("k"), &Protection::PublicKey(pk), 32).unwrap();
    let err = extract(&out.stego, Some("k"), &Credential::PrivateKey(other_sk)).unwrap_err();
    assert!(matches!(err, StegoError::AuthenticationFailure), "got {err:?}");
}

#[test]
fn public_key_package_with_password() {
    let cover = noisy_image(128, 128, 33);
    let (_, pk) = keypair(0);
    let out = embed_seeded(&cover, b"rsa", Some("k"), &Protection::PublicKey(pk), 33).unwrap();
    let err = extract(&out.stego, Some("k"), &Credential::Password("pw")).unwrap_err();
    assert!(matches!(err, StegoError::HeaderMismatch(_)), "got {err:?}");
}

#[test]
fn plain_package_opens_with_any_credential() {
    let cover = noisy_image(96, 96, 34);
    let out = embed_seeded(&cover, b"open", Some("p"), &Protection::Plain, 34).unwrap();
    let (sk, _) = keypair(0);
    for cred in [Credential::None, Credential::Password("anything"), Credential::PrivateKey(sk)] {
        assert_eq!(extract(&out.stego, Some("p"), &cred).unwrap().payload, b"open");
    }
}

#[test]
fn wrong_seed_does_not_recover_payload() {
    let cover = noisy_image(96, 96, 35);
    let out = embed_seeded(&cover, b"seeded", Some("alpha"), &Protection::Plain, 35).unwrap();
    if let Ok(got) = extract(&out.stego, Some("beta"), &Credential::None) {
        assert_ne!(got.payload, b"seeded");
    }
}
