//! Derived keys are fresh buffers owned by the caller

use kdfbridge_scrypt::scrypt;

#[test]
fn output_never_aliases_inputs() {
    let password = b"password".to_vec();
    let salt = b"NaCl".to_vec();

    let key = scrypt(&password, &salt, 16, 1, 1, 8).expect("valid parameters");
    let out = key.as_bytes().as_ptr_range();
    for input in [password.as_ptr_range(), salt.as_ptr_range()] {
        assert!(out.end <= input.start || input.end <= out.start);
    }
}

#[test]
fn mutating_output_does_not_affect_later_calls() {
    let first = scrypt(b"password", b"NaCl", 16, 1, 1, 32).expect("valid parameters");
    let expected = first.as_bytes().to_vec();

    let mut taken = first.into_vec();
    taken.iter_mut().for_each(|b| *b = 0);

    let second = scrypt(b"password", b"NaCl", 16, 1, 1, 32).expect("valid parameters");
    assert_eq!(second.as_bytes(), expected.as_slice());
}

#[test]
fn output_length_is_exact() {
    for len in [1, 31, 32, 33, 64, 65, 1000] {
        let key = scrypt(b"password", b"NaCl", 16, 1, 1, len).expect("valid parameters");
        assert_eq!(key.len(), len);
    }
}

#[test]
fn empty_inputs_are_valid() {
    let key = scrypt(b"", b"", 16, 1, 1, 16).expect("empty password and salt are allowed");
    assert_eq!(key.len(), 16);
}
