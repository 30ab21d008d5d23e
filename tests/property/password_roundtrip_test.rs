//! Property tests: any password sealed under a login id opens under that id
//! and nowhere else.

use lockbox::services::crypto_service::{Cipher, CryptoService, MasterKey, KEY_LENGTH};
use proptest::prelude::*;

fn key(byte: u8) -> MasterKey {
    MasterKey::from_bytes(vec![byte; KEY_LENGTH]).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn seal_then_open_returns_plaintext(
        password in ".{0,64}",
        context in "[a-f0-9-]{1,36}",
        key_byte in any::<u8>(),
    ) {
        let service = CryptoService::new();
        let key = key(key_byte);
        let sealed = service.seal(password.as_bytes(), &context, &key).unwrap();
        let opened = service.open(&sealed, &context, &key).unwrap();
        prop_assert_eq!(String::from_utf8(opened).unwrap(), password);
    }

    #[test]
    fn open_under_other_context_fails(
        password in ".{1,32}",
        context in "[a-z]{1,16}",
        other in "[a-z]{1,16}",
    ) {
        prop_assume!(context != other);
        let service = CryptoService::new();
        let key = key(3);
        let sealed = service.seal(password.as_bytes(), &context, &key).unwrap();
        prop_assert!(service.open(&sealed, &other, &key).is_err());
    }
}
