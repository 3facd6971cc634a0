use docsync_fs::{compute_content_checksum, relative_key};
use proptest::prelude::*;
use std::path::Path;

proptest! {
    #[test]
    fn relative_key_round_trips_joined_keys(
        segments in proptest::collection::vec("[a-z0-9_-]{1,8}", 1..4)
    ) {
        let key = segments.join("/");
        let absolute = Path::new("/project").join(&key);

        let computed = relative_key(Path::new("/project"), &absolute).unwrap();
        prop_assert_eq!(computed, key);
    }

    #[test]
    fn checksum_is_stable_and_prefixed(content in ".*") {
        let a = compute_content_checksum(&content);
        let b = compute_content_checksum(&content);
        prop_assert!(a.starts_with("sha256:"));
        prop_assert_eq!(a, b);
    }
}
