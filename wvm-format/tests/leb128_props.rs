// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Property tests for LEB128 encoding and decoding.

use proptest::prelude::*;
use wvm_error::codes;
use wvm_format::binary::{
    read_leb128_i32, read_leb128_i64, read_leb128_u32, read_leb128_u64, write_leb128_i32,
    write_leb128_i64, write_leb128_u32, write_leb128_u64,
};

proptest! {
    #[test]
    fn u32_decodes_what_was_encoded(v in any::<u32>()) {
        let bytes = write_leb128_u32(v);
        prop_assert_eq!(read_leb128_u32(&bytes, 0).unwrap(), (v, bytes.len()));
    }

    #[test]
    fn u64_decodes_what_was_encoded(v in any::<u64>()) {
        let bytes = write_leb128_u64(v);
        prop_assert_eq!(read_leb128_u64(&bytes, 0).unwrap(), (v, bytes.len()));
    }

    #[test]
    fn i32_decodes_what_was_encoded(v in any::<i32>()) {
        let bytes = write_leb128_i32(v);
        prop_assert_eq!(read_leb128_i32(&bytes, 0).unwrap(), (v, bytes.len()));
    }

    #[test]
    fn i64_decodes_what_was_encoded(v in any::<i64>()) {
        let bytes = write_leb128_i64(v);
        prop_assert_eq!(read_leb128_i64(&bytes, 0).unwrap(), (v, bytes.len()));
    }

    #[test]
    fn values_needing_33_bits_overflow_u32(extra in (1u64 << 32)..(1u64 << 35)) {
        let bytes = write_leb128_u64(extra);
        let err = read_leb128_u32(&bytes, 0).unwrap_err();
        prop_assert_eq!(err.code, codes::LEB128_OVERFLOW);
    }

    #[test]
    fn values_outside_i32_overflow_i32(v in prop_oneof![
        (i64::from(i32::MAX) + 1)..(1i64 << 34),
        -(1i64 << 34)..i64::from(i32::MIN),
    ]) {
        let bytes = write_leb128_i64(v);
        let err = read_leb128_i32(&bytes, 0).unwrap_err();
        prop_assert_eq!(err.code, codes::LEB128_OVERFLOW);
    }

    #[test]
    fn decoding_stops_at_the_encoded_length(v in any::<u32>(), tail in proptest::collection::vec(any::<u8>(), 0..4)) {
        let mut bytes = write_leb128_u32(v);
        let len = bytes.len();
        bytes.extend_from_slice(&tail);
        prop_assert_eq!(read_leb128_u32(&bytes, 0).unwrap(), (v, len));
    }
}
