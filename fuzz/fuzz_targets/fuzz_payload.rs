#![no_main]

use aiip_io::decode_payload;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw chunk data: method byte, zlib stream, JSON
    if let Ok(metadata) = decode_payload(data) {
        let _ = metadata.title();
        let _ = metadata.canvas();
    }
});
