#![no_main]

use aiip_io::{read_metadata, AiipFile, Structure};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any input must produce a value or an error, never a panic
    let _ = read_metadata(data);

    if let Ok(structure) = Structure::parse(data) {
        for index in 0..structure.chunks.len() {
            let _ = structure.chunk_data(data, index);
        }
        let _ = structure.verify_checksums(data);
        let _ = structure.aiip_precedes_image_data();
    }

    if let Ok(file) = AiipFile::from_bytes(data.to_vec()) {
        let _ = file.header();
        let _ = file.metadata();
        for chunk in file.chunks() {
            if chunk.is_err() {
                break;
            }
        }
    }
});
