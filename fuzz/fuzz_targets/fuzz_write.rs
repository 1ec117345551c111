#![no_main]

use aiip_io::{
    apply_update, embed_metadata, read_metadata, strip_metadata, Metadata, MetadataUpdate,
    WriteOptions,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let options = WriteOptions::default();
    let metadata = Metadata::new().with_title("fuzz");

    // A successful embed must read back what was written
    if let Ok(output) = embed_metadata(data, &metadata, &options) {
        let decoded = read_metadata(&output).expect("embedded output must parse");
        assert_eq!(decoded.as_ref(), Some(&metadata));
    }

    // A successful strip must leave no aiip chunk behind
    if let Ok(output) = strip_metadata(data) {
        assert!(matches!(read_metadata(&output), Ok(None)));
    }

    let _ = apply_update(data, &MetadataUpdate::Keep, &options);
});
