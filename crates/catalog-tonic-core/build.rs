/// Builds the gRPC client and server code for the `catalog.proto` definition
/// using `tonic-prost-build`.
///
/// The `chunk_data` field of the `UploadImageRequest` message is explicitly
/// marked with `.bytes(...)` so it is deserialized as a `Bytes` value (from
/// the `bytes` crate) instead of the default `Vec<u8>`, avoiding a copy per
/// received image chunk.
///
/// A file descriptor set is emitted next to the generated code so the server
/// can register itself with the gRPC reflection service.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("catalog_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();

    // Ensure the image chunk field is treated as `Bytes`, not `Vec<u8>`
    config
        .bytes([".catalog.UploadImageRequest.chunk_data"])
        .file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/catalog.proto"], &["proto"])
        .unwrap();
}
