// TODO: switch to `tonic_prost_build::compile_protos` once protoc is
// available in the build environment; until then `src/wire.rs` carries
// hand-written stub message/client types with the same wire shape.
fn main() {
    println!("cargo:rerun-if-changed=proto/load_generator.proto");
}
