//! # Voxel Terrain Entry Point
//!
//! Runs a headless session of the engine. Set `RUST_LOG=info` (or `debug`) to see
//! what it does, and `VOXEL_CONFIG` to point at a JSON configuration file.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

fn main() {
    voxel_terrain::run();
}
