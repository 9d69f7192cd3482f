//! Tests generated by the build script, one for every content file under `modules/`.
mod modules;
