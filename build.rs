use std::env;

fn main() {
    // `DEBUG_LEVEL` is baked into the serial logging tiers via `option_env!`.
    println!("cargo:rerun-if-env-changed=DEBUG_LEVEL");

    if env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
        // memory.x comes from embassy-stm32's `memory-x` feature.
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
