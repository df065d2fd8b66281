use std::env;

// `cc` run outside a build script needs the triples spelled out.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=native/dlvk.c");
    for var in ["TARGET", "HOST"] {
        let value = env::var(var).unwrap();
        println!("cargo:rustc-env=GENVK_{}={}", var, value);
    }
}
