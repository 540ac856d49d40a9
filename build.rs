fn main() {
    println!("cargo:rerun-if-changed=config.example.json");

    // ESP-IDF link arguments are only meaningful when building the firmware
    // image; host builds (unit and integration tests) skip them.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
