fn main() {
    // ESP-IDF environment propagation is only needed for the device build.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
