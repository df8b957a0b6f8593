fn main() {
    // Host builds (tests, fuzzing) never pull in the ESP-IDF toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
