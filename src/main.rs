fn main() {
    #[cfg(feature = "cli")]
    bitdelta::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("bitdelta: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
