fn main() -> anyhow::Result<()> {
    handcue::logging::init();
    handcue::cli::run()
}
