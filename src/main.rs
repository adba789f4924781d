fn main() {
    antenna_pattern::cli::run();
}
