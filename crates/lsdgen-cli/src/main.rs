fn main() {
    if let Err(e) = lsdgen::run() {
        lsdgen_logger::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
