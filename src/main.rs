fn main() {
    if let Err(err) = hearthboard_lib::run() {
        eprintln!("hearthboard: {err:#}");
        std::process::exit(1);
    }
}
