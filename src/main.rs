fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Err(err) = raidloot::run(&args) {
        eprintln!("raidloot: {}", err);
        std::process::exit(1);
    }
}
