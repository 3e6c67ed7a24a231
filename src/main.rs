fn main() {
    if let Err(e) = donor_dashboard_lib::run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
