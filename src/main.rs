fn main() {
    if let Err(e) = turnos_lib::run() {
        eprintln!("turnos: {e}");
        std::process::exit(1);
    }
}
