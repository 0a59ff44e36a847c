use nelox::cmdline;

fn main() {
    pretty_env_logger::init();
    let args = std::env::args().collect();
    if let Err(e) = cmdline::launch(args) {
        eprintln!("{}", cmdline::paint_error(&e.to_string()));
        std::process::exit(1);
    }
}
