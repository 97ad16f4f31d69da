use cyclecore::Options;

fn main() {
    env_logger::init();

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}\n\n{}", cyclecore::USAGE);
            std::process::exit(2);
        }
    };

    if let Err(err) = cyclecore::run(&options) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
