fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: poolcfg <config-file>");
        std::process::exit(2);
    };
    match poolcfg::parse_file(path) {
        Ok(scheme) => println!("{:#?}", scheme),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
