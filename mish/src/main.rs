#[macro_use]
extern crate clap;

use clap::Arg;
use mish::{Interpreter, Settings};
use std::process;

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("developer")
                .short("d")
                .long("developer")
                .help("Start with auto-dump and trace on, auto-execute off"),
        )
        .arg(
            Arg::with_name("noautoexecute")
                .short("n")
                .long("noautoexecute")
                .help("Start with auto-execute off"),
        )
        .arg(
            Arg::with_name("file")
                .short("f")
                .long("file")
                .alias("filename")
                .takes_value(true)
                .value_name("PATH")
                .help("Read initial input from PATH (forces auto-execute off)"),
        )
        .get_matches();

    let mut settings = Settings::default();
    if matches.is_present("developer") {
        settings.auto_dump = true;
        settings.trace = true;
        settings.auto_execute = false;
    }
    if matches.is_present("noautoexecute") {
        settings.auto_execute = false;
    }

    let mut interpreter = Interpreter::new(settings);
    let code = interpreter.run(matches.value_of("file"));
    process::exit(code);
}
