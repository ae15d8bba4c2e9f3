#[macro_use]
extern crate clap;

use clap::{App, Arg};
use lanyfs::detector::detect_device;
use std::io;
use std::path::Path;
use std::process::exit;

const PROGNAME: &str = "detectfs.lanyfs";

fn main() {
    let matches = App::new(PROGNAME)
        .version(crate_version!())
        .author(crate_authors!())
        .about("check whether a device holds a LanyFS")
        .arg(
            Arg::with_name("device")
                .help("device or image file to inspect")
                .required(true)
                .index(1),
        )
        .get_matches();
    lanyfs::logging::init(false);
    let path = Path::new(matches.value_of("device").unwrap_or_default());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = detect_device(path, &mut out) {
        eprintln!("{}: {}", PROGNAME, e);
        exit(1);
    }
}
