#[macro_use]
extern crate clap;

use clap::{App, Arg, ArgMatches};
use lanyfs::config::{AddressLength, BlockSize, FormatOptions};
use lanyfs::formatter::format_device;
use lanyfs::types::{MAJOR_VERSION, MINOR_VERSION};
use std::path::Path;
use std::process::exit;

const PROGNAME: &str = "mkfs.lanyfs";

fn options(matches: &ArgMatches) -> lanyfs::Result<FormatOptions> {
    let mut options = FormatOptions::default();
    if matches.is_present("blocksize") {
        let bytes = value_t!(matches, "blocksize", u64).unwrap_or_else(|e| e.exit());
        options.block_size = BlockSize::from_bytes(bytes)?;
    }
    if matches.is_present("addrlen") {
        let bits = value_t!(matches, "addrlen", u64).unwrap_or_else(|e| e.exit());
        options.address_length = AddressLength::from_bits(bits)?;
    }
    if let Some(label) = matches.value_of("label") {
        options.label = label.to_string();
    }
    Ok(options)
}

fn run(matches: &ArgMatches) -> lanyfs::Result<()> {
    let options = options(matches)?;
    let path = Path::new(matches.value_of("device").unwrap_or_default());
    let report = format_device(path, options)?;
    println!("total blocks: {}", report.geometry.blocks);
    println!("root dir: {}", report.rootdir);
    println!("free head: {}", report.freehead);
    println!("free tail: {}", report.freetail);
    println!("free blocks: {}", report.freeblocks);
    println!("chain blocks: {}", report.chain_blocks);
    println!("all done");
    Ok(())
}

fn main() {
    let version = format!("{} (LanyFS {}.{})", crate_version!(), MAJOR_VERSION, MINOR_VERSION);
    let matches = App::new(PROGNAME)
        .version(version.as_str())
        .author(crate_authors!())
        .about("create an empty LanyFS on a device or image file")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .help("log every block written"),
        )
        .arg(
            Arg::with_name("label")
                .short("l")
                .takes_value(true)
                .value_name("label")
                .help("volume label (default: LanyFS Storage)"),
        )
        .arg(
            Arg::with_name("blocksize")
                .short("b")
                .takes_value(true)
                .value_name("blocksize")
                .help("block size in bytes: 512, 1024, 2048 or 4096 (default: 4096)"),
        )
        .arg(
            Arg::with_name("addrlen")
                .short("a")
                .takes_value(true)
                .value_name("address length")
                .help("address length in bits, multiple of 8 up to 64 (default: 32)"),
        )
        .arg(
            Arg::with_name("device")
                .help("device or image file to format")
                .required(true)
                .index(1),
        )
        .get_matches();
    lanyfs::logging::init(matches.is_present("verbose"));
    if let Err(e) = run(&matches) {
        eprintln!("{}: {}", PROGNAME, e);
        exit(1);
    }
}
