//! flowindex CLI: inspect engine configuration.
//!
//! Usage:
//! ```bash
//! flowindex info
//! flowindex version
//! ```

use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "info" => cmd_info(),
        "version" | "--version" | "-V" => {
            println!("flowindex {}", env!("CARGO_PKG_VERSION"));
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("flowindex {}", env!("CARGO_PKG_VERSION"));
    println!("Reconciliation engine for token-streaming/splitting protocol events\n");
    println!("USAGE:");
    println!("    flowindex <COMMAND>\n");
    println!("COMMANDS:");
    println!("    info     Show flowindex configuration info");
    println!("    version  Print version");
    println!("    help     Print this help");
}

fn cmd_info() {
    println!("flowindex v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Default correlation policy: {:?}",
        flowindex_core::CorrelationPolicy::default()
    );
    println!("  Storage backends: memory, SQLite (feature: sqlite)");
    println!("  Record tables:");
    for table in flowindex_core::store::tables::ALL {
        println!("    {table}");
    }
}
