//! Command line program for running fitness landscape parameter sweeps.

#[macro_use]
extern crate log;

extern crate anyhow;
extern crate clap;
extern crate colored;

extern crate sweep_core as sweep;

pub mod cli;
pub mod init;
mod util;

use colored::*;

fn main() {
    // Run the program based on user input
    match cli::start(cli::init()) {
        Ok(_) => (),
        Err(e) => {
            println!("{}{}", "error: ".red(), e);
            if e.root_cause().to_string() != e.to_string() {
                println!("Caused by:\n{}", e.root_cause())
            }
            std::process::exit(1);
        }
    }
}
