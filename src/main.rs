use anyhow::Result;
use cgpview::{CLIArguments, analyse_main, check_main};
use clap::Parser;

fn main() -> Result<()> {
    let args = CLIArguments::parse();

    match args {
        CLIArguments::Check(args) => check_main(args),
        CLIArguments::Analyse(args) => analyse_main(args),
    }
}
