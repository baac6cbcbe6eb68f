use clap::Parser;
use hufpack::code::{format_code, format_symbol};
use hufpack::{Cfg, CodeTable, FrequencyTable, Packer, TreeBuilder};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hufpack", about = "Compress a file with a Huffman prefix code")]
struct Args {
    /// File to compress (or to decompress with --unpack)
    input: PathBuf,

    /// Where to write the result
    output: PathBuf,

    /// Decompress INPUT instead of compressing it
    #[arg(long)]
    unpack: bool,

    /// Do not print the code table
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = Cfg::default();

    if args.unpack {
        let n = hufpack::pack::unpack_file(&args.input, &args.output)?;
        log::info!("[{}] wrote {} bytes to {:?}", cfg.log_prefix, n, args.output);
        return Ok(());
    }

    let data = std::fs::read(&args.input)?;
    let freq = FrequencyTable::from_bytes(&data);
    let tree = TreeBuilder::build(&freq)?;
    let table = CodeTable::generate(&tree)?;

    if !args.quiet {
        for (symbol, entry) in table.iter() {
            println!(
                "{}: {} {}",
                format_symbol(symbol),
                entry.weight,
                format_code(&entry.code)
            );
        }
    }

    let packer = Packer::new(cfg);
    packer.write_packed_file(&data, &freq, &table, &args.output)?;

    log::debug!("[{}] released {} tree nodes", packer.cfg().log_prefix, tree.release());
    Ok(())
}
