mod dequantize;
mod gq_file;
mod quantize;
mod show;

#[macro_use]
extern crate clap;
use clap::Parser;

fn main() {
    use Commands::*;
    simple_logger::init_with_level(log::Level::Info).unwrap();
    match Cli::parse().command {
        Quantize(args) => args.quantize(),
        Dequantize(args) => args.dequantize(),
        Show(args) => args.show(),
    }
}

#[derive(Parser)]
#[clap(name = "gq-utils")]
#[clap(version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantize a raw f16/f32 file into packed codes + group records
    Quantize(quantize::QuantizeArgs),
    /// Expand a quantized file back to raw half precision
    Dequantize(dequantize::DequantizeArgs),
    /// Print the layout of a quantized file
    Show(show::ShowArgs),
}
