use crate::gq_file::{reslice, Header, Mode};
use group_quants::{f16, Asymmetric, IntegerSymmetric, QuantParams, Symmetric, TileQuantizer};
use log::info;
use memmap2::Mmap;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    time::Instant,
};

#[derive(Args)]
pub struct DequantizeArgs {
    /// Quantized input file
    file: PathBuf,
    /// Output path; defaults to the input with a `.bin` extension
    #[clap(long, short)]
    output: Option<PathBuf>,
    /// Output element type: f16 | f32
    #[clap(long, default_value = "f16")]
    to: String,
}

impl DequantizeArgs {
    pub fn dequantize(self) {
        let file = File::open(&self.file).unwrap();
        let mmap = unsafe { Mmap::map(&file) }.unwrap();

        let header = Header::read(&mmap);
        let body = &mmap[Header::SIZE..];

        let time = Instant::now();
        let data = dispatch(&header, body);
        info!(
            "dequantized {} elements ({} groups) in {:?}",
            header.len,
            header.groups(),
            time.elapsed()
        );

        let out = self.output.unwrap_or_else(|| self.file.with_extension("bin"));
        let time = Instant::now();
        let mut writer = BufWriter::new(File::create(&out).unwrap());
        match self.to.trim().to_lowercase().as_str() {
            "16" | "f16" | "fp16" | "half" => {
                for x in data {
                    writer.write_all(&x.to_le_bytes()).unwrap();
                }
            }
            "32" | "f32" | "fp32" | "float" => {
                for x in data {
                    writer.write_all(&x.to_f32().to_le_bytes()).unwrap();
                }
            }
            t => panic!("Unsupported output type: {t}"),
        }
        writer.flush().unwrap();
        info!("wrote {} in {:?}", out.display(), time.elapsed());
    }
}

#[rustfmt::skip]
fn dispatch(header: &Header, body: &[u8]) -> Vec<f16> {
    match (header.mode, header.bits) {
        (Mode::Symmetric       , 8) => run::<Symmetric<8>>       (header, body),
        (Mode::Symmetric       , 4) => run::<Symmetric<4>>       (header, body),
        (Mode::IntegerSymmetric, 8) => run::<IntegerSymmetric<8>>(header, body),
        (Mode::IntegerSymmetric, 4) => run::<IntegerSymmetric<4>>(header, body),
        (Mode::Asymmetric      , 8) => run::<Asymmetric<8>>      (header, body),
        (Mode::Asymmetric      , 4) => run::<Asymmetric<4>>      (header, body),
        (_, b) => panic!("Unsupported width: {b}"),
    }
}

fn run<P: QuantParams>(header: &Header, body: &[u8]) -> Vec<f16> {
    let qt = TileQuantizer::covering(header.count);
    let groups = header.groups();

    let records_bytes = groups * P::RECORD_STRIDE * size_of::<f32>();
    let records = reslice::<f32>(&body[..records_bytes]);
    let codes = &body[records_bytes..][..groups * qt.tile_bytes(P::BITS)];

    let mut dst = vec![f16::ZERO; groups * header.count];
    qt.dequantize_slice::<P>(codes, records, header.count, &mut dst)
        .unwrap();
    dst.truncate(header.len);
    dst
}
