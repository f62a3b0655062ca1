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
pub struct QuantizeArgs {
    /// Raw little-endian input file
    file: PathBuf,
    /// Output path; defaults to the input with a `.gqt` extension
    #[clap(long, short)]
    output: Option<PathBuf>,
    /// Quantization mode: symmetric | integer | asymmetric
    #[clap(long, default_value = "symmetric")]
    mode: String,
    /// Quantized width, 4 or 8
    #[clap(long, default_value_t = 8)]
    bits: u32,
    /// Elements sharing one parameter record
    #[clap(long, default_value_t = 64)]
    group: usize,
    /// Input element type: f16 | f32
    #[clap(long, default_value = "f16")]
    from: String,
}

impl QuantizeArgs {
    pub fn quantize(self) {
        let file = File::open(&self.file).unwrap();
        let mmap = unsafe { Mmap::map(&file) }.unwrap();

        let data: Vec<f16> = match self.from.trim().to_lowercase().as_str() {
            "16" | "f16" | "fp16" | "half" => reslice::<f16>(&mmap).to_vec(),
            "32" | "f32" | "fp32" | "float" => reslice::<f32>(&mmap)
                .iter()
                .map(|&x| f16::from_f32(x))
                .collect(),
            t => panic!("Unsupported input type: {t}"),
        };

        let header = Header {
            mode: Mode::parse(&self.mode),
            bits: self.bits,
            count: self.group,
            len: data.len(),
        };

        let time = Instant::now();
        let (records, codes) = dispatch(header.mode, self.bits, &data, self.group);
        info!(
            "quantized {} elements ({} groups) in {:?}",
            data.len(),
            header.groups(),
            time.elapsed()
        );

        let out = self.output.unwrap_or_else(|| self.file.with_extension("gqt"));
        let time = Instant::now();
        let mut writer = BufWriter::new(File::create(&out).unwrap());
        header.write(&mut writer).unwrap();
        for r in records {
            writer.write_all(&r.to_le_bytes()).unwrap();
        }
        writer.write_all(&codes).unwrap();
        writer.flush().unwrap();
        info!("wrote {} in {:?}", out.display(), time.elapsed());
    }
}

#[rustfmt::skip]
fn dispatch(mode: Mode, bits: u32, data: &[f16], group: usize) -> (Vec<f32>, Vec<u8>) {
    match (mode, bits) {
        (Mode::Symmetric       , 8) => run::<Symmetric<8>>       (data, group),
        (Mode::Symmetric       , 4) => run::<Symmetric<4>>       (data, group),
        (Mode::IntegerSymmetric, 8) => run::<IntegerSymmetric<8>>(data, group),
        (Mode::IntegerSymmetric, 4) => run::<IntegerSymmetric<4>>(data, group),
        (Mode::Asymmetric      , 8) => run::<Asymmetric<8>>      (data, group),
        (Mode::Asymmetric      , 4) => run::<Asymmetric<4>>      (data, group),
        (_, b) => panic!("Unsupported width: {b}"),
    }
}

fn run<P: QuantParams>(data: &[f16], group: usize) -> (Vec<f32>, Vec<u8>) {
    let qt = TileQuantizer::covering(group);
    let groups = data.len().div_ceil(group);

    let mut src = data.to_vec();
    src.resize(groups * group, f16::ZERO);

    let mut codes = vec![0; groups * qt.tile_bytes(P::BITS)];
    let mut records = vec![0.; groups * P::RECORD_STRIDE];
    qt.quantize_slice::<P>(&src, group, &mut codes, &mut records)
        .unwrap();
    (records, codes)
}
