use crate::gq_file::{Header, Mode};
use group_quants::TileQuantizer;
use memmap2::Mmap;
use std::{fs::File, path::PathBuf};

#[derive(Args)]
pub struct ShowArgs {
    /// Quantized file to inspect
    file: PathBuf,
}

impl ShowArgs {
    pub fn show(self) {
        let file_name = self.file.file_name().unwrap().to_str().unwrap().to_string();
        println!(
            "\
+-{0:-<1$}-+
| {file_name} |
+-{0:-<1$}-+
",
            "",
            file_name.len()
        );

        let file = File::open(&self.file).unwrap();
        let file = unsafe { Mmap::map(&file) }.unwrap();
        let header = Header::read(&file);

        let stride = match header.mode {
            Mode::Asymmetric => 2,
            _ => 1,
        };
        let qt = TileQuantizer::covering(header.count);
        let records_bytes = header.groups() * stride * size_of::<f32>();
        let codes_bytes = header.groups() * qt.tile_bytes(header.bits);
        let raw_bytes = header.len * 2;

        println!("mode: {}", header.mode.name());
        println!("bits: {}", header.bits);
        println!("group size: {}", header.count);
        println!("elements: {} in {} groups", header.len, header.groups());
        println!("records: {records_bytes} bytes");
        println!("codes: {codes_bytes} bytes (chunk-padded)");
        println!(
            "compression: {:.2}x vs raw f16",
            raw_bytes as f64 / (Header::SIZE + records_bytes + codes_bytes) as f64
        );
    }
}
