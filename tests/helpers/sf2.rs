//! Byte-level SoundFont2 writer for fixture banks.
//!
//! Builds the RIFF container in memory: INFO, one `smpl` chunk and the nine
//! hydra chunks. Zones carry generators only; modulator lists are left to
//! the SoundFont2 defaults.

use sfsynth::soundfont::GeneratorType;

/// One zone's generators, in file order.
#[derive(Debug, Clone, Default)]
pub struct Zone(pub Vec<(GeneratorType, i16)>);

impl Zone {
    pub fn new(generators: &[(GeneratorType, i16)]) -> Self {
        Self(generators.to_vec())
    }

    /// Preset zone pointing at an instrument.
    pub fn instrument(index: i16) -> Self {
        Self::new(&[(GeneratorType::Instrument, index)])
    }

    /// Instrument zone playing a sample with extra generators.
    pub fn sample(index: i16, generators: &[(GeneratorType, i16)]) -> Self {
        let mut zone = generators.to_vec();
        zone.push((GeneratorType::SampleId, index));
        Self(zone)
    }
}

struct Header {
    name: String,
    bank: u16,
    program: u16,
    zones: Vec<Zone>,
}

struct SampleHeader {
    name: String,
    start: u32,
    end: u32,
    loop_start: u32,
    loop_end: u32,
    sample_rate: u32,
    original_pitch: u8,
}

#[derive(Default)]
pub struct Sf2Builder {
    name: Option<String>,
    pcm: Vec<i16>,
    samples: Vec<SampleHeader>,
    instruments: Vec<Header>,
    presets: Vec<Header>,
}

impl Sf2Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `INAM` entry.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// 44.1 kHz sample rooted at middle C. Loop points are relative to the
    /// sample start.
    pub fn sample(self, name: &str, pcm: &[i16], loop_points: (u32, u32)) -> Self {
        self.sample_with(name, pcm, loop_points, 44100, 60)
    }

    pub fn sample_with(
        mut self,
        name: &str,
        pcm: &[i16],
        loop_points: (u32, u32),
        sample_rate: u32,
        original_pitch: u8,
    ) -> Self {
        let start = self.pcm.len() as u32;
        self.pcm.extend_from_slice(pcm);
        let end = self.pcm.len() as u32;
        // Zero guard frames between samples
        self.pcm.extend(std::iter::repeat(0).take(46));
        self.samples.push(SampleHeader {
            name: name.to_string(),
            start,
            end,
            loop_start: start + loop_points.0,
            loop_end: start + loop_points.1,
            sample_rate,
            original_pitch,
        });
        self
    }

    pub fn instrument(mut self, name: &str, zones: Vec<Zone>) -> Self {
        self.instruments.push(Header {
            name: name.to_string(),
            bank: 0,
            program: 0,
            zones,
        });
        self
    }

    pub fn preset(mut self, name: &str, bank: u16, program: u16, zones: Vec<Zone>) -> Self {
        self.presets.push(Header {
            name: name.to_string(),
            bank,
            program,
            zones,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut info = vec![chunk(b"ifil", &[2, 0, 4, 0])];
        if let Some(name) = &self.name {
            let mut text = name.as_bytes().to_vec();
            text.push(0);
            info.push(chunk(b"INAM", &text));
        }

        let pcm: Vec<u8> = self.pcm.iter().flat_map(|s| s.to_le_bytes()).collect();

        let (phdr, pbag, pmod, pgen) = hydra(&self.presets, true);
        let (inst, ibag, imod, igen) = hydra(&self.instruments, false);

        let mut shdr = Vec::new();
        for s in &self.samples {
            shdr.extend_from_slice(&name20(&s.name));
            for value in [s.start, s.end, s.loop_start, s.loop_end, s.sample_rate] {
                shdr.extend_from_slice(&value.to_le_bytes());
            }
            shdr.push(s.original_pitch);
            shdr.push(0);
            // sample link, mono sample type
            shdr.extend_from_slice(&0u16.to_le_bytes());
            shdr.extend_from_slice(&1u16.to_le_bytes());
        }
        shdr.extend_from_slice(&name20("EOS"));
        shdr.extend_from_slice(&[0; 26]);

        let mut form = b"sfbk".to_vec();
        form.extend(list(b"INFO", &info));
        form.extend(list(b"sdta", &[chunk(b"smpl", &pcm)]));
        form.extend(list(
            b"pdta",
            &[
                chunk(b"phdr", &phdr),
                chunk(b"pbag", &pbag),
                chunk(b"pmod", &pmod),
                chunk(b"pgen", &pgen),
                chunk(b"inst", &inst),
                chunk(b"ibag", &ibag),
                chunk(b"imod", &imod),
                chunk(b"igen", &igen),
                chunk(b"shdr", &shdr),
            ],
        ));
        chunk(b"RIFF", &form)
    }
}

fn hydra(headers: &[Header], presets: bool) -> (Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>) {
    let (mut hdr, mut bag, mut gens) = (Vec::new(), Vec::new(), Vec::new());
    let (mut bag_count, mut gen_count) = (0u16, 0u16);

    let write_header = |hdr: &mut Vec<u8>, name: &str, bank: u16, program: u16, bag_index: u16| {
        hdr.extend_from_slice(&name20(name));
        if presets {
            hdr.extend_from_slice(&program.to_le_bytes());
            hdr.extend_from_slice(&bank.to_le_bytes());
            hdr.extend_from_slice(&bag_index.to_le_bytes());
            hdr.extend_from_slice(&[0; 12]);
        } else {
            hdr.extend_from_slice(&bag_index.to_le_bytes());
        }
    };

    for header in headers {
        write_header(&mut hdr, &header.name, header.bank, header.program, bag_count);
        for zone in &header.zones {
            bag.extend_from_slice(&gen_count.to_le_bytes());
            bag.extend_from_slice(&0u16.to_le_bytes());
            bag_count += 1;
            for (ty, amount) in &zone.0 {
                gens.extend_from_slice(&(*ty as u16).to_le_bytes());
                gens.extend_from_slice(&amount.to_le_bytes());
                gen_count += 1;
            }
        }
    }
    write_header(&mut hdr, if presets { "EOP" } else { "EOI" }, 0, 0, bag_count);
    bag.extend_from_slice(&gen_count.to_le_bytes());
    bag.extend_from_slice(&0u16.to_le_bytes());
    gens.extend_from_slice(&[0; 4]);
    (hdr, bag, vec![0; 10], gens)
}

fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn list(form: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = form.to_vec();
    for c in chunks {
        payload.extend_from_slice(c);
    }
    chunk(b"LIST", &payload)
}

fn name20(name: &str) -> [u8; 20] {
    let mut out = [0; 20];
    for (dst, src) in out.iter_mut().zip(name.bytes().take(19)) {
        *dst = src;
    }
    out
}
