//! SoundFont2 container decoding.
//!
//! The file is a `RIFF` form of type `sfbk` holding three lists:
//!
//! - `INFO`: metadata sub-chunks, kept verbatim
//! - `sdta`: the `smpl` PCM payload, located but not copied
//! - `pdta`: the nine hydra sub-chunks, in fixed order
//!
//! Each hydra sub-chunk is an array of fixed-size records ending in a
//! terminal record. Bags point into the generator and modulator arrays by
//! index; a zone owns the run between its bag index and the next one.

use crate::chunk::{tag_to_string, ChunkReader, RiffChunk};
use crate::error::{Error, Result};
use crate::generator::{Generator, GeneratorType};
use crate::instrument::Instrument;
use crate::modulator::{Modulator, ModulatorSource, SourceController, TransformType};
use crate::preset::Preset;
use crate::sample::Sample;
use crate::zone::{KeyRange, Zone};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

const PHDR_SIZE: usize = 38;
const BAG_SIZE: usize = 4;
const MOD_SIZE: usize = 10;
const GEN_SIZE: usize = 4;
const INST_SIZE: usize = 22;
const SHDR_SIZE: usize = 46;

/// One `INFO` sub-chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoEntry {
    pub tag: String,
    pub text: String,
}

/// Decoded container, before the catalog takes ownership of the presets.
#[derive(Debug)]
pub(crate) struct Hydra {
    pub info: Vec<InfoEntry>,
    /// Byte range of the `smpl` payload in the source buffer.
    pub sample_data: Range<usize>,
    pub presets: Vec<Preset>,
    pub instruments: Vec<Arc<Instrument>>,
    pub samples: Vec<Arc<Sample>>,
}

struct PresetHeader {
    name: String,
    program: u16,
    bank: u16,
    bag: u16,
    library: u32,
    genre: u32,
    morphology: u32,
}

struct InstrumentHeader {
    name: String,
    bag: u16,
}

#[derive(Clone, Copy)]
struct Bag {
    generator: u16,
    modulator: u16,
}

#[derive(Clone, Copy)]
struct RawGenerator {
    operator: u16,
    amount: i16,
}

#[derive(Clone, Copy)]
struct RawModulator {
    source: u16,
    destination: u16,
    amount: i16,
    amount_source: u16,
    transform: u16,
}

/// Decode a complete SoundFont2 file.
pub(crate) fn decode(data: &[u8]) -> Result<Hydra> {
    let mut reader = ChunkReader::new(data);
    let riff = reader.read_chunk()?;
    expect_tag(&riff, "RIFF")?;

    let mut form = riff.reader();
    expect_form(&mut form, "sfbk")?;

    let info = read_info(&mut form)?;
    let sample_data = read_sample_data(&mut form)?;

    let pdta = form.read_chunk()?;
    expect_tag(&pdta, "LIST")?;
    let mut hydra = pdta.reader();
    expect_form(&mut hydra, "pdta")?;

    let phdr = next_subchunk(&mut hydra, "phdr")?;
    let pbag = next_subchunk(&mut hydra, "pbag")?;
    let pmod = next_subchunk(&mut hydra, "pmod")?;
    let pgen = next_subchunk(&mut hydra, "pgen")?;
    let inst = next_subchunk(&mut hydra, "inst")?;
    let ibag = next_subchunk(&mut hydra, "ibag")?;
    let imod = next_subchunk(&mut hydra, "imod")?;
    let igen = next_subchunk(&mut hydra, "igen")?;
    let shdr = next_subchunk(&mut hydra, "shdr")?;

    let mut samples: Vec<Arc<Sample>> = read_records(&shdr, "shdr", SHDR_SIZE, read_sample)?
        .into_iter()
        .map(Arc::new)
        .collect();
    // Terminal sample record ("EOS")
    samples.pop();

    let instrument_headers = read_records(&inst, "inst", INST_SIZE, |r, _| {
        Ok(InstrumentHeader {
            name: r.read_ascii_string(20)?,
            bag: r.read_u16()?,
        })
    })?;
    let instrument_bags = read_records(&ibag, "ibag", BAG_SIZE, read_bag)?;
    let instrument_mods = read_records(&imod, "imod", MOD_SIZE, read_modulator)?;
    let instrument_gens = read_records(&igen, "igen", GEN_SIZE, read_generator)?;

    let zone_tables = ZoneTables {
        bags: &instrument_bags,
        generators: &instrument_gens,
        modulators: &instrument_mods,
        reference: GeneratorType::SampleId,
    };
    let mut instruments = Vec::with_capacity(instrument_headers.len().saturating_sub(1));
    for (index, pair) in instrument_headers.windows(2).enumerate() {
        let zones = zone_tables.build("inst", index, pair[0].bag, pair[1].bag, &samples)?;
        instruments.push(Arc::new(Instrument {
            name: pair[0].name.clone(),
            zones,
        }));
    }

    let preset_headers = read_records(&phdr, "phdr", PHDR_SIZE, |r, _| {
        Ok(PresetHeader {
            name: r.read_ascii_string(20)?,
            program: r.read_u16()?,
            bank: r.read_u16()?,
            bag: r.read_u16()?,
            library: r.read_u32()?,
            genre: r.read_u32()?,
            morphology: r.read_u32()?,
        })
    })?;
    let preset_bags = read_records(&pbag, "pbag", BAG_SIZE, read_bag)?;
    let preset_mods = read_records(&pmod, "pmod", MOD_SIZE, read_modulator)?;
    let preset_gens = read_records(&pgen, "pgen", GEN_SIZE, read_generator)?;

    let zone_tables = ZoneTables {
        bags: &preset_bags,
        generators: &preset_gens,
        modulators: &preset_mods,
        reference: GeneratorType::Instrument,
    };
    let mut presets = Vec::with_capacity(preset_headers.len().saturating_sub(1));
    for (index, pair) in preset_headers.windows(2).enumerate() {
        let header = &pair[0];
        let zones = zone_tables.build("phdr", index, header.bag, pair[1].bag, &instruments)?;
        presets.push(Preset {
            name: header.name.clone(),
            program: header.program,
            bank: header.bank,
            library: header.library,
            genre: header.genre,
            morphology: header.morphology,
            zones,
        });
    }

    info!(
        "Decoded SoundFont: {} presets, {} instruments, {} samples",
        presets.len(),
        instruments.len(),
        samples.len()
    );

    Ok(Hydra {
        info,
        sample_data,
        presets,
        instruments,
        samples,
    })
}

fn expect_tag(chunk: &RiffChunk<'_>, expected: &'static str) -> Result<()> {
    if chunk.is(expected) {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            offset: chunk.offset,
            expected,
            found: chunk.tag_str(),
        })
    }
}

fn expect_form(reader: &mut ChunkReader<'_>, expected: &'static str) -> Result<()> {
    let offset = reader.position();
    let form = reader.read_tag()?;
    if form.eq_ignore_ascii_case(expected.as_bytes()) {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            offset,
            expected,
            found: tag_to_string(&form),
        })
    }
}

fn next_subchunk<'a>(
    reader: &mut ChunkReader<'a>,
    expected: &'static str,
) -> Result<RiffChunk<'a>> {
    if reader.is_empty() {
        return Err(Error::InvalidFormat {
            offset: reader.position(),
            expected,
            found: "end of list".to_string(),
        });
    }
    let chunk = reader.read_chunk()?;
    expect_tag(&chunk, expected)?;
    Ok(chunk)
}

fn read_info(form: &mut ChunkReader<'_>) -> Result<Vec<InfoEntry>> {
    let list = form.read_chunk()?;
    expect_tag(&list, "LIST")?;
    let mut reader = list.reader();
    expect_form(&mut reader, "INFO")?;

    let mut entries = Vec::new();
    while !reader.is_empty() {
        let chunk = reader.read_chunk()?;
        let text = chunk.reader().read_ascii_string(chunk.payload.len())?;
        debug!("INFO {}: {}", chunk.tag_str(), text);
        entries.push(InfoEntry {
            tag: chunk.tag_str(),
            text,
        });
    }
    Ok(entries)
}

fn read_sample_data(form: &mut ChunkReader<'_>) -> Result<Range<usize>> {
    let list = form.read_chunk()?;
    expect_tag(&list, "LIST")?;
    let mut reader = list.reader();
    expect_form(&mut reader, "sdta")?;

    let smpl = next_subchunk(&mut reader, "smpl")?;
    let start = smpl.payload_offset();
    Ok(start..start + smpl.payload.len())
}

/// Decode every record of a hydra sub-chunk, terminal record included.
fn read_records<T>(
    chunk: &RiffChunk<'_>,
    name: &'static str,
    size: usize,
    mut read: impl FnMut(&mut ChunkReader<'_>, usize) -> Result<T>,
) -> Result<Vec<T>> {
    let len = chunk.payload.len();
    if len % size != 0 {
        return Err(Error::CorruptHydra {
            chunk: name,
            index: len / size,
            reason: format!("chunk size {len} is not a multiple of {size}"),
        });
    }
    let count = len / size;
    if count == 0 {
        return Err(Error::CorruptHydra {
            chunk: name,
            index: 0,
            reason: "missing terminal record".to_string(),
        });
    }
    let mut reader = chunk.reader();
    (0..count).map(|index| read(&mut reader, index)).collect()
}

fn read_bag(reader: &mut ChunkReader<'_>, _: usize) -> Result<Bag> {
    Ok(Bag {
        generator: reader.read_u16()?,
        modulator: reader.read_u16()?,
    })
}

fn read_generator(reader: &mut ChunkReader<'_>, _: usize) -> Result<RawGenerator> {
    Ok(RawGenerator {
        operator: reader.read_u16()?,
        amount: reader.read_i16()?,
    })
}

fn read_modulator(reader: &mut ChunkReader<'_>, _: usize) -> Result<RawModulator> {
    Ok(RawModulator {
        source: reader.read_u16()?,
        destination: reader.read_u16()?,
        amount: reader.read_i16()?,
        amount_source: reader.read_u16()?,
        transform: reader.read_u16()?,
    })
}

fn read_sample(reader: &mut ChunkReader<'_>, id: usize) -> Result<Sample> {
    Ok(Sample {
        id,
        name: reader.read_ascii_string(20)?,
        start: reader.read_u32()?,
        end: reader.read_u32()?,
        loop_start: reader.read_u32()?,
        loop_end: reader.read_u32()?,
        sample_rate: reader.read_u32()?,
        original_pitch: reader.read_u8()?,
        pitch_correction: reader.read_i8()?,
        sample_link: reader.read_u16()?,
        sample_type: reader.read_u16()?,
    })
}

/// Bag, generator and modulator arrays of one hierarchy level.
struct ZoneTables<'a> {
    bags: &'a [Bag],
    generators: &'a [RawGenerator],
    modulators: &'a [RawModulator],
    /// Generator that links a zone to the level below.
    reference: GeneratorType,
}

impl ZoneTables<'_> {
    /// Build the zones of one header from its bag run `first..last`.
    fn build<R>(
        &self,
        chunk: &'static str,
        header: usize,
        first: u16,
        last: u16,
        targets: &[Arc<R>],
    ) -> Result<Vec<Zone<R>>> {
        let (first, last) = (first as usize, last as usize);
        // The final bag is terminal and only bounds the previous zone
        if first > last || last >= self.bags.len() {
            return Err(Error::CorruptHydra {
                chunk,
                index: header,
                reason: format!(
                    "bag range {first}..{last} outside {} bags",
                    self.bags.len() - 1
                ),
            });
        }

        let mut zones = Vec::with_capacity(last - first);
        for bag_index in first..last {
            let (bag, next) = (self.bags[bag_index], self.bags[bag_index + 1]);
            let generators = self.run(
                chunk,
                header,
                bag.generator,
                next.generator,
                self.generators.len(),
                "generator",
            )?;
            let modulators = self.run(
                chunk,
                header,
                bag.modulator,
                next.modulator,
                self.modulators.len(),
                "modulator",
            )?;

            let mut zone = Zone::default();
            for raw in &self.generators[generators] {
                let Some(ty) = GeneratorType::from_u16(raw.operator) else {
                    debug!("Skipping unknown generator {}", raw.operator);
                    continue;
                };
                let generator = Generator::new(ty, raw.amount);
                match ty {
                    GeneratorType::KeyRange => zone.key_range = to_range(generator.range()),
                    GeneratorType::VelRange => zone.velocity_range = to_range(generator.range()),
                    _ if ty == self.reference => {
                        let target = raw.amount as u16 as usize;
                        if target >= targets.len() {
                            return Err(Error::CorruptHydra {
                                chunk,
                                index: header,
                                reason: format!("zone references missing record {target}"),
                            });
                        }
                        zone.reference = Some(Arc::clone(&targets[target]));
                        continue;
                    }
                    _ => {}
                }
                zone.generators.push(generator);
            }
            zone.modulators = self.modulators[modulators]
                .iter()
                .filter_map(convert_modulator)
                .collect();

            // Only the first zone may be global
            if zone.is_global() && bag_index != first {
                debug!("Dropping global zone {} of {} {}", bag_index, chunk, header);
                continue;
            }
            zones.push(zone);
        }
        Ok(zones)
    }

    /// Validate a generator or modulator run. `records` includes the
    /// terminal record, which no zone may own.
    fn run(
        &self,
        chunk: &'static str,
        header: usize,
        start: u16,
        end: u16,
        records: usize,
        kind: &str,
    ) -> Result<Range<usize>> {
        let (start, end) = (start as usize, end as usize);
        if start > end || end >= records {
            return Err(Error::CorruptHydra {
                chunk,
                index: header,
                reason: format!(
                    "{kind} range {start}..{end} outside {} records",
                    records.saturating_sub(1)
                ),
            });
        }
        Ok(start..end)
    }
}

fn to_range((low, high): (u8, u8)) -> KeyRange {
    KeyRange { low, high }
}

fn convert_modulator(raw: &RawModulator) -> Option<Modulator> {
    let Some(destination) = GeneratorType::from_u16(raw.destination) else {
        // Destinations with bit 15 set feed another modulator
        debug!("Skipping linked modulator with destination {:#06x}", raw.destination);
        return None;
    };
    let source = ModulatorSource::from_raw(raw.source);
    if source.controller() == SourceController::Link {
        return None;
    }
    Some(Modulator {
        source,
        destination,
        amount: raw.amount,
        amount_source: ModulatorSource::from_raw(raw.amount_source),
        transform: TransformType::from_raw(raw.transform),
    })
}
