// primer3.rs - Line-oriented parser for primer3 Boulder-IO output blocks

use crate::core::coordinates::check_layout;
use crate::data::record::{AmpliconInfo, CandidateRecord, Oligo};
use crate::error::{QpcrError, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

fn sliding_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+?)_sliding_(\d+)-(\d+)$").expect("valid regex"))
}

fn family_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^PRIMER_(LEFT|RIGHT|INTERNAL|PAIR)_(\d+)(?:_([A-Z0-9_]+))?$").expect("valid regex")
    })
}

/// Decoded SEQUENCE_ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionId {
    pub chromosome: String,
    pub window_offset: u64,
    /// 1-based inclusive window end, informational only
    pub window_end: Option<u64>,
}

/// Decode `<chrom>_sliding_<start>-<end>` (1-based window bounds) into a chromosome
/// and 0-based window offset. Ids without the pattern are whole chromosome names.
pub fn parse_sequence_id(sequence_id: &str) -> Result<RegionId> {
    let Some(caps) = sliding_pattern().captures(sequence_id) else {
        return Ok(RegionId {
            chromosome: sequence_id.to_string(),
            window_offset: 0,
            window_end: None,
        });
    };

    let start: u64 = caps[2]
        .parse()
        .map_err(|_| QpcrError::parse(sequence_id, "window start is not a valid integer"))?;
    let end: u64 = caps[3]
        .parse()
        .map_err(|_| QpcrError::parse(sequence_id, "window end is not a valid integer"))?;
    if start == 0 {
        return Err(QpcrError::parse(
            sequence_id,
            "window start must be 1-based (got 0)",
        ));
    }
    if start > end {
        return Err(QpcrError::parse(
            sequence_id,
            format!("window start {} is past window end {}", start, end),
        ));
    }

    Ok(RegionId {
        chromosome: caps[1].to_string(),
        window_offset: start - 1,
        window_end: Some(end),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Family {
    Left,
    Right,
    Internal,
}

/// Fields collected for one oligo family at one index
#[derive(Debug, Default)]
struct OligoFields {
    position: Option<(usize, usize)>,
    sequence: Option<String>,
    tm: Option<f64>,
    gc: Option<f64>,
}

impl OligoFields {
    fn has_aux(&self) -> bool {
        self.sequence.is_some() || self.tm.is_some() || self.gc.is_some()
    }
}

#[derive(Debug, Default)]
struct PairFields {
    product_size: Option<usize>,
    product_tm: Option<f64>,
}

/// Accumulator for one KEY=VALUE block
#[derive(Debug, Default)]
struct BlockFields {
    sequence_id: Option<String>,
    template: Option<String>,
    oligos: BTreeMap<(Family, usize), OligoFields>,
    pairs: BTreeMap<usize, PairFields>,
}

fn parse_position(value: &str, ctx: &str, key: &str) -> Result<(usize, usize)> {
    let (pos, len) = value
        .split_once(',')
        .ok_or_else(|| QpcrError::parse(ctx, format!("{} expects 'pos,len', got '{}'", key, value)))?;
    let pos = pos
        .trim()
        .parse::<usize>()
        .map_err(|_| QpcrError::parse(ctx, format!("{} has invalid position '{}'", key, pos)))?;
    let len = len
        .trim()
        .parse::<usize>()
        .map_err(|_| QpcrError::parse(ctx, format!("{} has invalid length '{}'", key, len)))?;
    Ok((pos, len))
}

fn parse_number<T: std::str::FromStr>(value: &str, ctx: &str, key: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| QpcrError::parse(ctx, format!("{} has invalid value '{}'", key, value)))
}

impl BlockFields {
    fn accept(&mut self, key: &str, value: &str, ctx: &str) -> Result<()> {
        match key {
            "SEQUENCE_ID" => {
                self.sequence_id = Some(value.trim().to_string());
                return Ok(());
            }
            "SEQUENCE_TEMPLATE" => {
                self.template = Some(value.trim().to_string());
                return Ok(());
            }
            _ => {}
        }

        let Some(caps) = family_pattern().captures(key) else {
            return Ok(());
        };
        let index: usize = parse_number(&caps[2], ctx, key)?;
        let suffix = caps.get(3).map(|m| m.as_str());

        let family = match &caps[1] {
            "LEFT" => Family::Left,
            "RIGHT" => Family::Right,
            "INTERNAL" => Family::Internal,
            _ => {
                let pair = self.pairs.entry(index).or_default();
                match suffix {
                    Some("PRODUCT_SIZE") => pair.product_size = Some(parse_number(value, ctx, key)?),
                    Some("PRODUCT_TM") => pair.product_tm = Some(parse_number(value, ctx, key)?),
                    _ => {}
                }
                return Ok(());
            }
        };

        let oligo = self.oligos.entry((family, index)).or_default();
        match suffix {
            None => oligo.position = Some(parse_position(value, ctx, key)?),
            Some("SEQUENCE") => oligo.sequence = Some(value.trim().to_string()),
            Some("TM") => oligo.tm = Some(parse_number(value, ctx, key)?),
            Some("GC_PERCENT") => oligo.gc = Some(parse_number(value, ctx, key)?),
            _ => {}
        }
        Ok(())
    }

    fn take_oligo(&mut self, family: Family, index: usize, ctx: &str) -> Result<Option<Oligo>> {
        let Some(fields) = self.oligos.remove(&(family, index)) else {
            return Ok(None);
        };
        let label = match family {
            Family::Left => "PRIMER_LEFT",
            Family::Right => "PRIMER_RIGHT",
            Family::Internal => "PRIMER_INTERNAL",
        };
        let Some((local_start, local_len)) = fields.position else {
            if fields.has_aux() {
                return Err(QpcrError::parse(
                    ctx,
                    format!("{}_{} has attributes but no position field", label, index),
                ));
            }
            return Ok(None);
        };
        let missing = |field: &str| {
            QpcrError::parse(ctx, format!("{}_{}_{} is missing", label, index, field))
        };

        Ok(Some(Oligo {
            local_start,
            local_len,
            tm: fields.tm.ok_or_else(|| missing("TM"))?,
            gc: fields.gc.ok_or_else(|| missing("GC_PERCENT"))?,
            sequence: fields.sequence.ok_or_else(|| missing("SEQUENCE"))?,
        }))
    }

    fn into_records(mut self, ctx: &str) -> Result<Vec<CandidateRecord>> {
        let sequence_id = self
            .sequence_id
            .take()
            .ok_or_else(|| QpcrError::parse(ctx, "SEQUENCE_ID is missing"))?;
        let template: Arc<str> = self
            .template
            .take()
            .ok_or_else(|| QpcrError::parse(ctx, "SEQUENCE_TEMPLATE is missing"))?
            .into();
        let region = parse_sequence_id(&sequence_id)?;

        let indices: Vec<usize> = self
            .oligos
            .iter()
            .filter(|((family, _), fields)| *family == Family::Left && fields.position.is_some())
            .map(|((_, index), _)| *index)
            .collect();

        let mut records = Vec::with_capacity(indices.len());
        for index in indices {
            let forward = self
                .take_oligo(Family::Left, index, ctx)?
                .ok_or_else(|| QpcrError::parse(ctx, format!("PRIMER_LEFT_{} vanished", index)))?;
            let reverse = self.take_oligo(Family::Right, index, ctx)?.ok_or_else(|| {
                QpcrError::parse(ctx, format!("PRIMER_RIGHT_{} is missing", index))
            })?;
            let probe = self.take_oligo(Family::Internal, index, ctx)?;
            let pair = self.pairs.remove(&index).unwrap_or_default();
            let amplicon = AmpliconInfo {
                tm: pair.product_tm.ok_or_else(|| {
                    QpcrError::parse(ctx, format!("PRIMER_PAIR_{}_PRODUCT_TM is missing", index))
                })?,
                product_size: pair.product_size.ok_or_else(|| {
                    QpcrError::parse(ctx, format!("PRIMER_PAIR_{}_PRODUCT_SIZE is missing", index))
                })?,
            };

            let record = CandidateRecord {
                region_id: sequence_id.clone(),
                chromosome: region.chromosome.clone(),
                window_offset: region.window_offset,
                index,
                template: Arc::clone(&template),
                forward,
                reverse,
                probe,
                amplicon,
            };
            check_layout(&record)?;
            records.push(record);
        }

        // Anything left over belongs to an index without a forward primer
        if let Some(((family, index), fields)) = self
            .oligos
            .iter()
            .find(|(_, fields)| fields.position.is_some() || fields.has_aux())
        {
            let label = match family {
                Family::Left => "PRIMER_LEFT",
                Family::Right => "PRIMER_RIGHT",
                Family::Internal => "PRIMER_INTERNAL",
            };
            let what = if fields.position.is_some() { "position" } else { "attributes" };
            return Err(QpcrError::parse(
                ctx,
                format!("{}_{} has {} but no matching PRIMER_LEFT_{}", label, index, what, index),
            ));
        }

        Ok(records)
    }
}

/// Parse one primer3 record block. A block without any `PRIMER_LEFT_i` entry yields
/// no records; that is the normal "no primer found" outcome.
pub fn parse_block(text: &str, context: &str) -> Result<Vec<CandidateRecord>> {
    let mut fields = BlockFields::default();
    let mut seen = HashSet::new();

    for (line_num, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line == "=" {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(QpcrError::parse(
                context,
                format!("line {} is not KEY=VALUE: '{}'", line_num + 1, line),
            ));
        };
        let key = key.trim();
        if !seen.insert(key) {
            return Err(QpcrError::parse(
                context,
                format!("line {} repeats key {}", line_num + 1, key),
            ));
        }
        fields.accept(key, value, context)?;
    }

    fields.into_records(context)
}

/// Split Boulder-IO text on `=` record terminators and parse every block
pub fn parse_blocks(text: &str, context: &str) -> Result<Vec<CandidateRecord>> {
    let mut records = Vec::new();
    let mut block = String::new();

    for line in text.lines() {
        if line.trim_end_matches('\r') == "=" {
            if !block.trim().is_empty() {
                records.extend(parse_block(&block, context)?);
            }
            block.clear();
        } else {
            block.push_str(line);
            block.push('\n');
        }
    }
    if !block.trim().is_empty() {
        records.extend(parse_block(&block, context)?);
    }

    Ok(records)
}

/// Read and parse a primer3 output file
pub fn parse_primer3_file(path: &Path) -> Result<Vec<CandidateRecord>> {
    let content = fs::read_to_string(path).map_err(|e| QpcrError::io(path, e))?;
    parse_blocks(&content, &path.display().to_string())
}
