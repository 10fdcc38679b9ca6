// coordinates.rs - Window-local primer3 offsets to absolute genome coordinates

use crate::data::record::{CandidateRecord, Oligo};
use crate::error::{QpcrError, Result};

/// 1-based inclusive genome interval of one oligo.
///
/// For reverse primers `start` is the rightmost (5'-distal on the plus strand) base and
/// `end` the leftmost, so `start > end`. Use [`GenomeSpan::leftmost`] and
/// [`GenomeSpan::rightmost`] when an ordered interval is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomeSpan {
    pub start: i64,
    pub end: i64,
}

impl GenomeSpan {
    pub fn leftmost(&self) -> i64 {
        self.start.min(self.end)
    }

    pub fn rightmost(&self) -> i64 {
        self.start.max(self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteCoordinates {
    pub forward: GenomeSpan,
    pub reverse: GenomeSpan,
    pub probe: Option<GenomeSpan>,
    /// Local 0-based inclusive bounds of the amplicon in the template
    pub amplicon_bounds: (usize, usize),
    pub amplicon_sequence: String,
    pub amplicon_gc: f64,
}

impl AbsoluteCoordinates {
    /// Forward 5' base through the reverse primer's rightmost base
    pub fn amplicon_length(&self) -> i64 {
        self.reverse.rightmost() - self.forward.start + 1
    }
}

/// Forward-oriented oligo (forward primer or probe): `pos` is the leftmost base
pub fn forward_span(window_offset: u64, oligo: &Oligo) -> GenomeSpan {
    let base = window_offset as i64 + oligo.local_start as i64;
    GenomeSpan {
        start: base + 1,
        end: base + oligo.local_len as i64,
    }
}

/// Reverse primer: primer3 reports `pos` as the rightmost (3') base
pub fn reverse_span(window_offset: u64, oligo: &Oligo) -> GenomeSpan {
    let base = window_offset as i64 + oligo.local_start as i64;
    GenomeSpan {
        start: base + 1,
        end: base - oligo.local_len as i64 + 2,
    }
}

/// GC fraction of a sequence; 0 for an empty sequence
pub fn gc_fraction(sequence: &str) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc = sequence
        .bytes()
        .filter(|b| matches!(b, b'G' | b'C' | b'g' | b'c'))
        .count();
    gc as f64 / sequence.len() as f64
}

/// Map one candidate's local offsets onto the genome
pub fn map_record(record: &CandidateRecord) -> AbsoluteCoordinates {
    let offset = record.window_offset;
    let start = record.forward.local_start;
    let end = record.reverse.local_start;

    let amplicon_sequence = if start <= end {
        record.template.get(start..=end).unwrap_or("").to_string()
    } else {
        String::new()
    };

    AbsoluteCoordinates {
        forward: forward_span(offset, &record.forward),
        reverse: reverse_span(offset, &record.reverse),
        probe: record.probe.as_ref().map(|p| forward_span(offset, p)),
        amplicon_bounds: (start, end),
        amplicon_gc: gc_fraction(&amplicon_sequence),
        amplicon_sequence,
    }
}

/// Reject candidates whose oligos cannot form the amplicon primer3 reports: a reverse
/// primer running off the template start, a forward primer at or past the reverse 3'
/// edge, a probe overlapping either primer, or a product size that disagrees with the
/// primer positions.
pub fn check_layout(record: &CandidateRecord) -> Result<()> {
    let fail = |msg: String| {
        Err(QpcrError::parse(
            record.region_id.as_str(),
            format!("candidate {}: {}", record.index, msg),
        ))
    };
    let forward = &record.forward;
    let reverse = &record.reverse;

    if reverse.local_start + 1 < reverse.local_len {
        return fail(format!(
            "reverse 3' offset {} is shorter than its length {}",
            reverse.local_start, reverse.local_len
        ));
    }
    if forward.local_start >= reverse.local_start {
        return fail(format!(
            "forward start {} is not before reverse 3' edge {}",
            forward.local_start, reverse.local_start
        ));
    }
    if let Some(probe) = &record.probe {
        let forward_right = forward.local_start + forward.local_len;
        let reverse_left = reverse.local_start + 1 - reverse.local_len;
        if probe.local_start < forward_right || probe.local_start + probe.local_len > reverse_left {
            return fail(format!(
                "probe {},{} is not between forward right edge {} and reverse left edge {}",
                probe.local_start, probe.local_len, forward_right, reverse_left
            ));
        }
    }

    let length = map_record(record).amplicon_length();
    if length != record.amplicon.product_size as i64 {
        return fail(format!(
            "product size {} disagrees with primer span {}",
            record.amplicon.product_size, length
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::AmpliconInfo;
    use std::sync::Arc;

    fn oligo(pos: usize, len: usize) -> Oligo {
        Oligo {
            local_start: pos,
            local_len: len,
            tm: 60.0,
            gc: 50.0,
            sequence: "A".repeat(len),
        }
    }

    fn record(template: &str, offset: u64, fwd: Oligo, rvs: Oligo) -> CandidateRecord {
        CandidateRecord {
            region_id: "r".to_string(),
            chromosome: "r".to_string(),
            window_offset: offset,
            index: 0,
            template: Arc::from(template),
            forward: fwd,
            reverse: rvs,
            probe: None,
            amplicon: AmpliconInfo {
                tm: 80.0,
                product_size: 0,
            },
        }
    }

    #[test]
    fn test_forward_span_with_window() {
        let span = forward_span(4260, &oligo(50, 20));
        assert_eq!(span.start, 4311);
        assert_eq!(span.end, 4330);
    }

    #[test]
    fn test_reverse_span_is_reversed() {
        let span = reverse_span(0, &oligo(300, 22));
        assert_eq!(span.start, 301);
        assert_eq!(span.end, 280);
        assert_eq!(span.leftmost(), 280);
        assert_eq!(span.rightmost(), 301);
    }

    #[test]
    fn test_amplicon_substring_and_gc() {
        // forward at 2, reverse 3' end at 9 -> template[2..=9]
        let rec = record("TTGGCCAATTAA", 100, oligo(2, 3), oligo(9, 3));
        let coords = map_record(&rec);
        assert_eq!(coords.amplicon_sequence, "GGCCAATT");
        assert!((coords.amplicon_gc - 0.5).abs() < 1e-12);
        assert_eq!(coords.amplicon_bounds, (2, 9));
        assert_eq!(coords.amplicon_length(), 8);
        assert_eq!(coords.forward.start, 103);
        assert_eq!(coords.reverse.start, 110);
    }

    fn laid_out(product_size: usize, probe: Option<Oligo>) -> CandidateRecord {
        let mut rec = record(&"A".repeat(100), 0, oligo(10, 20), oligo(89, 20));
        rec.amplicon.product_size = product_size;
        rec.probe = probe;
        rec
    }

    #[test]
    fn test_layout_accepts_consistent_candidate() {
        assert!(check_layout(&laid_out(80, Some(oligo(30, 20)))).is_ok());
        // probe may touch both primers
        assert!(check_layout(&laid_out(80, Some(oligo(30, 40)))).is_ok());
        assert!(check_layout(&laid_out(80, None)).is_ok());
    }

    #[test]
    fn test_layout_rejects_probe_outside_primers() {
        assert!(check_layout(&laid_out(80, Some(oligo(25, 20)))).is_err());
        assert!(check_layout(&laid_out(80, Some(oligo(60, 20)))).is_err());
    }

    #[test]
    fn test_layout_rejects_reverse_past_template_start() {
        let mut rec = laid_out(80, None);
        rec.forward = oligo(0, 2);
        rec.reverse = oligo(3, 10);
        rec.amplicon.product_size = 4;
        match check_layout(&rec) {
            Err(QpcrError::Parse { msg, .. }) => assert!(msg.contains("candidate 0")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_layout_rejects_forward_after_reverse() {
        let mut rec = laid_out(80, None);
        rec.forward = oligo(60, 10);
        rec.reverse = oligo(20, 10);
        assert!(check_layout(&rec).is_err());
    }

    #[test]
    fn test_layout_rejects_product_size_mismatch() {
        assert!(check_layout(&laid_out(79, None)).is_err());
    }

    #[test]
    fn test_empty_amplicon_gc_is_zero() {
        let rec = record("ACGT", 0, oligo(2, 2), oligo(50, 2));
        let coords = map_record(&rec);
        assert_eq!(coords.amplicon_sequence, "");
        assert_eq!(coords.amplicon_gc, 0.0);
        assert_eq!(gc_fraction(""), 0.0);
    }
}
