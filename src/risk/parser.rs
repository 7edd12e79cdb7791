//! Two-stage tolerant parser for variant-call files.
//!
//! The primary pass decodes strictly and extracts annotation hints from the
//! info column. When it fails partway through (e.g., on a decoding error),
//! the whole source is re-read by a laxer pass that decodes lossily and skips
//! anything it cannot make sense of. The lax pass does not extract hints.

use std::{
    io::{BufRead, BufReader, Read},
    path::Path,
};

use crate::common::normalize_chrom;
use crate::genes::GeneRegionTable;
use crate::risk::matcher::GeneOverlapMatcher;
use crate::risk::schema::{MatchedVariant, RawVariantLine};

/// Which parse path produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ParseStrategy {
    /// Strict pass succeeded.
    Primary,
    /// Strict pass failed, lax pass was used.
    Fallback,
}

/// Result of parsing one variant source.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// Variants matched against the gene region table.
    pub variants: Vec<MatchedVariant>,
    /// Which parse path executed.
    pub strategy: ParseStrategy,
    /// Number of data lines skipped as malformed.
    pub skipped_lines: usize,
}

/// Parse the variant source at `path`, matching against `genes` inline.
///
/// Gene matching happens during parsing so that only variants inside panel
/// genes are retained. The strict pass runs first; any error partway through
/// triggers the lax pass over the whole source.
pub fn parse_variants(
    path: &Path,
    genes: &GeneRegionTable,
) -> Result<ParseOutcome, anyhow::Error> {
    match parse_primary(path, genes) {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::warn!(
                "strict parse of {:?} failed ({}), re-reading with lax parser",
                path,
                e
            );
            parse_fallback(path, genes)
        }
    }
}

fn parse_primary(path: &Path, genes: &GeneRegionTable) -> Result<ParseOutcome, anyhow::Error> {
    let matcher = GeneOverlapMatcher::new(genes);
    let reader = crate::common::io::open_read_maybe_gz(path)?;

    let mut variants = Vec::new();
    let mut skipped_lines = 0;
    let mut in_header = true;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('#') {
            if rest.starts_with("CHROM") {
                // Column header line, data starts after it.
                in_header = false;
                let columns = rest.split('\t').count();
                if columns < 8 {
                    tracing::debug!("column header declares only {} columns", columns);
                }
            }
            continue;
        }
        if in_header {
            continue;
        }
        match parse_data_line(line, idx + 1) {
            Some(raw) => variants.extend(matcher.match_line(&raw)),
            None => skipped_lines += 1,
        }
    }

    Ok(ParseOutcome {
        variants,
        strategy: ParseStrategy::Primary,
        skipped_lines,
    })
}

/// Parse one tab-separated data line, `None` when the line is malformed.
fn parse_data_line(line: &str, line_no: usize) -> Option<RawVariantLine> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 5 {
        tracing::warn!(
            "line {} has only {} columns, skipping",
            line_no,
            fields.len()
        );
        return None;
    }

    let chrom = normalize_chrom(fields[0]);
    let pos = match fields[1].parse::<u64>() {
        Ok(pos) if pos > 0 => pos,
        _ => {
            tracing::warn!(
                "invalid position at line {}: {:?}, skipping",
                line_no,
                fields[1]
            );
            return None;
        }
    };
    if fields[3].is_empty() {
        tracing::warn!("empty reference allele at line {}, skipping", line_no);
        return None;
    }

    Some(RawVariantLine {
        chrom,
        pos,
        id: (fields[2] != ".").then(|| fields[2].to_string()),
        reference: fields[3].to_string(),
        alternatives: fields[4]
            .split(',')
            .filter(|alt| !alt.is_empty())
            .map(|alt| alt.to_string())
            .collect(),
        qual: fields.get(5).map(|s| s.to_string()),
        filter: fields.get(6).map(|s| s.to_string()),
        info: fields.get(7).map(|s| s.to_string()),
    })
}

/// Lax pass: raw bytes, lossy decoding, no header tracking, no hints.
fn parse_fallback(path: &Path, genes: &GeneRegionTable) -> Result<ParseOutcome, anyhow::Error> {
    let matcher = GeneOverlapMatcher::new(genes);
    let mut reader = BufReader::new(std::fs::File::open(path)?);

    let mut variants = Vec::new();
    let mut skipped_lines = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.by_ref().read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_fallback_line(line) {
            Some(raw) => variants.extend(matcher.match_bare(&raw)),
            None => skipped_lines += 1,
        }
    }

    Ok(ParseOutcome {
        variants,
        strategy: ParseStrategy::Fallback,
        skipped_lines,
    })
}

fn parse_fallback_line(line: &str) -> Option<RawVariantLine> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 5 {
        return None;
    }
    let pos = match fields[1].parse::<u64>() {
        Ok(pos) if pos > 0 => pos,
        _ => return None,
    };
    if fields[3].is_empty() {
        return None;
    }

    Some(RawVariantLine {
        chrom: normalize_chrom(fields[0]),
        pos,
        id: None,
        reference: fields[3].to_string(),
        alternatives: fields[4]
            .split(',')
            .filter(|alt| !alt.is_empty())
            .map(|alt| alt.to_string())
            .collect(),
        qual: None,
        filter: None,
        info: None,
    })
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::{parse_variants, ParseStrategy};
    use crate::genes::GeneRegionTable;

    fn write_file(dir: &temp_testdir::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        path
    }

    #[rstest::rstest]
    #[case("tests/risk/example.vcf")]
    #[case("tests/risk/example.vcf.gz")]
    fn parse_example_fixture(#[case] path: &str) -> Result<(), anyhow::Error> {
        let table = GeneRegionTable::grch38_cancer_panel();
        let outcome = parse_variants(std::path::Path::new(path), &table)?;

        assert_eq!(ParseStrategy::Primary, outcome.strategy);
        assert_eq!(0, outcome.skipped_lines);
        assert_eq!(5, outcome.variants.len());
        let genes: Vec<&str> = outcome.variants.iter().map(|v| v.gene.as_str()).collect();
        assert_eq!(vec!["BRCA1", "BRCA2", "PALB2", "TP53", "ATM"], genes);

        Ok(())
    }

    #[test]
    fn short_line_is_skipped_without_aborting() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = write_file(
            &tmp_dir,
            "short.vcf",
            b"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
              17\t43091995\trs80357914\n\
              17\t43091995\trs80357914\tAG\tA\t100\tPASS\tCSQ=frameshift_variant\n",
        );

        let table = GeneRegionTable::grch38_cancer_panel();
        let outcome = parse_variants(&path, &table)?;

        assert_eq!(ParseStrategy::Primary, outcome.strategy);
        assert_eq!(1, outcome.skipped_lines);
        assert_eq!(1, outcome.variants.len());
        assert_eq!("BRCA1", outcome.variants[0].gene);

        Ok(())
    }

    #[rstest::rstest]
    #[case("not-a-number")]
    #[case("0")]
    #[case("-5")]
    fn invalid_position_is_skipped(#[case] pos: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let contents = format!(
            "#CHROM\tPOS\tID\tREF\tALT\n17\t{}\t.\tA\tG\n17\t43091995\t.\tAG\tA\n",
            pos
        );
        let path = write_file(&tmp_dir, "badpos.vcf", contents.as_bytes());

        let table = GeneRegionTable::grch38_cancer_panel();
        let outcome = parse_variants(&path, &table)?;

        assert_eq!(1, outcome.skipped_lines);
        assert_eq!(1, outcome.variants.len());

        Ok(())
    }

    #[test]
    fn data_before_column_header_is_ignored() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = write_file(
            &tmp_dir,
            "noheader.vcf",
            b"17\t43091995\t.\tAG\tA\n\
              #CHROM\tPOS\tID\tREF\tALT\n\
              17\t7674223\t.\tG\tA\n",
        );

        let table = GeneRegionTable::grch38_cancer_panel();
        let outcome = parse_variants(&path, &table)?;

        assert_eq!(ParseStrategy::Primary, outcome.strategy);
        assert_eq!(1, outcome.variants.len());
        assert_eq!("TP53", outcome.variants[0].gene);

        Ok(())
    }

    #[test]
    fn chromosome_labels_are_normalized() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = write_file(
            &tmp_dir,
            "chr.vcf",
            b"#CHROM\tPOS\tID\tREF\tALT\n\
              chr17\t43091995\t.\tAG\tA\n\
              CHR13\t32913838\t.\tT\t-\n",
        );

        let table = GeneRegionTable::grch38_cancer_panel();
        let outcome = parse_variants(&path, &table)?;

        assert_eq!(2, outcome.variants.len());
        assert_eq!("17", outcome.variants[0].chrom);
        assert_eq!("BRCA1", outcome.variants[0].gene);
        assert_eq!("BRCA2", outcome.variants[1].gene);

        Ok(())
    }

    #[test]
    fn invalid_utf8_triggers_fallback() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let mut contents = Vec::new();
        contents.extend_from_slice(b"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n");
        contents.extend_from_slice(b"17\t430919\xff95\t.\tAG\tA\n");
        contents.extend_from_slice(
            b"17\t43091995\trs80357914\tAG\tA\t100\tPASS\tCSQ=frameshift_variant\n",
        );
        let path = write_file(&tmp_dir, "broken.vcf", &contents);

        let table = GeneRegionTable::grch38_cancer_panel();
        let outcome = parse_variants(&path, &table)?;

        assert_eq!(ParseStrategy::Fallback, outcome.strategy);
        // The lax pass loses annotation fidelity on purpose.
        assert_eq!(1, outcome.variants.len());
        assert_eq!("BRCA1", outcome.variants[0].gene);
        assert_eq!(None, outcome.variants[0].consequence);
        assert_eq!(None, outcome.variants[0].rsid);

        Ok(())
    }

    #[test]
    fn missing_file_fails() {
        let table = GeneRegionTable::grch38_cancer_panel();
        assert!(parse_variants(std::path::Path::new("tests/risk/missing.vcf"), &table).is_err());
    }
}
