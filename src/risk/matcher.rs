//! Matching of raw variant lines against the gene region table.

use crate::genes::GeneRegionTable;
use crate::risk::schema::{MatchedVariant, RawVariantLine};

/// Annotation hints extracted from the `;`-delimited info column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoHints {
    /// Consequence hint (`CSQ` or `Consequence` key).
    pub consequence: Option<String>,
    /// Clinical significance hint (`CLNSIG` or any key containing `clinvar`).
    pub clinvar_significance: Option<String>,
    /// Allele frequency hint (`AF` or `gnomad_af` key).
    pub allele_frequency: Option<f64>,
}

impl InfoHints {
    /// Extract hints from a raw info column value.
    ///
    /// Only `key=value` pairs are inspected; unparsable allele frequencies
    /// are dropped silently.
    pub fn extract(info: &str) -> Self {
        let mut hints = Self::default();
        for field in info.split(';') {
            let Some((key, value)) = field.split_once('=') else {
                continue;
            };
            if key == "CSQ" || key == "Consequence" {
                // Only the effect term before the first annotation pipe matters here.
                hints.consequence = Some(
                    value
                        .split('|')
                        .next()
                        .unwrap_or(value)
                        .to_string(),
                );
            } else if key == "CLNSIG" || key.to_lowercase().contains("clinvar") {
                hints.clinvar_significance = Some(value.to_string());
            } else if key == "AF" || key == "gnomad_af" {
                if let Ok(af) = value.parse::<f64>() {
                    hints.allele_frequency = Some(af);
                }
            }
        }
        hints
    }
}

/// Filters raw variant lines to those inside a gene region and expands
/// multi-allelic records into one candidate per alternate allele.
#[derive(Debug)]
pub struct GeneOverlapMatcher<'a> {
    genes: &'a GeneRegionTable,
}

impl<'a> GeneOverlapMatcher<'a> {
    /// Construct with the gene region table to match against.
    pub fn new(genes: &'a GeneRegionTable) -> Self {
        Self { genes }
    }

    /// Match a raw line with full hint extraction (primary parse path).
    pub fn match_line(&self, raw: &RawVariantLine) -> Vec<MatchedVariant> {
        let hints = raw
            .info
            .as_deref()
            .map(InfoHints::extract)
            .unwrap_or_default();
        self.matched_variants(raw, &hints, true)
    }

    /// Match a raw line without hint extraction (fallback parse path).
    pub fn match_bare(&self, raw: &RawVariantLine) -> Vec<MatchedVariant> {
        self.matched_variants(raw, &InfoHints::default(), false)
    }

    fn matched_variants(
        &self,
        raw: &RawVariantLine,
        hints: &InfoHints,
        with_rsid: bool,
    ) -> Vec<MatchedVariant> {
        let Some(region) = self.genes.locate(&raw.chrom, raw.pos) else {
            return Vec::new();
        };
        let rsid = if with_rsid {
            raw.id.clone().filter(|id| id.starts_with("rs"))
        } else {
            None
        };
        raw.alternatives
            .iter()
            .map(|alt| MatchedVariant {
                chrom: raw.chrom.clone(),
                pos: raw.pos,
                reference: raw.reference.clone(),
                alternative: alt.clone(),
                gene: region.gene.clone(),
                rsid: rsid.clone(),
                consequence: hints.consequence.clone(),
                clinvar_significance: hints.clinvar_significance.clone(),
                allele_frequency: hints.allele_frequency,
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{GeneOverlapMatcher, InfoHints};
    use crate::genes::GeneRegionTable;
    use crate::risk::schema::RawVariantLine;

    fn raw_line(chrom: &str, pos: u64, alts: &[&str], info: Option<&str>) -> RawVariantLine {
        RawVariantLine {
            chrom: chrom.to_string(),
            pos,
            id: Some("rs80357914".to_string()),
            reference: "AG".to_string(),
            alternatives: alts.iter().map(|s| s.to_string()).collect(),
            qual: Some("100".to_string()),
            filter: Some("PASS".to_string()),
            info: info.map(|s| s.to_string()),
        }
    }

    #[test]
    fn match_line_inside_gene_region() {
        let table = GeneRegionTable::grch38_cancer_panel();
        let matcher = GeneOverlapMatcher::new(&table);

        let matched = matcher.match_line(&raw_line(
            "17",
            43_091_995,
            &["A"],
            Some("CSQ=frameshift_variant"),
        ));
        assert_eq!(1, matched.len());
        assert_eq!("BRCA1", matched[0].gene);
        assert_eq!(Some("rs80357914".to_string()), matched[0].rsid);
        assert_eq!(Some("frameshift_variant".to_string()), matched[0].consequence);
    }

    #[test]
    fn match_line_outside_any_region_yields_nothing() {
        let table = GeneRegionTable::grch38_cancer_panel();
        let matcher = GeneOverlapMatcher::new(&table);

        assert!(matcher.match_line(&raw_line("17", 1_000, &["A"], None)).is_empty());
        assert!(matcher
            .match_line(&raw_line("5", 43_091_995, &["A"], None))
            .is_empty());
    }

    #[test]
    fn match_line_expands_multi_allelic_records() {
        let table = GeneRegionTable::grch38_cancer_panel();
        let matcher = GeneOverlapMatcher::new(&table);

        let matched = matcher.match_line(&raw_line("17", 43_091_995, &["A", "G"], None));
        assert_eq!(2, matched.len());
        assert_eq!("A", matched[0].alternative);
        assert_eq!("G", matched[1].alternative);

        // The two candidates only differ in the alternate allele.
        let mut lhs = matched[0].clone();
        lhs.alternative = matched[1].alternative.clone();
        assert_eq!(lhs, matched[1]);
    }

    #[test]
    fn match_bare_skips_hints_and_rsid() {
        let table = GeneRegionTable::grch38_cancer_panel();
        let matcher = GeneOverlapMatcher::new(&table);

        let matched = matcher.match_bare(&raw_line(
            "17",
            43_091_995,
            &["A"],
            Some("CSQ=frameshift_variant;AF=0.01"),
        ));
        assert_eq!(1, matched.len());
        assert_eq!(None, matched[0].rsid);
        assert_eq!(None, matched[0].consequence);
        assert_eq!(None, matched[0].allele_frequency);
    }

    #[rstest::rstest]
    #[case("CSQ=missense_variant", Some("missense_variant"), None, None)]
    #[case(
        "CSQ=missense_variant|ENSG00000012048|BRCA1",
        Some("missense_variant"),
        None,
        None
    )]
    #[case("Consequence=stop_gained", Some("stop_gained"), None, None)]
    #[case("CLNSIG=Pathogenic", None, Some("Pathogenic"), None)]
    #[case("clinvar_significance=Benign", None, Some("Benign"), None)]
    #[case("AF=0.001", None, None, Some(0.001))]
    #[case("gnomad_af=0.25", None, None, Some(0.25))]
    #[case("AF=not-a-number", None, None, None)]
    #[case("DP=30;MQ=60", None, None, None)]
    #[case("PASS_ONLY", None, None, None)]
    #[case(
        "CSQ=frameshift_variant;CLNSIG=Pathogenic;AF=0.0001",
        Some("frameshift_variant"),
        Some("Pathogenic"),
        Some(0.0001)
    )]
    fn extract_info_hints(
        #[case] info: &str,
        #[case] consequence: Option<&str>,
        #[case] significance: Option<&str>,
        #[case] af: Option<f64>,
    ) {
        let hints = InfoHints::extract(info);
        assert_eq!(consequence.map(|s| s.to_string()), hints.consequence);
        assert_eq!(significance.map(|s| s.to_string()), hints.clinvar_significance);
        assert_eq!(af, hints.allele_frequency);
    }
}
