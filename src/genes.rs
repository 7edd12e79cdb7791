//! Gene region configuration and known pathogenic variant overrides.

use std::path::Path;

/// One gene interval on the reference build, positions 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GeneRegion {
    /// Gene symbol, unique within a table.
    pub gene: String,
    /// Chromosome label, already normalized (no `chr` prefix).
    pub chrom: String,
    /// 1-based start position.
    pub start: u64,
    /// 1-based end position, inclusive.
    pub end: u64,
}

impl GeneRegion {
    /// Whether the given normalized chromosome/position falls inside this region.
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.chrom == chrom && self.start <= pos && pos <= self.end
    }
}

/// Lookup table of gene regions, loaded once and passed into the pipeline.
#[derive(Debug, Clone)]
pub struct GeneRegionTable {
    regions: Vec<GeneRegion>,
}

impl GeneRegionTable {
    /// Construct from a list of regions.
    ///
    /// Fails when two regions on the same chromosome overlap, as gene lookup
    /// would otherwise silently depend on table order.
    pub fn new(regions: Vec<GeneRegion>) -> Result<Self, anyhow::Error> {
        for (i, lhs) in regions.iter().enumerate() {
            for rhs in regions.iter().skip(i + 1) {
                if lhs.chrom == rhs.chrom && lhs.start <= rhs.end && rhs.start <= lhs.end {
                    anyhow::bail!(
                        "overlapping gene regions: {} and {} on chromosome {}",
                        lhs.gene,
                        rhs.gene,
                        lhs.chrom
                    );
                }
            }
        }
        Ok(Self { regions })
    }

    /// Load a table from a JSON file holding an array of `GeneRegion`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let reader = crate::common::io::open_read_maybe_gz(path.as_ref())?;
        let regions: Vec<GeneRegion> = serde_json::from_reader(reader).map_err(|e| {
            anyhow::anyhow!("could not parse gene regions from {:?}: {}", path.as_ref(), e)
        })?;
        Self::new(regions)
    }

    /// The built-in hereditary cancer gene panel with GRCh38 coordinates.
    pub fn grch38_cancer_panel() -> Self {
        let regions = vec![
            region("BRCA1", "17", 43_044_295, 43_125_483),
            region("BRCA2", "13", 32_889_611, 32_973_805),
            region("PALB2", "16", 23_614_479, 23_652_679),
            region("TP53", "17", 7_661_779, 7_687_550),
            region("PTEN", "10", 89_622_870, 89_731_687),
            region("CHEK2", "22", 28_687_741, 28_741_829),
            region("ATM", "11", 108_093_099, 108_239_829),
            region("CDH1", "16", 68_737_224, 68_835_537),
            region("STK11", "19", 1_222_203, 1_249_790),
            region("NF1", "17", 29_421_945, 29_704_695),
        ];
        Self { regions }
    }

    /// Return the first region containing the given chromosome/position.
    pub fn locate(&self, chrom: &str, pos: u64) -> Option<&GeneRegion> {
        self.regions.iter().find(|r| r.contains(chrom, pos))
    }

    /// Number of genes in the table.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn region(gene: &str, chrom: &str, start: u64, end: u64) -> GeneRegion {
    GeneRegion {
        gene: gene.to_string(),
        chrom: chrom.to_string(),
        start,
        end,
    }
}

/// A curated variant that is always classified as pathogenic when matched
/// exactly on gene, position, and alleles.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnownPathogenicVariant {
    /// Gene symbol the override applies to.
    pub gene: String,
    /// 1-based position.
    pub position: u64,
    /// Reference allele.
    pub reference: String,
    /// Alternate allele ("-" for a deletion).
    pub alternative: String,
}

/// The built-in override list of curated founder mutations.
pub fn known_pathogenic_defaults() -> Vec<KnownPathogenicVariant> {
    vec![
        // BRCA1 c.68_69delAG
        KnownPathogenicVariant {
            gene: "BRCA1".to_string(),
            position: 43_091_995,
            reference: "AG".to_string(),
            alternative: "A".to_string(),
        },
        // BRCA2 c.5946delT
        KnownPathogenicVariant {
            gene: "BRCA2".to_string(),
            position: 32_913_838,
            reference: "T".to_string(),
            alternative: "-".to_string(),
        },
    ]
}
