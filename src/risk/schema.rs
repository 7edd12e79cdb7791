//! Data model of the risk analysis pipeline, corresponds to what is written
//! out for the reporting layer.

use indexmap::IndexMap;

/// One data line of the variant-call file before gene matching.
///
/// Created per input line and consumed immediately by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVariantLine {
    /// Normalized chromosome label.
    pub chrom: String,
    /// 1-based position.
    pub pos: u64,
    /// Identifier column, `None` when given as ".".
    pub id: Option<String>,
    /// Reference allele.
    pub reference: String,
    /// Alternate alleles, comma-split, empty entries dropped.
    pub alternatives: Vec<String>,
    /// Quality column, if present.
    pub qual: Option<String>,
    /// Filter column, if present.
    pub filter: Option<String>,
    /// Raw `;`-delimited info column, if present.
    pub info: Option<String>,
}

/// A variant that falls inside one gene region, one record per alternate
/// allele.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedVariant {
    /// Normalized chromosome label.
    pub chrom: String,
    /// 1-based position.
    pub pos: u64,
    /// Reference allele.
    pub reference: String,
    /// The single alternate allele of this record.
    pub alternative: String,
    /// Symbol of the matched gene.
    pub gene: String,
    /// dbSNP-style identifier, only set when the id column starts with `rs`.
    pub rsid: Option<String>,
    /// Raw consequence hint from the info column, if any.
    pub consequence: Option<String>,
    /// Raw clinical significance hint from the info column, if any.
    pub clinvar_significance: Option<String>,
    /// Raw allele frequency hint from the info column, if any.
    pub allele_frequency: Option<f64>,
}

/// Effect classification assigned by an annotation provider.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Effect {
    /// Established disruptive effect.
    Pathogenic,
    /// Probably disruptive effect.
    LikelyPathogenic,
    /// Effect cannot be determined from the available evidence.
    Uncertain,
    /// No expected disease relevance.
    Benign,
    /// No rule matched.
    #[default]
    Unknown,
}

/// Verdict of an annotation provider for one matched variant.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationVerdict {
    /// Clinical significance label, e.g., "Pathogenic".
    pub clinvar_significance: String,
    /// Effect classification.
    pub effect: Effect,
    /// Allele frequency, the hint when present, else a fixed placeholder.
    pub allele_frequency: f64,
}

/// Closed enumeration of per-variant risk tiers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum RiskTier {
    /// Pathogenic or likely pathogenic finding.
    #[strum(serialize = "High Risk")]
    #[serde(rename = "High Risk")]
    High,
    /// Moderately elevated risk.
    #[strum(serialize = "Moderate Risk")]
    #[serde(rename = "Moderate Risk")]
    Moderate,
    /// Mildly elevated risk.
    #[strum(serialize = "Increased Risk")]
    #[serde(rename = "Increased Risk")]
    Increased,
    /// Risk at the level of the general population.
    #[strum(serialize = "Population Risk")]
    #[serde(rename = "Population Risk")]
    Population,
    /// Variant of uncertain significance.
    #[strum(serialize = "Variant of Uncertain Significance")]
    #[serde(rename = "Variant of Uncertain Significance")]
    Uncertain,
}

/// Overall risk of a sample, a regular tier or the degraded error label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OverallRisk {
    /// Analysis failed, result record is degraded.
    #[serde(rename = "Analysis Error")]
    AnalysisError,
    /// Regular aggregated risk tier.
    #[serde(untagged)]
    Tier(RiskTier),
}

impl std::fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallRisk::AnalysisError => write!(f, "Analysis Error"),
            OverallRisk::Tier(tier) => tier.fmt(f),
        }
    }
}

/// A matched variant extended with its verdict and risk tier.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassifiedVariant {
    /// Normalized chromosome label.
    pub chromosome: String,
    /// 1-based position.
    pub position: u64,
    /// Reference allele.
    #[serde(rename = "ref")]
    pub reference: String,
    /// Alternate allele.
    #[serde(rename = "alt")]
    pub alternative: String,
    /// Symbol of the matched gene.
    pub gene: String,
    /// dbSNP-style identifier, if any.
    pub rsid: Option<String>,
    /// Raw consequence hint, if any.
    pub consequence: Option<String>,
    /// Clinical significance from the verdict.
    pub clinvar_significance: String,
    /// Allele frequency from the verdict.
    pub gnomad_af: f64,
    /// Effect classification from the verdict.
    pub classification: Effect,
    /// Risk tier assigned by the decision table.
    pub risk_level: RiskTier,
}

impl ClassifiedVariant {
    /// Combine a matched variant with its annotation verdict and tier.
    pub fn new(variant: MatchedVariant, verdict: AnnotationVerdict, tier: RiskTier) -> Self {
        Self {
            chromosome: variant.chrom,
            position: variant.pos,
            reference: variant.reference,
            alternative: variant.alternative,
            gene: variant.gene,
            rsid: variant.rsid,
            consequence: variant.consequence,
            clinvar_significance: verdict.clinvar_significance,
            gnomad_af: verdict.allele_frequency,
            classification: verdict.effect,
            risk_level: tier,
        }
    }
}

/// Priority of a clinical recommendation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One prioritized clinical recommendation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Recommendation {
    /// Priority bucket.
    pub priority: Priority,
    /// The recommendation itself.
    pub recommendation: String,
    /// Why the recommendation is made.
    pub rationale: String,
}

/// Summary block of an analysis result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Summary {
    /// Genes carrying at least one high-tier variant, first-seen order.
    pub high_risk_genes: Vec<String>,
    /// Genes carrying any variant, first-seen order.
    pub genes_with_variants: Vec<String>,
    /// Number of genes in the analyzed panel.
    pub total_genes_analyzed: usize,
    /// Plain-language interpretation of the findings.
    pub risk_interpretation: String,
    /// Clinical implication bullets.
    pub clinical_implications: Vec<String>,
}

/// Variant counts bucketed for the risk distribution plot.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RiskDistribution {
    /// Number of high-tier variants.
    #[serde(rename = "High Risk")]
    pub high: usize,
    /// Number of uncertain-tier variants.
    #[serde(rename = "VUS")]
    pub vus: usize,
    /// Number of all remaining variants.
    #[serde(rename = "Low Risk")]
    pub low: usize,
}

/// Count distributions consumed by the reporting layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Distributions {
    /// Counts by risk tier bucket.
    pub risk_distribution: RiskDistribution,
    /// Counts by gene, first-seen order.
    pub gene_distribution: IndexMap<String, usize>,
    /// Counts by consequence category, first-seen order.
    pub variant_types: IndexMap<String, usize>,
}

/// The immutable result record of one analysis invocation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisResult {
    /// Patient identifier as supplied by the caller.
    pub patient_id: String,
    /// Timestamp of the analysis.
    pub analysis_date: chrono::DateTime<chrono::Utc>,
    /// Aggregated overall risk.
    pub overall_risk: OverallRisk,
    /// Total number of classified variants.
    pub variant_count: usize,
    /// Number of high-tier variants.
    pub pathogenic_count: usize,
    /// Number of uncertain-tier variants.
    pub vus_count: usize,
    /// Classified variants, capped for display.
    pub variants: Vec<ClassifiedVariant>,
    /// Summary block.
    pub summary: Summary,
    /// Prioritized recommendations.
    pub recommendations: Vec<Recommendation>,
    /// Count distributions.
    pub plots: Distributions,
}
