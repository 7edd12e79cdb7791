//! Aggregation of classified variants into the analysis result.
//!
//! The interpretation, implication, and recommendation templates carry fixed
//! wording consumed by the reporting layer and must not be reworded.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::genes::GeneRegionTable;
use crate::risk::schema::{
    AnalysisResult, ClassifiedVariant, Distributions, OverallRisk, Priority, Recommendation,
    RiskDistribution, RiskTier, Summary,
};

/// Genes whose high-tier variants raise the overall risk to High.
pub const HIGH_RISK_GENES: &[&str] = &["BRCA1", "BRCA2", "PALB2", "TP53"];

/// Cap on the number of variants carried in the result for display.
const MAX_DISPLAY_VARIANTS: usize = 100;

/// Assemble the analysis result from the classified variant set.
pub fn build_result(
    patient_id: &str,
    genes: &GeneRegionTable,
    mut variants: Vec<ClassifiedVariant>,
) -> AnalysisResult {
    let overall_risk = overall_risk(&variants);
    let summary = summary(genes, &variants);
    let recommendations = recommendations(&variants);
    let plots = distributions(&variants);

    let variant_count = variants.len();
    let pathogenic_count = count_tier(&variants, RiskTier::High);
    let vus_count = count_tier(&variants, RiskTier::Uncertain);
    variants.truncate(MAX_DISPLAY_VARIANTS);

    AnalysisResult {
        patient_id: patient_id.to_string(),
        analysis_date: chrono::Utc::now(),
        overall_risk,
        variant_count,
        pathogenic_count,
        vus_count,
        variants,
        summary,
        recommendations,
        plots,
    }
}

/// Assemble the degraded result when the pipeline failed internally.
pub fn degraded_result(
    patient_id: &str,
    genes: &GeneRegionTable,
    error_message: &str,
) -> AnalysisResult {
    AnalysisResult {
        patient_id: patient_id.to_string(),
        analysis_date: chrono::Utc::now(),
        overall_risk: OverallRisk::AnalysisError,
        variant_count: 0,
        pathogenic_count: 0,
        vus_count: 0,
        variants: Vec::new(),
        summary: Summary {
            high_risk_genes: Vec::new(),
            genes_with_variants: Vec::new(),
            total_genes_analyzed: genes.len(),
            risk_interpretation: format!("Analysis error: {}", error_message),
            clinical_implications: vec!["Please check VCF file format".to_string()],
        },
        recommendations: vec![Recommendation {
            priority: Priority::High,
            recommendation: "Check VCF file format".to_string(),
            rationale: "Analysis could not process the file".to_string(),
        }],
        plots: Distributions::default(),
    }
}

fn count_tier(variants: &[ClassifiedVariant], tier: RiskTier) -> usize {
    variants.iter().filter(|v| v.risk_level == tier).count()
}

/// Genes carrying a high-tier variant, first-seen order.
fn high_risk_genes(variants: &[ClassifiedVariant]) -> Vec<String> {
    variants
        .iter()
        .filter(|v| v.risk_level == RiskTier::High)
        .map(|v| v.gene.clone())
        .unique()
        .collect()
}

fn overall_risk(variants: &[ClassifiedVariant]) -> OverallRisk {
    let high: Vec<&ClassifiedVariant> = variants
        .iter()
        .filter(|v| v.risk_level == RiskTier::High)
        .collect();
    let tier = if !high.is_empty() {
        if high
            .iter()
            .any(|v| HIGH_RISK_GENES.contains(&v.gene.as_str()))
        {
            RiskTier::High
        } else {
            RiskTier::Moderate
        }
    } else if count_tier(variants, RiskTier::Moderate) > 0 {
        RiskTier::Moderate
    } else if count_tier(variants, RiskTier::Uncertain) > 0 {
        RiskTier::Uncertain
    } else {
        RiskTier::Population
    };
    OverallRisk::Tier(tier)
}

fn summary(genes: &GeneRegionTable, variants: &[ClassifiedVariant]) -> Summary {
    let high_risk_genes = high_risk_genes(variants);
    let genes_with_variants: Vec<String> =
        variants.iter().map(|v| v.gene.clone()).unique().collect();

    Summary {
        risk_interpretation: risk_interpretation(variants, &high_risk_genes),
        clinical_implications: clinical_implications(variants, &high_risk_genes),
        high_risk_genes,
        genes_with_variants,
        total_genes_analyzed: genes.len(),
    }
}

fn risk_interpretation(variants: &[ClassifiedVariant], high_risk_genes: &[String]) -> String {
    let high_count = count_tier(variants, RiskTier::High);
    let vus_count = count_tier(variants, RiskTier::Uncertain);

    if high_count > 0 {
        format!(
            "Detected {} pathogenic variant(s) in gene(s): {}. \
             This indicates increased hereditary breast cancer risk.",
            high_count,
            high_risk_genes.join(", ")
        )
    } else if vus_count > 0 {
        format!(
            "Detected {} variant(s) of uncertain significance (VUS). \
             Genetic counseling recommended.",
            vus_count
        )
    } else {
        "No pathogenic variants detected in analyzed breast cancer genes. \
         Risk at population level."
            .to_string()
    }
}

fn clinical_implications(
    variants: &[ClassifiedVariant],
    high_risk_genes: &[String],
) -> Vec<String> {
    if high_risk_genes.is_empty() && variants.is_empty() {
        return vec![
            "No genetic variants detected in breast cancer risk genes".to_string(),
            "Continue with age-appropriate population screening".to_string(),
        ];
    }

    if high_risk_genes.iter().any(|g| g == "BRCA1" || g == "BRCA2") {
        vec![
            "High lifetime risk of breast cancer (45-85%)".to_string(),
            "Increased risk of ovarian cancer".to_string(),
            "Consider enhanced screening with MRI".to_string(),
            "Referral to genetic counseling recommended".to_string(),
        ]
    } else if !high_risk_genes.is_empty() {
        vec![
            "Increased breast cancer risk".to_string(),
            "Consider enhanced surveillance".to_string(),
            "Genetic counseling recommended".to_string(),
        ]
    } else {
        vec!["Continue age-appropriate screening".to_string()]
    }
}

fn recommendations(variants: &[ClassifiedVariant]) -> Vec<Recommendation> {
    let high_count = count_tier(variants, RiskTier::High);
    let vus_count = count_tier(variants, RiskTier::Uncertain);

    if high_count > 0 {
        vec![
            Recommendation {
                priority: Priority::High,
                recommendation: "Referral to genetic counseling".to_string(),
                rationale: "Pathogenic variant(s) detected".to_string(),
            },
            Recommendation {
                priority: Priority::High,
                recommendation: "Enhanced breast screening".to_string(),
                rationale: "Increased breast cancer risk".to_string(),
            },
        ]
    } else if vus_count > 0 {
        vec![Recommendation {
            priority: Priority::Medium,
            recommendation: "Genetic counseling for VUS interpretation".to_string(),
            rationale: "Variant of uncertain significance detected".to_string(),
        }]
    } else {
        vec![Recommendation {
            priority: Priority::Low,
            recommendation: "Continue routine screening".to_string(),
            rationale: "No pathogenic variants detected".to_string(),
        }]
    }
}

/// Bucket a consequence string for the variant type distribution.
fn consequence_bucket(consequence: Option<&str>) -> &'static str {
    match consequence {
        Some(consequence) => {
            let consequence = consequence.to_lowercase();
            if consequence.contains("missense") {
                "Missense"
            } else if consequence.contains("frameshift") {
                "Frameshift"
            } else if consequence.contains("splice") {
                "Splice Site"
            } else if consequence.contains("stop") {
                "Stop Gain"
            } else {
                "Other"
            }
        }
        None => "Unknown",
    }
}

fn distributions(variants: &[ClassifiedVariant]) -> Distributions {
    let risk_distribution = RiskDistribution {
        high: count_tier(variants, RiskTier::High),
        vus: count_tier(variants, RiskTier::Uncertain),
        low: variants
            .iter()
            .filter(|v| !matches!(v.risk_level, RiskTier::High | RiskTier::Uncertain))
            .count(),
    };

    let mut gene_distribution: IndexMap<String, usize> = IndexMap::new();
    let mut variant_types: IndexMap<String, usize> = IndexMap::new();
    for variant in variants {
        *gene_distribution.entry(variant.gene.clone()).or_default() += 1;
        let bucket = consequence_bucket(variant.consequence.as_deref());
        *variant_types.entry(bucket.to_string()).or_default() += 1;
    }

    Distributions {
        risk_distribution,
        gene_distribution,
        variant_types,
    }
}
