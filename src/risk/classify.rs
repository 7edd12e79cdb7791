//! Decision table mapping annotation verdicts to risk tiers.

use crate::risk::annotate::AnnotationProvider;
use crate::risk::schema::{ClassifiedVariant, Effect, MatchedVariant, RiskTier};

/// Assign a risk tier from a clinical significance label and an effect
/// classification.
///
/// The significance label is checked first; the effect classification is only
/// consulted when the label decides nothing. This two-stage fallback changes
/// outcomes versus checking the effect alone and must stay as is.
pub fn assign_tier(clinvar_significance: &str, effect: Effect) -> RiskTier {
    let significance = clinvar_significance.to_lowercase();
    if significance.contains("pathogenic") || significance.contains("likely pathogenic") {
        return RiskTier::High;
    }
    if significance.contains("uncertain") {
        return RiskTier::Uncertain;
    }
    if significance.contains("benign") || significance.contains("likely benign") {
        return RiskTier::Population;
    }

    match effect {
        Effect::Pathogenic | Effect::LikelyPathogenic => RiskTier::High,
        Effect::Benign => RiskTier::Population,
        Effect::Uncertain | Effect::Unknown => RiskTier::Uncertain,
    }
}

/// Annotate and classify all matched variants.
pub fn classify_variants(
    provider: &dyn AnnotationProvider,
    variants: Vec<MatchedVariant>,
) -> Vec<ClassifiedVariant> {
    tracing::debug!("classifying {} variant(s)", variants.len());
    variants
        .into_iter()
        .map(|variant| {
            let verdict = provider.annotate(&variant);
            let tier = assign_tier(&verdict.clinvar_significance, verdict.effect);
            ClassifiedVariant::new(variant, verdict, tier)
        })
        .collect()
}
