//! Annotation providers assigning a verdict to each matched variant.

use crate::genes::KnownPathogenicVariant;
use crate::risk::schema::{AnnotationVerdict, Effect, MatchedVariant};

/// Placeholder allele frequency used when the source carries no hint.
pub const DEFAULT_ALLELE_FREQUENCY: f64 = 0.001;

/// Genes in which missense/inframe changes are escalated by the offline rules.
const MISSENSE_ESCALATION_GENES: &[&str] = &["BRCA1", "BRCA2", "TP53"];

/// Selects the annotation provider at pipeline construction.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AnnotationMode {
    /// Local rule-based annotation.
    #[default]
    Offline,
    /// External annotation service with offline fallback.
    Online,
}

/// Capability of annotating one matched variant.
///
/// Implementations never fail for valid input; internal problems degrade to
/// the offline default verdict.
pub trait AnnotationProvider {
    /// Return a verdict for the given variant.
    fn annotate(&self, variant: &MatchedVariant) -> AnnotationVerdict;
}

/// Construct the provider for the given mode.
pub fn provider_for_mode(
    mode: AnnotationMode,
    known_pathogenic: Vec<KnownPathogenicVariant>,
) -> Box<dyn AnnotationProvider> {
    match mode {
        AnnotationMode::Offline => Box::new(OfflineAnnotationProvider::new(known_pathogenic)),
        AnnotationMode::Online => Box::new(OnlineAnnotationProvider::new(
            OfflineAnnotationProvider::new(known_pathogenic),
        )),
    }
}

/// Deterministic rule-based provider working without external resources.
#[derive(Debug, Clone)]
pub struct OfflineAnnotationProvider {
    known_pathogenic: Vec<KnownPathogenicVariant>,
}

impl OfflineAnnotationProvider {
    /// Construct with the curated override list.
    pub fn new(known_pathogenic: Vec<KnownPathogenicVariant>) -> Self {
        Self { known_pathogenic }
    }

    fn is_known_pathogenic(&self, variant: &MatchedVariant) -> bool {
        self.known_pathogenic.iter().any(|known| {
            known.gene == variant.gene
                && known.position == variant.pos
                && known.reference == variant.reference
                && known.alternative == variant.alternative
        })
    }
}

impl AnnotationProvider for OfflineAnnotationProvider {
    fn annotate(&self, variant: &MatchedVariant) -> AnnotationVerdict {
        let mut verdict = AnnotationVerdict {
            clinvar_significance: "Uncertain_significance".to_string(),
            effect: Effect::Unknown,
            allele_frequency: variant
                .allele_frequency
                .unwrap_or(DEFAULT_ALLELE_FREQUENCY),
        };

        if let Some(consequence) = &variant.consequence {
            let consequence = consequence.to_lowercase();
            if ["frameshift", "stop_gained", "splice_donor", "splice_acceptor"]
                .iter()
                .any(|term| consequence.contains(term))
            {
                verdict.effect = Effect::Pathogenic;
                verdict.clinvar_significance = "Pathogenic".to_string();
            } else if ["missense", "inframe"]
                .iter()
                .any(|term| consequence.contains(term))
            {
                if MISSENSE_ESCALATION_GENES.contains(&variant.gene.as_str()) {
                    verdict.effect = Effect::LikelyPathogenic;
                    verdict.clinvar_significance = "Likely_pathogenic".to_string();
                } else {
                    verdict.effect = Effect::Uncertain;
                    verdict.clinvar_significance = "Uncertain_significance".to_string();
                }
            } else if ["synonymous", "intron"]
                .iter()
                .any(|term| consequence.contains(term))
            {
                verdict.effect = Effect::Benign;
                verdict.clinvar_significance = "Benign".to_string();
            }
        }

        // The curated override wins over the consequence rules.
        if self.is_known_pathogenic(variant) {
            verdict.effect = Effect::Pathogenic;
            verdict.clinvar_significance = "Pathogenic".to_string();
        }

        verdict
    }
}

/// Provider intended to query an external annotation service.
///
/// Until a real client is wired in behind this boundary, it applies a reduced
/// heuristic; any lookup failure delegates to the offline rules.
#[derive(Debug, Clone)]
pub struct OnlineAnnotationProvider {
    offline: OfflineAnnotationProvider,
}

impl OnlineAnnotationProvider {
    /// Construct with the offline provider used on lookup failure.
    pub fn new(offline: OfflineAnnotationProvider) -> Self {
        Self { offline }
    }

    fn lookup(&self, variant: &MatchedVariant) -> Result<AnnotationVerdict, anyhow::Error> {
        tracing::debug!(
            "fetching online annotation for {}:{}",
            variant.gene,
            variant.pos
        );

        let mut verdict = AnnotationVerdict {
            clinvar_significance: "Uncertain_significance".to_string(),
            effect: Effect::Unknown,
            allele_frequency: variant
                .allele_frequency
                .unwrap_or(DEFAULT_ALLELE_FREQUENCY),
        };
        if let Some(consequence) = &variant.consequence {
            let consequence = consequence.to_lowercase();
            if ["frameshift", "stop_gained", "splice"]
                .iter()
                .any(|term| consequence.contains(term))
            {
                verdict.effect = Effect::LikelyPathogenic;
                verdict.clinvar_significance = "Likely_pathogenic".to_string();
            } else if consequence.contains("missense") {
                verdict.effect = Effect::Benign;
                verdict.clinvar_significance = "Benign".to_string();
            }
        }

        Ok(verdict)
    }
}

impl AnnotationProvider for OnlineAnnotationProvider {
    fn annotate(&self, variant: &MatchedVariant) -> AnnotationVerdict {
        match self.lookup(variant) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(
                    "online annotation failed ({}), falling back to offline rules",
                    e
                );
                self.offline.annotate(variant)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{
        provider_for_mode, AnnotationMode, AnnotationProvider, OfflineAnnotationProvider,
        DEFAULT_ALLELE_FREQUENCY,
    };
    use crate::genes::known_pathogenic_defaults;
    use crate::risk::schema::{Effect, MatchedVariant};

    fn variant(gene: &str, consequence: Option<&str>) -> MatchedVariant {
        MatchedVariant {
            chrom: "17".to_string(),
            pos: 43_100_000,
            reference: "C".to_string(),
            alternative: "T".to_string(),
            gene: gene.to_string(),
            rsid: None,
            consequence: consequence.map(|s| s.to_string()),
            clinvar_significance: None,
            allele_frequency: None,
        }
    }

    #[rstest::rstest]
    #[case("BRCA1", Some("frameshift_variant"), Effect::Pathogenic, "Pathogenic")]
    #[case("CHEK2", Some("stop_gained"), Effect::Pathogenic, "Pathogenic")]
    #[case("ATM", Some("splice_donor_variant"), Effect::Pathogenic, "Pathogenic")]
    #[case("ATM", Some("splice_acceptor_variant"), Effect::Pathogenic, "Pathogenic")]
    #[case(
        "BRCA1",
        Some("missense_variant"),
        Effect::LikelyPathogenic,
        "Likely_pathogenic"
    )]
    #[case(
        "TP53",
        Some("inframe_deletion"),
        Effect::LikelyPathogenic,
        "Likely_pathogenic"
    )]
    #[case(
        "CHEK2",
        Some("missense_variant"),
        Effect::Uncertain,
        "Uncertain_significance"
    )]
    #[case("BRCA1", Some("synonymous_variant"), Effect::Benign, "Benign")]
    #[case("ATM", Some("intron_variant"), Effect::Benign, "Benign")]
    #[case(
        "BRCA1",
        Some("upstream_gene_variant"),
        Effect::Unknown,
        "Uncertain_significance"
    )]
    #[case("BRCA1", None, Effect::Unknown, "Uncertain_significance")]
    fn offline_rules(
        #[case] gene: &str,
        #[case] consequence: Option<&str>,
        #[case] effect: Effect,
        #[case] significance: &str,
    ) {
        let provider = OfflineAnnotationProvider::new(known_pathogenic_defaults());
        let verdict = provider.annotate(&variant(gene, consequence));
        assert_eq!(effect, verdict.effect);
        assert_eq!(significance, verdict.clinvar_significance);
    }

    #[rstest::rstest]
    #[case(None)]
    #[case(Some("synonymous_variant"))]
    #[case(Some("missense_variant"))]
    fn known_pathogenic_override_wins(#[case] consequence: Option<&str>) {
        let provider = OfflineAnnotationProvider::new(known_pathogenic_defaults());
        let mut v = variant("BRCA1", consequence);
        v.pos = 43_091_995;
        v.reference = "AG".to_string();
        v.alternative = "A".to_string();

        let verdict = provider.annotate(&v);
        assert_eq!(Effect::Pathogenic, verdict.effect);
        assert_eq!("Pathogenic", verdict.clinvar_significance);
    }

    #[test]
    fn override_requires_exact_allele_match() {
        let provider = OfflineAnnotationProvider::new(known_pathogenic_defaults());
        let mut v = variant("BRCA1", None);
        v.pos = 43_091_995;
        v.reference = "AG".to_string();
        v.alternative = "G".to_string();

        let verdict = provider.annotate(&v);
        assert_eq!(Effect::Unknown, verdict.effect);
    }

    #[test]
    fn allele_frequency_hint_is_kept() {
        let provider = OfflineAnnotationProvider::new(vec![]);
        let mut v = variant("BRCA1", None);
        v.allele_frequency = Some(0.25);

        assert_eq!(0.25, provider.annotate(&v).allele_frequency);
        assert_eq!(
            DEFAULT_ALLELE_FREQUENCY,
            provider.annotate(&variant("BRCA1", None)).allele_frequency
        );
    }

    #[rstest::rstest]
    #[case(Some("frameshift_variant"), Effect::LikelyPathogenic, "Likely_pathogenic")]
    #[case(Some("splice_region_variant"), Effect::LikelyPathogenic, "Likely_pathogenic")]
    #[case(Some("missense_variant"), Effect::Benign, "Benign")]
    #[case(Some("synonymous_variant"), Effect::Unknown, "Uncertain_significance")]
    #[case(None, Effect::Unknown, "Uncertain_significance")]
    fn online_reduced_heuristic(
        #[case] consequence: Option<&str>,
        #[case] effect: Effect,
        #[case] significance: &str,
    ) {
        let provider = provider_for_mode(AnnotationMode::Online, known_pathogenic_defaults());
        let verdict = provider.annotate(&variant("BRCA1", consequence));
        assert_eq!(effect, verdict.effect);
        assert_eq!(significance, verdict.clinvar_significance);
    }
}
