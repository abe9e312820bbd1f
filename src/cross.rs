use crate::{
    error::InvalidGenotypeError,
    genotype::{AllelePair, Genotype, Pattern},
    locus::Locus,
    LOCI,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OffspringEntry {
    pub genotype: Genotype,
    pub probability: f64,
}

/// The pooled offspring outcomes for one locus: the 2x2 allele selections at
/// 0.25 each, merged by canonical pair before any further branching. A locus
/// where both parents are homozygous collapses to a single outcome here, so
/// the branching factor per locus is at most 3.
fn locus_outcomes(
    locus: &Locus,
    sire: &AllelePair,
    dam: &AllelePair,
) -> Result<Vec<(AllelePair, f64)>, InvalidGenotypeError> {
    let mut outcomes: Vec<(AllelePair, f64)> = Vec::with_capacity(4);
    for (from_sire, from_dam) in sire.alleles().into_iter().cartesian_product(dam.alleles()) {
        let pair = AllelePair::new(locus, from_sire, from_dam)?;
        match outcomes.iter().position(|(known, _)| *known == pair) {
            Some(found) => outcomes[found].1 += 0.25,
            None => outcomes.push((pair, 0.25)),
        }
    }
    Ok(outcomes)
}

fn pattern_outcomes(sire: Pattern, dam: Pattern) -> Vec<(Pattern, f64)> {
    if sire == dam {
        vec![(sire, 1.0)]
    } else {
        vec![(sire, 0.5), (dam, 0.5)]
    }
}

fn expand(
    variant: &[(&Locus, Vec<(AllelePair, f64)>)],
    pattern: &[(Pattern, f64)],
    partial: &Genotype,
    probability: f64,
    out: &mut Vec<OffspringEntry>,
) {
    match variant.split_first() {
        Some(((locus, outcomes), rest)) => {
            for (pair, p) in outcomes {
                let mut next = partial.to_owned();
                next.insert_pair(&locus.id, pair.to_owned());
                expand(rest, pattern, &next, probability * p, out);
            }
        }
        None => {
            for (state, p) in pattern {
                let mut genotype = partial.to_owned();
                genotype.set_pattern(*state);
                out.push(OffspringEntry {
                    genotype,
                    probability: probability * p,
                });
            }
        }
    }
}

/// Computes the full offspring genotype distribution for one mating. Both
/// parents are validated up front; probabilities over the returned entries
/// sum to 1 within [`PROBABILITY_TOLERANCE`].
pub fn cross(sire: &Genotype, dam: &Genotype) -> Result<Vec<OffspringEntry>, InvalidGenotypeError> {
    sire.validate()?;
    dam.validate()?;

    let mut fixed = Genotype::baseline();
    let mut variant: Vec<(&Locus, Vec<(AllelePair, f64)>)> = vec![];
    for locus in LOCI.pair_loci() {
        let sire_pair = sire
            .pair(&locus.id)
            .ok_or_else(|| InvalidGenotypeError::MissingLocus(locus.id.to_owned()))?;
        let dam_pair = dam
            .pair(&locus.id)
            .ok_or_else(|| InvalidGenotypeError::MissingLocus(locus.id.to_owned()))?;
        let mut outcomes = locus_outcomes(locus, sire_pair, dam_pair)?;
        if outcomes.len() == 1 {
            // Invariant locus, copied verbatim into every offspring
            let (pair, _) = outcomes.remove(0);
            fixed.insert_pair(&locus.id, pair);
        } else {
            variant.push((locus, outcomes));
        }
    }
    let pattern = pattern_outcomes(sire.pattern(), dam.pattern());

    let mut entries = vec![];
    expand(&variant, &pattern, &fixed, 1.0, &mut entries);
    Ok(entries)
}

/// Memoizes [`cross`] by serialized parent genotypes. Safe because the
/// engine is pure; keep one cache per caller, the engine itself holds no
/// state.
#[derive(Clone, Debug, Default)]
pub struct CrossCache {
    entries: HashMap<String, Vec<OffspringEntry>>,
}

impl CrossCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cross(
        &mut self,
        sire: &Genotype,
        dam: &Genotype,
    ) -> Result<Vec<OffspringEntry>, InvalidGenotypeError> {
        let key = format!("{}|{}", sire.canonical_key(), dam.canonical_key());
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.to_owned());
        }
        let computed = cross(sire, dam)?;
        self.entries.insert(key, computed.to_owned());
        Ok(computed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_pairs(pairs: &[(&str, &str, &str)]) -> Genotype {
        let mut genotype = Genotype::baseline();
        for (locus, a, b) in pairs {
            genotype.set_pair(locus, a, b).unwrap();
        }
        genotype
    }

    fn marginal(entries: &[OffspringEntry], locus_id: &str, pair: &str) -> f64 {
        entries
            .iter()
            .filter(|e| e.genotype.pair(locus_id).unwrap().to_string() == pair)
            .map(|e| e.probability)
            .sum()
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let sire = with_pairs(&[("blue", "N", "d"), ("cocoa", "N", "co"), ("agouti", "Ay", "at")]);
        let dam = with_pairs(&[("blue", "N", "d"), ("red", "E", "e")]);
        let entries = cross(&sire, &dam).unwrap();
        let sum: f64 = entries.iter().map(|e| e.probability).sum();
        assert!((sum - 1.0).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn test_identical_homozygous_locus_is_invariant() {
        let sire = with_pairs(&[("cocoa", "co", "co"), ("blue", "N", "d")]);
        let dam = with_pairs(&[("cocoa", "co", "co"), ("blue", "N", "d")]);
        let entries = cross(&sire, &dam).unwrap();
        assert!(entries
            .iter()
            .all(|e| e.genotype.pair("cocoa").unwrap().is_homozygous_for("co")));
    }

    #[test]
    fn test_homozygous_different_alleles_is_deterministic() {
        let sire = with_pairs(&[("blue", "d", "d")]);
        let dam = with_pairs(&[]);
        let entries = cross(&sire, &dam).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].genotype.pair("blue").unwrap().to_string(), "N/d");
        assert!((entries[0].probability - 1.0).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn test_heterozygous_cross_gives_mendelian_ratio() {
        let sire = with_pairs(&[("blue", "N", "d")]);
        let dam = with_pairs(&[("blue", "N", "d")]);
        let entries = cross(&sire, &dam).unwrap();
        // Pooling merges the two N/d selections, so exactly three outcomes
        assert_eq!(entries.len(), 3);
        assert!((marginal(&entries, "blue", "N/N") - 0.25).abs() < PROBABILITY_TOLERANCE);
        assert!((marginal(&entries, "blue", "N/d") - 0.50).abs() < PROBABILITY_TOLERANCE);
        assert!((marginal(&entries, "blue", "d/d") - 0.25).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn test_marginals_hold_with_many_variant_loci() {
        let sire = with_pairs(&[("blue", "N", "d"), ("cocoa", "N", "co"), ("red", "E", "e")]);
        let dam = with_pairs(&[("blue", "N", "d"), ("cocoa", "N", "co"), ("red", "E", "e")]);
        let entries = cross(&sire, &dam).unwrap();
        assert_eq!(entries.len(), 27);
        assert!((marginal(&entries, "cocoa", "N/co") - 0.50).abs() < PROBABILITY_TOLERANCE);
        assert!((marginal(&entries, "red", "e/e") - 0.25).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn test_malformed_parent_fails_before_any_computation() {
        let mut sire = Genotype::baseline();
        sire.remove_pair("pied");
        let dam = Genotype::baseline();
        assert_eq!(
            cross(&sire, &dam).unwrap_err(),
            InvalidGenotypeError::MissingLocus("pied".to_string())
        );
    }

    #[test]
    fn test_pattern_states_stay_mutually_exclusive() {
        let mut sire = Genotype::baseline();
        sire.set_pattern(Pattern::Koi);
        let mut dam = Genotype::baseline();
        dam.set_pattern(Pattern::Panda);
        let entries = cross(&sire, &dam).unwrap();
        assert_eq!(entries.len(), 2);
        let koi: f64 = entries
            .iter()
            .filter(|e| e.genotype.pattern() == Pattern::Koi)
            .map(|e| e.probability)
            .sum();
        assert!((koi - 0.5).abs() < PROBABILITY_TOLERANCE);
    }

    #[test]
    fn test_matching_pattern_is_invariant() {
        let mut sire = Genotype::baseline();
        sire.set_pattern(Pattern::Koi);
        let mut dam = Genotype::baseline();
        dam.set_pattern(Pattern::Koi);
        let entries = cross(&sire, &dam).unwrap();
        assert!(entries.iter().all(|e| e.genotype.pattern() == Pattern::Koi));
    }

    #[test]
    fn test_cache_returns_identical_results() {
        let sire = with_pairs(&[("blue", "N", "d")]);
        let dam = with_pairs(&[("blue", "N", "d")]);
        let mut cache = CrossCache::new();
        let first = cache.cross(&sire, &dam).unwrap();
        let second = cache.cross(&sire, &dam).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.genotype, b.genotype);
            assert_eq!(a.probability, b.probability);
        }
    }
}
