use crate::{error::InvalidGenotypeError, locus::Locus, LOCI};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

pub type LocusId = String;

/// An unordered pair of allele symbols, stored in domain order so that
/// "A/B" and "B/A" are the same value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllelePair {
    first: String,
    second: String,
}

impl AllelePair {
    pub fn new(locus: &Locus, a: &str, b: &str) -> Result<Self, InvalidGenotypeError> {
        let rank_a = locus
            .allele_rank(a)
            .ok_or_else(|| InvalidGenotypeError::UnknownAllele {
                locus: locus.id.to_owned(),
                allele: a.to_owned(),
            })?;
        let rank_b = locus
            .allele_rank(b)
            .ok_or_else(|| InvalidGenotypeError::UnknownAllele {
                locus: locus.id.to_owned(),
                allele: b.to_owned(),
            })?;
        let (first, second) = if rank_a <= rank_b { (a, b) } else { (b, a) };
        Ok(Self {
            first: first.to_owned(),
            second: second.to_owned(),
        })
    }

    #[inline(always)]
    pub fn first(&self) -> &str {
        &self.first
    }

    #[inline(always)]
    pub fn second(&self) -> &str {
        &self.second
    }

    /// Both alleles, in stored order.
    #[inline(always)]
    pub fn alleles(&self) -> [&str; 2] {
        [&self.first, &self.second]
    }

    #[inline(always)]
    pub fn has(&self, allele: &str) -> bool {
        self.first == allele || self.second == allele
    }

    #[inline(always)]
    pub fn is_homozygous_for(&self, allele: &str) -> bool {
        self.first == allele && self.second == allele
    }

    #[inline(always)]
    pub fn is_homozygous(&self) -> bool {
        self.first == self.second
    }

    /// True if the pair is exactly {a, b}, in either order.
    pub fn is_pair(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }

    /// True if both alleles are drawn from the given set.
    pub fn both_in(&self, set: &[&str]) -> bool {
        set.contains(&self.first.as_str()) && set.contains(&self.second.as_str())
    }
}

impl fmt::Display for AllelePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.first, self.second)
    }
}

/// The three mutually exclusive Pattern states. A single enum, never two
/// booleans: a simultaneous Panda+Koi state must stay unrepresentable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    #[default]
    No,
    Panda,
    Koi,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::No => "No",
            Pattern::Panda => "Panda",
            Pattern::Koi => "Koi",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "No" => Some(Pattern::No),
            "Panda" => Some(Pattern::Panda),
            "Koi" => Some(Pattern::Koi),
            _ => None,
        }
    }
}

/// A dog's full genetic makeup: one allele pair per registered pair locus,
/// plus the single Pattern state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    pairs: HashMap<LocusId, AllelePair>,
    #[serde(default)]
    pattern: Pattern,
}

impl Genotype {
    /// The homozygous-normal genotype: every pair locus fixed on its default
    /// allele, Pattern off.
    pub fn baseline() -> Self {
        let mut pairs = HashMap::new();
        for locus in LOCI.pair_loci() {
            let allele = locus.default_allele();
            let pair = AllelePair::new(locus, allele, allele)
                .expect("Default allele is not in its own domain");
            pairs.insert(locus.id.to_owned(), pair);
        }
        Self {
            pairs,
            pattern: Pattern::No,
        }
    }

    pub fn set_pair(&mut self, locus_id: &str, a: &str, b: &str) -> Result<(), InvalidGenotypeError> {
        let locus = LOCI
            .get(locus_id)
            .ok_or_else(|| InvalidGenotypeError::UnknownLocus(locus_id.to_owned()))?;
        let pair = AllelePair::new(locus, a, b)?;
        self.pairs.insert(locus.id.to_owned(), pair);
        Ok(())
    }

    pub(crate) fn insert_pair(&mut self, locus_id: &str, pair: AllelePair) {
        self.pairs.insert(locus_id.to_owned(), pair);
    }

    #[inline(always)]
    pub fn pair(&self, locus_id: &str) -> Option<&AllelePair> {
        self.pairs.get(locus_id)
    }

    #[inline(always)]
    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn set_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
    }

    /// Checks the genotype against the registry: exactly one entry per pair
    /// locus, every allele inside its locus domain, no unknown loci.
    pub fn validate(&self) -> Result<(), InvalidGenotypeError> {
        for locus_id in self.pairs.keys() {
            if LOCI.get(locus_id).is_none() {
                return Err(InvalidGenotypeError::UnknownLocus(locus_id.to_owned()));
            }
        }
        for locus in LOCI.pair_loci() {
            let pair = self
                .pairs
                .get(&locus.id)
                .ok_or_else(|| InvalidGenotypeError::MissingLocus(locus.id.to_owned()))?;
            for allele in pair.alleles() {
                if locus.allele_rank(allele).is_none() {
                    return Err(InvalidGenotypeError::UnknownAllele {
                        locus: locus.id.to_owned(),
                        allele: allele.to_owned(),
                    });
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn remove_pair(&mut self, locus_id: &str) {
        self.pairs.remove(locus_id);
    }

    fn is_baseline_at(&self, locus: &Locus) -> bool {
        match self.pairs.get(&locus.id) {
            Some(pair) => pair.is_homozygous_for(locus.default_allele()),
            None => false,
        }
    }

    /// The product-facing genotype string: every locus still at its
    /// homozygous-default baseline is dropped, the rest joined in registry
    /// order.
    pub fn compact_string(&self) -> String {
        let mut parts: Vec<String> = LOCI
            .pair_loci()
            .filter(|locus| !self.is_baseline_at(locus))
            .filter_map(|locus| self.pairs.get(&locus.id).map(|p| p.to_string()))
            .collect();
        if self.pattern != Pattern::No {
            parts.push(self.pattern.as_str().to_owned());
        }
        parts.iter().join(" ")
    }

    /// A stable serialization of the full genotype, used as a memo key.
    pub fn canonical_key(&self) -> String {
        let mut parts: Vec<String> = LOCI
            .pair_loci()
            .map(|locus| match self.pairs.get(&locus.id) {
                Some(pair) => format!("{}={pair}", locus.id),
                None => format!("{}=?", locus.id),
            })
            .collect();
        parts.push(format!("pattern={}", self.pattern.as_str()));
        parts.iter().join(";")
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let full = LOCI
            .pair_loci()
            .filter_map(|locus| self.pairs.get(&locus.id).map(|p| p.to_string()))
            .join(" ");
        match self.pattern {
            Pattern::No => write!(f, "{full}"),
            pattern => write!(f, "{full} {}", pattern.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// A caller-owned dog. The engine reads the genotype and never mutates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dog {
    pub genotype: Genotype,
    pub name: Option<String>,
    pub gender: Option<Gender>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allele_pair_is_canonical() {
        let locus = LOCI.get("blue").unwrap();
        let a = AllelePair::new(locus, "N", "d").unwrap();
        let b = AllelePair::new(locus, "d", "N").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "N/d");
    }

    #[test]
    fn test_allele_pair_follows_domain_order_not_alphabet() {
        // ky < Kbr < KB in the domain, whatever the alphabet says
        let locus = LOCI.get("k").unwrap();
        let pair = AllelePair::new(locus, "KB", "ky").unwrap();
        assert_eq!(pair.to_string(), "ky/KB");
    }

    #[test]
    fn test_allele_pair_rejects_unknown_allele() {
        let locus = LOCI.get("blue").unwrap();
        let err = AllelePair::new(locus, "N", "q").unwrap_err();
        assert_eq!(
            err,
            InvalidGenotypeError::UnknownAllele {
                locus: "blue".to_string(),
                allele: "q".to_string()
            }
        );
    }

    #[test]
    fn test_baseline_validates() {
        let genotype = Genotype::baseline();
        assert!(genotype.validate().is_ok());
        assert_eq!(genotype.pattern(), Pattern::No);
        assert_eq!(genotype.pair("blue").unwrap().to_string(), "N/N");
    }

    #[test]
    fn test_missing_locus_is_invalid() {
        let mut genotype = Genotype::baseline();
        genotype.pairs.remove("cocoa");
        assert_eq!(
            genotype.validate().unwrap_err(),
            InvalidGenotypeError::MissingLocus("cocoa".to_string())
        );
    }

    #[test]
    fn test_unknown_locus_is_invalid() {
        let mut genotype = Genotype::baseline();
        let pair = genotype.pair("blue").unwrap().to_owned();
        genotype.pairs.insert("saber".to_string(), pair);
        assert_eq!(
            genotype.validate().unwrap_err(),
            InvalidGenotypeError::UnknownLocus("saber".to_string())
        );
    }

    #[test]
    fn test_set_pair_rejects_unknown_symbols() {
        let mut genotype = Genotype::baseline();
        assert!(genotype.set_pair("blue", "N", "d").is_ok());
        assert!(genotype.set_pair("blue", "N", "dd").is_err());
        assert!(genotype.set_pair("teal", "N", "d").is_err());
    }

    #[test]
    fn test_compact_string_drops_baselines() {
        let mut genotype = Genotype::baseline();
        assert_eq!(genotype.compact_string(), "");
        genotype.set_pair("blue", "d", "N").unwrap();
        genotype.set_pair("cocoa", "co", "co").unwrap();
        assert_eq!(genotype.compact_string(), "co/co N/d");
        genotype.set_pattern(Pattern::Koi);
        assert_eq!(genotype.compact_string(), "co/co N/d Koi");
    }

    #[test]
    fn test_canonical_key_is_stable_and_distinct() {
        let a = Genotype::baseline();
        let mut b = Genotype::baseline();
        assert_eq!(a.canonical_key(), a.clone().canonical_key());
        b.set_pair("blue", "N", "d").unwrap();
        assert_ne!(a.canonical_key(), b.canonical_key());
        assert!(a.canonical_key().contains("pattern=No"));
    }
}
