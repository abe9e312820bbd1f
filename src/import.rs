//! Lossy free-text import. Pasted DNA-report text is tokenized and mapped
//! onto the canonical genotype model at the boundary; the core engine never
//! sees raw text. Tokens that cannot be attributed to exactly one locus are
//! dropped.

use crate::{
    error::InvalidGenotypeError,
    genotype::{Genotype, Pattern},
    locus::Locus,
    LOCI,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_RE: Regex =
        Regex::new(r"\b(?:[A-Za-z][A-Za-z0-9]*/[A-Za-z][A-Za-z0-9]*|Koi|Panda)\b")
            .expect("Token regex is invalid");
}

/// Parses free text such as "N/d co/co l1/l4 Koi" into a validated genotype,
/// starting from the homozygous-normal baseline. Unattributable tokens and
/// baseline pairs are ignored.
pub fn genotype_from_text(text: &str) -> Result<Genotype, InvalidGenotypeError> {
    let mut genotype = Genotype::baseline();
    for token in TOKEN_RE.find_iter(text) {
        let token = token.as_str();
        if let Some(pattern) = Pattern::from_str_opt(token) {
            genotype.set_pattern(pattern);
            continue;
        }
        let Some((a, b)) = token.split_once('/') else {
            continue;
        };
        if let Some(locus) = attribute_pair(a, b) {
            genotype.set_pair(&locus.id, a, b)?;
        }
    }
    genotype.validate()?;
    Ok(genotype)
}

/// The unique pair locus whose domain contains both symbols and for which
/// the pair says something beyond the baseline. `n/n` style tokens match
/// several loci but are the baseline for all of them, so they attribute to
/// none.
fn attribute_pair(a: &str, b: &str) -> Option<&'static Locus> {
    let mut informative = LOCI.pair_loci().filter(|locus| {
        locus.allele_rank(a).is_some()
            && locus.allele_rank(b).is_some()
            && !(a == locus.default_allele() && b == locus.default_allele())
    });
    let found = informative.next()?;
    match informative.next() {
        Some(_) => None, // ambiguous, drop
        None => Some(found),
    }
}
