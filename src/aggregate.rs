use crate::{
    cross::OffspringEntry,
    error::InvalidGenotypeError,
    genotype::Genotype,
    phenotype::{resolve, PhenotypeDescriptor},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many phenotype groups the display shows by default.
pub const DEFAULT_TOP_N: usize = 12;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub phenotype: PhenotypeDescriptor,
    pub cumulative_probability: f64,
    pub representative_genotype: Genotype,
}

/// Groups offspring entries by resolved phenotype name. Two distinct
/// genotypes that look identical belong to the same group; the
/// first-encountered genotype is kept as the representative for rendering.
pub fn aggregate(
    entries: &[OffspringEntry],
    top_n: usize,
) -> Result<Vec<AggregatedResult>, InvalidGenotypeError> {
    let mut groups: Vec<AggregatedResult> = vec![];
    let mut index: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let phenotype = resolve(&entry.genotype)?;
        match index.get(&phenotype.name_phrase) {
            Some(found) => groups[*found].cumulative_probability += entry.probability,
            None => {
                index.insert(phenotype.name_phrase.to_owned(), groups.len());
                groups.push(AggregatedResult {
                    phenotype,
                    cumulative_probability: entry.probability,
                    representative_genotype: entry.genotype.to_owned(),
                });
            }
        }
    }
    // Stable sort keeps first-encountered order among equal probabilities
    groups.sort_by(|a, b| b.cumulative_probability.total_cmp(&a.cumulative_probability));
    groups.truncate(top_n);
    Ok(groups)
}
