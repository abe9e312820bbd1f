use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs};

const RUNTIME_LOCI_PATH: &str = "data/resources/loci.json";
const BUILTIN_LOCI_JSON: &str = include_str!("../assets/loci.json");

/// How a locus contributes to a genotype: a Mendelian allele pair, or a
/// single enumerated state (only the Pattern row).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocusKind {
    #[default]
    Pair,
    State,
}

/// One genetic locus. Allele order defines canonicalization and display
/// priority, not dominance; the first allele is the homozygous-normal
/// baseline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Locus {
    pub id: String,
    pub label: String,
    pub alleles: Vec<String>,
    #[serde(default)]
    pub kind: LocusKind,
}

impl Locus {
    #[inline(always)]
    pub fn default_allele(&self) -> &str {
        &self.alleles[0]
    }

    #[inline(always)]
    pub fn allele_rank(&self, allele: &str) -> Option<usize> {
        self.alleles.iter().position(|a| a == allele)
    }
}

#[derive(Clone, Debug)]
pub struct LocusRegistry {
    loci: Vec<Locus>,
    by_id: HashMap<String, usize>,
}

impl LocusRegistry {
    fn new(json_text: &str) -> Result<Self> {
        let loci: Vec<Locus> = serde_json::from_str(json_text)?;
        if loci.is_empty() {
            return Err(anyhow!("Locus file contains no loci"));
        }
        let mut by_id = HashMap::new();
        for (num, locus) in loci.iter().enumerate() {
            if locus.alleles.is_empty() {
                return Err(anyhow!("Locus '{}' has an empty allele domain", locus.id));
            }
            if by_id.insert(locus.id.to_owned(), num).is_some() {
                return Err(anyhow!("Duplicate locus id '{}'", locus.id));
            }
        }
        Ok(Self { loci, by_id })
    }

    /// All registered loci, in registry (display) order.
    #[inline(always)]
    pub fn loci(&self) -> &[Locus] {
        &self.loci
    }

    /// The Mendelian allele-pair loci, in registry order.
    pub fn pair_loci(&self) -> impl Iterator<Item = &Locus> {
        self.loci.iter().filter(|l| l.kind == LocusKind::Pair)
    }

    #[inline(always)]
    pub fn get(&self, id: &str) -> Option<&Locus> {
        self.by_id.get(id).map(|num| &self.loci[*num])
    }

    pub fn default_allele(&self, id: &str) -> Option<&str> {
        self.get(id).map(|l| l.default_allele())
    }

    pub fn allele_rank(&self, id: &str, allele: &str) -> Option<usize> {
        self.get(id)?.allele_rank(allele)
    }
}

pub fn load_loci_from_json_text(json_text: &str) -> Result<LocusRegistry> {
    LocusRegistry::new(json_text)
}

pub fn load_loci_from_path(path: &str) -> Result<LocusRegistry> {
    let text = fs::read_to_string(path)?;
    LocusRegistry::new(&text)
}

impl Default for LocusRegistry {
    fn default() -> Self {
        if let Ok(custom) = load_loci_from_path(RUNTIME_LOCI_PATH) {
            return custom;
        }
        LocusRegistry::new(BUILTIN_LOCI_JSON).expect("Builtin loci file is invalid")
    }
}
