use lazy_static::lazy_static;
use locus::LocusRegistry;

pub mod aggregate;
pub mod cross;
pub mod error;
pub mod genotype;
pub mod import;
pub mod locus;
pub mod phenotype;

lazy_static! {
    // Locus registry, shared by all callers; loaded once, never mutated
    pub static ref LOCI: LocusRegistry = LocusRegistry::default();
}
