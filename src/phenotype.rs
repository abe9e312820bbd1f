//! Genotype to phenotype translation: an ordered rule cascade over the full
//! genotype, producing the display name, visual layer stack and tags.

use crate::{
    error::InvalidGenotypeError,
    genotype::{Genotype, Pattern},
};
use serde::{Deserialize, Serialize};

/// The observable result of one genotype. A pure function of its input:
/// identical genotypes always produce identical descriptors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeDescriptor {
    pub name_phrase: String,
    pub layer_stack: Vec<String>,
    pub carrier_tags: Vec<String>,
    pub risk_flags: Vec<String>,
    pub compact_genotype: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BaseColor {
    Black,
    Blue,
    Cocoa,
    Rojo,
    Lilac,
    Isabella,
    NewShadeRojo,
    NewShadeIsabella,
}

impl BaseColor {
    fn name(self) -> &'static str {
        match self {
            BaseColor::Black => "Black",
            BaseColor::Blue => "Blue",
            BaseColor::Cocoa => "Cocoa",
            BaseColor::Rojo => "Rojo",
            BaseColor::Lilac => "Lilac",
            BaseColor::Isabella => "Isabella",
            BaseColor::NewShadeRojo => "New Shade Rojo",
            BaseColor::NewShadeIsabella => "New Shade Isabella",
        }
    }

    fn layer_slug(self) -> &'static str {
        match self {
            BaseColor::Black => "base-black",
            BaseColor::Blue => "base-blue",
            BaseColor::Cocoa => "base-cocoa",
            BaseColor::Rojo => "base-rojo",
            BaseColor::Lilac => "base-lilac",
            BaseColor::Isabella => "base-isabella",
            BaseColor::NewShadeRojo => "base-new-shade-rojo",
            BaseColor::NewShadeIsabella => "base-new-shade-isabella",
        }
    }

    /// Which merle overlay a non-pink base selects. The isabella family
    /// shares the tan overlay; rojo and cocoa keep their own.
    fn merle_overlay(self) -> &'static str {
        match self {
            BaseColor::Rojo => "overlay-merle-rojo",
            BaseColor::Cocoa => "overlay-merle-cocoa",
            BaseColor::Lilac
            | BaseColor::Isabella
            | BaseColor::NewShadeRojo
            | BaseColor::NewShadeIsabella => "overlay-merle-tan",
            BaseColor::Black | BaseColor::Blue => "overlay-merle-black",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AgoutiExpression {
    Fawn,
    Sable,
    TanPoints,
}

impl AgoutiExpression {
    fn phrase(self) -> &'static str {
        match self {
            AgoutiExpression::Fawn => "Fawn",
            AgoutiExpression::Sable => "Sable",
            AgoutiExpression::TanPoints => "Tan Points",
        }
    }

    fn overlay(self) -> &'static str {
        match self {
            AgoutiExpression::Fawn => "overlay-fawn",
            AgoutiExpression::Sable => "overlay-sable",
            AgoutiExpression::TanPoints => "overlay-tan-points",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PiedExpression {
    Full,
    Visual,
}

impl PiedExpression {
    fn phrase(self) -> &'static str {
        match self {
            PiedExpression::Full => "Full Pied",
            PiedExpression::Visual => "Visual Pied",
        }
    }
}

/// Accumulated resolution state. Rules fire in table order and may read what
/// earlier rules decided; the descriptor is assembled once at the end.
struct Resolution {
    base: BaseColor,
    pink: bool,
    cream: bool,
    white_masked: bool,
    solid: bool,
    agouti: Option<AgoutiExpression>,
    brindle: bool,
    pied: Option<PiedExpression>,
    merle: bool,
    furnishings: bool,
    fluffy: bool,
    overlays: Vec<String>,
    carrier_tags: Vec<String>,
    risk_flags: Vec<String>,
}

impl Resolution {
    fn new() -> Self {
        Self {
            base: BaseColor::Black,
            pink: false,
            cream: false,
            white_masked: false,
            solid: false,
            agouti: None,
            brindle: false,
            pied: None,
            merle: false,
            furnishings: false,
            fluffy: false,
            overlays: vec![],
            carrier_tags: vec![],
            risk_flags: vec![],
        }
    }

    fn name_phrase(&self) -> String {
        let mut parts: Vec<&str> = vec![];
        if self.pink {
            parts.push("Pink (Albino)");
        } else if self.cream {
            parts.push("Cream");
        } else {
            if self.solid {
                parts.push("Solid");
            }
            // A black-based dog with an expressed agouti phrase is named by
            // the phrase alone ("Fawn", not "Black Fawn")
            if !(self.base == BaseColor::Black && self.agouti.is_some()) {
                parts.push(self.base.name());
            }
        }
        match (self.agouti, self.brindle) {
            (Some(AgoutiExpression::TanPoints), true) => parts.push("Trindle"),
            (Some(agouti), brindled) => {
                parts.push(agouti.phrase());
                if brindled {
                    parts.push("Brindle");
                }
            }
            (None, true) => parts.push("Brindle"),
            (None, false) => {}
        }
        if let Some(pied) = self.pied {
            parts.push(pied.phrase());
        }
        if self.merle {
            parts.push("Merle");
        }
        if self.furnishings {
            parts.push("Visual Furnishings");
        }
        if self.fluffy {
            parts.push("Fluffy");
        }
        if self.white_masked {
            parts.push("(White-Masked)");
        }
        parts.join(" ")
    }

    fn base_layer(&self) -> String {
        let slug = if self.pink {
            "base-pink"
        } else if self.cream || self.white_masked {
            "base-cream"
        } else {
            self.base.layer_slug()
        };
        if self.fluffy {
            format!("{slug}-fluffy")
        } else {
            slug.to_string()
        }
    }

    fn into_descriptor(self, genotype: &Genotype) -> PhenotypeDescriptor {
        let mut layer_stack = Vec::with_capacity(self.overlays.len() + 1);
        layer_stack.push(self.base_layer());
        let name_phrase = self.name_phrase();
        layer_stack.extend(self.overlays);
        PhenotypeDescriptor {
            name_phrase,
            layer_stack,
            carrier_tags: self.carrier_tags,
            risk_flags: self.risk_flags,
            compact_genotype: genotype.compact_string(),
        }
    }
}

#[inline(always)]
fn hom(genotype: &Genotype, locus: &str, allele: &str) -> bool {
    genotype
        .pair(locus)
        .map(|p| p.is_homozygous_for(allele))
        .unwrap_or(false)
}

#[inline(always)]
fn has(genotype: &Genotype, locus: &str, allele: &str) -> bool {
    genotype.pair(locus).map(|p| p.has(allele)).unwrap_or(false)
}

fn dilute_count(genotype: &Genotype) -> usize {
    [("rojo", "b"), ("cocoa", "co"), ("blue", "d")]
        .iter()
        .filter(|(locus, allele)| hom(genotype, locus, allele))
        .count()
}

struct Rule {
    #[allow(dead_code)]
    tag: &'static str,
    applies: fn(&Genotype, &Resolution) -> bool,
    apply: fn(&Genotype, &mut Resolution),
}

/// The cascade. Order is the priority order; earlier rules win where effects
/// are mutually exclusive.
const RULES: &[Rule] = &[
    Rule {
        tag: "new-shade-isabella",
        applies: |g, _| dilute_count(g) == 3,
        apply: |_, r| r.base = BaseColor::NewShadeIsabella,
    },
    Rule {
        tag: "compound-base",
        applies: |g, r| r.base == BaseColor::Black && dilute_count(g) == 2,
        apply: |g, r| {
            r.base = if hom(g, "rojo", "b") && hom(g, "cocoa", "co") {
                BaseColor::NewShadeRojo
            } else if hom(g, "rojo", "b") && hom(g, "blue", "d") {
                BaseColor::Isabella
            } else {
                BaseColor::Lilac
            };
        },
    },
    Rule {
        tag: "single-base",
        applies: |g, r| r.base == BaseColor::Black && dilute_count(g) == 1,
        apply: |g, r| {
            r.base = if hom(g, "rojo", "b") {
                BaseColor::Rojo
            } else if hom(g, "cocoa", "co") {
                BaseColor::Cocoa
            } else {
                BaseColor::Blue
            };
        },
    },
    Rule {
        tag: "pink",
        applies: |g, _| has(g, "pink", "A"),
        apply: |g, r| {
            if hom(g, "pink", "A") {
                r.pink = true;
            } else {
                r.carrier_tags.push("Pink carrier".to_string());
            }
        },
    },
    Rule {
        tag: "cream",
        applies: |g, _| hom(g, "red", "e"),
        apply: |_, r| r.cream = true,
    },
    Rule {
        tag: "white-mask",
        applies: |g, _| {
            hom(g, "intensity", "I") || (has(g, "intensity", "I") && has(g, "pied", "S"))
        },
        apply: |_, r| {
            r.white_masked = true;
            r.risk_flags
                .push("White masking hides the true coat color".to_string());
        },
    },
    Rule {
        tag: "solid",
        applies: |g, r| hom(g, "k", "KB") && !r.cream && !r.pink,
        apply: |_, r| r.solid = true,
    },
    Rule {
        tag: "agouti",
        applies: |g, r| {
            !r.solid
                && !r.cream
                && !r.pink
                && !r.white_masked
                && (has(g, "agouti", "Ay") || has(g, "agouti", "aw") || has(g, "agouti", "at"))
        },
        apply: |g, r| {
            let expression = if has(g, "agouti", "Ay") {
                AgoutiExpression::Fawn
            } else if has(g, "agouti", "aw") {
                AgoutiExpression::Sable
            } else {
                AgoutiExpression::TanPoints
            };
            r.agouti = Some(expression);
            r.overlays.push(expression.overlay().to_string());
        },
    },
    Rule {
        tag: "brindle",
        applies: |g, r| {
            let eligible = has(g, "k", "Kbr")
                || g.pair("k").map(|p| p.is_pair("ky", "KB")).unwrap_or(false);
            eligible && !r.solid && !r.cream && !r.pink && !r.white_masked
        },
        apply: |_, r| {
            r.brindle = true;
            r.overlays.push("overlay-brindle".to_string());
        },
    },
    Rule {
        tag: "pied",
        applies: |g, r| has(g, "pied", "S") && !r.cream && !r.pink,
        apply: |g, r| {
            r.pied = Some(if hom(g, "pied", "S") {
                PiedExpression::Full
            } else {
                PiedExpression::Visual
            });
            r.overlays.push("overlay-pied".to_string());
        },
    },
    Rule {
        tag: "merle",
        applies: |g, r| !r.cream && (has(g, "merle", "M") || g.pattern() != Pattern::No),
        apply: |g, r| {
            if has(g, "merle", "M") || g.pattern() == Pattern::Koi {
                r.merle = true;
                let overlay = if r.pink {
                    "overlay-merle-pink"
                } else {
                    r.base.merle_overlay()
                };
                r.overlays.push(overlay.to_string());
            }
            if g.pattern() == Pattern::Panda {
                r.overlays.push("overlay-panda".to_string());
            }
        },
    },
    Rule {
        tag: "furnishings",
        applies: |g, _| has(g, "furnishings", "F"),
        apply: |_, r| {
            r.furnishings = true;
            r.overlays.push("overlay-furnishings".to_string());
        },
    },
    Rule {
        tag: "fluffy",
        applies: |g, _| {
            g.pair("fluffy")
                .map(|p| p.both_in(&["l1", "l4"]))
                .unwrap_or(false)
        },
        apply: |_, r| {
            r.fluffy = true;
            r.overlays.push("overlay-fluffy".to_string());
        },
    },
    Rule {
        tag: "curly",
        applies: |g, _| has(g, "curly", "C"),
        apply: |_, r| r.overlays.push("overlay-curly".to_string()),
    },
    Rule {
        tag: "carriers",
        applies: |_, _| true,
        apply: |g, r| {
            for (locus, allele, label) in [
                ("blue", "d", "Blue carrier"),
                ("cocoa", "co", "Cocoa carrier"),
                ("rojo", "b", "Rojo carrier"),
                ("pink", "A", "Pink carrier"),
            ] {
                if has(g, locus, allele)
                    && !hom(g, locus, allele)
                    && !r.carrier_tags.iter().any(|t| t == label)
                {
                    r.carrier_tags.push(label.to_string());
                }
            }
            if hom(g, "merle", "M") {
                r.risk_flags
                    .push("Double merle: elevated risk of hearing and vision defects".to_string());
            }
        },
    },
    Rule {
        tag: "outline",
        applies: |_, _| true,
        apply: |_, r| r.overlays.push("overlay-outline".to_string()),
    },
];

/// Resolves one genotype to its descriptor. Total over valid genotypes,
/// deterministic, no hidden state.
pub fn resolve(genotype: &Genotype) -> Result<PhenotypeDescriptor, InvalidGenotypeError> {
    genotype.validate()?;
    let mut state = Resolution::new();
    for rule in RULES {
        if (rule.applies)(genotype, &state) {
            (rule.apply)(genotype, &mut state);
        }
    }
    Ok(state.into_descriptor(genotype))
}
