use crate::chemistry::residue_mass;
use crate::errors::ConfigurationError;
use serde::{
    Deserialize,
    Serialize,
};

/// Where on a peptide a modification can sit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationPosition {
    ProteinNTerm,
    PeptideNTerm,
    #[default]
    Residue,
    PeptideCTerm,
    ProteinCTerm,
}

/// A chemical modification.
///
/// A `target` of `None` means "any residue", which is only meaningful for the
/// terminal positions.
///
/// ```
/// use fragseek::models::{Modification, ModificationPosition};
///
/// let ox: Modification = serde_json::from_str(
///     r#"{"name": "Oxidation", "target": "M", "mass_shift": 15.994915}"#,
/// ).unwrap();
/// assert_eq!(ox.position, ModificationPosition::Residue);
/// assert!(ox.targets('M'));
/// assert!(!ox.targets('K'));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub name: String,
    #[serde(default)]
    pub target: Option<char>,
    #[serde(default)]
    pub position: ModificationPosition,
    pub mass_shift: f64,
}

impl Modification {
    pub fn new(
        name: impl Into<String>,
        target: Option<char>,
        position: ModificationPosition,
        mass_shift: f64,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            position,
            mass_shift,
        }
    }

    pub fn targets(&self, residue: char) -> bool {
        self.target.is_none_or(|t| t == residue)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidModification {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("modification name is empty"));
        }
        if !self.mass_shift.is_finite() {
            return Err(invalid("mass shift is not a finite number"));
        }
        match self.target {
            Some(t) if residue_mass(t).is_none() => {
                return Err(invalid("target is not a known residue"));
            }
            None if self.position == ModificationPosition::Residue => {
                return Err(invalid("residue modifications need a target residue"));
            }
            _ => {}
        }
        Ok(())
    }
}

/// A named list of modifications and how it is used in a search.
///
/// The name is usually the stem of the file the list was read from and ends up
/// in the index cache signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationList {
    pub name: String,
    pub modifications: Vec<Modification>,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub variable: bool,
    #[serde(default)]
    pub localize: bool,
}

impl ModificationList {
    pub fn is_in_use(&self) -> bool {
        self.fixed || self.variable || self.localize
    }
}

/// Immutable, validated set of modifications for one index build.
///
/// Variable modifications get type ids `1..=V` (in order) and localizable ones
/// `V + 1..=V + L`. Type id 0 is reserved for "no modification".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModificationCatalog {
    pub fixed: Vec<Modification>,
    pub variable: Vec<Modification>,
    pub localizable: Vec<Modification>,
    pub fixed_list_names: Vec<String>,
    pub variable_list_names: Vec<String>,
    pub localize_list_names: Vec<String>,
}

impl ModificationCatalog {
    pub fn new(lists: &[ModificationList]) -> Result<Self, ConfigurationError> {
        let mut out = Self::default();
        for list in lists.iter().filter(|x| x.is_in_use()) {
            for modification in list.modifications.iter() {
                modification.validate()?;
            }
            if list.fixed {
                out.fixed.extend(list.modifications.iter().cloned());
                out.fixed_list_names.push(list.name.clone());
            }
            if list.variable {
                out.variable.extend(list.modifications.iter().cloned());
                out.variable_list_names.push(list.name.clone());
            }
            if list.localize {
                out.localizable.extend(list.modifications.iter().cloned());
                out.localize_list_names.push(list.name.clone());
            }
        }

        let num_typed = out.variable.len() + out.localizable.len();
        if num_typed >= u16::MAX as usize {
            return Err(ConfigurationError::InvalidParameter {
                field: "modifications",
                reason: format!(
                    "{} variable/localizable modifications, at most {} are supported",
                    num_typed,
                    u16::MAX - 1
                ),
            });
        }
        Ok(out)
    }

    pub fn variable_type_id(&self, index: usize) -> u16 {
        (index + 1) as u16
    }

    pub fn localizable_type_id(&self, index: usize) -> u16 {
        (self.variable.len() + index + 1) as u16
    }

    /// Resolves a slot type id back to its modification.
    pub fn by_type_id(&self, type_id: u16) -> Option<&Modification> {
        let idx = (type_id as usize).checked_sub(1)?;
        if idx < self.variable.len() {
            self.variable.get(idx)
        } else {
            self.localizable.get(idx - self.variable.len())
        }
    }

    pub fn localizable_index(&self, name: &str) -> Option<usize> {
        self.localizable.iter().position(|x| x.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oxidation() -> Modification {
        Modification::new(
            "Oxidation",
            Some('M'),
            ModificationPosition::Residue,
            15.994915,
        )
    }

    fn phospho() -> Modification {
        Modification::new("Phospho", Some('S'), ModificationPosition::Residue, 79.966331)
    }

    #[test]
    fn test_catalog_type_ids() {
        let lists = vec![
            ModificationList {
                name: "common".into(),
                modifications: vec![oxidation()],
                fixed: false,
                variable: true,
                localize: false,
            },
            ModificationList {
                name: "uniprot".into(),
                modifications: vec![phospho()],
                fixed: false,
                variable: false,
                localize: true,
            },
            ModificationList {
                name: "unused".into(),
                modifications: vec![oxidation()],
                fixed: false,
                variable: false,
                localize: false,
            },
        ];
        let catalog = ModificationCatalog::new(&lists).unwrap();
        assert_eq!(catalog.variable.len(), 1);
        assert_eq!(catalog.localizable.len(), 1);
        assert_eq!(catalog.variable_type_id(0), 1);
        assert_eq!(catalog.localizable_type_id(0), 2);
        assert_eq!(catalog.by_type_id(1).unwrap().name, "Oxidation");
        assert_eq!(catalog.by_type_id(2).unwrap().name, "Phospho");
        assert!(catalog.by_type_id(0).is_none());
        assert!(catalog.by_type_id(3).is_none());
        assert_eq!(catalog.localizable_index("Phospho"), Some(0));
        assert_eq!(catalog.variable_list_names, vec!["common".to_string()]);
    }

    #[test]
    fn test_invalid_modifications_rejected() {
        let no_target = Modification::new("Bad", None, ModificationPosition::Residue, 1.0);
        let nan_mass = Modification::new("Nan", Some('K'), ModificationPosition::Residue, f64::NAN);
        let unknown = Modification::new("Unk", Some('X'), ModificationPosition::Residue, 1.0);
        for bad in [no_target, nan_mass, unknown] {
            let lists = vec![ModificationList {
                name: "bad".into(),
                modifications: vec![bad],
                fixed: true,
                variable: false,
                localize: false,
            }];
            assert!(matches!(
                ModificationCatalog::new(&lists),
                Err(ConfigurationError::InvalidModification { .. })
            ));
        }

        let acetyl = Modification::new("Acetyl", None, ModificationPosition::ProteinNTerm, 42.010565);
        assert!(acetyl.validate().is_ok());
    }
}
