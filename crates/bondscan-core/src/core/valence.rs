use crate::core::models::atom::{Atom, AtomType, Element};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Required total bond order per atom type.
///
/// The defaults cover the neutral organic subset plus the charged nitrogen and oxygen
/// forms that show up in small-molecule collections (`N+`, `O-`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValenceRules {
    rules: HashMap<AtomType, u8>,
}

#[derive(Debug, Error)]
pub enum ValenceLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Unknown atom type '{label}' in '{path}'")]
    UnknownAtomType { path: String, label: String },
}

impl Default for ValenceRules {
    fn default() -> Self {
        let rules = [
            (Element::H, 0, 1),
            (Element::C, 0, 4),
            (Element::N, 0, 3),
            (Element::N, 1, 4),
            (Element::O, 0, 2),
            (Element::O, -1, 1),
            (Element::F, 0, 1),
            (Element::P, 0, 3),
            (Element::S, 0, 2),
            (Element::Cl, 0, 1),
            (Element::Br, 0, 1),
            (Element::I, 0, 1),
        ]
        .into_iter()
        .map(|(element, charge, valence)| (AtomType::new(element, charge), valence))
        .collect();
        Self { rules }
    }
}

impl ValenceRules {
    /// Rules with no entries at all.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Loads rules from a TOML table of atom-type labels to valences, e.g.
    /// `"N+" = 4`. Entries in the file are laid over the defaults.
    pub fn load(path: &Path) -> Result<Self, ValenceLoadError> {
        let path_str = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ValenceLoadError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let table: HashMap<String, u8> =
            toml::from_str(&content).map_err(|e| ValenceLoadError::Toml {
                path: path_str.clone(),
                source: e,
            })?;

        let mut rules = Self::default();
        for (label, valence) in table {
            let atom_type =
                AtomType::from_str(&label).map_err(|_| ValenceLoadError::UnknownAtomType {
                    path: path_str.clone(),
                    label: label.clone(),
                })?;
            rules.set(atom_type, valence);
        }
        Ok(rules)
    }

    pub fn set(&mut self, atom_type: AtomType, valence: u8) {
        self.rules.insert(atom_type, valence);
    }

    pub fn get(&self, atom_type: AtomType) -> Option<u8> {
        self.rules.get(&atom_type).copied()
    }

    /// Required valence of `atom`, or `None` when no rule covers its type.
    pub fn valence_of(&self, atom: &Atom) -> Option<u8> {
        self.get(AtomType::new(atom.element, atom.charge))
    }
}
