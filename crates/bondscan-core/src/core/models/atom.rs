use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical elements supported by the bond-length model and the valence rules.
///
/// The set covers the organic subset found in small-molecule geometry collections.
/// Elements are ordered by atomic number, which gives element pairs a stable
/// canonical orientation when used as distribution keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Element {
    H,
    C,
    N,
    O,
    F,
    P,
    S,
    Cl,
    Br,
    I,
}

impl Element {
    pub const ALL: [Element; 10] = [
        Element::H,
        Element::C,
        Element::N,
        Element::O,
        Element::F,
        Element::P,
        Element::S,
        Element::Cl,
        Element::Br,
        Element::I,
    ];

    /// Returns the standard one- or two-letter symbol of the element.
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Br => "Br",
            Element::I => "I",
        }
    }

    pub fn atomic_number(&self) -> u8 {
        match self {
            Element::H => 1,
            Element::C => 6,
            Element::N => 7,
            Element::O => 8,
            Element::F => 9,
            Element::P => 15,
            Element::S => 16,
            Element::Cl => 17,
            Element::Br => 35,
            Element::I => 53,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    /// Parses an element symbol. The first letter is case-insensitive and the
    /// second letter, if any, must be lowercase-equivalent (`"cl"`, `"Cl"`, `"CL"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" => Ok(Element::H),
            "c" => Ok(Element::C),
            "n" => Ok(Element::N),
            "o" => Ok(Element::O),
            "f" => Ok(Element::F),
            "p" => Ok(Element::P),
            "s" => Ok(Element::S),
            "cl" => Ok(Element::Cl),
            "br" => Ok(Element::Br),
            "i" => Ok(Element::I),
            _ => Err(ParseElementError(s.to_string())),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An atom of a geometry: element, formal charge and position in angstroms.
///
/// The formal charge only matters through the valence rules, where it separates
/// e.g. neutral `N` (valence 3) from `N+` (valence 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: Element,
    #[serde(default)]
    pub charge: i8,
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a neutral atom at the given position.
    pub fn new(element: Element, position: Point3<f64>) -> Self {
        Self {
            element,
            charge: 0,
            position,
        }
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    /// The atom type label used by valence rules and by logs, e.g. `"N+"` or `"O-"`.
    pub fn type_label(&self) -> String {
        AtomType::new(self.element, self.charge).to_string()
    }
}

/// An (element, formal charge) pair, the unit the valence rules are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomType {
    pub element: Element,
    pub charge: i8,
}

impl AtomType {
    pub fn new(element: Element, charge: i8) -> Self {
        Self { element, charge }
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element.symbol())?;
        match self.charge {
            0 => Ok(()),
            1 => f.write_str("+"),
            -1 => f.write_str("-"),
            c if c > 0 => write!(f, "+{}", c),
            c => write!(f, "{}", c),
        }
    }
}

impl FromStr for AtomType {
    type Err = ParseElementError;

    /// Parses labels such as `"C"`, `"N+"`, `"O-"`, `"N+2"` or `"S-2"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(['+', '-']).unwrap_or(s.len());
        let (symbol, charge_part) = s.split_at(split);
        let element = Element::from_str(symbol)?;

        let charge = match charge_part {
            "" => 0,
            "+" => 1,
            "-" => -1,
            other => other
                .parse::<i8>()
                .map_err(|_| ParseElementError(s.to_string()))?,
        };

        Ok(Self { element, charge })
    }
}
