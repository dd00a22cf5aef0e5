use crate::core::models::atom::Element;
use crate::core::models::topology::BondOrder;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token standing for "any element" in a range specification.
pub const WILDCARD_ELEMENT: &str = "*";

/// Separator meaning "any bond order".
pub const ANY_ORDER_SEPARATOR: char = '~';

const BOND_SEPARATORS: [char; 4] = ['~', '-', '=', '#'];

/// One parsed range specification such as `N~N:1.0-2.0`.
///
/// `None` in an element or order slot is a wildcard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    pub element_a: Option<Element>,
    pub element_b: Option<Element>,
    pub order: Option<BondOrder>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum SpecParseError {
    #[error("Range specification is empty")]
    Empty,

    #[error("Missing ':' between atom pair and length range in '{0}'")]
    MissingColon(String),

    #[error("Missing bond separator ('~', '-', '=' or '#') in atom pair '{0}'")]
    MissingBondSeparator(String),

    #[error("Unknown element '{0}' in range specification")]
    UnknownElement(String),

    #[error("Missing '-' between minimum and maximum length in '{0}'")]
    MissingRangeSeparator(String),

    #[error("Invalid length '{0}' in range specification")]
    InvalidLength(String),

    #[error("Minimum length {min} exceeds maximum length {max} in '{token}'")]
    InvertedRange { token: String, min: f64, max: f64 },
}

impl FromStr for RangeSpec {
    type Err = SpecParseError;

    /// Parses `ELEM1<sep>ELEM2:MIN-MAX`.
    ///
    /// `<sep>` is `~` for any order, or `-`, `=`, `#` for single, double and triple.
    /// Either element may be `*`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SpecParseError::Empty);
        }

        let (pair, range) = s
            .split_once(':')
            .ok_or_else(|| SpecParseError::MissingColon(s.to_string()))?;

        let (sep_pos, sep) = pair
            .char_indices()
            .find(|(_, c)| BOND_SEPARATORS.contains(c))
            .ok_or_else(|| SpecParseError::MissingBondSeparator(pair.to_string()))?;
        let element_a = parse_element_token(&pair[..sep_pos])?;
        let element_b = parse_element_token(&pair[sep_pos + sep.len_utf8()..])?;
        let order = match sep {
            '-' => Some(BondOrder::Single),
            '=' => Some(BondOrder::Double),
            '#' => Some(BondOrder::Triple),
            _ => None,
        };

        let (min_token, max_token) = range
            .split_once('-')
            .ok_or_else(|| SpecParseError::MissingRangeSeparator(range.to_string()))?;
        let min = parse_length_token(min_token)?;
        let max = parse_length_token(max_token)?;
        if min > max {
            return Err(SpecParseError::InvertedRange {
                token: range.to_string(),
                min,
                max,
            });
        }

        Ok(Self {
            element_a,
            element_b,
            order,
            min,
            max,
        })
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let element = |e: Option<Element>| e.map_or(WILDCARD_ELEMENT, |e| e.symbol());
        let sep = self.order.map_or(ANY_ORDER_SEPARATOR, BondOrder::symbol);
        write!(
            f,
            "{}{}{}:{}-{}",
            element(self.element_a),
            sep,
            element(self.element_b),
            self.min,
            self.max
        )
    }
}

/// Parses a comma-separated list of range specifications. Nothing is returned unless
/// every entry parses.
pub fn parse_range_specs(text: &str) -> Result<Vec<RangeSpec>, SpecParseError> {
    let specs: Vec<RangeSpec> = text
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(RangeSpec::from_str)
        .collect::<Result<_, _>>()?;
    if specs.is_empty() {
        return Err(SpecParseError::Empty);
    }
    Ok(specs)
}

fn parse_element_token(token: &str) -> Result<Option<Element>, SpecParseError> {
    let token = token.trim();
    if token == WILDCARD_ELEMENT {
        return Ok(None);
    }
    Element::from_str(token)
        .map(Some)
        .map_err(|_| SpecParseError::UnknownElement(token.to_string()))
}

fn parse_length_token(token: &str) -> Result<f64, SpecParseError> {
    let token = token.trim();
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(SpecParseError::InvalidLength(token.to_string())),
    }
}
