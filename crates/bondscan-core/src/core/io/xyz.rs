use crate::core::models::atom::{Atom, Element};
use crate::core::models::ids::MoleculeId;
use crate::core::models::topology::{Bond, BondOrder};
use itertools::Itertools;
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// One molecule of a multi-frame XYZ file.
///
/// The comment line may carry `key=value` properties: `id=<integer>` sets the molecule
/// id and `bonds=0-1:1,1-2:2` gives the starting bond graph as `atom-atom:order` items.
/// An optional fifth column on atom lines is the formal charge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XyzFrame {
    pub id: Option<MoleculeId>,
    pub atoms: Vec<Atom>,
    pub bonds: Option<Vec<Bond>>,
}

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
}

#[derive(Debug, Error, PartialEq)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("File ended after {found} of {expected} atom lines")]
    Truncated { expected: usize, found: usize },
    #[error("Atom line needs an element and three coordinates")]
    MissingField,
    #[error("Unknown element '{0}'")]
    UnknownElement(String),
    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("Invalid formal charge '{0}'")]
    InvalidCharge(String),
    #[error("Invalid comment property '{0}'")]
    InvalidProperty(String),
}

pub struct XyzFile;

impl XyzFile {
    pub fn read_from(reader: &mut impl BufRead) -> Result<Vec<XyzFrame>, XyzError> {
        let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));
        let mut frames = Vec::new();

        while let Some((line_num, line)) = lines.next() {
            let line = line?;
            let count_str = line.trim();
            if count_str.is_empty() {
                continue;
            }
            let expected: usize = count_str.parse().map_err(|_| XyzError::Parse {
                line: line_num,
                kind: XyzParseErrorKind::InvalidAtomCount(count_str.to_string()),
            })?;

            let mut frame = XyzFrame::default();
            match lines.next() {
                Some((comment_num, comment)) => {
                    parse_comment(&comment?, &mut frame).map_err(|kind| XyzError::Parse {
                        line: comment_num,
                        kind,
                    })?;
                }
                None => {
                    return Err(XyzError::Parse {
                        line: line_num,
                        kind: XyzParseErrorKind::Truncated { expected, found: 0 },
                    });
                }
            }

            for found in 0..expected {
                let Some((atom_num, atom_line)) = lines.next() else {
                    return Err(XyzError::Parse {
                        line: line_num,
                        kind: XyzParseErrorKind::Truncated { expected, found },
                    });
                };
                let atom = parse_atom(&atom_line?).map_err(|kind| XyzError::Parse {
                    line: atom_num,
                    kind,
                })?;
                frame.atoms.push(atom);
            }
            frames.push(frame);
        }

        Ok(frames)
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<XyzFrame>, XyzError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    pub fn write_to(frames: &[XyzFrame], writer: &mut impl Write) -> Result<(), XyzError> {
        for frame in frames {
            writeln!(writer, "{}", frame.atoms.len())?;

            let mut properties = Vec::new();
            if let Some(id) = frame.id {
                properties.push(format!("id={}", id));
            }
            if let Some(bonds) = &frame.bonds {
                properties.push(format!(
                    "bonds={}",
                    bonds
                        .iter()
                        .map(|b| format!("{}-{}:{}", b.atom_a, b.atom_b, b.order.value()))
                        .join(",")
                ));
            }
            writeln!(writer, "{}", properties.join(" "))?;

            for atom in &frame.atoms {
                write!(
                    writer,
                    "{:<2} {:>12.6} {:>12.6} {:>12.6}",
                    atom.element, atom.position.x, atom.position.y, atom.position.z
                )?;
                if atom.charge != 0 {
                    write!(writer, " {:>3}", atom.charge)?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(frames: &[XyzFrame], path: P) -> Result<(), XyzError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(frames, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn parse_comment(line: &str, frame: &mut XyzFrame) -> Result<(), XyzParseErrorKind> {
    for token in line.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let invalid = || XyzParseErrorKind::InvalidProperty(token.to_string());
        match key {
            "id" => {
                let id = value.parse::<u64>().map_err(|_| invalid())?;
                frame.id = Some(MoleculeId(id));
            }
            "bonds" => {
                let bonds = value
                    .split(',')
                    .filter(|item| !item.is_empty())
                    .map(|item| parse_bond(item).ok_or_else(invalid))
                    .collect::<Result<Vec<_>, _>>()?;
                frame.bonds = Some(bonds);
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_bond(item: &str) -> Option<Bond> {
    let (pair, order) = item.split_once(':')?;
    let (a, b) = pair.split_once('-')?;
    let a = a.trim().parse::<usize>().ok()?;
    let b = b.trim().parse::<usize>().ok()?;
    if a == b {
        return None;
    }
    let order = BondOrder::from_str(order).ok()?;
    Some(Bond::new(a, b, order))
}

fn parse_atom(line: &str) -> Result<Atom, XyzParseErrorKind> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(XyzParseErrorKind::MissingField);
    }
    let element = Element::from_str(fields[0])
        .map_err(|_| XyzParseErrorKind::UnknownElement(fields[0].to_string()))?;

    let coord = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| XyzParseErrorKind::InvalidCoordinate(s.to_string()))
    };
    let position = Point3::new(coord(fields[1])?, coord(fields[2])?, coord(fields[3])?);

    let charge = match fields.get(4) {
        Some(s) => s
            .trim_start_matches('+')
            .parse::<i8>()
            .map_err(|_| XyzParseErrorKind::InvalidCharge(s.to_string()))?,
        None => 0,
    };
    Ok(Atom::new(element, position).with_charge(charge))
}
