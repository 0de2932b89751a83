use crate::error::{DicomcatError, Result};
use dicom_core::Tag;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A validated (group, element) pair addressing one attribute in a dataset
///
/// Only produced by parsing a tag expression or by reading the tag of an
/// element that was already decoded, so both halves always fit in 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeCoordinate {
    group: u16,
    element: u16,
}

impl AttributeCoordinate {
    /// Parses a tag expression
    ///
    /// Accepts two shapes:
    /// - `(GGGG,EEEE)` with exactly four hex digits on each side
    /// - a decimal number whose upper 16 bits are the group and lower 16 bits the element
    ///
    /// # Errors
    ///
    /// Returns [`DicomcatError::InvalidAddressFormat`] for any other input,
    /// including decimal numbers that do not fit in 32 bits.
    pub fn parse(s: &str) -> Result<Self> {
        static HEX_PAIR: OnceLock<Regex> = OnceLock::new();
        static DECIMAL: OnceLock<Regex> = OnceLock::new();
        let hex_pair = HEX_PAIR.get_or_init(|| {
            Regex::new(r"^\(([0-9A-Fa-f]{4}),([0-9A-Fa-f]{4})\)$").expect("Failed to compile regex")
        });
        let decimal =
            DECIMAL.get_or_init(|| Regex::new(r"^[0-9]+$").expect("Failed to compile regex"));

        if let Some(caps) = hex_pair.captures(s) {
            let group = u16::from_str_radix(&caps[1], 16)
                .map_err(|_| DicomcatError::InvalidAddressFormat(s.to_string()))?;
            let element = u16::from_str_radix(&caps[2], 16)
                .map_err(|_| DicomcatError::InvalidAddressFormat(s.to_string()))?;
            return Ok(Self { group, element });
        }

        if decimal.is_match(s) {
            let value: u32 = s
                .parse()
                .map_err(|_| DicomcatError::InvalidAddressFormat(s.to_string()))?;
            return Ok(Self {
                group: (value >> 16) as u16,
                element: (value & 0xFFFF) as u16,
            });
        }

        Err(DicomcatError::InvalidAddressFormat(s.to_string()))
    }

    pub fn group(&self) -> u16 {
        self.group
    }

    pub fn element(&self) -> u16 {
        self.element
    }

    /// Returns the equivalent DICOM tag
    pub fn tag(&self) -> Tag {
        Tag(self.group, self.element)
    }
}

impl FromStr for AttributeCoordinate {
    type Err = DicomcatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Tag> for AttributeCoordinate {
    fn from(tag: Tag) -> Self {
        Self {
            group: tag.group(),
            element: tag.element(),
        }
    }
}

impl fmt::Display for AttributeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.group, self.element)
    }
}
