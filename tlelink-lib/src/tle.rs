//! Two-line element set text.
//!
//! Lines are 69 columns, numbered from 0 here:
//! ```text
//! 1 43678U 18084H   23108.95540690  .00019443  00000+0  34804-3 0  9993
//! 2 43678  51.6391 262.0713 0006099 208.3097 234.4315 15.49967480 48017
//! ```
//! Column 68 of each line is the [checksum] of the preceding 68 columns.
use std::io::{Read, Write};
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::elements::{Angle, DragTerm, Eccentricity, ElementSet, EpochDay, MeanMotion};
use crate::error::FormatError;
use crate::layout::Field;
use crate::prelude::*;

/// Length of both element lines, including the checksum column.
pub const LINE_LEN: usize = 69;

const CATALOG: Range<usize> = 2..7;
const CLASSIFICATION: usize = 7;
const DESIGNATOR: Range<usize> = 9..17;
const EPOCH: Range<usize> = 18..32;
const DERIVATIVE: Range<usize> = 33..43;
const SECOND_DERIVATIVE: Range<usize> = 44..52;
const DRAG: Range<usize> = 53..61;
const EPHEMERIS: usize = 62;
const ELEMENT_SET: Range<usize> = 64..68;
const INCLINATION: Range<usize> = 8..16;
const RAAN: Range<usize> = 17..25;
const ECCENTRICITY: Range<usize> = 26..33;
const ARGUMENT_OF_PERIGEE: Range<usize> = 34..42;
const MEAN_ANOMALY: Range<usize> = 43..51;
const MEAN_MOTION: Range<usize> = 52..63;
const REVOLUTION: Range<usize> = 63..68;
const CHECKSUM: usize = 68;

/// Modulo-10 checksum of the first 68 columns of `line`.
///
/// Digits count their value, `-` counts 1 and everything else 0. This is a weak check:
/// it misses transposed columns and a `1` swapped for a `-`.
#[must_use]
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(LINE_LEN - 1)
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

/// The TLE fields of a target that are not carried in the payload.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct Identity {
    #[builder(setter(into))]
    pub name: String,
    /// NORAD catalog number
    pub catalog_number: u32,
    #[builder(default = 'U')]
    pub classification: char,
    /// International designator, e.g., `18084H`
    #[builder(setter(into))]
    pub international_designator: String,
    /// Second derivative of mean motion in drag term notation, written as-is
    #[builder(default = String::from("00000+0"), setter(into))]
    pub second_derivative: String,
    #[builder(default)]
    pub ephemeris_type: u8,
    #[builder(default = 999)]
    pub element_set_number: u16,
    #[builder(default)]
    pub revolution_number: u32,
}

impl Default for Identity {
    fn default() -> Self {
        Identity::builder()
            .name("")
            .catalog_number(0)
            .international_designator("")
            .build()
    }
}

impl Identity {
    fn check(&self) -> std::result::Result<(), FormatError> {
        let column = |name: &'static str, text: String| Err(FormatError::Column { name, text });
        if self.catalog_number > 99_999 {
            return column("catalog number", self.catalog_number.to_string());
        }
        if !self.classification.is_ascii_graphic() {
            return column("classification", self.classification.to_string());
        }
        if !self.international_designator.is_ascii() || self.international_designator.len() > 8
        {
            return column(
                "international designator",
                self.international_designator.clone(),
            );
        }
        if !self.second_derivative.is_ascii() || self.second_derivative.len() > 8 {
            return column("second derivative", self.second_derivative.clone());
        }
        if self.ephemeris_type > 9 {
            return column("ephemeris type", self.ephemeris_type.to_string());
        }
        if self.element_set_number > 9999 {
            return column("element set number", self.element_set_number.to_string());
        }
        if self.revolution_number > 99_999 {
            return column("revolution number", self.revolution_number.to_string());
        }
        Ok(())
    }
}

/// A named element set: the name line and both element lines.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TleRecord {
    pub identity: Identity,
    pub elements: ElementSet,
}

impl TleRecord {
    #[must_use]
    pub fn new(identity: Identity, elements: ElementSet) -> Self {
        TleRecord { identity, elements }
    }

    /// Format both element lines, each ending with its checksum.
    ///
    /// # Errors
    /// [Error::Field] if an element does not fit its columns, [Error::Format] if an
    /// identity field does not.
    pub fn lines(&self) -> Result<[String; 2]> {
        self.elements.check_digits()?;
        self.identity.check()?;

        let id = &self.identity;
        let el = &self.elements;
        let line1 = format!(
            "1 {:05}{} {:<8} {} {:>10} {:>8} {:>8} {} {:>4}",
            id.catalog_number,
            id.classification,
            id.international_designator,
            el.epoch,
            el.mean_motion_derivative,
            id.second_derivative,
            el.drag_term,
            id.ephemeris_type,
            id.element_set_number,
        );
        let line2 = format!(
            "2 {:05} {:>8} {:>8} {} {:>8} {:>8} {:>11}{:>5}",
            id.catalog_number,
            el.inclination,
            el.raan,
            el.eccentricity,
            el.argument_of_perigee,
            el.mean_anomaly,
            el.mean_motion,
            id.revolution_number,
        );
        Ok([line1, line2].map(|line| {
            let sum = checksum(&line);
            format!("{line}{sum}")
        }))
    }

    /// The name line followed by both element lines, newline separated.
    ///
    /// # Errors
    /// See [TleRecord::lines].
    pub fn to_text(&self) -> Result<String> {
        let [line1, line2] = self.lines()?;
        Ok(format!("{}\n{line1}\n{line2}", self.identity.name))
    }

    /// Parse a name and both element lines.
    ///
    /// Columns are fixed; no tolerance is given for lines that are too long or short.
    ///
    /// # Errors
    /// [Error::Format] if a line does not follow the column layout or its checksum
    /// does not match, [Error::Field] if an element's text is malformed.
    pub fn parse(name: &str, line1: &str, line2: &str) -> Result<Self> {
        check_line(1, line1)?;
        check_line(2, line2)?;

        let catalog1: u32 = column(line1, "catalog number", CATALOG)?;
        let catalog2: u32 = column(line2, "catalog number", CATALOG)?;
        if catalog1 != catalog2 {
            return Err(FormatError::CatalogMismatch {
                line1: catalog1,
                line2: catalog2,
            }
            .into());
        }

        let ephemeris = &line1[EPHEMERIS..=EPHEMERIS];
        let ephemeris_type = if ephemeris == " " {
            0
        } else {
            column(line1, "ephemeris type", EPHEMERIS..EPHEMERIS + 1)?
        };

        let identity = Identity {
            name: name.trim().to_string(),
            catalog_number: catalog1,
            classification: char::from(line1.as_bytes()[CLASSIFICATION]),
            international_designator: line1[DESIGNATOR].trim().to_string(),
            second_derivative: line1[SECOND_DERIVATIVE].trim().to_string(),
            ephemeris_type,
            element_set_number: column(line1, "element set number", ELEMENT_SET)?,
            revolution_number: column(line2, "revolution number", REVOLUTION)?,
        };

        let elements = ElementSet {
            epoch: line1[EPOCH].parse::<EpochDay>()?,
            mean_motion_derivative: line1[DERIVATIVE].parse()?,
            drag_term: line1[DRAG].parse::<DragTerm>()?,
            inclination: Angle::parse(Field::Inclination, &line2[INCLINATION])?,
            raan: Angle::parse(Field::Raan, &line2[RAAN])?,
            eccentricity: line2[ECCENTRICITY].parse::<Eccentricity>()?,
            argument_of_perigee: Angle::parse(
                Field::ArgumentOfPerigee,
                &line2[ARGUMENT_OF_PERIGEE],
            )?,
            mean_anomaly: Angle::parse(Field::MeanAnomaly, &line2[MEAN_ANOMALY])?,
            mean_motion: line2[MEAN_MOTION].parse::<MeanMotion>()?,
        };
        debug!(name = %identity.name, catalog = catalog1, "parsed element set");

        Ok(TleRecord { identity, elements })
    }

    /// Parse 2 or 3 lines of text; the name line is optional. Blank lines and a `0 `
    /// name prefix are ignored.
    ///
    /// # Errors
    /// [FormatError::MissingLines] if there are not 2 or 3 lines, otherwise see
    /// [TleRecord::parse].
    pub fn from_text(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty())
            .collect();
        match lines.as_slice() {
            [line1, line2] => Self::parse("", line1, line2),
            [name, line1, line2] => {
                let name = name.strip_prefix("0 ").unwrap_or(name);
                Self::parse(name, line1, line2)
            }
            _ => Err(FormatError::MissingLines(lines.len()).into()),
        }
    }

    /// Read a single record from `reader`.
    ///
    /// # Errors
    /// [Error::Io] if reading fails, otherwise see [TleRecord::from_text].
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_text(&text)
    }

    /// Write [TleRecord::to_text] and a trailing newline to `writer`.
    ///
    /// # Errors
    /// [Error::Io] if writing fails, otherwise see [TleRecord::lines].
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let text = self.to_text()?;
        writeln!(writer, "{text}")?;
        Ok(())
    }
}

fn check_line(number: u8, line: &str) -> std::result::Result<(), FormatError> {
    if line.len() != LINE_LEN || !line.is_ascii() {
        return Err(FormatError::LineLength {
            line: number,
            actual: line.chars().count(),
        });
    }
    let first = char::from(line.as_bytes()[0]);
    if first != char::from(b'0' + number) {
        return Err(FormatError::LineNumber {
            line: number,
            actual: first,
        });
    }
    let actual = line.as_bytes()[CHECKSUM];
    if !actual.is_ascii_digit() {
        return Err(FormatError::Column {
            name: "checksum",
            text: line[CHECKSUM..].to_string(),
        });
    }
    let expected = checksum(line);
    if actual - b'0' != expected {
        return Err(FormatError::Checksum {
            line: number,
            expected,
            actual: actual - b'0',
        });
    }
    Ok(())
}

fn column<T: std::str::FromStr>(
    line: &str,
    name: &'static str,
    range: Range<usize>,
) -> std::result::Result<T, FormatError> {
    let text = line[range].trim();
    text.parse().map_err(|_| FormatError::Column {
        name,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::MeanMotionDerivative;
    use crate::error::FieldError;
    use crate::Error;
    use test_case::test_case;

    const LINE1: &str =
        "1 43678U 18084H   23108.95540690  .00019443  00000+0  34804-3 0  9993";
    const LINE2: &str =
        "2 43678  51.6391 262.0713 0006099 208.3097 234.4315 15.49967480 48017";

    fn identity() -> Identity {
        Identity::builder()
            .name("DIWATA-2B")
            .catalog_number(43678)
            .international_designator("18084H")
            .revolution_number(4801)
            .build()
    }

    #[test]
    fn checksum_of_known_lines() {
        assert_eq!(checksum(LINE1), 3);
        assert_eq!(checksum(LINE2), 7);
    }

    #[test]
    fn checksum_counts_minus_as_one() {
        let line = format!("{:<68}", "1 -");
        assert_eq!(checksum(&line), 2);
        // `1` and `-` are indistinguishable
        assert_eq!(checksum(&line.replace('-', "1")), 2);
    }

    #[test]
    fn checksum_misses_transposition() {
        let swapped = LINE2.replacen("51.6391", "15.6391", 1);
        assert_eq!(checksum(&swapped), checksum(LINE2));
    }

    #[test]
    fn checksum_detects_most_digit_replacements() {
        // column 20 is the '1' of the epoch day 23108
        let mut detected = 0;
        for digit in b'0'..=b'9' {
            let mut line = LINE1.as_bytes().to_vec();
            line[20] = digit;
            let line = String::from_utf8(line).unwrap();
            if checksum(&line) != checksum(LINE1) {
                detected += 1;
            }
        }
        assert_eq!(detected, 9);
    }

    #[test]
    fn parse_known_lines() {
        let record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();

        assert_eq!(record.identity, identity());
        let el = record.elements;
        assert_eq!(el.epoch.to_string(), "23108.95540690");
        assert_eq!(
            el.mean_motion_derivative,
            MeanMotionDerivative {
                positive: true,
                high: 1,
                low: 9443
            }
        );
        assert_eq!(el.drag_term.to_string(), "34804-3");
        assert_eq!(el.inclination.to_string(), "51.6391");
        assert_eq!(el.raan.to_string(), "262.0713");
        assert_eq!(el.eccentricity, Eccentricity(6099));
        assert_eq!(el.argument_of_perigee.to_string(), "208.3097");
        assert_eq!(el.mean_anomaly.to_string(), "234.4315");
        assert_eq!(el.mean_motion.to_bits(), 0x4177_feab);
    }

    #[test]
    fn format_round_trip() {
        let record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        let [line1, line2] = record.lines().unwrap();
        assert_eq!(line1, LINE1);
        assert_eq!(line2, LINE2);
    }

    #[test_case(Field::Inclination, 5, 1; "inclination one digit")]
    #[test_case(Field::Inclination, 51, 6391; "inclination two digits")]
    #[test_case(Field::Inclination, 151, 6391; "inclination three digits")]
    #[test_case(Field::Raan, 5, 1; "raan one digit")]
    #[test_case(Field::Raan, 62, 713; "raan two digits")]
    #[test_case(Field::ArgumentOfPerigee, 8, 3097; "perigee one digit")]
    #[test_case(Field::ArgumentOfPerigee, 20, 9999; "perigee two digits")]
    #[test_case(Field::MeanAnomaly, 4, 4315; "anomaly one digit")]
    #[test_case(Field::MeanAnomaly, 34, 0; "anomaly two digits")]
    fn angle_width_keeps_columns(field: Field, degrees: u16, fraction: u16) {
        let mut record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        let angle = Angle { degrees, fraction };
        let (columns, expected) = match field {
            Field::Inclination => (INCLINATION, &mut record.elements.inclination),
            Field::Raan => (RAAN, &mut record.elements.raan),
            Field::ArgumentOfPerigee => (
                ARGUMENT_OF_PERIGEE,
                &mut record.elements.argument_of_perigee,
            ),
            Field::MeanAnomaly => (MEAN_ANOMALY, &mut record.elements.mean_anomaly),
            _ => unreachable!(),
        };
        *expected = angle;
        let [_, line2] = record.lines().unwrap();

        assert_eq!(line2.len(), LINE_LEN);
        assert_eq!(&line2[columns], format!("{:>8}", angle.to_string()));
        assert_eq!(&line2[ECCENTRICITY], "0006099");
        assert_eq!(&line2[MEAN_MOTION], "15.49967480");
        assert_eq!(&line2[REVOLUTION], " 4801");
        let reparsed = TleRecord::parse("", LINE1, &line2).unwrap();
        assert_eq!(reparsed.elements, record.elements);
    }

    #[test]
    fn formatted_lines_have_full_width() {
        let record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        let [line1, line2] = record.lines().unwrap();
        assert_eq!(line1.len(), LINE_LEN, "{line1}");
        assert_eq!(line2.len(), LINE_LEN, "{line2}");
        assert_eq!(&line1[DERIVATIVE], " .00019443");
        assert_eq!(&line1[DRAG], " 34804-3");
        assert_eq!(&line2[INCLINATION], " 51.6391");
        assert_eq!(TleRecord::parse("DIWATA-2B", &line1, &line2).unwrap(), record);
    }

    #[test]
    fn negative_zero_drag() {
        let mut record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        record.elements.drag_term = DragTerm {
            positive: false,
            mantissa: 0,
            exponent: 0,
        };
        let [line1, _] = record.lines().unwrap();
        assert_eq!(&line1[DRAG], "-00000-0");
        let reparsed = TleRecord::parse("", &line1, LINE2).unwrap();
        assert_eq!(reparsed.elements.drag_term, record.elements.drag_term);
    }

    #[test]
    fn negative_derivative_columns() {
        let mut record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        record.elements.mean_motion_derivative.positive = false;
        let [line1, _] = record.lines().unwrap();
        assert_eq!(&line1[DERIVATIVE], "-.00019443");
        assert_eq!(line1.len(), LINE_LEN);
    }

    #[test]
    fn bad_checksum() {
        let line1 = format!("{}4", &LINE1[..68]);
        let zult = TleRecord::parse("", &line1, LINE2);
        assert!(
            matches!(
                zult,
                Err(Error::Format(FormatError::Checksum {
                    line: 1,
                    expected: 3,
                    actual: 4
                }))
            ),
            "{zult:?}"
        );
    }

    #[test]
    fn short_line() {
        let zult = TleRecord::parse("", &LINE1[..68], LINE2);
        assert!(matches!(
            zult,
            Err(Error::Format(FormatError::LineLength {
                line: 1,
                actual: 68
            }))
        ));
    }

    #[test]
    fn swapped_lines() {
        let zult = TleRecord::parse("", LINE2, LINE1);
        assert!(matches!(
            zult,
            Err(Error::Format(FormatError::LineNumber { line: 1, .. }))
        ));
    }

    #[test]
    fn catalog_mismatch() {
        let line2 = LINE2.replacen("43678", "43679", 1);
        let line2 = format!("{}{}", &line2[..68], checksum(&line2));
        let zult = TleRecord::parse("", LINE1, &line2);
        assert!(matches!(
            zult,
            Err(Error::Format(FormatError::CatalogMismatch {
                line1: 43678,
                line2: 43679
            }))
        ));
    }

    #[test]
    fn malformed_field_is_field_error() {
        // eccentricity with a decimal point keeps the checksum
        let line2 = LINE2.replacen(" 0006099 ", " .006099 ", 1);
        let line2 = format!("{}{}", &line2[..68], checksum(&line2));
        let zult = TleRecord::parse("", LINE1, &line2);
        assert!(
            matches!(
                zult,
                Err(Error::Field(FieldError::Syntax {
                    field: Field::Eccentricity,
                    ..
                }))
            ),
            "{zult:?}"
        );
    }

    #[test]
    fn unprintable_elements() {
        let mut record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        record.elements.mean_motion = MeanMotion::from(123.5);
        assert!(matches!(
            record.lines(),
            Err(Error::Field(FieldError::OutOfRange {
                field: Field::MeanMotion,
                ..
            }))
        ));
    }

    #[test]
    fn unprintable_identity() {
        let mut record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        record.identity.international_designator = "2018084HX".into();
        assert!(matches!(
            record.lines(),
            Err(Error::Format(FormatError::Column {
                name: "international designator",
                ..
            }))
        ));
    }

    #[test_case(format!("DIWATA-2B\n{LINE1}\n{LINE2}\n"), "DIWATA-2B"; "three lines")]
    #[test_case(format!("{LINE1}\r\n{LINE2}\r\n"), ""; "two lines crlf")]
    #[test_case(format!("0 DIWATA-2B\n\n{LINE1}\n{LINE2}"), "DIWATA-2B"; "name prefix")]
    fn from_text(text: String, name: &str) {
        let record = TleRecord::from_text(&text).unwrap();
        assert_eq!(record.identity.name, name);
        assert_eq!(record.identity.catalog_number, 43678);
    }

    #[test]
    fn from_text_missing_lines() {
        let zult = TleRecord::from_text(LINE1);
        assert!(matches!(
            zult,
            Err(Error::Format(FormatError::MissingLines(1)))
        ));
    }

    #[test]
    fn to_text() {
        let record = TleRecord::parse("DIWATA-2B", LINE1, LINE2).unwrap();
        assert_eq!(
            record.to_text().unwrap(),
            format!("DIWATA-2B\n{LINE1}\n{LINE2}")
        );
    }
}
