//! Orbital element values as carried in a [Payload](crate::Payload).
//!
//! Each value keeps the exact integer subfields that are transmitted rather than a
//! floating point approximation, so decoding and re-encoding is lossless. The
//! `Display` and `FromStr` implementations use the TLE column notation for the field.
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::layout::{
    Field, FieldLayout, Subfields, ARGUMENT_OF_PERIGEE, DRAG_TERM, ECCENTRICITY, EPOCH,
    INCLINATION, MEAN_ANOMALY, MEAN_MOTION, MEAN_MOTION_DERIVATIVE, RAAN,
};

/// Parse a run of ASCII digits with a length in `min..=max`.
fn digits(field: Field, text: &str, min: usize, max: usize) -> Result<u64, FieldError> {
    let syntax = || FieldError::Syntax {
        field,
        text: text.to_string(),
    };
    if text.len() < min || text.len() > max || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(syntax());
    }
    text.parse().map_err(|_| syntax())
}

/// Strip an optional leading sign, returning whether the value is positive.
fn sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (false, &text[1..]),
        Some(b'+' | b' ') => (true, &text[1..]),
        _ => (true, text),
    }
}

/// Epoch as two-digit year and day of year with an 8 digit fractional day, e.g.,
/// `23163.90064120` is day 163.90064120 of 2023.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpochDay {
    /// Year and day of year as `YYDDD`
    pub day: u32,
    /// Fraction of the day in units of 1e-8 days
    pub fraction: u32,
}

impl EpochDay {
    /// Two-digit year
    #[must_use]
    pub fn year(&self) -> u32 {
        self.day / 1000
    }

    #[must_use]
    pub fn day_of_year(&self) -> u32 {
        self.day % 1000
    }

    /// Convert to a UTC [hifitime::Epoch]. Two-digit years 57 through 99 are 19xx,
    /// the rest 20xx.
    #[cfg(feature = "timecode")]
    #[must_use]
    pub fn to_epoch(&self) -> hifitime::Epoch {
        let yy = self.year() as i32;
        let year = if yy < 57 { 2000 + yy } else { 1900 + yy };
        let days = f64::from(self.day_of_year()) - 1.0 + f64::from(self.fraction) / 1e8;
        hifitime::Epoch::from_gregorian_utc_at_midnight(year, 1, 1) + hifitime::Unit::Day * days
    }

    fn from_subfields(sub: Subfields) -> Self {
        EpochDay {
            day: sub.whole as u32,
            fraction: sub.fraction as u32,
        }
    }

    fn subfields(&self) -> Subfields {
        Subfields::unsigned(self.day.into(), self.fraction.into())
    }
}

impl fmt::Display for EpochDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}.{:08}", self.day, self.fraction)
    }
}

impl FromStr for EpochDay {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((day, fraction)) = s.split_once('.') else {
            return Err(FieldError::Syntax {
                field: Field::Epoch,
                text: s.to_string(),
            });
        };
        Ok(EpochDay {
            day: digits(Field::Epoch, day, 1, 5)? as u32,
            fraction: digits(Field::Epoch, fraction, 8, 8)? as u32,
        })
    }
}

/// First derivative of mean motion divided by two, e.g., `.00001607`.
///
/// The 8 fractional digits travel as two 4 digit groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeanMotionDerivative {
    pub positive: bool,
    /// First four fractional digits
    pub high: u16,
    /// Last four fractional digits
    pub low: u16,
}

impl Default for MeanMotionDerivative {
    fn default() -> Self {
        MeanMotionDerivative {
            positive: true,
            high: 0,
            low: 0,
        }
    }
}

impl MeanMotionDerivative {
    #[must_use]
    pub fn value(&self) -> f64 {
        let magnitude = f64::from(self.high) / 1e4 + f64::from(self.low) / 1e8;
        if self.positive {
            magnitude
        } else {
            -magnitude
        }
    }

    fn from_subfields(sub: Subfields) -> Self {
        MeanMotionDerivative {
            positive: sub.positive,
            high: sub.whole as u16,
            low: sub.fraction as u16,
        }
    }

    fn subfields(&self) -> Subfields {
        Subfields {
            positive: self.positive,
            whole: self.high.into(),
            fraction: self.low.into(),
        }
    }
}

impl fmt::Display for MeanMotionDerivative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.positive { "" } else { "-" };
        f.pad(&format!("{sign}.{:04}{:04}", self.high, self.low))
    }
}

impl FromStr for MeanMotionDerivative {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = Field::MeanMotionDerivative;
        let (positive, rest) = sign(s.trim());
        let rest = rest.strip_prefix('0').unwrap_or(rest);
        let Some(fraction) = rest.strip_prefix('.') else {
            return Err(FieldError::Syntax {
                field,
                text: s.to_string(),
            });
        };
        digits(field, fraction, 8, 8)?;
        Ok(MeanMotionDerivative {
            positive,
            high: digits(field, &fraction[..4], 4, 4)? as u16,
            low: digits(field, &fraction[4..], 4, 4)? as u16,
        })
    }
}

/// Drag term (B*) in TLE exponential notation, e.g., `15865-3` for 0.15865e-3.
///
/// Only negative exponents can be carried; `exponent` is the magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DragTerm {
    pub positive: bool,
    /// Five digit mantissa with an implied leading decimal point
    pub mantissa: u32,
    /// Magnitude of the negative base-10 exponent
    pub exponent: u8,
}

impl Default for DragTerm {
    fn default() -> Self {
        DragTerm {
            positive: true,
            mantissa: 0,
            exponent: 0,
        }
    }
}

impl DragTerm {
    #[must_use]
    pub fn value(&self) -> f64 {
        let magnitude = f64::from(self.mantissa) / 1e5 * 10f64.powi(-i32::from(self.exponent));
        if self.positive {
            magnitude
        } else {
            -magnitude
        }
    }

    fn from_subfields(sub: Subfields) -> Self {
        DragTerm {
            positive: sub.positive,
            mantissa: sub.whole as u32,
            exponent: sub.fraction as u8,
        }
    }

    fn subfields(&self) -> Subfields {
        Subfields {
            positive: self.positive,
            whole: self.mantissa.into(),
            fraction: self.exponent.into(),
        }
    }
}

impl fmt::Display for DragTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.positive { "" } else { "-" };
        f.pad(&format!("{sign}{:05}-{}", self.mantissa, self.exponent))
    }
}

impl FromStr for DragTerm {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = Field::DragTerm;
        let (positive, rest) = sign(s.trim());
        if rest.len() != 7 || !rest.is_char_boundary(5) {
            return Err(FieldError::Syntax {
                field,
                text: s.to_string(),
            });
        }
        let (mantissa, exponent) = rest.split_at(5);
        let (exp_positive, exp_digit) = match sign(exponent) {
            (_, digit) if digit.len() == exponent.len() => {
                return Err(FieldError::Syntax {
                    field,
                    text: s.to_string(),
                })
            }
            x => x,
        };
        let exponent = digits(field, exp_digit, 1, 1)?;
        if exp_positive && exponent != 0 {
            return Err(FieldError::OutOfRange {
                field,
                value: exponent,
                limit: 0,
            });
        }
        Ok(DragTerm {
            positive,
            mantissa: digits(field, mantissa, 5, 5)? as u32,
            exponent: exponent as u8,
        })
    }
}

/// An angle in degrees with 4 fractional digits, e.g., `307.7835`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Angle {
    pub degrees: u16,
    /// Fractional degrees in units of 1e-4 degrees
    pub fraction: u16,
}

impl Angle {
    /// Parse `ddd.dddd` with 1 to 3 whole digits; `field` names the field in errors.
    ///
    /// # Errors
    /// [FieldError::Syntax] if the text is not in angle notation.
    pub fn parse(field: Field, text: &str) -> Result<Self, FieldError> {
        let text = text.trim();
        let Some((degrees, fraction)) = text.split_once('.') else {
            return Err(FieldError::Syntax {
                field,
                text: text.to_string(),
            });
        };
        Ok(Angle {
            degrees: digits(field, degrees, 1, 3)? as u16,
            fraction: digits(field, fraction, 4, 4)? as u16,
        })
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from(self.degrees) + f64::from(self.fraction) / 1e4
    }

    fn from_subfields(sub: Subfields) -> Self {
        Angle {
            degrees: sub.whole as u16,
            fraction: sub.fraction as u16,
        }
    }

    fn subfields(&self) -> Subfields {
        Subfields::unsigned(self.degrees.into(), self.fraction.into())
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}.{:04}", self.degrees, self.fraction))
    }
}

/// Eccentricity as the 7 digits following an implied decimal point, e.g., `0009791`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Eccentricity(pub u32);

impl Eccentricity {
    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from(self.0) / 1e7
    }
}

impl fmt::Display for Eccentricity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:07}", self.0)
    }
}

impl FromStr for Eccentricity {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0.")
            .or_else(|| s.strip_prefix('.'))
            .unwrap_or(s);
        Ok(Eccentricity(digits(Field::Eccentricity, s, 7, 7)? as u32))
    }
}

/// Mean motion in revolutions per day.
///
/// The value travels as the bit pattern of an IEEE-754 single-precision float, so
/// equality compares bit patterns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "f32", into = "f32"))]
pub struct MeanMotion(u32);

impl MeanMotion {
    #[must_use]
    pub fn from_bits(bits: u32) -> Self {
        MeanMotion(bits)
    }

    #[must_use]
    pub fn to_bits(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        f32::from_bits(self.0)
    }
}

impl From<f32> for MeanMotion {
    fn from(value: f32) -> Self {
        MeanMotion(value.to_bits())
    }
}

impl From<MeanMotion> for f32 {
    fn from(value: MeanMotion) -> Self {
        value.value()
    }
}

impl fmt::Display for MeanMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:.8}", self.value()))
    }
}

impl FromStr for MeanMotion {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value: f32 = s.parse().map_err(|_| FieldError::Syntax {
            field: Field::MeanMotion,
            text: s.to_string(),
        })?;
        if !value.is_finite() {
            return Err(FieldError::NotFinite {
                field: Field::MeanMotion,
            });
        }
        Ok(MeanMotion::from(value))
    }
}

/// The orbital elements carried in a single [Payload](crate::Payload).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementSet {
    pub epoch: EpochDay,
    pub mean_motion_derivative: MeanMotionDerivative,
    pub drag_term: DragTerm,
    pub inclination: Angle,
    pub raan: Angle,
    pub eccentricity: Eccentricity,
    pub argument_of_perigee: Angle,
    pub mean_anomaly: Angle,
    pub mean_motion: MeanMotion,
}

impl ElementSet {
    /// Construct from per-field subfields, e.g., as read from a payload.
    pub(crate) fn from_fields<F>(mut read: F) -> Self
    where
        F: FnMut(&FieldLayout) -> Subfields,
    {
        ElementSet {
            epoch: EpochDay::from_subfields(read(&EPOCH)),
            mean_motion_derivative: MeanMotionDerivative::from_subfields(read(
                &MEAN_MOTION_DERIVATIVE,
            )),
            drag_term: DragTerm::from_subfields(read(&DRAG_TERM)),
            inclination: Angle::from_subfields(read(&INCLINATION)),
            raan: Angle::from_subfields(read(&RAAN)),
            eccentricity: Eccentricity(read(&ECCENTRICITY).fraction as u32),
            argument_of_perigee: Angle::from_subfields(read(&ARGUMENT_OF_PERIGEE)),
            mean_anomaly: Angle::from_subfields(read(&MEAN_ANOMALY)),
            mean_motion: MeanMotion::from_bits(read(&MEAN_MOTION).fraction as u32),
        }
    }

    /// Every field's layout paired with its subfields, most significant field first.
    #[must_use]
    pub fn fields(&self) -> [(FieldLayout, Subfields); 9] {
        [
            (EPOCH, self.epoch.subfields()),
            (MEAN_MOTION_DERIVATIVE, self.mean_motion_derivative.subfields()),
            (DRAG_TERM, self.drag_term.subfields()),
            (INCLINATION, self.inclination.subfields()),
            (RAAN, self.raan.subfields()),
            (
                ECCENTRICITY,
                Subfields::unsigned(0, self.eccentricity.0.into()),
            ),
            (ARGUMENT_OF_PERIGEE, self.argument_of_perigee.subfields()),
            (MEAN_ANOMALY, self.mean_anomaly.subfields()),
            (
                MEAN_MOTION,
                Subfields::unsigned(0, self.mean_motion.to_bits().into()),
            ),
        ]
    }

    /// Verify every field fits in its payload bits, i.e., that encoding is lossless.
    ///
    /// # Errors
    /// [FieldError::OutOfRange] for the first field that does not fit.
    pub fn validate(&self) -> Result<(), FieldError> {
        for (layout, sub) in self.fields() {
            layout.check_width(&sub)?;
        }
        Ok(())
    }

    /// Verify every field can be written in its TLE columns.
    ///
    /// # Errors
    /// [FieldError] for the first field that cannot be written.
    pub fn check_digits(&self) -> Result<(), FieldError> {
        for (layout, sub) in self.fields() {
            layout.check_digits(&sub)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("23163.90064120", 23163, 90_064_120; "typical")]
    #[test_case("05001.00000000", 5001, 0; "zero padded year")]
    #[test_case("5001.00000001", 5001, 1; "unpadded year")]
    fn parse_epoch(text: &str, day: u32, fraction: u32) {
        let epoch: EpochDay = text.parse().unwrap();
        assert_eq!(epoch, EpochDay { day, fraction });
    }

    #[test]
    fn epoch_display_pads() {
        let epoch = EpochDay {
            day: 5001,
            fraction: 1,
        };
        assert_eq!(epoch.to_string(), "05001.00000001");
        assert_eq!(epoch.year(), 5);
        assert_eq!(epoch.day_of_year(), 1);
    }

    #[test_case("23163.9006412"; "short fraction")]
    #[test_case("23163"; "no point")]
    #[test_case("231630.90064120"; "wide day")]
    #[test_case("2316a.90064120"; "not digits")]
    fn parse_epoch_rejects(text: &str) {
        let zult = text.parse::<EpochDay>();
        assert!(
            matches!(zult, Err(FieldError::Syntax { field: Field::Epoch, .. })),
            "{zult:?}"
        );
    }

    #[test_case(".00001607", true, 0, 1607; "positive")]
    #[test_case("-.00019443", false, 1, 9443; "negative")]
    #[test_case(" .12345678", true, 1234, 5678; "space sign")]
    #[test_case("+0.00000001", true, 0, 1; "explicit plus with zero")]
    fn parse_derivative(text: &str, positive: bool, high: u16, low: u16) {
        let dv: MeanMotionDerivative = text.parse().unwrap();
        assert_eq!(
            dv,
            MeanMotionDerivative {
                positive,
                high,
                low
            }
        );
    }

    #[test]
    fn derivative_display_omits_leading_zero() {
        let dv = MeanMotionDerivative {
            positive: true,
            high: 1,
            low: 9443,
        };
        assert_eq!(dv.to_string(), ".00019443");
        let dv = MeanMotionDerivative {
            positive: false,
            ..dv
        };
        assert_eq!(dv.to_string(), "-.00019443");
        assert!((dv.value() + 0.000_194_43).abs() < 1e-12);
    }

    #[test_case("15865-3", true, 15865, 3; "positive")]
    #[test_case("-11606-4", false, 11606, 4; "negative")]
    #[test_case(" 00000-0", true, 0, 0; "padded zero")]
    #[test_case("00000+0", true, 0, 0; "zero with plus exponent")]
    fn parse_drag(text: &str, positive: bool, mantissa: u32, exponent: u8) {
        let drag: DragTerm = text.parse().unwrap();
        assert_eq!(
            drag,
            DragTerm {
                positive,
                mantissa,
                exponent
            }
        );
    }

    #[test]
    fn drag_positive_exponent_not_representable() {
        let zult = "15865+3".parse::<DragTerm>();
        assert_eq!(
            zult,
            Err(FieldError::OutOfRange {
                field: Field::DragTerm,
                value: 3,
                limit: 0
            })
        );
    }

    #[test]
    fn drag_zero_mantissa_negative() {
        let drag = DragTerm {
            positive: false,
            mantissa: 0,
            exponent: 0,
        };
        assert_eq!(drag.to_string(), "-00000-0");
        assert_eq!("-00000-0".parse::<DragTerm>().unwrap(), drag);
    }

    #[test_case("1586-3"; "short mantissa")]
    #[test_case("158650-3"; "long mantissa")]
    #[test_case("158653"; "missing exponent sign")]
    fn parse_drag_rejects(text: &str) {
        assert!(text.parse::<DragTerm>().is_err(), "{text}");
    }

    #[test_case("5.0001", 5, 1; "one digit")]
    #[test_case("98.0225", 98, 225; "two digits")]
    #[test_case("307.7835", 307, 7835; "three digits")]
    #[test_case("  51.6391", 51, 6391; "padded")]
    fn parse_angle(text: &str, degrees: u16, fraction: u16) {
        let angle = Angle::parse(Field::Inclination, text).unwrap();
        assert_eq!(angle, Angle { degrees, fraction });
        assert_eq!(angle.to_string(), text.trim());
    }

    #[test]
    fn display_honors_width() {
        let angle = Angle {
            degrees: 5,
            fraction: 1,
        };
        assert_eq!(format!("{angle:>8}"), "  5.0001");
        assert_eq!(format!("{angle:<8}|"), "5.0001  |");

        let dv = MeanMotionDerivative {
            positive: true,
            high: 1,
            low: 9443,
        };
        assert_eq!(format!("{dv:>10}"), " .00019443");

        let drag = DragTerm {
            positive: true,
            mantissa: 34804,
            exponent: 3,
        };
        assert_eq!(format!("{drag:>8}"), " 34804-3");

        let mm = MeanMotion::from_bits(0x40a0_0000);
        assert_eq!(format!("{mm:>11}"), " 5.00000000");
    }

    #[test]
    fn parse_angle_rejects() {
        assert!(Angle::parse(Field::Raan, "1000.0000").is_err());
        assert!(Angle::parse(Field::Raan, "100.000").is_err());
        assert!(Angle::parse(Field::Raan, "100").is_err());
    }

    #[test]
    fn eccentricity_notation() {
        let ecc: Eccentricity = "0009791".parse().unwrap();
        assert_eq!(ecc, Eccentricity(9791));
        assert_eq!(ecc.to_string(), "0009791");
        assert_eq!("0.0009791".parse::<Eccentricity>().unwrap(), ecc);
        assert!("009791".parse::<Eccentricity>().is_err());
    }

    #[test]
    fn mean_motion_is_single_precision() {
        let mm: MeanMotion = "14.93416279".parse().unwrap();
        assert_eq!(mm.to_bits(), 0x416e_f255);
        // nearest f32 differs in the 7th decimal
        assert_eq!(mm.to_string(), "14.93416309");

        let mm = MeanMotion::from_bits(0x4177_feab);
        assert_eq!(mm.to_string(), "15.49967480");
    }

    #[test]
    fn mean_motion_rejects_non_finite() {
        assert!(matches!(
            "inf".parse::<MeanMotion>(),
            Err(FieldError::NotFinite { .. })
        ));
        assert!(matches!(
            "abc".parse::<MeanMotion>(),
            Err(FieldError::Syntax { .. })
        ));
    }

    #[test]
    fn validate_reports_field_too_wide() {
        let mut elements = ElementSet::default();
        assert!(elements.validate().is_ok());

        elements.inclination = Angle {
            degrees: 256,
            fraction: 0,
        };
        assert_eq!(
            elements.validate(),
            Err(FieldError::OutOfRange {
                field: Field::Inclination,
                value: 256,
                limit: 255
            })
        );
    }

    #[test]
    fn check_digits_reports_unprintable() {
        let mut elements = ElementSet {
            mean_motion: MeanMotion::from(15.5),
            ..ElementSet::default()
        };
        assert!(elements.check_digits().is_ok());

        elements.eccentricity = Eccentricity(10_000_000);
        assert!(matches!(
            elements.check_digits(),
            Err(FieldError::OutOfRange {
                field: Field::Eccentricity,
                ..
            })
        ));
    }

    #[cfg(feature = "timecode")]
    #[test]
    fn epoch_to_hifitime() {
        use std::str::FromStr;
        let epoch = EpochDay {
            day: 23001,
            fraction: 50_000_000,
        };
        let expected = hifitime::Epoch::from_str("2023-01-01T12:00:00 UTC").unwrap();
        assert_eq!(epoch.to_epoch(), expected);
    }
}
