//! Bit layout of the 256-bit element payload.
//!
//! Every field occupies a fixed, contiguous range of payload bits and is split into
//! up to three subfields: a polarity flag, a whole part and a fractional part. The
//! [LAYOUT] table is the single description of where each field lives and how its
//! subfields are packed; the codec and the validation code are driven from it.
//!
//! | Field                  | Bits    | Width | Encoding                                    |
//! |------------------------|---------|-------|---------------------------------------------|
//! | epoch                  | 212-255 | 44    | 17-bit whole, 27-bit fraction (8 digits)    |
//! | mean motion derivative | 180-211 | 32    | flag, 15-bit group, 16-bit group (4+4 digits)|
//! | drag term              | 156-179 | 24    | 20-bit mantissa, flag, 3-bit exponent       |
//! | inclination            | 132-155 | 24    | 8-bit whole, 16-bit fraction (4 digits)     |
//! | right ascension        | 108-131 | 24    | 9-bit whole, 15-bit fraction (4 digits)     |
//! | eccentricity           | 84-107  | 24    | 7 digit fraction, implied point             |
//! | argument of perigee    | 60-83   | 24    | 9-bit whole, 15-bit fraction (4 digits)     |
//! | mean anomaly           | 32-59   | 28    | 12-bit whole, 16-bit fraction (4 digits)    |
//! | mean motion            | 0-31    | 32    | IEEE-754 single precision bit pattern       |
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::Payload;

/// The nine orbital element fields carried in a [Payload].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Field {
    Epoch,
    MeanMotionDerivative,
    DragTerm,
    Inclination,
    Raan,
    Eccentricity,
    ArgumentOfPerigee,
    MeanAnomaly,
    MeanMotion,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Epoch => "epoch",
            Field::MeanMotionDerivative => "mean motion derivative",
            Field::DragTerm => "drag term",
            Field::Inclination => "inclination",
            Field::Raan => "right ascension of the ascending node",
            Field::Eccentricity => "eccentricity",
            Field::ArgumentOfPerigee => "argument of perigee",
            Field::MeanAnomaly => "mean anomaly",
            Field::MeanMotion => "mean motion",
        };
        f.write_str(name)
    }
}

/// How the bits of a field map to its subfields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Whole part in the bits above `frac_bits`, decimal fraction of `digits` digits in
    /// the low `frac_bits` bits.
    FixedPoint {
        frac_bits: u32,
        whole_digits: u32,
        digits: u32,
    },
    /// Polarity flag in the top bit (set is positive) followed by two decimal groups of
    /// `digits` digits each. The low group occupies the low `group_bits` bits.
    SignedFixedPoint { group_bits: u32, digits: u32 },
    /// Mantissa of `digits` digits above a polarity flag bit (set is positive), exponent
    /// magnitude in the low `exponent_bits` bits.
    Exponential { exponent_bits: u32, digits: u32 },
    /// The whole field is a decimal fraction of `digits` digits with an implied leading
    /// decimal point.
    Fraction { digits: u32 },
    /// IEEE-754 single-precision bit pattern, printed with `digits` fractional digits.
    Float32 { digits: u32 },
}

/// The subfields of a single field.
///
/// For [Encoding::Exponential] `whole` is the mantissa and `fraction` the exponent
/// magnitude; for [Encoding::Fraction] and [Encoding::Float32] everything is in
/// `fraction`. Fields without a polarity flag are always `positive`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subfields {
    pub positive: bool,
    pub whole: u64,
    pub fraction: u64,
}

impl Subfields {
    #[must_use]
    pub fn unsigned(whole: u64, fraction: u64) -> Self {
        Subfields {
            positive: true,
            whole,
            fraction,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Geometry {
    whole_shift: u32,
    whole_bits: u32,
    fraction_bits: u32,
    flag: Option<u32>,
}

/// Location and encoding of a single field within a [Payload].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub field: Field,
    /// Bit number of the least significant bit, where bit 0 is the least significant
    /// bit of the payload.
    pub offset: u32,
    /// Width in bits
    pub width: u32,
    pub encoding: Encoding,
}

pub const EPOCH: FieldLayout = FieldLayout {
    field: Field::Epoch,
    offset: 212,
    width: 44,
    encoding: Encoding::FixedPoint {
        frac_bits: 27,
        whole_digits: 5,
        digits: 8,
    },
};

pub const MEAN_MOTION_DERIVATIVE: FieldLayout = FieldLayout {
    field: Field::MeanMotionDerivative,
    offset: 180,
    width: 32,
    encoding: Encoding::SignedFixedPoint {
        group_bits: 16,
        digits: 4,
    },
};

pub const DRAG_TERM: FieldLayout = FieldLayout {
    field: Field::DragTerm,
    offset: 156,
    width: 24,
    encoding: Encoding::Exponential {
        exponent_bits: 3,
        digits: 5,
    },
};

pub const INCLINATION: FieldLayout = FieldLayout {
    field: Field::Inclination,
    offset: 132,
    width: 24,
    encoding: Encoding::FixedPoint {
        frac_bits: 16,
        whole_digits: 3,
        digits: 4,
    },
};

pub const RAAN: FieldLayout = FieldLayout {
    field: Field::Raan,
    offset: 108,
    width: 24,
    encoding: Encoding::FixedPoint {
        frac_bits: 15,
        whole_digits: 3,
        digits: 4,
    },
};

pub const ECCENTRICITY: FieldLayout = FieldLayout {
    field: Field::Eccentricity,
    offset: 84,
    width: 24,
    encoding: Encoding::Fraction { digits: 7 },
};

pub const ARGUMENT_OF_PERIGEE: FieldLayout = FieldLayout {
    field: Field::ArgumentOfPerigee,
    offset: 60,
    width: 24,
    encoding: Encoding::FixedPoint {
        frac_bits: 15,
        whole_digits: 3,
        digits: 4,
    },
};

pub const MEAN_ANOMALY: FieldLayout = FieldLayout {
    field: Field::MeanAnomaly,
    offset: 32,
    width: 28,
    encoding: Encoding::FixedPoint {
        frac_bits: 16,
        whole_digits: 3,
        digits: 4,
    },
};

pub const MEAN_MOTION: FieldLayout = FieldLayout {
    field: Field::MeanMotion,
    offset: 0,
    width: 32,
    encoding: Encoding::Float32 { digits: 8 },
};

/// All fields, most significant first. Indexed by `Field as usize`.
pub const LAYOUT: [FieldLayout; 9] = [
    EPOCH,
    MEAN_MOTION_DERIVATIVE,
    DRAG_TERM,
    INCLINATION,
    RAAN,
    ECCENTRICITY,
    ARGUMENT_OF_PERIGEE,
    MEAN_ANOMALY,
    MEAN_MOTION,
];

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

fn decimal_limit(digits: u32) -> u64 {
    10u64.pow(digits) - 1
}

impl FieldLayout {
    #[must_use]
    pub fn of(field: Field) -> &'static FieldLayout {
        &LAYOUT[field as usize]
    }

    fn geometry(&self) -> Geometry {
        match self.encoding {
            Encoding::FixedPoint { frac_bits, .. } => Geometry {
                whole_shift: frac_bits,
                whole_bits: self.width - frac_bits,
                fraction_bits: frac_bits,
                flag: None,
            },
            Encoding::SignedFixedPoint { group_bits, .. } => Geometry {
                whole_shift: group_bits,
                whole_bits: self.width - 1 - group_bits,
                fraction_bits: group_bits,
                flag: Some(self.width - 1),
            },
            Encoding::Exponential { exponent_bits, .. } => Geometry {
                whole_shift: exponent_bits + 1,
                whole_bits: self.width - 1 - exponent_bits,
                fraction_bits: exponent_bits,
                flag: Some(exponent_bits),
            },
            Encoding::Fraction { .. } | Encoding::Float32 { .. } => Geometry {
                whole_shift: self.width,
                whole_bits: 0,
                fraction_bits: self.width,
                flag: None,
            },
        }
    }

    /// Split the raw field bits into subfields.
    #[must_use]
    pub fn unpack(&self, raw: u64) -> Subfields {
        let geom = self.geometry();
        let whole = if geom.whole_bits == 0 {
            0
        } else {
            (raw >> geom.whole_shift) & mask(geom.whole_bits)
        };
        Subfields {
            positive: geom.flag.map_or(true, |bit| (raw >> bit) & 0x1 == 1),
            whole,
            fraction: raw & mask(geom.fraction_bits),
        }
    }

    /// Join subfields into raw field bits. Subfield bits that do not fit are dropped;
    /// use [FieldLayout::check_width] first to detect that.
    #[must_use]
    pub fn pack(&self, subfields: &Subfields) -> u64 {
        let geom = self.geometry();
        let mut raw = subfields.fraction & mask(geom.fraction_bits);
        if geom.whole_bits > 0 {
            raw |= (subfields.whole & mask(geom.whole_bits)) << geom.whole_shift;
        }
        if let Some(bit) = geom.flag {
            if subfields.positive {
                raw |= 1 << bit;
            }
        }
        raw
    }

    #[must_use]
    pub fn read(&self, payload: &Payload) -> Subfields {
        self.unpack(payload.bits(self.offset, self.width))
    }

    pub fn write(&self, payload: &mut Payload, subfields: &Subfields) {
        payload.set_bits(self.offset, self.width, self.pack(subfields));
    }

    /// Verify the subfields fit in this field's bits.
    ///
    /// # Errors
    /// [FieldError::OutOfRange] naming the first subfield that does not fit.
    pub fn check_width(&self, subfields: &Subfields) -> Result<(), FieldError> {
        let geom = self.geometry();
        self.check_limit(subfields.whole, mask(geom.whole_bits))?;
        self.check_limit(subfields.fraction, mask(geom.fraction_bits))
    }

    /// Verify the subfields can be written in this field's TLE columns.
    ///
    /// # Errors
    /// [FieldError::OutOfRange] if a subfield has more decimal digits than its columns
    /// allow, or [FieldError::NotFinite] for a mean motion that is not a number.
    pub fn check_digits(&self, subfields: &Subfields) -> Result<(), FieldError> {
        match self.encoding {
            Encoding::FixedPoint {
                whole_digits,
                digits,
                ..
            } => {
                self.check_limit(subfields.whole, decimal_limit(whole_digits))?;
                self.check_limit(subfields.fraction, decimal_limit(digits))
            }
            Encoding::SignedFixedPoint { digits, .. } => {
                self.check_limit(subfields.whole, decimal_limit(digits))?;
                self.check_limit(subfields.fraction, decimal_limit(digits))
            }
            Encoding::Exponential { digits, .. } => {
                self.check_limit(subfields.whole, decimal_limit(digits))?;
                self.check_limit(subfields.fraction, decimal_limit(1))
            }
            Encoding::Fraction { digits } => {
                self.check_limit(subfields.fraction, decimal_limit(digits))
            }
            Encoding::Float32 { digits } => {
                // fraction holds the bit pattern; it always fits u32 once width-checked
                let value = f32::from_bits((subfields.fraction & mask(32)) as u32);
                if !value.is_finite() {
                    return Err(FieldError::NotFinite { field: self.field });
                }
                let text = format!("{value:.prec$}", prec = digits as usize);
                let whole = text.split('.').next().unwrap_or_default();
                if value < 0.0 || whole.len() > 2 {
                    return Err(FieldError::OutOfRange {
                        field: self.field,
                        value: value.abs().trunc() as u64,
                        limit: decimal_limit(2),
                    });
                }
                Ok(())
            }
        }
    }

    fn check_limit(&self, value: u64, limit: u64) -> Result<(), FieldError> {
        if value > limit {
            return Err(FieldError::OutOfRange {
                field: self.field,
                value,
                limit,
            });
        }
        Ok(())
    }
}
