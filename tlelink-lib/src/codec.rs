use tracing::trace;

use crate::elements::ElementSet;
use crate::layout::LAYOUT;
use crate::Payload;

/// Unpack every field of `payload`.
///
/// Decoding never fails; every 256-bit pattern is a valid [ElementSet], although not
/// every one can be written as TLE text (see [ElementSet::check_digits]).
///
/// # Example
/// ```
/// use tlelink::{decode, Payload};
///
/// let payload: Payload = "2d225b1d5d2800124e3087f4b3318f78302c90017d3680c190ea10db4177feab"
///     .parse()
///     .unwrap();
/// let elements = decode(&payload);
/// assert_eq!(elements.epoch.to_string(), "23108.95540690");
/// assert_eq!(elements.mean_motion.to_string(), "15.49967480");
/// ```
#[must_use]
pub fn decode(payload: &Payload) -> ElementSet {
    for layout in &LAYOUT {
        trace!(
            field = %layout.field,
            raw = %format!("{:#x}", payload.bits(layout.offset, layout.width)),
            "decode"
        );
    }
    ElementSet::from_fields(|layout| layout.read(payload))
}

/// Pack every field of `elements` into a payload.
///
/// Subfield bits that do not fit their field are dropped, so the result is only a
/// faithful encoding if [ElementSet::validate] succeeds. For any payload `p`,
/// `encode(&decode(&p)) == p`.
#[must_use]
pub fn encode(elements: &ElementSet) -> Payload {
    let mut payload = Payload::default();
    for (layout, sub) in elements.fields() {
        layout.write(&mut payload, &sub);
        trace!(field = %layout.field, raw = %format!("{:#x}", layout.pack(&sub)), "encode");
    }
    payload
}
