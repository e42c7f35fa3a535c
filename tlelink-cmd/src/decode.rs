use std::{
    fs::File,
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use handlebars::handlebars_helper;
use serde::Serialize;
use tlelink::{
    deescape, deescape_capture,
    layout::{Field, LAYOUT},
    ElementSet, Identity, LinkOpts, Payload, TleRecord,
};
use tracing::{debug, info};

use crate::Format;

/// Where the element set payload comes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Hex text of a captured link frame
    Capture(String),
    /// Hex text of a bare payload
    Payload(String),
    /// File of raw captured link frame bytes
    Input(PathBuf),
}

pub fn payload(source: &Source) -> Result<Payload> {
    let payload = match source {
        Source::Capture(text) => deescape(text).context("de-escaping capture")?,
        Source::Payload(text) => text.parse::<Payload>().context("parsing payload")?,
        Source::Input(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("reading {path:?}"))?;
            debug!("read {} bytes from {path:?}", bytes.len());
            deescape_capture(&bytes, &LinkOpts::default())
                .with_context(|| format!("de-escaping {path:?}"))?
        }
    };
    debug!("payload {payload}");
    Ok(payload)
}

#[derive(Debug, Clone, Serialize)]
struct FieldRow {
    name: String,
    bits: String,
    raw: String,
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Decoded {
    payload: String,
    record: TleRecord,
    lines: [String; 2],
    #[serde(skip)]
    fields: Vec<FieldRow>,
}

fn field_text(elements: &ElementSet, field: Field) -> String {
    match field {
        Field::Epoch => elements.epoch.to_string(),
        Field::MeanMotionDerivative => elements.mean_motion_derivative.to_string(),
        Field::DragTerm => elements.drag_term.to_string(),
        Field::Inclination => elements.inclination.to_string(),
        Field::Raan => elements.raan.to_string(),
        Field::Eccentricity => elements.eccentricity.to_string(),
        Field::ArgumentOfPerigee => elements.argument_of_perigee.to_string(),
        Field::MeanAnomaly => elements.mean_anomaly.to_string(),
        Field::MeanMotion => elements.mean_motion.to_string(),
    }
}

fn summarize(payload: &Payload, identity: Identity) -> Result<Decoded> {
    let record = TleRecord::new(identity, tlelink::decode(payload));
    let lines = record.lines().context("formatting element lines")?;
    let fields = LAYOUT
        .iter()
        .map(|layout| FieldRow {
            name: layout.field.to_string(),
            bits: format!("{}-{}", layout.offset, layout.offset + layout.width - 1),
            raw: format!("{:#x}", payload.bits(layout.offset, layout.width)),
            text: field_text(&record.elements, layout.field),
        })
        .collect();

    Ok(Decoded {
        payload: payload.to_string(),
        record,
        lines,
        fields,
    })
}

pub fn decode(
    source: &Source,
    identity: Identity,
    format: &Format,
    output: Option<&Path>,
) -> Result<()> {
    let payload = payload(source)?;
    let decoded = summarize(&payload, identity)?;

    let mut dest: Box<dyn Write> = match output {
        Some(path) => {
            info!("writing {path:?}");
            Box::new(File::create(path).with_context(|| format!("failed to create {path:?}"))?)
        }
        None => Box::new(stdout()),
    };

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut dest, &decoded).context("serializing to json")?;
            writeln!(dest).context("writing output")
        }
        Format::Tle => decoded.record.write(dest).context("writing element set"),
        Format::Text => {
            let data = render_text(&decoded).context("rendering decoded payload")?;
            dest.write_all(data.as_bytes()).context("writing output")
        }
    }
}

fn render_text(decoded: &Decoded) -> Result<String> {
    handlebars_helper!(right_pad: |num: u64, v: str| {
        format!("{v:<width$}", width = num as usize)
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("rpad", Box::new(right_pad));
    hb.register_template_string("decoded", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render(
        "decoded",
        &serde_json::json!({
            "payload": decoded.payload,
            "name": decoded.record.identity.name,
            "lines": decoded.lines,
            "fields": decoded.fields,
        }),
    )
    .context("rendering text")
}

const TEXT_TEMPLATE: &str = r"Payload: {{ payload }}
-------------------------------------------------------------------------------
Field                                   Bits     Raw              Value
-------------------------------------------------------------------------------
{{ #each fields }}{{ rpad 39 name }} {{ rpad 8 bits }} {{ rpad 16 raw }} {{ text }}
{{/each }}-------------------------------------------------------------------------------
{{ name }}
{{ #each lines }}{{ this }}
{{/each }}";
