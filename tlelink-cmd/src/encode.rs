use std::{
    fs::File,
    io::{stdin, stdout, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Serialize;
use tlelink::{encode, uplink_commands, CommandWord, Payload, TleRecord};
use tracing::debug;

use crate::Format;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Encoded {
    record: TleRecord,
    payload: String,
    uplink: Vec<String>,
    downlink_request: String,
}

fn read_record(input: &Path) -> Result<TleRecord> {
    let reader: Box<dyn Read> = if input == Path::new("-") {
        Box::new(stdin())
    } else {
        Box::new(File::open(input).with_context(|| format!("opening {input:?}"))?)
    };
    TleRecord::read(reader).with_context(|| format!("reading element set from {input:?}"))
}

fn prepare(record: TleRecord) -> Result<Encoded> {
    record
        .elements
        .validate()
        .context("element set cannot be encoded")?;
    let payload = encode(&record.elements);
    debug!("encoded {} to {payload}", record.identity.name);

    debug!(
        "mean motion reads back as {}",
        tlelink::decode(&payload).mean_motion
    );

    Ok(Encoded {
        record,
        payload: payload.to_string(),
        uplink: uplink_commands(&payload)
            .iter()
            .map(ToString::to_string)
            .collect(),
        downlink_request: CommandWord::downlink_request().to_string(),
    })
}

fn render_text(encoded: &Encoded) -> String {
    let mut text = format!("Payload:  {}\nUplink:\n", encoded.payload);
    for cmd in &encoded.uplink {
        text.push_str(&format!("  {cmd}\n"));
    }
    text.push_str(&format!("Downlink: {}\n", encoded.downlink_request));
    text
}

pub fn encode_record(input: &Path, format: &Format) -> Result<()> {
    let encoded = prepare(read_record(input)?)?;
    let mut dest = stdout();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut dest, &encoded).context("serializing to json")?;
            writeln!(dest).context("writing to stdout")
        }
        Format::Tle => {
            // the element set as it will read back from the spacecraft
            let payload = encoded.payload.parse::<Payload>().context("parsing payload")?;
            let readback = TleRecord::new(encoded.record.identity, tlelink::decode(&payload));
            readback.write(dest).context("writing element set")
        }
        Format::Text => dest
            .write_all(render_text(&encoded).as_bytes())
            .context("writing to stdout"),
    }
}
