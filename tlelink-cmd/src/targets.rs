use std::{
    fs::File,
    io::{stdout, Write},
    path::Path,
};

use anyhow::{bail, Context, Result};
use handlebars::handlebars_helper;
use serde::Serialize;
use tlelink::Identity;

use crate::Format;

/// Identities of the targets the ground station tracks.
pub fn builtin() -> Vec<(&'static str, Identity)> {
    vec![
        (
            "diwata-2b",
            Identity::builder()
                .name("DIWATA-2B")
                .catalog_number(43678)
                .international_designator("18084H")
                .revolution_number(4801)
                .build(),
        ),
        (
            "iss",
            Identity::builder()
                .name("ISS (ZARYA)")
                .catalog_number(25544)
                .international_designator("98067A")
                .revolution_number(4801)
                .build(),
        ),
    ]
}

/// Look up a built-in target by name, or load an identity from a JSON file.
pub fn identity(target: &str, path: Option<&Path>) -> Result<Identity> {
    if let Some(path) = path {
        let file = File::open(path).with_context(|| format!("opening identity {path:?}"))?;
        return serde_json::from_reader(file).with_context(|| format!("parsing {path:?}"));
    }
    let target = target.to_lowercase();
    match builtin().into_iter().find(|(name, _)| *name == target) {
        Some((_, identity)) => Ok(identity),
        None => bail!("{target} is not a known target; see the targets command"),
    }
}

#[derive(Serialize)]
struct Target {
    target: &'static str,
    #[serde(flatten)]
    identity: Identity,
}

pub fn targets(format: &Format) -> Result<()> {
    let targets: Vec<Target> = builtin()
        .into_iter()
        .map(|(target, identity)| Target { target, identity })
        .collect();

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &targets).context("serializing to json")
        }
        Format::Text | Format::Tle => {
            let data = render_text(&targets).context("rendering targets")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(targets: &[Target]) -> Result<String> {
    handlebars_helper!(right_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        format!("{v:<width$}", width = num as usize)
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("rpad", Box::new(right_pad));
    hb.register_template_string("targets", TEXT_TEMPLATE)
        .context("registering template")?;

    hb.render("targets", &serde_json::json!({ "targets": targets }))
        .context("rendering text")
}

const TEXT_TEMPLATE: &str = r"Target       Name           Catalog  Designator  Elset  Rev
-------------------------------------------------------------
{{ #each targets }}{{ rpad 12 target }} {{ rpad 14 name }} {{ rpad 8 catalogNumber }} {{ rpad 11 internationalDesignator }} {{ rpad 6 elementSetNumber }} {{ revolutionNumber }}
{{/each }}";
