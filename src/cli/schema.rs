use schemars::schema_for;
use snafu::ResultExt;

use crate::error::{annotator_error, Result};

/// Run `diagram-annotator schema`.
///
/// Prints the JSON Schema of the category configuration file to stdout.
pub fn run() -> Result<()> {
    let schema = schema_for!(crate::config::CategoryFile);
    let json = serde_json::to_string_pretty(&schema).context(annotator_error::JsonSnafu)?;
    println!("{json}");
    Ok(())
}
