//! Placeholder command - write the "NO DATA" tile as PNG.

use std::path::Path;

use tilecache::placeholder::{encode_png, render_placeholder};

use super::common::write_file;
use crate::error::CliError;

/// Run the placeholder command.
pub fn run(output: &Path) -> Result<(), CliError> {
    let png = encode_png(&render_placeholder()).map_err(|e| CliError::Encode(e.to_string()))?;
    write_file(output, &png)?;
    println!("Wrote placeholder tile to {}", output.display());
    Ok(())
}
