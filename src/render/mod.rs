//! Placeholder extraction and filling facade.

pub mod engine;
pub mod parser;

use crate::util;
use anyhow::{Context, Result};
use std::{
    io::{self, Write},
    path::Path,
};

/// Write a filled template to `out`, or to stdout when no path is given.
pub fn write_output(out: Option<&Path>, rendered: &str) -> Result<()> {
    match out {
        Some(path) => util::write_atomic(path, rendered),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .context("write to stdout")
        }
    }
}
