// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `busline rule <criteria>` - Print the wire text of a match rule

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RuleArgs {
    /// JSON file holding the criteria object
    pub criteria: PathBuf,
}

pub fn rule(args: RuleArgs) -> Result<()> {
    let criteria = super::read_json(&args.criteria)?;
    let rule = busline_core::rule::build(&criteria)?;
    tracing::debug!(
        filters = rule.filters().len(),
        wildcard = rule.is_wildcard(),
        "rule built"
    );
    println!("{}", rule.to_wire());
    Ok(())
}
