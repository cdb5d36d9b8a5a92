//! Classify a configuration entry without resolving it

use crate::cli::CheckArgs;
use anyhow::Result;
use fafnir_core::SecretReference;

pub fn run(args: CheckArgs) -> Result<()> {
    match SecretReference::parse(&args.entry)? {
        Some(reference) => {
            println!("reference vault={} key={}", reference.vault(), reference.key());
        }
        None => {
            println!("verbatim");
        }
    }
    Ok(())
}
