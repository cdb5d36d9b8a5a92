//! Resolve a configuration entry through the standard chain

use crate::cli::ResolveArgs;
use anyhow::Result;
use fafnir_resolver::SecretResolver;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub async fn run(args: ResolveArgs) -> Result<()> {
    let resolver = SecretResolver::new();

    let cancel = CancellationToken::new();
    if let Some(secs) = args.timeout {
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            trigger.cancel();
        });
    }

    let secret = resolver.resolve_text_with_cancel(&args.entry, cancel).await?;
    debug!(provenance = %secret, "entry resolved");

    if args.provenance {
        // Display is redaction-safe: key, source and identity only
        eprintln!("{}", secret);
    }
    println!("{}", secret.value());

    Ok(())
}
