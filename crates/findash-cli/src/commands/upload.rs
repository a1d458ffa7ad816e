//! Upload command implementations (check, upload)
//!
//! `upload` validates when the file is picked up, again on the file's current
//! metadata before any bytes are read, and once more on the bytes read.

use std::path::Path;

use anyhow::{bail, Context, Result};
use findash_core::{
    IngestionApi, UploadCandidate, UploadEvent, UploadFile, UploadPhase, UploadPolicy,
    UploadState, Verdict,
};
use tracing::debug;

pub fn cmd_check(path: &Path, media_type: Option<&str>) -> Result<()> {
    let candidate = UploadCandidate::from_path(path, media_type)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    println!();
    println!("🔎 {}", candidate.name);
    println!("   Media type: {}", candidate.declared_media_type);
    println!("   Size:       {} bytes", candidate.size_bytes);

    match UploadPolicy::new().validate(&candidate) {
        Verdict::Acceptable => {
            println!("   ✅ Ready to upload");
            Ok(())
        }
        Verdict::Rejected(violation) => {
            println!("   ❌ {}", violation.message());
            bail!("{} rejected: {}", candidate.name, violation.as_str())
        }
    }
}

pub async fn cmd_upload(api: &dyn IngestionApi, path: &Path, media_type: Option<&str>) -> Result<()> {
    let state = select_upload(path, media_type)?;
    let state = submit_upload(api, state, path).await?;
    debug!(phase = ?state.phase, "Upload finished");
    Ok(())
}

/// First validation, on the file as picked
pub fn select_upload(path: &Path, media_type: Option<&str>) -> Result<UploadState> {
    let selected = UploadCandidate::from_path(path, media_type)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let state = UploadState::new().apply(UploadEvent::Selected(selected));
    if let UploadPhase::Rejected(violation) = state.phase {
        println!("❌ {}", violation.message());
        bail!("upload rejected: {}", violation.as_str());
    }
    Ok(state)
}

/// Second validation against the file as it is now, then submission
pub async fn submit_upload(
    api: &dyn IngestionApi,
    state: UploadState,
    path: &Path,
) -> Result<UploadState> {
    let selected = state.selected().cloned().context("No file selected")?;

    // Metadata only; nothing is read until the current size passes
    let current = UploadCandidate::from_path(path, Some(&selected.declared_media_type))
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let state = state.apply(UploadEvent::SubmitRequested(current));
    if let UploadPhase::Rejected(violation) = state.phase {
        println!("❌ {}", violation.message());
        bail!("upload rejected: {}", violation.as_str());
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file = UploadFile::new(selected.name, selected.declared_media_type, bytes);

    // The file may still have changed between the size check and the read
    if let Verdict::Rejected(violation) = UploadPolicy::new().validate(&file.candidate()) {
        println!("❌ {}", violation.message());
        bail!("upload rejected: {}", violation.as_str());
    }

    println!("📤 Uploading {} ({} bytes)...", file.name, file.bytes.len());

    match api.upload(file).await {
        Ok(result) => {
            debug!(result = %result.0, "Ingestion result");
            let state = state.apply(UploadEvent::SubmitSucceeded);
            println!("✅ {}", state.message.as_deref().unwrap_or_default());
            if !result.0.is_null() {
                println!("{}", serde_json::to_string_pretty(&result.0)?);
            }
            Ok(state)
        }
        Err(e) => {
            let state = state.apply(UploadEvent::SubmitFailed);
            println!("❌ {}", state.message.as_deref().unwrap_or_default());
            Err(e).context("Ingestion backend rejected the upload")
        }
    }
}
