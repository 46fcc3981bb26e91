//! QC-Archive-Audit: offline inspector for a Finality Archive file store.
//!
//! Opens the archive without a checkpoint interval, so no command writes to
//! the store.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qc_18_finality_archive::{
    ArchiveConfig, ArchiveDependencies, CheckpointId, FileBackedKVStore, FinalityArchiveApi,
    FinalityArchiveService, Sha256ContentHasher,
};

type Archive = FinalityArchiveService<FileBackedKVStore>;

/// QC-Archive-Audit: Finality Archive inspector
#[derive(Parser, Debug)]
#[command(name = "qc-archive-audit")]
#[command(about = "Verify, inspect and export a Quantum-Chain finality archive")]
struct Args {
    /// Archive snapshot file written by the file-backed store
    #[arg(short, long, default_value = "finality-archive.db")]
    path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Re-verify every segment and manifest; exits non-zero on damage
    Audit,
    /// Print the index entry of a segment
    Locate { segment_id: u64 },
    /// List sealed checkpoint manifests
    Checkpoints,
    /// Replay a checkpoint and check its segments root
    Replay { checkpoint_id: u64 },
    /// Write the verified payload of a segment to a file
    Export { segment_id: u64, output: PathBuf },
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let archive = open_archive(&args.path)?;
    run(&archive, args.command, &mut io::stdout().lock())
}

/// `QC_LOG_LEVEL` wins over `RUST_LOG`; default `warn` keeps stdout clean.
fn init_logging() {
    let filter = std::env::var("QC_LOG_LEVEL")
        .ok()
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_archive(path: &Path) -> Result<Archive> {
    if !path.exists() {
        bail!("no archive at {}", path.display());
    }
    let kv_store = FileBackedKVStore::open(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    FinalityArchiveService::open(
        ArchiveDependencies {
            kv_store,
            hasher: Sha256ContentHasher,
        },
        ArchiveConfig::default(),
    )
    .context("archive state is damaged")
}

fn run<W: Write>(archive: &Archive, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Audit => {
            let report = archive.audit()?;
            writeln!(
                out,
                "segments: {} checked, range {:?}..={:?}",
                report.segments_checked, report.lowest_segment, report.highest_segment
            )?;
            writeln!(out, "manifests: {} checked", report.manifests_checked)?;
            for finding in &report.corrupted {
                writeln!(out, "CORRUPT segment {}: {}", finding.segment_id, finding.reason)?;
            }
            for fault in &report.manifest_faults {
                writeln!(out, "FAULT checkpoint {}: {}", fault.checkpoint_id, fault.reason)?;
            }
            if !report.orphaned.is_empty() {
                writeln!(out, "orphaned envelopes: {:?}", report.orphaned)?;
            }
            writeln!(out, "finished in {} ms", report.duration_ms)?;

            if !report.is_clean() {
                bail!(
                    "{} corrupted segment(s), {} manifest fault(s)",
                    report.corrupted.len(),
                    report.manifest_faults.len()
                );
            }
        }
        Command::Locate { segment_id } => {
            let Some(location) = archive.locate(segment_id) else {
                bail!("segment {} is not indexed", segment_id);
            };
            writeln!(out, "segment:   {}", location.segment_id)?;
            writeln!(out, "key:       {}", hex::encode(&location.key))?;
            writeln!(out, "envelope:  {} bytes", location.envelope_len)?;
            writeln!(out, "transform: {:?}", location.transform)?;
            writeln!(out, "checksum:  {}", hex::encode(location.checksum))?;
            writeln!(out, "digest:    {}", hex::encode(location.envelope_digest))?;
        }
        Command::Checkpoints => {
            let manifests = archive.checkpoints();
            if manifests.is_empty() {
                writeln!(out, "no checkpoints sealed")?;
            }
            for manifest in manifests {
                writeln!(
                    out,
                    "{} {} segments={} root={} hash={}",
                    manifest.id,
                    manifest.range,
                    manifest.segment_count,
                    hex::encode(manifest.segments_root),
                    hex::encode(manifest.manifest_hash)
                )?;
            }
        }
        Command::Replay { checkpoint_id } => {
            let id = CheckpointId::new(checkpoint_id);
            let segments = archive.replay_checkpoint(id)?;
            let bytes: usize = segments.iter().map(|(_, payload)| payload.len()).sum();
            writeln!(
                out,
                "checkpoint {} verified: {} segments, {} payload bytes",
                id,
                segments.len(),
                bytes
            )?;
        }
        Command::Export { segment_id, output } => {
            let payload = archive.retrieve_segment(segment_id)?;
            std::fs::write(&output, &payload)
                .with_context(|| format!("failed to write {}", output.display()))?;
            writeln!(
                out,
                "segment {} → {} ({} bytes)",
                segment_id,
                output.display(),
                payload.len()
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_18_finality_archive::{CompressionParams, KeyValueStore, Namespace};

    fn seeded_archive(dir: &Path) -> PathBuf {
        let path = dir.join("archive.db");
        let archive = FinalityArchiveService::open(
            ArchiveDependencies {
                kv_store: FileBackedKVStore::open(&path).unwrap(),
                hasher: Sha256ContentHasher,
            },
            ArchiveConfig::default().with_checkpoint_interval(2),
        )
        .unwrap();
        for id in 1..=4u64 {
            archive
                .archive_segment(id, format!("segment-{}", id).as_bytes(), &CompressionParams::default())
                .unwrap();
        }
        path
    }

    fn run_to_string(archive: &Archive, command: Command) -> Result<String> {
        let mut out = Vec::new();
        run(archive, command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_subcommands() {
        let args = Args::try_parse_from(["qc-archive-audit", "-p", "a.db", "locate", "7"]).unwrap();
        assert_eq!(args.path, PathBuf::from("a.db"));
        assert_eq!(args.command, Command::Locate { segment_id: 7 });

        assert!(Args::try_parse_from(["qc-archive-audit", "locate", "seven"]).is_err());
    }

    #[test]
    fn test_audit_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = open_archive(&seeded_archive(dir.path())).unwrap();

        let audit = run_to_string(&archive, Command::Audit).unwrap();
        assert!(audit.contains("segments: 4 checked"));

        let listing = run_to_string(&archive, Command::Checkpoints).unwrap();
        assert_eq!(listing.lines().count(), 2);
        assert!(listing.starts_with("#1 [1, 2]"));

        let replay = run_to_string(&archive, Command::Replay { checkpoint_id: 2 }).unwrap();
        assert!(replay.contains("2 segments"));
        assert!(run_to_string(&archive, Command::Replay { checkpoint_id: 9 }).is_err());
    }

    #[test]
    fn test_export_writes_verified_payload() {
        let dir = tempfile::tempdir().unwrap();
        let archive = open_archive(&seeded_archive(dir.path())).unwrap();
        let output = dir.path().join("segment-3.bin");

        run_to_string(
            &archive,
            Command::Export {
                segment_id: 3,
                output: output.clone(),
            },
        )
        .unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"segment-3");

        assert!(run_to_string(&archive, Command::Locate { segment_id: 5 }).is_err());
    }

    #[test]
    fn test_audit_fails_on_damage() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded_archive(dir.path());
        {
            let store = FileBackedKVStore::open(&path).unwrap();
            let key = 2u64.to_be_bytes();
            let mut envelope = store.get(Namespace::FinalityArchive, &key).unwrap().unwrap();
            envelope[0] ^= 0x80;
            store.put(Namespace::FinalityArchive, &key, &envelope).unwrap();
        }

        let archive = open_archive(&path).unwrap();
        let mut out = Vec::new();
        assert!(run(&archive, Command::Audit, &mut out).is_err());
        assert!(String::from_utf8(out).unwrap().contains("CORRUPT segment 2"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_archive(&dir.path().join("absent.db")).is_err());
    }
}
