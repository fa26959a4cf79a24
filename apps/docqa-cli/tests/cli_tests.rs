use std::fs;

use clap::Parser;
use tempfile::TempDir;

use docqa_cli::{run, Cli};
use docqa_core::config::Settings;

fn run_cli(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    run(&cli, &Settings::default(), &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn index_then_query_with_citations() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("handbook.txt");
    let index = tmp.path().join("handbook.dqix");
    fs::write(
        &source,
        "The handbook covers vacation policy and benefits.\n\
         Holidays include Nowruz and other national days.\n\
         Employees may request leave via the HR portal.\n",
    )
    .unwrap();
    let (source, index) = (source.to_str().unwrap(), index.to_str().unwrap());

    let indexed = run_cli(&[
        "docqa", "index", "--source", source, "--out", index, "--chunk-size", "8", "--overlap", "2", "--verbose",
    ])
    .expect("index");
    assert!(indexed.contains("[docqa][index] chunks=3"), "{indexed}");
    assert!(indexed.contains("Indexed 3 chunks"));

    let answered = run_cli(&[
        "docqa", "query", "--index", index, "--question", "What are the holidays?", "--top-k", "2", "--synthesize",
        "--citations", "inline", "--print-prompt",
    ])
    .expect("query");
    assert!(answered.contains("  #1 [chunk:1 score:"), "{answered}");
    assert!(answered.contains("Offline summary for: What are the holidays?"));
    assert!(answered.contains("Cite sources inline"));
}

#[test]
fn query_rejects_wrong_language() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("a.txt");
    let index = tmp.path().join("a.dqix");
    fs::write(&source, "Short text about cats.").unwrap();
    let (source, index) = (source.to_str().unwrap(), index.to_str().unwrap());

    run_cli(&["docqa", "index", "--source", source, "--out", index, "--lang", "en"]).unwrap();
    let err = run_cli(&["docqa", "query", "--index", index, "-q", "cats", "--lang", "fa"]).unwrap_err();
    assert!(format!("{err:#}").contains("index config mismatch"), "{err:#}");
}

#[test]
fn chunk_size_without_overlap_uses_derived_overlap() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("notes.txt");
    let index = tmp.path().join("notes.dqix");
    fs::write(&source, "Water the garden at dawn. Check the seed stock weekly.").unwrap();

    let indexed = run_cli(&[
        "docqa",
        "index",
        "--source",
        source.to_str().unwrap(),
        "--out",
        index.to_str().unwrap(),
        "--chunk-size",
        "50",
        "--verbose",
    ])
    .expect("index");
    assert!(indexed.contains("chunk=50/10"), "{indexed}");
    assert!(indexed.contains("Indexed 1 chunks"));
}

#[test]
fn bad_flags_are_rejected() {
    assert!(Cli::try_parse_from(["docqa", "index", "--source", "a.txt"]).is_err(), "--out is required");
    assert!(Cli::try_parse_from(["docqa", "index", "--source", "a", "--out", "b", "--lang", "de"]).is_err());
    assert!(Cli::try_parse_from(["docqa", "query", "--index", "i", "-q", "x", "--citations", "footnotes"]).is_err());
}

#[test]
fn empty_source_reports_error() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("blank.txt");
    fs::write(&source, "   \n").unwrap();
    let out = tmp.path().join("blank.dqix");
    let err = run_cli(&["docqa", "index", "--source", source.to_str().unwrap(), "--out", out.to_str().unwrap()])
        .unwrap_err();
    assert!(format!("{err:#}").contains("is empty"), "{err:#}");
    assert!(!out.exists());
}
