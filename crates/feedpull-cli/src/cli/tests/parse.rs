//! Tests for subcommand argument parsing.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_download() {
    match parse(&[
        "feedpull",
        "download",
        "--feed-type",
        "CURATED_ITEM_FEED",
        "--category",
        "15032",
        "--marketplace",
        "EBAY_US",
    ]) {
        CliCommand::Download {
            feed_type,
            category,
            marketplace,
            output,
        } => {
            assert_eq!(feed_type, "CURATED_ITEM_FEED");
            assert_eq!(category, "15032");
            assert_eq!(marketplace.as_deref(), Some("EBAY_US"));
            assert_eq!(output, Path::new("feed.gz"));
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_custom_output() {
    match parse(&[
        "feedpull",
        "download",
        "--feed-type",
        "t",
        "--category",
        "1",
        "-o",
        "/tmp/archive.gz",
    ]) {
        CliCommand::Download {
            marketplace, output, ..
        } => {
            assert!(marketplace.is_none());
            assert_eq!(output, Path::new("/tmp/archive.gz"));
        }
        _ => panic!("expected Download with -o"),
    }
}

#[test]
fn cli_parse_filter_item() {
    match parse(&[
        "feedpull",
        "filter-item",
        "--feed-type",
        "t",
        "--category",
        "1",
        "--item-id",
        "v1|100|0",
        "--work-dir",
        "/tmp/work",
    ]) {
        CliCommand::FilterItem {
            item_id, work_dir, ..
        } => {
            assert_eq!(item_id, "v1|100|0");
            assert_eq!(work_dir, Path::new("/tmp/work"));
        }
        _ => panic!("expected FilterItem"),
    }
}

#[test]
fn cli_parse_filter_items_repeats_flag() {
    match parse(&[
        "feedpull",
        "filter-items",
        "--feed-type",
        "t",
        "--category",
        "1",
        "--item-id",
        "a",
        "--item-id",
        "b",
    ]) {
        CliCommand::FilterItems {
            item_ids, work_dir, ..
        } => {
            assert_eq!(item_ids, vec!["a".to_string(), "b".to_string()]);
            assert_eq!(work_dir, Path::new("."));
        }
        _ => panic!("expected FilterItems"),
    }
}

#[test]
fn cli_parse_filter_items_requires_at_least_one_id() {
    let result = Cli::try_parse_from([
        "feedpull",
        "filter-items",
        "--feed-type",
        "t",
        "--category",
        "1",
    ]);
    assert!(result.is_err());
}

#[test]
fn cli_parse_filter_seller() {
    match parse(&[
        "feedpull",
        "filter-seller",
        "--feed-type",
        "t",
        "--category",
        "1",
        "--seller",
        "some_seller",
    ]) {
        CliCommand::FilterSeller { seller, .. } => assert_eq!(seller, "some_seller"),
        _ => panic!("expected FilterSeller"),
    }
}

#[test]
fn cli_parse_feed_types_and_files() {
    match parse(&["feedpull", "feed-types"]) {
        CliCommand::FeedTypes { marketplace } => assert!(marketplace.is_none()),
        _ => panic!("expected FeedTypes"),
    }
    match parse(&[
        "feedpull",
        "files",
        "--feed-type",
        "t",
        "--category",
        "1",
        "--marketplace",
        "EBAY_DE",
    ]) {
        CliCommand::Files { marketplace, .. } => {
            assert_eq!(marketplace.as_deref(), Some("EBAY_DE"));
        }
        _ => panic!("expected Files"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["feedpull", "checksum", "feed.gz"]) {
        CliCommand::Checksum { path } => assert_eq!(path, Path::new("feed.gz")),
        _ => panic!("expected Checksum"),
    }
}
