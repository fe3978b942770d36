//! Property-based tests for the pure core.
//!
//! These tests use proptest to check invariants of diff synthesis, graph
//! layout, branch trees and progress relaying over generated inputs.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::DateTime;
use proptest::prelude::*;

use gitlane::core::branch_tree::BranchTree;
use gitlane::core::diff::{apply, render, synthesize, LineKind};
use gitlane::core::graph::{layout, EdgeKind, LayoutMetrics};
use gitlane::core::history::CommitRecord;
use gitlane::core::types::{BranchName, Oid};
use gitlane::engine::progress::Relay;
use gitlane::engine::Progress;
use gitlane::git::TransportEvent;

/// Text built from a small alphabet of lines so that diffs share content.
fn text() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "", "dd", "e e"]), 0..30),
        any::<bool>(),
    )
        .prop_map(|(lines, trailing_newline)| {
            let mut text = lines.join("\n");
            if trailing_newline && !text.is_empty() {
                text.push('\n');
            }
            text
        })
}

fn oid(n: usize) -> Oid {
    Oid::new(format!("{n:040x}")).unwrap()
}

/// A history of `n` commits, newest first. Each parent is an older commit.
fn history() -> impl Strategy<Value = Vec<CommitRecord>> {
    (1usize..25).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..3), n)
            .prop_map(move |picks| {
                picks
                    .into_iter()
                    .enumerate()
                    .map(|(row, parents)| {
                        let older = n - row - 1;
                        let mut parent_rows: Vec<usize> = Vec::new();
                        if older > 0 {
                            for pick in parents {
                                let parent = row + 1 + pick.index(older);
                                if !parent_rows.contains(&parent) {
                                    parent_rows.push(parent);
                                }
                            }
                        }
                        record(n - row, parent_rows.iter().map(|p| n - p).collect())
                    })
                    .collect()
            })
    })
}

fn record(id: usize, parents: Vec<usize>) -> CommitRecord {
    let time = DateTime::from_timestamp(1_700_000_000 + id as i64, 0).unwrap();
    CommitRecord {
        hash: oid(id),
        parent_hashes: parents.into_iter().map(oid).collect(),
        author_name: "Test".to_string(),
        author_email: "test@example.com".to_string(),
        date: time,
        commit_time: time,
        subject: format!("commit {id}"),
        body: String::new(),
        refs: Vec::new(),
    }
}

fn branch_name() -> impl Strategy<Value = BranchName> {
    prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..4)
        .prop_filter_map("valid branch name", |parts| BranchName::new(parts.join("/")).ok())
}

proptest! {
    #[test]
    fn diff_reapplies_to_new_text(old in text(), new in text()) {
        let hunks = synthesize(&old, &new, "prop");
        prop_assert_eq!(apply(&old, &hunks), new);
    }

    #[test]
    fn identical_texts_have_no_hunks(old in text()) {
        prop_assert!(synthesize(&old, &old, "prop").is_empty());
        prop_assert_eq!(render(&[]), "");
    }

    #[test]
    fn hunk_counts_match_lines(old in text(), new in text()) {
        for hunk in synthesize(&old, &new, "prop") {
            let deletes = hunk.lines.iter().filter(|l| l.kind == LineKind::Delete).count();
            let inserts = hunk.lines.iter().filter(|l| l.kind == LineKind::Insert).count();
            prop_assert_eq!(hunk.old_count, deletes);
            prop_assert_eq!(hunk.new_count, inserts);
            prop_assert!(deletes + inserts > 0);
            prop_assert!(hunk.lines.iter().all(|l| l.kind != LineKind::Equal));
            prop_assert_eq!(
                hunk.header,
                format!("@@ -{},{} +{},{} @@", hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count)
            );
        }
    }

    #[test]
    fn rendered_lines_are_prefixed(old in text(), new in text()) {
        let rendered = render(&synthesize(&old, &new, "prop"));
        for line in rendered.lines() {
            prop_assert!(
                line.starts_with("@@ ") || line.starts_with('-') || line.starts_with('+'),
                "unexpected line {:?}", line
            );
        }
    }

    #[test]
    fn every_commit_gets_one_node(commits in history()) {
        let graph = layout(&commits, LayoutMetrics::default());
        prop_assert_eq!(graph.nodes.len(), commits.len());
        for (row, (node, commit)) in graph.nodes.iter().zip(&commits).enumerate() {
            prop_assert_eq!(node.row, row);
            prop_assert_eq!(&node.hash, &commit.hash);
            prop_assert!(node.lane < graph.width);
        }
    }

    #[test]
    fn parent_edges_match_parents(commits in history()) {
        let graph = layout(&commits, LayoutMetrics::default());
        let primary = commits.iter().filter(|c| !c.parent_hashes.is_empty()).count();
        let secondary: usize = commits
            .iter()
            .map(|c| c.parent_hashes.len().saturating_sub(1))
            .sum();
        let count = |kind: EdgeKind| graph.edges.iter().filter(|e| e.kind == kind).count();
        prop_assert_eq!(count(EdgeKind::Parent), primary);
        prop_assert_eq!(count(EdgeKind::Merge), secondary);
        prop_assert!(graph.edges.iter().all(|e| e.lane < graph.width));
    }

    #[test]
    fn layout_is_deterministic(commits in history()) {
        let first = layout(&commits, LayoutMetrics::default());
        let second = layout(&commits, LayoutMetrics::default());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn linear_history_uses_one_lane(n in 1usize..40) {
        let commits: Vec<_> = (1..=n)
            .rev()
            .map(|id| record(id, if id > 1 { vec![id - 1] } else { vec![] }))
            .collect();
        let graph = layout(&commits, LayoutMetrics::default());
        prop_assert_eq!(graph.width, 1);
        prop_assert!(graph.nodes.iter().all(|node| node.lane == 0));
    }

    #[test]
    fn branch_tree_holds_every_branch(names in prop::collection::vec(branch_name(), 0..20)) {
        let unique: BTreeSet<_> = names.iter().map(|n| n.as_str().to_string()).collect();
        let tree = BranchTree::build(&names);
        prop_assert_eq!(tree.branch_count(), unique.len());

        let walked: BTreeSet<_> = tree
            .walk()
            .filter_map(|(_, node)| node.branch.as_ref().map(|b| b.as_str().to_string()))
            .collect();
        prop_assert_eq!(walked, unique);
    }

    #[test]
    fn relayed_percent_never_decreases(
        reports in prop::collection::vec(prop::option::of(-50i32..200), 0..40),
        objects in prop::collection::vec((0usize..100, 1usize..100), 0..40),
    ) {
        let events: Mutex<Vec<Progress>> = Mutex::new(Vec::new());
        {
            let mut relay = Relay::new(&events);
            for percent in reports {
                relay.report("step", percent);
            }
            for (done, total) in objects {
                relay.observe(TransportEvent::Received {
                    received: done.min(total),
                    indexed: 0,
                    total,
                });
            }
        }

        let percents: Vec<i32> = events.into_inner().unwrap().iter().map(|e| e.percent).collect();
        prop_assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
        prop_assert!(percents.iter().all(|p| (0..=100).contains(p)));
    }
}
