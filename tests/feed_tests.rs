//! Tests for reaction toggling and derived counters.

use moonclub::feed::{
    reaction_counts, toggle_reaction, Comment, Post, ReactionKind, ToggleOutcome,
};
use moonclub::store::{CommunityStore, MemoryStore};

fn store_with_post(post_id: &str) -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_post(&Post {
            id: post_id.to_string(),
            author_profile_id: "prof-author".to_string(),
            body: "gm, moonclub".to_string(),
            created_at: 100,
        })
        .unwrap();
    store
}

#[test]
fn toggle_adds_then_removes() {
    let store = store_with_post("post-1");

    let outcome = toggle_reaction(&store, "post-1", "prof-1", ReactionKind::Like, 101).unwrap();
    assert_eq!(outcome, ToggleOutcome::Added);
    assert_eq!(reaction_counts(&store, "post-1").unwrap().likes, 1);

    // Second toggle of the same kind returns to no-reaction.
    let outcome = toggle_reaction(&store, "post-1", "prof-1", ReactionKind::Like, 102).unwrap();
    assert_eq!(outcome, ToggleOutcome::Removed);
    assert_eq!(reaction_counts(&store, "post-1").unwrap().likes, 0);
}

#[test]
fn kinds_toggle_independently() {
    let store = store_with_post("post-1");

    toggle_reaction(&store, "post-1", "prof-1", ReactionKind::Like, 1).unwrap();
    toggle_reaction(&store, "post-1", "prof-1", ReactionKind::Dislike, 2).unwrap();
    toggle_reaction(&store, "post-1", "prof-1", ReactionKind::Boost, 3).unwrap();

    let counts = reaction_counts(&store, "post-1").unwrap();
    assert_eq!(counts.likes, 1);
    assert_eq!(counts.dislikes, 1);
    assert_eq!(counts.boosts, 1);
    assert_eq!(counts.reshares, 0);

    // Removing one kind leaves the others in place.
    toggle_reaction(&store, "post-1", "prof-1", ReactionKind::Dislike, 4).unwrap();
    let counts = reaction_counts(&store, "post-1").unwrap();
    assert_eq!(counts.likes, 1);
    assert_eq!(counts.dislikes, 0);
    assert_eq!(counts.boosts, 1);
}

#[test]
fn counts_aggregate_across_profiles() {
    let store = store_with_post("post-1");

    for (i, profile) in ["prof-1", "prof-2", "prof-3"].iter().enumerate() {
        toggle_reaction(&store, "post-1", profile, ReactionKind::Like, i as u64).unwrap();
    }
    toggle_reaction(&store, "post-1", "prof-2", ReactionKind::Reshare, 10).unwrap();

    let counts = reaction_counts(&store, "post-1").unwrap();
    assert_eq!(counts.likes, 3);
    assert_eq!(counts.reshares, 1);

    // One profile un-likes; the derived count follows the row set exactly.
    toggle_reaction(&store, "post-1", "prof-2", ReactionKind::Like, 11).unwrap();
    let counts = reaction_counts(&store, "post-1").unwrap();
    assert_eq!(counts.likes, 2);
    assert_eq!(counts.reshares, 1);
}

#[test]
fn counts_are_scoped_to_the_target() {
    let store = store_with_post("post-1");
    store
        .insert_post(&Post {
            id: "post-2".to_string(),
            author_profile_id: "prof-author".to_string(),
            body: "wen lambo".to_string(),
            created_at: 101,
        })
        .unwrap();

    toggle_reaction(&store, "post-1", "prof-1", ReactionKind::Like, 1).unwrap();
    toggle_reaction(&store, "post-2", "prof-1", ReactionKind::Like, 2).unwrap();
    toggle_reaction(&store, "post-2", "prof-2", ReactionKind::Like, 3).unwrap();

    assert_eq!(reaction_counts(&store, "post-1").unwrap().likes, 1);
    assert_eq!(reaction_counts(&store, "post-2").unwrap().likes, 2);
}

#[test]
fn comments_list_in_creation_order() {
    let store = store_with_post("post-1");

    for (ts, body) in [(5u64, "first"), (7, "second"), (6, "between")] {
        let comment = Comment::new("post-1", "prof-1", body, ts).unwrap();
        store.insert_comment(&comment).unwrap();
    }

    let comments = store.comments_for("post-1").unwrap();
    let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "between", "second"]);
}
