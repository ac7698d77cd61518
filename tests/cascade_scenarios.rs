// tests/cascade_scenarios.rs
//
// End-to-end behaviour of the selection cascade against scripted search
// results and in-memory stores.

use std::sync::Arc;

use article_digest_bot::providers::memory::{
    MemoryHistory, MemoryInterests, ScriptedReply, ScriptedSearch,
};
use article_digest_bot::selection::{pick_weighted, CascadeConfig, SelectionCascade};
use article_digest_bot::types::{
    Article, Interest, RoomSelection, SearchStrategy, SelectionLabel, SelectionOutcome,
};
use rand::{rngs::StdRng, SeedableRng};

const ROOM: &str = "room-1";
const UNSCOPED: &str = "stocks:>=30";

fn article(url: &str) -> Article {
    Article {
        title: format!("article {url}"),
        url: url.to_string(),
        stock_count: 42,
        ..Default::default()
    }
}

/// Seed whose first weighted draw over `interests` lands on `topic`.
fn seed_picking(interests: &[Interest], topic: &str) -> u64 {
    (0..1_000u64)
        .find(|&s| {
            let mut rng = StdRng::seed_from_u64(s);
            pick_weighted(interests, &mut rng).map(|i| i.topic.as_str()) == Some(topic)
        })
        .expect("some seed picks the topic")
}

struct Rig {
    search: Arc<ScriptedSearch>,
    history: Arc<MemoryHistory>,
    interests: Arc<MemoryInterests>,
    cascade: SelectionCascade,
}

fn rig(interests: Vec<Interest>, seed: u64) -> Rig {
    let search = Arc::new(ScriptedSearch::default());
    let history = Arc::new(MemoryHistory::default());
    let interests = Arc::new(MemoryInterests::with(interests));
    let cascade = SelectionCascade::with_rng(
        search.clone(),
        history.clone(),
        interests.clone(),
        CascadeConfig::default(),
        StdRng::seed_from_u64(seed),
    );
    Rig {
        search,
        history,
        interests,
        cascade,
    }
}

fn found(sel: &RoomSelection) -> (&Article, &SelectionLabel, SearchStrategy) {
    match &sel.outcome {
        SelectionOutcome::Found(s) => (&s.article, &s.label, s.stage),
        SelectionOutcome::NotFound => panic!("expected an article, got NotFound"),
    }
}

fn strategies(search: &ScriptedSearch) -> Vec<(SearchStrategy, u32)> {
    search
        .calls()
        .into_iter()
        .map(|q| (q.strategy, q.page))
        .collect()
}

#[tokio::test]
async fn scenario_a_second_tag_page_has_new_article() {
    let interests = vec![Interest::new(ROOM, "go", 6), Interest::new(ROOM, "rust", 2)];
    let r = rig(interests.clone(), seed_picking(&interests, "go"));

    for url in ["https://seen/1", "https://seen/2", "https://seen/3"] {
        r.history.seed(ROOM, url);
    }
    r.search
        .items(
            "stocks:>=30 tag:go",
            1,
            vec![
                article("https://seen/1"),
                article("https://seen/2"),
                article("https://seen/3"),
            ],
        )
        .items("stocks:>=30 tag:go", 2, vec![article("https://new/go")]);

    let sel = r.cascade.select(ROOM).await;
    let (a, label, stage) = found(&sel);
    assert_eq!(a.url, "https://new/go");
    assert_eq!(label, &SelectionLabel::Topic("go".into()));
    assert_eq!(stage, SearchStrategy::TagSearch);
    assert!(sel.pruned_topic.is_none());
    assert!(r.interests.deleted().is_empty());
    assert_eq!(
        strategies(&r.search),
        vec![(SearchStrategy::TagSearch, 1), (SearchStrategy::TagSearch, 2)],
        "title stage must not run"
    );
}

#[tokio::test]
async fn scenario_b_exhausted_interest_is_pruned_then_unscoped() {
    let interests = vec![Interest::new(ROOM, "obscure-topic", 5)];
    let r = rig(interests, 1);

    r.history.seed(ROOM, "https://popular/1");
    r.search.items(
        UNSCOPED,
        1,
        vec![article("https://popular/1"), article("https://popular/2")],
    );

    let sel = r.cascade.select(ROOM).await;
    let (a, label, stage) = found(&sel);
    assert_eq!(a.url, "https://popular/2");
    assert_eq!(label, &SelectionLabel::Generic);
    assert_eq!(stage, SearchStrategy::Unscoped);
    assert_eq!(sel.pruned_topic.as_deref(), Some("obscure-topic"));
    assert_eq!(
        r.interests.deleted(),
        vec![(ROOM.to_string(), "obscure-topic".to_string())]
    );
    assert!(r.interests.snapshot().is_empty());
    // Empty pages end each stage early.
    assert_eq!(
        strategies(&r.search),
        vec![
            (SearchStrategy::TagSearch, 1),
            (SearchStrategy::TitleSearch, 1),
            (SearchStrategy::Unscoped, 1),
        ]
    );
}

#[tokio::test]
async fn scenario_c_no_interests_and_nothing_new() {
    let r = rig(vec![], 1);
    for page in 1..=4 {
        let url = format!("https://popular/{page}");
        r.history.seed(ROOM, &url);
        r.search.items(UNSCOPED, page, vec![article(&url)]);
    }
    // Would be new, but lies past the page budget.
    r.search.items(UNSCOPED, 5, vec![article("https://popular/5")]);

    let sel = r.cascade.select(ROOM).await;
    assert_eq!(sel.outcome, SelectionOutcome::NotFound);
    assert!(sel.pruned_topic.is_none());
    assert_eq!(
        strategies(&r.search),
        (1..=4).map(|p| (SearchStrategy::Unscoped, p)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn scenario_d_rate_limit_moves_to_title_stage() {
    let interests = vec![Interest::new(ROOM, "rust", 3)];
    let r = rig(interests, 1);

    r.search
        .reply("stocks:>=30 tag:rust", 1, ScriptedReply::RateLimited)
        .items("stocks:>=30 tag:rust", 2, vec![article("https://tag/2")])
        .items("stocks:>=30 title:rust", 1, vec![article("https://title/1")]);

    let sel = r.cascade.select(ROOM).await;
    let (a, _, stage) = found(&sel);
    assert_eq!(a.url, "https://title/1");
    assert_eq!(stage, SearchStrategy::TitleSearch);
    assert_eq!(
        strategies(&r.search),
        vec![(SearchStrategy::TagSearch, 1), (SearchStrategy::TitleSearch, 1)],
        "rate-limited stage is not retried"
    );
}

#[tokio::test]
async fn rate_limited_topic_stage_prevents_pruning() {
    let interests = vec![Interest::new(ROOM, "rust", 3)];
    let r = rig(interests, 1);

    r.search
        .reply("stocks:>=30 tag:rust", 1, ScriptedReply::RateLimited)
        .items(UNSCOPED, 1, vec![article("https://popular/1")]);

    let sel = r.cascade.select(ROOM).await;
    let (a, label, _) = found(&sel);
    assert_eq!(a.url, "https://popular/1");
    assert_eq!(label, &SelectionLabel::Generic);
    assert!(sel.pruned_topic.is_none());
    assert!(r.interests.deleted().is_empty());
}

#[tokio::test]
async fn tag_exhaustion_alone_never_prunes() {
    let interests = vec![Interest::new(ROOM, "rust", 3)];
    let r = rig(interests, 1);

    r.history.seed(ROOM, "https://seen");
    for page in 1..=4 {
        r.search.items("stocks:>=30 tag:rust", page, vec![article("https://seen")]);
    }
    r.search.items("stocks:>=30 title:rust", 3, vec![article("https://title/3")]);
    for page in 1..=2 {
        r.search.items("stocks:>=30 title:rust", page, vec![article("https://seen")]);
    }

    let sel = r.cascade.select(ROOM).await;
    let (a, label, stage) = found(&sel);
    assert_eq!(a.url, "https://title/3");
    assert_eq!(label, &SelectionLabel::Topic("rust".into()));
    assert_eq!(stage, SearchStrategy::TitleSearch);
    assert!(r.interests.deleted().is_empty());
    assert_eq!(r.search.calls().len(), 4 + 3);
}

#[tokio::test]
async fn multi_word_topic_uses_and_terms() {
    let interests = vec![Interest::new(ROOM, "Cursor rules", 3)];
    let r = rig(interests, 1);
    r.search.items(
        "stocks:>=30 tag:Cursor tag:rules",
        1,
        vec![article("https://cursor/1")],
    );

    let sel = r.cascade.select(ROOM).await;
    let (a, label, _) = found(&sel);
    assert_eq!(a.url, "https://cursor/1");
    assert_eq!(label, &SelectionLabel::Topic("Cursor rules".into()));
}

#[tokio::test]
async fn never_returns_an_article_already_in_history() {
    let interests = vec![Interest::new(ROOM, "go", 1)];
    let r = rig(interests, 9);
    let urls: Vec<String> = (0..10).map(|i| format!("https://x/{i}")).collect();
    for u in &urls {
        r.history.seed(ROOM, u);
    }
    let page: Vec<Article> = urls.iter().map(|u| article(u)).collect();
    for p in 1..=4 {
        r.search.items("stocks:>=30 tag:go", p, page.clone());
        r.search.items("stocks:>=30 title:go", p, page.clone());
        r.search.items(UNSCOPED, p, page.clone());
    }

    let sel = r.cascade.select(ROOM).await;
    assert_eq!(sel.outcome, SelectionOutcome::NotFound);
    // Both topic stages exhausted their full budget, so the interest goes.
    assert_eq!(sel.pruned_topic.as_deref(), Some("go"));
    assert_eq!(r.search.calls().len(), 12);
}

#[tokio::test]
async fn other_rooms_history_does_not_block() {
    let r = rig(vec![], 1);
    r.history.seed("someone-else", "https://popular/1");
    r.search.items(UNSCOPED, 1, vec![article("https://popular/1")]);

    let sel = r.cascade.select(ROOM).await;
    assert_eq!(sel.outcome.article().unwrap().url, "https://popular/1");
}

#[tokio::test]
async fn failed_interest_delete_still_falls_back_to_unscoped() {
    let interests = vec![Interest::new(ROOM, "obscure-topic", 5)];
    let r = rig(interests, 1);
    r.interests.fail_deletes();
    r.search.items(UNSCOPED, 1, vec![article("https://popular/1")]);

    let sel = r.cascade.select(ROOM).await;
    let (a, label, stage) = found(&sel);
    assert_eq!(a.url, "https://popular/1");
    assert_eq!(label, &SelectionLabel::Generic);
    assert_eq!(stage, SearchStrategy::Unscoped);
    assert!(sel.pruned_topic.is_none());
    assert_eq!(r.interests.snapshot().len(), 1);
}

#[tokio::test]
async fn unreadable_interests_mean_unscoped_only() {
    let interests = vec![Interest::new(ROOM, "rust", 5)];
    let r = rig(interests, 1);
    r.interests.fail_lists();
    r.search
        .items("stocks:>=30 tag:rust", 1, vec![article("https://tag/1")])
        .items(UNSCOPED, 1, vec![article("https://popular/1")]);

    let sel = r.cascade.select(ROOM).await;
    let (a, label, _) = found(&sel);
    assert_eq!(a.url, "https://popular/1");
    assert_eq!(label, &SelectionLabel::Generic);
    assert!(sel.pruned_topic.is_none());
    assert_eq!(strategies(&r.search), vec![(SearchStrategy::Unscoped, 1)]);
    assert!(r.interests.deleted().is_empty());
}
