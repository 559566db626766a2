//! End-to-end builds over small CMS snapshots.

use std::convert::Infallible;
use std::sync::Mutex;

use resin_core::{
    AssetFetcher, AssetTable, Collection, Config, Digest, Error, FetchCache, MemorySink, Node,
    NodeSink, Pipeline, RemoteAsset, Singleton, classify,
};
use serde_json::{Value, json};

/// Records every URL it is asked for; the digest is derived from the file name.
#[derive(Default)]
struct RecordingFetcher {
    calls: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AssetFetcher for RecordingFetcher {
    type Error = Infallible;

    async fn fetch(&self, url: &str) -> Result<RemoteAsset, Infallible> {
        self.calls.lock().unwrap().push(url.to_string());
        let file = url.rsplit('/').next().unwrap_or_default();
        let (name, ext) = file.rsplit_once('.').unwrap_or((file, ""));
        Ok(RemoteAsset {
            content_digest: Digest::from_data(file.as_bytes()).to_string(),
            ext: format!(".{ext}"),
            name: name.to_string(),
        })
    }
}

fn collection(value: Value) -> Collection {
    serde_json::from_value(value).unwrap()
}

fn localized_config() -> Config {
    Config {
        host: "https://cms.example.com".to_string(),
        available_lngs: vec!["en".to_string(), "fr".to_string()],
        custom_components: vec!["gallery".to_string()],
        ..Config::default()
    }
}

#[tokio::test]
async fn image_field_links_to_asset_node() {
    let config = Config::default();
    let table: AssetTable = [("img/a.png", "assetNode123")].into_iter().collect();
    let fetcher = RecordingFetcher::default();
    let sink = MemorySink::new();
    let posts = collection(json!({
        "name": "posts",
        "fields": {"hero": {"type": "image", "localize": false}},
        "entries": [{"_id": "x1", "hero": {"path": "/img/a.png"}}]
    }));

    let report = Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[posts], &[])
        .await;

    assert!(report.is_clean());
    let node = sink.get("x1").unwrap();
    assert_eq!(node.fields["hero"]["localFile___NODE"], json!("assetNode123"));
    assert_eq!(node.fields["hero"]["path"], json!("/img/a.png"));
}

#[tokio::test]
async fn relation_link_targets_localized_node() {
    let config = Config {
        available_lngs: vec!["en".to_string()],
        ..Config::default()
    };
    let table = AssetTable::new();
    let fetcher = RecordingFetcher::default();
    let sink = MemorySink::new();
    let posts = collection(json!({
        "name": "posts",
        "fields": {"related": {"type": "collectionlink"}},
        "entries": [{"_id": "x1", "related": {"_id": "y2"}}]
    }));

    Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[posts], &[])
        .await;

    let node = sink.get("x1_en").unwrap();
    assert_eq!(node.fields["related___NODE"], json!("y2_en"));
    assert_eq!(node.lang.as_deref(), Some("en"));
}

#[tokio::test]
async fn singleton_node_identity() {
    let config = localized_config();
    let table = AssetTable::new();
    let fetcher = RecordingFetcher::default();
    let sink = MemorySink::new();
    let home: Singleton =
        serde_json::from_value(json!({"name": "home", "data": {"title": "Hi"}})).unwrap();

    let report = Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[], &[home])
        .await;

    assert_eq!(report.nodes.len(), 1);
    let node = sink.get("singleton-home").unwrap();
    assert_eq!(node.internal.kind, "singleton");
    assert_eq!(node.fields["title"], json!("Hi"));
}

#[tokio::test]
async fn shared_inline_image_fetched_once() {
    let config = Config {
        host: "https://cms.example.com".to_string(),
        ..Config::default()
    };
    let table = AssetTable::new();
    let fetcher = RecordingFetcher::default();
    let sink = MemorySink::new();
    let layout = json!([
        {"component": "text", "settings": {"text": "<p><img src=\"/storage/cat.jpg\"></p>"}},
        {"component": "text", "settings": {"text": "<img src=\"/storage/cat.jpg\" alt=\"again\">"}}
    ]);
    let pages = collection(json!({
        "name": "pages",
        "fields": {"body": {"type": "layout"}},
        "entries": [{"_id": "p1", "body": layout}]
    }));

    Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[pages], &[])
        .await;

    assert_eq!(fetcher.calls(), vec!["https://cms.example.com/storage/cat.jpg"]);
    let digest = Digest::from_data(b"cat.jpg");
    let node = sink.get("p1").unwrap();
    assert_eq!(node.internal.kind, "page");
    assert_eq!(
        node.fields["body"][0]["settings"]["text"],
        json!(format!("<p><img src=\"/static/cat-{digest}.jpg\"></p>"))
    );
    assert_eq!(
        node.fields["body"][1]["settings"]["text"],
        json!(format!("<img src=\"/static/cat-{digest}.jpg\" alt=\"again\">"))
    );
}

#[tokio::test]
async fn layout_assets_deduplicated_per_field() {
    let config = localized_config();
    let table: AssetTable = [("storage/a.png", "asset-a"), ("storage/b.png", "asset-b")]
        .into_iter()
        .collect();
    let fetcher = RecordingFetcher::default();
    let sink = MemorySink::new();
    let layout = json!([
        {"component": "gallery", "settings": {"images": [{"path": "/storage/a.png"}, {"path": "/storage/b.png"}]}},
        {"component": "section", "children": [
            {"component": "gallery", "settings": {"images": [{"path": "/storage/a.png"}]}}
        ]}
    ]);
    let pages = collection(json!({
        "name": "pages",
        "fields": {"body": {"type": "layout", "localize": true}},
        "entries": [{"_id": "p1", "body": layout.to_string(), "body_fr": null}]
    }));

    Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[pages], &[])
        .await;

    for id in ["p1_en", "p1_fr"] {
        let node = sink.get(id).unwrap();
        assert_eq!(node.fields["body_files___NODE"], json!(["asset-a", "asset-b"]));
        assert_eq!(
            node.fields["body"][1]["children"][0]["settings"]["images"][0]["localFileId"],
            json!("asset-a")
        );
    }
}

#[tokio::test]
async fn localization_falls_back_to_base_value() {
    let config = localized_config();
    let table = AssetTable::new();
    let fetcher = RecordingFetcher::default();
    let fields = json!({"title": {"type": "text", "localize": true}});

    let sink = MemorySink::new();
    let localized = collection(json!({
        "name": "posts",
        "fields": fields,
        "entries": [{"_id": "x1", "title": "Hello", "title_en": "Hello (en)"}]
    }));
    Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[localized], &[])
        .await;

    let unlocalized_sink = MemorySink::new();
    let plain = Config::default();
    let unlocalized = collection(json!({
        "name": "posts",
        "fields": fields,
        "entries": [{"_id": "x1", "title": "Hello"}]
    }));
    Pipeline::new(&plain, &table, &fetcher, &unlocalized_sink)
        .run(&[unlocalized], &[])
        .await;

    assert_eq!(sink.get("x1_en").unwrap().fields["title"], json!("Hello (en)"));
    assert_eq!(
        sink.get("x1_fr").unwrap().fields,
        unlocalized_sink.get("x1").unwrap().fields
    );
}

#[tokio::test]
async fn assembly_is_idempotent() {
    let config = localized_config();
    let table: AssetTable = [("img/a.png", "asset-a")].into_iter().collect();
    let fetcher = RecordingFetcher::default();
    let posts = collection(json!({
        "name": "posts",
        "fields": {
            "title": {"type": "text", "localize": true},
            "hero": {"type": "image"},
            "body": {"type": "layout"}
        },
        "entries": [{
            "_id": "x1",
            "title": "Hello",
            "hero": {"path": "img/a.png"},
            "body": [{"component": "html", "settings": {"html": "<img src=\"/img/a.png\">"}}]
        }]
    }));

    let first = MemorySink::new();
    let second = MemorySink::new();
    Pipeline::new(&config, &table, &fetcher, &first)
        .run(std::slice::from_ref(&posts), &[])
        .await;
    Pipeline::new(&config, &table, &fetcher, &second)
        .run(std::slice::from_ref(&posts), &[])
        .await;

    assert_eq!(first.nodes(), second.nodes());
    let ids: Vec<_> = first.nodes().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["x1_en", "x1_fr"]);

    let config = Config::default();
    let sink = MemorySink::new();
    let assembler = resin_core::Assembler::new(&config, &table, &fetcher, &sink);
    let groups = classify(&posts.fields);
    let a = assembler.assemble(&posts, &groups, &posts.entries[0], Some("en")).await.unwrap();
    let b = assembler.assemble(&posts, &groups, &posts.entries[0], Some("en")).await.unwrap();
    assert_eq!((a.id, a.internal.content_digest), (b.id, b.internal.content_digest));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn failing_entries_are_isolated() {
    let config = Config::default();
    let table = AssetTable::new();
    let fetcher = RecordingFetcher::default();
    let sink = MemorySink::new();
    let pages = collection(json!({
        "name": "pages",
        "fields": {"body": {"type": "layout"}, "title": {"type": "text"}},
        "entries": [
            {"_id": "ok1", "title": "fine", "body": []},
            {"_id": "bad", "title": "broken", "body": "[{component: 'text'}]"},
            {"title": "no id"},
            {"_id": "ok2", "title": "also fine"}
        ]
    }));

    let report = Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[pages], &[])
        .await;

    let ids: Vec<_> = report.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["ok1", "ok2"]);
    assert_eq!(sink.len(), 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].entry_id.as_deref(), Some("bad"));
    assert!(matches!(report.failures[0].error, Error::MalformedLayout(_)));
    assert_eq!(report.failures[1].entry_id, None);
    assert!(matches!(report.failures[1].error, Error::MissingEntryId));
    assert!(!report.is_clean());
}

#[tokio::test]
async fn fetch_cache_shares_downloads_across_locales() {
    let config = localized_config();
    let table = AssetTable::new();
    let fetcher = FetchCache::new(RecordingFetcher::default());
    let sink = MemorySink::new();
    let posts = collection(json!({
        "name": "posts",
        "fields": {"body": {"type": "layout"}},
        "entries": [
            {"_id": "x1", "body": [{"component": "text", "settings": {"text": "<img src=\"/a.png\">"}}]},
            {"_id": "x2", "body": [{"component": "text", "settings": {"text": "<img src=\"/a.png\">"}}]}
        ]
    }));

    let report = Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[posts], &[])
        .await;

    assert_eq!(report.nodes.len(), 4);
    assert_eq!(fetcher.inner().calls(), vec!["https://cms.example.com/a.png"]);
    let texts: Vec<_> = report
        .nodes
        .iter()
        .map(|n| n.fields["body"][0]["settings"]["text"].clone())
        .collect();
    assert!(texts.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn empty_array_settings_keep_entry() {
    let config = Config::default();
    let table = AssetTable::new();
    let fetcher = RecordingFetcher::default();
    let sink = MemorySink::new();
    let pages = collection(json!({
        "name": "pages",
        "fields": {"body": {"type": "layout"}},
        "entries": [{"_id": "p1", "body": [
            {"component": "divider", "settings": []},
            {"component": "text", "settings": {"text": "<p>hi</p>"}}
        ]}]
    }));

    let report = Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[pages], &[])
        .await;

    assert!(report.is_clean());
    let node = sink.get("p1").unwrap();
    assert_eq!(node.fields["body"][0]["settings"], json!({}));
    assert_eq!(node.fields["body"][1]["settings"]["text"], json!("<p>hi</p>"));
}

/// Accepts every node except those of one locale.
struct RejectLocale {
    locale: &'static str,
    accepted: MemorySink,
}

impl NodeSink for RejectLocale {
    type Error = std::fmt::Error;

    fn create(&self, node: &Node) -> Result<(), Self::Error> {
        if node.lang.as_deref() == Some(self.locale) {
            return Err(std::fmt::Error);
        }
        self.accepted.create(node).map_err(|never| match never {})
    }
}

#[tokio::test]
async fn sink_rejection_keeps_earlier_locales() {
    let config = localized_config();
    let table = AssetTable::new();
    let fetcher = RecordingFetcher::default();
    let sink = RejectLocale {
        locale: "fr",
        accepted: MemorySink::new(),
    };
    let posts = collection(json!({
        "name": "posts",
        "fields": {"title": {"type": "text"}},
        "entries": [{"_id": "x1", "title": "Hello"}]
    }));

    let report = Pipeline::new(&config, &table, &fetcher, &sink)
        .run(&[posts], &[])
        .await;

    assert!(report.nodes.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(&report.failures[0].error, Error::Sink { id, .. } if id == "x1_fr"));
    let created: Vec<_> = sink.accepted.nodes().into_iter().map(|n| n.id).collect();
    assert_eq!(created, vec!["x1_en"]);
}
