use bytes::Bytes;
use relayzip_sink::{Error, FsSink, MemorySink, Sink, SinkPath, SinkRouter, SinkWriter};
use tempfile::tempdir;

async fn write_all<K: Sink>(sink: &K, path: &str, chunks: &[&'static [u8]]) -> u64 {
    let path = SinkPath::parse(path).unwrap();
    let mut writer = sink.open_write(&path).await.unwrap();
    for chunk in chunks {
        writer.write(Bytes::from_static(chunk)).await.unwrap();
    }
    writer.close().await.unwrap()
}

#[tokio::test]
async fn fs_sink_creates_nested_objects() {
    let dir = tempdir().unwrap();
    let sink = FsSink::new(dir.path());

    let written = write_all(
        &sink,
        "file://bucket/companies_house/companies_house_basic.csv",
        &[b"a,b\n", b"1,2\n"],
    )
    .await;
    assert_eq!(written, 8);

    let local = dir
        .path()
        .join("bucket")
        .join("companies_house")
        .join("companies_house_basic.csv");
    assert_eq!(std::fs::read(&local).unwrap(), b"a,b\n1,2\n");
}

#[tokio::test]
async fn fs_sink_overwrites_existing_objects() {
    let dir = tempdir().unwrap();
    let sink = FsSink::new(dir.path());

    write_all(&sink, "file://b/x.json", &[b"a much longer first version"]).await;
    write_all(&sink, "file://b/x.json", &[b"{}"]).await;
    assert_eq!(std::fs::read(dir.path().join("b/x.json")).unwrap(), b"{}");
}

#[tokio::test]
async fn fs_sink_leaves_partial_data_when_not_closed() {
    let dir = tempdir().unwrap();
    let sink = FsSink::new(dir.path());
    let path = SinkPath::parse("file://b/partial.csv").unwrap();

    let mut writer = sink.open_write(&path).await.unwrap();
    writer.write(Bytes::from_static(b"a,b\n")).await.unwrap();
    drop(writer);

    assert!(sink.local_path(&path).exists());
}

#[tokio::test]
async fn fs_sink_open_failure() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("bucket"), b"not a directory").unwrap();
    let sink = FsSink::new(dir.path());

    let err = sink
        .open_write(&SinkPath::parse("file://bucket/a.csv").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Open { .. }), "{err}");
}

#[tokio::test]
async fn router_dispatches_by_scheme() {
    let dir = tempdir().unwrap();
    let memory = MemorySink::new();
    let router = SinkRouter::new()
        .with_memory(memory.clone())
        .with_fs(FsSink::new(dir.path()));

    write_all(&router, "mem://out/result.csv", &[b"a,b\n1,2\n"]).await;
    write_all(&router, "file://out/result.csv", &[b"on disk"]).await;

    assert_eq!(memory.get("mem://out/result.csv").unwrap(), "a,b\n1,2\n");
    assert_eq!(
        std::fs::read(dir.path().join("out/result.csv")).unwrap(),
        b"on disk"
    );
}

#[tokio::test]
async fn router_rejects_schemes_without_a_backend() {
    let router = SinkRouter::new();
    assert!(!router.supports("mem"));
    assert!(!router.supports("file"));

    for raw in ["s3://bucket/key.csv", "file://bucket/key.csv", "mem://bucket/key.csv"] {
        let path = SinkPath::parse(raw).unwrap();
        assert!(!router.accepts(&path));
        let err = router.open_write(&path).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme { .. }), "{err}");
    }
}

#[test]
fn directory_only_router_refuses_memory_paths() {
    let dir = tempdir().unwrap();
    let router = SinkRouter::new().with_fs(FsSink::new(dir.path()));
    assert!(router.accepts(&SinkPath::parse("file://out/x.csv").unwrap()));
    assert!(!router.accepts(&SinkPath::parse("mem://out/x.csv").unwrap()));
}
