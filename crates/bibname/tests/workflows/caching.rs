use super::*;

#[traced_test]
#[tokio::test]
async fn test_cached_response_survives_restart() -> TestResult<()> {
  let mut server = mockito::Server::new_async().await;
  let registry = server
    .mock("GET", "/works/10.1038/nature14539")
    .with_status(200)
    .with_body(DEEP_LEARNING)
    .expect(1)
    .create_async()
    .await;
  let (config, cache_dir) = test_config(&server);

  for _ in 0..2 {
    let extractor =
      StubExtractor::default().with_document("deep.pdf", &[("doi", "10.1038/nature14539")], "");
    let mut orchestrator = Orchestrator::new(&config, extractor)?;
    let record = orchestrator.resolve(Path::new("deep.pdf"), &Overrides::default()).await?;
    assert_eq!(record.canonical_filename(), "2015 - Y. LeCun - Deep learning.pdf");
  }

  registry.assert_async().await;
  let cached = std::fs::read_to_string(cache_dir.path().join("registry.json"))?;
  assert!(cached.contains("10.1038/nature14539"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_failed_search_is_retried() -> TestResult<()> {
  let mut server = mockito::Server::new_async().await;
  let (config, cache_dir) = test_config(&server);
  let text = "Deep learning Yann LeCun Yoshua Bengio Geoffrey Hinton Nature 2015";
  let mut orchestrator =
    Orchestrator::new(&config, StubExtractor::default().with_document("deep.pdf", &[], text))?;

  let unavailable = server
    .mock("GET", "/works")
    .match_query(Matcher::Any)
    .with_status(503)
    .expect(1)
    .create_async()
    .await;
  let result = orchestrator.resolve(Path::new("deep.pdf"), &Overrides::default()).await;
  assert!(matches!(result, Err(BibnameError::Unresolved)));
  unavailable.assert_async().await;
  unavailable.remove_async().await;
  assert!(!cache_dir.path().join("scholarly.json").exists());

  let available = server
    .mock("GET", "/works")
    .match_query(Matcher::Any)
    .with_status(200)
    .with_body(SEARCH_RESULTS)
    .expect(1)
    .create_async()
    .await;
  let record = orchestrator.resolve(Path::new("deep.pdf"), &Overrides::default()).await?;
  assert_eq!(record.canonical_filename(), "2015 - Y. LeCun - Deep learning.pdf");
  available.assert_async().await;
  assert!(cache_dir.path().join("scholarly.json").exists());
  Ok(())
}

#[tokio::test]
async fn test_disabled_cache_writes_nothing() -> TestResult<()> {
  let mut server = mockito::Server::new_async().await;
  let registry = server
    .mock("GET", "/works/10.1038/nature14539")
    .with_body(DEEP_LEARNING)
    .expect(1)
    .create_async()
    .await;
  let (mut config, cache_dir) = test_config(&server);
  config.cache.enabled = false;

  let extractor =
    StubExtractor::default().with_document("deep.pdf", &[], "doi: 10.1038/nature14539");
  let mut orchestrator = Orchestrator::new(&config, extractor)?;
  orchestrator.resolve(Path::new("deep.pdf"), &Overrides::default()).await?;
  orchestrator.resolve(Path::new("deep.pdf"), &Overrides::default()).await?;

  registry.assert_async().await;
  assert_eq!(std::fs::read_dir(cache_dir.path())?.count(), 0);
  Ok(())
}
