use super::*;

#[traced_test]
#[tokio::test]
async fn test_several_candidates_best_one_wins() -> TestResult<()> {
  let mut server = mockito::Server::new_async().await;
  let _search = server
    .mock("GET", "/works")
    .match_query(Matcher::Any)
    .with_body(SEARCH_RESULTS)
    .create_async()
    .await;
  let (config, _cache_dir) = test_config(&server);

  let extractor = StubExtractor::default()
    .with_document("recognition.pdf", &[], "Gradient-based learning applied to document recognition")
    .with_document("deep.pdf", &[], "Deep learning. Yann LeCun, Yoshua Bengio. Nature 521");
  let mut orchestrator = Orchestrator::new(&config, extractor)?;

  let record = orchestrator.resolve(Path::new("recognition.pdf"), &Overrides::default()).await?;
  assert_eq!((record.year, record.family_name.as_str()), (1998, "Lecun"));

  let record = orchestrator.resolve(Path::new("deep.pdf"), &Overrides::default()).await?;
  assert_eq!((record.year, record.family_name.as_str()), (2015, "LeCun"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_title_override_mismatch_is_reported() -> TestResult<()> {
  let mut server = mockito::Server::new_async().await;
  let _search = server
    .mock("GET", "/works")
    .match_query(Matcher::UrlEncoded("query.bibliographic".into(), "Deep learning".into()))
    .with_body(
      r#"{"message": {"items": [{
        "title": ["Deep learning in neural networks: An overview"],
        "author": [{"given": "Jürgen", "family": "Schmidhuber"}],
        "published": {"date-parts": [[2015]]}
      }]}}"#,
    )
    .create_async()
    .await;
  let (config, _cache_dir) = test_config(&server);

  let extractor = StubExtractor::default().with_document("x.pdf", &[], "");
  let mut orchestrator = Orchestrator::new(&config, extractor)?;
  let overrides = Overrides { title: Some("Deep learning".into()), ..Default::default() };
  let error = orchestrator.resolve(Path::new("x.pdf"), &overrides).await.unwrap_err();

  assert!(error.is_terminal());
  assert_eq!(
    error.to_string(),
    "Title mismatch: expected \"Deep learning\", search returned \"Deep learning in neural \
     networks: An overview\""
  );
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_unknown_author_never_resolves() -> TestResult<()> {
  let mut server = mockito::Server::new_async().await;
  let registry = server
    .mock("GET", "/works/10.1000/editorial")
    .with_body(r#"{"message": {"title": ["Editorial"], "published": {"date-parts": [[2020]]}}}"#)
    .expect(1)
    .create_async()
    .await;
  let search = server
    .mock("GET", "/works")
    .match_query(Matcher::Any)
    .with_body(
      r#"{"message": {"items": [{
        "title": ["Editorial"],
        "author": [{"given": "", "family": "unknown"}],
        "published": {"date-parts": [[2020]]}
      }]}}"#,
    )
    .expect(1)
    .create_async()
    .await;
  let (config, _cache_dir) = test_config(&server);

  let extractor =
    StubExtractor::default().with_document("editorial.pdf", &[("doi", "10.1000/editorial")], "Editorial");
  let mut orchestrator = Orchestrator::new(&config, extractor)?;
  let result = orchestrator.resolve(Path::new("editorial.pdf"), &Overrides::default()).await;

  assert!(matches!(result, Err(BibnameError::Unresolved)));
  registry.assert_async().await;
  search.assert_async().await;
  Ok(())
}

#[tokio::test]
async fn test_extraction_failure_is_an_error() -> TestResult<()> {
  let server = mockito::Server::new_async().await;
  let (config, _cache_dir) = test_config(&server);
  let mut orchestrator = Orchestrator::new(&config, StubExtractor::default())?;

  let result = orchestrator.resolve(Path::new("missing.pdf"), &Overrides::default()).await;
  assert!(matches!(result, Err(BibnameError::Io(_))));
  Ok(())
}
