mod common;

use assert2::{check, let_assert};
use common::{IsolatedIndex, isolated_index};
use rstest::rstest;
use searchindex_mcp::tools::{
    ListObjectsRequest, LoadIndexRequest, LookupTermRequest, SearchRequest, SearchScope,
    ValidateIndexRequest, handle_list_objects, handle_load_index, handle_lookup_term,
    handle_search, handle_validate_index,
};

const BROKEN_INDEX: &str = r#"Search.setIndex({"docnames": ["a"], "filenames": ["a.rst"], "titles": ["A"], "terms": {"foo": [0, 3]}, "objects": {}, "objtypes": {}, "objnames": {}, "titleterms": {}, "envversion": {}})"#;

fn search_request(query: &str, path: Option<String>) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        path,
        limit: None,
        scope: None,
    }
}

async fn load(fixture: &IsolatedIndex) -> String {
    let request = LoadIndexRequest {
        path: fixture.path.display().to_string(),
    };
    handle_load_index(&fixture.state, request).await.unwrap()
}

#[rstest]
#[tokio::test]
async fn load_index_reports_stats(isolated_index: IsolatedIndex) {
    let output = load(&isolated_index).await;
    check!(output.contains("Documents: 6"));
    check!(output.contains("Terms: 231 (14 in titles)"));
    check!(output.contains("Objects: 22 in 4 namespaces (5 types)"));
    check!(output.contains("Fingerprint: "));

    let canonical = isolated_index.path.canonicalize().unwrap();
    check!(isolated_index.state.default_path().await == Some(canonical));
}

#[rstest]
#[tokio::test]
async fn search_uses_the_loaded_default(isolated_index: IsolatedIndex) {
    load(&isolated_index).await;

    let output = handle_search(&isolated_index.state, search_request("spectrum", None))
        .await
        .unwrap();
    check!(output.contains("Search results for 'spectrum'"));
    check!(output.contains("apidocs/spectrum"));
    check!(output.contains("relevance"));
    check!(output.contains("Objects:"));
}

#[rstest]
#[tokio::test]
async fn search_without_index_asks_for_one(isolated_index: IsolatedIndex) {
    let_assert!(
        Err(message) = handle_search(&isolated_index.state, search_request("gate", None)).await
    );
    check!(message.contains("load_index"));
}

#[rstest]
#[tokio::test]
async fn search_scope_objects_skips_pages(isolated_index: IsolatedIndex) {
    let request = SearchRequest {
        scope: Some(SearchScope::Objects),
        ..search_request("SpecTclGateClient", isolated_index.path_arg())
    };
    let output = handle_search(&isolated_index.state, request).await.unwrap();
    check!(output.contains("spectcl.data.client.SpecTclGateClient"));
    check!(!output.contains("Pages:"));
}

#[rstest]
#[tokio::test]
async fn search_zero_limit_uses_default(isolated_index: IsolatedIndex) {
    let request = SearchRequest {
        limit: Some(0),
        ..search_request("spectrum", isolated_index.path_arg())
    };
    let output = handle_search(&isolated_index.state, request).await.unwrap();
    check!(!output.contains("No results found"));
    check!(output.contains("apidocs/spectrum"));
}

#[rstest]
#[tokio::test]
async fn search_miss_offers_suggestions(isolated_index: IsolatedIndex) {
    let output = handle_search(
        &isolated_index.state,
        search_request("spectrun", isolated_index.path_arg()),
    )
    .await
    .unwrap();
    check!(output.contains("No results found for 'spectrun'"));
    check!(output.contains("spectrum"));
}

#[rstest]
#[case("spectclgatecli", true)]
#[case("nonexistent", false)]
#[tokio::test]
async fn lookup_term_lists_documents(
    isolated_index: IsolatedIndex,
    #[case] term: &str,
    #[case] found: bool,
) {
    let request = LookupTermRequest {
        term: term.to_string(),
        path: isolated_index.path_arg(),
    };
    let output = handle_lookup_term(&isolated_index.state, request)
        .await
        .unwrap();
    if found {
        check!(output.contains("apidocs/client"));
    } else {
        check!(output.contains("does not occur"));
    }
}

#[rstest]
#[tokio::test]
async fn list_objects_by_kind(isolated_index: IsolatedIndex) {
    let request = ListObjectsRequest {
        path: isolated_index.path_arg(),
        namespace: None,
        kind: Some("class".to_string()),
    };
    let output = handle_list_objects(&isolated_index.state, request)
        .await
        .unwrap();
    check!(output.contains("SpecTclGateClient"));
    check!(output.contains("Spectrum"));
    check!(!output.contains("to_image_tuple"));
}

#[rstest]
#[tokio::test]
async fn list_objects_unknown_namespace(isolated_index: IsolatedIndex) {
    let request = ListObjectsRequest {
        path: isolated_index.path_arg(),
        namespace: Some("numpy".to_string()),
        kind: None,
    };
    let output = handle_list_objects(&isolated_index.state, request)
        .await
        .unwrap();
    check!(output.contains("No objects match"));
    check!(output.contains("spectcl.Spectrum"));
}

#[rstest]
#[tokio::test]
async fn validate_reference_index(isolated_index: IsolatedIndex) {
    let request = ValidateIndexRequest {
        path: isolated_index.path_arg(),
    };
    let output = handle_validate_index(&isolated_index.state, request)
        .await
        .unwrap();
    check!(output.contains("index is valid"));
}

#[rstest]
#[tokio::test]
async fn broken_index_is_reported_and_refused(isolated_index: IsolatedIndex) {
    load(&isolated_index).await;
    let broken = isolated_index
        .workspace
        .create_file("broken/searchindex.js", BROKEN_INDEX);
    let path = Some(broken.display().to_string());

    let output = handle_validate_index(
        &isolated_index.state,
        ValidateIndexRequest { path: path.clone() },
    )
    .await
    .unwrap();
    check!(output.contains("1 violation(s)"));
    check!(output.contains("`terms` entry 'foo' references document 3"));

    let request = LoadIndexRequest {
        path: broken.display().to_string(),
    };
    let_assert!(Err(message) = handle_load_index(&isolated_index.state, request).await);
    check!(message.contains("Refusing"));

    let canonical = isolated_index.path.canonicalize().unwrap();
    check!(isolated_index.state.default_path().await == Some(canonical));
}

#[rstest]
#[tokio::test]
async fn reloading_replaces_default(isolated_index: IsolatedIndex) {
    load(&isolated_index).await;
    let copy = isolated_index
        .workspace
        .copy_file(&isolated_index.path, "other/searchindex.js");

    let request = LoadIndexRequest {
        path: copy.display().to_string(),
    };
    let output = handle_load_index(&isolated_index.state, request)
        .await
        .unwrap();
    check!(output.contains("Replaces previous default"));
    check!(isolated_index.state.cached_count().await == 2);
}
