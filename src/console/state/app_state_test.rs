#[cfg(test)]
mod tests {
    use super::super::app_state::*;
    use super::super::commands::{Command, FetchPlan};
    use super::super::events::Message;
    use crate::config::SearchSettings;
    use crate::console::application::backend::BackendCall;
    use crate::console::domain::document::Document;
    use crate::console::domain::filter::FilterState;
    use crate::console::domain::models::{
        Aggregations, AttachmentTarget, MatchMode, SearchPage, SearchRequest, ViewMode,
    };
    use crate::error::SearchError;
    use crate::query::UrlParams;
    use serde_json::json;

    fn create_test_state() -> AppState {
        AppState::new(SearchSettings::default())
    }

    fn params(terms: &[&str]) -> UrlParams {
        let terms: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
        UrlParams::search(&terms, MatchMode::Any)
    }

    fn docs(prefix: &str, count: usize) -> Vec<Document> {
        (0..count)
            .map(|i| Document::from_raw(&json!({ "ProphecyId": format!("{prefix}-{i}") })))
            .collect()
    }

    fn page(prefix: &str, count: usize) -> SearchPage {
        SearchPage {
            documents: docs(prefix, count),
            next_cursor: Some(vec![json!(count), json!(prefix)]),
            total: None,
            aggregations: None,
        }
    }

    fn expect_search(command: Command) -> (u64, SearchRequest) {
        match command {
            Command::Fetch(FetchPlan {
                id,
                call: BackendCall::Search(request),
            }) => (id, request),
            other => panic!("expected a search fetch, got {other:?}"),
        }
    }

    fn complete(state: &mut AppState, id: u64, page: SearchPage) {
        let command = state.update(Message::SearchCompleted {
            id,
            outcome: Ok(page),
        });
        assert_eq!(command, Command::None);
    }

    /// State after one completed reader search for `budget`.
    fn searched_state() -> AppState {
        let mut state = create_test_state();
        let (id, _) = expect_search(state.update(Message::UrlChanged(params(&["budget"]))));
        complete(&mut state, id, page("a", 10));
        state
    }

    #[test]
    fn test_initial_state() {
        let state = create_test_state();

        assert!(state.results.documents.is_empty());
        assert!(!state.results.loading);
        assert_eq!(state.results.error, None);
        assert_eq!(state.results.facets.doc_types, None);
        assert_eq!(state.results.facets.branches, None);
        assert_eq!(state.results.facets.extensions, None);
        assert_eq!(state.view.mode, ViewMode::Reader);
        assert_eq!(state.view.page, 1);
        assert!(!state.can_load_more());
    }

    #[test]
    fn test_url_change_dispatches_fresh_search() {
        let mut state = create_test_state();

        let (id, request) = expect_search(state.update(Message::UrlChanged(params(&["a", "b"]))));

        assert_eq!(id, 1);
        assert_eq!(request.queries, vec!["a", "b"]);
        assert_eq!(request.size, 10);
        assert!(state.results.loading);
        assert_eq!(state.header_query(), "\"a\", \"b\"");
    }

    #[test]
    fn test_same_url_does_not_refetch() {
        let mut state = searched_state();

        let command = state.update(Message::UrlChanged(params(&["budget"])));

        assert_eq!(command, Command::None);
        assert_eq!(state.results.documents.len(), 10);
    }

    #[test]
    fn test_fresh_search_never_sends_cursor() {
        let mut state = searched_state();
        assert!(state.results.cursor.is_some());

        let (_, request) = expect_search(state.update(Message::UrlChanged(params(&["other"]))));

        assert_eq!(request.search_after, None);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("search_after").is_none());
        assert_eq!(state.results.cursor, None);
        assert!(state.results.documents.is_empty());
    }

    #[test]
    fn test_grid_scenario_page_count() {
        let mut state = create_test_state();
        state.update(Message::ViewModeChanged(ViewMode::Grid));

        let (id, request) =
            expect_search(state.update(Message::UrlChanged(params(&["budget report"]))));
        assert_eq!(request.size, 10);
        assert_eq!(request.from, Some(0));
        assert_eq!(request.search_type, MatchMode::Any);

        complete(
            &mut state,
            id,
            SearchPage {
                total: Some(25),
                ..page("g", 10)
            },
        );
        assert_eq!(state.results.total_documents, Some(25));
        assert_eq!(state.page_count(), 3);

        let (id, request) = expect_search(state.update(Message::PageChanged(3)));
        assert_eq!(request.from, Some(20));
        assert!(state.results.documents.is_empty());

        complete(&mut state, id, page("g3", 5));
        let ids: Vec<String> = state.results.documents.iter().map(|d| d.key()).collect();
        assert_eq!(ids[0], "g3-0");
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_one_sided_date_range_blocks_request() {
        let mut state = searched_state();

        let command = state.update(Message::FromDateChanged(Some("2024-01-01".to_string())));

        assert!(!matches!(command, Command::Fetch(_)));
        assert_eq!(
            state.results.error,
            Some(SearchError::IncompleteDateRange.to_string())
        );
        assert!(state.results.documents.is_empty());
        assert!(!state.results.loading);
    }

    #[test]
    fn test_invalid_applied_range_is_rejected() {
        let mut state = searched_state();

        let command = state.update(Message::DateRangeApplied {
            from: "2024-05-01".to_string(),
            to: "2024-01-01".to_string(),
        });

        assert_eq!(command, Command::None);
        assert_eq!(state.filters.from_date, None);
        assert_eq!(
            state.results.error,
            Some(SearchError::InvertedDateRange.to_string())
        );
    }

    #[test]
    fn test_applied_range_searches_once() {
        let mut state = searched_state();
        state.update(Message::YearSelected(Some("2023".to_string())));

        let (_, request) = expect_search(state.update(Message::DateRangeApplied {
            from: "2024-01-01".to_string(),
            to: "2024-03-31".to_string(),
        }));

        assert_eq!(state.filters.year, None);
        let range = request.date_range.unwrap();
        assert_eq!(range.from.as_deref(), Some("2024-01-01"));
        assert_eq!(range.to.as_deref(), Some("2024-03-31"));
    }

    #[test]
    fn test_load_more_appends_in_order() {
        let mut state = searched_state();
        assert!(state.can_load_more());
        let cursor = state.results.cursor.clone();

        let (id, request) = expect_search(state.update(Message::LoadMoreRequested));
        assert_eq!(request.search_after, cursor);
        assert_eq!(state.results.documents.len(), 10);
        assert!(!state.can_load_more());

        complete(&mut state, id, page("b", 10));

        let keys: Vec<String> = state.results.documents.iter().map(|d| d.key()).collect();
        assert_eq!(keys.len(), 20);
        assert_eq!(keys[9], "a-9");
        assert_eq!(keys[10], "b-0");
    }

    #[test]
    fn test_continuation_leaves_facets_untouched() {
        let mut state = create_test_state();
        let (id, _) = expect_search(state.update(Message::UrlChanged(params(&["x"]))));
        let mut first = page("a", 2);
        first.aggregations = Some(Aggregations {
            doctype_counts: Some([("SR".to_string(), 2)].into()),
            ..Aggregations::default()
        });
        complete(&mut state, id, first);

        let (id, _) = expect_search(state.update(Message::LoadMoreRequested));
        let mut more = page("b", 2);
        more.aggregations = Some(Aggregations {
            doctype_counts: Some([("XX".to_string(), 9)].into()),
            ..Aggregations::default()
        });
        complete(&mut state, id, more);

        let doc_types = state.results.facets.doc_types.clone().unwrap();
        assert_eq!(doc_types.get("SR"), Some(&2));
        assert_eq!(doc_types.get("XX"), None);
    }

    #[test]
    fn test_switch_to_grid_resets_page_and_fetches_once() {
        let mut state = searched_state();
        state.view.page = 4;

        let (_, request) = expect_search(state.update(Message::ViewModeChanged(ViewMode::Grid)));

        assert_eq!(state.view.page, 1);
        assert_eq!(request.from, Some(0));
        assert_eq!(request.search_after, None);
        assert_eq!(state.results.cursor, None);
        assert!(state.results.documents.is_empty());
        assert_eq!(
            state.update(Message::ViewModeChanged(ViewMode::Grid)),
            Command::None
        );
    }

    #[test]
    fn test_view_switch_without_criteria_does_not_fetch() {
        let mut state = create_test_state();
        assert_eq!(
            state.update(Message::ViewModeChanged(ViewMode::Grid)),
            Command::None
        );
        assert_eq!(state.view.mode, ViewMode::Grid);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut state = create_test_state();
        let (slow, _) = expect_search(state.update(Message::UrlChanged(params(&["slow"]))));
        let (fast, _) = expect_search(state.update(Message::UrlChanged(params(&["fast"]))));
        assert!(fast > slow);

        complete(&mut state, fast, page("fast", 3));
        complete(&mut state, slow, page("slow", 7));

        assert_eq!(state.results.documents.len(), 3);
        assert_eq!(state.results.documents[0].key(), "fast-0");
    }

    #[test]
    fn test_superseded_response_keeps_loading() {
        let mut state = create_test_state();
        let (first, _) = expect_search(state.update(Message::UrlChanged(params(&["one"]))));
        expect_search(state.update(Message::UrlChanged(params(&["two"]))));

        complete(&mut state, first, page("one", 1));

        assert!(state.results.loading);
        assert!(state.results.documents.is_empty());
    }

    #[test]
    fn test_failure_clears_results() {
        let mut state = searched_state();
        let (id, _) = expect_search(state.update(Message::UrlChanged(params(&["next"]))));

        state.update(Message::SearchCompleted {
            id,
            outcome: Err(SearchError::Status {
                status: 500,
                reason: "Internal Server Error".to_string(),
            }),
        });

        assert!(!state.results.loading);
        assert!(state.results.documents.is_empty());
        assert_eq!(state.results.cursor, None);
        assert_eq!(
            state.results.error.as_deref(),
            Some("API Error: 500 - Internal Server Error.")
        );
    }

    #[test]
    fn test_fresh_fetch_without_aggregations_sets_empty_counts() {
        let state = searched_state();

        assert_eq!(state.results.facets.doc_types, Some(Default::default()));
        assert_eq!(state.results.facets.branches, Some(Default::default()));
        assert_eq!(state.results.facets.extensions, Some(Default::default()));
    }

    #[test]
    fn test_attachment_view_keeps_facets_and_drops_cursor() {
        let mut state = searched_state();
        let facets = state.results.facets.clone();
        let target = AttachmentTarget {
            document_id: "d-1".to_string(),
            parent_id: "p-1".to_string(),
            is_attachment: false,
        };

        let command = state.update(Message::UrlChanged(UrlParams::attachment(target)));
        let id = match command {
            Command::Fetch(FetchPlan {
                id,
                call: BackendCall::ResolveAttachment(request),
            }) => {
                assert_eq!(request.app_id, "d-1");
                assert_eq!(request.parent_app_id, "p-1");
                id
            }
            other => panic!("expected attachment fetch, got {other:?}"),
        };

        let mut resolved = page("att", 3);
        resolved.aggregations = Some(Aggregations {
            branchtype_counts: Some([("WAN".to_string(), 3)].into()),
            ..Aggregations::default()
        });
        complete(&mut state, id, resolved);

        assert_eq!(state.results.documents.len(), 3);
        assert_eq!(state.results.cursor, None);
        assert_eq!(state.results.facets, facets);
        assert!(!state.can_load_more());
        assert_eq!(
            state.update(Message::DocTypeToggled("SR".to_string())),
            Command::None
        );
    }

    #[test]
    fn test_missing_criteria_message() {
        let mut state = create_test_state();

        let command = state.update(Message::UrlChanged(UrlParams::default()));

        assert_eq!(command, Command::None);
        assert_eq!(
            state.results.error,
            Some(SearchError::MissingCriteria.to_string())
        );
    }

    #[test]
    fn test_unusable_query_message() {
        let mut state = create_test_state();

        state.update(Message::UrlChanged(UrlParams::from_query("q=%5B%5D")));

        assert_eq!(
            state.results.error,
            Some(SearchError::InvalidQuery.to_string())
        );
    }

    #[test]
    fn test_query_submit_round_trips_through_url() {
        let mut state = searched_state();

        let command = state.update(Message::QuerySubmitted(r#""budget""#.to_string()));
        let pushed = match command {
            Command::PushUrl(params) => params,
            other => panic!("expected url push, got {other:?}"),
        };
        assert_eq!(pushed, params(&["budget"]));

        // Resubmitting the same query still searches again.
        let (_, request) = expect_search(state.update(Message::UrlChanged(pushed.clone())));
        assert_eq!(request.queries, vec!["budget"]);
        assert_eq!(
            state.update(Message::UrlChanged(pushed)),
            Command::None
        );
    }

    #[test]
    fn test_advanced_search_with_filters_only() {
        let mut state = create_test_state();

        let command = state.update(Message::AdvancedSearchSubmitted {
            query: String::new(),
            rows: vec![
                ("ReportNumber".to_string(), "R-17".to_string()),
                ("From".to_string(), "  ".to_string()),
            ],
        });
        let pushed = match command {
            Command::PushUrl(params) => params,
            other => panic!("expected url push, got {other:?}"),
        };
        assert_eq!(pushed, UrlParams::default());

        let (_, request) = expect_search(state.update(Message::UrlChanged(pushed)));
        assert!(request.queries.is_empty());
        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.filters["ReportNumber"], vec!["R-17"]);
    }

    #[test]
    fn test_header_submit_clears_simple_filters() {
        let mut state = create_test_state();
        state.update(Message::AdvancedSearchSubmitted {
            query: "x".to_string(),
            rows: vec![("Branch".to_string(), "WAN".to_string())],
        });
        assert!(state.filters.has_simple_filters());

        state.update(Message::QuerySubmitted("x".to_string()));

        assert!(!state.filters.has_simple_filters());
    }

    #[test]
    fn test_match_mode_change_pushes_url() {
        let mut state = searched_state();

        let command = state.update(Message::MatchModeChanged(MatchMode::All));

        assert_eq!(
            command,
            Command::PushUrl(UrlParams {
                raw_query: state.url.raw_query.clone(),
                match_mode: Some(MatchMode::All),
                attachment: None,
            })
        );
        assert_eq!(
            state.update(Message::MatchModeChanged(MatchMode::All)),
            Command::None
        );
    }

    #[test]
    fn test_toggle_twice_restores_and_refetches() {
        let mut state = searched_state();

        let (_, request) = expect_search(state.update(Message::ExtensionToggled("pdf".to_string())));
        assert_eq!(request.filters["FileExtension"], vec!["pdf"]);

        let (_, request) = expect_search(state.update(Message::ExtensionToggled("pdf".to_string())));
        assert!(request.filters.is_empty());
        assert!(state.filters.extensions.is_empty());
    }

    #[test]
    fn test_unchanged_filter_does_not_refetch() {
        let mut state = searched_state();
        expect_search(state.update(Message::YearSelected(Some("2024".to_string()))));

        assert_eq!(
            state.update(Message::YearSelected(Some("2024".to_string()))),
            Command::None
        );
        assert_eq!(state.update(Message::FuzzyToggled(false)), Command::None);
    }

    #[test]
    fn test_new_intent_during_rejection_cancels_in_flight() {
        let mut state = searched_state();
        expect_search(state.update(Message::UrlChanged(params(&["pending"]))));

        let command = state.update(Message::ToDateChanged(Some("2024-01-01".to_string())));

        assert_eq!(command, Command::Cancel);
        assert!(!state.results.loading);
    }

    #[test]
    fn test_attachment_link_opens_navigation() {
        let mut state = searched_state();
        let document = Document::from_raw(&json!({
            "ProphecyId": "c-1",
            "ParentProphecyId": "p-1",
            "IsAttachment": "true"
        }));

        let command = state.update(Message::AttachmentLinkFollowed(document));

        assert_eq!(
            command,
            Command::OpenNavigation(UrlParams::attachment(AttachmentTarget {
                document_id: "c-1".to_string(),
                parent_id: "p-1".to_string(),
                is_attachment: true,
            }))
        );
        assert_eq!(state.results.documents.len(), 10);
        assert!(!state.url.is_attachment_view());
    }

    #[test]
    fn test_grid_page_size_change_resets_page() {
        let mut state = create_test_state();
        state.update(Message::ViewModeChanged(ViewMode::Grid));
        expect_search(state.update(Message::UrlChanged(params(&["q"]))));
        state.view.page = 3;

        let (_, request) = expect_search(state.update(Message::PageSizeChanged(50)));

        assert_eq!(state.view.page, 1);
        assert_eq!(request.size, 50);
        assert_eq!(request.from, Some(0));
    }

    #[test]
    fn test_first_url_observation_with_filters_only_searches() {
        let filters = {
            let mut filters = FilterState::default();
            filters.set_simple_filters([("FileName".to_string(), "x".to_string())]);
            filters
        };
        let mut state = create_test_state().with_filters(filters);

        let (id, request) =
            expect_search(state.update(Message::UrlChanged(UrlParams::default())));

        assert_eq!(id, 1);
        assert!(request.queries.is_empty());
        assert_eq!(request.filters.get("FileName"), Some(&vec!["x".to_string()]));
        assert_eq!(state.results.error, None);
        assert!(state.results.loading);
    }

    #[test]
    fn test_rejection_clears_cursor_and_total() {
        let mut state = create_test_state();
        let (id, _) = expect_search(state.update(Message::UrlChanged(params(&["budget"]))));
        complete(
            &mut state,
            id,
            SearchPage {
                total: Some(40),
                ..page("a", 10)
            },
        );
        assert!(state.can_load_more());

        let command = state.update(Message::UrlChanged(UrlParams::default()));

        assert_eq!(command, Command::None);
        assert!(state.results.documents.is_empty());
        assert_eq!(state.results.cursor, None);
        assert_eq!(state.results.total_documents, None);
        assert!(!state.can_load_more());
        assert_eq!(state.page_count(), 0);
    }

    #[test]
    fn test_blank_date_range_keeps_year_and_sends_no_blank_dates() {
        let mut state = searched_state();
        let (id, _) =
            expect_search(state.update(Message::YearSelected(Some("2024".to_string()))));
        complete(&mut state, id, page("y", 3));

        let command = state.update(Message::DateRangeApplied {
            from: String::new(),
            to: String::new(),
        });

        assert_eq!(command, Command::None);
        assert_eq!(state.filters.year.as_deref(), Some("2024"));
        assert_eq!(state.filters.from_date, None);
        assert_eq!(state.filters.to_date, None);

        let (_, request) = expect_search(state.update(Message::FuzzyToggled(true)));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["date_range"], json!({"from": "2024-01-01", "to": "2024-12-31"}));
    }
}
