use super::*;

#[test]
fn root_resolves_to_list_with_unselected_child() {
    let table = RouteTable::client();
    let matched = table.resolve("/").unwrap();
    assert_eq!(matched.view, View::ModelList);
    assert_eq!(matched.child, Some(View::ModelUnselected));
    assert!(matched.params.is_empty());
}

#[test]
fn object_form_captures_uuid_param() {
    let table = RouteTable::client();
    let matched = table.resolve("/object/new/4c2f9a").unwrap();
    assert_eq!(matched.view, View::ModelList);
    assert_eq!(matched.child, Some(View::ModelObjectForm));
    assert_eq!(matched.params.get("uuid").map(String::as_str), Some("4c2f9a"));
}

#[test]
fn uuid_param_is_free_form() {
    // No format validation: any opaque segment string is accepted verbatim.
    let table = RouteTable::client();
    for raw in ["not-a-uuid", "123", "UPPER", "a.b.c"] {
        let matched = table.resolve(&format!("/object/new/{raw}")).unwrap();
        assert_eq!(matched.params.get("uuid").map(String::as_str), Some(raw));
    }
}

#[test]
fn unmatched_paths_resolve_to_none() {
    let table = RouteTable::client();
    assert!(table.resolve("/object/new").is_none());
    assert!(table.resolve("/object/new/a/b").is_none());
    assert!(table.resolve("/models").is_none());
    assert!(table.resolve("/object/edit/abc").is_none());
}

#[test]
fn empty_param_segment_does_not_match() {
    let table = RouteTable::client();
    // "/object/new/" normalizes to "/object/new", which has no form match.
    assert!(table.resolve("/object/new/").is_none());
}

#[test]
fn trailing_slash_and_query_are_normalized() {
    let table = RouteTable::client();
    let matched = table.resolve("/object/new/abc/?from=list").unwrap();
    assert_eq!(matched.child, Some(View::ModelObjectForm));
    assert_eq!(matched.params.get("uuid").map(String::as_str), Some("abc"));
}

#[test]
fn first_matching_route_wins() {
    let table = RouteTable::new(vec![
        Route::leaf("/a/:x", View::ModelObjectForm),
        Route::leaf("/a/b", View::ModelUnselected),
    ]);
    let matched = table.resolve("/a/b").unwrap();
    assert_eq!(matched.view, View::ModelObjectForm);
    assert_eq!(matched.params.get("x").map(String::as_str), Some("b"));
}

#[test]
fn relative_child_patterns_join_onto_parent() {
    let table = RouteTable::new(vec![Route {
        pattern: "/models".to_string(),
        view: View::ModelList,
        children: vec![Route::leaf("detail/:uuid", View::ModelObjectForm)],
    }]);
    let matched = table.resolve("/models/detail/42").unwrap();
    assert_eq!(matched.child, Some(View::ModelObjectForm));
    assert_eq!(matched.params.get("uuid").map(String::as_str), Some("42"));
}
