use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::{
    ast::{Field, Selection},
    executor::{ErrorKind, ExecutionError, Executor},
    graphql_value,
    tests::fixtures::today::{self, INBOX_FILES},
    types::{base::ObjectRef, connection::Cursor},
    value::Value,
};

async fn run(selection_set: &[Selection]) -> (Value, Vec<ExecutionError>) {
    let registry = today::registry().expect("valid schema");
    Executor::new(&registry)
        .execute(&ObjectRef::new(Arc::new(today::query(2))), selection_set)
        .await
        .expect("execution succeeds")
}

fn lookup<'v>(value: &'v Value, path: &[&str]) -> &'v Value {
    path.iter().fold(value, |v, key| {
        v.as_object_value()
            .and_then(|o| o.get_field_value(key))
            .unwrap_or_else(|| panic!("no `{key}` in {v}"))
    })
}

fn files_page(folder: &str, files: Field) -> Selection {
    Field::new("folder")
        .argument("id", folder)
        .select([files.select([
            Selection::from(Field::new("edges").select([Field::new("node").select(["name"])])),
            Field::new("pageInfo")
                .select(["hasNextPage", "hasPreviousPage", "startCursor", "endCursor"])
                .into(),
        ])])
        .into()
}

fn names(page: &Value) -> Vec<String> {
    lookup(page, &["folder", "files", "edges"])
        .as_list_value()
        .expect("edges are a list")
        .iter()
        .map(|e| {
            lookup(e, &["node", "name"])
                .as_string_value()
                .expect("name is a string")
                .to_owned()
        })
        .collect()
}

#[tokio::test]
async fn forward_pagination_visits_every_file_once() {
    let mut seen = Vec::new();
    let mut after = None;

    loop {
        let mut files = Field::new("files").argument("first", 2);
        if let Some(cursor) = after.take() {
            files = files.argument("after", cursor);
        }

        let (page, errs) = run(&[files_page("inbox", files)]).await;
        assert_eq!(errs, []);

        let edges = names(&page);
        assert!(edges.len() <= 2, "page too large: {edges:?}");
        seen.extend(edges);

        let info = lookup(&page, &["folder", "files", "pageInfo"]);
        if lookup(info, &["hasNextPage"]).as_boolean_value() != Some(true) {
            break;
        }
        after = lookup(info, &["endCursor"])
            .as_string_value()
            .map(str::to_owned);
        assert!(after.is_some(), "next page without end cursor");
    }

    let expected = (0..INBOX_FILES)
        .map(|n| format!("message-{n}.eml"))
        .collect::<Vec<_>>();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn backward_window() {
    let files = Field::new("files")
        .argument("last", 2)
        .argument("before", Cursor::encode("file-4").to_string());

    let (page, errs) = run(&[files_page("inbox", files)]).await;
    assert_eq!(errs, []);
    assert_eq!(names(&page), ["message-2.eml", "message-3.eml"]);
    assert_eq!(
        lookup(&page, &["folder", "files", "pageInfo"]),
        &graphql_value!({
            "hasNextPage": true,
            "hasPreviousPage": true,
            "startCursor": (Value::from(Cursor::encode("file-2").to_string())),
            "endCursor": (Value::from(Cursor::encode("file-3").to_string())),
        }),
    );
}

#[tokio::test]
async fn empty_page() {
    let files = Field::new("files").argument("first", 0);

    let (page, errs) = run(&[files_page("inbox", files)]).await;
    assert_eq!(errs, []);
    assert_eq!(names(&page), Vec::<String>::new());
    assert_eq!(
        lookup(&page, &["folder", "files", "pageInfo"]),
        &graphql_value!({
            "hasNextPage": true,
            "hasPreviousPage": false,
            "startCursor": null,
            "endCursor": null,
        }),
    );
}

#[tokio::test]
async fn invalid_cursor_nulls_the_folder() {
    let files = Field::new("files").argument("after", "not-a-cursor");

    let (page, errs) = run(&[files_page("inbox", files)]).await;
    assert_eq!(page, graphql_value!({"folder": null}));
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].path().to_string(), "folder.files");
    assert_eq!(errs[0].error().kind(), ErrorKind::InvalidCursor);
}

#[tokio::test]
async fn negative_count_is_rejected() {
    let files = Field::new("files").argument("first", -1);

    let (page, errs) = run(&[files_page("inbox", files)]).await;
    assert_eq!(page, graphql_value!({"folder": null}));
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].error().kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn stored_files_are_paginated() {
    let files = Field::new("files").argument("first", 1);

    let (page, errs) = run(&[files_page("archive", files)]).await;
    assert_eq!(errs, []);
    assert_eq!(names(&page), ["message-10.eml"]);
    assert_eq!(
        lookup(&page, &["folder", "files", "pageInfo", "hasNextPage"]),
        &graphql_value!(true),
    );
}

#[tokio::test]
async fn folders_connection() {
    let (page, errs) = run(&[Field::new("folders")
        .argument("first", 1)
        .select([
            Selection::from(
                Field::new("edges").select([Field::new("node").select(["name", "__typename"])]),
            ),
            Field::new("pageInfo").select(["hasNextPage"]).into(),
            "__typename".into(),
        ])
        .into()])
    .await;

    assert_eq!(errs, []);
    assert_eq!(
        page,
        graphql_value!({
            "folders": {
                "edges": [{"node": {"name": "Inbox", "__typename": "Folder"}}],
                "pageInfo": {"hasNextPage": true},
                "__typename": "FolderConnection",
            },
        }),
    );
}
