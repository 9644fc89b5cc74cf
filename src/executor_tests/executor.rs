use std::sync::Arc;

use crate::{
    GraphQLError,
    ast::{Field, InlineFragment, Selection},
    executor::{ErrorKind, ExecutionConfig, ExecutionError, Executor, FieldError},
    graphql_value,
    schema::{meta::TypeRef, model::Registry},
    tests::fixtures::today::{self, schema::Query},
    types::{
        async_await::FieldFuture,
        base::{Fields, GraphQLObject, ObjectRef},
    },
    value::Value,
};

fn root() -> ObjectRef {
    ObjectRef::new(Arc::new(today::query(2)))
}

async fn run(selection_set: &[Selection]) -> (Value, Vec<ExecutionError>) {
    let registry = today::registry().expect("valid schema");
    Executor::new(&registry)
        .execute(&root(), selection_set)
        .await
        .expect("execution succeeds")
}

fn summary(errs: &[ExecutionError]) -> Vec<(String, ErrorKind)> {
    errs.iter()
        .map(|e| (e.path().to_string(), e.error().kind()))
        .collect()
}

mod field_execution {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn scalars_and_typename() {
        let (res, errs) = run(&[Field::new("folder")
            .argument("id", "inbox")
            .select(["__typename", "name", "unreadCount"])
            .into()])
        .await;

        assert_eq!(errs, []);
        assert_eq!(
            res,
            graphql_value!({
                "folder": {"__typename": "Folder", "name": "Inbox", "unreadCount": 3},
            }),
        );
    }

    #[tokio::test]
    async fn aliases_and_fragments() {
        let inbox = || Field::new("folder").argument("id", "inbox");
        let (res, errs) = run(&[
            inbox().alias("a").select(["name"]).into(),
            InlineFragment::on("Query")
                .select([inbox().alias("a").select(["unreadCount"])])
                .into(),
            InlineFragment::on("Folder")
                .select([inbox().alias("skipped").select(["name"])])
                .into(),
            inbox().alias("b").select(["__typename"]).into(),
        ])
        .await;

        assert_eq!(errs, []);
        assert_eq!(
            res,
            graphql_value!({
                "a": {"name": "Inbox", "unreadCount": 3},
                "b": {"__typename": "Folder"},
            }),
        );
    }

    #[tokio::test]
    async fn ids_serialize_as_strings() {
        let (res, _) = run(&[Field::new("folder")
            .argument("id", "inbox")
            .select(["id"])
            .into()])
        .await;

        assert_eq!(
            serde_json::to_value(&res).unwrap(),
            serde_json::json!({"folder": {"id": "inbox"}}),
        );
    }

    #[tokio::test]
    async fn unknown_instance_is_null() {
        let (res, errs) = run(&[Field::new("folder")
            .argument("id", "spam")
            .select(["name"])
            .into()])
        .await;

        assert_eq!(errs, []);
        assert_eq!(res, graphql_value!({"folder": null}));
    }

    #[tokio::test]
    async fn execution_is_idempotent() {
        let selection_set: [Selection; 2] = [
            Field::new("folder")
                .argument("id", "inbox")
                .select(["name", "unreadCount"])
                .into(),
            Field::new("nested").select(["depth"]).into(),
        ];

        let first = run(&selection_set).await;
        let second = run(&selection_set).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn sequential_matches_concurrent() {
        let registry = today::registry().unwrap();
        let selection_set: [Selection; 2] = [
            Field::new("folder")
                .argument("id", "inbox")
                .select(["name", "unreadCount", "__typename"])
                .into(),
            Field::new("nested")
                .select([Field::new("nested").select(["depth"])])
                .into(),
        ];

        let concurrent = Executor::new(&registry)
            .execute(&root(), &selection_set)
            .await
            .unwrap();
        let sequential = Executor::new(&registry)
            .config(ExecutionConfig::default().sequential())
            .execute(&root(), &selection_set)
            .await
            .unwrap();
        assert_eq!(concurrent, sequential);
    }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn not_implemented_nulls_nearest_nullable() {
        let (res, errs) = run(&[Field::new("folder")
            .argument("id", "archive")
            .select(["name", "unreadCount"])
            .into()])
        .await;

        assert_eq!(res, graphql_value!({"folder": null}));
        assert_eq!(
            summary(&errs),
            [("folder.unreadCount".to_owned(), ErrorKind::NotImplemented)],
        );
        assert!(errs[0].error().message().contains("Folder.unreadCount"));
    }

    #[tokio::test]
    async fn unknown_field() {
        let (res, errs) = run(&[Field::new("folder")
            .argument("id", "inbox")
            .select(["name", "color"])
            .into()])
        .await;

        assert_eq!(
            res,
            graphql_value!({"folder": {"name": "Inbox", "color": null}}),
        );
        assert_eq!(
            summary(&errs),
            [("folder.color".to_owned(), ErrorKind::UnknownField)],
        );
    }

    #[tokio::test]
    async fn missing_argument() {
        let (res, errs) = run(&[Field::new("folder").select(["name"]).into()]).await;

        assert_eq!(res, graphql_value!({"folder": null}));
        assert_eq!(summary(&errs), [("folder".to_owned(), ErrorKind::MissingArgument)]);
    }

    #[tokio::test]
    async fn errors_are_ordered_by_path() {
        let (_, errs) = run(&[
            Field::new("zeta").into(),
            Field::new("folder").alias("beta").into(),
            Field::new("folder")
                .alias("alpha")
                .argument("id", "archive")
                .select(["unreadCount"])
                .into(),
        ])
        .await;

        assert_eq!(
            summary(&errs),
            [
                ("alpha.unreadCount".to_owned(), ErrorKind::NotImplemented),
                ("beta".to_owned(), ErrorKind::MissingArgument),
                ("zeta".to_owned(), ErrorKind::UnknownField),
            ],
        );
    }

    #[tokio::test]
    async fn unregistered_root_is_fatal() {
        let registry = Registry::builder().build();

        let res = Executor::new(&registry)
            .execute(&root(), &["__typename".into()])
            .await;
        assert!(matches!(res, Err(GraphQLError::Invariant(_))), "{res:?}");
    }

    #[tokio::test]
    async fn unregistered_child_is_fatal() {
        let registry = Registry::builder().register::<Query>().unwrap().build();

        let res = Executor::new(&registry)
            .execute(
                &root(),
                &[Field::new("nested").select(["depth"]).into()],
            )
            .await;
        assert!(matches!(res, Err(GraphQLError::Invariant(_))), "{res:?}");
    }
}

mod propagation {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Viewer {
        login: &'static str,
    }

    struct Probe;

    impl GraphQLObject for Probe {
        const NAME: &'static str = "Probe";

        fn register(fields: &mut Fields<Self>) {
            fields.field("counts", TypeRef::named("Int").non_null().list(), |_, _| {
                FieldFuture::ok(vec![Some(1), None, Some(3)]).into_value()
            });
            fields.field("sparse", TypeRef::named("Int").list(), |_, _| {
                FieldFuture::ok(vec![Some(1), None, Some(3)]).into_value()
            });
            fields.field("failing", TypeRef::named("Int").non_null(), |_, _| {
                FieldFuture::<i32>::err("boom").into_value()
            });
            fields.field("child", TypeRef::named(Self::NAME), |_, _| {
                FieldFuture::ok(Arc::new(Probe)).into_value()
            });
            fields.field("strictChild", TypeRef::named(Self::NAME).non_null(), |_, _| {
                FieldFuture::ok(Arc::new(Probe)).into_value()
            });
            fields.field("mistyped", TypeRef::named("Int").list(), |_, _| {
                FieldFuture::ok(7).into_value()
            });
            fields.field("viewer", TypeRef::named("String"), |_, ctx| {
                let login = ctx
                    .data::<Viewer>()
                    .map(|v| v.login)
                    .ok_or_else(|| FieldError::from("no viewer"));
                FieldFuture::from_result(login).into_value()
            });
            fields.field("depth", TypeRef::named("Int").non_null(), |_, ctx| {
                FieldFuture::ok(ctx.depth()).into_value()
            });
        }
    }

    async fn probe(selection_set: &[Selection]) -> (Value, Vec<ExecutionError>) {
        let registry = Registry::builder().register::<Probe>().unwrap().build();
        Executor::new(&registry)
            .data(Arc::new(Viewer { login: "root" }))
            .execute(&ObjectRef::new(Arc::new(Probe)), selection_set)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn null_item_nulls_list_of_non_null() {
        let (res, errs) = probe(&["counts".into(), "sparse".into()]).await;

        assert_eq!(res, graphql_value!({"counts": null, "sparse": [1, null, 3]}));
        assert_eq!(summary(&errs), [("counts[1]".to_owned(), ErrorKind::Field)]);
        assert_eq!(
            errs[0].error().message(),
            "Cannot return null for non-nullable field",
        );
    }

    #[tokio::test]
    async fn non_null_failure_bubbles() {
        let (res, errs) = probe(&[
            Field::new("child").select(["depth", "failing"]).into(),
            Field::new("strictChild")
                .alias("nested")
                .select([Field::new("child").select(["failing"])])
                .into(),
        ])
        .await;

        assert_eq!(
            res,
            graphql_value!({"child": null, "nested": {"child": null}}),
        );
        assert_eq!(
            summary(&errs),
            [
                ("child.failing".to_owned(), ErrorKind::Field),
                ("nested.child.failing".to_owned(), ErrorKind::Field),
            ],
        );
    }

    #[tokio::test]
    async fn null_reaches_the_root() {
        let (res, errs) = probe(&[
            "depth".into(),
            Field::new("strictChild").select(["failing"]).into(),
        ])
        .await;

        assert_eq!(res, Value::null());
        assert_eq!(summary(&errs), [("strictChild.failing".to_owned(), ErrorKind::Field)]);
    }

    #[tokio::test]
    async fn type_mismatch_is_a_field_error() {
        let (res, errs) = probe(&["mistyped".into()]).await;

        assert_eq!(res, graphql_value!({"mistyped": null}));
        assert_eq!(summary(&errs), [("mistyped".to_owned(), ErrorKind::Field)]);
    }

    #[tokio::test]
    async fn request_data_and_depth() {
        let (res, errs) = probe(&[
            "viewer".into(),
            "depth".into(),
            Field::new("child")
                .select([Field::new("child").select(["depth", "viewer"])])
                .into(),
        ])
        .await;

        assert_eq!(errs, []);
        assert_eq!(
            res,
            graphql_value!({
                "viewer": "root",
                "depth": 1,
                "child": {"child": {"depth": 3, "viewer": "root"}},
            }),
        );
    }
}
