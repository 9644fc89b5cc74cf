//! Mail-client shaped schema: folders listing their files through paginated
//! connections, plus a self-referencing type for depth-related tests.

pub mod schema;

use std::sync::Arc;

use crate::{GraphQLError, schema::model::Registry, types::scalars::ID};

use self::{
    schema::{File, Folder, LocalFolder, NestedType, Nesting, Query, StoredFolder},
    store::InMemoryStore,
};

/// Number of files in the `inbox` folder.
pub const INBOX_FILES: usize = 5;

/// Registers every object type of this schema.
pub fn registry() -> Result<Registry, GraphQLError> {
    Ok(Registry::builder()
        .register::<Query>()?
        .register::<Folder>()?
        .register::<File>()?
        .register::<NestedType>()?
        .register_connection::<Folder>()?
        .register_connection::<File>()?
        .build())
}

/// Builds the file of the provided number.
#[must_use]
pub fn file(n: usize) -> File {
    File {
        id: ID::new(format!("file-{n}")),
        name: format!("message-{n}.eml"),
        size: 1024 * (n as i64 + 1),
    }
}

/// Builds the root object, with nesting stopping after `max_depth` levels.
#[must_use]
pub fn query(max_depth: i32) -> Query {
    let inbox = LocalFolder {
        id: ID::new("inbox"),
        name: "Inbox".into(),
        unread_count: 3,
        files: (0..INBOX_FILES).map(|n| Arc::new(file(n))).collect(),
    };

    let archive_id = ID::new("archive");
    let store = InMemoryStore::default().with_files(archive_id.clone(), (10..12).map(file));
    let archive = StoredFolder {
        id: archive_id.clone(),
        name: "Archive".into(),
        store: Arc::new(store),
    };

    Query::new(
        [
            (inbox.id.clone(), Folder::new(inbox)),
            (archive_id, Folder::new(archive)),
        ],
        NestedType::new(Nesting {
            depth: 0,
            max_depth,
        }),
    )
}
